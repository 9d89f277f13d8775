//! Shared `SQLite` and storage helpers.

mod connection;
mod metrics;

pub use connection::{acquire_lock, configure_connection};
pub use metrics::{record_operation_metrics, status_label};
