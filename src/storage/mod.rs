//! Storage layer abstraction.
//!
//! The store reads and writes conversations through the
//! [`PersistenceBackend`] contract: `get`, full-overwrite `put` and `delete`,
//! each atomic with respect to a single identity.
//!
//! Backends:
//! - **`SQLite`**: durable, single-row upsert per conversation (default)
//! - **Filesystem**: durable, one JSON file per conversation
//! - **Memory**: transient, for tests and throwaway servers

pub mod persistence;
pub mod sqlite;
pub mod traits;

pub use persistence::{FilesystemBackend, MemoryBackend, SqliteBackend};
pub use sqlite::acquire_lock;
pub use traits::PersistenceBackend;

use crate::Result;
use crate::config::{ParleyConfig, StorageBackendKind};

/// Builds the persistence backend selected by the configuration.
///
/// - `sqlite` opens `<data_dir>/conversations.db`
/// - `filesystem` writes under `<data_dir>/conversations/`
/// - `memory` keeps everything in process
///
/// # Errors
///
/// Returns an error if the durable backend cannot be opened.
pub fn open_backend(config: &ParleyConfig) -> Result<Box<dyn PersistenceBackend>> {
    let backend: Box<dyn PersistenceBackend> = match config.storage.backend {
        StorageBackendKind::Sqlite => {
            Box::new(SqliteBackend::new(config.data_dir.join("conversations.db"))?)
        },
        StorageBackendKind::Filesystem => Box::new(FilesystemBackend::with_create(
            config.data_dir.join("conversations"),
        )?),
        StorageBackendKind::Memory => Box::new(MemoryBackend::new()),
    };

    tracing::debug!(
        backend = backend.name(),
        data_dir = %config.data_dir.display(),
        "Opened persistence backend"
    );
    Ok(backend)
}
