//! Persistence backend implementations.

mod filesystem;
mod memory;
mod sqlite;
mod stored;

pub use filesystem::FilesystemBackend;
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use stored::{FORMAT_VERSION, StoredConversation};
