//! Filesystem-based persistence backend.
//!
//! Stores each conversation as an individual JSON file. Useful for small
//! deployments and environments without `SQLite`.
//!
//! # Security
//!
//! - **Path traversal**: identities are opaque caller input, so file names are
//!   the SHA-256 hex digest of the identity, never the identity itself
//! - **File size limits**: a maximum file size is enforced on read
//!
//! # Atomicity
//!
//! Writes go to a uniquely named temporary file in the same directory, are
//! synced to disk and then renamed over the target, so a reader never observes
//! a half-written record.

use super::stored::StoredConversation;
use crate::models::{Conversation, Identity};
use crate::storage::sqlite::{record_operation_metrics, status_label};
use crate::storage::traits::PersistenceBackend;
use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Maximum file size for conversation files (16MB).
const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Filesystem-based persistence backend.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Creates a filesystem backend rooted at `base_path`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_create(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path).map_err(|e| Error::storage("create_storage_dir", e))?;
        Ok(Self { base_path })
    }

    /// Returns the base path.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Returns the file name stem for an identity.
    fn file_stem(identity: &Identity) -> String {
        hex::encode(Sha256::digest(identity.as_str().as_bytes()))
    }

    /// Writes `bytes` to `path` and flushes them to disk.
    fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path)?;
        file.write_all(bytes)?;
        file.sync_all()
    }

    fn conversation_path(&self, identity: &Identity) -> PathBuf {
        self.base_path
            .join(format!("{}.json", Self::file_stem(identity)))
    }

    fn read_record(path: &Path) -> Result<Option<StoredConversation>> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::storage("read_file_metadata", e)),
        };

        if metadata.len() > MAX_FILE_SIZE {
            return Err(Error::storage(
                "read_conversation_file",
                format!(
                    "{} exceeds maximum size of {MAX_FILE_SIZE} bytes",
                    path.display()
                ),
            ));
        }

        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            // Deleted between metadata and read.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::storage("read_conversation_file", e)),
        };

        StoredConversation::decode(&json).map(Some)
    }
}

impl PersistenceBackend for FilesystemBackend {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn get(&self, identity: &Identity) -> Result<Option<Conversation>> {
        let start = Instant::now();
        let result = Self::read_record(&self.conversation_path(identity))
            .map(|record| record.map(|r| r.conversation));
        record_operation_metrics("filesystem", "get", start, status_label(&result));
        result
    }

    fn put(&self, identity: &Identity, conversation: &Conversation) -> Result<()> {
        let start = Instant::now();
        let result = (|| -> Result<()> {
            let json = StoredConversation::encode(identity, conversation)?;
            let target = self.conversation_path(identity);
            let temp = self.base_path.join(format!(
                ".{}.{}.tmp",
                Self::file_stem(identity),
                uuid::Uuid::new_v4().simple()
            ));

            if let Err(e) = Self::write_synced(&temp, json.as_bytes()) {
                let _ = fs::remove_file(&temp);
                return Err(Error::storage("write_conversation_file", e));
            }
            if let Err(e) = fs::rename(&temp, &target) {
                let _ = fs::remove_file(&temp);
                return Err(Error::storage("rename_conversation_file", e));
            }
            Ok(())
        })();

        record_operation_metrics("filesystem", "put", start, status_label(&result));
        result
    }

    fn delete(&self, identity: &Identity) -> Result<bool> {
        let start = Instant::now();
        let result = match fs::remove_file(self.conversation_path(identity)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::storage("delete_conversation_file", e)),
        };
        record_operation_metrics("filesystem", "delete", start, status_label(&result));
        result
    }

    fn list_identities(&self) -> Result<Vec<Identity>> {
        let entries = match fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::storage("read_storage_dir", e)),
        };

        let mut identities = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| Error::storage("read_dir_entry", e))?
                .path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match Self::read_record(&path) {
                Ok(Some(record)) => identities.push(record.identity),
                Ok(None) => {},
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable conversation file");
                },
            }
        }

        identities.sort();
        Ok(identities)
    }
}
