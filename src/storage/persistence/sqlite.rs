//! `SQLite`-based persistence backend.
//!
//! Provides durable storage using `SQLite` as the authoritative source of
//! truth. Each identity maps to exactly one row holding the serialized
//! conversation, so every `put` is a single-row upsert.

use super::stored::StoredConversation;
use crate::models::{Conversation, Identity};
use crate::storage::sqlite::{
    acquire_lock, configure_connection, record_operation_metrics, status_label,
};
use crate::storage::traits::PersistenceBackend;
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tracing::instrument;

/// `SQLite`-based persistence backend.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` because `rusqlite::Connection` is not `Sync`.
/// WAL mode and `busy_timeout` let several processes share the file.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE conversations (
///     identity TEXT PRIMARY KEY,
///     conversation_id TEXT NOT NULL,
///     message_count INTEGER NOT NULL,
///     updated_at INTEGER NOT NULL,
///     body TEXT NOT NULL
/// )
/// ```
pub struct SqliteBackend {
    conn: Mutex<Connection>,
    /// Path to the database (None for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Opens (or creates) a `SQLite` database at `db_path`.
    ///
    /// Parent directories are created if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::storage("create_storage_dir", e))?;
        }

        let conn = Connection::open(&db_path).map_err(|e| Error::storage("open_sqlite", e))?;

        let backend = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        backend.initialize()?;
        Ok(backend)
    }

    /// Creates an in-memory `SQLite` backend (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| Error::storage("open_sqlite_in_memory", e))?;

        let backend = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        backend.initialize()?;
        Ok(backend)
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn initialize(&self) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        configure_connection(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS conversations (
                identity TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                message_count INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                body TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| Error::storage("create_conversations_table", e))?;

        Ok(())
    }
}

impl PersistenceBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(skip(self), fields(operation = "get", backend = "sqlite"))]
    fn get(&self, identity: &Identity) -> Result<Option<Conversation>> {
        let start = Instant::now();
        let result = (|| -> Result<Option<Conversation>> {
            let conn = acquire_lock(&self.conn);
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM conversations WHERE identity = ?1",
                    params![identity.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| Error::storage("select_conversation", e))?;

            body.map(|json| StoredConversation::decode(&json).map(|r| r.conversation))
                .transpose()
        })();

        record_operation_metrics("sqlite", "get", start, status_label(&result));
        result
    }

    #[instrument(skip(self, conversation), fields(operation = "put", backend = "sqlite", messages = conversation.len()))]
    fn put(&self, identity: &Identity, conversation: &Conversation) -> Result<()> {
        let start = Instant::now();
        let result = (|| -> Result<()> {
            let body = StoredConversation::encode(identity, conversation)?;
            let message_count = i64::try_from(conversation.len()).unwrap_or(i64::MAX);
            let updated_at = i64::try_from(conversation.updated_at).unwrap_or(i64::MAX);

            let conn = acquire_lock(&self.conn);
            conn.execute(
                "INSERT INTO conversations (identity, conversation_id, message_count, updated_at, body)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(identity) DO UPDATE SET
                    conversation_id = excluded.conversation_id,
                    message_count = excluded.message_count,
                    updated_at = excluded.updated_at,
                    body = excluded.body",
                params![
                    identity.as_str(),
                    conversation.id.as_str(),
                    message_count,
                    updated_at,
                    body
                ],
            )
            .map_err(|e| Error::storage("upsert_conversation", e))?;
            Ok(())
        })();

        record_operation_metrics("sqlite", "put", start, status_label(&result));
        result
    }

    #[instrument(skip(self), fields(operation = "delete", backend = "sqlite"))]
    fn delete(&self, identity: &Identity) -> Result<bool> {
        let start = Instant::now();
        let result = (|| -> Result<bool> {
            let conn = acquire_lock(&self.conn);
            let removed = conn
                .execute(
                    "DELETE FROM conversations WHERE identity = ?1",
                    params![identity.as_str()],
                )
                .map_err(|e| Error::storage("delete_conversation", e))?;
            Ok(removed > 0)
        })();

        record_operation_metrics("sqlite", "delete", start, status_label(&result));
        result
    }

    fn list_identities(&self) -> Result<Vec<Identity>> {
        let start = Instant::now();
        let result = (|| -> Result<Vec<Identity>> {
            let conn = acquire_lock(&self.conn);
            let mut stmt = conn
                .prepare("SELECT identity FROM conversations ORDER BY identity")
                .map_err(|e| Error::storage("prepare_list_identities", e))?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(|e| Error::storage("list_identities", e))?;

            let mut identities = Vec::new();
            for row in rows {
                let raw = row.map_err(|e| Error::storage("read_identity_row", e))?;
                identities
                    .push(Identity::parse(raw).map_err(|e| Error::storage("read_identity_row", e))?);
            }
            Ok(identities)
        })();

        record_operation_metrics("sqlite", "list", start, status_label(&result));
        result
    }

    fn count(&self) -> Result<usize> {
        let conn = acquire_lock(&self.conn);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
            .map_err(|e| Error::storage("count_conversations", e))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BaseMessage, Message};
    use tempfile::TempDir;

    fn conversation(seed: &str) -> Conversation {
        Conversation::seeded(Message::from_base(BaseMessage::new("system", seed)))
    }

    fn identity(raw: &str) -> Identity {
        Identity::parse(raw).unwrap()
    }

    #[test]
    fn test_put_and_get() {
        let backend = SqliteBackend::in_memory().unwrap();
        let mut c = conversation("seed");
        c.push(Message::from_base(BaseMessage::new("user", "hi")));

        backend.put(&identity("u1"), &c).unwrap();

        let loaded = backend.get(&identity("u1")).unwrap().unwrap();
        assert_eq!(loaded, c);
    }

    #[test]
    fn test_get_missing() {
        let backend = SqliteBackend::in_memory().unwrap();
        assert!(backend.get(&identity("nobody")).unwrap().is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.put(&identity("u1"), &conversation("first")).unwrap();
        backend.put(&identity("u1"), &conversation("second")).unwrap();

        assert_eq!(backend.count().unwrap(), 1);
        let loaded = backend.get(&identity("u1")).unwrap().unwrap();
        assert_eq!(loaded.messages[0].content, "second");
    }

    #[test]
    fn test_delete() {
        let backend = SqliteBackend::in_memory().unwrap();
        backend.put(&identity("u1"), &conversation("seed")).unwrap();

        assert!(backend.delete(&identity("u1")).unwrap());
        assert!(!backend.delete(&identity("u1")).unwrap());
        assert!(!backend.exists(&identity("u1")).unwrap());
    }

    #[test]
    fn test_list_identities() {
        let backend = SqliteBackend::in_memory().unwrap();
        for raw in ["zed", "amy", "bob"] {
            backend.put(&identity(raw), &conversation("seed")).unwrap();
        }
        let listed: Vec<String> = backend
            .list_identities()
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(listed, vec!["amy", "bob", "zed"]);
        assert_eq!(backend.count().unwrap(), 3);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("parley.db");

        {
            let backend = SqliteBackend::new(&path).unwrap();
            backend.put(&identity("u1"), &conversation("seed")).unwrap();
        }

        let reopened = SqliteBackend::new(&path).unwrap();
        assert_eq!(reopened.db_path(), Some(path.as_path()));
        let loaded = reopened.get(&identity("u1")).unwrap().unwrap();
        assert_eq!(loaded.messages[0].content, "seed");
    }

    #[test]
    fn test_corrupt_body_is_storage_error() {
        let backend = SqliteBackend::in_memory().unwrap();
        {
            let conn = acquire_lock(&backend.conn);
            conn.execute(
                "INSERT INTO conversations VALUES ('u1', 'c1', 1, 0, 'not json')",
                [],
            )
            .unwrap();
        }

        let err = backend.get(&identity("u1")).unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
    }
}
