//! # Parley
//!
//! Per-user conversation storage for a personalized assistant.
//!
//! Parley owns the authoritative state of every user's conversation and
//! exposes a small, fixed mutation vocabulary on top of it: create, append,
//! tag, mark read/unread, search, summarize and delete.
//!
//! ## Features
//!
//! - One conversation per identity, append-only message order
//! - Pluggable persistence (`SQLite`, filesystem, in-memory)
//! - Per-identity serialization of mutations
//! - HTTP transport (feature `http`) and a CLI
//! - Completion client that records both turns of a chat exchange
//!
//! ## Example
//!
//! ```rust
//! use parley::{BaseMessage, ConversationStore, Identity};
//! use parley::storage::MemoryBackend;
//!
//! let store = ConversationStore::new(MemoryBackend::new());
//! let user = Identity::parse("u1")?;
//!
//! store.create_conversation(&user, BaseMessage::new("system", "You are helpful."))?;
//! let message = store.append_message(&user, BaseMessage::new("user", "hi"))?;
//! store.tag_message(&user, &message.id, "important")?;
//!
//! assert_eq!(store.summarize(&user)?, "You are helpful. hi");
//! # Ok::<(), parley::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
#[cfg(feature = "http")]
pub mod http;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::ParleyConfig;
pub use llm::{ChatMessage, CompletionProvider};
pub use models::{
    BaseMessage, Conversation, ConversationCreated, ConversationId, Identity, Message, MessageId,
};
pub use services::{ChatSession, ConversationStore};
pub use storage::PersistenceBackend;

/// Error type for parley operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `ConversationNotFound` | Identity has no conversation bound to it |
/// | `MessageNotFound` | Message id is absent from a bound conversation |
/// | `InvalidPayload` | Missing role or content, empty identity on create |
/// | `StorageUnavailable` | The persistence backend fails to read or write |
/// | `OperationFailed` | Config, server or completion client failures |
/// | `FeatureNotEnabled` | Using surfaces that need a compile-time feature |
#[derive(Debug, ThisError)]
pub enum Error {
    /// No conversation is bound to the identity.
    #[error("no conversation found for {0}")]
    ConversationNotFound(String),

    /// The conversation exists but does not contain the message.
    #[error("no message {message_id} in conversation for {identity}")]
    MessageNotFound {
        /// The identity that owns the conversation.
        identity: String,
        /// The message id that was looked up.
        message_id: String,
    },

    /// The request payload is malformed.
    ///
    /// Raised when:
    /// - `role` or `content` is missing or empty on append
    /// - the identity is empty on create
    /// - a transport request body cannot be decoded
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The persistence backend failed.
    ///
    /// Never retried internally; surfaced so callers can tell a server-side
    /// failure apart from a client-input failure.
    #[error("storage unavailable during '{operation}': {cause}")]
    StorageUnavailable {
        /// The storage operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// An operation outside the store failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },

    /// Feature not enabled (requires feature flag).
    #[error("feature not enabled: {0} (compile with --features {0})")]
    FeatureNotEnabled(String),
}

impl Error {
    /// Returns true for both not-found variants.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ConversationNotFound(_) | Self::MessageNotFound { .. }
        )
    }

    /// Builds a `StorageUnavailable` error from any displayable cause.
    pub fn storage(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for parley operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
///
/// ```rust
/// assert!(parley::current_timestamp() > 0);
/// ```
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
