//! Message types and identifiers.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Creates a message ID from an existing value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh, globally unique message ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The caller-supplied part of a message: who spoke and what was said.
///
/// Missing fields deserialize as empty strings so that the store, not the
/// decoder, decides whether the payload is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaseMessage {
    /// Speaker tag, e.g. "system", "user", "assistant". Not validated against a closed set.
    #[serde(default)]
    pub role: String,
    /// Message text.
    #[serde(default)]
    pub content: String,
}

impl BaseMessage {
    /// Creates a new base message.
    #[must_use]
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Checks that both role and content are present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPayload`] if either field is empty.
    pub fn validate(&self) -> Result<()> {
        if self.role.is_empty() {
            return Err(Error::InvalidPayload("message role is required".to_string()));
        }
        if self.content.is_empty() {
            return Err(Error::InvalidPayload(
                "message content is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// A message stored in a conversation.
///
/// `id`, `role` and `content` never change after creation. Only `tags`
/// (append-only) and `read` are mutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier assigned by the store.
    pub id: MessageId,
    /// Speaker tag.
    pub role: String,
    /// Message text.
    pub content: String,
    /// Tags in the order they were added. Duplicates are kept.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Read flag.
    #[serde(default)]
    pub read: bool,
    /// Creation timestamp (Unix epoch seconds).
    #[serde(default)]
    pub created_at: u64,
}

impl Message {
    /// Builds a new message from a base message with a fresh id.
    ///
    /// Tags start empty and the message starts unread.
    #[must_use]
    pub fn from_base(base: BaseMessage) -> Self {
        Self {
            id: MessageId::generate(),
            role: base.role,
            content: base.content,
            tags: Vec::new(),
            read: false,
            created_at: crate::current_timestamp(),
        }
    }
}
