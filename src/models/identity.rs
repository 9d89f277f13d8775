//! Conversation owner identity.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, caller-supplied name of a conversation owner.
///
/// The only validation performed is non-emptiness. The identity is trusted
/// as-is; authentication happens before a request reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(String);

impl Identity {
    /// Parses an identity for operations that create state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPayload`] if the identity is empty.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(Error::InvalidPayload(
                "user identity is required".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    /// Parses an identity for lookups.
    ///
    /// An empty identity can never be bound, so it reports not-found
    /// rather than a payload error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConversationNotFound`] if the identity is empty.
    pub fn for_lookup(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(Error::ConversationNotFound(raw));
        }
        Ok(Self(raw))
    }

    /// Returns the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Identity> for String {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}
