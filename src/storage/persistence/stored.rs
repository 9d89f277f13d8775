//! On-disk conversation record shared by the durable backends.

use crate::models::{Conversation, Identity};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Current record format version.
pub const FORMAT_VERSION: u32 = 1;

/// Serializable conversation record.
///
/// The identity is stored alongside the conversation so that backends which
/// key records by a derived name (the filesystem hashes identities) can still
/// enumerate the original identities.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoredConversation {
    /// Record format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Owning identity.
    pub identity: Identity,
    /// The conversation itself.
    pub conversation: Conversation,
}

const fn default_version() -> u32 {
    FORMAT_VERSION
}

impl StoredConversation {
    /// Serializes a conversation record to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if serialization fails.
    pub fn encode(identity: &Identity, conversation: &Conversation) -> Result<String> {
        let record = StoredConversationRef {
            version: FORMAT_VERSION,
            identity,
            conversation,
        };
        serde_json::to_string(&record).map_err(|e| Error::storage("serialize_conversation", e))
    }

    /// Deserializes a conversation record from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the record is corrupt or was
    /// written by a newer format version.
    pub fn decode(json: &str) -> Result<Self> {
        let record: Self =
            serde_json::from_str(json).map_err(|e| Error::storage("deserialize_conversation", e))?;
        if record.version > FORMAT_VERSION {
            return Err(Error::storage(
                "deserialize_conversation",
                format!(
                    "record version {} is newer than supported version {FORMAT_VERSION}",
                    record.version
                ),
            ));
        }
        Ok(record)
    }
}

/// Borrowed form used for encoding without cloning the conversation.
#[derive(Serialize)]
struct StoredConversationRef<'a> {
    version: u32,
    identity: &'a Identity,
    conversation: &'a Conversation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BaseMessage, Message};

    #[test]
    fn test_encode_decode() {
        let identity = Identity::parse("u1").unwrap();
        let conversation =
            Conversation::seeded(Message::from_base(BaseMessage::new("system", "seed")));

        let json = StoredConversation::encode(&identity, &conversation).unwrap();
        let record = StoredConversation::decode(&json).unwrap();

        assert_eq!(record.version, FORMAT_VERSION);
        assert_eq!(record.identity, identity);
        assert_eq!(record.conversation, conversation);
    }

    #[test]
    fn test_decode_without_version_defaults() {
        let json = r#"{
            "identity": "u1",
            "conversation": {
                "id": "c1",
                "messages": [{"id": "m1", "role": "system", "content": "seed"}]
            }
        }"#;
        let record = StoredConversation::decode(json).unwrap();
        assert_eq!(record.version, FORMAT_VERSION);
        assert_eq!(record.conversation.messages[0].content, "seed");
    }

    #[test]
    fn test_decode_rejects_newer_version() {
        let json = r#"{"version": 99, "identity": "u1", "conversation": {"id": "c1", "messages": []}}"#;
        let err = StoredConversation::decode(json).unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
    }

    #[test]
    fn test_decode_corrupt() {
        let err = StoredConversation::decode("{not json").unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable { .. }));
    }
}
