//! Typed request and response bodies.
//!
//! Field names follow the camelCase JSON used by the web client. Missing or
//! `null` strings decode as empty so the store decides between not-found and
//! invalid-payload.

use crate::models::BaseMessage;
use serde::{Deserialize, Deserializer, Serialize};

/// Decodes `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// `PUT /conversation`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    /// Owner of the new conversation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_identity: String,
}

/// `POST /add/conversation`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendMessageRequest {
    /// Owner of the conversation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_identity: String,
    /// Sent by the web client; the stored conversation keeps its own id.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// The message to append.
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: MessageBody,
}

/// Message fields of an append request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MessageBody {
    /// Speaker role.
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: String,
    /// Message text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

impl From<MessageBody> for BaseMessage {
    fn from(body: MessageBody) -> Self {
        Self::new(body.role, body.content)
    }
}

/// `POST /conversation/tag`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagMessageRequest {
    /// Owner of the conversation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_identity: String,
    /// Message to tag.
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_id: String,
    /// Tag to add.
    pub tag: String,
}

/// `POST /conversation/mark`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkMessageRequest {
    /// Owner of the conversation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_identity: String,
    /// Message to mark.
    #[serde(default, deserialize_with = "null_as_default")]
    pub message_id: String,
    /// New read flag.
    pub read: bool,
}

/// Query string of the search endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    /// Search term. Absent means match everything.
    #[serde(default)]
    pub q: Option<String>,
}

/// Response of the summary endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryResponse {
    /// Space-joined message contents.
    pub summary: String,
}

/// Response carrying a human-readable confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Confirmation text.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_request_decodes_client_shape() {
        let request: AppendMessageRequest = serde_json::from_str(
            r#"{"userIdentity":"u1","conversationId":"c1","message":{"role":"user","content":"hi"}}"#,
        )
        .unwrap();
        assert_eq!(request.user_identity, "u1");
        assert_eq!(request.conversation_id.as_deref(), Some("c1"));
        assert_eq!(BaseMessage::from(request.message), BaseMessage::new("user", "hi"));
    }

    #[test]
    fn test_append_request_tolerates_missing_fields() {
        let request: AppendMessageRequest = serde_json::from_str(r#"{"userIdentity":"u1"}"#).unwrap();
        assert_eq!(request.message, MessageBody::default());
    }

    #[test]
    fn test_append_request_treats_null_as_missing() {
        let request: AppendMessageRequest =
            serde_json::from_str(r#"{"userIdentity":null,"message":null}"#).unwrap();
        assert!(request.user_identity.is_empty());
        assert_eq!(request.message, MessageBody::default());

        let request: AppendMessageRequest = serde_json::from_str(
            r#"{"userIdentity":"u1","message":{"role":null,"content":"hi"}}"#,
        )
        .unwrap();
        assert_eq!(
            BaseMessage::from(request.message),
            BaseMessage::new("", "hi")
        );
    }

    #[test]
    fn test_mark_request_requires_read_flag() {
        let result: Result<MarkMessageRequest, _> =
            serde_json::from_str(r#"{"userIdentity":"u1","messageId":"m1"}"#);
        assert!(result.is_err());
    }
}
