//! Conversation types.

use super::{Identity, Message, MessageId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    /// Creates a conversation ID from an existing value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh conversation ID.
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

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered, append-only sequence of messages owned by one identity.
///
/// The first message is always the seed supplied at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier assigned at creation.
    pub id: ConversationId,
    /// Messages in conversation order.
    pub messages: Vec<Message>,
    /// Creation timestamp (Unix epoch seconds).
    #[serde(default)]
    pub created_at: u64,
    /// Last mutation timestamp (Unix epoch seconds).
    #[serde(default)]
    pub updated_at: u64,
}

impl Conversation {
    /// Starts a conversation containing only the seed message.
    #[must_use]
    pub fn seeded(seed: Message) -> Self {
        let now = crate::current_timestamp();
        Self {
            id: ConversationId::generate(),
            messages: vec![seed],
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the conversation holds no messages.
    ///
    /// A conversation built through the store always holds its seed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Finds a message by id.
    #[must_use]
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Finds a message by id for mutation.
    pub fn message_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }

    /// Appends a message at the end of the sequence.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    /// Refreshes the `updated_at` timestamp.
    pub fn touch(&mut self) {
        self.updated_at = crate::current_timestamp();
    }

    /// Returns messages whose content contains `term`, in order.
    ///
    /// Matching is a case-sensitive literal substring test.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| m.content.contains(term))
            .cloned()
            .collect()
    }

    /// Joins every message's content with a single space.
    #[must_use]
    pub fn summary(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of creating a conversation, echoed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationCreated {
    /// The new conversation.
    pub conversation: Conversation,
    /// The conversation id.
    pub id: ConversationId,
    /// The identity the conversation is bound to.
    pub initiator: Identity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BaseMessage;

    fn conversation(contents: &[&str]) -> Conversation {
        let mut iter = contents.iter();
        let seed = Message::from_base(BaseMessage::new("system", *iter.next().unwrap()));
        let mut conversation = Conversation::seeded(seed);
        for content in iter {
            conversation.push(Message::from_base(BaseMessage::new("user", *content)));
        }
        conversation
    }

    #[test]
    fn test_seeded_has_one_message() {
        let c = conversation(&["seed"]);
        assert_eq!(c.len(), 1);
        assert_eq!(c.messages[0].role, "system");
    }

    #[test]
    fn test_search_is_case_sensitive_and_ordered() {
        let c = conversation(&["seed", "Hello there", "hello again", "say hello"]);
        let hits = c.search("hello");
        let contents: Vec<_> = hits.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hello again", "say hello"]);
    }

    #[test]
    fn test_search_no_match_is_empty() {
        let c = conversation(&["seed", "hi"]);
        assert!(c.search("absent").is_empty());
    }

    #[test]
    fn test_summary_joins_with_space() {
        let c = conversation(&["seed", "hi", "there"]);
        assert_eq!(c.summary(), "seed hi there");
    }

    #[test]
    fn test_message_lookup() {
        let mut c = conversation(&["seed", "hi"]);
        let id = c.messages[1].id.clone();
        assert_eq!(c.message(&id).map(|m| m.content.as_str()), Some("hi"));
        c.message_mut(&id).unwrap().read = true;
        assert!(c.message(&id).unwrap().read);
        assert!(c.message(&MessageId::new("missing")).is_none());
    }
}
