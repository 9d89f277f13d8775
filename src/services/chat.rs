//! Chat session driving a completion provider.

use super::ConversationStore;
use crate::llm::{ChatMessage, CompletionProvider};
use crate::models::{BaseMessage, Identity, Message};
use crate::storage::PersistenceBackend;
use crate::Result;
use tracing::instrument;

/// Role recorded for the caller's question.
pub const USER_ROLE: &str = "user";

/// Role recorded for the provider's answer.
pub const ASSISTANT_ROLE: &str = "assistant";

/// One question-and-answer exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatExchange {
    /// The stored user turn.
    pub question: Message,
    /// The stored assistant turn.
    pub answer: Message,
}

/// Records a chat exchange in the store around a completion call.
///
/// Each question produces two appends: the user turn before the provider is
/// called and the assistant turn after it answers. If the provider fails the
/// user turn stays in place and no assistant turn is written.
pub struct ChatSession<'a, P: PersistenceBackend, C: CompletionProvider> {
    store: &'a ConversationStore<P>,
    provider: C,
    identity: Identity,
}

impl<'a, P: PersistenceBackend, C: CompletionProvider> ChatSession<'a, P, C> {
    /// Creates a session for `identity`.
    #[must_use]
    pub const fn new(store: &'a ConversationStore<P>, provider: C, identity: Identity) -> Self {
        Self {
            store,
            provider,
            identity,
        }
    }

    /// Returns the session identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Asks `question` and records both turns.
    ///
    /// The provider sees the full stored conversation, seed included.
    ///
    /// # Errors
    ///
    /// - store errors from either append (not found, invalid payload, storage)
    /// - the provider's error, after the user turn has been stored
    #[instrument(skip(self, question), fields(identity = %self.identity, provider = self.provider.name()))]
    pub fn ask(&self, question: &str) -> Result<ChatExchange> {
        let question = self
            .store
            .append_message(&self.identity, BaseMessage::new(USER_ROLE, question))?;

        let transcript: Vec<ChatMessage> = self
            .store
            .get_conversation(&self.identity)?
            .messages
            .iter()
            .map(ChatMessage::from)
            .collect();

        let reply = self.provider.complete(&transcript).inspect_err(|e| {
            tracing::warn!(error = %e, "Completion failed, assistant turn not recorded");
        })?;

        let answer = self
            .store
            .append_message(&self.identity, BaseMessage::new(ASSISTANT_ROLE, reply))?;

        Ok(ChatExchange { question, answer })
    }
}
