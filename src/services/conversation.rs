//! Conversation store.
//!
//! Owns the mutation protocol on top of a [`PersistenceBackend`]. Every
//! mutation loads the current conversation, applies the change to a copy and
//! writes the copy back with a single `put`, so a failed write leaves the
//! stored state exactly as it was.

use crate::models::{
    BaseMessage, Conversation, ConversationCreated, Identity, Message, MessageId,
};
use crate::storage::{PersistenceBackend, acquire_lock};
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::instrument;

/// Per-user conversation store.
///
/// # Concurrency Model
///
/// Mutations (create, delete, append, tag, mark) are serialized per identity
/// through a lock table. Callers working on different identities never wait
/// on each other. Reads go straight to the backend, whose `get` is atomic per
/// key, so they always observe a complete conversation.
pub struct ConversationStore<P: PersistenceBackend> {
    backend: P,
    locks: Mutex<HashMap<Identity, Arc<Mutex<()>>>>,
}

impl<P: PersistenceBackend> ConversationStore<P> {
    /// Creates a store over the given backend.
    #[must_use]
    pub fn new(backend: P) -> Self {
        Self {
            backend,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the underlying backend.
    #[must_use]
    pub const fn backend(&self) -> &P {
        &self.backend
    }

    /// Creates a conversation seeded with `seed`, replacing any existing one.
    ///
    /// The seed is stored as given. Role and content are not validated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the backend write fails.
    #[instrument(skip(self, seed), fields(operation = "create", identity = %identity))]
    pub fn create_conversation(
        &self,
        identity: &Identity,
        seed: BaseMessage,
    ) -> Result<ConversationCreated> {
        let start = Instant::now();
        let result = self.with_identity_lock(identity, || {
            let conversation = Conversation::seeded(Message::from_base(seed));
            self.backend.put(identity, &conversation)?;
            tracing::info!(conversation_id = %conversation.id, "Created conversation");
            Ok(ConversationCreated {
                id: conversation.id.clone(),
                conversation,
                initiator: identity.clone(),
            })
        });
        record_store_metrics("create", start, &result);
        result
    }

    /// Returns the conversation bound to `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConversationNotFound`] if nothing is bound.
    #[instrument(skip(self), fields(operation = "get", identity = %identity))]
    pub fn get_conversation(&self, identity: &Identity) -> Result<Conversation> {
        let start = Instant::now();
        let result = self.load(identity);
        record_store_metrics("get", start, &result);
        result
    }

    /// Removes the conversation bound to `identity`.
    ///
    /// A second call for the same identity reports not found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConversationNotFound`] if nothing is bound.
    #[instrument(skip(self), fields(operation = "delete", identity = %identity))]
    pub fn delete_conversation(&self, identity: &Identity) -> Result<()> {
        let start = Instant::now();
        let result = self.with_identity_lock(identity, || {
            if self.backend.delete(identity)? {
                tracing::info!("Deleted conversation");
                Ok(())
            } else {
                Err(Error::ConversationNotFound(identity.to_string()))
            }
        });
        record_store_metrics("delete", start, &result);
        result
    }

    /// Appends a new message to the end of the conversation.
    ///
    /// The message gets a fresh id, no tags and `read = false`.
    ///
    /// # Errors
    ///
    /// - [`Error::ConversationNotFound`] if nothing is bound (checked first)
    /// - [`Error::InvalidPayload`] if role or content is empty
    #[instrument(skip(self, base), fields(operation = "append", identity = %identity, role = %base.role))]
    pub fn append_message(&self, identity: &Identity, base: BaseMessage) -> Result<Message> {
        let start = Instant::now();
        let result = self.with_identity_lock(identity, || {
            let mut conversation = self.load(identity)?;
            base.validate()?;

            let message = Message::from_base(base);
            conversation.push(message.clone());
            self.backend.put(identity, &conversation)?;

            tracing::debug!(message_id = %message.id, messages = conversation.len(), "Appended message");
            Ok(message)
        });
        record_store_metrics("append", start, &result);
        result
    }

    /// Adds `tag` to a message's tags. Duplicates are kept.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the conversation or message is missing.
    #[instrument(skip(self, tag), fields(operation = "tag", identity = %identity, message_id = %message_id))]
    pub fn tag_message(
        &self,
        identity: &Identity,
        message_id: &MessageId,
        tag: impl Into<String>,
    ) -> Result<Message> {
        let start = Instant::now();
        let tag = tag.into();
        let result = self.update_message(identity, message_id, |message| {
            message.tags.push(tag);
        });
        record_store_metrics("tag", start, &result);
        result
    }

    /// Sets a message's read flag. Overwrites, never toggles.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the conversation or message is missing.
    #[instrument(skip(self), fields(operation = "mark", identity = %identity, message_id = %message_id))]
    pub fn mark_message(
        &self,
        identity: &Identity,
        message_id: &MessageId,
        read: bool,
    ) -> Result<Message> {
        let start = Instant::now();
        let result = self.update_message(identity, message_id, |message| {
            message.read = read;
        });
        record_store_metrics("mark", start, &result);
        result
    }

    /// Returns messages whose content contains `term`, in conversation order.
    ///
    /// No match is an empty result, not an error. An empty term matches
    /// every message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConversationNotFound`] if nothing is bound.
    #[instrument(skip(self, term), fields(operation = "search", identity = %identity))]
    pub fn search_messages(&self, identity: &Identity, term: &str) -> Result<Vec<Message>> {
        let start = Instant::now();
        let result = self.load(identity).map(|c| c.search(term));
        record_store_metrics("search", start, &result);
        result
    }

    /// Returns every message's content joined by a single space.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConversationNotFound`] if nothing is bound.
    #[instrument(skip(self), fields(operation = "summarize", identity = %identity))]
    pub fn summarize(&self, identity: &Identity) -> Result<String> {
        let start = Instant::now();
        let result = self.load(identity).map(|c| c.summary());
        record_store_metrics("summarize", start, &result);
        result
    }

    /// Lists every identity with a conversation, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the backend fails.
    pub fn list_identities(&self) -> Result<Vec<Identity>> {
        let mut identities = self.backend.list_identities()?;
        identities.sort();
        Ok(identities)
    }

    /// Returns the number of stored conversations.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the backend fails.
    pub fn conversation_count(&self) -> Result<usize> {
        self.backend.count()
    }

    fn load(&self, identity: &Identity) -> Result<Conversation> {
        self.backend
            .get(identity)?
            .ok_or_else(|| Error::ConversationNotFound(identity.to_string()))
    }

    /// Applies `mutate` to one message and persists the whole conversation.
    fn update_message(
        &self,
        identity: &Identity,
        message_id: &MessageId,
        mutate: impl FnOnce(&mut Message),
    ) -> Result<Message> {
        self.with_identity_lock(identity, || {
            let mut conversation = self.load(identity)?;
            let message =
                conversation
                    .message_mut(message_id)
                    .ok_or_else(|| Error::MessageNotFound {
                        identity: identity.to_string(),
                        message_id: message_id.to_string(),
                    })?;
            mutate(message);
            let updated = message.clone();

            conversation.touch();
            self.backend.put(identity, &conversation)?;
            Ok(updated)
        })
    }

    /// Runs `f` while holding the lock for `identity`.
    fn with_identity_lock<T>(
        &self,
        identity: &Identity,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let lock = {
            let mut locks = acquire_lock(&self.locks);
            Arc::clone(locks.entry(identity.clone()).or_default())
        };

        let result = {
            let _guard = acquire_lock(&lock);
            f()
        };

        let mut locks = acquire_lock(&self.locks);
        drop(lock);
        // Only the table still holds it: nobody is waiting.
        if locks
            .get(identity)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(identity);
        }

        result
    }

    #[cfg(test)]
    fn lock_table_len(&self) -> usize {
        acquire_lock(&self.locks).len()
    }
}

fn outcome_label<T>(result: &Result<T>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(e) if e.is_not_found() => "not_found",
        Err(Error::InvalidPayload(_)) => "invalid_payload",
        Err(_) => "error",
    }
}

fn record_store_metrics<T>(operation: &'static str, start: Instant, result: &Result<T>) {
    metrics::counter!(
        "parley_store_operations_total",
        "operation" => operation,
        "status" => outcome_label(result)
    )
    .increment(1);
    metrics::histogram!("parley_store_operation_duration_ms", "operation" => operation)
        .record(start.elapsed().as_secs_f64() * 1000.0);
}
