//! In-memory persistence backend.
//!
//! Not durable. Used for tests and for the `memory` storage mode.

use crate::Result;
use crate::models::{Conversation, Identity};
use crate::storage::traits::PersistenceBackend;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-memory persistence backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    conversations: RwLock<HashMap<Identity, Conversation>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, identity: &Identity) -> Result<Option<Conversation>> {
        let map = self
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(identity).cloned())
    }

    fn put(&self, identity: &Identity, conversation: &Conversation) -> Result<()> {
        let mut map = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        map.insert(identity.clone(), conversation.clone());
        Ok(())
    }

    fn delete(&self, identity: &Identity) -> Result<bool> {
        let mut map = self
            .conversations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(map.remove(identity).is_some())
    }

    fn list_identities(&self) -> Result<Vec<Identity>> {
        let map = self
            .conversations
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut identities: Vec<_> = map.keys().cloned().collect();
        identities.sort();
        Ok(identities)
    }
}
