//! Persistence backend trait.

use crate::Result;
use crate::models::{Conversation, Identity};

/// Trait for persistence layer backends.
///
/// Persistence backends are the single authoritative source of truth for
/// conversations, keyed by identity. Each call must be atomic with respect
/// to a single key: a `put` either fully replaces the stored conversation
/// or leaves the previous value in place.
pub trait PersistenceBackend: Send + Sync {
    /// Short backend name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Retrieves the conversation bound to an identity.
    fn get(&self, identity: &Identity) -> Result<Option<Conversation>>;

    /// Stores a conversation, overwriting any previous value.
    fn put(&self, identity: &Identity, conversation: &Conversation) -> Result<()>;

    /// Removes the binding. Returns false if nothing was bound.
    fn delete(&self, identity: &Identity) -> Result<bool>;

    /// Lists every bound identity.
    fn list_identities(&self) -> Result<Vec<Identity>>;

    /// Checks if an identity has a conversation.
    fn exists(&self, identity: &Identity) -> Result<bool> {
        Ok(self.get(identity)?.is_some())
    }

    /// Returns the number of bound identities.
    fn count(&self) -> Result<usize> {
        Ok(self.list_identities()?.len())
    }
}

impl<P: PersistenceBackend + ?Sized> PersistenceBackend for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn get(&self, identity: &Identity) -> Result<Option<Conversation>> {
        (**self).get(identity)
    }

    fn put(&self, identity: &Identity, conversation: &Conversation) -> Result<()> {
        (**self).put(identity, conversation)
    }

    fn delete(&self, identity: &Identity) -> Result<bool> {
        (**self).delete(identity)
    }

    fn list_identities(&self) -> Result<Vec<Identity>> {
        (**self).list_identities()
    }

    fn exists(&self, identity: &Identity) -> Result<bool> {
        (**self).exists(identity)
    }

    fn count(&self) -> Result<usize> {
        (**self).count()
    }
}
