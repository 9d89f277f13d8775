//! Data models for parley.
//!
//! Identity, message and conversation types shared by the store,
//! the persistence backends and the transport layers.

mod conversation;
mod identity;
mod message;

pub use conversation::{Conversation, ConversationCreated, ConversationId};
pub use identity::Identity;
pub use message::{BaseMessage, Message, MessageId};
