//! Business logic services.
//!
//! Services orchestrate storage backends and provide high-level operations.

mod chat;
mod conversation;

pub use chat::{ASSISTANT_ROLE, ChatExchange, ChatSession, USER_ROLE};
pub use conversation::ConversationStore;
