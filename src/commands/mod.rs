//! Command handlers module.
//!
//! - `conversation.rs`: store operations (create, show, append, tag, mark,
//!   search, summary, delete, list, status)
//! - `chat.rs`: completion-backed chat
//! - `serve.rs`: HTTP server
//! - `config.rs`: configuration display

mod chat;
mod config;
mod conversation;
mod serve;

use parley::services::ConversationStore;
use parley::storage::PersistenceBackend;

pub use chat::cmd_chat;
pub use config::cmd_config;
pub use conversation::{
    cmd_append, cmd_create, cmd_delete, cmd_list, cmd_mark, cmd_search, cmd_show, cmd_status,
    cmd_summary, cmd_tag,
};
pub use serve::cmd_serve;

/// Store type used by the CLI.
pub type Store = ConversationStore<Box<dyn PersistenceBackend>>;

/// Result type of every command.
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;
