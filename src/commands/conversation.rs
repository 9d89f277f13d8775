//! Conversation command handlers.

use super::{CmdResult, Store};
use parley::config::ParleyConfig;
use parley::{BaseMessage, Identity, Message, MessageId};

fn print_message(message: &Message) {
    let read = if message.read { "read" } else { "unread" };
    println!("[{}] {} ({read})", message.id, message.role);
    if !message.tags.is_empty() {
        println!("  tags: {}", message.tags.join(", "));
    }
    for line in message.content.lines() {
        println!("  {line}");
    }
}

/// Formats Unix seconds as RFC 3339, or the raw number if out of range.
fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map_or_else(|| secs.to_string(), |dt| dt.to_rfc3339())
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Create command.
pub fn cmd_create(
    store: &Store,
    config: &ParleyConfig,
    user: String,
    seed: Option<String>,
) -> CmdResult {
    let identity = Identity::parse(user)?;
    let seed = seed.map_or_else(
        || config.seed.to_message(),
        |content| BaseMessage::new(&config.seed.role, content),
    );

    let created = store.create_conversation(&identity, seed)?;
    println!("Conversation created:");
    println!("  ID: {}", created.id);
    println!("  Initiator: {}", created.initiator);
    println!("  Seed message: {}", created.conversation.messages[0].id);
    Ok(())
}

/// Show command.
pub fn cmd_show(store: &Store, user: String, json: bool) -> CmdResult {
    let conversation = store.get_conversation(&Identity::for_lookup(user)?)?;
    if json {
        return print_json(&conversation);
    }

    println!(
        "Conversation {} ({} messages)",
        conversation.id,
        conversation.len()
    );
    println!("Created: {}", format_timestamp(conversation.created_at));
    println!("Updated: {}", format_timestamp(conversation.updated_at));
    println!();
    for message in &conversation.messages {
        print_message(message);
    }
    Ok(())
}

/// Append command.
pub fn cmd_append(store: &Store, user: String, role: String, content: String) -> CmdResult {
    let message = store.append_message(
        &Identity::for_lookup(user)?,
        BaseMessage::new(role, content),
    )?;
    println!("Message appended: {}", message.id);
    Ok(())
}

/// Tag command.
pub fn cmd_tag(store: &Store, user: String, message_id: String, tag: String) -> CmdResult {
    let message = store.tag_message(
        &Identity::for_lookup(user)?,
        &MessageId::new(message_id),
        tag,
    )?;
    println!("Tags for {}: {}", message.id, message.tags.join(", "));
    Ok(())
}

/// Mark command. Marks read unless `unread` is set.
pub fn cmd_mark(store: &Store, user: String, message_id: String, unread: bool) -> CmdResult {
    let message = store.mark_message(
        &Identity::for_lookup(user)?,
        &MessageId::new(message_id),
        !unread,
    )?;
    let state = if message.read { "read" } else { "unread" };
    println!("Message {} marked {state}", message.id);
    Ok(())
}

/// Search command.
pub fn cmd_search(store: &Store, user: String, term: String, json: bool) -> CmdResult {
    let messages = store.search_messages(&Identity::for_lookup(user)?, &term)?;
    if json {
        return print_json(&messages);
    }

    println!("Found {} messages:", messages.len());
    for message in &messages {
        print_message(message);
    }
    Ok(())
}

/// Summary command.
pub fn cmd_summary(store: &Store, user: String) -> CmdResult {
    println!("{}", store.summarize(&Identity::for_lookup(user)?)?);
    Ok(())
}

/// Delete command.
pub fn cmd_delete(store: &Store, user: String) -> CmdResult {
    let identity = Identity::for_lookup(user)?;
    store.delete_conversation(&identity)?;
    println!("Conversation for {identity} deleted");
    Ok(())
}

/// List command.
pub fn cmd_list(store: &Store) -> CmdResult {
    let identities = store.list_identities()?;
    if identities.is_empty() {
        println!("No conversations stored.");
    }
    for identity in identities {
        println!("{identity}");
    }
    Ok(())
}

/// Status command.
pub fn cmd_status(store: &Store, config: &ParleyConfig) -> CmdResult {
    println!("Parley Status");
    println!("=============");
    println!();
    println!("Backend: {}", store.backend().name());
    println!("Data Directory: {}", config.data_dir.display());
    println!("Conversations: {}", store.conversation_count()?);
    Ok(())
}
