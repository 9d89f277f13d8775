//! Chat command handler.

use super::{CmdResult, Store};
use parley::config::ParleyConfig;
use parley::llm::OpenAiClient;
use parley::{ChatSession, Identity};
use std::io::{self, BufRead, Write};

/// Chat command.
///
/// Asks a single question when one is given, otherwise reads questions from
/// stdin until EOF. Creates the conversation first if none exists.
pub fn cmd_chat(
    store: &Store,
    config: &ParleyConfig,
    user: String,
    question: Option<String>,
) -> CmdResult {
    let identity = Identity::parse(user)?;
    let client = OpenAiClient::from_config(&config.completion);
    if !client.has_api_key() {
        return Err("OPENAI_API_KEY is not set".into());
    }

    match store.get_conversation(&identity) {
        Ok(_) => {},
        Err(e) if e.is_not_found() => {
            store.create_conversation(&identity, config.seed.to_message())?;
            tracing::info!(identity = %identity, "Started new conversation");
        },
        Err(e) => return Err(e.into()),
    }

    let session = ChatSession::new(store, client, identity);

    if let Some(question) = question {
        let exchange = session.ask(&question)?;
        println!("{}", exchange.answer.content);
        return Ok(());
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }

        match session.ask(question) {
            Ok(exchange) => println!("{}\n", exchange.answer.content),
            Err(e) => eprintln!("Error: {e}"),
        }
    }
    Ok(())
}
