//! Binary entry point for parley.
//!
//! This binary provides the CLI interface for the conversation store.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use parley::config::ParleyConfig;
use parley::observability::{self, LoggingConfig};
use parley::services::ConversationStore;
use std::path::PathBuf;
use std::process::ExitCode;

/// Parley - per-user conversation store for a personalized assistant.
#[derive(Parser)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "PARLEY_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Serve the conversation API over HTTP.
    Serve {
        /// Bind address (overrides config).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create (or replace) a user's conversation.
    Create {
        /// User identity.
        user: String,

        /// Seed message content (defaults to the configured seed).
        #[arg(short, long)]
        seed: Option<String>,
    },

    /// Show a user's conversation.
    Show {
        /// User identity.
        user: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Append a message.
    Append {
        /// User identity.
        user: String,

        /// Message content.
        content: String,

        /// Speaker role.
        #[arg(short, long, default_value = "user")]
        role: String,
    },

    /// Tag a message.
    Tag {
        /// User identity.
        user: String,

        /// Message ID.
        message_id: String,

        /// Tag to add.
        tag: String,
    },

    /// Mark a message read (or unread).
    Mark {
        /// User identity.
        user: String,

        /// Message ID.
        message_id: String,

        /// Mark unread instead of read.
        #[arg(long)]
        unread: bool,
    },

    /// Search a conversation by literal substring.
    Search {
        /// User identity.
        user: String,

        /// Search term (case-sensitive).
        term: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print the space-joined conversation text.
    Summary {
        /// User identity.
        user: String,
    },

    /// Delete a user's conversation.
    Delete {
        /// User identity.
        user: String,
    },

    /// List users with a conversation.
    List,

    /// Ask the completion API and record both turns.
    Chat {
        /// User identity.
        user: String,

        /// Question to ask. Reads questions from stdin when omitted.
        question: Option<String>,
    },

    /// Show status.
    Status,

    /// Manage configuration.
    Config {
        /// Show current configuration.
        #[arg(long)]
        show: bool,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match ParleyConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let logging = LoggingConfig::from_settings(&config.logging, cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: &ParleyConfig) -> commands::CmdResult {
    if let Commands::Config { show } = cli.command {
        return commands::cmd_config(config, show, cli.verbose);
    }

    let store = ConversationStore::new(parley::storage::open_backend(config)?);

    match cli.command {
        Commands::Serve { host, port } => commands::cmd_serve(store, config, host, port),
        Commands::Create { user, seed } => commands::cmd_create(&store, config, user, seed),
        Commands::Show { user, json } => commands::cmd_show(&store, user, json),
        Commands::Append {
            user,
            content,
            role,
        } => commands::cmd_append(&store, user, role, content),
        Commands::Tag {
            user,
            message_id,
            tag,
        } => commands::cmd_tag(&store, user, message_id, tag),
        Commands::Mark {
            user,
            message_id,
            unread,
        } => commands::cmd_mark(&store, user, message_id, unread),
        Commands::Search { user, term, json } => commands::cmd_search(&store, user, term, json),
        Commands::Summary { user } => commands::cmd_summary(&store, user),
        Commands::Delete { user } => commands::cmd_delete(&store, user),
        Commands::List => commands::cmd_list(&store),
        Commands::Chat { user, question } => commands::cmd_chat(&store, config, user, question),
        Commands::Status => commands::cmd_status(&store, config),
        Commands::Config { show } => commands::cmd_config(config, show, cli.verbose),
    }
}
