//! helpdesk CLI - Conversational IT helpdesk assistant.

use clap::{Parser, Subcommand};
use helpdesk::cli;
use helpdesk::config::load_config;
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "helpdesk")]
#[command(author, version, about = "Conversational IT helpdesk assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively. Lines starting with / are local commands (/stats, /history, /quit).
    Chat {
        /// Session ID. Defaults to a new random ID.
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Send a single message and print the reply.
    Ask {
        /// Message text.
        message: String,

        /// Session ID. Defaults to a new random ID.
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Print the tool schema as JSON.
    Schema,

    /// Show how a message is classified (batching and follow-up intent).
    Classify {
        /// Message text.
        message: String,
    },
}

/// Install the stderr subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing() {
    let level = load_config().map(|c| c.logging.level).unwrap_or_else(|_| "warn".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Chat { session } => cli::chat::run(session),
        Commands::Ask { message, session } => cli::chat::ask(&message, session),
        Commands::Schema => cli::schema::run(),
        Commands::Classify { message } => cli::classify::run(&message),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("helpdesk: error: {e}");
            ExitCode::FAILURE
        }
    }
}
