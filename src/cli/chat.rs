//! `helpdesk chat` and `helpdesk ask` command implementations.

use crate::config::load_config;
use crate::error::Result;
use crate::service::{ChatRequest, HelpdeskService};
use std::io::{self, BufRead, Write};
use uuid::Uuid;

/// Commands handled locally instead of being sent to the assistant.
#[derive(Debug, PartialEq, Eq)]
enum LocalCommand {
    Stats,
    History,
    Quit,
    Unknown(String),
}

impl LocalCommand {
    fn parse(line: &str) -> Option<Self> {
        let name = line.strip_prefix('/')?;
        Some(match name.trim() {
            "stats" => Self::Stats,
            "history" => Self::History,
            "quit" | "exit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        })
    }
}

/// Run the interactive chat loop on stdin/stdout.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the LLM client
/// cannot be built, or the terminal cannot be read or written.
pub fn run(session: Option<String>) -> Result<()> {
    let config = load_config()?;
    let service = HelpdeskService::from_config(&config)?;
    let session_id = session.unwrap_or_else(|| Uuid::new_v4().to_string());

    println!("IT Helpdesk (session {session_id})");
    println!("Type /stats, /history or /quit.\n");

    let stdin = io::stdin();
    repl(&service, &session_id, stdin.lock(), io::stdout())
}

/// Send one message and print the reply.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the LLM client
/// cannot be built.
pub fn ask(message: &str, session: Option<String>) -> Result<()> {
    let config = load_config()?;
    let service = HelpdeskService::from_config(&config)?;
    let response = service.chat(&ChatRequest {
        session_id: session.unwrap_or_else(|| Uuid::new_v4().to_string()),
        message: message.to_string(),
    });
    println!("{}", response.reply);
    Ok(())
}

fn repl(
    service: &HelpdeskService,
    session_id: &str,
    input: impl BufRead,
    mut out: impl Write,
) -> Result<()> {
    write!(out, "> ")?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();

        match LocalCommand::parse(line) {
            Some(LocalCommand::Quit) => break,
            Some(LocalCommand::Stats) => {
                let stats = service.stats()?;
                writeln!(out, "{}", serde_json::to_string_pretty(&stats)?)?;
            }
            Some(LocalCommand::History) => {
                let history = service.history(session_id);
                if history.is_empty() {
                    writeln!(out, "No messages yet.")?;
                }
                for turn in history {
                    writeln!(out, "[{}] {}", turn.role, turn.content)?;
                }
            }
            Some(LocalCommand::Unknown(name)) => {
                writeln!(out, "Unknown command: /{name}")?;
            }
            None if line.is_empty() => {}
            None => {
                let response = service.chat(&ChatRequest {
                    session_id: session_id.to_string(),
                    message: line.to_string(),
                });
                writeln!(out, "\n{}\n", response.reply)?;
            }
        }

        write!(out, "> ")?;
        out.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::knowledge::StaticKnowledgeBase;
    use crate::llm::{ChatModel, Completion, CompletionRequest};
    use crate::storage::ContextStore;
    use crate::tickets::TicketStore;
    use std::sync::Arc;

    struct Echo;

    impl ChatModel for Echo {
        fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion> {
            let last = request.messages.last().map(|t| t.content.clone());
            Ok(Completion::Text(format!("echo: {}", last.unwrap_or_default())))
        }
    }

    fn service() -> HelpdeskService {
        HelpdeskService::new(
            &Config::default(),
            Arc::new(Echo),
            Arc::new(StaticKnowledgeBase),
            Arc::new(TicketStore::new()),
            Arc::new(ContextStore::in_memory()),
        )
    }

    fn run_script(script: &str) -> String {
        let svc = service();
        let mut out = Vec::new();
        repl(&svc, "cli-test", script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parse_local_commands() {
        assert_eq!(LocalCommand::parse("/stats"), Some(LocalCommand::Stats));
        assert_eq!(LocalCommand::parse("/exit"), Some(LocalCommand::Quit));
        assert_eq!(
            LocalCommand::parse("/reset"),
            Some(LocalCommand::Unknown("reset".to_string()))
        );
        assert_eq!(LocalCommand::parse("hello"), None);
    }

    #[test]
    fn chat_then_history() {
        let out = run_script("printer jammed\n/history\n/quit\nnever sent\n");
        assert!(out.contains("echo: printer jammed"));
        assert!(out.contains("[user] printer jammed"));
        assert!(out.contains("[assistant] echo: printer jammed"));
        assert!(!out.contains("never sent"));
    }

    #[test]
    fn stats_and_unknown_commands() {
        let out = run_script("/history\n/stats\n/bogus\n");
        assert!(out.contains("No messages yet."));
        assert!(out.contains("\"total_sessions\": 0"));
        assert!(out.contains("Unknown command: /bogus"));
    }
}
