//! Request/response surface.
//!
//! [`HelpdeskService`] is what a web or CLI front end calls: one chat
//! operation and one stats query. Failures never reach the caller as
//! errors; they are logged and answered with a fixed apology.

use crate::config::{Config, DemoConfig};
use crate::core::{Orchestrator, Turn};
use crate::error::Result;
use crate::knowledge::{KnowledgeLookup, StaticKnowledgeBase};
use crate::llm::{ChatModel, OpenAiChatModel};
use crate::storage::{ContextStore, SessionStatistics};
use crate::tickets::{DemoProgress, TicketStatistics, TicketStore};
use crate::tools::Dispatcher;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, info_span};
use uuid::Uuid;

/// Reply sent when a request fails.
pub const APOLOGY: &str =
    "I'm sorry, I ran into a problem while handling your request. Please try again in a moment.";

/// Incoming chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// Caller-supplied session key.
    pub session_id: String,
    /// User text.
    pub message: String,
}

/// Chat reply with the visible transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// Assistant reply.
    pub reply: String,
    /// User and assistant turns, oldest first.
    pub history: Vec<Turn>,
}

/// Aggregate counts for the stats/health query.
#[derive(Debug, Clone, Serialize)]
pub struct HelpdeskStats {
    /// Ticket counts.
    pub tickets: TicketStatistics,
    /// Session counts.
    pub sessions: SessionStatistics,
}

/// Helpdesk core wired to its collaborators.
pub struct HelpdeskService {
    orchestrator: Orchestrator,
    contexts: Arc<ContextStore>,
    tickets: Arc<TicketStore>,
}

impl HelpdeskService {
    /// Wire a service from explicit collaborators.
    #[must_use]
    pub fn new(
        config: &Config,
        model: Arc<dyn ChatModel>,
        knowledge: Arc<dyn KnowledgeLookup>,
        tickets: Arc<TicketStore>,
        contexts: Arc<ContextStore>,
    ) -> Self {
        let dispatcher = Dispatcher::new(
            Arc::clone(&tickets),
            knowledge,
            config.knowledge.max_results,
        );
        let orchestrator = Orchestrator::new(
            model,
            dispatcher,
            Arc::clone(&contexts),
            config.orchestrator.clone(),
            config.llm.temperature,
        );
        Self {
            orchestrator,
            contexts,
            tickets,
        }
    }

    /// Wire a service from configuration: HTTP chat model, built-in
    /// knowledge base, in-memory sessions, demo progress if enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the LLM client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        let model = OpenAiChatModel::new(&config.llm)?;
        Ok(Self::new(
            config,
            Arc::new(model),
            Arc::new(StaticKnowledgeBase),
            Arc::new(ticket_store(&config.demo)),
            Arc::new(ContextStore::in_memory()),
        ))
    }

    /// Handle one chat message.
    pub fn chat(&self, request: &ChatRequest) -> ChatResponse {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "chat",
            session_id = %request.session_id,
            %request_id
        );
        let _enter = span.enter();

        match self
            .orchestrator
            .handle(&request.session_id, &request.message)
        {
            Ok(reply) => {
                info!(turns = reply.history.len(), "Chat request handled");
                ChatResponse {
                    reply: reply.text,
                    history: reply.history,
                }
            }
            Err(e) => {
                error!(error = %e, "Chat request failed");
                ChatResponse {
                    reply: APOLOGY.to_string(),
                    history: self.history(&request.session_id),
                }
            }
        }
    }

    /// Visible transcript of a session; empty if unknown.
    #[must_use]
    pub fn history(&self, session_id: &str) -> Vec<Turn> {
        match self.contexts.get(session_id) {
            Ok(session) => session.map(|s| s.visible_history()).unwrap_or_default(),
            Err(e) => {
                error!(session_id, error = %e, "Failed to read session history");
                Vec::new()
            }
        }
    }

    /// Ticket and session counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the session backend fails.
    pub fn stats(&self) -> Result<HelpdeskStats> {
        Ok(HelpdeskStats {
            tickets: self.tickets.statistics(),
            sessions: self.contexts.statistics()?,
        })
    }
}

fn ticket_store(demo: &DemoConfig) -> TicketStore {
    let store = if demo.enabled {
        info!("Demo mode: simulating ticket progress");
        TicketStore::with_progress(DemoProgress::new(demo.progress.clone()))
    } else {
        TicketStore::new()
    };
    if demo.seed_tickets {
        store.seed_samples();
    }
    store
}
