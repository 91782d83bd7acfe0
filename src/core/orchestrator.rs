//! Request orchestration.
//!
//! One call to [`Orchestrator::handle`] primes the user message with
//! follow-up, batch and context information, then alternates between the
//! LLM and the tool dispatcher until the model answers in text or the
//! tool-call budget runs out. The whole request runs against a working copy
//! of the session; nothing is committed if the LLM fails.

use crate::config::OrchestratorConfig;
use crate::core::classifier::{
    apply_preamble, batch_payload, classify_follow_up, render_followup_preamble, should_batch,
    split_batch,
};
use crate::core::housekeeping::{should_sweep, trim_history};
use crate::core::state::{ConversationState, Memory, Session, Turn};
use crate::error::Result;
use crate::llm::{ChatModel, Completion, CompletionRequest, ToolChoice};
use crate::storage::ContextStore;
use crate::tools::{Dispatcher, ToolEffect, registry};
use chrono::Duration;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Opening system turn of every session.
pub const SYSTEM_PROMPT: &str = "You are an IT helpdesk assistant for an enterprise environment.

Be helpful, concise and professional. Remember context from earlier in the conversation and \
handle follow-ups such as \"that didn't work\". When several questions arrive together, answer \
each one.

Tools:
- search_knowledge_base and get_faq_answer for documented fixes. Search before answering technical questions.
- start_troubleshooting_flow for Wi-Fi, printer and email problems (wifi_issues, printer_issues, email_issues).
- create_ticket when hands-on help is needed or suggested fixes did not work.
- check_ticket_status and list_my_tickets to track tickets.
- get_software_info for approved software versions and installers.
- get_helpdesk_stats for queue statistics.

Suggest next steps or alternatives when a fix does not work.";

/// Reply used when the model answers with empty text.
pub const FALLBACK_REPLY: &str = "I'm here to help with your IT needs.";

/// Result of one handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Final assistant text.
    pub text: String,

    /// User and assistant turns, for display.
    pub history: Vec<Turn>,
}

/// Drives the LLM/tool loop for each request.
pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    dispatcher: Dispatcher,
    contexts: Arc<ContextStore>,
    config: OrchestratorConfig,
    temperature: f32,
    rng: Mutex<StdRng>,
}

impl Orchestrator {
    /// Create an orchestrator.
    #[must_use]
    pub fn new(
        model: Arc<dyn ChatModel>,
        dispatcher: Dispatcher,
        contexts: Arc<ContextStore>,
        config: OrchestratorConfig,
        temperature: f32,
    ) -> Self {
        Self {
            model,
            dispatcher,
            contexts,
            config,
            temperature,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Use a fixed seed for the sweep roll.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Handle one user message for `session_id`.
    ///
    /// # Errors
    ///
    /// Returns the LLM or backend error that aborted the request. The stored
    /// session is unchanged in that case.
    pub fn handle(&self, session_id: &str, message: &str) -> Result<Reply> {
        let result = self
            .contexts
            .with_session(session_id, |session| self.run(session, message));
        self.maybe_sweep();
        result
    }

    fn run(&self, session: &mut Session, message: &str) -> Result<Reply> {
        if session.turns.is_empty() {
            session.turns.push(Turn::system(SYSTEM_PROMPT));
        }

        let payload = prime(session, message);
        session.remember(Memory::LastIssue(message.to_string()));
        session.turns.push(Turn::user(&payload));

        let text = self.turn_loop(session)?;
        trim_history(session, self.config.max_history, self.config.history_keep);

        Ok(Reply {
            text,
            history: session.visible_history(),
        })
    }

    fn turn_loop(&self, session: &mut Session) -> Result<String> {
        let mut tool_outputs = Vec::new();

        for turn in 0..self.config.max_tool_turns {
            let request = CompletionRequest {
                messages: &session.turns,
                tools: registry(),
                tool_choice: ToolChoice::Auto,
                temperature: self.temperature,
            };

            match self.model.complete(&request)? {
                Completion::Text(text) => {
                    let text = if text.trim().is_empty() {
                        FALLBACK_REPLY.to_string()
                    } else {
                        text
                    };
                    session.turns.push(Turn::assistant(&text));
                    return Ok(text);
                }
                Completion::ToolCalls { content, calls } => {
                    debug!(
                        session_id = %session.session_id,
                        turn,
                        calls = calls.len(),
                        "Model requested tools"
                    );
                    session
                        .turns
                        .push(Turn::assistant_calls(&content, calls.clone()));

                    for call in calls {
                        let outcome = self.dispatcher.dispatch(&call.name, &call.arguments);
                        if let Some(effect) = outcome.effect {
                            apply_effect(session, effect);
                        }
                        session.turns.push(Turn::tool(&call.id, &outcome.text));
                        tool_outputs.push(outcome.text);
                    }
                }
            }
        }

        warn!(
            session_id = %session.session_id,
            max_tool_turns = self.config.max_tool_turns,
            "Tool-call budget exhausted, answering from tool output"
        );
        let text = synthesize(&tool_outputs);
        session.turns.push(Turn::assistant(&text));
        Ok(text)
    }

    fn maybe_sweep(&self) {
        let roll = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            should_sweep(&mut *rng, self.config.sweep_one_in)
        };
        if !roll {
            return;
        }

        let Some(max_age) = Duration::try_hours(self.config.session_max_age_hours) else {
            warn!(
                session_max_age_hours = self.config.session_max_age_hours,
                "Session max age out of range, skipping sweep"
            );
            return;
        };
        match self.contexts.sweep(max_age) {
            Ok(removed) => debug!(removed, "Periodic session sweep finished"),
            Err(e) => warn!(error = %e, "Session sweep failed"),
        }
    }
}

/// Build the user payload: batch wrapping, follow-up preamble, context
/// summary from before this message.
fn prime(session: &mut Session, message: &str) -> String {
    let classification = classify_follow_up(message, session);
    if let Some(intent) = classification.intent {
        debug!(
            session_id = %session.session_id,
            %intent,
            has_context = classification.has_context,
            "Follow-up detected"
        );
    }

    let mut payload = message.to_string();
    if should_batch(message) {
        let fragments = split_batch(message);
        if fragments.len() > 1 {
            debug!(session_id = %session.session_id, count = fragments.len(), "Batching message");
            let extra = BTreeMap::from([
                ("batch_processing".to_string(), Value::Bool(true)),
                ("total_queries".to_string(), json!(fragments.len())),
            ]);
            session.set_state(ConversationState::General, Some(extra));
            payload = batch_payload(&fragments);
        }
    }

    if let Some(preamble) = render_followup_preamble(&classification) {
        payload = apply_preamble(&preamble, &payload);
    }

    let summary = session.summarize();
    if summary.is_empty() {
        payload
    } else {
        format!("{summary}\n\nUser: {payload}")
    }
}

fn apply_effect(session: &mut Session, effect: ToolEffect) {
    match effect {
        ToolEffect::Searched { query, results } => {
            session.set_state(ConversationState::KbSearch, None);
            session.remember(Memory::Search { query, results });
        }
        ToolEffect::TicketCreated(ticket) => {
            session.set_state(ConversationState::TicketCreation, None);
            session.remember(Memory::RecentTicket(ticket));
        }
        ToolEffect::FlowStarted(flow) => {
            session.set_state(ConversationState::Troubleshooting, None);
            session.remember(Memory::CurrentFlow(flow));
        }
        ToolEffect::TicketChecked => session.set_state(ConversationState::FollowUp, None),
    }
}

fn synthesize(tool_outputs: &[String]) -> String {
    if tool_outputs.is_empty() {
        return FALLBACK_REPLY.to_string();
    }
    format!(
        "Here is what I found so far:\n\n{}",
        tool_outputs.join("\n\n")
    )
}
