//! Session state types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Maximum entries kept in `recent_tickets`.
pub const MAX_RECENT_TICKETS: usize = 5;

/// Maximum entries kept in `search_history`.
pub const MAX_SEARCH_HISTORY: usize = 10;

/// Conversational state for one session key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session identifier (supplied by the caller).
    pub session_id: String,

    /// Transcript, oldest first.
    pub turns: Vec<Turn>,

    /// Structured context memory.
    pub context: ContextMemory,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// When the session was last read or written.
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Create a new session in the `general` state.
    #[must_use]
    pub fn new(session_id: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.to_string(),
            turns: Vec::new(),
            context: ContextMemory::default(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Refresh `last_activity`.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Overwrite the conversation state and shallow-merge extra context.
    pub fn set_state(&mut self, state: ConversationState, extra: Option<BTreeMap<String, Value>>) {
        self.context.state = state;
        if let Some(extra) = extra {
            self.context.extra.extend(extra);
        }
    }

    /// Record a piece of context memory.
    ///
    /// `LastIssue` and `CurrentFlow` overwrite, tickets and searches are
    /// prepended and truncated to their caps, preferences merge.
    pub fn remember(&mut self, memory: Memory) {
        let now = Utc::now();
        let context = &mut self.context;
        match memory {
            Memory::LastIssue(description) => {
                context.last_issue = Some(LastIssue {
                    description,
                    timestamp: now,
                });
            }
            Memory::CurrentFlow(flow) => context.current_flow = Some(flow),
            Memory::RecentTicket(ticket) => {
                context.recent_tickets.insert(0, ticket);
                context.recent_tickets.truncate(MAX_RECENT_TICKETS);
            }
            Memory::Search { query, results } => {
                context.search_history.insert(
                    0,
                    SearchEvent {
                        query,
                        results,
                        timestamp: now,
                    },
                );
                context.search_history.truncate(MAX_SEARCH_HISTORY);
            }
            Memory::Preferences(prefs) => context.user_preferences.extend(prefs),
        }
    }

    /// Read back one kind of context memory. `None` when nothing is stored.
    #[must_use]
    pub fn recall(&self, kind: MemoryKind) -> Option<Recalled> {
        let context = &self.context;
        match kind {
            MemoryKind::LastIssue => context.last_issue.clone().map(Recalled::LastIssue),
            MemoryKind::CurrentFlow => context.current_flow.clone().map(Recalled::CurrentFlow),
            MemoryKind::RecentTickets => (!context.recent_tickets.is_empty())
                .then(|| Recalled::RecentTickets(context.recent_tickets.clone())),
            MemoryKind::SearchHistory => (!context.search_history.is_empty())
                .then(|| Recalled::SearchHistory(context.search_history.clone())),
            MemoryKind::UserPreferences => (!context.user_preferences.is_empty())
                .then(|| Recalled::UserPreferences(context.user_preferences.clone())),
        }
    }

    /// Compact one-line context summary used to prime the LLM.
    ///
    /// Empty when the session is in `general` with nothing remembered.
    #[must_use]
    pub fn summarize(&self) -> String {
        let context = &self.context;
        let mut parts = Vec::new();

        if let Some(issue) = &context.last_issue {
            parts.push(format!("User's last reported issue: {}", issue.description));
        }
        if let Some(flow) = &context.current_flow {
            parts.push(format!("Currently in troubleshooting flow: {}", flow.title));
        }
        if let Some(ticket) = context.recent_tickets.first() {
            parts.push(format!("Recent ticket: {} - {}", ticket.id, ticket.issue));
        }
        if let Some(search) = context.search_history.first() {
            parts.push(format!("Recent search: '{}'", search.query));
        }

        if parts.is_empty() && context.state == ConversationState::General {
            return String::new();
        }

        parts.insert(0, format!("Conversation state: {}", context.state));
        format!("CONTEXT: {}", parts.join(" | "))
    }

    /// Whether any follow-up grounding is stored (last issue, flow or ticket).
    #[must_use]
    pub fn has_followup_context(&self) -> bool {
        self.context.last_issue.is_some()
            || self.context.current_flow.is_some()
            || !self.context.recent_tickets.is_empty()
    }

    /// User and assistant turns with content, for display.
    #[must_use]
    pub fn visible_history(&self) -> Vec<Turn> {
        self.turns
            .iter()
            .filter(|t| matches!(t.role, Role::User | Role::Assistant) && !t.content.is_empty())
            .cloned()
            .collect()
    }
}

/// Structured context memory within a session.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContextMemory {
    /// Current conversation state.
    pub state: ConversationState,

    /// Most recent user issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_issue: Option<LastIssue>,

    /// Active troubleshooting flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_flow: Option<ActiveFlow>,

    /// Tickets created in this session, newest first.
    #[serde(default)]
    pub recent_tickets: Vec<TicketRef>,

    /// Knowledge searches, newest first.
    #[serde(default)]
    pub search_history: Vec<SearchEvent>,

    /// Open key-value preferences.
    #[serde(default)]
    pub user_preferences: BTreeMap<String, Value>,

    /// Extra context merged by state changes (e.g. batch markers).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

/// Conversation state.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConversationState {
    /// No specific activity.
    #[default]
    General,
    /// A troubleshooting flow is running.
    Troubleshooting,
    /// A ticket was just created.
    TicketCreation,
    /// The user is following up on earlier context.
    FollowUp,
    /// A knowledge search was just run.
    KbSearch,
}

/// Last issue the user reported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LastIssue {
    /// Raw user message.
    pub description: String,

    /// When it was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Troubleshooting flow in progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveFlow {
    /// Flow identifier (e.g. `wifi_issues`).
    pub id: String,

    /// Flow title.
    pub title: String,

    /// 1-based step the user is on.
    pub step: usize,
}

/// Reference to a ticket created in this session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketRef {
    /// Ticket identifier.
    pub id: String,

    /// Issue text.
    pub issue: String,
}

/// One knowledge search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchEvent {
    /// Query text.
    pub query: String,

    /// Titles of the snippets returned.
    pub results: Vec<String>,

    /// When the search ran.
    pub timestamp: DateTime<Utc>,
}

/// Payload for [`Session::remember`].
#[derive(Debug, Clone)]
pub enum Memory {
    /// Overwrite the last issue.
    LastIssue(String),
    /// Overwrite the active flow.
    CurrentFlow(ActiveFlow),
    /// Prepend a ticket reference.
    RecentTicket(TicketRef),
    /// Prepend a search event.
    Search {
        /// Query text.
        query: String,
        /// Titles returned.
        results: Vec<String>,
    },
    /// Merge preferences.
    Preferences(BTreeMap<String, Value>),
}

/// Kinds accepted by [`Session::recall`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryKind {
    /// Last reported issue.
    LastIssue,
    /// Active troubleshooting flow.
    CurrentFlow,
    /// Recent tickets.
    RecentTickets,
    /// Search history.
    SearchHistory,
    /// User preferences.
    UserPreferences,
}

/// Result of [`Session::recall`].
#[derive(Debug, Clone, PartialEq)]
pub enum Recalled {
    /// Last reported issue.
    LastIssue(LastIssue),
    /// Active troubleshooting flow.
    CurrentFlow(ActiveFlow),
    /// Recent tickets, newest first.
    RecentTickets(Vec<TicketRef>),
    /// Search history, newest first.
    SearchHistory(Vec<SearchEvent>),
    /// User preferences.
    UserPreferences(BTreeMap<String, Value>),
}

/// Speaker of a turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// System prompt.
    System,
    /// End user.
    User,
    /// The assistant (LLM).
    Assistant,
    /// Tool result.
    Tool,
}

/// One message in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    /// Speaker.
    pub role: Role,

    /// Text content (may be empty for assistant turns that only call tools).
    pub content: String,

    /// Tool calls requested by an assistant turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Call id a tool turn answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Turn {
    /// System turn.
    #[must_use]
    pub fn system(content: &str) -> Self {
        Self::plain(Role::System, content)
    }

    /// User turn.
    #[must_use]
    pub fn user(content: &str) -> Self {
        Self::plain(Role::User, content)
    }

    /// Assistant turn with a final answer.
    #[must_use]
    pub fn assistant(content: &str) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant turn requesting tool calls.
    #[must_use]
    pub fn assistant_calls(content: &str, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    /// Tool result answering `call_id`.
    #[must_use]
    pub fn tool(call_id: &str, content: &str) -> Self {
        Self {
            tool_call_id: Some(call_id.to_string()),
            ..Self::plain(Role::Tool, content)
        }
    }

    fn plain(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// A tool invocation requested by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    /// Call id echoed back in the tool turn.
    pub id: String,

    /// Tool name.
    pub name: String,

    /// JSON-encoded arguments, as sent by the LLM (may be malformed).
    pub arguments: String,
}
