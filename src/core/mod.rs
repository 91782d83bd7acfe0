//! Session types, classification and request orchestration.

pub mod classifier;
pub mod housekeeping;
pub mod orchestrator;
pub mod state;

pub use classifier::{FollowUpClassification, FollowUpContext, FollowUpIntent};
pub use orchestrator::{Orchestrator, Reply, SYSTEM_PROMPT};
pub use state::{
    ActiveFlow, ContextMemory, ConversationState, LastIssue, Memory, MemoryKind, Recalled, Role,
    SearchEvent, Session, TicketRef, ToolCall, Turn,
};
