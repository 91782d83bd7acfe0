//! Error types for the helpdesk core.

use std::io;
use thiserror::Error;

use crate::tickets::TicketStatus;

/// Result type alias for helpdesk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in helpdesk operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (config file, terminal).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Invalid state encountered.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Ticket not found.
    #[error("Ticket {0} not found")]
    TicketNotFound(String),

    /// Ticket status change not permitted by the lifecycle.
    #[error("Cannot move ticket from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: TicketStatus,
        /// Requested status.
        to: TicketStatus,
    },

    /// Tool arguments failed to decode or validate.
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments {
        /// Tool name.
        tool: String,
        /// What was wrong.
        reason: String,
    },

    /// Tool name not in the registry.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// LLM completion service failed.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge lookup service failed.
    #[error("Knowledge lookup error: {0}")]
    Knowledge(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
