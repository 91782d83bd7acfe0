//! Storage trait definitions.

use crate::core::{ConversationState, Session};
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Storage backend for sessions.
pub trait SessionStore: Send + Sync {
    /// Get a session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_session(&self, session_id: &str) -> Result<Option<Session>>;

    /// Save a session, replacing any previous copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put_session(&self, session: &Session) -> Result<()>;

    /// Snapshot of every stored session, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_sessions(&self) -> Result<Vec<SessionSummary>>;

    /// Delete a session. Deleting an unknown session is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete_session(&self, session_id: &str) -> Result<()>;
}

/// Summary information for a session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: String,

    /// Current conversation state.
    pub state: ConversationState,

    /// When the session was last accessed.
    pub last_activity: DateTime<Utc>,

    /// Number of turns in the transcript.
    pub turn_count: usize,
}
