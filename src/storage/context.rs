//! Session/context store.
//!
//! Wraps a [`SessionStore`] backend with the context operations used by the
//! orchestrator and a per-session lock so two requests for the same session
//! cannot interleave their read-modify-write cycles.

use crate::core::{ConversationState, Memory, MemoryKind, Recalled, Session};
use crate::error::Result;
use crate::storage::memory::MemoryBackend;
use crate::storage::traits::SessionStore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Aggregate session counts.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SessionStatistics {
    /// Number of live sessions.
    pub total_sessions: usize,

    /// Sessions per conversation state.
    pub by_state: BTreeMap<ConversationState, usize>,

    /// Transcript turns held across all sessions.
    pub total_turns: usize,
}

/// Process-wide session store.
pub struct ContextStore {
    backend: Box<dyn SessionStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ContextStore {
    /// Create a store over the given backend.
    #[must_use]
    pub fn new(backend: impl SessionStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store backed by memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(session_id.to_string()).or_default())
    }

    /// Run `f` against a working copy of the session while holding its lock.
    ///
    /// The session is created if missing and its `last_activity` refreshed.
    /// The copy is written back only when `f` succeeds, so a failed request
    /// leaves the stored session untouched.
    ///
    /// # Errors
    ///
    /// Returns the error from `f` or from the backend.
    pub fn with_session<T>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Session) -> Result<T>,
    ) -> Result<T> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut session = match self.backend.get_session(session_id)? {
            Some(session) => session,
            None => {
                debug!(session_id, "Creating session");
                Session::new(session_id)
            }
        };
        session.touch();

        let out = f(&mut session)?;
        self.backend.put_session(&session)?;
        Ok(out)
    }

    /// Stored session, without creating or touching it.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn get(&self, session_id: &str) -> Result<Option<Session>> {
        self.backend.get_session(session_id)
    }

    /// Return the session, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn get_or_create(&self, session_id: &str) -> Result<Session> {
        self.with_session(session_id, |session| Ok(session.clone()))
    }

    /// Overwrite the conversation state, merging optional extra context.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn set_state(
        &self,
        session_id: &str,
        state: ConversationState,
        extra: Option<BTreeMap<String, Value>>,
    ) -> Result<()> {
        self.with_session(session_id, |session| {
            session.set_state(state, extra);
            Ok(())
        })
    }

    /// Record a piece of context memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn remember(&self, session_id: &str, memory: Memory) -> Result<()> {
        self.with_session(session_id, |session| {
            session.remember(memory);
            Ok(())
        })
    }

    /// Read back one kind of context memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn recall(&self, session_id: &str, kind: MemoryKind) -> Result<Option<Recalled>> {
        self.with_session(session_id, |session| Ok(session.recall(kind)))
    }

    /// Context summary line for the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn summarize(&self, session_id: &str) -> Result<String> {
        self.with_session(session_id, |session| Ok(session.summarize()))
    }

    /// Remove sessions idle for longer than `max_age`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn sweep(&self, max_age: Duration) -> Result<usize> {
        self.sweep_at(Utc::now(), max_age)
    }

    /// [`Self::sweep`] evaluated at `now`.
    ///
    /// Sessions currently held by a request are skipped. Each candidate is
    /// re-read under the lock table before deletion so a session touched
    /// after the snapshot survives. A negative `max_age`, or one reaching
    /// past the earliest representable time, removes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn sweep_at(&self, now: DateTime<Utc>, max_age: Duration) -> Result<usize> {
        if max_age < Duration::zero() {
            return Ok(0);
        }
        let Some(cutoff) = now.checked_sub_signed(max_age) else {
            return Ok(0);
        };
        let candidates = self.backend.list_sessions()?;
        let mut removed = 0;

        for summary in candidates {
            if summary.last_activity >= cutoff {
                continue;
            }

            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            let held = locks.get(&summary.session_id).cloned();
            let _guard = match &held {
                // One reference in the table, one here: nobody else is waiting
                Some(lock) if Arc::strong_count(lock) == 2 => match lock.try_lock() {
                    Ok(guard) => Some(guard),
                    Err(_) => continue,
                },
                Some(_) => continue,
                None => None,
            };

            let Some(session) = self.backend.get_session(&summary.session_id)? else {
                continue;
            };
            if session.last_activity >= cutoff {
                continue;
            }

            self.backend.delete_session(&summary.session_id)?;
            locks.remove(&summary.session_id);
            removed += 1;
        }

        if removed > 0 {
            info!(removed, "Swept stale sessions");
        }
        Ok(removed)
    }

    /// Session counts by state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn statistics(&self) -> Result<SessionStatistics> {
        let sessions = self.backend.list_sessions()?;
        let mut stats = SessionStatistics {
            total_sessions: sessions.len(),
            ..SessionStatistics::default()
        };
        for summary in sessions {
            *stats.by_state.entry(summary.state).or_insert(0) += 1;
            stats.total_turns += summary.turn_count;
        }
        Ok(stats)
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
