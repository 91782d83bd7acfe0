//! Transcript trimming and sweep cadence.

use crate::core::state::{Role, Session};
use rand::Rng;
use tracing::debug;

/// Bound the transcript once it grows past `max_history` turns.
///
/// Keeps the first turn (the system prompt) and the last `keep` turns. Tool
/// turns left at the front of the kept window have lost the assistant turn
/// that requested them and are dropped too.
pub fn trim_history(session: &mut Session, max_history: usize, keep: usize) {
    let len = session.turns.len();
    if len <= max_history || len <= keep + 1 {
        return;
    }

    let mut tail = session.turns.split_off(len - keep);
    let orphans = tail.iter().take_while(|t| t.role == Role::Tool).count();
    tail.drain(..orphans);

    session.turns.truncate(1);
    session.turns.extend(tail);
    debug!(
        session_id = %session.session_id,
        before = len,
        after = session.turns.len(),
        "Trimmed history"
    );
}

/// Roll whether this request should run the stale-session sweep.
/// `one_in == 0` disables sweeping.
pub fn should_sweep(rng: &mut impl Rng, one_in: u32) -> bool {
    one_in > 0 && rng.gen_range(0..one_in) == 0
}
