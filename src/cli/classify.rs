//! `helpdesk classify` command implementation.
//!
//! Shows how a message would be primed before it reaches the LLM: the batch
//! decision and fragments, and the follow-up classification against an
//! empty session.

use crate::core::Session;
use crate::core::classifier::{classify_follow_up, should_batch, split_batch};
use crate::error::Result;
use serde_json::{Value, json};

/// Print the classification of `message` as JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn run(message: &str) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&classify(message))?);
    Ok(())
}

fn classify(message: &str) -> Value {
    let batch = should_batch(message);
    let fragments = if batch {
        split_batch(message)
    } else {
        vec![message.to_string()]
    };

    json!({
        "batch": batch,
        "fragments": fragments,
        "follow_up": classify_follow_up(message, &Session::new("classify")),
    })
}
