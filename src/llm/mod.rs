//! LLM completion seam.
//!
//! The orchestrator talks to a [`ChatModel`]; [`OpenAiChatModel`] is the
//! HTTP implementation for OpenAI-compatible chat completion APIs.

pub mod openai;

pub use openai::OpenAiChatModel;

use crate::core::{ToolCall, Turn};
use crate::error::Result;
use crate::tools::ToolSpec;

/// How the model may use tools on this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolChoice {
    /// Model decides.
    Auto,
    /// Text only.
    None,
    /// Must call at least one tool.
    Required,
}

/// One completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Transcript so far, system turn first.
    pub messages: &'a [Turn],
    /// Tools the model may call (empty disables tool calling).
    pub tools: &'a [ToolSpec],
    /// Tool usage mode.
    pub tool_choice: ToolChoice,
    /// Sampling temperature.
    pub temperature: f32,
}

/// What the model returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Final text answer.
    Text(String),
    /// Tool calls, with any text the model sent alongside.
    ToolCalls {
        /// Accompanying text (often empty).
        content: String,
        /// Requested calls, in order.
        calls: Vec<ToolCall>,
    },
}

/// Chat completion backend.
pub trait ChatModel: Send + Sync {
    /// Run one completion.
    ///
    /// # Errors
    ///
    /// Returns `Llm` on transport, HTTP or decoding failures.
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<Completion>;
}
