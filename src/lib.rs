//! helpdesk - Conversational IT helpdesk assistant core.
//!
//! Keeps per-session conversational context, classifies follow-ups and
//! multi-part messages, runs a bounded LLM tool-calling loop over a ticket
//! store and knowledge base, and exposes the result as a chat service.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod knowledge;
pub mod llm;
pub mod service;
pub mod storage;
pub mod tickets;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};
pub use service::{ChatRequest, ChatResponse, HelpdeskService, HelpdeskStats};
