//! CLI command implementations.

pub mod chat;
pub mod classify;
pub mod schema;
