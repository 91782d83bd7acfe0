//! Tool registry and dispatch.

pub mod args;
pub mod dispatch;
pub mod schema;

pub use dispatch::{Dispatcher, ToolEffect, ToolOutcome};
pub use schema::{SCHEMA_VERSION, ToolName, ToolSpec, registry, schema_document};
