//! Session storage.

pub mod context;
pub mod memory;
pub mod traits;

pub use context::{ContextStore, SessionStatistics};
pub use memory::MemoryBackend;
pub use traits::{SessionStore, SessionSummary};
