//! Ticket lifecycle: model, keyword rules, store and simulated progress.

pub mod model;
pub mod progress;
pub mod rules;
pub mod store;

pub use model::{Comment, Ticket, TicketCategory, TicketPriority, TicketStatus};
pub use progress::{DemoProgress, Disabled, ProgressPolicy, ProgressStep};
pub use store::{NewTicket, StatusReport, TicketStatistics, TicketStore};
