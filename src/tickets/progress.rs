//! Simulated ticket progress for demos.
//!
//! Production deployments use [`Disabled`]. [`DemoProgress`] moves tickets
//! along the lifecycle with the probabilities from the configured
//! [`ProgressTable`] each time a status is checked.

use crate::config::ProgressTable;
use crate::tickets::model::{Ticket, TicketStatus};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Mutex, PoisonError};

/// A status change proposed by a progress policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStep {
    /// Target status.
    pub status: TicketStatus,

    /// Comment logged before the status-change audit entry.
    pub comment: &'static str,
}

/// Decides whether a ticket advances on its own.
pub trait ProgressPolicy: Send + Sync {
    /// Next step for `ticket`, given hours since creation.
    fn next_step(&self, ticket: &Ticket, elapsed_hours: f64) -> Option<ProgressStep>;
}

/// Tickets never move on their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct Disabled;

impl ProgressPolicy for Disabled {
    fn next_step(&self, _ticket: &Ticket, _elapsed_hours: f64) -> Option<ProgressStep> {
        None
    }
}

const ASSIGNED: &str = "Technician has been assigned and is reviewing the issue.";
const RESOLVED: &str = "Issue has been resolved. Please test and confirm the solution works.";
const NEEDS_INFO: &str = "We need additional information to continue troubleshooting.";

/// Random progress driven by a probability table.
#[derive(Debug)]
pub struct DemoProgress {
    table: ProgressTable,
    rng: Mutex<StdRng>,
}

impl DemoProgress {
    /// Policy seeded from OS entropy.
    #[must_use]
    pub fn new(table: ProgressTable) -> Self {
        Self {
            table,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Policy with a fixed seed.
    #[must_use]
    pub fn seeded(table: ProgressTable, seed: u64) -> Self {
        Self {
            table,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

fn roll(rng: &mut StdRng, probability: f64) -> bool {
    if probability.is_nan() {
        return false;
    }
    rng.gen_bool(probability.clamp(0.0, 1.0))
}

impl ProgressPolicy for DemoProgress {
    fn next_step(&self, ticket: &Ticket, elapsed_hours: f64) -> Option<ProgressStep> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        match ticket.status {
            TicketStatus::Open => {
                let chance = self.table.rule_for(ticket.priority).chance(elapsed_hours);
                roll(&mut rng, chance).then_some(ProgressStep {
                    status: TicketStatus::InProgress,
                    comment: ASSIGNED,
                })
            }
            TicketStatus::InProgress => {
                if !roll(&mut rng, self.table.in_progress_advance) {
                    return None;
                }
                if roll(&mut rng, self.table.resolve_share) {
                    Some(ProgressStep {
                        status: TicketStatus::Resolved,
                        comment: RESOLVED,
                    })
                } else {
                    Some(ProgressStep {
                        status: TicketStatus::PendingUserResponse,
                        comment: NEEDS_INFO,
                    })
                }
            }
            TicketStatus::PendingUserResponse
            | TicketStatus::Resolved
            | TicketStatus::Closed
            | TicketStatus::Cancelled => None,
        }
    }
}
