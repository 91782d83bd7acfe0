//! In-memory ticket store.

use crate::error::{Error, Result};
use crate::tickets::model::{Comment, Ticket, TicketCategory, TicketPriority, TicketStatus};
use crate::tickets::progress::{Disabled, ProgressPolicy};
use crate::tickets::rules;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use tracing::info;

/// Request to open a ticket.
#[derive(Debug, Clone)]
pub struct NewTicket {
    /// Issue description.
    pub issue: String,

    /// Reporter.
    pub created_by: String,

    /// Explicit priority (derived from the issue when `None`).
    pub priority: Option<TicketPriority>,

    /// Explicit category (derived from the issue when `None`).
    pub category: Option<TicketCategory>,
}

impl NewTicket {
    /// Ticket with derived priority and category.
    #[must_use]
    pub fn new(issue: &str, created_by: &str) -> Self {
        Self {
            issue: issue.to_string(),
            created_by: created_by.to_string(),
            priority: None,
            category: None,
        }
    }
}

/// Ticket plus derived status information.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Snapshot of the ticket.
    pub ticket: Ticket,

    /// Hours since creation.
    pub time_elapsed_hours: f64,

    /// Past the estimated resolution and not yet resolved or closed.
    pub is_overdue: bool,

    /// Human-readable status explanation.
    pub status_description: &'static str,
}

/// Aggregate ticket counts.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct TicketStatistics {
    /// Number of tickets.
    pub total: usize,

    /// Tickets per status.
    pub by_status: BTreeMap<TicketStatus, usize>,

    /// Tickets per priority.
    pub by_priority: BTreeMap<TicketPriority, usize>,

    /// Tickets per category.
    pub by_category: BTreeMap<TicketCategory, usize>,
}

#[derive(Debug, Default)]
struct Ledger {
    tickets: Vec<Ticket>,
    /// Last sequence handed out per UTC day.
    sequences: BTreeMap<NaiveDate, u32>,
}

impl Ledger {
    fn next_id(&mut self, now: DateTime<Utc>) -> String {
        let day = now.date_naive();
        let sequence = self.sequences.entry(day).or_insert(0);
        *sequence += 1;
        format!("INC{}{:04}", day.format("%Y%m%d"), *sequence)
    }

    fn find_mut(&mut self, ticket_id: &str) -> Result<&mut Ticket> {
        self.tickets
            .iter_mut()
            .find(|t| t.id == ticket_id)
            .ok_or_else(|| Error::TicketNotFound(ticket_id.to_string()))
    }
}

/// Process-wide ticket store.
pub struct TicketStore {
    ledger: RwLock<Ledger>,
    progress: Box<dyn ProgressPolicy>,
}

impl TicketStore {
    /// Empty store without simulated progress.
    #[must_use]
    pub fn new() -> Self {
        Self::with_progress(Disabled)
    }

    /// Empty store using the given progress policy.
    #[must_use]
    pub fn with_progress(policy: impl ProgressPolicy + 'static) -> Self {
        Self {
            ledger: RwLock::new(Ledger::default()),
            progress: Box::new(policy),
        }
    }

    /// Open a ticket.
    pub fn create(&self, request: NewTicket) -> Ticket {
        self.create_at(request, Utc::now())
    }

    /// [`Self::create`] evaluated at `now`.
    pub fn create_at(&self, request: NewTicket, now: DateTime<Utc>) -> Ticket {
        let priority = request
            .priority
            .unwrap_or_else(|| rules::derive_priority(&request.issue));
        let category = request
            .category
            .unwrap_or_else(|| rules::derive_category(&request.issue));

        let mut ledger = self.ledger.write().unwrap_or_else(PoisonError::into_inner);
        let ticket = Ticket {
            id: ledger.next_id(now),
            issue: request.issue,
            status: TicketStatus::Open,
            priority,
            category,
            created_by: request.created_by,
            assigned_to: rules::assign(category).to_string(),
            created_at: now,
            updated_at: now,
            estimated_resolution: now + Duration::hours(priority.resolution_hours()),
            comments: Vec::new(),
            resolution: None,
        };
        ledger.tickets.push(ticket.clone());

        info!(
            ticket_id = %ticket.id,
            priority = %ticket.priority,
            category = %ticket.category,
            "Created ticket"
        );
        ticket
    }

    /// Ticket with elapsed time and overdue flag.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` if no ticket has this id.
    pub fn get_status(&self, ticket_id: &str) -> Result<StatusReport> {
        self.status_at(ticket_id, Utc::now())
    }

    /// [`Self::get_status`] evaluated at `now`.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` if no ticket has this id.
    pub fn status_at(&self, ticket_id: &str, now: DateTime<Utc>) -> Result<StatusReport> {
        let ledger = self.ledger.read().unwrap_or_else(PoisonError::into_inner);
        let ticket = ledger
            .tickets
            .iter()
            .find(|t| t.id == ticket_id)
            .ok_or_else(|| Error::TicketNotFound(ticket_id.to_string()))?;

        let is_overdue = now > ticket.estimated_resolution
            && !matches!(ticket.status, TicketStatus::Resolved | TicketStatus::Closed);

        Ok(StatusReport {
            time_elapsed_hours: elapsed_hours(ticket, now),
            is_overdue,
            status_description: ticket.status.description(),
            ticket: ticket.clone(),
        })
    }

    /// Move a ticket to `to`, logging the optional comment and an audit entry.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` for an unknown id and `InvalidTransition`
    /// when the lifecycle does not allow the move.
    pub fn advance_status(
        &self,
        ticket_id: &str,
        to: TicketStatus,
        comment: Option<&str>,
    ) -> Result<Ticket> {
        let mut ledger = self.ledger.write().unwrap_or_else(PoisonError::into_inner);
        let ticket = ledger.find_mut(ticket_id)?;
        apply_transition(ticket, to, comment, Utc::now())?;
        Ok(ticket.clone())
    }

    /// Let the progress policy move the ticket along. Returns the new status
    /// when it changed.
    ///
    /// # Errors
    ///
    /// Returns `TicketNotFound` if no ticket has this id.
    pub fn simulate_progress(&self, ticket_id: &str) -> Result<Option<TicketStatus>> {
        let now = Utc::now();
        let mut ledger = self.ledger.write().unwrap_or_else(PoisonError::into_inner);
        let ticket = ledger.find_mut(ticket_id)?;

        let Some(step) = self.progress.next_step(ticket, elapsed_hours(ticket, now)) else {
            return Ok(None);
        };
        apply_transition(ticket, step.status, Some(step.comment), now)?;
        Ok(Some(step.status))
    }

    /// Tickets opened by `created_by`, newest first.
    #[must_use]
    pub fn list_for_user(&self, created_by: &str, status: Option<TicketStatus>) -> Vec<Ticket> {
        let ledger = self.ledger.read().unwrap_or_else(PoisonError::into_inner);
        let mut tickets: Vec<Ticket> = ledger
            .tickets
            .iter()
            .filter(|t| t.created_by == created_by)
            .filter(|t| status.is_none_or(|s| t.status == s))
            .cloned()
            .collect();

        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        tickets
    }

    /// Counts by status, priority and category.
    #[must_use]
    pub fn statistics(&self) -> TicketStatistics {
        let ledger = self.ledger.read().unwrap_or_else(PoisonError::into_inner);
        let mut stats = TicketStatistics {
            total: ledger.tickets.len(),
            ..TicketStatistics::default()
        };
        for ticket in &ledger.tickets {
            *stats.by_status.entry(ticket.status).or_insert(0) += 1;
            *stats.by_priority.entry(ticket.priority).or_insert(0) += 1;
            *stats.by_category.entry(ticket.category).or_insert(0) += 1;
        }
        stats
    }

    /// Load the demo sample tickets into an empty store.
    pub fn seed_samples(&self) {
        if self.statistics().total > 0 {
            return;
        }
        let samples = [
            NewTicket {
                priority: Some(TicketPriority::High),
                ..NewTicket::new(
                    "Laptop is running very slowly after Windows update",
                    "john.doe@company.com",
                )
            },
            NewTicket {
                priority: Some(TicketPriority::Urgent),
                ..NewTicket::new(
                    "Cannot connect to VPN from home office",
                    "jane.smith@company.com",
                )
            },
            NewTicket::new(
                "Printer in conference room is not working",
                "mike.johnson@company.com",
            ),
        ];
        for sample in samples {
            self.create(sample);
        }
    }
}

impl Default for TicketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::cast_precision_loss)] // Millisecond counts stay far below 2^52
fn elapsed_hours(ticket: &Ticket, now: DateTime<Utc>) -> f64 {
    (now - ticket.created_at).num_milliseconds() as f64 / 3_600_000.0
}

fn apply_transition(
    ticket: &mut Ticket,
    to: TicketStatus,
    comment: Option<&str>,
    now: DateTime<Utc>,
) -> Result<()> {
    let from = ticket.status;
    if !from.can_transition_to(to) {
        return Err(Error::InvalidTransition { from, to });
    }

    ticket.status = to;
    ticket.updated_at = now;
    if let Some(comment) = comment.filter(|c| !c.is_empty()) {
        ticket.comments.push(Comment::system(comment, now));
        if to == TicketStatus::Resolved {
            ticket.resolution = Some(comment.to_string());
        }
    }
    ticket
        .comments
        .push(Comment::system(&format!("Status changed from {from} to {to}"), now));

    info!(ticket_id = %ticket.id, %from, %to, "Ticket status changed");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::float_cmp)] // Exact float comparisons are safe for these whole-hour values
mod tests {
    use super::*;
    use crate::config::{ProgressRule, ProgressTable};
    use crate::tickets::progress::DemoProgress;

    fn always_progress() -> DemoProgress {
        let always = ProgressRule::new(0.0, 1.0, 1.0);
        DemoProgress::seeded(
            ProgressTable {
                critical: always,
                urgent: always,
                high: always,
                medium: always,
                low: always,
                in_progress_advance: 1.0,
                resolve_share: 1.0,
            },
            42,
        )
    }

    #[test]
    fn ids_unique_and_increasing() {
        let store = TicketStore::new();
        let ids: Vec<String> = (0..20)
            .map(|i| store.create(NewTicket::new(&format!("issue {i}"), "user")).id)
            .collect();

        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
        assert!(ids[0].starts_with("INC"));
        assert!(ids[0].ends_with("0001"));
        assert_eq!(ids[0].len(), "INC".len() + 8 + 4);
    }

    #[test]
    fn sequence_restarts_each_day() {
        let store = TicketStore::new();
        let day_one = Utc::now() - Duration::days(1);
        let first = store.create_at(NewTicket::new("a", "user"), day_one);
        store.create_at(NewTicket::new("b", "user"), day_one);
        let next_day = store.create(NewTicket::new("c", "user"));

        assert!(first.id.ends_with("0001"));
        assert!(next_day.id.ends_with("0001"));
        assert_ne!(first.id, next_day.id);
    }

    #[test]
    fn earlier_day_resumes_its_own_sequence() {
        let store = TicketStore::new();
        let today = Utc::now();
        let yesterday = today - Duration::days(1);

        let a = store.create_at(NewTicket::new("a", "user"), yesterday);
        let b = store.create_at(NewTicket::new("b", "user"), today);
        let c = store.create_at(NewTicket::new("c", "user"), yesterday);

        assert_ne!(a.id, c.id);
        assert_ne!(b.id, c.id);
        assert!(c.id.ends_with("0002"));
        assert_eq!(store.get_status(&c.id).unwrap().ticket.issue, "c");
    }

    #[test]
    fn create_derives_fields() {
        let store = TicketStore::new();
        let ticket = store.create(NewTicket::new("server is down and no one can login", "ops"));

        assert_eq!(ticket.priority, TicketPriority::Critical);
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.estimated_resolution - ticket.created_at, Duration::hours(2));
        assert!(ticket.comments.is_empty());

        let ticket = store.create(NewTicket::new("minor cosmetic issue", "ops"));
        assert_eq!(ticket.priority, TicketPriority::Medium);
        assert_eq!(ticket.category, TicketCategory::General);
        assert_eq!(ticket.assigned_to, "Mike Rodriguez");
    }

    #[test]
    fn create_respects_explicit_values() {
        let store = TicketStore::new();
        let ticket = store.create(NewTicket {
            priority: Some(TicketPriority::Low),
            category: Some(TicketCategory::Account),
            ..NewTicket::new("urgent vpn broken", "ops")
        });
        assert_eq!(ticket.priority, TicketPriority::Low);
        assert_eq!(ticket.category, TicketCategory::Account);
        assert_eq!(ticket.assigned_to, "Emily Davis");
    }

    #[test]
    fn overdue_computation() {
        let store = TicketStore::new();
        let ticket = store.create(NewTicket {
            priority: Some(TicketPriority::Urgent),
            ..NewTicket::new("VPN", "user")
        });

        let late = store
            .status_at(&ticket.id, ticket.created_at + Duration::hours(5))
            .unwrap();
        assert!(late.is_overdue);
        assert_eq!(late.time_elapsed_hours, 5.0);

        let early = store
            .status_at(&ticket.id, ticket.created_at + Duration::hours(1))
            .unwrap();
        assert!(!early.is_overdue);
        assert_eq!(early.status_description, TicketStatus::Open.description());
    }

    #[test]
    fn resolved_ticket_is_never_overdue() {
        let store = TicketStore::new();
        let ticket = store.create(NewTicket {
            priority: Some(TicketPriority::Critical),
            ..NewTicket::new("outage", "user")
        });
        store
            .advance_status(&ticket.id, TicketStatus::InProgress, None)
            .unwrap();
        store
            .advance_status(&ticket.id, TicketStatus::Resolved, Some("Rebooted the switch"))
            .unwrap();

        let report = store
            .status_at(&ticket.id, ticket.created_at + Duration::hours(10))
            .unwrap();
        assert!(!report.is_overdue);
        assert_eq!(report.ticket.resolution.as_deref(), Some("Rebooted the switch"));
    }

    #[test]
    fn unknown_ticket_is_not_found() {
        let store = TicketStore::new();
        assert!(matches!(
            store.get_status("INC000"),
            Err(Error::TicketNotFound(id)) if id == "INC000"
        ));
        assert!(matches!(
            store.advance_status("INC000", TicketStatus::Closed, None),
            Err(Error::TicketNotFound(_))
        ));
    }

    #[test]
    fn advance_status_appends_comments() {
        let store = TicketStore::new();
        let ticket = store.create(NewTicket::new("printer", "user"));

        let updated = store
            .advance_status(&ticket.id, TicketStatus::InProgress, Some("Looking into it"))
            .unwrap();
        assert_eq!(updated.status, TicketStatus::InProgress);
        assert_eq!(updated.comments.len(), 2);
        assert_eq!(updated.comments[0].text, "Looking into it");
        assert_eq!(
            updated.comments[1].text,
            "Status changed from Open to In Progress"
        );
        assert_eq!(updated.comments[1].author, "System");

        let updated = store
            .advance_status(&ticket.id, TicketStatus::Cancelled, None)
            .unwrap();
        assert_eq!(updated.comments.len(), 3);
    }

    #[test]
    fn terminal_ticket_cannot_move() {
        let store = TicketStore::new();
        let ticket = store.create(NewTicket::new("printer", "user"));
        store
            .advance_status(&ticket.id, TicketStatus::Cancelled, None)
            .unwrap();

        let result = store.advance_status(&ticket.id, TicketStatus::Open, None);
        assert!(matches!(
            result,
            Err(Error::InvalidTransition {
                from: TicketStatus::Cancelled,
                to: TicketStatus::Open
            })
        ));
        // Rejected moves leave no trace
        let report = store.get_status(&ticket.id).unwrap();
        assert_eq!(report.ticket.comments.len(), 1);
    }

    #[test]
    fn simulate_progress_disabled_by_default() {
        let store = TicketStore::new();
        let ticket = store.create(NewTicket::new("printer", "user"));
        assert_eq!(store.simulate_progress(&ticket.id).unwrap(), None);
        assert_eq!(
            store.get_status(&ticket.id).unwrap().ticket.status,
            TicketStatus::Open
        );
    }

    #[test]
    fn simulate_progress_walks_lifecycle() {
        let store = TicketStore::with_progress(always_progress());
        let ticket = store.create(NewTicket::new("printer", "user"));

        assert_eq!(
            store.simulate_progress(&ticket.id).unwrap(),
            Some(TicketStatus::InProgress)
        );
        assert_eq!(
            store.simulate_progress(&ticket.id).unwrap(),
            Some(TicketStatus::Resolved)
        );
        assert_eq!(store.simulate_progress(&ticket.id).unwrap(), None);

        let report = store.get_status(&ticket.id).unwrap();
        assert_eq!(report.ticket.comments.len(), 4);
        assert!(report.ticket.resolution.is_some());
    }

    #[test]
    fn simulate_progress_unknown_ticket() {
        let store = TicketStore::with_progress(always_progress());
        assert!(matches!(
            store.simulate_progress("nope"),
            Err(Error::TicketNotFound(_))
        ));
    }

    #[test]
    fn list_for_user_filters_and_sorts() {
        let store = TicketStore::new();
        let base = Utc::now() - Duration::hours(3);
        let first = store.create_at(NewTicket::new("a", "alice"), base);
        let second = store.create_at(NewTicket::new("b", "alice"), base + Duration::hours(1));
        store.create_at(NewTicket::new("c", "bob"), base + Duration::hours(2));
        store
            .advance_status(&first.id, TicketStatus::InProgress, None)
            .unwrap();

        let all = store.list_for_user("alice", None);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);

        let open = store.list_for_user("alice", Some(TicketStatus::Open));
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, second.id);

        assert!(store.list_for_user("carol", None).is_empty());
    }

    #[test]
    fn statistics_counts() {
        let store = TicketStore::new();
        assert_eq!(store.statistics(), TicketStatistics::default());

        store.seed_samples();
        let stats = store.statistics();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_status[&TicketStatus::Open], 3);
        assert_eq!(stats.by_priority[&TicketPriority::High], 1);
        assert_eq!(stats.by_priority[&TicketPriority::Urgent], 1);
        assert_eq!(stats.by_category[&TicketCategory::Hardware], 2);
        assert_eq!(stats.by_category[&TicketCategory::Network], 1);
    }

    #[test]
    fn seed_samples_only_when_empty() {
        let store = TicketStore::new();
        store.seed_samples();
        store.seed_samples();
        assert_eq!(store.statistics().total, 3);
        assert_eq!(store.list_for_user("jane.smith@company.com", None).len(), 1);
    }

    #[test]
    fn concurrent_creates_yield_unique_ids() {
        use std::collections::HashSet;
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(TicketStore::new());
        let mut handles = vec![];
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                (0..25)
                    .map(|j| store.create(NewTicket::new(&format!("{i}-{j}"), "user")).id)
                    .collect::<Vec<_>>()
            }));
        }

        let mut ids = HashSet::new();
        for handle in handles {
            ids.extend(handle.join().expect("Thread panicked"));
        }
        assert_eq!(ids.len(), 200);
    }
}
