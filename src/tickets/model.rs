//! Ticket entity and its enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Ticket lifecycle status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum TicketStatus {
    /// Received, not yet assigned.
    Open,
    /// A technician is working on it.
    #[serde(rename = "In Progress")]
    #[strum(to_string = "In Progress", serialize = "in_progress")]
    InProgress,
    /// Waiting on the user.
    #[serde(rename = "Pending User Response")]
    #[strum(to_string = "Pending User Response", serialize = "pending_user_response")]
    PendingUserResponse,
    /// Fixed, awaiting confirmation.
    Resolved,
    /// Done.
    Closed,
    /// Withdrawn.
    Cancelled,
}

impl TicketStatus {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }

    /// Whether the lifecycle permits moving from `self` to `to`.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        use TicketStatus::{Cancelled, Closed, InProgress, Open, PendingUserResponse, Resolved};
        match self {
            Open => matches!(to, InProgress | Cancelled),
            InProgress => matches!(to, Resolved | PendingUserResponse | Cancelled),
            PendingUserResponse => matches!(to, InProgress | Resolved | Closed | Cancelled),
            Resolved => matches!(to, Closed | Cancelled),
            Closed | Cancelled => false,
        }
    }

    /// Human-readable explanation shown to the user.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Open => {
                "Your ticket has been received and is waiting to be assigned to a technician."
            }
            Self::InProgress => "A technician is actively working on your issue.",
            Self::PendingUserResponse => {
                "We need additional information from you to continue resolving this issue."
            }
            Self::Resolved => {
                "The issue has been resolved. Please confirm if the solution works for you."
            }
            Self::Closed => {
                "This ticket has been closed. Contact us if you need further assistance."
            }
            Self::Cancelled => "This ticket has been cancelled at the user's request.",
        }
    }
}

/// Ticket priority.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum TicketPriority {
    /// Lowest.
    Low,
    /// Default.
    Medium,
    /// Important.
    High,
    /// Needs attention today.
    Urgent,
    /// Outage.
    Critical,
}

impl TicketPriority {
    /// Target resolution window in hours.
    #[must_use]
    pub const fn resolution_hours(self) -> i64 {
        match self {
            Self::Critical => 2,
            Self::Urgent => 4,
            Self::High => 24,
            Self::Medium => 72,
            Self::Low => 168,
        }
    }
}

/// Ticket category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum TicketCategory {
    /// Devices and peripherals.
    Hardware,
    /// Applications.
    Software,
    /// Connectivity.
    Network,
    /// Mail clients and servers.
    Email,
    /// Credentials and threats.
    Security,
    /// User accounts.
    Account,
    /// Anything else.
    General,
}

/// One entry in a ticket's comment log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    /// When it was written.
    pub timestamp: DateTime<Utc>,

    /// Who wrote it.
    pub author: String,

    /// Comment text.
    pub text: String,
}

impl Comment {
    /// System-authored comment.
    #[must_use]
    pub fn system(text: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            author: "System".to_string(),
            text: text.to_string(),
        }
    }
}

/// Support ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ticket {
    /// Identifier, `INC` + date + sequence.
    pub id: String,

    /// Issue description.
    pub issue: String,

    /// Lifecycle status.
    pub status: TicketStatus,

    /// Priority.
    pub priority: TicketPriority,

    /// Category.
    pub category: TicketCategory,

    /// Reporter.
    pub created_by: String,

    /// Assigned technician or team.
    pub assigned_to: String,

    /// Creation time.
    pub created_at: DateTime<Utc>,

    /// Last change.
    pub updated_at: DateTime<Utc>,

    /// `created_at` plus the priority's resolution window.
    pub estimated_resolution: DateTime<Utc>,

    /// Comment log, oldest first.
    pub comments: Vec<Comment>,

    /// Resolution note, once resolved.
    pub resolution: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn status_display_uses_human_labels() {
        assert_eq!(TicketStatus::InProgress.to_string(), "In Progress");
        assert_eq!(
            TicketStatus::PendingUserResponse.to_string(),
            "Pending User Response"
        );
        assert_eq!(TicketStatus::Open.to_string(), "Open");
    }

    #[test]
    fn status_parses_labels_and_snake_case() {
        assert_eq!(
            TicketStatus::from_str("in progress").unwrap(),
            TicketStatus::InProgress
        );
        assert_eq!(
            TicketStatus::from_str("pending_user_response").unwrap(),
            TicketStatus::PendingUserResponse
        );
        assert!(TicketStatus::from_str("archived").is_err());
    }

    #[test]
    fn status_serde_matches_display() {
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap();
        assert_eq!(json, r#""In Progress""#);
        let parsed: TicketStatus = serde_json::from_str(r#""Resolved""#).unwrap();
        assert_eq!(parsed, TicketStatus::Resolved);
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [TicketStatus::Closed, TicketStatus::Cancelled] {
            assert!(from.is_terminal());
            for to in TicketStatus::iter() {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn cancel_reachable_from_every_non_terminal_state() {
        for from in TicketStatus::iter().filter(|s| !s.is_terminal()) {
            assert!(from.can_transition_to(TicketStatus::Cancelled), "{from}");
        }
    }

    #[test]
    fn lifecycle_path_is_allowed() {
        assert!(TicketStatus::Open.can_transition_to(TicketStatus::InProgress));
        assert!(TicketStatus::InProgress.can_transition_to(TicketStatus::Resolved));
        assert!(TicketStatus::InProgress.can_transition_to(TicketStatus::PendingUserResponse));
        assert!(TicketStatus::Resolved.can_transition_to(TicketStatus::Closed));
        assert!(!TicketStatus::Open.can_transition_to(TicketStatus::Open));
        assert!(!TicketStatus::Open.can_transition_to(TicketStatus::Resolved));
    }

    #[test]
    fn priority_parse_is_case_insensitive() {
        assert_eq!(
            TicketPriority::from_str("urgent").unwrap(),
            TicketPriority::Urgent
        );
        assert_eq!(
            TicketCategory::from_str("EMAIL").unwrap(),
            TicketCategory::Email
        );
    }

    #[test]
    fn resolution_windows() {
        assert_eq!(TicketPriority::Critical.resolution_hours(), 2);
        assert_eq!(TicketPriority::Urgent.resolution_hours(), 4);
        assert_eq!(TicketPriority::High.resolution_hours(), 24);
        assert_eq!(TicketPriority::Medium.resolution_hours(), 72);
        assert_eq!(TicketPriority::Low.resolution_hours(), 168);
    }
}
