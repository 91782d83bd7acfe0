//! Keyword rule tables for priority, category and assignment.
//!
//! Each table is evaluated top to bottom and the first match wins.

use crate::tickets::model::{TicketCategory, TicketPriority};

/// Priority rules, most severe first.
const PRIORITY_RULES: &[(TicketPriority, &[&str])] = &[
    (
        TicketPriority::Critical,
        &[
            "server down",
            "server is down",
            "system crash",
            "security breach",
            "cannot login",
            "can't login",
            "no one can login",
            "nobody can login",
            "total outage",
        ],
    ),
    (
        TicketPriority::Urgent,
        &[
            "urgent",
            "asap",
            "critical",
            "emergency",
            "broken",
            "not working at all",
        ],
    ),
    (
        TicketPriority::High,
        &[
            "important",
            "deadline",
            "multiple users",
            "department",
            "slow performance",
        ],
    ),
];

/// Category rules in evaluation order.
const CATEGORY_RULES: &[(TicketCategory, &[&str])] = &[
    (
        TicketCategory::Network,
        &["wifi", "vpn", "internet", "connection", "network", "dns", "ip"],
    ),
    (
        TicketCategory::Email,
        &["email", "outlook", "exchange", "mail", "smtp", "sync"],
    ),
    (
        TicketCategory::Hardware,
        &[
            "printer", "monitor", "keyboard", "mouse", "laptop", "desktop", "hardware",
        ],
    ),
    (
        TicketCategory::Software,
        &["software", "application", "install", "update", "program", "app"],
    ),
    (
        TicketCategory::Security,
        &[
            "password",
            "login",
            "access",
            "permission",
            "security",
            "virus",
            "malware",
        ],
    ),
    (
        TicketCategory::Account,
        &["account", "user", "profile", "permissions", "access rights"],
    ),
];

/// Staff roster: name and specialties, checked in order.
const ROSTER: &[(&str, &[TicketCategory])] = &[
    (
        "Alex Johnson",
        &[TicketCategory::Network, TicketCategory::Security],
    ),
    ("Sarah Chen", &[TicketCategory::Software, TicketCategory::Email]),
    (
        "Mike Rodriguez",
        &[TicketCategory::Hardware, TicketCategory::General],
    ),
    (
        "Emily Davis",
        &[TicketCategory::Account, TicketCategory::Security],
    ),
];

/// Assignee when no specialist matches.
pub const DEFAULT_ASSIGNEE: &str = "IT Support Team";

fn first_match<T: Copy>(rules: &[(T, &[&str])], text: &str) -> Option<T> {
    let lowered = text.to_lowercase();
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(value, _)| *value)
}

/// Derive a priority from the issue text. Defaults to `Medium`.
#[must_use]
pub fn derive_priority(issue: &str) -> TicketPriority {
    first_match(PRIORITY_RULES, issue).unwrap_or(TicketPriority::Medium)
}

/// Derive a category from the issue text. Defaults to `General`.
#[must_use]
pub fn derive_category(issue: &str) -> TicketCategory {
    first_match(CATEGORY_RULES, issue).unwrap_or(TicketCategory::General)
}

/// Pick the first staff member specializing in `category`.
#[must_use]
pub fn assign(category: TicketCategory) -> &'static str {
    ROSTER
        .iter()
        .find(|(_, specialties)| specialties.contains(&category))
        .map_or(DEFAULT_ASSIGNEE, |(name, _)| *name)
}
