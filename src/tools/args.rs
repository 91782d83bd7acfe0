//! Typed tool arguments.
//!
//! Arguments arrive as the raw JSON string the LLM produced. They are decoded
//! strictly into one struct per tool; absent optional fields take their
//! defaults and required fields are checked after decoding.

use crate::error::{Error, Result};
use crate::tickets::{TicketCategory, TicketPriority, TicketStatus};
use crate::tools::schema::ToolName;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::str::FromStr;

/// Reporter used when the LLM does not name one.
pub const DEFAULT_USER: &str = "user";

/// `search_knowledge_base` arguments.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchArgs {
    /// Query text.
    pub query: String,
    /// Optional namespace restriction.
    pub namespace: Option<String>,
    /// Result cap (configured default when absent).
    pub max_results: Option<usize>,
}

/// `get_faq_answer` arguments.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FaqArgs {
    /// Question text.
    pub question: String,
}

/// `create_ticket` arguments.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CreateTicketArgs {
    /// Issue description.
    pub issue: String,
    /// Reporter.
    pub created_by: Option<String>,
    /// Priority label.
    pub priority: Option<String>,
    /// Category label.
    pub category: Option<String>,
}

/// `check_ticket_status` arguments.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TicketIdArgs {
    /// Ticket id.
    pub ticket_id: String,
}

/// `list_my_tickets` arguments.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListTicketsArgs {
    /// Reporter.
    pub created_by: Option<String>,
    /// Status label.
    pub status_filter: Option<String>,
}

/// `start_troubleshooting_flow` arguments.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FlowArgs {
    /// Flow id.
    pub issue_type: String,
}

/// `get_software_info` arguments.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SoftwareArgs {
    /// Product name.
    pub name: String,
}

/// Decode a raw argument string for `tool`. Empty input means `{}`.
///
/// # Errors
///
/// Returns `InvalidArguments` if the input is not a JSON object of the
/// expected shape.
pub fn decode<T: DeserializeOwned>(tool: ToolName, raw: &str) -> Result<T> {
    let raw = raw.trim();
    let raw = if raw.is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|e| invalid(tool, &e.to_string()))
}

/// Require a non-blank string field.
///
/// # Errors
///
/// Returns `InvalidArguments` naming the field when it is blank.
pub fn require<'a>(tool: ToolName, field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(tool, &format!("'{field}' is required")));
    }
    Ok(value)
}

/// Parse an optional enum label (blank counts as absent).
///
/// # Errors
///
/// Returns `InvalidArguments` when the label is not recognized.
pub fn parse_label<T: FromStr>(
    tool: ToolName,
    field: &str,
    value: Option<&str>,
) -> Result<Option<T>> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    T::from_str(value)
        .map(Some)
        .map_err(|_| invalid(tool, &format!("unknown {field} '{value}'")))
}

/// Parsed `create_ticket` fields.
pub struct TicketFields {
    /// Issue text.
    pub issue: String,
    /// Reporter.
    pub created_by: String,
    /// Priority, if given.
    pub priority: Option<TicketPriority>,
    /// Category, if given.
    pub category: Option<TicketCategory>,
}

impl CreateTicketArgs {
    /// Validate into ticket fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` for a blank issue or unknown labels.
    pub fn validate(self) -> Result<TicketFields> {
        let tool = ToolName::CreateTicket;
        Ok(TicketFields {
            issue: require(tool, "issue", &self.issue)?.to_string(),
            created_by: reporter(self.created_by),
            priority: parse_label(tool, "priority", self.priority.as_deref())?,
            category: parse_label(tool, "category", self.category.as_deref())?,
        })
    }
}

impl ListTicketsArgs {
    /// Reporter and optional status filter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArguments` for an unknown status label.
    pub fn validate(self) -> Result<(String, Option<TicketStatus>)> {
        let status = parse_label(
            ToolName::ListMyTickets,
            "status",
            self.status_filter.as_deref(),
        )?;
        Ok((reporter(self.created_by), status))
    }
}

fn reporter(created_by: Option<String>) -> String {
    created_by
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_USER.to_string())
}

fn invalid(tool: ToolName, reason: &str) -> Error {
    Error::InvalidArguments {
        tool: tool.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_arguments_decode_as_defaults() {
        let args: SearchArgs = decode(ToolName::SearchKnowledgeBase, "").unwrap();
        assert_eq!(args, SearchArgs::default());
        let args: ListTicketsArgs = decode(ToolName::ListMyTickets, "  ").unwrap();
        assert!(args.created_by.is_none());
    }

    #[test]
    fn malformed_json_is_invalid_arguments() {
        let result: Result<SearchArgs> = decode(ToolName::SearchKnowledgeBase, "{query: vpn");
        assert!(matches!(
            result,
            Err(Error::InvalidArguments { ref tool, .. }) if tool == "search_knowledge_base"
        ));
    }

    #[test]
    fn wrong_type_is_invalid_arguments() {
        let result: Result<SearchArgs> =
            decode(ToolName::SearchKnowledgeBase, r#"{"query": "vpn", "max_results": "three"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn extra_fields_are_ignored() {
        let args: FaqArgs =
            decode(ToolName::GetFaqAnswer, r#"{"question": "vpn?", "verbose": true}"#).unwrap();
        assert_eq!(args.question, "vpn?");
    }

    #[test]
    fn require_rejects_blank() {
        assert_eq!(require(ToolName::GetFaqAnswer, "question", " q ").unwrap(), "q");
        let err = require(ToolName::GetFaqAnswer, "question", "  ").unwrap_err();
        assert!(err.to_string().contains("'question' is required"));
    }

    #[test]
    fn create_ticket_validation() {
        let args: CreateTicketArgs = decode(
            ToolName::CreateTicket,
            r#"{"issue": "VPN down", "priority": "urgent"}"#,
        )
        .unwrap();
        let fields = args.validate().unwrap();
        assert_eq!(fields.issue, "VPN down");
        assert_eq!(fields.created_by, DEFAULT_USER);
        assert_eq!(fields.priority, Some(TicketPriority::Urgent));
        assert!(fields.category.is_none());

        let args = CreateTicketArgs {
            issue: "x".to_string(),
            priority: Some("whenever".to_string()),
            ..CreateTicketArgs::default()
        };
        assert!(args.validate().is_err());

        assert!(CreateTicketArgs::default().validate().is_err());
    }

    #[test]
    fn list_tickets_validation() {
        let args = ListTicketsArgs {
            created_by: Some("alice".to_string()),
            status_filter: Some("In Progress".to_string()),
        };
        let (user, status) = args.validate().unwrap();
        assert_eq!(user, "alice");
        assert_eq!(status, Some(TicketStatus::InProgress));

        let args = ListTicketsArgs {
            created_by: Some("  ".to_string()),
            status_filter: Some(String::new()),
        };
        let (user, status) = args.validate().unwrap();
        assert_eq!(user, DEFAULT_USER);
        assert!(status.is_none());
    }
}
