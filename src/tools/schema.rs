//! Static tool schema handed to the LLM.

use serde_json::{Map, Value, json};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Version of the tool contract. Bump when a tool or parameter changes.
pub const SCHEMA_VERSION: &str = "1.0";

/// Registered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    /// Ranked knowledge search.
    SearchKnowledgeBase,
    /// FAQ-only search.
    GetFaqAnswer,
    /// Open a ticket.
    CreateTicket,
    /// Ticket status report.
    CheckTicketStatus,
    /// A user's tickets.
    ListMyTickets,
    /// Begin a guided flow.
    StartTroubleshootingFlow,
    /// Software catalog lookup.
    GetSoftwareInfo,
    /// Ticket statistics.
    GetHelpdeskStats,
}

/// Primitive parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// JSON string.
    String,
    /// JSON integer.
    Integer,
}

impl ParamKind {
    const fn json_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
        }
    }
}

/// One named parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: &'static str,
    /// Type.
    pub kind: ParamKind,
    /// Description shown to the LLM.
    pub description: &'static str,
    /// Whether the LLM must supply it.
    pub required: bool,
}

const fn param(
    name: &'static str,
    kind: ParamKind,
    description: &'static str,
    required: bool,
) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        description,
        required,
    }
}

/// One tool's contract.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// Tool name.
    pub name: ToolName,
    /// Description shown to the LLM.
    pub description: &'static str,
    /// Parameters.
    pub params: &'static [ParamSpec],
}

impl ToolSpec {
    /// OpenAI-style `{"type": "function", ...}` entry.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for p in self.params {
            properties.insert(
                p.name.to_string(),
                json!({ "type": p.kind.json_type(), "description": p.description }),
            );
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "function",
            "function": {
                "name": self.name.to_string(),
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            }
        })
    }
}

const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: ToolName::SearchKnowledgeBase,
        description: "Search the IT knowledge base (articles and FAQs) for troubleshooting help",
        params: &[
            param("query", ParamKind::String, "Search query", true),
            param(
                "namespace",
                ParamKind::String,
                "Restrict to one collection (kb_articles, faqs) or leave empty for all",
                false,
            ),
            param(
                "max_results",
                ParamKind::Integer,
                "Maximum results to return (default: 3)",
                false,
            ),
        ],
    },
    ToolSpec {
        name: ToolName::GetFaqAnswer,
        description: "Look up answers to frequently asked IT questions",
        params: &[param(
            "question",
            ParamKind::String,
            "The question to look up",
            true,
        )],
    },
    ToolSpec {
        name: ToolName::CreateTicket,
        description: "Create an IT support ticket with auto-categorization and priority assignment",
        params: &[
            param("issue", ParamKind::String, "Description of the IT issue", true),
            param("created_by", ParamKind::String, "User creating the ticket", false),
            param(
                "priority",
                ParamKind::String,
                "Priority level (Low, Medium, High, Urgent, Critical)",
                false,
            ),
            param(
                "category",
                ParamKind::String,
                "Category (Hardware, Software, Network, Email, Security, Account, General)",
                false,
            ),
        ],
    },
    ToolSpec {
        name: ToolName::CheckTicketStatus,
        description: "Get detailed status information for a specific support ticket",
        params: &[param(
            "ticket_id",
            ParamKind::String,
            "The ticket ID to check",
            true,
        )],
    },
    ToolSpec {
        name: ToolName::ListMyTickets,
        description: "List tickets created by the user, optionally filtered by status",
        params: &[
            param("created_by", ParamKind::String, "User whose tickets to list", false),
            param("status_filter", ParamKind::String, "Filter by ticket status", false),
        ],
    },
    ToolSpec {
        name: ToolName::StartTroubleshootingFlow,
        description: "Start interactive step-by-step troubleshooting for common IT issues",
        params: &[param(
            "issue_type",
            ParamKind::String,
            "Type of issue (wifi_issues, printer_issues, email_issues)",
            true,
        )],
    },
    ToolSpec {
        name: ToolName::GetSoftwareInfo,
        description: "Get software version and installer link by name",
        params: &[param(
            "name",
            ParamKind::String,
            "Software name to look up",
            true,
        )],
    },
    ToolSpec {
        name: ToolName::GetHelpdeskStats,
        description: "Get current IT helpdesk statistics and ticket summaries",
        params: &[],
    },
];

/// Every registered tool, in schema order.
#[must_use]
pub fn registry() -> &'static [ToolSpec] {
    TOOLS
}

/// Versioned schema document (for display and export).
#[must_use]
pub fn schema_document() -> Value {
    json!({
        "version": SCHEMA_VERSION,
        "tools": TOOLS.iter().map(ToolSpec::to_json).collect::<Vec<_>>(),
    })
}
