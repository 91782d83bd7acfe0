//! Tool dispatch.
//!
//! Looks up a tool by name, decodes its arguments, runs it against the ticket
//! store or knowledge lookup, and renders display-ready text. Dispatch never
//! fails: every error becomes in-band text the LLM can read.

use crate::core::{ActiveFlow, TicketRef};
use crate::error::{Error, Result};
use crate::knowledge::{self, FAQS, KnowledgeLookup, Snippet};
use crate::tickets::{NewTicket, StatusReport, Ticket, TicketStore};
use crate::tools::args::{
    self, CreateTicketArgs, FaqArgs, FlowArgs, ListTicketsArgs, SearchArgs, SoftwareArgs,
    TicketIdArgs,
};
use crate::tools::schema::ToolName;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Characters of article text shown per search hit.
const SUMMARY_CHARS: usize = 200;

/// Characters of issue text shown per listed ticket.
const PREVIEW_CHARS: usize = 60;

/// What a successful tool call means for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolEffect {
    /// A knowledge search ran.
    Searched {
        /// Query text.
        query: String,
        /// Titles returned.
        results: Vec<String>,
    },
    /// A ticket was opened.
    TicketCreated(TicketRef),
    /// A ticket's status was checked.
    TicketChecked,
    /// A troubleshooting flow began.
    FlowStarted(ActiveFlow),
}

/// Result of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Display-ready text for the LLM.
    pub text: String,

    /// Session effect, present only when the call succeeded.
    pub effect: Option<ToolEffect>,

    /// Whether the call succeeded.
    pub succeeded: bool,
}

impl ToolOutcome {
    fn ok(text: String, effect: Option<ToolEffect>) -> Self {
        Self {
            text,
            effect,
            succeeded: true,
        }
    }

    fn failed(text: String) -> Self {
        Self {
            text,
            effect: None,
            succeeded: false,
        }
    }
}

/// Runs tools against the shared stores.
pub struct Dispatcher {
    tickets: Arc<TicketStore>,
    knowledge: Arc<dyn KnowledgeLookup>,
    default_max_results: usize,
}

impl Dispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(
        tickets: Arc<TicketStore>,
        knowledge: Arc<dyn KnowledgeLookup>,
        default_max_results: usize,
    ) -> Self {
        Self {
            tickets,
            knowledge,
            default_max_results,
        }
    }

    /// Run `name` with the raw JSON `arguments`.
    #[must_use]
    pub fn dispatch(&self, name: &str, arguments: &str) -> ToolOutcome {
        let Ok(tool) = ToolName::from_str(name) else {
            warn!(tool = name, "Unknown tool requested");
            return ToolOutcome::failed(format!("Error: {}", Error::UnknownTool(name.to_string())));
        };

        debug!(%tool, arguments, "Dispatching tool");
        match self.run(tool, arguments) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%tool, error = %e, "Tool call failed");
                ToolOutcome::failed(format!("Error: {e}"))
            }
        }
    }

    fn run(&self, tool: ToolName, raw: &str) -> Result<ToolOutcome> {
        match tool {
            ToolName::SearchKnowledgeBase => {
                let a: SearchArgs = args::decode(tool, raw)?;
                let query = args::require(tool, "query", &a.query)?;
                let max = a.max_results.unwrap_or(self.default_max_results);
                let namespace = a.namespace.as_deref().map(str::trim).filter(|n| !n.is_empty());
                Ok(self.search(query, namespace, max))
            }
            ToolName::GetFaqAnswer => {
                let a: FaqArgs = args::decode(tool, raw)?;
                let question = args::require(tool, "question", &a.question)?;
                Ok(self.search(question, Some(FAQS), self.default_max_results))
            }
            ToolName::CreateTicket => {
                let a: CreateTicketArgs = args::decode(tool, raw)?;
                let fields = a.validate()?;
                let ticket = self.tickets.create(NewTicket {
                    issue: fields.issue,
                    created_by: fields.created_by,
                    priority: fields.priority,
                    category: fields.category,
                });
                let effect = ToolEffect::TicketCreated(TicketRef {
                    id: ticket.id.clone(),
                    issue: ticket.issue.clone(),
                });
                Ok(ToolOutcome::ok(render_created(&ticket), Some(effect)))
            }
            ToolName::CheckTicketStatus => {
                let a: TicketIdArgs = args::decode(tool, raw)?;
                let id = args::require(tool, "ticket_id", &a.ticket_id)?;
                match self.check_status(id) {
                    Ok(report) => Ok(ToolOutcome::ok(
                        render_status(&report),
                        Some(ToolEffect::TicketChecked),
                    )),
                    Err(Error::TicketNotFound(id)) => Ok(ToolOutcome::failed(format!(
                        "Ticket {id} not found. Please check the ticket ID and try again."
                    ))),
                    Err(e) => Err(e),
                }
            }
            ToolName::ListMyTickets => {
                let a: ListTicketsArgs = args::decode(tool, raw)?;
                let (user, status) = a.validate()?;
                let tickets = self.tickets.list_for_user(&user, status);
                let filter = status.map(|s| s.to_string());
                Ok(ToolOutcome::ok(
                    render_ticket_list(&tickets, filter.as_deref()),
                    None,
                ))
            }
            ToolName::StartTroubleshootingFlow => {
                let a: FlowArgs = args::decode(tool, raw)?;
                let Some(flow) = knowledge::find_flow(&a.issue_type) else {
                    return Ok(ToolOutcome::failed(format!(
                        "Available troubleshooting flows: {}. Please specify which type of issue \
                         you're experiencing.",
                        knowledge::flow_ids().join(", ")
                    )));
                };
                let effect = ToolEffect::FlowStarted(ActiveFlow {
                    id: flow.id.to_string(),
                    title: flow.title.to_string(),
                    step: 1,
                });
                Ok(ToolOutcome::ok(flow.render_start(), Some(effect)))
            }
            ToolName::GetSoftwareInfo => {
                let a: SoftwareArgs = args::decode(tool, raw)?;
                let name = args::require(tool, "name", &a.name)?;
                Ok(match knowledge::find_software(name) {
                    Some(s) => ToolOutcome::ok(
                        format!("{} (v{}): {}", s.name, s.version, s.installer_link),
                        None,
                    ),
                    None => ToolOutcome::failed(
                        "Software not found in the catalog. Please contact IT for assistance \
                         with other software installations."
                            .to_string(),
                    ),
                })
            }
            ToolName::GetHelpdeskStats => Ok(ToolOutcome::ok(self.render_stats(), None)),
        }
    }

    fn search(&self, query: &str, namespace: Option<&str>, max_results: usize) -> ToolOutcome {
        match self.knowledge.search(query, namespace, max_results) {
            Ok(snippets) => {
                let effect = ToolEffect::Searched {
                    query: query.to_string(),
                    results: snippets.iter().map(|s| s.title.clone()).collect(),
                };
                ToolOutcome::ok(render_snippets(query, &snippets), Some(effect))
            }
            Err(e) => {
                warn!(query, error = %e, "Knowledge lookup failed");
                ToolOutcome::failed(format!(
                    "The knowledge base is unavailable right now ({e}). I can create a support \
                     ticket so a technician can help directly."
                ))
            }
        }
    }

    fn check_status(&self, ticket_id: &str) -> Result<StatusReport> {
        self.tickets.simulate_progress(ticket_id)?;
        self.tickets.get_status(ticket_id)
    }

    fn render_stats(&self) -> String {
        let stats = self.tickets.statistics();
        let mut out = String::from("**IT Helpdesk Statistics**\n\n");
        if stats.total == 0 {
            out.push_str("No tickets in the system currently.");
            return out;
        }

        let _ = write!(out, "**Total Tickets:** {}\n\n", stats.total);
        out.push_str("**By Status:**\n");
        for (status, count) in &stats.by_status {
            let _ = writeln!(out, "- {status}: {count}");
        }
        out.push_str("\n**By Priority:**\n");
        for (priority, count) in &stats.by_priority {
            let _ = writeln!(out, "- {priority}: {count}");
        }
        out.push_str("\n**By Category:**\n");
        for (category, count) in &stats.by_category {
            let _ = writeln!(out, "- {category}: {count}");
        }
        out
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn render_snippets(query: &str, snippets: &[Snippet]) -> String {
    if snippets.is_empty() {
        return format!(
            "No knowledge base entries found for '{query}'. Would you like me to create a \
             support ticket or try a different search?"
        );
    }

    let mut out = format!("Found {} relevant entries:\n\n", snippets.len());
    for (i, s) in snippets.iter().enumerate() {
        let summary = truncate_chars(&s.text, SUMMARY_CHARS).replace('\n', " ");
        let _ = write!(
            out,
            "**{}. {}** ({})\n{}\nID: {}\n\n",
            i + 1,
            s.title,
            s.category,
            summary,
            s.id
        );
    }
    out.push_str("Would you like more detail on any of these?");
    out
}

fn render_created(ticket: &Ticket) -> String {
    format!(
        "**Ticket {id} Created Successfully**\n\n\
         **Issue:** {issue}\n\
         **Category:** {category}\n\
         **Priority:** {priority}\n\
         **Assigned to:** {assignee}\n\
         **Created:** {created}\n\
         **Estimated Resolution:** {eta}\n\n\
         You can check the status anytime by asking about ticket {id}.",
        id = ticket.id,
        issue = ticket.issue,
        category = ticket.category,
        priority = ticket.priority,
        assignee = ticket.assigned_to,
        created = ticket.created_at.format("%Y-%m-%d %H:%M:%S"),
        eta = ticket.estimated_resolution.format("%Y-%m-%d %H:%M:%S"),
    )
}

fn render_status(report: &StatusReport) -> String {
    let t = &report.ticket;
    let mut out = format!(
        "**Ticket {} Status**\n\n\
         **Issue:** {}\n\
         **Status:** {}\n\
         **Priority:** {}\n\
         **Assigned to:** {}\n\
         **Time Elapsed:** {:.1} hours\n",
        t.id, t.issue, t.status, t.priority, t.assigned_to, report.time_elapsed_hours
    );
    if report.is_overdue {
        out.push_str("**OVERDUE** - This ticket has exceeded the estimated resolution time.\n");
    }
    let _ = writeln!(out, "\n**Status Description:** {}", report.status_description);

    if !t.comments.is_empty() {
        out.push_str("\n**Recent Updates:**\n");
        let start = t.comments.len().saturating_sub(3);
        for c in &t.comments[start..] {
            let _ = writeln!(
                out,
                "- {} - {}: {}",
                c.timestamp.format("%Y-%m-%d %H:%M:%S"),
                c.author,
                c.text
            );
        }
    }
    out
}

fn render_ticket_list(tickets: &[Ticket], filter: Option<&str>) -> String {
    if tickets.is_empty() {
        let filter = filter.map(|f| format!(" with status '{f}'")).unwrap_or_default();
        return format!(
            "No tickets found{filter}. Would you like to create a new support ticket?"
        );
    }

    let mut out = format!("**Your Support Tickets** ({} found)\n\n", tickets.len());
    for t in tickets {
        let _ = write!(
            out,
            "**{}** - {}\n   {}\n   Created: {} | Priority: {}\n\n",
            t.id,
            t.status,
            truncate_chars(&t.issue, PREVIEW_CHARS),
            t.created_at.format("%Y-%m-%d"),
            t.priority
        );
    }
    out.push_str("Ask me about any specific ticket ID for detailed status information.");
    out
}
