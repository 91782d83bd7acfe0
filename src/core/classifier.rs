//! Follow-up intent and batch classification.
//!
//! Pure text heuristics over the current message and a read-only session
//! snapshot. Nothing here fails: no match means "not a follow-up" or
//! "not a batch".

use crate::core::state::{ActiveFlow, Session, TicketRef};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use strum::{Display, IntoStaticStr};

/// Maximum fragments returned by [`split_batch`].
pub const MAX_BATCH_FRAGMENTS: usize = 4;

/// Follow-up intent categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FollowUpIntent {
    /// The previous suggestion failed.
    ThatDidntWork,
    /// The user wants more options.
    NeedMoreHelp,
    /// The user is confused about an earlier answer.
    Clarification,
    /// The user asks about ticket progress.
    StatusCheck,
    /// The user wants a human.
    Escalation,
}

/// Phrase table, evaluated in order. First matching intent wins.
const INTENT_RULES: &[(FollowUpIntent, &[&str])] = &[
    (
        FollowUpIntent::ThatDidntWork,
        &[
            "that didn't work",
            "that doesn't work",
            "still not working",
            "still having issues",
            "didn't help",
            "doesn't help",
            "not working",
            "same problem",
            "still broken",
            "didn't fix",
        ],
    ),
    (
        FollowUpIntent::NeedMoreHelp,
        &[
            "what else",
            "other options",
            "another way",
            "different solution",
            "more help",
            "something else",
            "alternative",
            "what now",
        ],
    ),
    (
        FollowUpIntent::StatusCheck,
        &[
            "what's the status",
            "any update",
            "how long",
            "when will",
            "is it ready",
            "progress",
            "update on",
        ],
    ),
    (
        FollowUpIntent::Escalation,
        &[
            "speak to someone",
            "call someone",
            "escalate",
            "manager",
            "human",
            "person",
            "phone",
            "urgent",
        ],
    ),
    (
        FollowUpIntent::Clarification,
        &[
            "what do you mean",
            "how do i",
            "where is",
            "which",
            "what",
            "can you explain",
            "i don't understand",
            "confused",
        ],
    ),
];

/// Markers that suggest a message carries several requests.
const BATCH_MARKERS: &[&str] = &[
    " and also ",
    " also ",
    " plus ",
    " additionally ",
    ". also",
    ". i also",
    ". can you also",
    ". another",
    "second question",
    "another issue",
    "one more thing",
];

static QUESTION_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\?\s*").unwrap_or_else(|e| panic!("invalid question pattern: {e}"))
});

static CONJUNCTION_BOUNDARIES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\.\s*(?:also|additionally|another|second)",
        r"(?i)\.\s*(?:can you also|could you also)",
        r"(?i)\.\s*(?:i also|i need|i want)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid batch pattern {p}: {e}")))
    .collect()
});

/// Context details carried by a follow-up classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FollowUpContext {
    /// Stored last issue text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_issue: Option<String>,

    /// Active troubleshooting flow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_flow: Option<ActiveFlow>,

    /// Most recent ticket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_ticket: Option<TicketRef>,
}

/// Result of [`classify_follow_up`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FollowUpClassification {
    /// Whether any intent phrase matched.
    pub is_follow_up: bool,

    /// Matched intent.
    pub intent: Option<FollowUpIntent>,

    /// Whether the session holds a last issue, flow, or recent ticket.
    pub has_context: bool,

    /// Whichever of those are present.
    pub context: FollowUpContext,
}

/// Classify a message as a follow-up against the session's stored context.
#[must_use]
pub fn classify_follow_up(message: &str, session: &Session) -> FollowUpClassification {
    let lowered = message.to_lowercase();
    let intent = INTENT_RULES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| lowered.contains(p)))
        .map(|(intent, _)| *intent);

    let stored = &session.context;
    let context = FollowUpContext {
        last_issue: stored.last_issue.as_ref().map(|i| i.description.clone()),
        current_flow: stored.current_flow.clone(),
        recent_ticket: stored.recent_tickets.first().cloned(),
    };

    FollowUpClassification {
        is_follow_up: intent.is_some(),
        intent,
        has_context: session.has_followup_context(),
        context,
    }
}

/// Canned acknowledgment for a follow-up with context, if one applies.
#[must_use]
pub fn render_followup_preamble(classification: &FollowUpClassification) -> Option<String> {
    if !(classification.is_follow_up && classification.has_context) {
        return None;
    }
    let ctx = &classification.context;

    match classification.intent? {
        FollowUpIntent::ThatDidntWork => {
            if let Some(issue) = &ctx.last_issue {
                Some(format!(
                    "I understand the previous solution for '{issue}' didn't work. Let me suggest \
                     alternative approaches or we can escalate this to create a support ticket \
                     for hands-on assistance."
                ))
            } else if ctx.current_flow.is_some() {
                Some(
                    "I see the current troubleshooting step wasn't successful. Let me guide you \
                     to the next alternative solution."
                        .to_string(),
                )
            } else {
                None
            }
        }
        FollowUpIntent::NeedMoreHelp => ctx.last_issue.as_ref().map(|_| {
            "I'd be happy to provide additional solutions. Would you like me to search our \
             knowledge base for more advanced troubleshooting steps, or shall we create a \
             support ticket for personalized assistance?"
                .to_string()
        }),
        FollowUpIntent::Clarification => ctx.last_issue.as_ref().map(|_| {
            "Of course! Let me provide more detailed step-by-step instructions for the solution \
             I suggested. Which part would you like me to clarify?"
                .to_string()
        }),
        FollowUpIntent::StatusCheck => ctx.recent_ticket.as_ref().map(|ticket| {
            format!(
                "Let me check the status of your recent ticket {} regarding '{}'.",
                ticket.id, ticket.issue
            )
        }),
        FollowUpIntent::Escalation => Some(
            "I understand you'd like to speak with someone directly. Let me create a support \
             ticket for you, and our IT team will contact you as soon as possible. What \
             priority level would you consider this issue?"
                .to_string(),
        ),
    }
}

/// Prefix a user message with a follow-up acknowledgment.
#[must_use]
pub fn apply_preamble(preamble: &str, message: &str) -> String {
    format!("{preamble}\n\nLet me help you further: {message}")
}

/// Whether a message looks like several requests in one.
#[must_use]
pub fn should_batch(message: &str) -> bool {
    if message.matches('?').count() > 1 {
        return true;
    }
    let lowered = message.to_lowercase();
    BATCH_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Split a multi-part message into at most four fragments.
///
/// Splits on question marks first, then on sentence-boundary conjunctions.
/// Returns the original message as the only element when nothing splits.
#[must_use]
pub fn split_batch(message: &str) -> Vec<String> {
    let mut fragments = split_questions(message);

    if fragments.len() <= 1 {
        if let Some(parts) = CONJUNCTION_BOUNDARIES
            .iter()
            .map(|re| non_empty_parts(re, message))
            .find(|parts| parts.len() > 1)
        {
            fragments = parts;
        }
    }

    if fragments.len() <= 1 {
        return vec![message.to_string()];
    }

    fragments.truncate(MAX_BATCH_FRAGMENTS);
    fragments
}

fn split_questions(message: &str) -> Vec<String> {
    let parts: Vec<&str> = QUESTION_BOUNDARY.split(message).collect();
    let last = parts.len().saturating_sub(1);
    let ends_with_question = message.trim_end().ends_with('?');

    parts
        .iter()
        .enumerate()
        .filter_map(|(i, part)| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            if i < last || ends_with_question {
                Some(format!("{part}?"))
            } else {
                Some(part.to_string())
            }
        })
        .collect()
}

fn non_empty_parts(re: &Regex, message: &str) -> Vec<String> {
    re.split(message)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Enumerated instruction payload for several sub-requests.
#[must_use]
pub fn batch_payload(fragments: &[String]) -> String {
    let listed: Vec<String> = fragments.iter().map(|q| format!("- {q}")).collect();
    format!(
        "The user has multiple questions:\n{}\n\nPlease address each question clearly and comprehensively.",
        listed.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Memory;
    use proptest::prelude::*;

    fn session_with_issue(issue: &str) -> Session {
        let mut session = Session::new("test");
        session.remember(Memory::LastIssue(issue.to_string()));
        session
    }

    #[test]
    fn that_didnt_work_with_last_issue() {
        let session = session_with_issue("VPN not connecting");
        let result = classify_follow_up("that didn't work", &session);

        assert!(result.is_follow_up);
        assert_eq!(result.intent, Some(FollowUpIntent::ThatDidntWork));
        assert!(result.has_context);
        assert_eq!(result.context.last_issue.as_deref(), Some("VPN not connecting"));

        let preamble = render_followup_preamble(&result).unwrap();
        assert!(preamble.contains("'VPN not connecting'"));
    }

    #[test]
    fn no_intent_is_not_follow_up() {
        let session = session_with_issue("printer offline");
        let result = classify_follow_up("My laptop fan is loud", &session);
        assert!(!result.is_follow_up);
        assert!(result.intent.is_none());
        assert!(result.has_context);
        assert!(render_followup_preamble(&result).is_none());
    }

    #[test]
    fn follow_up_without_context_has_no_preamble() {
        let session = Session::new("test");
        let result = classify_follow_up("that didn't work", &session);
        assert!(result.is_follow_up);
        assert!(!result.has_context);
        assert!(render_followup_preamble(&result).is_none());
    }

    #[test]
    fn intent_order_prefers_specific_categories() {
        let session = session_with_issue("email");
        // "what now" also contains "what" (clarification)
        let result = classify_follow_up("ok what now", &session);
        assert_eq!(result.intent, Some(FollowUpIntent::NeedMoreHelp));

        let result = classify_follow_up("any update on it?", &session);
        assert_eq!(result.intent, Some(FollowUpIntent::StatusCheck));

        let result = classify_follow_up("Can I talk to a human", &session);
        assert_eq!(result.intent, Some(FollowUpIntent::Escalation));

        let result = classify_follow_up("Where is that setting", &session);
        assert_eq!(result.intent, Some(FollowUpIntent::Clarification));
    }

    #[test]
    fn status_check_preamble_needs_ticket() {
        let mut session = session_with_issue("VPN");
        let result = classify_follow_up("any update?", &session);
        assert!(render_followup_preamble(&result).is_none());

        session.remember(Memory::RecentTicket(TicketRef {
            id: "INC202401150001".to_string(),
            issue: "VPN down".to_string(),
        }));
        let result = classify_follow_up("any update?", &session);
        let preamble = render_followup_preamble(&result).unwrap();
        assert_eq!(
            preamble,
            "Let me check the status of your recent ticket INC202401150001 regarding 'VPN down'."
        );
    }

    #[test]
    fn that_didnt_work_with_flow_only() {
        let mut session = Session::new("test");
        session.remember(Memory::CurrentFlow(ActiveFlow {
            id: "wifi_issues".to_string(),
            title: "Wi-Fi Connection Troubleshooting".to_string(),
            step: 1,
        }));
        let result = classify_follow_up("still broken", &session);
        let preamble = render_followup_preamble(&result).unwrap();
        assert!(preamble.starts_with("I see the current troubleshooting step"));
    }

    #[test]
    fn escalation_preamble_always_renders_with_context() {
        let session = session_with_issue("anything");
        let result = classify_follow_up("please escalate", &session);
        let preamble = render_followup_preamble(&result).unwrap();
        assert!(preamble.contains("speak with someone directly"));
    }

    #[test]
    fn apply_preamble_format() {
        assert_eq!(apply_preamble("Ack.", "hi"), "Ack.\n\nLet me help you further: hi");
    }

    #[test]
    fn should_batch_detection() {
        assert!(should_batch("How do I reset? And how do I log in?"));
        assert!(should_batch("Reset my password and also fix VPN"));
        assert!(should_batch("One more thing: the printer"));
        assert!(!should_batch("How do I reset my password?"));
        assert!(!should_batch("My printer is offline"));
    }

    #[test]
    fn split_two_questions() {
        let fragments = split_batch("How do I reset my password? Also, how do I connect to VPN?");
        assert_eq!(
            fragments,
            vec![
                "How do I reset my password?".to_string(),
                "Also, how do I connect to VPN?".to_string(),
            ]
        );

        let rejoined = fragments.join(" ");
        assert_eq!(split_batch(&rejoined), fragments);
    }

    #[test]
    fn split_last_fragment_without_question_mark() {
        let fragments = split_batch("Is VPN down? my email is slow");
        assert_eq!(fragments, vec!["Is VPN down?", "my email is slow"]);
    }

    #[test]
    fn split_falls_back_to_conjunctions() {
        let fragments = split_batch("My printer is jammed. Also my email will not sync");
        assert_eq!(fragments, vec!["My printer is jammed", "my email will not sync"]);

        let fragments = split_batch("Wifi drops often. I need a new mouse");
        assert_eq!(fragments, vec!["Wifi drops often", "a new mouse"]);
    }

    #[test]
    fn split_without_boundaries_returns_original() {
        assert_eq!(split_batch("My printer is jammed"), vec!["My printer is jammed"]);
        assert_eq!(split_batch(""), vec![""]);
        assert_eq!(split_batch("???"), vec!["???"]);
    }

    #[test]
    fn split_caps_at_four() {
        let fragments = split_batch("A? B? C? D? E? F?");
        assert_eq!(fragments, vec!["A?", "B?", "C?", "D?"]);
    }

    #[test]
    fn batch_payload_lists_questions() {
        let payload = batch_payload(&["A?".to_string(), "B?".to_string()]);
        assert_eq!(
            payload,
            "The user has multiple questions:\n- A?\n- B?\n\nPlease address each question clearly and comprehensively."
        );
    }

    proptest! {
        #[test]
        fn split_is_bounded_and_non_empty(message in ".{0,200}") {
            let fragments = split_batch(&message);
            prop_assert!(!fragments.is_empty());
            prop_assert!(fragments.len() <= MAX_BATCH_FRAGMENTS);
        }

        #[test]
        fn split_questions_round_trip(questions in prop::collection::vec("[A-Za-z][A-Za-z ,]{0,30}[A-Za-z]", 2..4)) {
            let message = questions
                .iter()
                .map(|q| format!("{q}?"))
                .collect::<Vec<_>>()
                .join(" ");
            let fragments = split_batch(&message);
            prop_assert_eq!(fragments.len(), questions.len());
            prop_assert!(fragments.iter().all(|f| f.ends_with('?')));
            prop_assert_eq!(split_batch(&fragments.join(" ")), fragments);
        }
    }
}
