//! Troubleshooting flow catalog.

use std::fmt::Write as _;

/// How a step expects the user to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Yes or no.
    YesNo,
    /// Pick one of the listed options.
    MultipleChoice(&'static [&'static str]),
}

/// One question in a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowStep {
    /// Question put to the user.
    pub question: &'static str,
    /// Answer kind.
    pub kind: StepKind,
}

/// Guided troubleshooting sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flow {
    /// Identifier used by the tool (e.g. `wifi_issues`).
    pub id: &'static str,
    /// Display title.
    pub title: &'static str,
    /// Ordered steps.
    pub steps: &'static [FlowStep],
}

impl Flow {
    /// Title and first step, ready to show the user.
    #[must_use]
    pub fn render_start(&self) -> String {
        let mut out = format!(
            "**Starting {}**\n\nLet's work through this step by step:\n\n",
            self.title
        );
        let Some(first) = self.steps.first() else {
            return out;
        };

        let _ = write!(out, "**Step 1:** {}\n\n", first.question);
        match first.kind {
            StepKind::YesNo => out.push_str("Please answer: **Yes** or **No**"),
            StepKind::MultipleChoice(options) => {
                out.push_str("Please choose from:\n");
                for (i, option) in options.iter().enumerate() {
                    let _ = writeln!(out, "{}. {option}", i + 1);
                }
            }
        }
        out
    }
}

const FLOWS: &[Flow] = &[
    Flow {
        id: "wifi_issues",
        title: "Wi-Fi Connection Troubleshooting",
        steps: &[
            FlowStep {
                question: "Can you see the Wi-Fi network in your available networks list?",
                kind: StepKind::YesNo,
            },
            FlowStep {
                question: "When you try to connect, what happens?",
                kind: StepKind::MultipleChoice(&[
                    "It asks for a password",
                    "It says 'Can't connect'",
                    "It connects but no internet",
                    "Nothing happens",
                ]),
            },
            FlowStep {
                question: "Do you have the correct Wi-Fi password?",
                kind: StepKind::YesNo,
            },
            FlowStep {
                question: "After entering the password, does it connect successfully?",
                kind: StepKind::YesNo,
            },
        ],
    },
    Flow {
        id: "printer_issues",
        title: "Printer Troubleshooting",
        steps: &[
            FlowStep {
                question: "Is your printer powered on and showing ready status?",
                kind: StepKind::YesNo,
            },
            FlowStep {
                question: "What type of connection does your printer use?",
                kind: StepKind::MultipleChoice(&[
                    "USB cable",
                    "Wi-Fi/Wireless",
                    "Ethernet/Wired network",
                    "I'm not sure",
                ]),
            },
            FlowStep {
                question: "Can you see your printer in Settings > Printers & Scanners?",
                kind: StepKind::YesNo,
            },
            FlowStep {
                question: "When you try to print, what happens?",
                kind: StepKind::MultipleChoice(&[
                    "Nothing prints",
                    "Print quality is poor",
                    "Paper jam error",
                    "Out of ink/toner error",
                ]),
            },
        ],
    },
    Flow {
        id: "email_issues",
        title: "Email/Outlook Troubleshooting",
        steps: &[
            FlowStep {
                question: "Can you open Outlook successfully?",
                kind: StepKind::YesNo,
            },
            FlowStep {
                question: "What specific email problem are you experiencing?",
                kind: StepKind::MultipleChoice(&[
                    "Can't send emails",
                    "Not receiving emails",
                    "Emails are slow to sync",
                    "Can't connect to server",
                ]),
            },
        ],
    },
];

/// Look up a flow by id.
#[must_use]
pub fn find_flow(id: &str) -> Option<&'static Flow> {
    FLOWS.iter().find(|f| f.id == id.trim())
}

/// Ids of every flow, in catalog order.
#[must_use]
pub fn flow_ids() -> Vec<&'static str> {
    FLOWS.iter().map(|f| f.id).collect()
}
