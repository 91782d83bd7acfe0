//! Built-in knowledge corpus and software catalog.

use crate::error::{Error, Result};
use crate::knowledge::{FAQS, KB_ARTICLES, KnowledgeLookup, Snippet};

struct Article {
    id: &'static str,
    title: &'static str,
    category: &'static str,
    tags: &'static [&'static str],
    content: &'static str,
}

struct Faq {
    id: &'static str,
    question: &'static str,
    answer: &'static str,
    category: &'static str,
}

const ARTICLES: &[Article] = &[
    Article {
        id: "kb001",
        title: "Password Reset Guide",
        category: "Authentication",
        tags: &["password", "reset", "login", "security"],
        content: "Step-by-step password reset process:\n\
            1. Go to the IT portal (portal.company.com)\n\
            2. Click 'Forgot Password' or 'Reset Password'\n\
            3. Enter your username or email address\n\
            4. Check your email for the reset link (may take 5-10 minutes)\n\
            5. Click the link and create a new password\n\
            6. Password must be 8+ characters with uppercase, lowercase, numbers, and symbols\n\
            7. Confirm the new password\n\
            8. Try logging in with your new credentials",
    },
    Article {
        id: "kb002",
        title: "VPN Connection Troubleshooting",
        category: "Network",
        tags: &["vpn", "connection", "remote", "network", "cisco"],
        content: "VPN troubleshooting steps:\n\
            1. Check your internet connection (try browsing other websites)\n\
            2. Ensure VPN client is updated to the latest version\n\
            3. Restart the VPN application completely\n\
            4. Try connecting to a different VPN server location\n\
            5. Disable Windows firewall temporarily to test\n\
            6. Clear DNS cache: run 'ipconfig /flushdns' as admin\n\
            7. Reset network adapters: 'netsh winsock reset' and restart computer\n\
            8. Check with network admin about server maintenance\n\
            9. If using corporate laptop, ensure company certificates are installed",
    },
    Article {
        id: "kb003",
        title: "Email Setup and Synchronization",
        category: "Email",
        tags: &["outlook", "email", "sync", "exchange", "office365"],
        content: "Outlook email setup and sync issues:\n\
            1. Verify internet connection and Exchange server status\n\
            2. Check mailbox storage limits (may be full)\n\
            3. Re-authenticate your account: File > Account Settings > Change > Next > Done\n\
            4. Repair Outlook data file: close Outlook and run scanpst.exe\n\
            5. Create new Outlook profile if corruption suspected\n\
            6. For Office 365: sign out and sign back in\n\
            7. Check for Outlook updates\n\
            8. Disable antivirus email scanning temporarily\n\
            9. Contact IT if server settings need verification",
    },
    Article {
        id: "kb004",
        title: "Wi-Fi Connection and Speed Issues",
        category: "Network",
        tags: &["wifi", "wireless", "slow", "connection", "network"],
        content: "Wi-Fi troubleshooting guide:\n\
            1. Check signal strength (move closer to router if weak)\n\
            2. Restart your device's Wi-Fi adapter\n\
            3. 'Forget' and reconnect to the network\n\
            4. Update Wi-Fi drivers in Device Manager\n\
            5. Reset network settings: 'netsh int ip reset' and 'netsh winsock reset'\n\
            6. Change DNS servers to 8.8.8.8 and 8.8.4.4\n\
            7. Check for interference from other devices\n\
            8. Contact network admin about router/access point issues",
    },
    Article {
        id: "kb005",
        title: "Printer Setup and Troubleshooting",
        category: "Hardware",
        tags: &["printer", "printing", "driver", "network", "hp", "canon"],
        content: "Printer setup and common issues:\n\
            1. Install printer drivers from the manufacturer website or Windows Update\n\
            2. Add network printer: Settings > Devices > Printers & Scanners > Add printer\n\
            3. Troubleshoot print jobs: check the queue, restart the Print Spooler service\n\
            4. Paper jam: turn off printer, remove paper carefully, clean rollers, reload\n\
            5. Print quality: clean print heads, check ink/toner, align print heads",
    },
    Article {
        id: "kb006",
        title: "Software Installation and Updates",
        category: "Software",
        tags: &["install", "software", "update", "administrator", "permissions"],
        content: "Software installation troubleshooting:\n\
            1. Run installer as Administrator\n\
            2. Check system requirements: OS compatibility, RAM, disk space\n\
            3. Temporarily disable antivirus during installation\n\
            4. Clear temporary files with Disk Cleanup\n\
            5. Use the Windows troubleshooter\n\
            6. Check the Windows Installer service is running\n\
            7. Download a fresh installer if corruption suspected\n\
            8. For corporate software, contact IT for deployment packages\n\
            9. Check Group Policy restrictions with IT admin",
    },
];

const FAQ_ENTRIES: &[Faq] = &[
    Faq {
        id: "faq001",
        question: "How do I reset my password?",
        answer: "Visit the IT portal at portal.company.com, click 'Forgot Password', enter your \
                 username, and check your email for reset instructions. The new password must be \
                 8+ characters with mixed case, numbers, and symbols.",
        category: "Authentication",
    },
    Faq {
        id: "faq002",
        question: "VPN is not connecting",
        answer: "First check your internet connection, then restart the VPN client. If that \
                 doesn't work, try a different server location or contact IT to verify server \
                 status.",
        category: "Network",
    },
    Faq {
        id: "faq003",
        question: "How to install Outlook?",
        answer: "Download Outlook from the Office 365 portal, run the installer as administrator, \
                 and sign in with your corporate account. Contact IT if you need help with server \
                 settings.",
        category: "Email",
    },
    Faq {
        id: "faq004",
        question: "Email not syncing",
        answer: "Check if your mailbox is full, verify internet connection, and try \
                 re-authenticating your account in Outlook settings. You may also need to repair \
                 your Outlook data file.",
        category: "Email",
    },
    Faq {
        id: "faq005",
        question: "Wi-Fi is slow or not working",
        answer: "Move closer to the router, restart your Wi-Fi adapter, or 'forget' and reconnect \
                 to the network. You can also try updating your Wi-Fi drivers.",
        category: "Network",
    },
    Faq {
        id: "faq006",
        question: "Printer not working",
        answer: "Check if the printer is on and connected, clear any paper jams, and verify the \
                 printer drivers are installed. You may need to restart the Print Spooler service.",
        category: "Hardware",
    },
    Faq {
        id: "faq007",
        question: "Can't install software",
        answer: "Try running the installer as administrator, check system requirements, and \
                 temporarily disable antivirus software. Clear temporary files and download a \
                 fresh installer if needed.",
        category: "Software",
    },
    Faq {
        id: "faq008",
        question: "Computer is running slow",
        answer: "Close unnecessary programs, run disk cleanup, check for malware, and restart your \
                 computer. Consider checking Task Manager for high CPU/memory usage processes.",
        category: "Performance",
    },
    Faq {
        id: "faq009",
        question: "How to connect to company Wi-Fi?",
        answer: "Select the company network, enter your domain credentials (DOMAIN\\username), and \
                 contact IT if you need the Wi-Fi password or certificate installation.",
        category: "Network",
    },
    Faq {
        id: "faq010",
        question: "Two-factor authentication setup",
        answer: "Download Microsoft Authenticator app, scan the QR code from your account \
                 settings, and enter the verification code. Keep backup codes in a safe place.",
        category: "Authentication",
    },
];

fn hits(words: &[String], field: &str, weight: u32) -> u32 {
    let field = field.to_lowercase();
    let matched = words.iter().filter(|w| field.contains(w.as_str())).count();
    u32::try_from(matched).unwrap_or(u32::MAX).saturating_mul(weight)
}

fn score_article(article: &Article, words: &[String]) -> u32 {
    hits(words, article.title, 3)
        + article.tags.iter().map(|t| hits(words, t, 2)).sum::<u32>()
        + hits(words, article.content, 1)
        + hits(words, article.category, 2)
}

fn score_faq(faq: &Faq, words: &[String]) -> u32 {
    hits(words, faq.question, 4) + hits(words, faq.answer, 2) + hits(words, faq.category, 2)
}

/// Keyword-scored corpus of articles and FAQs.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticKnowledgeBase;

impl StaticKnowledgeBase {
    fn articles(words: &[String]) -> impl Iterator<Item = (u32, Snippet)> + '_ {
        ARTICLES.iter().map(|a| {
            (
                score_article(a, words),
                Snippet {
                    id: a.id.to_string(),
                    title: a.title.to_string(),
                    text: a.content.to_string(),
                    category: a.category.to_string(),
                    namespace: KB_ARTICLES,
                    relevance: 0.0,
                },
            )
        })
    }

    fn faqs(words: &[String]) -> impl Iterator<Item = (u32, Snippet)> + '_ {
        FAQ_ENTRIES.iter().map(|f| {
            (
                score_faq(f, words),
                Snippet {
                    id: f.id.to_string(),
                    title: f.question.to_string(),
                    text: f.answer.to_string(),
                    category: f.category.to_string(),
                    namespace: FAQS,
                    relevance: 0.0,
                },
            )
        })
    }
}

impl KnowledgeLookup for StaticKnowledgeBase {
    fn search(
        &self,
        query: &str,
        namespace: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<Snippet>> {
        let words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();

        let candidates: Vec<(u32, Snippet)> = match namespace {
            None => Self::articles(&words).chain(Self::faqs(&words)).collect(),
            Some(KB_ARTICLES) => Self::articles(&words).collect(),
            Some(FAQS) => Self::faqs(&words).collect(),
            Some(other) => {
                return Err(Error::Knowledge(format!("Unknown namespace '{other}'")));
            }
        };

        let mut scored: Vec<(u32, Snippet)> =
            candidates.into_iter().filter(|(s, _)| *s > 0).collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(max_results);

        Ok(scored
            .into_iter()
            .map(|(score, snippet)| Snippet {
                relevance: f64::from(score),
                ..snippet
            })
            .collect())
    }
}

/// Software catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Software {
    /// Product name.
    pub name: &'static str,
    /// Current approved version.
    pub version: &'static str,
    /// Installer download link.
    pub installer_link: &'static str,
}

const SOFTWARE: &[Software] = &[
    Software {
        name: "Outlook",
        version: "2024.1",
        installer_link: "https://company.example/install/outlook",
    },
    Software {
        name: "Zoom",
        version: "6.5",
        installer_link: "https://company.example/install/zoom",
    },
    Software {
        name: "VSCode",
        version: "1.92",
        installer_link: "https://company.example/install/vscode",
    },
];

/// Find a catalog entry whose name contains `name` (case-insensitive).
#[must_use]
pub fn find_software(name: &str) -> Option<&'static Software> {
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    SOFTWARE
        .iter()
        .find(|s| s.name.to_lowercase().contains(&needle))
}
