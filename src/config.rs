//! Configuration loading and management.
//!
//! Configuration is loaded with the following precedence:
//! 1. Environment variables (`HELPDESK_*`)
//! 2. Config file (`~/.helpdesk/config.toml`)
//! 3. Defaults

use crate::error::{Error, Result};
use crate::tickets::TicketPriority;
use chrono::Duration;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// LLM completion service.
    pub llm: LlmConfig,

    /// Orchestration loop limits and housekeeping.
    pub orchestrator: OrchestratorConfig,

    /// Knowledge lookup.
    pub knowledge: KnowledgeConfig,

    /// Demo-mode behaviour (simulated ticket progress, sample data).
    pub demo: DemoConfig,

    /// Logging.
    pub logging: LoggingConfig,
}

impl Config {
    /// Check values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        let hours = self.orchestrator.session_max_age_hours;
        if hours < 0 || Duration::try_hours(hours).is_none() {
            return Err(Error::Config(format!(
                "orchestrator.session_max_age_hours out of range: {hours}"
            )));
        }
        Ok(())
    }
}

/// LLM completion service configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API (without `/chat/completions`).
    pub base_url: String,

    /// Model name.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Sampling temperature.
    pub temperature: f32,

    /// Request-level timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.2,
            timeout_seconds: 60,
        }
    }
}

/// Orchestration loop configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Maximum tool-calling iterations per request.
    pub max_tool_turns: u32,

    /// Turn count above which history is trimmed.
    pub max_history: usize,

    /// Most recent turns kept (besides the system turn) when trimming.
    pub history_keep: usize,

    /// Run the stale-session sweep on one request in N (0 disables).
    pub sweep_one_in: u32,

    /// Sessions idle longer than this are swept.
    pub session_max_age_hours: i64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tool_turns: 6,
            max_history: 40,
            history_keep: 35,
            sweep_one_in: 50,
            session_max_age_hours: 24,
        }
    }
}

/// Knowledge lookup configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Default number of snippets returned per search.
    pub max_results: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self { max_results: 3 }
    }
}

/// Demo-mode configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DemoConfig {
    /// Simulate ticket progress whenever a ticket status is checked.
    pub enabled: bool,

    /// Seed the ticket store with sample tickets on startup.
    pub seed_tickets: bool,

    /// Probability table for simulated progress.
    pub progress: ProgressTable,
}

/// Probabilities used by simulated ticket progress.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProgressTable {
    /// Open → In Progress, Critical tickets.
    pub critical: ProgressRule,
    /// Open → In Progress, Urgent tickets.
    pub urgent: ProgressRule,
    /// Open → In Progress, High tickets.
    pub high: ProgressRule,
    /// Open → In Progress, Medium tickets.
    pub medium: ProgressRule,
    /// Open → In Progress, Low tickets.
    pub low: ProgressRule,

    /// Chance an In Progress ticket moves at all.
    pub in_progress_advance: f64,

    /// Share of those moves that resolve (the rest go to Pending User Response).
    pub resolve_share: f64,
}

impl ProgressTable {
    /// Rule for tickets of the given priority.
    #[must_use]
    pub fn rule_for(&self, priority: TicketPriority) -> &ProgressRule {
        match priority {
            TicketPriority::Critical => &self.critical,
            TicketPriority::Urgent => &self.urgent,
            TicketPriority::High => &self.high,
            TicketPriority::Medium => &self.medium,
            TicketPriority::Low => &self.low,
        }
    }
}

impl Default for ProgressTable {
    fn default() -> Self {
        Self {
            critical: ProgressRule::new(1.0, 0.3, 0.8),
            urgent: ProgressRule::new(2.0, 0.2, 0.7),
            high: ProgressRule::new(12.0, 0.1, 0.6),
            medium: ProgressRule::new(24.0, 0.05, 0.5),
            low: ProgressRule::new(48.0, 0.02, 0.3),
            in_progress_advance: 0.4,
            resolve_share: 0.7,
        }
    }
}

/// Open → In Progress probability for one priority.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct ProgressRule {
    /// Elapsed hours after which `late` applies instead of `early`.
    pub after_hours: f64,
    /// Chance before `after_hours`.
    pub early: f64,
    /// Chance after `after_hours`.
    pub late: f64,
}

impl ProgressRule {
    /// Create a rule.
    #[must_use]
    pub const fn new(after_hours: f64, early: f64, late: f64) -> Self {
        Self {
            after_hours,
            early,
            late,
        }
    }

    /// Chance of advancing given the hours elapsed since creation.
    #[must_use]
    pub fn chance(&self, elapsed_hours: f64) -> f64 {
        if elapsed_hours > self.after_hours {
            self.late
        } else {
            self.early
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Get the default helpdesk home directory.
fn default_helpdesk_home() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".helpdesk"), |h| h.join(".helpdesk"))
}

/// Load configuration with precedence: env vars → file → defaults.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting values are out of range.
pub fn load_config() -> Result<Config> {
    let mut config = load_config_from(&get_config_path())?;
    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Load configuration from a specific file, falling back to defaults if it is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed, or if
/// its values are out of range.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents).map_err(|e| Error::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Get the path to the config file.
fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("HELPDESK_CONFIG") {
        return PathBuf::from(path);
    }

    if let Ok(home) = env::var("HELPDESK_HOME") {
        return PathBuf::from(home).join("config.toml");
    }

    default_helpdesk_home().join("config.toml")
}

/// Apply environment variable overrides to config.
fn apply_env_overrides(config: &mut Config) {
    // LLM
    if let Ok(url) = env::var("HELPDESK_LLM_BASE_URL") {
        config.llm.base_url = url;
    }

    if let Ok(model) = env::var("HELPDESK_LLM_MODEL") {
        config.llm.model = model;
    }

    if let Ok(val) = env::var("HELPDESK_LLM_TIMEOUT_SECONDS") {
        if let Ok(secs) = val.parse() {
            config.llm.timeout_seconds = secs;
        }
    }

    // Orchestrator
    if let Ok(val) = env::var("HELPDESK_MAX_TOOL_TURNS") {
        if let Ok(turns) = val.parse() {
            config.orchestrator.max_tool_turns = turns;
        }
    }

    if let Ok(val) = env::var("HELPDESK_SESSION_MAX_AGE_HOURS") {
        if let Ok(hours) = val.parse() {
            config.orchestrator.session_max_age_hours = hours;
        }
    }

    // Demo mode
    if let Ok(val) = env::var("HELPDESK_DEMO") {
        config.demo.enabled = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on");
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)] // Exact float comparisons are safe for these literal values
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.orchestrator.max_tool_turns, 6);
        assert_eq!(config.orchestrator.max_history, 40);
        assert_eq!(config.orchestrator.history_keep, 35);
        assert_eq!(config.orchestrator.session_max_age_hours, 24);
        assert_eq!(config.knowledge.max_results, 3);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert!(!config.demo.enabled);
    }

    #[test]
    fn progress_rule_switches_after_threshold() {
        let table = ProgressTable::default();
        let urgent = table.rule_for(TicketPriority::Urgent);
        assert_eq!(urgent.chance(1.0), 0.2);
        assert_eq!(urgent.chance(3.0), 0.7);

        let low = table.rule_for(TicketPriority::Low);
        assert_eq!(low.chance(10.0), 0.02);
        assert_eq!(low.chance(49.0), 0.3);
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
            [llm]
            base_url = "http://localhost:11434/v1"
            model = "llama3"
            timeout_seconds = 15

            [orchestrator]
            max_tool_turns = 3
            sweep_one_in = 0

            [demo]
            enabled = true

            [demo.progress]
            in_progress_advance = 1.0

            [demo.progress.medium]
            after_hours = 0.0
            early = 1.0
            late = 1.0
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.llm.base_url, "http://localhost:11434/v1");
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.timeout_seconds, 15);
        assert_eq!(config.orchestrator.max_tool_turns, 3);
        assert_eq!(config.orchestrator.sweep_one_in, 0);
        assert!(config.demo.enabled);
        assert_eq!(config.demo.progress.in_progress_advance, 1.0);
        assert_eq!(config.demo.progress.medium.late, 1.0);
        // Untouched rows keep their defaults
        assert_eq!(config.demo.progress.critical, ProgressRule::new(1.0, 0.3, 0.8));
    }

    #[test]
    fn partial_config_uses_defaults() {
        let toml = r"
            [orchestrator]
            max_tool_turns = 10
        ";

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.orchestrator.max_tool_turns, 10);
        assert_eq!(config.orchestrator.max_history, 40); // Default
        assert_eq!(config.llm.timeout_seconds, 60); // Default
    }

    #[test]
    fn load_config_from_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.orchestrator.max_tool_turns, 6);
    }

    #[test]
    fn load_config_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[knowledge]\nmax_results = 5\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.knowledge.max_results, 5);
    }

    #[test]
    fn load_config_from_invalid_file_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[orchestrator\nmax_tool_turns = ").unwrap();

        let result = load_config_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn negative_session_age_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[orchestrator]\nsession_max_age_hours = -1\n").unwrap();

        let result = load_config_from(&path);
        assert!(matches!(result, Err(Error::Config(msg)) if msg.contains("session_max_age_hours")));
    }

    #[test]
    fn huge_session_age_is_rejected() {
        let config = Config {
            orchestrator: OrchestratorConfig {
                session_max_age_hours: i64::MAX / 1000,
                ..OrchestratorConfig::default()
            },
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            format!("[orchestrator]\nsession_max_age_hours = {}\n", i64::MAX),
        )
        .unwrap();
        assert!(matches!(load_config_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
        let zero = Config {
            orchestrator: OrchestratorConfig {
                session_max_age_hours: 0,
                ..OrchestratorConfig::default()
            },
            ..Config::default()
        };
        assert!(zero.validate().is_ok());
    }
}
