//! Configuration management for mathtextd.
//!
//! Loads settings from /etc/mathtext/config.toml or uses defaults.

use anyhow::{Context, Result};
use mathtext_shared::budget::EvaluationBudget;
use mathtext_shared::normalize::MAX_MESSAGE_CHARS;
use mathtext_shared::safety::SafetyGate;
use mathtext_shared::{RuleCascade, StageKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::verdict_log::VERDICT_DB_PATH;

/// Config file path
pub const CONFIG_PATH: &str = "/etc/mathtext/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/mathtext/config.toml";

/// Cascade and threshold settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NluConfig {
    /// Student messages are cut to this many characters before matching
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,

    /// Rule stages (other than safety) only run below this raw length
    #[serde(default = "default_rule_stage_max_chars")]
    pub rule_stage_max_chars: usize,

    /// `math_answer` confidence needed to treat a message as an answer attempt (>=)
    #[serde(default = "default_threshold")]
    pub answer_intent_threshold: f64,

    /// Confidence a resolver needs before trusting a label (>)
    #[serde(default = "default_threshold")]
    pub approved_intent_threshold: f64,

    /// Labels the approved-intent resolver may return
    #[serde(default = "default_approved_intents")]
    pub approved_intents: Vec<String>,

    /// Rule stage order
    #[serde(default = "StageKind::default_order")]
    pub stages: Vec<StageKind>,
}

fn default_max_message_chars() -> usize {
    MAX_MESSAGE_CHARS
}

fn default_rule_stage_max_chars() -> usize {
    50
}

fn default_threshold() -> f64 {
    0.5
}

fn default_approved_intents() -> Vec<String> {
    [
        "change_topic",
        "help",
        "stop",
        "math_question",
        "math_answer",
        "break",
        "safety",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            max_message_chars: default_max_message_chars(),
            rule_stage_max_chars: default_rule_stage_max_chars(),
            answer_intent_threshold: default_threshold(),
            approved_intent_threshold: default_threshold(),
            approved_intents: default_approved_intents(),
            stages: StageKind::default_order(),
        }
    }
}

/// Intent classifier endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// HTTP endpoint; unset means no classifier (rule-only answers)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Cap for one classifier call
    #[serde(default = "default_classifier_timeout")]
    pub request_timeout_ms: u64,
}

fn default_classifier_timeout() -> u64 {
    2_500
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            request_timeout_ms: default_classifier_timeout(),
        }
    }
}

/// Per-request budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Whole evaluation, in milliseconds
    #[serde(default = "default_total_budget")]
    pub total_ms: u64,
}

fn default_total_budget() -> u64 {
    3_000
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            total_ms: default_total_budget(),
        }
    }
}

/// Verdict log sink
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Flush once this many records are buffered
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,

    /// Flush whatever is buffered at this interval
    #[serde(default = "default_flush_interval")]
    pub flush_interval_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Linear backoff step between retries
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Oldest records are dropped beyond this while the store is failing
    #[serde(default = "default_max_buffered")]
    pub max_buffered_records: usize,
}

fn default_true() -> bool {
    true
}

fn default_db_path() -> String {
    VERDICT_DB_PATH.to_string()
}

fn default_flush_threshold() -> usize {
    30
}

fn default_flush_interval() -> u64 {
    5_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    200
}

fn default_channel_capacity() -> usize {
    1_024
}

fn default_max_buffered() -> usize {
    10_000
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            db_path: default_db_path(),
            flush_threshold: default_flush_threshold(),
            flush_interval_ms: default_flush_interval(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
            channel_capacity: default_channel_capacity(),
            max_buffered_records: default_max_buffered(),
        }
    }
}

/// Deployment-specific safety list additions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SafetyConfig {
    #[serde(default)]
    pub extra_profanity: Vec<String>,

    #[serde(default)]
    pub extra_old_buttons: Vec<String>,
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub nlu: NluConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub budget: BudgetConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub safety: SafetyConfig,
}

impl Config {
    /// Load config from file, or return defaults
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {:#}", e);
                Config::default()
            })
    }

    /// Load config from specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Budget split used by the evaluator
    pub fn evaluation_budget(&self) -> EvaluationBudget {
        EvaluationBudget {
            total_ms: self.budget.total_ms,
            classifier_ms: self.classifier.request_timeout_ms,
        }
    }

    /// Rule cascade in the configured order with configured safety lists
    pub fn build_cascade(&self) -> RuleCascade {
        let safety = SafetyGate::new()
            .with_extras(&self.safety.extra_profanity, &self.safety.extra_old_buttons);
        RuleCascade::from_stages(&self.nlu.stages, safety)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.nlu.max_message_chars, 100);
        assert_eq!(config.nlu.rule_stage_max_chars, 50);
        assert_eq!(config.nlu.stages, StageKind::default_order());
        assert_eq!(config.budget.total_ms, 3_000);
        assert_eq!(config.logging.flush_threshold, 30);
        assert_eq!(config.logging.max_retries, 3);
        assert!(config.classifier.endpoint.is_none());
    }

    #[test]
    fn test_partial_section() {
        let toml = r#"
            [nlu]
            approved_intent_threshold = 0.7
            stages = ["safety", "regex_numeric", "exact"]

            [classifier]
            endpoint = "http://localhost:9000/intent"
        "#;
        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.nlu.approved_intent_threshold, 0.7);
        assert_eq!(config.nlu.answer_intent_threshold, 0.5);
        assert_eq!(
            config.nlu.stages,
            vec![StageKind::Safety, StageKind::RegexNumeric, StageKind::Exact]
        );
        assert_eq!(config.classifier.request_timeout_ms, 2_500);
        assert_eq!(config.build_cascade().stage_names(), vec!["safety", "regex_numeric", "exact"]);
    }

    #[test]
    fn test_unknown_stage_rejected() {
        let toml = r#"
            [nlu]
            stages = ["safety", "llm"]
        "#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        let back = Config::from_toml(&text).unwrap();
        assert_eq!(back.logging.db_path, config.logging.db_path);
    }
}
