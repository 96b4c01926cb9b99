//! Configuration management for PaperScout
//!
//! Supports loading configuration from:
//! - Configuration files (config.toml, config.yaml, config.json)
//! - Environment variables (prefixed with PAPERSCOUT__)
//! - Default values
//!
//! Invalid values are fatal: a weight that does not parse as a number, or one
//! outside its allowed range, fails `load` before any paper is touched.

use crate::errors::{AppError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Environment variable prefix, e.g. `PAPERSCOUT__SCORING__HEURISTIC_WEIGHT=0.5`
pub const ENV_PREFIX: &str = "PAPERSCOUT";

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    /// Database configuration
    #[serde(default)]
    #[validate(nested)]
    pub database: DatabaseConfig,

    /// Score combination and judgment eligibility
    #[serde(default)]
    #[validate(nested)]
    pub scoring: ScoringConfig,

    /// Judgment service configuration
    #[serde(default)]
    #[validate(nested)]
    pub judgment: JudgmentConfig,

    /// Enrichment configuration
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Topics to weight up or down in judgments
    #[serde(default)]
    pub research_interests: Option<ResearchInterests>,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DatabaseConfig {
    /// SQLite database URL
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    #[validate(range(min = 1))]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ScoringConfig {
    /// Weight applied to the heuristic score in the combined score
    #[serde(default = "default_heuristic_weight")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub heuristic_weight: f64,

    /// Weight applied to the judgment score in the combined score
    #[serde(default = "default_judgment_weight")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub judgment_weight: f64,

    /// Papers at or above this heuristic score are sent for judgment
    #[serde(default = "default_min_heuristic_score")]
    #[validate(range(min = 0.0, max = 10.0))]
    pub min_heuristic_score_for_judgment: f64,

    /// Successful judgments allowed per orchestrator run
    #[serde(default = "default_max_judgments")]
    pub max_judgments_per_run: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct JudgmentConfig {
    /// Judgment provider: anthropic, mock
    #[serde(default = "default_judgment_provider")]
    pub provider: String,

    /// Model identifier passed through to the service
    #[serde(default = "default_judgment_model")]
    pub model: String,

    /// API key (falls back to ANTHROPIC_API_KEY)
    pub api_key: Option<String>,

    /// API base URL (for proxies and test servers)
    #[serde(default = "default_judgment_api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "default_judgment_timeout")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,

    /// Output token budget per judgment
    #[serde(default = "default_judgment_max_tokens")]
    #[validate(range(min = 1))]
    pub max_tokens: u32,

    /// Client-side pacing; unset or 0 disables throttling
    #[serde(default)]
    pub requests_per_minute: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EnrichmentConfig {
    /// Institution watch-list matched against author affiliations
    #[serde(default)]
    pub affiliation_keywords: Vec<String>,

    /// Hours to wait before retrying a paper that was not found
    #[serde(default = "default_retry_after_hours")]
    pub retry_after_hours: i64,

    /// Stop retrying papers fetched more than this many days ago
    #[serde(default = "default_retry_window_days")]
    pub retry_window_days: i64,
}

/// Research preferences folded into the judgment instruction
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ResearchInterests {
    #[serde(default)]
    pub boost: Vec<String>,

    #[serde(default)]
    pub penalize: Vec<String>,
}

impl ResearchInterests {
    pub fn is_empty(&self) -> bool {
        self.boost.is_empty() && self.penalize.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logging: bool,
}

// Default value functions
fn default_database_url() -> String { "sqlite://paperscout.db?mode=rwc".to_string() }
fn default_max_connections() -> u32 { 5 }
fn default_connect_timeout() -> u64 { 10 }
fn default_heuristic_weight() -> f64 { 0.4 }
fn default_judgment_weight() -> f64 { 0.6 }
fn default_min_heuristic_score() -> f64 { 3.0 }
fn default_max_judgments() -> u32 { 100 }
fn default_judgment_provider() -> String { "anthropic".to_string() }
fn default_judgment_model() -> String { "claude-haiku-4-5-20251001".to_string() }
fn default_judgment_api_base() -> String { "https://api.anthropic.com".to_string() }
fn default_judgment_timeout() -> u64 { 30 }
fn default_judgment_max_tokens() -> u32 { 256 }
fn default_retry_after_hours() -> i64 { 24 }
fn default_retry_window_days() -> i64 { 7 }
fn default_log_level() -> String { "info".to_string() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl ScoringConfig {
    /// Range checks pass NaN through, and `nan` parses from the environment
    fn ensure_finite(&self) -> Result<()> {
        let fields = [
            ("heuristic_weight", self.heuristic_weight),
            ("judgment_weight", self.judgment_weight),
            ("min_heuristic_score_for_judgment", self.min_heuristic_score_for_judgment),
        ];
        match fields.iter().find(|(_, value)| !value.is_finite()) {
            Some((field, value)) => Err(AppError::Validation {
                message: format!("scoring.{} must be a finite number, got {}", field, value),
                field: Some(field.to_string()),
            }),
            None => Ok(()),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            heuristic_weight: default_heuristic_weight(),
            judgment_weight: default_judgment_weight(),
            min_heuristic_score_for_judgment: default_min_heuristic_score(),
            max_judgments_per_run: default_max_judgments(),
        }
    }
}

impl Default for JudgmentConfig {
    fn default() -> Self {
        Self {
            provider: default_judgment_provider(),
            model: default_judgment_model(),
            api_key: None,
            api_base: default_judgment_api_base(),
            timeout_secs: default_judgment_timeout(),
            max_tokens: default_judgment_max_tokens(),
            requests_per_minute: None,
        }
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            affiliation_keywords: Vec::new(),
            retry_after_hours: default_retry_after_hours(),
            retry_window_days: default_retry_window_days(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            scoring: ScoringConfig::default(),
            judgment: JudgmentConfig::default(),
            enrichment: EnrichmentConfig::default(),
            research_interests: None,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }

        let config = builder.add_source(env_source()).build()?;
        Self::finish(config)
    }

    /// Load from an in-memory document (used by tests and embedded defaults)
    pub fn from_str_with_format(contents: &str, format: FileFormat) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(contents, format))
            .build()?;
        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self> {
        let app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        app.scoring.ensure_finite()?;
        Ok(app)
    }

    /// Research interests, if any directive is configured
    pub fn interests(&self) -> Option<&ResearchInterests> {
        self.research_interests.as_ref().filter(|i| !i.is_empty())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("enrichment.affiliation_keywords")
        .with_list_parse_key("research_interests.boost")
        .with_list_parse_key("research_interests.penalize")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.scoring.heuristic_weight, 0.4);
        assert_eq!(config.scoring.judgment_weight, 0.6);
        assert_eq!(config.scoring.min_heuristic_score_for_judgment, 3.0);
        assert_eq!(config.scoring.max_judgments_per_run, 100);
        assert!(config.interests().is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
scoring:
  heuristic_weight: 0.5
  max_judgments_per_run: 10
enrichment:
  affiliation_keywords: [Google, MIT]
research_interests:
  boost: [quantum error correction]
"#;
        let config = AppConfig::from_str_with_format(yaml, FileFormat::Yaml).unwrap();
        assert_eq!(config.scoring.heuristic_weight, 0.5);
        assert_eq!(config.scoring.judgment_weight, 0.6);
        assert_eq!(config.scoring.max_judgments_per_run, 10);
        assert_eq!(config.enrichment.affiliation_keywords, vec!["Google", "MIT"]);
        assert_eq!(config.enrichment.retry_after_hours, 24);
        let interests = config.interests().unwrap();
        assert_eq!(interests.boost, vec!["quantum error correction"]);
        assert!(interests.penalize.is_empty());
    }

    #[test]
    fn test_non_numeric_weight_is_fatal() {
        let yaml = "scoring:\n  heuristic_weight: heavy\n";
        let err = AppConfig::from_str_with_format(yaml, FileFormat::Yaml).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_out_of_range_threshold_is_fatal() {
        let toml = "[scoring]\nmin_heuristic_score_for_judgment = 42.0\n";
        let err = AppConfig::from_str_with_format(toml, FileFormat::Toml).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_nan_weight_in_file_is_fatal() {
        let toml = "[scoring]\njudgment_weight = nan\n";
        let err = AppConfig::from_str_with_format(toml, FileFormat::Toml).unwrap_err();
        match err {
            AppError::Validation { field, .. } => {
                assert_eq!(field.as_deref(), Some("judgment_weight"))
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_nan_weight_from_environment_is_fatal() {
        std::env::set_var("PAPERSCOUT__SCORING__JUDGMENT_WEIGHT", "nan");
        let result = AppConfig::load(None);
        std::env::remove_var("PAPERSCOUT__SCORING__JUDGMENT_WEIGHT");

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[test]
    fn test_infinite_threshold_is_fatal() {
        let config = ScoringConfig {
            min_heuristic_score_for_judgment: f64::INFINITY,
            ..Default::default()
        };
        assert!(config.ensure_finite().is_err());
        assert!(ScoringConfig::default().ensure_finite().is_ok());
    }

    #[test]
    fn test_empty_interests_are_ignored() {
        let yaml = "research_interests:\n  boost: []\n";
        let config = AppConfig::from_str_with_format(yaml, FileFormat::Yaml).unwrap();
        assert!(config.interests().is_none());
    }
}
