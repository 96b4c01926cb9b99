//! Judgment service abstraction
//!
//! A judgment is an external model's 0-10 assessment of a paper plus a short
//! summary. Providers:
//! - Anthropic Messages API
//! - Mock (deterministic, no network)

mod anthropic;
pub mod parser;
pub mod prompt;

pub use anthropic::AnthropicJudge;
pub use parser::parse_judgment;

use crate::config::{JudgmentConfig, ResearchInterests};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Environment variable consulted when no API key is configured
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// A parsed model assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    /// Always within 0..=10
    pub score: u8,
    pub summary: String,
}

/// Paper text sent for judgment
#[derive(Debug, Clone, Copy)]
pub struct JudgmentRequest<'a> {
    pub title: &'a str,
    pub abstract_text: &'a str,
    pub categories: &'a str,
}

/// Trait for paper judgment
#[async_trait]
pub trait Judge: Send + Sync {
    /// Judge one paper.
    ///
    /// `Ok(None)` means the service answered but the reply could not be
    /// parsed. Transport failures (timeout, rejected credentials, quota,
    /// non-success status) are returned as errors.
    async fn judge(&self, request: &JudgmentRequest<'_>) -> Result<Option<Judgment>>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Mock judge for testing and offline runs
pub struct MockJudge {
    score: u8,
}

impl MockJudge {
    pub fn new(score: u8) -> Self {
        Self { score: score.min(10) }
    }
}

impl Default for MockJudge {
    fn default() -> Self {
        Self::new(5)
    }
}

#[async_trait]
impl Judge for MockJudge {
    async fn judge(&self, request: &JudgmentRequest<'_>) -> Result<Option<Judgment>> {
        Ok(Some(Judgment {
            score: self.score,
            summary: format!("Mock assessment of \"{}\".", request.title),
        }))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

fn resolve_api_key(config: &JudgmentConfig) -> Option<String> {
    config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
}

/// Create a judge based on configuration.
///
/// Fails with a configuration error when the provider is unknown or no API
/// key is available; callers treat that as "judgment unavailable".
pub fn create_judge(
    config: &JudgmentConfig,
    interests: Option<&ResearchInterests>,
) -> Result<Arc<dyn Judge>> {
    match config.provider.as_str() {
        "anthropic" => {
            let api_key = resolve_api_key(config).ok_or_else(|| AppError::Configuration {
                message: format!(
                    "no judgment API key configured (set judgment.api_key or {})",
                    API_KEY_ENV
                ),
            })?;
            Ok(Arc::new(AnthropicJudge::new(config, api_key, interests)?))
        }
        "mock" => Ok(Arc::new(MockJudge::default())),
        other => Err(AppError::Configuration {
            message: format!("unknown judgment provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_judge_is_deterministic() {
        let judge = MockJudge::new(12);
        let request = JudgmentRequest {
            title: "T",
            abstract_text: "A",
            categories: "cs.LG",
        };
        let first = judge.judge(&request).await.unwrap().unwrap();
        let second = judge.judge(&request).await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.score, 10);
        assert_eq!(judge.model_name(), "mock");
    }

    #[test]
    fn test_create_judge_providers() {
        let config = JudgmentConfig {
            provider: "mock".to_string(),
            ..Default::default()
        };
        assert_eq!(create_judge(&config, None).unwrap().model_name(), "mock");

        let config = JudgmentConfig {
            provider: "oracle".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            create_judge(&config, None),
            Err(AppError::Configuration { .. })
        ));
    }

    #[test]
    fn test_create_judge_with_configured_key() {
        let config = JudgmentConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let judge = create_judge(&config, None).unwrap();
        assert_eq!(judge.model_name(), config.model);
    }
}
