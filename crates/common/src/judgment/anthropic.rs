//! Anthropic Messages API client

use super::{parse_judgment, prompt, Judge, Judgment, JudgmentRequest};
use crate::config::{JudgmentConfig, ResearchInterests};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

const API_VERSION: &str = "2023-06-01";

/// Judgment client speaking the Anthropic Messages API
pub struct AnthropicJudge {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    timeout: Duration,
    system: String,
    limiter: Option<DefaultDirectRateLimiter>,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicJudge {
    /// Create a new client. The system instruction is built once here.
    pub fn new(
        config: &JudgmentConfig,
        api_key: String,
        interests: Option<&ResearchInterests>,
    ) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let limiter = config
            .requests_per_minute
            .and_then(NonZeroU32::new)
            .map(|rpm| RateLimiter::direct(Quota::per_minute(rpm)));

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            max_tokens: config.max_tokens,
            timeout,
            system: prompt::system_instruction(interests),
            limiter,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::JudgmentTimeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            AppError::JudgmentRequest {
                message: format!("Request failed: {}", e),
            }
        }
    }

    async fn make_request(&self, user: String) -> Result<MessagesResponse> {
        let url = format!("{}/v1/messages", self.base_url);

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: &self.system,
            messages: vec![Message { role: "user", content: user }],
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::JudgmentRejected {
                    status: status.as_u16(),
                },
                StatusCode::TOO_MANY_REQUESTS => AppError::QuotaExceeded {
                    message: format!("judgment service rate limit: {}", body),
                },
                _ => AppError::JudgmentRequest {
                    message: format!("API error {}: {}", status, body),
                },
            });
        }

        response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_error(e)
            } else {
                AppError::JudgmentRequest {
                    message: format!("Failed to decode response: {}", e),
                }
            }
        })
    }
}

#[async_trait]
impl Judge for AnthropicJudge {
    async fn judge(&self, request: &JudgmentRequest<'_>) -> Result<Option<Judgment>> {
        if let Some(ref limiter) = self.limiter {
            limiter.until_ready().await;
        }

        let response = self.make_request(prompt::user_message(request)).await?;

        let text = response
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text);

        let Some(text) = text else {
            warn!(model = %self.model, "Judgment reply carried no text block");
            return Ok(None);
        };

        let judgment = parse_judgment(&text);
        if judgment.is_none() {
            debug!(model = %self.model, reply = %text, "Unparseable judgment reply");
        }
        Ok(judgment)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JudgmentConfig {
        JudgmentConfig {
            api_base: "http://127.0.0.1:9/".to_string(),
            requests_per_minute: Some(0),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_normalizes_base_url() {
        let judge = AnthropicJudge::new(&config(), "sk-test".into(), None).unwrap();
        assert_eq!(judge.base_url, "http://127.0.0.1:9");
        // Zero requests per minute disables pacing
        assert!(judge.limiter.is_none());
        assert_eq!(judge.max_tokens, 256);
    }

    #[test]
    fn test_request_body_shape() {
        let request = MessagesRequest {
            model: "m",
            max_tokens: 256,
            system: "sys",
            messages: vec![Message { role: "user", content: "hi".into() }],
        };
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["model"], "m");
        assert_eq!(body["max_tokens"], 256);
        assert_eq!(body["system"], "sys");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
    }

    #[test]
    fn test_response_text_block_extraction() {
        let raw = r#"{"content":[{"type":"thinking"},{"type":"text","text":"{\"score\":6}"}]}"#;
        let response: MessagesResponse = serde_json::from_str(raw).unwrap();
        let text = response
            .content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
            .unwrap();
        assert_eq!(parse_judgment(&text).unwrap().score, 6);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let judge = AnthropicJudge::new(&config(), "sk-test".into(), None).unwrap();
        let request = JudgmentRequest {
            title: "T",
            abstract_text: "A",
            categories: "c",
        };
        let err = judge.judge(&request).await.unwrap_err();
        assert!(err.is_judgment_failure());
    }
}
