//! Chat-completion client for OpenAI-compatible endpoints.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::LlmConfig;
use crate::error::LlmError;

/// Sampling temperature sent with every request.
pub const TEMPERATURE: f64 = 1.0;

/// Application name reported to the endpoint.
const APP_TITLE: &str = "Argus Git Commit Analyzer";

/// Maximum response body characters kept in a protocol error.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// A successful completion and how long the call took.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub content: String,
    pub elapsed_secs: f64,
}

/// One blocking-style exchange with a chat model.
///
/// Implementations never retry; pacing and retries belong to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str)
    -> Result<ChatReply, LlmError>;
}

/// Endpoint credentials, normally read from `LLM_BASE_URL`, `LLM_API_KEY`
/// and `LLM_MODEL`.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl LlmSettings {
    pub const BASE_URL_VAR: &'static str = "LLM_BASE_URL";
    pub const API_KEY_VAR: &'static str = "LLM_API_KEY";
    pub const MODEL_VAR: &'static str = "LLM_MODEL";

    /// Read settings from the environment, listing every missing variable.
    pub fn from_env() -> Result<Self, Vec<&'static str>> {
        let read = |name: &'static str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(name)
        };

        let base_url = read(Self::BASE_URL_VAR);
        let api_key = read(Self::API_KEY_VAR);
        let model = read(Self::MODEL_VAR);

        match (base_url, api_key, model) {
            (Ok(base_url), Ok(api_key), Ok(model)) => Ok(Self {
                base_url,
                api_key,
                model,
            }),
            (b, k, m) => Err([b.err(), k.err(), m.err()].into_iter().flatten().collect()),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// [`ChatClient`] over HTTP with bearer-token auth.
#[derive(Debug)]
pub struct HttpChatClient {
    client: reqwest::Client,
    settings: LlmSettings,
    max_tokens: u32,
    timeout_secs: u64,
}

impl HttpChatClient {
    pub fn new(settings: LlmSettings, config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| LlmError::Connection {
                message: format!("Failed to build HTTP client: {}", e),
                status: None,
                elapsed_secs: None,
            })?;

        Ok(Self {
            client,
            settings,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ChatReply, LlmError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: self.max_tokens,
        };
        let body = serde_json::to_vec(&request).map_err(|e| LlmError::Parse {
            message: format!("Failed to serialize request: {}", e),
            elapsed_secs: 0.0,
        })?;
        let request_bytes = body.len();

        let start = Instant::now();
        let response = self
            .client
            .post(&self.settings.base_url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.settings.api_key))
            .header("X-Title", APP_TITLE)
            .body(body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs, None))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, self.timeout_secs, Some(start.elapsed())))?;
        let elapsed_secs = start.elapsed().as_secs_f64();

        info!(
            "Called LLM with {} bytes and got {} bytes in {:.2}s",
            request_bytes,
            bytes.len(),
            elapsed_secs
        );

        if !status.is_success() {
            return Err(LlmError::Connection {
                message: format!(
                    "HTTP {}: {}",
                    status,
                    truncate_chars(&String::from_utf8_lossy(&bytes), MAX_ERROR_BODY_CHARS)
                ),
                status: Some(status.as_u16()),
                elapsed_secs: Some(elapsed_secs),
            });
        }

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| LlmError::Parse {
            message: format!(
                "{}. Body: {}",
                e,
                truncate_chars(&String::from_utf8_lossy(&bytes), MAX_ERROR_BODY_CHARS)
            ),
            elapsed_secs,
        })?;

        let content = value
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| LlmError::Protocol {
                body: truncate_chars(&value.to_string(), MAX_ERROR_BODY_CHARS),
                elapsed_secs,
            })?;

        debug!("LLM reply: {}", content);

        Ok(ChatReply {
            content: content.to_string(),
            elapsed_secs,
        })
    }
}

fn transport_error(e: reqwest::Error, timeout_secs: u64, elapsed: Option<Duration>) -> LlmError {
    let message = if e.is_timeout() {
        format!("request timed out after {}s", timeout_secs)
    } else {
        e.to_string()
    };
    LlmError::Connection {
        message,
        status: e.status().map(|s| s.as_u16()),
        elapsed_secs: elapsed.map(|d| d.as_secs_f64()),
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
