//! Client for the external text-classification service.
//!
//! Speaks the chat-completions wire format. Every call is bounded by a
//! timeout; callers are expected to fall back to deterministic heuristics
//! when a call fails, so errors here never propagate past the service layer.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const MAX_RETRIES: usize = 2;
const BASE_BACKOFF_MS: u64 = 200;

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty reply")]
    EmptyReply,
}

/// Classification service client with bounded timeout and retry.
#[derive(Clone)]
pub struct ClassifierClient {
    config: ClassifierConfig,
    client: reqwest::Client,
}

impl ClassifierClient {
    pub fn from_env() -> Self {
        let api_key = env_string("CLASSIFIER_API_KEY");
        let model = env_string("CLASSIFIER_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let endpoint =
            env_string("CLASSIFIER_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let timeout =
            Duration::from_millis(env_u64("CLASSIFIER_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT_MS));

        Self::new(ClassifierConfig {
            api_key,
            model,
            endpoint,
            timeout,
        })
    }

    pub fn new(config: ClassifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    /// A client with no credentials. Every call fails fast, which sends all
    /// consumers down their deterministic fallback path.
    pub fn disabled() -> Self {
        Self::new(ClassifierConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        })
    }

    pub fn is_available(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Send a system prompt plus user text and return the reply content.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, ClassifierError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ClassifierError::NotConfigured("CLASSIFIER_API_KEY"))?;

        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );
        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "stream": false,
        });

        let response = self.post_with_retry(&url, api_key, &payload).await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(ClassifierError::EmptyReply)
    }

    async fn post_with_retry(
        &self,
        url: &str,
        api_key: &str,
        payload: &serde_json::Value,
    ) -> Result<WireResponse, ClassifierError> {
        let mut last_error: Option<ClassifierError> = None;

        for retry in 0..=MAX_RETRIES {
            match self
                .client
                .post(url)
                .bearer_auth(api_key)
                .json(payload)
                .send()
                .await
            {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let bytes = resp.bytes().await?;
                        return serde_json::from_slice(&bytes).map_err(ClassifierError::Json);
                    }

                    let body = resp.text().await.unwrap_or_default();
                    let err = ClassifierError::HttpStatus { status, body };
                    if retry < MAX_RETRIES && is_retryable(status) {
                        warn!(retry, %status, "classifier request failed, retrying");
                        sleep(Duration::from_millis(BASE_BACKOFF_MS << retry)).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let err = ClassifierError::Request(e);
                    if retry < MAX_RETRIES {
                        warn!(retry, "classifier request error, retrying");
                        sleep(Duration::from_millis(BASE_BACKOFF_MS << retry)).await;
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
            }
        }

        Err(last_error.unwrap_or(ClassifierError::EmptyReply))
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.parse().ok()
}

fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS
        || status == reqwest::StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
}

/// Strip a wrapping markdown code fence, tolerating an info string like
/// `json` on the opening fence.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };

    rest.trim_end()
        .strip_suffix("```")
        .map(str::trim)
        .unwrap_or_else(|| rest.trim())
}

/// Parse a reply expected to be a JSON array, keeping only string entries.
/// Tolerates code-fence wrapping.
pub fn parse_string_array(raw: &str) -> Result<Vec<String>, ClassifierError> {
    let values: Vec<serde_json::Value> = serde_json::from_str(strip_code_fences(raw))?;
    Ok(values
        .into_iter()
        .filter_map(|value| value.as_str().map(str::to_string))
        .collect())
}
