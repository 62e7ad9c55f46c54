//! Vision model interaction: build the chat request and issue the single call.
//!
//! This module is intentionally thin — all prompt engineering lives in
//! [`crate::prompts`] so it can be changed without touching transport or
//! error-handling logic here.
//!
//! ## One call, no retry, no timeout
//!
//! The pipeline makes exactly one request per run. Transport and HTTP
//! failures surface unmodified; there is no backoff loop, and no client-side
//! timeout is configured — the run blocks for as long as the transport layer
//! and remote inference take. Callers who need a deadline wrap the call
//! themselves.

use crate::config::ExtractionConfig;
use crate::error::ReceiptError;
use crate::prompts::USER_PROMPT;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{debug, info};

/// Public OpenAI endpoint, used when neither the config nor the environment
/// names an alternate one.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable consulted for the API key when the config has none.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable consulted for an alternate endpoint.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// A configured connection to the vision model API.
///
/// Construction resolves the credential and endpoint once; the inner
/// `reqwest::Client` pools connections and is safe to share across tasks, so
/// one `ExtractionClient` can serve concurrent callers.
pub struct ExtractionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// The model's raw reply plus the token counts the API reported.
#[derive(Debug, Clone)]
pub struct RawReply {
    /// Verbatim text of the first choice. Not interpreted here — parsing is
    /// the next stage's job.
    pub content: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl ExtractionClient {
    /// Build a client from the config, resolving the credential and endpoint.
    ///
    /// Resolution order, most-specific first: explicit config value, then the
    /// environment (`OPENAI_API_KEY` / `OPENAI_BASE_URL`), then — for the
    /// endpoint only — the public default. A key that resolves to nothing is
    /// [`ReceiptError::MissingApiKey`], raised here so the failure happens
    /// before any image work or network traffic.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ReceiptError> {
        let api_key = resolve_api_key(
            config.api_key.as_deref(),
            std::env::var(API_KEY_ENV).ok(),
        )?;
        let base_url = resolve_base_url(
            config.base_url.as_deref(),
            std::env::var(BASE_URL_ENV).ok(),
        );

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        })
    }

    /// Issue the one extraction request and return the raw reply text.
    ///
    /// The request carries the rendered instructions as the system message, a
    /// fixed short user instruction, and the image as a data-URI attachment,
    /// with `response_format: json_object` so the model constrains its reply
    /// to a single JSON document.
    pub async fn extract(
        &self,
        instructions: &str,
        image_b64: &str,
        config: &ExtractionConfig,
    ) -> Result<RawReply, ReceiptError> {
        let body = build_request_body(
            instructions,
            image_b64,
            config.model_id(),
            config.temperature,
            &config.reasoning_effort,
        );

        info!("Sending receipt to {} for extraction", config.model_id());
        let start = Instant::now();

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReceiptError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let reply: ChatResponse = response.json().await?;
        let usage = reply.usage.unwrap_or_default();
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ReceiptError::EmptyReply)?;

        debug!(
            "Reply: {} prompt tokens, {} completion tokens, {:?}",
            usage.prompt_tokens,
            usage.completion_tokens,
            start.elapsed()
        );

        Ok(RawReply {
            content,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        })
    }
}

/// Assemble the chat-completions request body.
///
/// Kept as a pure function so the wire shape is unit-testable without a live
/// endpoint.
fn build_request_body(
    instructions: &str,
    image_b64: &str,
    model: &str,
    temperature: f32,
    reasoning_effort: &str,
) -> Value {
    json!({
        "model": model,
        "response_format": { "type": "json_object" },
        "temperature": temperature,
        "reasoning_effort": reasoning_effort,
        "messages": [
            {
                "role": "system",
                "content": instructions,
            },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": USER_PROMPT },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/png;base64,{image_b64}") },
                    },
                ],
            },
        ],
    })
}

/// Explicit key, else environment, else failure. Empty strings count as unset.
fn resolve_api_key(
    explicit: Option<&str>,
    env: Option<String>,
) -> Result<String, ReceiptError> {
    if let Some(key) = explicit.filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    if let Some(key) = env.filter(|k| !k.is_empty()) {
        return Ok(key);
    }
    Err(ReceiptError::MissingApiKey)
}

/// Explicit endpoint, else environment, else [`DEFAULT_BASE_URL`]. A trailing
/// slash is trimmed so path joining stays predictable.
fn resolve_base_url(explicit: Option<&str>, env: Option<String>) -> String {
    explicit
        .map(str::to_string)
        .or(env)
        .filter(|u| !u.is_empty())
        .map(|u| u.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

// ── Response wire types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}
