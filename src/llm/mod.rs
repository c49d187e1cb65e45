//! Upstream chat-completion client and the generation endpoint.

pub mod handlers;

use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::config::LlmConfig;
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Thin client for an OpenAI-compatible chat-completion API.
///
/// One synchronous round trip per call: no retries, no streaming. The
/// request timeout is the only bound on the round trip.
pub struct LlmClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    default_model: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("http client init failed: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            default_model: config.default_model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    /// Sends `[system?, user]` to the upstream and returns the first
    /// completion's text, or `"No response"` when the payload has an
    /// unexpected shape.
    pub async fn complete(
        &self,
        system_prompt: Option<&str>,
        user_prompt: &str,
        model: Option<&str>,
    ) -> Result<String, AppError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt {
            messages.push(ChatMessage { role: "system", content: system });
        }
        messages.push(ChatMessage { role: "user", content: user_prompt });

        let body = json!({
            "model": model.unwrap_or(&self.default_model),
            "messages": messages,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid upstream response: {}", e)))?;

        if !status.is_success() {
            let message = data["error"]["message"]
                .as_str()
                .unwrap_or("LLM Error")
                .to_string();
            warn!(%status, "upstream completion call failed: {}", message);
            return Err(AppError::Upstream(message));
        }

        let text = data["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("No response")
            .to_string();

        Ok(text)
    }
}
