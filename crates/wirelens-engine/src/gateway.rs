use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;
use wirelens_contracts::RelayError;

use crate::truncate_text;

const INFERENCE_BODY_MAX_CHARS: usize = 512;

/// Decoding parameters for one gateway invocation. The inspection
/// pipeline pins temperature to 0 for run-to-run stability; the
/// description pipeline uses 0.5 because it values phrasing variety.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: Option<u64>,
}

impl CompletionOptions {
    pub fn deterministic(model: impl Into<String>, max_output_tokens: u64) -> Self {
        Self {
            model: model.into(),
            temperature: 0.0,
            max_output_tokens: Some(max_output_tokens),
        }
    }

    pub fn sampled(model: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            temperature,
            max_output_tokens: None,
        }
    }
}

/// The outbound seam to the multimodal inference service. Returns the
/// raw reply text; interpreting it is the decision parser's job. A
/// successful call with absent content yields an empty string.
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    async fn complete(
        &self,
        messages: &[Value],
        options: &CompletionOptions,
    ) -> Result<String, RelayError>;
}

/// Production gateway over an OpenAI-compatible chat-completions API.
pub struct OpenAiGateway {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl OpenAiGateway {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RelayError::inference(err.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl InferenceGateway for OpenAiGateway {
    async fn complete(
        &self,
        messages: &[Value],
        options: &CompletionOptions,
    ) -> Result<String, RelayError> {
        let endpoint = format!("{}/chat/completions", self.api_base);
        let mut payload = json!({
            "model": options.model,
            "messages": messages,
            "temperature": options.temperature,
        });
        if let Some(max_tokens) = options.max_output_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }

        info!(model = %options.model, messages = messages.len(), "inference request");
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| RelayError::inference(format!("request failed ({endpoint}): {err}")))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| RelayError::inference(format!("response body read failed: {err}")))?;
        if !status.is_success() {
            return Err(RelayError::inference(format!(
                "request failed ({}): {}",
                status.as_u16(),
                truncate_text(&body, INFERENCE_BODY_MAX_CHARS)
            )));
        }
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|_| RelayError::inference("invalid JSON payload from inference service"))?;
        Ok(extract_reply_text(&parsed))
    }
}

/// Pulls the first choice's message content out of a chat-completions
/// reply. Absent content is an empty string, never an error; the
/// decision parser owns that ambiguity.
fn extract_reply_text(payload: &Value) -> String {
    payload
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}
