//! Inference transports
//!
//! A transport takes a fully formed request (model, system instruction, user
//! prompt) and returns the backend's raw response text. Two backends are
//! supported:
//! - `OpenAiTransport`: OpenAI-compatible chat completions API
//! - `OllamaTransport`: local Ollama server (`/api/chat`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("songtag/", env!("CARGO_PKG_VERSION"));

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {0}: {1}")]
    Status(u16, String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// A single completion request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceRequest {
    /// Model identifier
    pub model: String,
    /// System instruction
    pub system: String,
    /// User prompt
    pub prompt: String,
    /// Ask the backend to constrain output to a JSON object
    pub force_json: bool,
}

/// Backend capable of answering an `InferenceRequest`
#[async_trait]
pub trait InferenceTransport: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Send the request and return the raw response text
    async fn complete(&self, request: &InferenceRequest) -> Result<String, TransportError>;

    /// Verify the backend is reachable
    async fn health_check(&self) -> Result<(), TransportError>;
}

fn map_reqwest_error(e: reqwest::Error, timeout: Option<Duration>) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(timeout.unwrap_or_default())
    } else {
        TransportError::Network(e.to_string())
    }
}

async fn error_for_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_default();
    Err(TransportError::Status(status.as_u16(), error_text))
}

fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client, TransportError> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| TransportError::Configuration(e.to_string()))
}

// ============================================================================
// OpenAI-compatible chat completions
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions transport
pub struct OpenAiTransport {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Option<Duration>,
}

impl OpenAiTransport {
    /// Create a transport; `timeout` of `None` leaves requests unbounded
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, TransportError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(TransportError::Configuration(
                "OpenAI API key not configured (set OPENAI_API_KEY or --api-key)".to_string(),
            ));
        }

        Ok(Self {
            http_client: build_http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout,
        })
    }

    fn request_body(request: &InferenceRequest) -> serde_json::Value {
        let mut body = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
        });
        if request.force_json {
            body["response_format"] = json!({ "type": "json_object" });
        }
        body
    }
}

#[async_trait]
impl InferenceTransport for OpenAiTransport {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &InferenceRequest) -> Result<String, TransportError> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %request.model, url = %url, "Sending chat completion request");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;

        let completion: ChatCompletionResponse = error_for_status(response)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                TransportError::InvalidResponse("response has no message content".to_string())
            })
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout))?;
        error_for_status(response).await.map(|_| ())
    }
}

// ============================================================================
// Ollama
// ============================================================================

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<OllamaMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

/// Local Ollama server transport
pub struct OllamaTransport {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OllamaTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            http_client: build_http_client(Some(timeout))?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn request_body(request: &InferenceRequest) -> serde_json::Value {
        let mut body = json!({
            "model": request.model,
            "stream": false,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt },
            ],
        });
        if request.force_json {
            body["format"] = json!("json");
        }
        body
    }
}

#[async_trait]
impl InferenceTransport for OllamaTransport {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn complete(&self, request: &InferenceRequest) -> Result<String, TransportError> {
        let url = format!("{}/api/chat", self.base_url);
        tracing::debug!(model = %request.model, url = %url, "Sending Ollama chat request");

        let response = self
            .http_client
            .post(&url)
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, Some(self.timeout)))?;

        let chat: OllamaChatResponse = error_for_status(response)
            .await?
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

        chat.message
            .map(|m| m.content)
            .ok_or_else(|| TransportError::InvalidResponse("response has no message".to_string()))
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, Some(self.timeout)))?;
        error_for_status(response).await.map(|_| ())
    }
}
