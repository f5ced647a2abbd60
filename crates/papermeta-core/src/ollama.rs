//! Client for the Ollama `/api/generate` endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Config;
use crate::prompt::build_prompt;

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.2";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },
    #[error("HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed response envelope: {0}")]
    MalformedResponse(String),
    #[error("model returned an empty response")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Minimal non-streaming Ollama client.
pub struct OllamaClient {
    client: reqwest::Client,
    host: String,
    model: String,
    timeout: Duration,
}

impl OllamaClient {
    pub fn new(host: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let host = host.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            host,
            model: model.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.ollama_host.clone(),
            config.model.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.host)
    }

    /// Send one generation request and return the model's `response` text.
    pub async fn generate(&self, prompt: &str) -> Result<String, InferenceError> {
        let url = self.generate_url();
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        tracing::debug!(
            url = %url,
            model = %self.model,
            prompt_len = prompt.len(),
            "sending generate request"
        );

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.request_error(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(InferenceError::Status { status, body });
        }

        let text = resp.text().await.map_err(|e| self.request_error(&url, e))?;
        let envelope: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;

        if envelope.response.is_empty() {
            return Err(InferenceError::EmptyResponse);
        }
        Ok(envelope.response)
    }

    fn request_error(&self, url: &str, source: reqwest::Error) -> InferenceError {
        if source.is_timeout() {
            InferenceError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }
        } else {
            InferenceError::Request {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// Turns leading document text into raw model output.
pub struct MetadataExtractor {
    client: OllamaClient,
    max_prompt_chars: usize,
}

impl MetadataExtractor {
    pub fn new(client: OllamaClient, max_prompt_chars: usize) -> Self {
        Self {
            client,
            max_prompt_chars,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(OllamaClient::from_config(config), config.max_prompt_chars)
    }

    pub fn client(&self) -> &OllamaClient {
        &self.client
    }

    pub async fn extract(&self, text: &str) -> Result<String, InferenceError> {
        let prompt = build_prompt(text, self.max_prompt_chars);
        self.client.generate(&prompt).await
    }
}
