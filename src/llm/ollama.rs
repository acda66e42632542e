//! Ollama-compatible generate endpoint client
//!
//! Sends `{"model", "prompt", "stream": false}` and reads the `response`
//! field of the reply.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::LlmConfig;
use crate::llm::client::{LlmClient, LlmError};

pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }

    /// Build the request body for a prompt
    fn build_request(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false
        })
    }

    /// Extract the generated text from a reply body
    fn parse_response(body: &Value) -> Result<String, LlmError> {
        body.get("response")
            .and_then(Value::as_str)
            .map(|text| text.trim().to_string())
            .ok_or_else(|| LlmError::InvalidResponse(format!("missing 'response' field in {}", body)))
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        log::debug!("POST {} (model {}, {} chars)", self.base_url, self.model, prompt.len());

        let response = self
            .client
            .post(&self.base_url)
            .json(&self.build_request(prompt))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        Self::parse_response(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
