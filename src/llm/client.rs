//! Core LLM client trait and error types

use async_trait::async_trait;

/// Stateless text-completion client: each call is independent
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete `prompt`, returning the full generated text
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Model identifier this client talks to
    fn model(&self) -> &str;
}

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("LLM failed after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl LlmError {
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::ApiError { status, .. } => *status == 429 || *status >= 500,
            LlmError::Network(_) => true,
            LlmError::InvalidResponse(_) => false,
            LlmError::JsonError(_) => false,
            LlmError::RetriesExhausted { .. } => false,
        }
    }
}

/// Call `client` up to `attempts` times, retrying only retryable failures
pub async fn generate_with_retries(
    client: &dyn LlmClient,
    prompt: &str,
    attempts: u32,
) -> Result<String, LlmError> {
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match client.generate(prompt).await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_retryable() => {
                log::warn!("LLM attempt {}/{} failed: {}", attempt, attempts, e);
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(LlmError::RetriesExhausted {
        attempts,
        last: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays a fixed list of results, one per call
    struct ScriptedClient {
        results: Mutex<Vec<Result<String, LlmError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedClient {
        fn new(mut results: Vec<Result<String, LlmError>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            *self.calls.lock().unwrap() += 1;
            self.results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(LlmError::InvalidResponse("script exhausted".to_string())))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn server_error() -> LlmError {
        LlmError::ApiError {
            status: 503,
            message: "busy".to_string(),
        }
    }

    #[test]
    fn test_is_retryable() {
        assert!(server_error().is_retryable());
        assert!(
            LlmError::ApiError {
                status: 429,
                message: "slow down".to_string()
            }
            .is_retryable()
        );
        assert!(
            !LlmError::ApiError {
                status: 400,
                message: "bad request".to_string()
            }
            .is_retryable()
        );
        assert!(!LlmError::InvalidResponse("bad".to_string()).is_retryable());
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let client = ScriptedClient::new(vec![Err(server_error()), Ok("done".to_string())]);
        let text = generate_with_retries(&client, "prompt", 3).await.unwrap();
        assert_eq!(text, "done");
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let client = ScriptedClient::new(vec![Err(server_error()), Err(server_error())]);
        let err = generate_with_retries(&client, "prompt", 2).await.unwrap_err();
        assert!(matches!(err, LlmError::RetriesExhausted { attempts: 2, .. }));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_stops_immediately() {
        let client = ScriptedClient::new(vec![
            Err(LlmError::InvalidResponse("no response field".to_string())),
            Ok("unused".to_string()),
        ]);
        let err = generate_with_retries(&client, "prompt", 3).await.unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse(_)));
        assert_eq!(client.calls(), 1);
    }
}
