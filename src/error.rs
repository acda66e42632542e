//! Error types for Agentry
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::llm::LlmError;

/// All error types that can occur in Agentry
#[derive(Debug, Error)]
pub enum AgentryError {
    /// Tool name not present in the registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool metadata is incomplete
    #[error("Invalid tool metadata: {0}")]
    InvalidTool(String),

    /// A tool with the same name is already registered
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    /// Tool input did not match the tool's schema
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Tool ran but reported a failure
    #[error("Tool execution failed: {0}")]
    ToolExecution(String),

    /// Prompt template loading or rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// Configuration could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// LLM backend error
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Agentry operations
pub type Result<T> = std::result::Result<T, AgentryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_not_found_error() {
        let err = AgentryError::ToolNotFound("weather".to_string());
        assert_eq!(err.to_string(), "Tool not found: weather");
    }

    #[test]
    fn test_duplicate_tool_error() {
        let err = AgentryError::DuplicateTool("chat".to_string());
        assert_eq!(err.to_string(), "Tool 'chat' is already registered");
    }

    #[test]
    fn test_validation_failed_error() {
        let err = AgentryError::ValidationFailed("missing field: expression".to_string());
        assert_eq!(err.to_string(), "Validation failed: missing field: expression");
    }

    #[test]
    fn test_llm_error_conversion() {
        let err: AgentryError = LlmError::InvalidResponse("empty body".to_string()).into();
        assert!(matches!(err, AgentryError::Llm(_)));
        assert!(err.to_string().contains("empty body"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AgentryError = io_err.into();
        assert!(matches!(err, AgentryError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: AgentryError = json_err.into();
        assert!(matches!(err, AgentryError::Json(_)));
    }
}
