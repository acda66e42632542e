//! LLM Client Layer - text completion against a local model server
//!
//! This module provides:
//! - LlmClient trait for API abstraction
//! - OllamaClient implementation
//! - Retry helper for transient failures

pub mod client;
pub mod ollama;

pub use client::{LlmClient, LlmError, generate_with_retries};
pub use ollama::OllamaClient;
