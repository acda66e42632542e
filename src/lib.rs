//! Agentry - a modular tool-using agent framework
//!
//! An agent kernel reads user messages, asks a reasoner which tool to use,
//! fills missing tool fields, runs the tool, and remembers the conversation.
//! The prompt-template manager writes a `<tool>_prompt.json` template for
//! every registered tool.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod id;
pub mod interface;
pub mod kernel;
pub mod llm;
pub mod manager;
pub mod memory;
pub mod model_selector;
pub mod prompt;
pub mod reasoning;
pub mod tools;

pub use error::{AgentryError, Result};
