//! Reasoning - decide which tool handles a user request
//!
//! A `Reasoner` turns an input (plus memory and the available tools) into a
//! `Decision`. `SimpleReasoner` is rule-based; `LlmReasoner` asks a model.

mod llm;
mod simple;
pub mod templates;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::memory::Memory;
use crate::tools::ToolRegistry;

pub use llm::{LlmReasoner, extract_json, parse_decision};
pub use simple::SimpleReasoner;

/// Name of the conversational tool every fallback routes to
pub const CHAT_TOOL: &str = "chat";

/// The reasoner's choice of tool and input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub thoughts: String,
    pub tool_name: Option<String>,
    #[serde(default = "empty_object")]
    pub tool_input: Value,
}

fn empty_object() -> Value {
    json!({})
}

impl Decision {
    pub fn new(thoughts: impl Into<String>, tool_name: impl Into<String>, tool_input: Value) -> Self {
        Self {
            thoughts: thoughts.into(),
            tool_name: Some(tool_name.into()),
            tool_input,
        }
    }

    /// A direct chat reply
    pub fn chat(thoughts: impl Into<String>, response: impl Into<String>) -> Self {
        Self::new(thoughts, CHAT_TOOL, json!({"response": response.into()}))
    }

    pub fn is_chat(&self) -> bool {
        self.tool_name.as_deref() == Some(CHAT_TOOL)
    }

    /// The `response` field of the tool input, if any
    pub fn response(&self) -> Option<&str> {
        self.tool_input.get("response").and_then(Value::as_str)
    }
}

#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Decide how to handle `input`.
    ///
    /// With `tools = None` the reasoner answers directly and returns a chat
    /// decision carrying the answer.
    async fn think(&self, input: &str, memory: &dyn Memory, tools: Option<&ToolRegistry>) -> Decision;
}
