//! LLM-backed reasoner
//!
//! Renders the decision prompt, asks the model, and turns the reply into a
//! `Decision`. Every failure path ends in a chat decision so the agent
//! always has something to say.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Value, json};

use super::templates::{CONTEXTUAL_PROMPT, FALLBACK_PROMPT, SYSTEM_PROMPT};
use super::{Decision, Reasoner};
use crate::error::{AgentryError, Result};
use crate::events::{EventBus, event_types};
use crate::llm::{LlmClient, generate_with_retries};
use crate::memory::Memory;
use crate::prompt::PromptRenderer;
use crate::tools::ToolRegistry;

const MEMORY_ITEMS: usize = 5;
const MEMORY_ITEM_CHARS: usize = 200;

#[derive(Serialize)]
struct ToolView {
    name: String,
    description: String,
    example: String,
}

pub struct LlmReasoner {
    client: Arc<dyn LlmClient>,
    renderer: Arc<PromptRenderer>,
    agent_name: String,
    retries: u32,
    event_bus: Option<Arc<EventBus>>,
    trace: bool,
}

impl LlmReasoner {
    pub fn new(client: Arc<dyn LlmClient>, renderer: Arc<PromptRenderer>, agent_name: impl Into<String>) -> Self {
        Self {
            client,
            renderer,
            agent_name: agent_name.into(),
            retries: 3,
            event_bus: None,
            trace: false,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Emit the rendered prompt on `llm.prompt`
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Render the full decision prompt
    pub fn build_prompt(&self, input: &str, memory: &dyn Memory, tools: &ToolRegistry) -> Result<String> {
        let available = tools.all();
        let tool_list = available.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ");
        let views: Vec<ToolView> = available
            .iter()
            .map(|t| ToolView {
                name: t.name().to_string(),
                description: t.description().to_string(),
                example: t.example_usage().to_string(),
            })
            .collect();

        let system_prompt = self.renderer.render_json(
            SYSTEM_PROMPT,
            &json!({"agent_name": self.agent_name, "tool_list": tool_list}),
        )?;

        self.renderer.render_json(
            CONTEXTUAL_PROMPT,
            &json!({
                "memory_context": format_memory_context(memory),
                "input": input,
                "tools": views,
                "system_prompt": system_prompt,
            }),
        )
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        generate_with_retries(self.client.as_ref(), prompt, self.retries)
            .await
            .map_err(AgentryError::from)
    }

    async fn decide(&self, input: &str, memory: &dyn Memory, tools: &ToolRegistry) -> Result<Decision> {
        let prompt = self.build_prompt(input, memory, tools)?;
        if self.trace {
            self.emit(event_types::LLM_PROMPT, json!({"prompt": prompt}));
        }

        let response = self.complete(&prompt).await?;
        self.emit(event_types::LLM_RESPONSE, json!({"input": input, "raw_response": response}));

        match parse_decision(&response) {
            Ok(decision) => {
                let known = decision.tool_name.as_deref().is_some_and(|name| tools.contains(name));
                if known {
                    Ok(decision)
                } else {
                    debug!("Model picked unknown tool {:?}", decision.tool_name);
                    Ok(fallback_decision(input))
                }
            }
            Err(e) => Ok(self.recover_malformed(input, &response, &e).await),
        }
    }

    /// One direct-answer retry after a malformed decision
    async fn recover_malformed(&self, input: &str, response: &str, error: &str) -> Decision {
        warn!("Malformed decision from model: {}", error);

        let prompt = self
            .renderer
            .render_json(FALLBACK_PROMPT, &json!({"input": input, "response": response.trim()}));
        let answer = match prompt {
            Ok(prompt) => self.complete(&prompt).await,
            Err(e) => Err(e),
        };

        match answer {
            Ok(answer) => {
                self.emit(
                    event_types::LLM_RESPONSE,
                    json!({"input": input, "raw_response": answer, "note": "fallback after malformed decision"}),
                );
                Decision::chat(
                    format!("Invalid LLM output, attempted rephrasing. Original error: {}", error),
                    answer.trim(),
                )
            }
            Err(inner) => Decision::chat(
                format!("Double LLM failure. Initial error: {}. Fallback error: {}", error, inner),
                format!("Raw LLM output from initial attempt: {}", response.trim()),
            ),
        }
    }

    fn emit(&self, event: &str, payload: Value) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event, &payload);
        }
    }
}

#[async_trait]
impl Reasoner for LlmReasoner {
    async fn think(&self, input: &str, memory: &dyn Memory, tools: Option<&ToolRegistry>) -> Decision {
        let Some(tools) = tools else {
            return match self.complete(input).await {
                Ok(answer) => Decision::chat("Direct completion without tools.", answer),
                Err(e) => {
                    warn!("Direct completion failed: {}", e);
                    let mut decision = fallback_decision(input);
                    decision.thoughts = format!("LLM completion failed: {}. Falling back to chat.", e);
                    decision
                }
            };
        };

        match self.decide(input, memory, tools).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!("LLM reasoning failed: {}", e);
                let mut decision = fallback_decision(input);
                decision.thoughts = format!("LLM Reasoning failed: {}. Falling back to chat.", e);
                decision
            }
        }
    }
}

fn fallback_decision(input: &str) -> Decision {
    Decision::chat(
        "LLM reasoning failed, falling back to chat response.",
        format!(
            "I'm having trouble processing that request. Could you rephrase it? You asked: {}",
            input
        ),
    )
}

/// Last few messages, each cut to a bounded length
fn format_memory_context(memory: &dyn Memory) -> String {
    let recent = memory.recent(MEMORY_ITEMS);
    if recent.is_empty() {
        return "No previous conversation history.".to_string();
    }

    recent
        .iter()
        .map(|entry| {
            let content: String = entry.content.chars().take(MEMORY_ITEM_CHARS).collect();
            format!("{}: {}", entry.role, content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Find a JSON object in a model reply.
///
/// Accepts a bare object, one inside a code fence, or one embedded in prose.
pub fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        let body = after.strip_prefix("json").unwrap_or(after);
        if let Some(end) = body.find("```")
            && let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(body[..end].trim())
        {
            return Some(value);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Parse and shape-check a decision. Errors are human-readable descriptions.
pub fn parse_decision(text: &str) -> std::result::Result<Decision, String> {
    let value = extract_json(text).ok_or_else(|| "no JSON object found in response".to_string())?;

    for key in ["thoughts", "tool_name", "tool_input"] {
        if value.get(key).is_none() {
            return Err(format!("'{}' is a required property", key));
        }
    }
    if !value["thoughts"].is_string() {
        return Err("'thoughts' must be a string".to_string());
    }
    if !(value["tool_name"].is_string() || value["tool_name"].is_null()) {
        return Err("'tool_name' must be a string or null".to_string());
    }
    if !value["tool_input"].is_object() {
        return Err("'tool_input' must be an object".to_string());
    }

    serde_json::from_value(value).map_err(|e| e.to_string())
}
