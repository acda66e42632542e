//! Agent Kernel - the turn loop tying interface, reasoner, memory and tools together

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::{Value, json};

use crate::error::{AgentryError, Result};
use crate::events::{EventBus, event_types};
use crate::interface::Interface;
use crate::memory::Memory;
use crate::memory::enhancer::{extract_learnable_info, inject_memory_context};
use crate::prompt::ToolPromptHandler;
use crate::reasoning::{CHAT_TOOL, Decision, Reasoner};
use crate::tools::{Tool, ToolRegistry};

/// Conversation entries injected ahead of each request
const CONTEXT_LIMIT: usize = 8;
const MAX_PREVIOUS_USAGE: usize = 3;

pub struct AgentKernel {
    interface: Arc<dyn Interface>,
    reasoner: Arc<dyn Reasoner>,
    memory: Arc<dyn Memory>,
    tools: Arc<ToolRegistry>,
    event_bus: Arc<EventBus>,
    prompt_handler: ToolPromptHandler,
}

impl AgentKernel {
    pub fn new(
        interface: Arc<dyn Interface>,
        reasoner: Arc<dyn Reasoner>,
        memory: Arc<dyn Memory>,
        tools: Arc<ToolRegistry>,
        event_bus: Arc<EventBus>,
        prompts_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        let prompt_handler = ToolPromptHandler::new(prompts_dir, Arc::clone(&reasoner), Arc::clone(&memory))?;
        Ok(Self {
            interface,
            reasoner,
            memory,
            tools,
            event_bus,
            prompt_handler,
        })
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn memory(&self) -> &dyn Memory {
        self.memory.as_ref()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn prompt_handler(&self) -> &ToolPromptHandler {
        &self.prompt_handler
    }

    /// Read and answer user messages until the interface ends the session.
    ///
    /// A failing turn is reported to the user and recorded; the loop carries on.
    pub async fn run(&self) -> Result<()> {
        info!("Agent session started");
        while let Some(user_input) = self.interface.input().await? {
            if let Err(e) = self.handle_turn(&user_input).await {
                warn!("Turn failed: {}", e);
                let message = format!("[ERROR] Agent turn failed: {}", e);
                self.memory
                    .save("system", &message, json!({"type": "system_error", "error": e.to_string()}));
                self.event_bus.emit(event_types::AGENT_ERROR, &json!({"error": message}));
                self.interface.output(&message).await?;
            }
        }
        info!("Agent session ended");
        Ok(())
    }

    /// Handle one user message and return what was shown to the user
    pub async fn handle_turn(&self, user_input: &str) -> Result<String> {
        self.event_bus.emit(event_types::AGENT_INPUT, &json!({"input": user_input}));
        self.memory.save(
            "user",
            user_input,
            json!({"input_length": user_input.chars().count(), "tool_context": "conversation_start"}),
        );

        let prompt = inject_memory_context(user_input, self.memory.as_ref(), CONTEXT_LIMIT);
        let decision = self.reasoner.think(&prompt, self.memory.as_ref(), Some(&self.tools)).await;
        debug!("Decision: {:?}", decision);
        self.event_bus.emit(event_types::AGENT_THOUGHT, &serde_json::to_value(&decision)?);

        if decision.is_chat()
            && let Some(response) = decision.response()
        {
            let output = response.to_string();
            self.interface.output(&output).await?;
            self.save_with_learning(user_input, &output);
            self.emit_tool_used(CHAT_TOOL, &decision.tool_input, &output);
            return Ok(output);
        }

        let tool_name = decision.tool_name.clone().unwrap_or_default();
        match self.tools.get(&tool_name) {
            Some(tool) => self.run_tool(tool, &tool_name, &decision, user_input).await,
            None => self.handle_missing_tool(&tool_name, &decision, user_input).await,
        }
    }

    async fn handle_missing_tool(&self, tool_name: &str, decision: &Decision, user_input: &str) -> Result<String> {
        let Some(fallback) = decision.response() else {
            let output = format!("[ERROR] Tool '{}' not found or undefined.", tool_name);
            self.interface.output(&output).await?;
            self.memory
                .save("agent", &output, json!({"type": "error", "error_type": "tool_not_found"}));
            return Ok(output);
        };

        let output = format!(
            "[Fallback Chat] Tool '{}' not found. Chatting instead:\n{}",
            tool_name, fallback
        );
        self.interface.output(&output).await?;
        self.memory.save(
            "agent",
            &output,
            json!({"type": "fallback", "requested_tool": tool_name, "reason": "tool_not_found"}),
        );
        self.memory.save_context(
            &format!("failed_tool_{}", tool_name),
            json!({"user_request": user_input, "fallback_used": true}),
            "tool_usage",
        );
        self.emit_tool_used("chat_fallback", &decision.tool_input, &output);
        Ok(output)
    }

    async fn run_tool(
        &self,
        tool: Arc<dyn Tool>,
        tool_name: &str,
        decision: &Decision,
        user_input: &str,
    ) -> Result<String> {
        let original = decision.tool_input.as_object().cloned().unwrap_or_default();
        let filled = self
            .prompt_handler
            .fill_missing_fields(tool_name, &original, user_input, &self.tools)
            .await;
        if filled != original {
            self.event_bus.emit(
                event_types::AGENT_FIELDS_FILLED,
                &json!({"tool": tool_name, "original_input": original, "filled_input": filled}),
            );
        }

        let tool_input = Value::Object(filled);
        if let Err(e) = self.tools.validate_input(tool_name, &tool_input) {
            let reason = match e {
                AgentryError::ValidationFailed(reason) => reason,
                other => other.to_string(),
            };
            let output = format!("[ERROR] Invalid tool input: {}", reason);
            self.interface.output(&output).await?;
            self.memory.save(
                "agent",
                &output,
                json!({"type": "error", "error_type": "validation_failed", "tool": tool_name}),
            );
            return Ok(output);
        }

        let output = tool.run(&tool_input).await?;
        self.emit_tool_used(tool_name, &tool_input, &output);

        self.memory.save(
            "agent",
            &output,
            json!({"type": "tool_result", "tool_name": tool_name, "tool_input": tool_input, "success": true}),
        );
        self.memory.save_context(
            &format!("successful_tool_{}", tool_name),
            json!({
                "user_request": user_input,
                "tool_input": tool_input,
                "output_length": output.chars().count()
            }),
            "tool_usage",
        );

        self.interface.output(&output).await?;
        self.event_bus.emit(event_types::AGENT_OUTPUT, &json!({"output": output}));
        Ok(output)
    }

    fn save_with_learning(&self, user_input: &str, output: &str) {
        self.memory.save(
            "agent",
            output,
            json!({"type": "chat_response", "response_length": output.chars().count()}),
        );
        for (kind, value) in extract_learnable_info(user_input) {
            self.memory
                .save_context(&format!("learned_{}", kind.as_str()), Value::String(value), "learned_facts");
        }
    }

    fn emit_tool_used(&self, tool: &str, input: &Value, output: &str) {
        self.event_bus.emit(
            event_types::AGENT_TOOL_USED,
            &json!({"tool": tool, "input": input, "output": output}),
        );
    }

    /// Counts of stored conversation and context
    pub fn memory_summary(&self) -> String {
        let snapshot = self.memory.snapshot();
        format!(
            "Memory Summary:\n- Conversation entries: {}\n- Context categories: {}\n- Session ID: {}",
            snapshot.total_entries, snapshot.context_categories, snapshot.session_id
        )
    }

    /// Write the prompt template for `tool_name`, noting up to three related memories
    pub async fn create_prompt_template(&self, tool_name: &str) -> Result<PathBuf> {
        let previous_usage: Vec<String> = self
            .memory
            .search(tool_name)
            .iter()
            .take(MAX_PREVIOUS_USAGE)
            .map(|hit| format!("Previous {} usage: {}", tool_name, hit))
            .collect();

        self.prompt_handler
            .create_tool_prompt_template(tool_name, &self.tools, &previous_usage)
    }
}
