//! Tool registry and discovery
//!
//! `ToolRegistry` owns every tool known to the agent, validates call inputs
//! against the example-derived schemas, and announces changes on the event bus.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use log::{debug, info, warn};
use serde_json::{Value, json};

use super::calculator::Calculator;
use super::catalog;
use super::chat::Chat;
use super::definition::{FieldType, Tool, required_fields};
use crate::config::Config;
use crate::error::{AgentryError, Result};
use crate::events::{EventBus, event_types};
use crate::prompt::PromptRenderer;

/// Name-keyed collection of tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    event_bus: Option<Arc<EventBus>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event_bus(event_bus: Arc<EventBus>) -> Self {
        Self {
            tools: HashMap::new(),
            event_bus: Some(event_bus),
        }
    }

    /// Register a tool, rejecting empty metadata, unsafe names and duplicates.
    ///
    /// Names are used as file names for prompt templates, so only ASCII
    /// letters, digits, `_` and `-` are accepted.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if name.is_empty() || tool.description().trim().is_empty() || tool.example_usage().trim().is_empty() {
            return Err(AgentryError::InvalidTool(format!(
                "tool '{}' needs a name, a description and an example",
                name
            )));
        }
        if !is_valid_tool_name(&name) {
            return Err(AgentryError::InvalidTool(format!(
                "tool name '{}' may only contain letters, digits, '_' and '-'",
                name
            )));
        }
        if self.tools.contains_key(&name) {
            return Err(AgentryError::DuplicateTool(name));
        }

        debug!("Registering tool '{}'", name);
        let payload = json!({
            "tool": name,
            "description": tool.description(),
            "schema": tool.example_schema(),
        });
        self.tools.insert(name, tool);
        self.emit(event_types::TOOL_REGISTERED, &payload);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// All tools, ordered by name
    pub fn all(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<_> = self.tools.values().cloned().collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    /// Tool names mapped to their descriptions
    pub fn list_tools(&self) -> BTreeMap<String, String> {
        self.tools
            .iter()
            .map(|(name, tool)| (name.clone(), tool.description().to_string()))
            .collect()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.list_tools().into_keys().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Remove a tool; returns whether it was registered
    pub fn unregister(&mut self, name: &str) -> bool {
        if self.tools.remove(name).is_none() {
            return false;
        }
        self.emit(event_types::TOOL_UNREGISTERED, &json!({"tool": name}));
        true
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Check required fields and declared property types
    pub fn validate_input(&self, name: &str, input: &Value) -> Result<()> {
        let tool = self.get(name).ok_or_else(|| AgentryError::ToolNotFound(name.to_string()))?;
        let schema = tool.example_schema();

        let Some(fields) = input.as_object() else {
            return Err(AgentryError::ValidationFailed(format!("{} is not of type 'object'", input)));
        };

        for field in required_fields(&schema) {
            if !fields.contains_key(&field) {
                return Err(AgentryError::ValidationFailed(format!(
                    "'{}' is a required property",
                    field
                )));
            }
        }

        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (field, property) in properties {
                let Some(value) = fields.get(field) else {
                    continue;
                };
                let expected = FieldType::of_property(property);
                if !expected.accepts(value) {
                    return Err(AgentryError::ValidationFailed(format!(
                        "{} is not of type '{}' (field '{}')",
                        value,
                        expected.as_str(),
                        field
                    )));
                }
            }
        }

        Ok(())
    }

    /// Validate then run a tool
    pub async fn execute(&self, name: &str, input: &Value) -> Result<String> {
        self.validate_input(name, input)?;
        let tool = self.get(name).ok_or_else(|| AgentryError::ToolNotFound(name.to_string()))?;
        tool.run(input).await
    }

    fn emit(&self, event: &str, payload: &Value) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event, payload);
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.tool_names()).finish()
    }
}

fn is_valid_tool_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Build the registry from built-in tools and the configured catalog.
///
/// Individual failures are logged and reported as `tool.error` events; they
/// never abort loading.
pub fn load_tools(config: &Config, event_bus: Arc<EventBus>, renderer: Arc<PromptRenderer>) -> ToolRegistry {
    let mut registry = ToolRegistry::with_event_bus(Arc::clone(&event_bus));
    let mut candidates: Vec<(String, Arc<dyn Tool>)> = Vec::new();

    if config.tools.builtin {
        candidates.push(("builtin".to_string(), Arc::new(Calculator)));
        candidates.push(("builtin".to_string(), Arc::new(Chat)));
    }

    if let Some(path) = &config.tools.catalog {
        let source = path.display().to_string();
        match catalog::from_file(path, renderer) {
            Ok(tools) => {
                for tool in tools {
                    candidates.push((source.clone(), Arc::new(tool)));
                }
            }
            Err(e) => {
                warn!("Failed to load tool catalog {}: {}", source, e);
                event_bus.emit(event_types::TOOL_ERROR, &json!({"source": source, "error": e.to_string()}));
            }
        }
    }

    for (source, tool) in candidates {
        let name = tool.name().to_string();
        match registry.register(tool) {
            Ok(()) => {
                event_bus.emit(event_types::TOOL_LOADED, &json!({"tool": name, "source": source}));
            }
            Err(e) => {
                warn!("Failed to register tool '{}' from {}: {}", name, source, e);
                event_bus.emit(
                    event_types::TOOL_ERROR,
                    &json!({"tool": name, "source": source, "error": e.to_string()}),
                );
            }
        }
    }

    info!("Loaded {} tools", registry.len());
    registry
}
