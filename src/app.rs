//! Runtime assembly: build every collaborator from the configuration

use std::sync::Arc;

use colored::*;
use serde_json::Value;

use crate::config::{Config, ReasonerBackend};
use crate::error::Result;
use crate::events::{EventBus, event_types};
use crate::interface::Interface;
use crate::kernel::AgentKernel;
use crate::llm::OllamaClient;
use crate::memory::BufferMemory;
use crate::model_selector::ModelSelector;
use crate::prompt::PromptRenderer;
use crate::reasoning::{LlmReasoner, Reasoner, SimpleReasoner};
use crate::tools::{ToolRegistry, load_tools};

/// Resolve the active model and write it into `config.llm.model`.
///
/// An explicit `requested` model is also recorded in the model file.
pub fn resolve_model(config: &mut Config, requested: Option<&str>) -> Result<String> {
    let selector = ModelSelector::new(&config.llm.model_file, config.llm.model.clone());
    let model = match requested {
        Some(model) => {
            selector.set_selected_model(model)?;
            model.to_string()
        }
        None => selector.selected_model(),
    };
    config.llm.model = model.clone();
    Ok(model)
}

/// Fully wired agent runtime
pub struct App {
    pub config: Config,
    pub event_bus: Arc<EventBus>,
    pub memory: Arc<BufferMemory>,
    pub tools: Arc<ToolRegistry>,
    pub kernel: AgentKernel,
}

impl App {
    /// Build the runtime. `config.llm.model` must already be resolved.
    pub fn build(config: Config, interface: Arc<dyn Interface>) -> Result<Self> {
        let event_bus = Arc::new(EventBus::new());
        if config.debug.memory_events {
            subscribe_memory_debug(&event_bus);
        }

        let memory = Arc::new(
            BufferMemory::open(config.memory.limit, &config.memory.persist_file).with_event_bus(Arc::clone(&event_bus)),
        );

        let renderer = Arc::new(PromptRenderer::new());
        let tools = Arc::new(load_tools(&config, Arc::clone(&event_bus), Arc::clone(&renderer)));

        let reasoner: Arc<dyn Reasoner> = match config.llm.backend {
            ReasonerBackend::Ollama => {
                let client = OllamaClient::new(&config.llm)?;
                Arc::new(
                    LlmReasoner::new(Arc::new(client), renderer, config.agent_name.clone())
                        .with_retries(config.llm.retries)
                        .with_event_bus(Arc::clone(&event_bus))
                        .with_trace(config.debug.trace_reasoning),
                )
            }
            ReasonerBackend::Rule => Arc::new(SimpleReasoner),
        };

        let kernel = AgentKernel::new(
            interface,
            reasoner,
            memory.clone(),
            Arc::clone(&tools),
            Arc::clone(&event_bus),
            &config.prompts.dir,
        )?;

        log::info!(
            "Runtime ready: backend={:?} model={} tools={} prompts={}",
            config.llm.backend,
            config.llm.model,
            tools.len(),
            config.prompts.dir.display()
        );

        Ok(Self {
            config,
            event_bus,
            memory,
            tools,
            kernel,
        })
    }
}

fn subscribe_memory_debug(event_bus: &EventBus) {
    event_bus.subscribe(event_types::MEMORY_SAVED, |data| {
        let role = data.get("role").and_then(Value::as_str).unwrap_or("unknown");
        let chars = data.get("content_length").and_then(Value::as_u64).unwrap_or(0);
        println!("{} {} - {} chars", "Memory saved:".cyan(), role, chars);
    });
    event_bus.subscribe(event_types::MEMORY_CONTEXT_LEARNED, |data| {
        println!("{} {}", "Context learned:".cyan(), data);
    });
}
