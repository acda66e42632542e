use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default model used when nothing else selects one.
pub const DEFAULT_MODEL: &str = "llama3";

/// Default Ollama-compatible generate endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/api/generate";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub agent_name: String,
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
    pub prompts: PromptsConfig,
    pub tools: ToolsConfig,
    pub interface: InterfaceConfig,
    pub debug: DebugConfig,
}

/// Which reasoner drives the agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasonerBackend {
    /// LLM reasoner over the Ollama-compatible endpoint
    #[default]
    Ollama,
    /// Rule-based reasoner; needs no model server
    Rule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub backend: ReasonerBackend,
    pub model: String,
    pub base_url: String,
    pub retries: u32,
    pub timeout_ms: u64,
    pub model_file: PathBuf,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: ReasonerBackend::default(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            retries: 3,
            timeout_ms: 120_000,
            model_file: PathBuf::from("model_config.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub limit: usize,
    pub persist_file: PathBuf,
    pub export_file: PathBuf,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            limit: 1000,
            persist_file: PathBuf::from("memory/agent_conversations.json"),
            export_file: PathBuf::from("memory/memory_export.txt"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub dir: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("prompts"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Optional TOML catalog of declarative tools
    pub catalog: Option<PathBuf>,
    /// Register the bundled calculator and chat tools
    pub builtin: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            builtin: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceConfig {
    pub allow_empty: bool,
    pub exit_commands: Vec<String>,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            allow_empty: false,
            exit_commands: vec!["exit".to_string(), "quit".to_string(), "q".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Log memory events (saves and learned context)
    pub memory_events: bool,
    /// Emit prompts and raw responses on the event bus
    pub trace_reasoning: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            agent_name: "Agentry".to_string(),
            llm: LlmConfig::default(),
            memory: MemoryConfig::default(),
            prompts: PromptsConfig::default(),
            tools: ToolsConfig::default(),
            interface: InterfaceConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
