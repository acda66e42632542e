//! Declarative tool catalog loading from TOML
//!
//! Catalog tools need no code: each entry carries its metadata, an example
//! input, optional typed params, and a handlebars `response` template that is
//! rendered with the call input.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::definition::{Tool, schema_from_example};
use crate::error::{AgentryError, Result};
use crate::prompt::PromptRenderer;

/// TOML representation of a tool parameter
#[derive(Debug, Deserialize)]
struct TomlParam {
    #[serde(rename = "type")]
    param_type: String,
    description: Option<String>,
}

/// TOML representation of a tool definition
#[derive(Debug, Deserialize)]
struct TomlTool {
    name: String,
    description: String,
    #[serde(default)]
    example: Option<toml::Value>,
    #[serde(default)]
    params: BTreeMap<String, TomlParam>,
    #[serde(default)]
    required: Vec<String>,
    response: String,
}

/// TOML file structure
#[derive(Debug, Deserialize)]
struct TomlCatalog {
    #[serde(rename = "tool", default)]
    tools: Vec<TomlTool>,
}

/// A tool declared in a catalog file
pub struct CatalogTool {
    name: String,
    description: String,
    example: String,
    schema: Value,
    response: String,
    renderer: Arc<PromptRenderer>,
}

impl std::fmt::Debug for CatalogTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("example", &self.example)
            .finish()
    }
}

#[async_trait]
impl Tool for CatalogTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn example_usage(&self) -> &str {
        &self.example
    }

    fn example_schema(&self) -> Value {
        self.schema.clone()
    }

    async fn run(&self, input: &Value) -> Result<String> {
        self.renderer
            .render_json(&self.response, input)
            .map_err(|e| AgentryError::ToolExecution(format!("{}: {}", self.name, e)))
    }
}

/// Parse catalog TOML into tools
pub fn from_toml(content: &str, renderer: Arc<PromptRenderer>) -> Result<Vec<CatalogTool>> {
    let catalog: TomlCatalog =
        toml::from_str(content).map_err(|e| AgentryError::Config(format!("Failed to parse tool catalog: {}", e)))?;

    catalog
        .tools
        .into_iter()
        .map(|tool| convert_toml_tool(tool, Arc::clone(&renderer)))
        .collect()
}

/// Load catalog tools from a TOML file
pub fn from_file(path: impl AsRef<Path>, renderer: Arc<PromptRenderer>) -> Result<Vec<CatalogTool>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        AgentryError::Config(format!("Failed to read tool catalog {}: {}", path.display(), e))
    })?;
    from_toml(&content, renderer)
}

/// Convert TOML tool to a CatalogTool
fn convert_toml_tool(toml_tool: TomlTool, renderer: Arc<PromptRenderer>) -> Result<CatalogTool> {
    let example = match &toml_tool.example {
        Some(example) => serde_json::to_string(example)?,
        None => String::new(),
    };

    // Explicit params win over the example-derived schema
    let schema = if toml_tool.params.is_empty() {
        schema_from_example(&example)
    } else {
        let mut properties = serde_json::Map::new();
        for (name, param) in toml_tool.params {
            let mut prop = serde_json::Map::new();
            prop.insert("type".to_string(), Value::String(param.param_type));
            if let Some(desc) = param.description {
                prop.insert("description".to_string(), Value::String(desc));
            }
            properties.insert(name, Value::Object(prop));
        }
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": toml_tool.required
        })
    };

    // Fail at load time rather than at the first call
    renderer.check_template(&toml_tool.response).map_err(|e| {
        AgentryError::Template(format!("Invalid response template for tool '{}': {}", toml_tool.name, e))
    })?;

    Ok(CatalogTool {
        name: toml_tool.name,
        description: toml_tool.description,
        example,
        schema,
        response: toml_tool.response,
        renderer,
    })
}
