//! Tool Prompt Handler - per-tool prompt templates and field filling
//!
//! Templates live in `<prompts_dir>/<tool>_prompt.json` and are cached in
//! memory. When a tool call is missing required fields, the handler asks the
//! reasoner for each value using the field prompt from the tool's template.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AgentryError, Result};
use crate::memory::Memory;
use crate::reasoning::Reasoner;
use crate::tools::{FieldType, ToolRegistry, required_fields};

const TEMPLATE_SUFFIX: &str = "_prompt.json";
const MAX_PREVIOUS_USAGE: usize = 3;

/// Contents of a `<tool>_prompt.json` file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolPromptConfig {
    pub tool_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub field_prompts: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previous_usage: Vec<String>,
}

/// Loads, caches and writes tool prompt templates
pub struct ToolPromptHandler {
    prompts_dir: PathBuf,
    reasoner: Arc<dyn Reasoner>,
    memory: Arc<dyn Memory>,
    cache: RwLock<HashMap<String, ToolPromptConfig>>,
}

impl ToolPromptHandler {
    /// Create a handler and load every template in `prompts_dir`.
    ///
    /// The directory is created when missing. Unreadable template files are
    /// logged and skipped.
    pub fn new(prompts_dir: impl AsRef<Path>, reasoner: Arc<dyn Reasoner>, memory: Arc<dyn Memory>) -> Result<Self> {
        let prompts_dir = prompts_dir.as_ref().to_path_buf();
        let handler = Self {
            prompts_dir,
            reasoner,
            memory,
            cache: RwLock::new(HashMap::new()),
        };
        handler.load_templates()?;
        Ok(handler)
    }

    fn load_templates(&self) -> Result<()> {
        if !self.prompts_dir.exists() {
            std::fs::create_dir_all(&self.prompts_dir)?;
            return Ok(());
        }

        let mut loaded = HashMap::new();
        for entry in std::fs::read_dir(&self.prompts_dir)?.flatten() {
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(tool_name) = file_name.strip_suffix(TEMPLATE_SUFFIX) else {
                continue;
            };

            match read_template(&path) {
                Ok(config) => {
                    loaded.insert(tool_name.to_string(), config);
                }
                Err(e) => warn!("Failed to load prompt template {}: {}", path.display(), e),
            }
        }

        debug!("Loaded {} prompt templates from {}", loaded.len(), self.prompts_dir.display());
        *self.cache_write()? = loaded;
        Ok(())
    }

    pub fn prompts_dir(&self) -> &Path {
        &self.prompts_dir
    }

    /// Path of the template file for `tool_name`
    pub fn template_path(&self, tool_name: &str) -> PathBuf {
        self.prompts_dir.join(format!("{}{}", tool_name, TEMPLATE_SUFFIX))
    }

    /// Cached template for a tool
    pub fn get_tool_prompt(&self, tool_name: &str) -> Option<ToolPromptConfig> {
        let cache = self.cache.read().ok()?;
        cache.get(tool_name).cloned()
    }

    /// Ask the reasoner for every required field that is absent or empty.
    ///
    /// Fields the reasoner cannot answer are left as they were.
    pub async fn fill_missing_fields(
        &self,
        tool_name: &str,
        input: &Map<String, Value>,
        user_input: &str,
        registry: &ToolRegistry,
    ) -> Map<String, Value> {
        let Some(tool) = registry.get(tool_name) else {
            return input.clone();
        };

        let schema = tool.example_schema();
        let missing: Vec<String> = required_fields(&schema)
            .into_iter()
            .filter(|field| input.get(field).is_none_or(is_empty_value))
            .collect();
        if missing.is_empty() {
            return input.clone();
        }

        let custom = self.get_tool_prompt(tool_name).unwrap_or_default();
        let no_schema = Value::Object(Map::new());
        let mut filled = input.clone();

        for field in missing {
            let field_schema = schema
                .get("properties")
                .and_then(|p| p.get(&field))
                .unwrap_or(&no_schema);
            let field_type = FieldType::of_property(field_schema);
            let description = field_schema
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} field", field));
            let custom_prompt = custom.field_prompts.get(&field).map(String::as_str).unwrap_or("");

            let prompt = build_field_prompt(
                tool_name,
                &field,
                field_type,
                &description,
                user_input,
                &filled,
                custom_prompt,
            );

            let decision = self.reasoner.think(&prompt, self.memory.as_ref(), None).await;
            match decision.response().filter(|_| decision.is_chat()) {
                Some(answer) => {
                    debug!("Filled field '{}' for tool '{}'", field, tool_name);
                    filled.insert(field.clone(), parse_field_value(answer, field_type));
                }
                None => warn!("Could not fill field '{}' for tool '{}'", field, tool_name),
            }
        }

        filled
    }

    /// Write a template for `tool_name` and refresh the cache.
    ///
    /// Each schema property gets a placeholder field prompt; up to three
    /// `previous_usage` lines are recorded.
    pub fn create_tool_prompt_template(
        &self,
        tool_name: &str,
        registry: &ToolRegistry,
        previous_usage: &[String],
    ) -> Result<PathBuf> {
        let tool = registry
            .get(tool_name)
            .ok_or_else(|| AgentryError::ToolNotFound(tool_name.to_string()))?;

        let schema = tool.example_schema();
        let field_prompts = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|properties| {
                properties
                    .keys()
                    .map(|field| {
                        (
                            field.clone(),
                            format!(
                                "Smart prompt for {} field. Customize this based on your tool's needs.",
                                field
                            ),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();

        let config = ToolPromptConfig {
            tool_name: tool_name.to_string(),
            description: tool.description().to_string(),
            field_prompts,
            previous_usage: previous_usage.iter().take(MAX_PREVIOUS_USAGE).cloned().collect(),
        };

        std::fs::create_dir_all(&self.prompts_dir)?;
        let path = self.template_path(tool_name);
        std::fs::write(&path, serde_json::to_string_pretty(&config)?)?;
        info!("Created prompt template: {}", path.display());

        self.cache_write()?.insert(tool_name.to_string(), config);
        Ok(path)
    }

    fn cache_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, ToolPromptConfig>>> {
        self.cache
            .write()
            .map_err(|e| AgentryError::Template(format!("Failed to acquire write lock: {}", e)))
    }
}

fn read_template(path: &Path) -> Result<ToolPromptConfig> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Prompt asking for the value of one tool field
pub fn build_field_prompt(
    tool_name: &str,
    field_name: &str,
    field_type: FieldType,
    field_description: &str,
    user_input: &str,
    current_input: &Map<String, Value>,
    custom_prompt: &str,
) -> String {
    let current = serde_json::to_string_pretty(current_input).unwrap_or_else(|_| "{}".to_string());

    let type_hint = match field_type {
        FieldType::Boolean => "Respond with only: true or false",
        FieldType::Integer => "Respond with only a number (integer)",
        FieldType::Number => "Respond with only a number",
        FieldType::Array => "Respond with a JSON array format: [item1, item2, ...]",
        FieldType::Object => "Respond with a JSON object format: {\"key\": \"value\"}",
        FieldType::String => "Respond with only the text/string value",
    };

    format!(
        "You are helping to fill missing required fields for the '{tool}' tool.\n\n\
         User's original request: \"{user_input}\"\n\n\
         Missing field: {field}\n\
         Field type: {ty}\n\
         Field description: {desc}\n\n\
         Current tool input: {current}\n\n\
         {custom}\n\n\
         Based on the user's request, what should the value be for the '{field}' field?\n\
         Respond ONLY with the field value, no explanations or extra text.\n\
         {type_hint}",
        tool = tool_name,
        user_input = user_input,
        field = field_name,
        ty = field_type.as_str(),
        desc = field_description,
        current = current,
        custom = custom_prompt,
        type_hint = type_hint,
    )
}

/// Convert a model answer to the field's type, falling back to a string
pub fn parse_field_value(response: &str, field_type: FieldType) -> Value {
    let response = response.trim();
    let parsed = match field_type {
        FieldType::Boolean => Some(Value::Bool(matches!(
            response.to_lowercase().as_str(),
            "true" | "yes" | "1" | "on"
        ))),
        FieldType::Integer => response.parse::<i64>().ok().map(Value::from),
        FieldType::Number => response
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        FieldType::Array => serde_json::from_str::<Value>(response).ok().filter(Value::is_array),
        FieldType::Object => serde_json::from_str::<Value>(response).ok().filter(Value::is_object),
        FieldType::String => None,
    };
    parsed.unwrap_or_else(|| Value::String(response.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::BufferMemory;
    use crate::reasoning::Decision;
    use crate::tools::{Calculator, Tool};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers every prompt with a fixed reply and records the prompts
    struct FixedReasoner {
        answer: String,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedReasoner {
        fn new(answer: &str) -> Arc<Self> {
            Arc::new(Self {
                answer: answer.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Reasoner for FixedReasoner {
        async fn think(&self, input: &str, _memory: &dyn Memory, tools: Option<&ToolRegistry>) -> Decision {
            assert!(tools.is_none());
            self.prompts.lock().unwrap().push(input.to_string());
            Decision::chat("fixed", self.answer.clone())
        }
    }

    struct Booking;

    #[async_trait]
    impl Tool for Booking {
        fn name(&self) -> &str {
            "booking"
        }

        fn description(&self) -> &str {
            "Books a table"
        }

        fn example_usage(&self) -> &str {
            r#"{"guests": 2, "outdoor": true, "name": "Ada"}"#
        }

        async fn run(&self, _input: &Value) -> Result<String> {
            Ok("booked".to_string())
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Calculator)).unwrap();
        registry.register(Arc::new(Booking)).unwrap();
        registry
    }

    fn handler(dir: &Path, reasoner: Arc<dyn Reasoner>) -> ToolPromptHandler {
        ToolPromptHandler::new(dir, reasoner, Arc::new(BufferMemory::ephemeral(10))).unwrap()
    }

    #[test]
    fn test_creates_missing_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("prompts");
        let handler = handler(&dir, FixedReasoner::new("x"));
        assert!(dir.is_dir());
        assert_eq!(handler.prompts_dir(), dir);
        assert!(handler.get_tool_prompt("calculator").is_none());
    }

    #[test]
    fn test_loads_templates_and_skips_bad_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("calculator_prompt.json"),
            r#"{"tool_name": "calculator", "description": "math", "field_prompts": {"expression": "Only math."}}"#,
        )
        .unwrap();
        std::fs::write(temp.path().join("broken_prompt.json"), "{not json").unwrap();
        std::fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let handler = handler(temp.path(), FixedReasoner::new("x"));
        let config = handler.get_tool_prompt("calculator").unwrap();
        assert_eq!(config.field_prompts["expression"], "Only math.");
        assert!(handler.get_tool_prompt("broken").is_none());
        assert!(handler.get_tool_prompt("notes.txt").is_none());
    }

    #[test]
    fn test_create_template_file() {
        let temp = TempDir::new().unwrap();
        let handler = handler(temp.path(), FixedReasoner::new("x"));
        let usage = vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()];

        let path = handler.create_tool_prompt_template("booking", &registry(), &usage).unwrap();
        assert_eq!(path, temp.path().join("booking_prompt.json"));

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["tool_name"], "booking");
        assert_eq!(written["description"], "Books a table");
        assert_eq!(
            written["field_prompts"]["guests"],
            "Smart prompt for guests field. Customize this based on your tool's needs."
        );
        assert_eq!(written["field_prompts"].as_object().unwrap().len(), 3);
        assert_eq!(written["previous_usage"], json!(["a", "b", "c"]));

        let cached = handler.get_tool_prompt("booking").unwrap();
        assert_eq!(cached.previous_usage.len(), 3);
    }

    #[test]
    fn test_create_template_omits_empty_usage() {
        let temp = TempDir::new().unwrap();
        let handler = handler(temp.path(), FixedReasoner::new("x"));

        let path = handler.create_tool_prompt_template("calculator", &registry(), &[]).unwrap();
        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written.get("previous_usage").is_none());
        assert!(written["field_prompts"].get("expression").is_some());
    }

    #[test]
    fn test_create_template_unknown_tool() {
        let temp = TempDir::new().unwrap();
        let handler = handler(temp.path(), FixedReasoner::new("x"));

        let err = handler.create_tool_prompt_template("nope", &registry(), &[]).unwrap_err();
        assert!(matches!(err, AgentryError::ToolNotFound(name) if name == "nope"));
        assert!(!handler.template_path("nope").exists());
    }

    #[tokio::test]
    async fn test_fill_missing_fields() {
        let temp = TempDir::new().unwrap();
        let reasoner = FixedReasoner::new(" 4 ");
        let handler = handler(temp.path(), reasoner.clone());

        let mut input = Map::new();
        input.insert("outdoor".to_string(), json!(false));
        input.insert("name".to_string(), json!("Ada"));

        let filled = handler.fill_missing_fields("booking", &input, "table for four", &registry()).await;
        assert_eq!(filled["guests"], json!(4));
        assert_eq!(filled["outdoor"], json!(false));

        let prompts = reasoner.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Missing field: guests"));
        assert!(prompts[0].contains("Field type: integer"));
        assert!(prompts[0].ends_with("Respond with only a number (integer)"));
    }

    #[tokio::test]
    async fn test_fill_uses_custom_field_prompt() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("calculator_prompt.json"),
            r#"{"tool_name": "calculator", "field_prompts": {"expression": "Write the arithmetic only."}}"#,
        )
        .unwrap();
        let reasoner = FixedReasoner::new("2 + 2");
        let handler = handler(temp.path(), reasoner.clone());

        let mut input = Map::new();
        input.insert("expression".to_string(), json!(""));

        let filled = handler.fill_missing_fields("calculator", &input, "add two and two", &registry()).await;
        assert_eq!(filled["expression"], "2 + 2");
        assert!(reasoner.prompts.lock().unwrap()[0].contains("Write the arithmetic only."));
    }

    #[tokio::test]
    async fn test_fill_nothing_missing_or_unknown_tool() {
        let temp = TempDir::new().unwrap();
        let reasoner = FixedReasoner::new("x");
        let handler = handler(temp.path(), reasoner.clone());

        let mut input = Map::new();
        input.insert("expression".to_string(), json!("1 + 1"));
        assert_eq!(handler.fill_missing_fields("calculator", &input, "", &registry()).await, input);
        assert_eq!(handler.fill_missing_fields("ghost", &input, "", &registry()).await, input);
        assert!(reasoner.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_parse_field_value() {
        assert_eq!(parse_field_value("Yes", FieldType::Boolean), json!(true));
        assert_eq!(parse_field_value("nope", FieldType::Boolean), json!(false));
        assert_eq!(parse_field_value("42", FieldType::Integer), json!(42));
        assert_eq!(parse_field_value("4.5", FieldType::Number), json!(4.5));
        assert_eq!(parse_field_value("[1, 2]", FieldType::Array), json!([1, 2]));
        assert_eq!(parse_field_value(r#"{"a": 1}"#, FieldType::Object), json!({"a": 1}));
        assert_eq!(parse_field_value(" hello ", FieldType::String), json!("hello"));
    }

    #[test]
    fn test_parse_field_value_falls_back_to_string() {
        assert_eq!(parse_field_value("four", FieldType::Integer), json!("four"));
        assert_eq!(parse_field_value("{oops", FieldType::Object), json!("{oops"));
        assert_eq!(parse_field_value("[1]", FieldType::Object), json!("[1]"));
    }

    #[test]
    fn test_build_field_prompt_type_hints() {
        let prompt = build_field_prompt("search", "tags", FieldType::Array, "tags field", "find rust", &Map::new(), "");
        assert!(prompt.starts_with("You are helping to fill missing required fields for the 'search' tool."));
        assert!(prompt.contains("User's original request: \"find rust\""));
        assert!(prompt.ends_with("Respond with a JSON array format: [item1, item2, ...]"));
    }
}
