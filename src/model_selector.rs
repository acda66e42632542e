//! Persisted selection of the active language model.
//!
//! The selection lives in a small JSON file (`{"selected_model": "..."}`).
//! Unrelated keys in that file are preserved when the selection changes.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::Result;

const SELECTED_MODEL_KEY: &str = "selected_model";

#[derive(Debug, Clone)]
pub struct ModelSelector {
    config_file: PathBuf,
    default_model: String,
}

impl ModelSelector {
    pub fn new(config_file: impl AsRef<Path>, default_model: impl Into<String>) -> Self {
        Self {
            config_file: config_file.as_ref().to_path_buf(),
            default_model: default_model.into(),
        }
    }

    /// The currently selected model, or the default when none is recorded
    pub fn selected_model(&self) -> String {
        self.read_config()
            .get(SELECTED_MODEL_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.default_model.clone())
    }

    /// Record `model` as the selected model
    pub fn set_selected_model(&self, model: &str) -> Result<()> {
        let mut config = self.read_config();
        config.insert(SELECTED_MODEL_KEY.to_string(), Value::String(model.to_string()));

        if let Some(parent) = self.config_file.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_file, serde_json::to_string_pretty(&Value::Object(config))?)?;
        log::info!("Selected model '{}' ({})", model, self.config_file.display());
        Ok(())
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    fn read_config(&self) -> Map<String, Value> {
        let content = match fs::read_to_string(&self.config_file) {
            Ok(content) => content,
            Err(_) => return Map::new(),
        };
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                log::warn!("Ignoring malformed model config {}", self.config_file.display());
                Map::new()
            }
        }
    }
}
