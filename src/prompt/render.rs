//! Prompt Renderer - Render templates with context variables using Handlebars
//!
//! Used for the reasoner's system and contextual prompts and for the
//! `response` templates of catalog tools.

use handlebars::{Handlebars, Template};
use serde_json::Value;

use crate::error::{AgentryError, Result};

/// Renders prompt templates using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PromptRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRenderer").finish_non_exhaustive()
    }
}

impl PromptRenderer {
    /// Create a new PromptRenderer with default settings
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Missing variables render as empty strings
        handlebars.set_strict_mode(false);
        // Prompts are plain text, not HTML
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render a template string with a JSON context
    pub fn render_json(&self, template: &str, context: &Value) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| AgentryError::Template(format!("Failed to render template: {}", e)))
    }

    /// Check that a template parses without rendering it
    pub fn check_template(&self, template: &str) -> Result<()> {
        Template::compile(template)
            .map(|_| ())
            .map_err(|e| AgentryError::Template(format!("Failed to parse template: {}", e)))
    }
}
