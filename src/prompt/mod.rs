//! Prompt System - template rendering and per-tool prompt templates
//!
//! `PromptRenderer` wraps Handlebars. `ToolPromptHandler` caches the
//! `<tool>_prompt.json` files, writes new ones, and fills missing tool
//! fields by asking the reasoner.

mod handler;
mod render;

pub use handler::{ToolPromptConfig, ToolPromptHandler, build_field_prompt, parse_field_value};
pub use render::PromptRenderer;
