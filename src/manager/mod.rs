//! Prompt-template manager
//!
//! Drives template creation across every registered tool. Each tool gets one
//! attempt; a failure is reported and the batch moves on.

mod templates;

pub use templates::{TemplateOutcome, TemplateSource, create_all_templates, create_template};
