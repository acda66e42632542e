//! Tool System - tool definitions, built-in tools, catalog loading, and the registry

mod calculator;
pub mod catalog;
mod chat;
mod definition;
mod registry;

pub use calculator::{Calculator, evaluate};
pub use catalog::CatalogTool;
pub use chat::Chat;
pub use definition::{FieldType, Tool, required_fields, schema_from_example};
pub use registry::{ToolRegistry, load_tools};
