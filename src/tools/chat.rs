use async_trait::async_trait;
use serde_json::Value;

use super::definition::Tool;
use crate::error::Result;

/// Replies conversationally by returning the `response` field
pub struct Chat;

#[async_trait]
impl Tool for Chat {
    fn name(&self) -> &str {
        "chat"
    }

    fn description(&self) -> &str {
        "Replies conversationally to the user."
    }

    fn example_usage(&self) -> &str {
        r#"Example: {"response": "Hello! How can I help you?"}"#
    }

    async fn run(&self, input: &Value) -> Result<String> {
        Ok(input
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or("I'm here.")
            .to_string())
    }
}
