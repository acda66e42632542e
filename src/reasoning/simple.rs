use async_trait::async_trait;
use serde_json::json;

use super::{Decision, Reasoner};
use crate::memory::Memory;
use crate::memory::enhancer::current_request;
use crate::tools::ToolRegistry;

const MATH_KEYWORDS: &[&str] = &["+", "-", "*", "/", "plus", "minus", "times", "divided"];

/// Rule-based reasoner: math-looking input goes to the calculator, everything else is echoed
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleReasoner;

#[async_trait]
impl Reasoner for SimpleReasoner {
    async fn think(&self, input: &str, _memory: &dyn Memory, tools: Option<&ToolRegistry>) -> Decision {
        let request = current_request(input);
        let lower = request.to_lowercase();
        let is_math = MATH_KEYWORDS.iter().any(|kw| lower.contains(kw));

        if is_math && tools.is_some_and(|t| t.contains("calculator")) {
            return Decision::new(
                "This looks like a math problem. Using calculator.",
                "calculator",
                json!({"expression": request}),
            );
        }

        Decision::chat(
            "This doesn't look like a math problem. Falling back to chat.",
            format!("Echo: {}", request),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::BufferMemory;
    use crate::memory::enhancer::inject_memory_context;
    use crate::tools::Calculator;
    use serde_json::Value;
    use std::sync::Arc;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Calculator)).unwrap();
        registry
    }

    #[tokio::test]
    async fn test_math_goes_to_calculator() {
        let memory = BufferMemory::ephemeral(10);
        let tools = registry();

        let decision = SimpleReasoner.think("5 * 7", &memory, Some(&tools)).await;
        assert_eq!(decision.tool_name.as_deref(), Some("calculator"));
        assert_eq!(decision.tool_input["expression"], "5 * 7");
    }

    #[tokio::test]
    async fn test_math_without_calculator_echoes() {
        let memory = BufferMemory::ephemeral(10);

        let decision = SimpleReasoner.think("5 * 7", &memory, Some(&ToolRegistry::new())).await;
        assert!(decision.is_chat());
        assert_eq!(decision.response(), Some("Echo: 5 * 7"));

        let decision = SimpleReasoner.think("5 * 7", &memory, None).await;
        assert!(decision.is_chat());
    }

    #[tokio::test]
    async fn test_small_talk_echoes() {
        let memory = BufferMemory::ephemeral(10);
        let tools = registry();

        let decision = SimpleReasoner.think("hello there", &memory, Some(&tools)).await;
        assert_eq!(decision.response(), Some("Echo: hello there"));
    }

    #[tokio::test]
    async fn test_sees_through_memory_context() {
        let memory = BufferMemory::ephemeral(10);
        memory.save("user", "hello", Value::Null);
        let tools = registry();

        let prompt = inject_memory_context("2 + 2", &memory, 8);
        let decision = SimpleReasoner.think(&prompt, &memory, Some(&tools)).await;
        assert_eq!(decision.tool_input["expression"], "2 + 2");
    }
}
