//! In-process publish/subscribe event bus.
//!
//! Components emit named events with a JSON payload; subscribers registered
//! for that name are called synchronously in subscription order.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;

/// Event type constants
pub mod event_types {
    pub const TOOL_REGISTERED: &str = "tool.registered";
    pub const TOOL_UNREGISTERED: &str = "tool.unregistered";
    pub const TOOL_LOADED: &str = "tool.loaded";
    pub const TOOL_ERROR: &str = "tool.error";
    pub const AGENT_INPUT: &str = "agent.input";
    pub const AGENT_THOUGHT: &str = "agent.thought";
    pub const AGENT_TOOL_USED: &str = "agent.tool_used";
    pub const AGENT_FIELDS_FILLED: &str = "agent.fields_filled";
    pub const AGENT_OUTPUT: &str = "agent.output";
    pub const AGENT_ERROR: &str = "agent.error";
    pub const LLM_PROMPT: &str = "llm.prompt";
    pub const LLM_RESPONSE: &str = "llm.response";
    pub const MEMORY_SAVED: &str = "memory.saved";
    pub const MEMORY_CONTEXT_LEARNED: &str = "memory.context_learned";
}

/// Callback invoked with an event payload
pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Named-event publish/subscribe channel
#[derive(Default)]
pub struct EventBus {
    subscribers: RwLock<HashMap<String, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event name
    pub fn subscribe<F>(&self, event: &str, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        match self.subscribers.write() {
            Ok(mut subs) => subs.entry(event.to_string()).or_default().push(Arc::new(handler)),
            Err(e) => log::error!("Event bus lock poisoned, dropping subscriber for {}: {}", event, e),
        }
    }

    /// Deliver a payload to every handler subscribed to `event`
    pub fn emit(&self, event: &str, payload: &Value) {
        // Clone the handler list so handlers may subscribe or emit re-entrantly
        let handlers: Vec<Handler> = match self.subscribers.read() {
            Ok(subs) => subs.get(event).cloned().unwrap_or_default(),
            Err(e) => {
                log::error!("Event bus lock poisoned, dropping event {}: {}", event, e);
                return;
            }
        };
        log::trace!("emit {} -> {} handler(s)", event, handlers.len());
        for handler in handlers {
            handler(payload);
        }
    }

    /// Number of handlers registered for an event
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.subscribers
            .read()
            .map(|subs| subs.get(event).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let events: Vec<String> = self
            .subscribers
            .read()
            .map(|subs| subs.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("EventBus").field("events", &events).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_emit_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.emit(event_types::AGENT_INPUT, &json!({"input": "hi"}));
        assert_eq!(bus.subscriber_count(event_types::AGENT_INPUT), 0);
    }

    #[test]
    fn test_all_subscribers_receive_payload() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(event_types::TOOL_REGISTERED, move |payload| {
                seen.lock().unwrap().push(format!("{}:{}", tag, payload["tool"].as_str().unwrap()));
            });
        }

        bus.emit(event_types::TOOL_REGISTERED, &json!({"tool": "calculator"}));

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec!["first:calculator", "second:calculator"]);
    }

    #[test]
    fn test_events_are_isolated_by_name() {
        let bus = EventBus::new();
        let count = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&count);
        bus.subscribe(event_types::AGENT_OUTPUT, move |_| *counter.lock().unwrap() += 1);

        bus.emit(event_types::AGENT_INPUT, &Value::Null);
        bus.emit(event_types::AGENT_OUTPUT, &Value::Null);

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn test_handler_may_emit_reentrantly() {
        let bus = Arc::new(EventBus::new());
        let hits = Arc::new(Mutex::new(0));

        let inner_hits = Arc::clone(&hits);
        bus.subscribe("inner", move |_| *inner_hits.lock().unwrap() += 1);

        let bus_ref = Arc::clone(&bus);
        bus.subscribe("outer", move |payload| bus_ref.emit("inner", payload));

        bus.emit("outer", &Value::Null);
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
