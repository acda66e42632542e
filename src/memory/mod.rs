//! Conversational memory
//!
//! The `Memory` trait is the seam the kernel, reasoners and prompt handler
//! depend on. `BufferMemory` is the file-backed implementation; the
//! `enhancer` functions layer memory context onto prompts and pick out
//! facts worth remembering.

mod buffer;
pub mod enhancer;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use buffer::BufferMemory;

/// One saved message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub timestamp: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A learned fact, preference or note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub value: Value,
    pub timestamp: String,
    pub session_id: String,
}

/// Context memory grouped by category, then key
pub type ContextMemory = BTreeMap<String, BTreeMap<String, ContextItem>>;

/// A match returned by `Memory::search`
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryHit {
    Conversation(MemoryEntry),
    Context {
        category: String,
        key: String,
        item: ContextItem,
    },
}

impl fmt::Display for MemoryHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryHit::Conversation(entry) => write!(f, "[{}] {}", entry.role, entry.content),
            MemoryHit::Context { category, key, item } => {
                write!(f, "{}/{}: {}", category, key, item.value)
            }
        }
    }
}

/// Summary counts of the memory state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub total_entries: usize,
    pub context_categories: usize,
    pub session_id: String,
}

pub trait Memory: Send + Sync {
    /// Store a message. `metadata` is expected to be a JSON object; `null` means none.
    fn save(&self, role: &str, content: &str, metadata: Value);

    /// Store a learned piece of context under `category`/`key`
    fn save_context(&self, key: &str, value: Value, category: &str);

    /// Formatted history lines, filtered by `query` (case-insensitive, empty matches all)
    /// and limited to the last `limit` entries, followed by the context memory section
    fn recall(&self, query: &str, limit: Option<usize>) -> Vec<String>;

    /// The most recent `limit` entries, oldest first
    fn recent(&self, limit: usize) -> Vec<MemoryEntry>;

    /// Conversation and context block for prompting; empty when nothing is stored
    fn conversation_context(&self, last_n: usize) -> String;

    /// Search conversation content and context keys/values
    fn search(&self, query: &str) -> Vec<MemoryHit>;

    fn snapshot(&self) -> MemorySnapshot;
}

/// Normalize a metadata argument into an object map
pub(crate) fn metadata_map(metadata: Value) -> Map<String, Value> {
    match metadata {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}
