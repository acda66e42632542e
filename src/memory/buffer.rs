//! File-backed conversation buffer.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{ContextItem, ContextMemory, Memory, MemoryEntry, MemoryHit, MemorySnapshot, metadata_map};
use crate::error::{AgentryError, Result};
use crate::events::{EventBus, event_types};
use crate::id::{generate_session_id, now_rfc3339};

/// On-disk layout of the memory file
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedMemory {
    #[serde(default)]
    conversation_history: Vec<MemoryEntry>,
    #[serde(default)]
    context_memory: ContextMemory,
    #[serde(default)]
    last_updated: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    history: Vec<MemoryEntry>,
    context: ContextMemory,
    session_id: String,
}

/// Bounded conversation history plus categorized context, persisted as JSON
/// after every write.
pub struct BufferMemory {
    limit: usize,
    persist_file: Option<PathBuf>,
    state: RwLock<MemoryState>,
    event_bus: Option<Arc<EventBus>>,
}

impl BufferMemory {
    /// In-memory buffer with no backing file
    pub fn ephemeral(limit: usize) -> Self {
        Self {
            limit,
            persist_file: None,
            state: RwLock::new(MemoryState {
                session_id: generate_session_id(),
                ..Default::default()
            }),
            event_bus: None,
        }
    }

    /// Open a buffer backed by `persist_file`, loading any previous state.
    ///
    /// A missing file starts empty. An unreadable or malformed file is logged
    /// and also starts empty.
    pub fn open(limit: usize, persist_file: impl AsRef<Path>) -> Self {
        let persist_file = persist_file.as_ref().to_path_buf();
        let mut state = MemoryState {
            session_id: generate_session_id(),
            ..Default::default()
        };

        match Self::load_file(&persist_file) {
            Ok(Some(persisted)) => {
                log::info!(
                    "Loaded {} conversation entries from {}",
                    persisted.conversation_history.len(),
                    persist_file.display()
                );
                state.history = persisted.conversation_history;
                state.context = persisted.context_memory;
            }
            Ok(None) => {}
            Err(e) => log::warn!("Could not load persistent memory {}: {}", persist_file.display(), e),
        }

        Self {
            limit,
            persist_file: Some(persist_file),
            state: RwLock::new(state),
            event_bus: None,
        }
    }

    /// Emit memory events on `bus`
    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn persist_file(&self) -> Option<&Path> {
        self.persist_file.as_deref()
    }

    /// Drop the conversation history and start a new session. Context memory is kept.
    pub fn clear_session(&self) {
        let mut state = self.write_state();
        state.history.clear();
        state.session_id = generate_session_id();
        self.persist(&state);
    }

    /// Write a human-readable export of the whole memory to `path`
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let state = self.read_state();

        let mut out = String::new();
        let rule = "=".repeat(50);
        let thin = "-".repeat(30);
        let _ = writeln!(out, "AI Agent Memory Export\n{}\n", rule);
        let _ = writeln!(out, "Total Entries: {}", state.history.len());
        let _ = writeln!(out, "Session ID: {}\n", state.session_id);
        let _ = writeln!(out, "Conversation History:\n{}", thin);
        for entry in &state.history {
            let _ = writeln!(out, "[{}] {}: {}", entry.timestamp, entry.role, entry.content);
        }
        if !state.context.is_empty() {
            let _ = writeln!(out, "\nContext Memory:\n{}", thin);
            for (category, items) in &state.context {
                let _ = writeln!(out, "\n{}:", category.to_uppercase());
                for (key, item) in items {
                    let _ = writeln!(out, "  {}: {}", key, display_value(&item.value));
                }
            }
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, out)?;
        Ok(())
    }

    fn load_file(path: &Path) -> Result<Option<PersistedMemory>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let persisted: PersistedMemory = serde_json::from_str(&content)?;
        Ok(Some(persisted))
    }

    fn persist(&self, state: &MemoryState) {
        let Some(path) = &self.persist_file else {
            return;
        };
        if let Err(e) = Self::write_file(path, state) {
            log::warn!("Could not persist memory to {}: {}", path.display(), e);
        }
    }

    fn write_file(path: &Path, state: &MemoryState) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let persisted = PersistedMemory {
            conversation_history: state.history.clone(),
            context_memory: state.context.clone(),
            last_updated: Some(now_rfc3339()),
        };
        fs::write(path, serde_json::to_string_pretty(&persisted)?).map_err(AgentryError::from)
    }

    fn emit(&self, event: &str, payload: Value) {
        if let Some(bus) = &self.event_bus {
            bus.emit(event, &payload);
        }
    }

    // A poisoned lock still holds consistent data: every write is a single push or replace.
    fn read_state(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Memory for BufferMemory {
    fn save(&self, role: &str, content: &str, metadata: Value) {
        {
            let mut state = self.write_state();
            let entry = MemoryEntry {
                timestamp: now_rfc3339(),
                session_id: state.session_id.clone(),
                role: role.to_string(),
                content: content.to_string(),
                metadata: metadata_map(metadata),
            };
            state.history.push(entry);

            if state.history.len() > self.limit {
                let excess = state.history.len() - self.limit;
                state.history.drain(..excess);
            }

            self.persist(&state);
        }

        self.emit(
            event_types::MEMORY_SAVED,
            json!({"role": role, "content_length": content.chars().count()}),
        );
    }

    fn save_context(&self, key: &str, value: Value, category: &str) {
        {
            let mut state = self.write_state();
            let item = ContextItem {
                value: value.clone(),
                timestamp: now_rfc3339(),
                session_id: state.session_id.clone(),
            };
            state
                .context
                .entry(category.to_string())
                .or_default()
                .insert(key.to_string(), item);

            self.persist(&state);
        }

        self.emit(
            event_types::MEMORY_CONTEXT_LEARNED,
            json!({"category": category, "key": key, "value": value}),
        );
    }

    fn recall(&self, query: &str, limit: Option<usize>) -> Vec<String> {
        let state = self.read_state();
        let query = query.to_lowercase();

        let start = limit.map_or(0, |n| state.history.len().saturating_sub(n));
        let mut results: Vec<String> = state.history[start..]
            .iter()
            .filter(|entry| query.is_empty() || entry.content.to_lowercase().contains(&query))
            .map(|entry| {
                let mut line = format!("[{}] {}: {}", entry.timestamp, entry.role, entry.content);
                if !entry.metadata.is_empty() {
                    line.push_str(&format!(" (metadata: {})", Value::Object(entry.metadata.clone())));
                }
                line
            })
            .collect();

        if !state.context.is_empty() {
            results.push("\n--- CONTEXT MEMORY ---".to_string());
            for (category, items) in &state.context {
                results.push(format!("[{}]", category.to_uppercase()));
                for (key, item) in items {
                    results.push(format!("  {}: {}", key, display_value(&item.value)));
                }
            }
        }

        results
    }

    fn recent(&self, limit: usize) -> Vec<MemoryEntry> {
        let state = self.read_state();
        let start = state.history.len().saturating_sub(limit);
        state.history[start..].to_vec()
    }

    fn conversation_context(&self, last_n: usize) -> String {
        let state = self.read_state();
        let start = state.history.len().saturating_sub(last_n);
        let recent = &state.history[start..];

        let mut parts = Vec::new();
        if !recent.is_empty() {
            parts.push("RECENT CONVERSATION:".to_string());
            for entry in recent {
                parts.push(format!("{}: {}", entry.role, entry.content));
            }
        }

        if !state.context.is_empty() {
            parts.push("\nRELEVANT CONTEXT:".to_string());
            for (category, items) in state.context.iter().filter(|(_, items)| !items.is_empty()) {
                parts.push(format!("{}:", category.to_uppercase()));
                for (key, item) in items {
                    parts.push(format!("  - {}: {}", key, display_value(&item.value)));
                }
            }
        }

        parts.join("\n")
    }

    fn search(&self, query: &str) -> Vec<MemoryHit> {
        let state = self.read_state();
        let query = query.to_lowercase();

        let mut hits: Vec<MemoryHit> = state
            .history
            .iter()
            .filter(|entry| entry.content.to_lowercase().contains(&query))
            .cloned()
            .map(MemoryHit::Conversation)
            .collect();

        for (category, items) in &state.context {
            for (key, item) in items {
                if key.to_lowercase().contains(&query) || item.value.to_string().to_lowercase().contains(&query) {
                    hits.push(MemoryHit::Context {
                        category: category.clone(),
                        key: key.clone(),
                        item: item.clone(),
                    });
                }
            }
        }

        hits
    }

    fn snapshot(&self) -> MemorySnapshot {
        let state = self.read_state();
        MemorySnapshot {
            total_entries: state.history.len(),
            context_categories: state.context.len(),
            session_id: state.session_id.clone(),
        }
    }
}

/// Strings display bare, everything else as compact JSON
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
