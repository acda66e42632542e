//! Prompt enrichment from memory and keyword-based fact extraction.

use super::Memory;

/// Kinds of information worth remembering from a user message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Learnable {
    Preference,
    UserFact,
    ImportantNote,
}

impl Learnable {
    pub fn as_str(&self) -> &'static str {
        match self {
            Learnable::Preference => "preference",
            Learnable::UserFact => "user_fact",
            Learnable::ImportantNote => "important_note",
        }
    }
}

const CONTEXT_HEADER: &str = "CONVERSATION CONTEXT:\n";
const REQUEST_HEADER: &str = "\n\nCURRENT REQUEST:\n";
const CONTEXT_FOOTER: &str =
    "\n\nPlease consider the above context when responding. Reference previous conversations when relevant.";

/// Prefix `prompt` with the recent conversation when memory has any
pub fn inject_memory_context(prompt: &str, memory: &dyn Memory, context_limit: usize) -> String {
    let context = memory.conversation_context(context_limit);
    if context.is_empty() {
        return prompt.to_string();
    }

    format!("{}{}{}{}{}", CONTEXT_HEADER, context, REQUEST_HEADER, prompt, CONTEXT_FOOTER)
}

/// The request inside a prompt built by `inject_memory_context`; other prompts are returned as-is
pub fn current_request(prompt: &str) -> &str {
    if !prompt.starts_with(CONTEXT_HEADER) {
        return prompt;
    }
    match prompt.rfind(REQUEST_HEADER) {
        Some(start) => {
            let request = &prompt[start + REQUEST_HEADER.len()..];
            request.strip_suffix(CONTEXT_FOOTER).unwrap_or(request)
        }
        None => prompt,
    }
}

/// Pick out preferences, facts about the user and explicit notes
pub fn extract_learnable_info(user_input: &str) -> Vec<(Learnable, String)> {
    let lower = user_input.to_lowercase();
    let mut found = Vec::new();

    if lower.contains("i like") || lower.contains("i prefer") {
        found.push((Learnable::Preference, user_input.to_string()));
    }
    if lower.contains("i am") || lower.contains("my name is") {
        found.push((Learnable::UserFact, user_input.to_string()));
    }
    if lower.contains("remember") || lower.contains("note that") {
        found.push((Learnable::ImportantNote, user_input.to_string()));
    }

    found
}
