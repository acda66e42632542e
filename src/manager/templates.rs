use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use colored::*;
use log::{info, warn};

use crate::error::Result;
use crate::kernel::AgentKernel;

/// Anything that can enumerate tools and write a template per tool
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Names of the currently known tools
    fn tool_names(&self) -> Vec<String>;

    /// Create the template for one tool, returning its location
    async fn create_prompt_template(&self, tool_name: &str) -> Result<PathBuf>;
}

#[async_trait]
impl TemplateSource for AgentKernel {
    fn tool_names(&self) -> Vec<String> {
        self.tools().tool_names()
    }

    async fn create_prompt_template(&self, tool_name: &str) -> Result<PathBuf> {
        AgentKernel::create_prompt_template(self, tool_name).await
    }
}

/// Result of one template creation attempt
#[derive(Debug)]
pub struct TemplateOutcome {
    pub tool: String,
    pub result: std::result::Result<PathBuf, String>,
}

impl TemplateOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Create a template for every tool in `source`, one outcome line per tool.
///
/// Tools are attempted sequentially; failures never stop the batch.
pub async fn create_all_templates(
    source: &dyn TemplateSource,
    out: &mut dyn Write,
) -> std::io::Result<Vec<TemplateOutcome>> {
    writeln!(out, "Creating prompt templates for all tools...")?;

    let names = source.tool_names();
    let mut outcomes = Vec::with_capacity(names.len());
    for tool in names {
        outcomes.push(attempt(source, &tool, out).await?);
    }

    let created = outcomes.iter().filter(|o| o.is_success()).count();
    info!("Created {}/{} prompt templates", created, outcomes.len());
    Ok(outcomes)
}

/// Create the template for a single tool
pub async fn create_template(
    source: &dyn TemplateSource,
    tool: &str,
    out: &mut dyn Write,
) -> std::io::Result<TemplateOutcome> {
    writeln!(out, "Creating prompt template for {}...", tool)?;
    attempt(source, tool, out).await
}

async fn attempt(source: &dyn TemplateSource, tool: &str, out: &mut dyn Write) -> std::io::Result<TemplateOutcome> {
    let result = match source.create_prompt_template(tool).await {
        Ok(path) => {
            writeln!(out, "{} {}", "Created:".green(), path.display())?;
            Ok(path)
        }
        Err(e) => {
            warn!("Template creation failed for {}: {}", tool, e);
            writeln!(out, "{} {}: {}", "Failed to create template for".red(), tool, e)?;
            Err(e.to_string())
        }
    };

    Ok(TemplateOutcome {
        tool: tool.to_string(),
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentryError;
    use std::sync::Mutex;

    struct FakeSource {
        tools: Vec<&'static str>,
        failing: Vec<&'static str>,
        attempts: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn new(tools: Vec<&'static str>, failing: Vec<&'static str>) -> Self {
            Self {
                tools,
                failing,
                attempts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TemplateSource for FakeSource {
        fn tool_names(&self) -> Vec<String> {
            self.tools.iter().map(|t| t.to_string()).collect()
        }

        async fn create_prompt_template(&self, tool_name: &str) -> Result<PathBuf> {
            self.attempts.lock().unwrap().push(tool_name.to_string());
            if self.failing.iter().any(|f| *f == tool_name) {
                return Err(AgentryError::ToolExecution("disk full".to_string()));
            }
            Ok(PathBuf::from(format!("prompts/{}_prompt.json", tool_name)))
        }
    }

    #[tokio::test]
    async fn test_one_line_per_tool() {
        let source = FakeSource::new(vec!["a", "b", "c"], vec!["b"]);
        let mut out = Vec::new();

        let outcomes = create_all_templates(&source, &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Creating prompt templates for all tools...");
        assert!(lines[1].contains("Created:") && lines[1].contains("prompts/a_prompt.json"));
        assert!(lines[2].contains("Failed to create template for") && lines[2].contains("b: Tool execution failed: disk full"));
        assert!(lines[3].contains("prompts/c_prompt.json"));

        assert_eq!(outcomes.len(), 3);
        assert!(!outcomes[1].is_success());
        assert_eq!(*source.attempts.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_no_tools_no_outcomes() {
        let source = FakeSource::new(vec![], vec![]);
        let mut out = Vec::new();

        let outcomes = create_all_templates(&source, &mut out).await.unwrap();
        assert!(outcomes.is_empty());
        assert_eq!(String::from_utf8(out).unwrap(), "Creating prompt templates for all tools...\n");
    }

    #[tokio::test]
    async fn test_create_single_template() {
        let source = FakeSource::new(vec!["a", "b"], vec![]);
        let mut out = Vec::new();

        let outcome = create_template(&source, "b", &mut out).await.unwrap();
        assert_eq!(outcome.result.unwrap(), PathBuf::from("prompts/b_prompt.json"));
        assert_eq!(*source.attempts.lock().unwrap(), vec!["b"]);
        assert!(String::from_utf8(out).unwrap().starts_with("Creating prompt template for b...\n"));
    }
}
