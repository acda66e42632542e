//! Command dispatcher: map command-line tokens to a behaviour.
//!
//! Every path exits normally. Missing commands print the usage text and
//! unrecognised input prints the invalid-command message.

use std::ffi::OsString;
use std::io::Write;

use clap::Parser;
use clap::error::ErrorKind;
use log::debug;

use super::commands::{Cli, Commands};
use crate::manager::{TemplateOutcome, TemplateSource, create_all_templates, create_template};

pub const USAGE: &str = "
Usage: agentry <command>

Commands:
  create-all           - Create prompt templates for all tools
  create <tool>        - Create prompt template for specific tool
  run                  - Start an interactive agent session
  tools                - List registered tools
  model [name]         - Show or set the selected model
  memory <show|clear|export>
                       - Inspect, delete or export conversation memory
";

pub const INVALID_COMMAND: &str = "Invalid command. Use 'create-all' or 'create <tool_name>'";

/// What the process should do with its arguments
#[derive(Debug)]
pub enum Invocation {
    /// No command given
    Usage,
    /// Help or version text to print as-is
    Display(String),
    /// Unrecognised command or missing argument
    Invalid,
    /// Parsed flags plus the command they apply to
    Command(Cli, Commands),
}

/// Which templates a command asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateTarget {
    All,
    One(String),
}

impl Commands {
    /// The template work this command requests, if any
    pub fn template_target(&self) -> Option<TemplateTarget> {
        match self {
            Commands::CreateAll => Some(TemplateTarget::All),
            Commands::Create { tool } => Some(TemplateTarget::One(tool.clone())),
            _ => None,
        }
    }
}

/// Classify the process arguments (program name first)
pub fn parse_invocation<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(mut cli) => match cli.command.take() {
            Some(command) => Invocation::Command(cli, command),
            None => Invocation::Usage,
        },
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Invocation::Display(e.to_string()),
            _ => {
                debug!("Argument parsing failed: {}", e);
                Invocation::Invalid
            }
        },
    }
}

/// Write the text for an invocation that carries no command.
///
/// Returns `false` for `Invocation::Command`, which has nothing to print here.
pub fn write_invocation(invocation: &Invocation, out: &mut dyn Write) -> std::io::Result<bool> {
    match invocation {
        Invocation::Usage => writeln!(out, "{}", USAGE)?,
        Invocation::Display(text) => write!(out, "{}", text)?,
        Invocation::Invalid => writeln!(out, "{}", INVALID_COMMAND)?,
        Invocation::Command(..) => return Ok(false),
    }
    Ok(true)
}

/// Run template creation for a `create-all` or `create <tool>` command
pub async fn run_template_command(
    target: &TemplateTarget,
    source: &dyn TemplateSource,
    out: &mut dyn Write,
) -> std::io::Result<Vec<TemplateOutcome>> {
    match target {
        TemplateTarget::All => create_all_templates(source, out).await,
        TemplateTarget::One(tool) => Ok(vec![create_template(source, tool, out).await?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_command_is_usage() {
        assert!(matches!(parse_invocation(["agentry"]), Invocation::Usage));
        assert!(matches!(parse_invocation(["agentry", "-v"]), Invocation::Usage));
    }

    #[test]
    fn test_template_commands() {
        let Invocation::Command(_, command) = parse_invocation(["agentry", "create-all"]) else {
            panic!("expected a command");
        };
        assert_eq!(command.template_target(), Some(TemplateTarget::All));

        let Invocation::Command(_, command) = parse_invocation(["agentry", "create", "chat"]) else {
            panic!("expected a command");
        };
        assert_eq!(
            command.template_target(),
            Some(TemplateTarget::One("chat".to_string()))
        );
    }

    #[test]
    fn test_other_commands_have_no_template_target() {
        let Invocation::Command(cli, command) = parse_invocation(["agentry", "tools", "-v"]) else {
            panic!("expected a command");
        };
        assert_eq!(command.template_target(), None);
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_invalid_commands() {
        assert!(matches!(parse_invocation(["agentry", "create"]), Invocation::Invalid));
        assert!(matches!(parse_invocation(["agentry", "destroy-all"]), Invocation::Invalid));
        assert!(matches!(parse_invocation(["agentry", "create", "a", "b"]), Invocation::Invalid));
    }

    #[test]
    fn test_help_and_version_display() {
        match parse_invocation(["agentry", "--help"]) {
            Invocation::Display(text) => assert!(text.contains("create-all")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse_invocation(["agentry", "--version"]), Invocation::Display(_)));
    }

    fn written(args: &[&str]) -> (bool, String) {
        let mut out = Vec::new();
        let printed = write_invocation(&parse_invocation(args.iter().copied()), &mut out).unwrap();
        (printed, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_no_arguments_print_usage() {
        assert_eq!(written(&["agentry"]), (true, format!("{}\n", USAGE)));
    }

    #[test]
    fn test_invalid_arguments_print_invalid_command() {
        let expected = (true, format!("{}\n", INVALID_COMMAND));
        assert_eq!(written(&["agentry", "create"]), expected);
        assert_eq!(written(&["agentry", "bogus"]), expected);
        assert_eq!(written(&["agentry", "create", "a", "b"]), expected);
    }

    #[test]
    fn test_commands_print_nothing() {
        assert_eq!(written(&["agentry", "create-all"]), (false, String::new()));
        assert_eq!(written(&["agentry", "create", "chat"]), (false, String::new()));
    }

    #[test]
    fn test_help_text_is_written_verbatim() {
        let (printed, text) = written(&["agentry", "--help"]);
        assert!(printed);
        assert!(text.contains("create-all") && text.contains("Usage:"));
    }

    #[test]
    fn test_usage_lists_commands() {
        assert!(USAGE.contains("create-all"));
        assert!(USAGE.contains("create <tool>"));
    }
}
