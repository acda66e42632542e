//! CLI module for agentry - command-line interface and subcommands.
//!
//! Parsing is split from execution so the dispatcher can be exercised
//! without building the agent runtime.

pub mod commands;
pub mod dispatch;

pub use commands::{Cli, Commands, MemoryCommands};
pub use dispatch::{
    INVALID_COMMAND, Invocation, TemplateTarget, USAGE, parse_invocation, run_template_command, write_invocation,
};
