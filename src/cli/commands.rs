//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - create-all / create: write prompt templates
//! - run: interactive agent session
//! - tools, model, memory: inspection and housekeeping

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Agentry - a modular tool-using agent and its prompt-template manager
#[derive(Parser, Debug)]
#[command(name = "agentry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Select (and remember) the model to use
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create prompt templates for all tools
    #[command(name = "create-all")]
    CreateAll,

    /// Create prompt template for a specific tool
    Create {
        /// Tool name
        tool: String,
    },

    /// Start an interactive agent session
    Run,

    /// List registered tools
    Tools,

    /// Show or set the selected model
    Model {
        /// Model to select
        name: Option<String>,
    },

    /// Manage conversation memory
    Memory {
        #[command(subcommand)]
        command: MemoryCommands,
    },
}

/// Memory management subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum MemoryCommands {
    /// Show memory status and recent conversation
    Show,

    /// Delete the persisted memory file
    Clear,

    /// Export memory as readable text
    Export {
        /// Output file (defaults to the configured export file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
