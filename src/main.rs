use colored::*;
use eyre::{Context, Result};
use log::{LevelFilter, info};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use agentry::app::{App, resolve_model};
use agentry::cli::{Cli, Commands, Invocation, MemoryCommands, parse_invocation, run_template_command, write_invocation};
use agentry::config::Config;
use agentry::interface::CliInterface;
use agentry::memory::{BufferMemory, Memory};
use agentry::model_selector::ModelSelector;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("agentry")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("agentry.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        // Narrowed later from the config's log_level
        builder.filter_level(LevelFilter::Trace);
    }
    builder.target(env_logger::Target::Pipe(target)).init();
    log::set_max_level(LevelFilter::Info);

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Apply the configured level unless RUST_LOG already decided
fn apply_log_level(config: &Config) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    if let Some(level) = config.log_level.as_deref().and_then(|l| l.parse::<LevelFilter>().ok()) {
        log::set_max_level(level);
    }
}

async fn run_application(cli: &Cli, command: &Commands, mut config: Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match command {
        Commands::Model { name } => return handle_model_command(name.as_deref(), &config),
        Commands::Memory { command } => return handle_memory_command(command, &config),
        _ => {}
    }

    let model = resolve_model(&mut config, cli.model.as_deref()).context("Failed to resolve model")?;
    info!("Using model: {}", model);

    let interface = Arc::new(CliInterface::stdio(&config.interface));
    let app = App::build(config, interface).context("Failed to build agent runtime")?;

    if let Some(target) = command.template_target() {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        run_template_command(&target, &app.kernel, &mut out).await?;
        out.flush()?;
        return Ok(());
    }

    match command {
        Commands::Tools => handle_tools_command(&app),
        Commands::Run => handle_run_command(&app).await,
        _ => Ok(()),
    }
}

fn handle_tools_command(app: &App) -> Result<()> {
    println!("{} {}", "Tools:".green(), app.tools.len());
    for (name, description) in app.tools.list_tools() {
        println!("  {} - {}", name.cyan(), description);
    }
    Ok(())
}

async fn handle_run_command(app: &App) -> Result<()> {
    println!("{} {} ({})", "Starting".green(), app.config.agent_name, app.config.llm.model);
    if app.memory.snapshot().total_entries > 0 {
        println!("{}", "Resuming conversation with previous context loaded...".cyan());
    }
    println!("{}", app.kernel.memory_summary());
    println!(
        "Type {} to stop\n",
        app.config
            .interface
            .exit_commands
            .iter()
            .map(|c| format!("'{}'", c))
            .collect::<Vec<_>>()
            .join(", ")
    );

    app.kernel.run().await.context("Agent session failed")?;
    println!("{}", "Agent stopped".yellow());
    Ok(())
}

fn handle_model_command(name: Option<&str>, config: &Config) -> Result<()> {
    let selector = ModelSelector::new(&config.llm.model_file, config.llm.model.clone());
    match name {
        Some(name) => {
            selector
                .set_selected_model(name)
                .context(format!("Failed to write {}", selector.config_file().display()))?;
            println!("{} {}", "Selected model:".green(), name);
        }
        None => println!("{} {}", "Selected model:".green(), selector.selected_model()),
    }
    Ok(())
}

fn handle_memory_command(command: &MemoryCommands, config: &Config) -> Result<()> {
    let persist_file = &config.memory.persist_file;
    match command {
        MemoryCommands::Show => {
            let memory = BufferMemory::open(config.memory.limit, persist_file);
            let snapshot = memory.snapshot();
            println!("{}", "Memory Status:".green());
            println!("   Conversation entries: {}", snapshot.total_entries);
            println!("   Context categories: {}", snapshot.context_categories);
            println!("   Session ID: {}", snapshot.session_id);

            if snapshot.total_entries > 0 {
                println!("\n{}", "Recent conversations:".green());
                for entry in memory.recent(5) {
                    println!("   [{}] {}: {}", entry.timestamp, entry.role, entry.content);
                }
            }
        }
        MemoryCommands::Clear => {
            if persist_file.exists() {
                fs::remove_file(persist_file)
                    .context(format!("Failed to remove {}", persist_file.display()))?;
                println!("{}", "Memory cleared successfully".green());
            } else {
                println!("No memory file found to clear");
            }
        }
        MemoryCommands::Export { output } => {
            let memory = BufferMemory::open(config.memory.limit, persist_file);
            let path = output.clone().unwrap_or_else(|| config.memory.export_file.clone());
            memory
                .export(&path)
                .context(format!("Failed to export memory to {}", path.display()))?;
            println!("{} {}", "Memory exported to".green(), path.display());
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments; every path below exits normally
    let (cli, command) = match parse_invocation(std::env::args_os()) {
        Invocation::Command(cli, command) => (cli, command),
        other => {
            write_invocation(&other, &mut std::io::stdout().lock())?;
            return Ok(());
        }
    };

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_log_level(&config);

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &command, config).await.context("Application failed")?;

    Ok(())
}
