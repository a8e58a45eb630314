//! Overseer CLI
//!
//! A command-line interface for the agent supervisor with REPL support.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use overseer::agent::load_agent_profiles;
use overseer::provider::UnconfiguredModel;
use overseer::supervisor::LIST_TOOLS_COMMAND;
use overseer::templates::Templates;
use overseer::{
    BaseAgent, CompletionModel, Config, PermissionFlag, PermissionGate, PromptBuilder,
    ProviderClient, ProviderConfig, Supervisor, SupervisorEvent, Telemetry, ToolRegistry,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "overseer")]
#[command(about = "Overseer - a supervisor for tool-using LLM agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (default: ./overseer.yaml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Agents file (JSON or YAML)
    #[arg(short, long)]
    agents: Option<PathBuf>,

    /// Working directory for file operations
    #[arg(short = 'd', long)]
    working_dir: Option<PathBuf>,

    /// LLM model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Base URL for a custom OpenAI-compatible endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive REPL session
    Repl,

    /// Run a single task and wait for it to finish
    Run {
        /// The task to hand to the agent
        task: String,
    },

    /// Show configured agents and their tools
    Tools,
}

/// Everything the CLI needs after start-up
struct App {
    supervisor: Arc<Supervisor>,
    registry: Arc<ToolRegistry>,
    gate: Arc<PermissionGate>,
}

type Updates = mpsc::UnboundedReceiver<SupervisorEvent>;

/// Build configuration - priority: CLI flags > config file > defaults
fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::discover(cli.config.as_deref())?.with_verbose(cli.verbose);

    let working_dir = cli.working_dir.as_ref().unwrap_or(&config.working_dir);
    let working_dir = if working_dir.is_absolute() {
        working_dir.clone()
    } else {
        std::env::current_dir()?.join(working_dir)
    };
    config.working_dir = working_dir
        .canonicalize()
        .with_context(|| format!("working directory {}", working_dir.display()))?;

    if let Some(agents) = &cli.agents {
        config.agents_file = agents.clone();
    }
    if let Some(model) = &cli.model {
        config.model = Some(model.clone());
    }
    if let Some(base_url) = &cli.base_url {
        config.provider = ProviderConfig::custom(
            "custom",
            base_url.clone(),
            config.provider.api_key_env.clone(),
            config.model_name().to_string(),
        );
    }

    Ok(config)
}

fn build_model(config: &Config) -> Arc<dyn CompletionModel> {
    match ProviderClient::new(config.provider.clone()) {
        Ok(client) => Arc::new(
            client
                .with_model(config.model_name())
                .with_temperature(config.temperature),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Provider not configured; tasks will fail");
            eprintln!("Warning: {}", e);
            Arc::new(UnconfiguredModel::new(e.to_string()))
        }
    }
}

fn build_app(config: &Config) -> Result<(App, Updates)> {
    let gate = Arc::new(config.permission_gate());
    let registry = Arc::new(ToolRegistry::from_catalog(overseer::tools::catalog()));
    gate.register_tools(registry.names().iter().map(String::as_str));

    let prompts = Arc::new(PromptBuilder::new(Templates::new()?));
    let model = build_model(config);

    let agents = load_agent_profiles(&config.agents_path(), &registry)
        .into_iter()
        .map(|profile| {
            Arc::new(BaseAgent::new(
                profile,
                model.clone(),
                registry.clone(),
                gate.clone(),
                prompts.clone(),
                config.working_dir.clone(),
            ))
        });

    let (supervisor, updates) = Supervisor::new(agents);
    let app = App {
        supervisor,
        registry,
        gate,
    };
    Ok((app, updates))
}

/// Directory for REPL history
fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("overseer"))
        .unwrap_or_else(|| PathBuf::from(".overseer"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = build_config(&cli)?;
    let log_dir = if config.telemetry.log_dir.is_absolute() {
        config.telemetry.log_dir.clone()
    } else {
        config.working_dir.join(&config.telemetry.log_dir)
    };
    let _telemetry = Telemetry::init(&log_dir, config.telemetry.verbose)?;

    tracing::info!(
        working_dir = %config.working_dir.display(),
        model = config.model_name(),
        provider = %config.provider.name,
        "Starting overseer"
    );

    let (app, updates) = build_app(&config)?;
    let dispatch = app.supervisor.spawn();

    match cli.command {
        Some(Commands::Run { task }) => run_single_task(&app, updates, &task).await?,
        Some(Commands::Tools) => run_single_task(&app, updates, LIST_TOOLS_COMMAND).await?,
        Some(Commands::Repl) | None => run_repl(&app, updates, &config).await?,
    }

    dispatch.abort();
    Ok(())
}

/// Submit one command and print events until it is resolved
async fn run_single_task(app: &App, mut updates: Updates, command: &str) -> Result<()> {
    app.supervisor.submit(command)?;

    while let Some(event) = updates.recv().await {
        println!("{}", event);
        match event {
            SupervisorEvent::TaskFinished { .. }
            | SupervisorEvent::NoAgents
            | SupervisorEvent::Inventory(_)
            | SupervisorEvent::Error(_) => break,
            _ => {}
        }
    }

    app.supervisor.stop();
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  /quit, /exit           - Exit the REPL");
    println!("  /perms                 - Show permission flags and tool toggles");
    println!("  /perm <FLAG> on|off    - Set a permission flag");
    println!("  /tool <name> on|off    - Enable or disable a tool");
    println!("  /reload                - Re-scan the tool catalogue");
    println!("  /reset                 - Clear every agent's conversation");
    println!("  /status                - Show agent status");
    println!("  /help                  - Show this help");
    println!("  list_tools             - Show agents and their tools");
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn print_permissions(app: &App) {
    println!("Permissions:");
    for (flag, allowed) in app.gate.snapshot() {
        println!("  {:20} {}", flag.as_str(), if allowed { "on" } else { "off" });
    }
    println!("Tools:");
    for name in app.registry.names() {
        let enabled = app.gate.is_tool_enabled(&name);
        println!("  {:22} {}", name, if enabled { "on" } else { "off" });
    }
}

/// Handle a `/` command; returns false when the REPL should exit
async fn handle_local_command(app: &App, line: &str) -> bool {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["/quit"] | ["/exit"] => {
            println!("Goodbye!");
            return false;
        }
        ["/help"] => print_help(),
        ["/perms"] => print_permissions(app),
        ["/perm", flag, value] => match (flag.parse::<PermissionFlag>(), parse_switch(value)) {
            (Ok(flag), Some(value)) => {
                app.gate.set_flag(flag, value);
                println!("{} = {}", flag, if value { "on" } else { "off" });
            }
            (Err(e), _) => eprintln!("{}", e),
            (_, None) => println!("Usage: /perm <FLAG> on|off"),
        },
        ["/tool", name, value] => match parse_switch(value) {
            Some(_) if !app.registry.contains(name) => eprintln!("Unknown tool: {}", name),
            Some(value) => {
                app.gate.set_tool_enabled(name, value);
                println!("{} = {}", name, if value { "on" } else { "off" });
            }
            None => println!("Usage: /tool <name> on|off"),
        },
        ["/reload"] => {
            let added = app.registry.reload(&app.gate);
            if added.is_empty() {
                println!("No new tools found.");
            } else {
                println!("Added tools: {}", added.join(", "));
            }
        }
        ["/reset"] => {
            for agent in app.supervisor.agents() {
                agent.reset_conversation().await;
            }
            println!("Conversations cleared.");
        }
        ["/status"] => {
            for agent in app.supervisor.agents() {
                println!("  {:20} {:?}", agent.name(), agent.status());
            }
        }
        _ => println!("Unknown command: {}", line),
    }
    true
}

async fn run_repl(app: &App, mut updates: Updates, config: &Config) -> Result<()> {
    println!("Overseer REPL");
    println!("Working directory: {}", config.working_dir.display());
    println!("Model: {}", config.model_name());
    println!();
    print_help();
    println!();

    // Events arrive while the editor waits for input
    let printer = tokio::spawn(async move {
        while let Some(event) = updates.recv().await {
            println!("\n{}", event);
        }
    });

    let history_path = data_dir().join("history.txt");
    let mut rl = DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    loop {
        match rl.readline("overseer> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line.starts_with('/') {
                    if !handle_local_command(app, line).await {
                        break;
                    }
                    continue;
                }

                if let Err(e) = app.supervisor.submit(line) {
                    eprintln!("Error: {}", e);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                break;
            }
        }
    }

    save_history(&mut rl, &history_path);
    app.supervisor.stop();
    printer.abort();
    Ok(())
}

fn save_history(rl: &mut DefaultEditor, path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = rl.save_history(path) {
        tracing::debug!(error = %e, "Could not save REPL history");
    }
}
