// Omni - terminal assistant with a guided provider setup
// Main entry point

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;

use omni::agent::Agent;
use omni::cli::terminal::{self, cleanup_terminal, setup_terminal, with_terminal};
use omni::cli::{
    looping_flow, remove_flow, run_query, setup_flow, AppState, FlowOutcome, QuerySession,
    Removal,
};
use omni::config::ConfigStore;
use omni::errors::{config_parse_error, not_configured_message, OmniError};

#[derive(Parser, Debug)]
#[command(name = "omni")]
#[command(about = "Terminal assistant with a guided provider setup", version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Name to greet before the chat starts
    #[arg(long)]
    name: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the setup wizard, starting over if already configured
    Config,
    /// Demonstrate a wizard step that loops back on itself
    #[command(name = "config:loop")]
    ConfigLoop,
    /// Remove the configuration after confirmation
    #[command(name = "config:rm")]
    ConfigRm,
    /// Mark setup as not completed so the next run starts over
    #[command(name = "config:reset")]
    ConfigReset,
    /// Start an interactive query session
    Query,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    install_panic_handler();
    init_tracing();

    let args = Args::parse();
    let store = ConfigStore::default_location()?;
    tracing::debug!(path = %store.path().display(), "Using config file");

    match args.command {
        Some(Command::Config) => run_setup(store),
        Some(Command::ConfigLoop) => run_looping(store),
        Some(Command::ConfigRm) => run_remove(store),
        Some(Command::ConfigReset) => run_reset(&store),
        Some(Command::Query) => run_chat(store, None).await,
        None => run_chat(store, args.name).await,
    }
}

/// Restore the terminal before the default panic output
fn install_panic_handler() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        terminal::restore_terminal();
        default_panic(info);
    }));
}

/// Log to a file under the cache directory
///
/// The TUI owns stdout, so nothing is written to the terminal. `RUST_LOG`
/// overrides the level; `OMNI_DEBUG=1` raises the default to info.
fn init_tracing() {
    let show_debug = std::env::var("OMNI_DEBUG")
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(false);
    let default_level = if show_debug { "info" } else { "warn" };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let writer = match open_log_file() {
        Some(file) => {
            let file = Arc::new(file);
            BoxMakeWriter::new(move || file.clone())
        }
        None => BoxMakeWriter::new(std::io::sink),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();

    // Bridge log crate -> tracing
    tracing_log::LogTracer::init().ok();
}

fn open_log_file() -> Option<fs::File> {
    let dir = dirs::cache_dir()?.join("omni");
    fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("omni.log"))
        .ok()
}

fn run_setup(store: ConfigStore) -> Result<ExitCode> {
    let outcome = with_terminal(|t| setup_flow(store)?.run(t))?;
    match outcome {
        FlowOutcome::Completed => {
            println!("Configuration complete!");
            Ok(ExitCode::SUCCESS)
        }
        FlowOutcome::Cancelled => {
            println!("Configuration cancelled. CLI will remain unconfigured.");
            Ok(ExitCode::FAILURE)
        }
        FlowOutcome::Interrupted => Ok(interrupted_exit()),
    }
}

fn run_looping(store: ConfigStore) -> Result<ExitCode> {
    let outcome = with_terminal(|t| looping_flow(store)?.run(t))?;
    match outcome {
        FlowOutcome::Completed => {
            println!("Looping configuration example complete!");
            Ok(ExitCode::SUCCESS)
        }
        FlowOutcome::Cancelled => {
            println!("Looping configuration example cancelled.");
            Ok(ExitCode::FAILURE)
        }
        FlowOutcome::Interrupted => Ok(interrupted_exit()),
    }
}

fn run_remove(store: ConfigStore) -> Result<ExitCode> {
    let (outcome, removal) = with_terminal(|t| {
        let mut flow = remove_flow(store)?;
        let outcome = flow.run(t)?;
        Ok((outcome, flow.hooks().removal().cloned()))
    })?;

    if let Some(Removal::Failed(reason)) = &removal {
        tracing::warn!(%reason, "Configuration removal failed");
    }

    match outcome {
        FlowOutcome::Completed => {
            println!("Configuration removal process complete!");
            Ok(ExitCode::SUCCESS)
        }
        FlowOutcome::Cancelled => {
            println!("Configuration removal cancelled.");
            Ok(ExitCode::FAILURE)
        }
        FlowOutcome::Interrupted => Ok(interrupted_exit()),
    }
}

/// Ctrl-C outside a cancellable step leaves the config as it was
fn interrupted_exit() -> ExitCode {
    ExitCode::from(130)
}

fn run_reset(store: &ConfigStore) -> Result<ExitCode> {
    if store.exists() {
        store.reset_initialization_state()?;
        println!("Configuration process has been reset. Run \"omni config\" to start over.");
    } else {
        println!("No configuration found. Run \"omni config\" to start the setup process.");
    }
    Ok(ExitCode::SUCCESS)
}

/// Query loop behind the configured gate
async fn run_chat(store: ConfigStore, name: Option<String>) -> Result<ExitCode> {
    let mut app = AppState::new(store);
    if let Err(e) = app.load() {
        if let Some(OmniError::ConfigParse { path, source }) = e.downcast_ref::<OmniError>() {
            eprintln!("{}", config_parse_error(&path.display().to_string(), source));
            return Ok(ExitCode::FAILURE);
        }
        return Err(e);
    }

    if !app.is_configured() {
        println!("{}", not_configured_message());
        return Ok(ExitCode::FAILURE);
    }

    if let Some(name) = name {
        println!("Hello, {}", name);
    }

    let session = QuerySession::new(&app)?;
    let agent = Agent::new(app.store().clone());

    let mut terminal = setup_terminal()?;
    let result = run_query(&mut terminal, session, agent).await;
    cleanup_terminal(&mut terminal)?;
    result?;

    println!("Query session complete.");
    Ok(ExitCode::SUCCESS)
}
