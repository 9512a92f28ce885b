//! banker - Deadlock-avoiding resource allocator
//!
//! This is the CLI application that replays, checks and stress-tests
//! allocation tables through the ops crate.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use banker_config::{Config, Scenario};
use banker_events::EventReceiver;
use banker_ops::{OperationResult, OpsContextBuilder, OpsCtx};
use banker_types::OutputFormat;
use clap::Parser;
use std::path::Path;
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Configuration decides the output format and the log directory, so it
    // is loaded before tracing is initialized.
    let config = match load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let json_mode = cli.global.json || config.general.default_output == OutputFormat::Json;
    init_tracing(json_mode, cli.global.debug, config.logging.log_dir.as_deref());

    if let Err(e) = run(cli, config, json_mode).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Load configuration with proper precedence:
/// file (or defaults) < environment < CLI flags
async fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command);
    Ok(config)
}

/// Main application logic
async fn run(cli: Cli, config: Config, json_mode: bool) -> Result<(), CliError> {
    info!("Starting banker v{}", env!("CARGO_PKG_VERSION"));

    let (event_sender, event_receiver) = banker_events::channel();

    let ops_ctx = OpsContextBuilder::new()
        .with_event_sender(event_sender)
        .with_config(config.clone())
        .build()?;

    let renderer = OutputRenderer::new(
        json_mode,
        config.general.default_output,
        config.general.color,
    );
    let mut event_handler =
        EventHandler::new(renderer.colors_enabled(), cli.global.debug, json_mode);

    let result =
        execute_command_with_events(cli.command, ops_ctx, event_receiver, &mut event_handler)
            .await?;

    renderer.render_result(&result)?;

    if let OperationResult::StressReport(report) = &result {
        if !report.invariants_held {
            return Err(CliError::InvariantsBroken);
        }
    }

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ops_ctx: OpsCtx,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ops_ctx));

    // Handle events concurrently with command execution
    loop {
        select! {
            // Command completed
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            // Event received
            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: OpsCtx) -> Result<OperationResult, CliError> {
    match command {
        Commands::Demo { which } => {
            let scenario = Scenario::builtin(which.name()).ok_or_else(|| {
                CliError::InvalidArguments(format!("unknown demo '{}'", which.name()))
            })?;
            let report = banker_ops::run_scenario(&ctx, &scenario)?;
            Ok(OperationResult::ScenarioReport(report))
        }

        Commands::Run { scenario } => {
            let scenario = Scenario::load_from_file(&scenario).await?;
            let report = banker_ops::run_scenario(&ctx, &scenario)?;
            Ok(OperationResult::ScenarioReport(report))
        }

        Commands::Check { scenario } => {
            let scenario = Scenario::load_from_file(&scenario).await?;
            let report = banker_ops::check_scenario(&ctx, &scenario)?;
            Ok(OperationResult::SafetyReport(report))
        }

        Commands::Stress {
            scenario, workers, ..
        } => {
            let scenario = match scenario {
                Some(path) => Scenario::load_from_file(&path).await?,
                None => Scenario::textbook(),
            };
            if let Some(workers) = workers {
                check_worker_count(workers, &scenario)?;
            }
            let report = banker_ops::stress(&ctx, &scenario).await?;
            Ok(OperationResult::StressReport(report))
        }
    }
}

/// Each worker stands in for one process, so there cannot be more of them
fn check_worker_count(workers: usize, scenario: &Scenario) -> Result<(), CliError> {
    if workers == 0 || workers > scenario.processes() {
        return Err(CliError::InvalidArguments(format!(
            "--workers must be between 1 and {} for scenario {}",
            scenario.processes(),
            scenario.name
        )));
    }
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool, log_dir: Option<&Path>) {
    // Check if debug logging is enabled
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;
    let debug_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,banker=debug"))
    };

    if debug_enabled {
        if let Some(log_dir) = log_dir {
            // Debug mode with a log directory: structured JSON logs to file
            match create_log_file(log_dir) {
                Ok((file, path)) => {
                    tracing_subscriber::fmt()
                        .json()
                        .with_writer(file)
                        .with_env_filter(debug_filter())
                        .init();
                    if !json_mode {
                        eprintln!("Debug logging enabled: {}", path.display());
                    }
                    return;
                }
                Err(e) if !json_mode => {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
                Err(_) => {}
            }
        }
    }

    if json_mode {
        // JSON mode: suppress all console output to avoid contaminating JSON
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else if debug_enabled {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(debug_filter())
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .init();
    }
}

fn create_log_file(log_dir: &Path) -> std::io::Result<(std::fs::File, std::path::PathBuf)> {
    std::fs::create_dir_all(log_dir)?;
    let log_file = log_dir.join(format!(
        "banker-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    let file = std::fs::File::create(&log_file)?;
    Ok((file, log_file))
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs, command: &Commands) {
    // Global CLI flags override everything
    if let Some(color) = global.color {
        config.general.color = color;
    }

    // Command-specific CLI flags
    if let Commands::Stress {
        workers,
        rounds,
        seed,
        ..
    } = command
    {
        if let Some(workers) = workers {
            config.stress.workers = *workers;
        }
        if let Some(rounds) = rounds {
            config.stress.rounds = *rounds;
        }
        if let Some(seed) = seed {
            config.stress.seed = *seed;
        }
    }
}
