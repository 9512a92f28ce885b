//! Command line interface definition

use banker_types::ColorChoice;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// banker - Deadlock-avoiding resource allocator
#[derive(Parser)]
#[command(name = "banker")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deadlock-avoiding resource allocator built on the Banker's algorithm")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging (to the configured log directory, else stderr)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Built-in demonstration tables
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Demo {
    /// Three processes over {10, 5, 7}, ending in a refused request
    Classic,
    /// Two processes over {6, 4}
    Small,
}

impl Demo {
    pub fn name(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Small => "small",
        }
    }
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Replay one of the built-in demonstration scenarios
    Demo {
        #[arg(value_enum, default_value_t = Demo::Classic)]
        which: Demo,
    },

    /// Replay a scenario file, printing the state after every step
    Run {
        /// Path to the scenario file (.toml)
        scenario: PathBuf,
    },

    /// Check whether a scenario's table is in a safe state
    Check {
        /// Path to the scenario file (.toml)
        scenario: PathBuf,
    },

    /// Hammer one allocator from concurrent workers and verify its invariants
    Stress {
        /// Scenario whose table to use (default: the five-process textbook table)
        scenario: Option<PathBuf>,

        /// Number of concurrent workers, at most one per process
        #[arg(short, long)]
        workers: Option<usize>,

        /// Rounds per worker
        #[arg(short, long)]
        rounds: Option<usize>,

        /// Seed for the workers' random generators
        #[arg(short, long)]
        seed: Option<u64>,
    },
}
