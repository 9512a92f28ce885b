//! Configuration sections shared by the CLI and the operations layer

use banker_types::{ColorChoice, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

/// Stress run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressConfig {
    /// Concurrent clients, each acting as one process; 0 = one per process
    #[serde(default)]
    pub workers: usize,
    /// Completed request/release cycles per worker
    #[serde(default = "default_rounds")]
    pub rounds: usize,
    /// Seed for the per-worker random generators
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Denied requests a worker retries before giving up on a round
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            rounds: default_rounds(),
            seed: default_seed(),
            max_retries: default_max_retries(),
        }
    }
}

impl StressConfig {
    /// Worker count for a table with `processes` rows
    #[must_use]
    pub fn effective_workers(&self, processes: usize) -> usize {
        if self.workers == 0 {
            processes
        } else {
            self.workers.min(processes)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Directory for `--debug` log files; stderr when unset
    pub log_dir: Option<PathBuf>,
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_rounds() -> usize {
    100
}

fn default_seed() -> u64 {
    42
}

fn default_max_retries() -> u32 {
    50
}
