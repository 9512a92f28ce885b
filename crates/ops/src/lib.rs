#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations for the banker allocator
//!
//! This crate sits between the CLI and the allocator core. Each operation
//! builds its own [`banker_resources::AllocationManager`], drives it, and
//! returns a serializable report; allocator events flow to the context's
//! event channel.

mod context;
mod scenario;
mod stress;

pub use context::{OpsContextBuilder, OpsCtx};
pub use scenario::{check_scenario, run_scenario};
pub use stress::stress;

use banker_errors::Error;
use banker_types::{SafetyReport, ScenarioReport, StressReport};
use std::time::Instant;

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Scenario replay
    ScenarioReport(ScenarioReport),
    /// Safety check of a table
    SafetyReport(SafetyReport),
    /// Concurrent stress run
    StressReport(StressReport),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            banker_errors::OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Check if this is a success result
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::ScenarioReport(_) => true,
            OperationResult::SafetyReport(report) => report.safe,
            OperationResult::StressReport(report) => report.invariants_held,
        }
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
