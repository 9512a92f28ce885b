//! Report type definitions for operations

use crate::{DenialReason, GrantResult, ProcessId, SafeSequence, StateSnapshot, Units};
use serde::{Deserialize, Serialize};

/// Kind of a scripted allocator call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    Request,
    Release,
}

impl std::fmt::Display for StepAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Release => write!(f, "release"),
        }
    }
}

/// What happened to one scripted call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Granted { safe_sequence: SafeSequence },
    Denied { reason: DenialReason },
    Released,
    /// The allocator rejected the call as a caller error
    Rejected { code: Option<String>, message: String },
}

impl From<GrantResult> for StepOutcome {
    fn from(result: GrantResult) -> Self {
        match result {
            GrantResult::Granted { safe_sequence } => Self::Granted { safe_sequence },
            GrantResult::Denied { reason } => Self::Denied { reason },
        }
    }
}

impl StepOutcome {
    /// Whether the allocator state changed as a result of this step
    #[must_use]
    pub fn mutated(&self) -> bool {
        matches!(self, Self::Granted { .. } | Self::Released)
    }
}

/// Result of a single scripted step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    /// Position in the scenario, starting at 1
    pub index: usize,
    pub process: ProcessId,
    pub action: StepAction,
    pub amounts: Vec<Units>,
    pub outcome: StepOutcome,
    /// Committed state after the step
    pub state: StateSnapshot,
}

/// Safety evaluation of one resource table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyReport {
    pub safe: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_sequence: Option<SafeSequence>,
    /// Processes that cannot complete when the state is unsafe
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked: Vec<ProcessId>,
    pub state: StateSnapshot,
}

/// Result of playing a scenario against a fresh allocator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    /// Safety of the freshly initialized table
    pub initial: SafetyReport,
    pub steps: Vec<StepReport>,
    pub final_state: StateSnapshot,
    pub duration_ms: u64,
}

impl ScenarioReport {
    /// Number of steps whose request was granted
    #[must_use]
    pub fn granted(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step.outcome, StepOutcome::Granted { .. }))
            .count()
    }

    /// Number of steps denied for the given reason
    #[must_use]
    pub fn denied(&self, reason: DenialReason) -> usize {
        self.steps
            .iter()
            .filter(|step| step.outcome == StepOutcome::Denied { reason })
            .count()
    }
}

/// Per-worker counters of a stress run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkerReport {
    pub process: ProcessId,
    pub rounds_completed: u64,
    pub granted: u64,
    pub denied_exceeds_need: u64,
    pub denied_insufficient: u64,
    pub denied_deadlock_risk: u64,
    pub releases: u64,
    /// Rounds abandoned after exhausting the retry budget
    pub gave_up: u64,
}

impl WorkerReport {
    #[must_use]
    pub fn new(process: ProcessId) -> Self {
        Self {
            process,
            ..Self::default()
        }
    }

    /// Count one request outcome
    pub fn record(&mut self, result: &GrantResult) {
        match result.denial() {
            None => self.granted += 1,
            Some(DenialReason::ExceedsDeclaredNeed) => self.denied_exceeds_need += 1,
            Some(DenialReason::InsufficientAvailable) => self.denied_insufficient += 1,
            Some(DenialReason::DeadlockRisk) => self.denied_deadlock_risk += 1,
        }
    }

    #[must_use]
    pub fn denied(&self) -> u64 {
        self.denied_exceeds_need + self.denied_insufficient + self.denied_deadlock_risk
    }
}

/// Result of a concurrent stress run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressReport {
    pub seed: u64,
    pub rounds: u64,
    pub workers: Vec<WorkerReport>,
    pub final_state: StateSnapshot,
    /// Whether the final state satisfied every allocator invariant
    pub invariants_held: bool,
    pub duration_ms: u64,
}

impl StressReport {
    #[must_use]
    pub fn total_granted(&self) -> u64 {
        self.workers.iter().map(|w| w.granted).sum()
    }

    #[must_use]
    pub fn total_denied(&self) -> u64 {
        self.workers.iter().map(WorkerReport::denied).sum()
    }

    #[must_use]
    pub fn total_releases(&self) -> u64 {
        self.workers.iter().map(|w| w.releases).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_report_record() {
        let mut report = WorkerReport::new(ProcessId(3));
        report.record(&GrantResult::Granted {
            safe_sequence: SafeSequence::default(),
        });
        report.record(&GrantResult::Denied {
            reason: DenialReason::DeadlockRisk,
        });
        report.record(&GrantResult::Denied {
            reason: DenialReason::InsufficientAvailable,
        });

        assert_eq!(report.granted, 1);
        assert_eq!(report.denied_deadlock_risk, 1);
        assert_eq!(report.denied_insufficient, 1);
        assert_eq!(report.denied(), 2);
    }

    #[test]
    fn test_step_outcome_mutation() {
        assert!(StepOutcome::Released.mutated());
        assert!(!StepOutcome::Denied {
            reason: DenialReason::ExceedsDeclaredNeed
        }
        .mutated());
    }
}
