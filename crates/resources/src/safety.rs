//! Banker's algorithm safety check
//!
//! The checker simulates processes running to completion one at a time. On
//! every pass it scans processes in ascending id order and picks the lowest
//! unfinished id whose remaining need fits in the simulated free pool; that
//! process finishes, returns its allocation to the pool, and the next pass
//! starts again from id 0. A pass that finds no candidate means the state is
//! unsafe.
//!
//! The scanning policy makes the verdict and the sequence a pure function of
//! the state: checking the same state twice always yields the same answer.
//! Work is O(P² · R) with no allocation beyond the scratch vectors, so it is
//! cheap enough to run under the allocator lock.

use crate::state::{first_excess, ResourceState};
use banker_types::{ProcessId, SafeSequence};
use tracing::trace;

/// Verdict of a safety check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafetyVerdict {
    /// Every process can finish in the given order
    Safe(SafeSequence),
    /// No completion order exists; `blocked` lists the processes left over
    Unsafe { blocked: Vec<ProcessId> },
}

impl SafetyVerdict {
    #[must_use]
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe(_))
    }

    #[must_use]
    pub fn safe_sequence(&self) -> Option<&SafeSequence> {
        match self {
            Self::Safe(sequence) => Some(sequence),
            Self::Unsafe { .. } => None,
        }
    }

    #[must_use]
    pub fn into_safe_sequence(self) -> Option<SafeSequence> {
        match self {
            Self::Safe(sequence) => Some(sequence),
            Self::Unsafe { .. } => None,
        }
    }
}

/// Stateless safety checker
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetyChecker;

impl SafetyChecker {
    /// Decide whether `state` admits a completion order for every process
    #[must_use]
    pub fn check(state: &ResourceState) -> SafetyVerdict {
        let processes = state.processes();
        let mut work = state.available().to_vec();
        let mut finished = vec![false; processes];
        let mut sequence = Vec::with_capacity(processes);

        for pass in 0..processes {
            let candidate = (0..processes).find(|&i| {
                !finished[i] && first_excess(state.need(ProcessId(i)), &work).is_none()
            });

            let Some(i) = candidate else {
                let blocked: Vec<ProcessId> = (0..processes)
                    .filter(|&i| !finished[i])
                    .map(ProcessId)
                    .collect();
                trace!(pass, ?blocked, ?work, "no process can finish");
                return SafetyVerdict::Unsafe { blocked };
            };

            let pid = ProcessId(i);
            for (free, held) in work.iter_mut().zip(state.allocated(pid)) {
                *free += held;
            }
            finished[i] = true;
            sequence.push(pid);
            trace!(pass, process = %pid, ?work, "simulated completion");
        }

        SafetyVerdict::Safe(SafeSequence::new(sequence))
    }

    /// Safe completion order, or `None` if the state is unsafe
    #[must_use]
    pub fn find_safe_sequence(state: &ResourceState) -> Option<SafeSequence> {
        Self::check(state).into_safe_sequence()
    }

    /// Whether `state` is safe
    #[must_use]
    pub fn is_safe(state: &ResourceState) -> bool {
        Self::check(state).is_safe()
    }
}
