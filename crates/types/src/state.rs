//! Read-only view of the allocator state

use crate::{ProcessId, Units};
use serde::{Deserialize, Serialize};

/// Immutable copy of the allocator matrices for reporting layers
///
/// A snapshot is taken under the allocator lock, so it always describes a
/// committed state. Holding one grants no mutation rights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Fixed total supply per resource type
    pub total: Vec<Units>,
    /// Currently unallocated supply
    pub available: Vec<Units>,
    /// Units held by each process
    pub allocated: Vec<Vec<Units>>,
    /// Declared maximum of each process
    pub max_need: Vec<Vec<Units>>,
    /// Remaining need of each process (`max_need - allocated`)
    pub need: Vec<Vec<Units>>,
}

impl StateSnapshot {
    /// Number of processes (P)
    #[must_use]
    pub fn processes(&self) -> usize {
        self.allocated.len()
    }

    /// Number of resource types (R)
    #[must_use]
    pub fn resource_types(&self) -> usize {
        self.total.len()
    }

    /// Units of every type currently held by any process
    #[must_use]
    pub fn allocated_totals(&self) -> Vec<Units> {
        let mut sums = vec![0; self.resource_types()];
        for row in &self.allocated {
            for (sum, held) in sums.iter_mut().zip(row) {
                *sum += held;
            }
        }
        sums
    }

    /// Whether `available + Σ allocated == total` for every resource type
    #[must_use]
    pub fn is_conserved(&self) -> bool {
        self.allocated_totals()
            .iter()
            .zip(&self.available)
            .zip(&self.total)
            .all(|((held, free), total)| held + free == *total)
    }

    /// Processes currently holding at least one unit
    #[must_use]
    pub fn holders(&self) -> Vec<ProcessId> {
        self.allocated
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|units| *units > 0))
            .map(|(index, _)| ProcessId(index))
            .collect()
    }
}
