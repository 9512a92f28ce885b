//! Resource matrices and their mutation primitives
//!
//! [`ResourceState`] holds the authoritative total/available/allocated/
//! max-need/need tables. The mutators are crate-private and unchecked: the
//! allocation manager validates every delta before calling them, and they are
//! never a public safety boundary.

use banker_errors::{AllocationError, Error, StateError};
use banker_types::{ProcessId, StateSnapshot, Units};

/// Allocation tables for P processes and R resource types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceState {
    total: Vec<Units>,
    available: Vec<Units>,
    allocated: Vec<Vec<Units>>,
    max_need: Vec<Vec<Units>>,
    need: Vec<Vec<Units>>,
}

impl ResourceState {
    /// Create the initial state: nothing allocated, need equals max need
    ///
    /// # Errors
    ///
    /// Returns an error if a `max_need` row does not have one entry per
    /// resource type, or declares more of a type than exists in total.
    pub fn new(total: Vec<Units>, max_need: Vec<Vec<Units>>) -> Result<Self, AllocationError> {
        validate_declarations(&total, &max_need)?;

        let allocated = vec![vec![0; total.len()]; max_need.len()];
        let need = max_need.clone();
        Ok(Self {
            available: total.clone(),
            total,
            allocated,
            max_need,
            need,
        })
    }

    /// Build a state that already has resources allocated
    ///
    /// Used to evaluate arbitrary tables; the allocation manager always starts
    /// from [`ResourceState::new`].
    ///
    /// # Errors
    ///
    /// Returns an allocation error for malformed dimensions or declarations,
    /// and a state error if the allocation exceeds a declared maximum or the
    /// total supply.
    pub fn from_parts(
        total: Vec<Units>,
        max_need: Vec<Vec<Units>>,
        allocated: Vec<Vec<Units>>,
    ) -> Result<Self, Error> {
        validate_declarations(&total, &max_need)?;
        if allocated.len() != max_need.len() {
            return Err(AllocationError::dimension("allocated", max_need.len(), allocated.len()).into());
        }

        let mut available = total.clone();
        let mut need = max_need.clone();
        for (i, row) in allocated.iter().enumerate() {
            if row.len() != total.len() {
                return Err(AllocationError::dimension(
                    format!("allocated row of P{i}"),
                    total.len(),
                    row.len(),
                )
                .into());
            }
            for (j, &held) in row.iter().enumerate() {
                need[i][j] = max_need[i][j].checked_sub(held).ok_or_else(|| {
                    StateError::InvariantViolated {
                        message: format!(
                            "P{i} holds {held} units of R{j} but declares at most {}",
                            max_need[i][j]
                        ),
                    }
                })?;
                available[j] = available[j].checked_sub(held).ok_or_else(|| {
                    StateError::InvariantViolated {
                        message: format!("R{j} is allocated beyond its total of {}", total[j]),
                    }
                })?;
            }
        }

        Ok(Self {
            total,
            available,
            allocated,
            max_need,
            need,
        })
    }

    /// Number of processes (P)
    #[must_use]
    pub fn processes(&self) -> usize {
        self.max_need.len()
    }

    /// Number of resource types (R)
    #[must_use]
    pub fn resource_types(&self) -> usize {
        self.total.len()
    }

    #[must_use]
    pub fn total(&self) -> &[Units] {
        &self.total
    }

    #[must_use]
    pub fn available(&self) -> &[Units] {
        &self.available
    }

    /// Units currently held by `pid`
    ///
    /// # Panics
    ///
    /// Panics if `pid` is out of range; see [`ResourceState::check_process`].
    #[must_use]
    pub fn allocated(&self, pid: ProcessId) -> &[Units] {
        &self.allocated[pid.index()]
    }

    /// Remaining need of `pid`
    ///
    /// # Panics
    ///
    /// Panics if `pid` is out of range.
    #[must_use]
    pub fn need(&self, pid: ProcessId) -> &[Units] {
        &self.need[pid.index()]
    }

    /// Declared maximum of `pid`
    ///
    /// # Panics
    ///
    /// Panics if `pid` is out of range.
    #[must_use]
    pub fn max_need(&self, pid: ProcessId) -> &[Units] {
        &self.max_need[pid.index()]
    }

    /// Ensure `pid` names one of the tracked processes
    ///
    /// # Errors
    ///
    /// Returns `UnknownProcess` if `pid` is outside `0..P`.
    pub fn check_process(&self, pid: ProcessId) -> Result<(), AllocationError> {
        if pid.index() < self.processes() {
            Ok(())
        } else {
            Err(AllocationError::UnknownProcess {
                process: pid.index(),
                processes: self.processes(),
            })
        }
    }

    /// Ensure `amounts` has exactly one entry per resource type
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` naming `what` otherwise.
    pub fn check_amounts(&self, what: &str, amounts: &[Units]) -> Result<(), AllocationError> {
        if amounts.len() == self.resource_types() {
            Ok(())
        } else {
            Err(AllocationError::dimension(what, self.resource_types(), amounts.len()))
        }
    }

    /// `available -= delta; allocated[pid] += delta; need[pid] -= delta`
    pub(crate) fn apply_allocation(&mut self, pid: ProcessId, delta: &[Units]) {
        let i = pid.index();
        for (j, &units) in delta.iter().enumerate() {
            debug_assert!(units <= self.available[j] && units <= self.need[i][j]);
            self.available[j] -= units;
            self.allocated[i][j] += units;
            self.need[i][j] -= units;
        }
    }

    /// Exact inverse of [`ResourceState::apply_allocation`]
    pub(crate) fn undo_allocation(&mut self, pid: ProcessId, delta: &[Units]) {
        let i = pid.index();
        for (j, &units) in delta.iter().enumerate() {
            debug_assert!(units <= self.allocated[i][j]);
            self.allocated[i][j] -= units;
            self.available[j] += units;
            self.need[i][j] += units;
        }
    }

    /// `allocated[pid] -= delta; available += delta; need[pid] += delta`
    pub(crate) fn apply_release(&mut self, pid: ProcessId, delta: &[Units]) {
        let i = pid.index();
        for (j, &units) in delta.iter().enumerate() {
            debug_assert!(units <= self.allocated[i][j]);
            self.allocated[i][j] -= units;
            self.available[j] += units;
            self.need[i][j] += units;
        }
    }

    /// Immutable copy for reporting layers
    #[must_use]
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            total: self.total.clone(),
            available: self.available.clone(),
            allocated: self.allocated.clone(),
            max_need: self.max_need.clone(),
            need: self.need.clone(),
        }
    }

    /// Check conservation, bounds and need consistency
    ///
    /// # Errors
    ///
    /// Returns `InvariantViolated` describing the first broken invariant.
    pub fn verify_invariants(&self) -> Result<(), StateError> {
        let violated = |message: String| Err(StateError::InvariantViolated { message });

        for j in 0..self.resource_types() {
            let held: u64 = self.allocated.iter().map(|row| u64::from(row[j])).sum();
            if held + u64::from(self.available[j]) != u64::from(self.total[j]) {
                return violated(format!(
                    "R{j}: available {} + allocated {held} != total {}",
                    self.available[j], self.total[j]
                ));
            }
        }

        for i in 0..self.processes() {
            for j in 0..self.resource_types() {
                let (held, max) = (self.allocated[i][j], self.max_need[i][j]);
                if held > max {
                    return violated(format!("P{i} holds {held} of R{j}, above its maximum {max}"));
                }
                if self.need[i][j] != max - held {
                    return violated(format!(
                        "P{i} need for R{j} is {} but max {max} - allocated {held} = {}",
                        self.need[i][j],
                        max - held
                    ));
                }
            }
        }

        Ok(())
    }
}

/// First resource type where `amounts` is larger than `limit`
pub(crate) fn first_excess(amounts: &[Units], limit: &[Units]) -> Option<usize> {
    amounts
        .iter()
        .zip(limit)
        .position(|(wanted, bound)| wanted > bound)
}

fn validate_declarations(total: &[Units], max_need: &[Vec<Units>]) -> Result<(), AllocationError> {
    for (i, row) in max_need.iter().enumerate() {
        if row.len() != total.len() {
            return Err(AllocationError::dimension(
                format!("max_need row of P{i}"),
                total.len(),
                row.len(),
            ));
        }
        if let Some(j) = first_excess(row, total) {
            return Err(AllocationError::MaxNeedExceedsTotal {
                process: i,
                resource: j,
                max_need: row[j],
                total: total[j],
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ResourceState {
        ResourceState::new(vec![6, 4], vec![vec![4, 2], vec![3, 3]]).unwrap()
    }

    #[test]
    fn test_new_starts_unallocated() {
        let state = small();
        assert_eq!(state.processes(), 2);
        assert_eq!(state.resource_types(), 2);
        assert_eq!(state.available(), &[6, 4]);
        assert_eq!(state.allocated(ProcessId(1)), &[0, 0]);
        assert_eq!(state.need(ProcessId(1)), &[3, 3]);
        state.verify_invariants().unwrap();
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let err = ResourceState::new(vec![6, 4], vec![vec![4, 2], vec![3]]).unwrap_err();
        assert_eq!(
            err,
            AllocationError::DimensionMismatch {
                what: "max_need row of P1".to_string(),
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn test_new_rejects_max_need_above_total() {
        let err = ResourceState::new(vec![6, 4], vec![vec![7, 2]]).unwrap_err();
        assert!(matches!(
            err,
            AllocationError::MaxNeedExceedsTotal {
                process: 0,
                resource: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_apply_and_undo_are_inverse() {
        let mut state = small();
        let before = state.clone();

        state.apply_allocation(ProcessId(0), &[1, 1]);
        assert_eq!(state.available(), &[5, 3]);
        assert_eq!(state.allocated(ProcessId(0)), &[1, 1]);
        assert_eq!(state.need(ProcessId(0)), &[3, 1]);
        state.verify_invariants().unwrap();

        state.undo_allocation(ProcessId(0), &[1, 1]);
        assert_eq!(state, before);
    }

    #[test]
    fn test_apply_release() {
        let mut state = small();
        state.apply_allocation(ProcessId(1), &[2, 1]);
        state.apply_release(ProcessId(1), &[1, 0]);
        assert_eq!(state.allocated(ProcessId(1)), &[1, 1]);
        assert_eq!(state.need(ProcessId(1)), &[2, 2]);
        assert_eq!(state.available(), &[5, 3]);
        state.verify_invariants().unwrap();
    }

    #[test]
    fn test_from_parts_derives_available_and_need() {
        let state = ResourceState::from_parts(
            vec![10, 5, 7],
            vec![vec![7, 5, 3], vec![3, 2, 2]],
            vec![vec![0, 1, 0], vec![2, 0, 0]],
        )
        .unwrap();
        assert_eq!(state.available(), &[8, 4, 7]);
        assert_eq!(state.need(ProcessId(0)), &[7, 4, 3]);
        assert_eq!(state.need(ProcessId(1)), &[1, 2, 2]);
        state.verify_invariants().unwrap();
    }

    #[test]
    fn test_from_parts_rejects_over_allocation() {
        let err = ResourceState::from_parts(
            vec![4],
            vec![vec![3], vec![3]],
            vec![vec![3], vec![2]],
        )
        .unwrap_err();
        assert!(matches!(err, Error::State(StateError::InvariantViolated { .. })));

        let err = ResourceState::from_parts(vec![4], vec![vec![1]], vec![vec![2]]).unwrap_err();
        assert!(matches!(err, Error::State(StateError::InvariantViolated { .. })));
    }

    #[test]
    fn test_check_process_and_amounts() {
        let state = small();
        assert!(state.check_process(ProcessId(1)).is_ok());
        assert_eq!(
            state.check_process(ProcessId(2)),
            Err(AllocationError::UnknownProcess {
                process: 2,
                processes: 2
            })
        );
        assert!(state.check_amounts("request", &[0, 0]).is_ok());
        assert!(state.check_amounts("request", &[0, 0, 0]).is_err());
    }

    #[test]
    fn test_verify_invariants_detects_drift() {
        let mut state = small();
        state.available[0] += 1;
        assert!(matches!(
            state.verify_invariants(),
            Err(StateError::InvariantViolated { .. })
        ));
    }

    #[test]
    fn test_first_excess() {
        assert_eq!(first_excess(&[1, 2, 3], &[1, 2, 3]), None);
        assert_eq!(first_excess(&[1, 3, 4], &[1, 2, 3]), Some(1));
    }
}
