//! Concurrency-safe allocation façade
//!
//! [`AllocationManager`] is the only way to mutate a [`ResourceState`]. A
//! single mutex guards the whole state; every request, release and snapshot
//! holds the guard from validation through the safety check to commit or
//! rollback, so no caller ever observes a tentative allocation.
//!
//! Allocator events are sent before the guard is released. The channel is
//! unbounded so sending never blocks, and the event stream follows the
//! order in which operations were serialized by the lock.

use crate::safety::{SafetyChecker, SafetyVerdict};
use crate::state::{first_excess, ResourceState};
use banker_errors::AllocationError;
use banker_events::{AllocationEvent, EventEmitter, EventSender};
use banker_types::{
    DenialReason, GrantResult, ProcessId, ResourceTypeId, StateSnapshot, Units,
};
use parking_lot::{Mutex, MutexGuard};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Banker's-algorithm allocator shared between threads
///
/// Wrap it in an `Arc` to share it; all operations take `&self`.
#[derive(Debug, Default)]
pub struct AllocationManager {
    state: OnceLock<Mutex<ResourceState>>,
    tx: Option<EventSender>,
}

impl AllocationManager {
    /// Create an allocator that still needs [`AllocationManager::initialize`]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and initialize an allocator in one step
    ///
    /// # Errors
    ///
    /// Returns an error if the declarations are malformed; see
    /// [`AllocationManager::initialize`].
    pub fn with_resources(
        total: Vec<Units>,
        max_need: Vec<Vec<Units>>,
    ) -> Result<Self, AllocationError> {
        let manager = Self::new();
        manager.initialize(total, max_need)?;
        Ok(manager)
    }

    /// Attach an event channel; allocator events are emitted by each operation
    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// One-time setup: `available = total`, `need = max_need`, nothing allocated
    ///
    /// P is `max_need.len()` and R is `total.len()`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInitialized` on a second call (the existing state is
    /// kept), `DimensionMismatch` for ragged `max_need` rows and
    /// `MaxNeedExceedsTotal` if a process declares more than exists.
    pub fn initialize(
        &self,
        total: Vec<Units>,
        max_need: Vec<Vec<Units>>,
    ) -> Result<(), AllocationError> {
        if self.state.get().is_some() {
            return Err(AllocationError::AlreadyInitialized);
        }

        let state = ResourceState::new(total, max_need)?;
        let event = AllocationEvent::Initialized {
            processes: state.processes(),
            resource_types: state.resource_types(),
            total: state.total().to_vec(),
        };
        self.state
            .set(Mutex::new(state))
            .map_err(|_| AllocationError::AlreadyInitialized)?;

        info!(?event, "allocator initialized");
        self.emit_allocation(event);
        Ok(())
    }

    /// Whether [`AllocationManager::initialize`] has completed
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    /// `(P, R)` once initialized
    #[must_use]
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        let state = self.state.get()?.lock();
        Some((state.processes(), state.resource_types()))
    }

    /// Ask for `req` more units on behalf of `pid`
    ///
    /// The request is granted only if it stays within the process's
    /// remaining need, fits in the free pool, and leaves the system safe.
    /// A denial leaves the state exactly as it was; the call never waits
    /// for resources to free up.
    ///
    /// # Errors
    ///
    /// Returns an error only for contract violations: the allocator is not
    /// initialized, `pid` is unknown, or `req` does not have one entry per
    /// resource type. Nothing is mutated in that case.
    pub fn request(&self, pid: ProcessId, req: &[Units]) -> Result<GrantResult, AllocationError> {
        let mut state = self.lock()?;
        state.check_process(pid)?;
        state.check_amounts("request", req)?;
        let result = Self::try_grant(&mut state, pid, req);

        match &result {
            GrantResult::Granted { safe_sequence } => {
                let available = state.available().to_vec();
                debug!(process = %pid, ?req, %safe_sequence, ?available, "request granted");
                self.emit_allocation(AllocationEvent::Granted {
                    process: pid,
                    amounts: req.to_vec(),
                    safe_sequence: safe_sequence.clone(),
                    available,
                });
            }
            GrantResult::Denied { reason } => {
                debug!(process = %pid, ?req, reason = reason.code(), "request denied");
                self.emit_allocation(AllocationEvent::Denied {
                    process: pid,
                    amounts: req.to_vec(),
                    reason: *reason,
                });
            }
        }

        Ok(result)
    }

    /// Validate, tentatively apply, check, then commit or roll back
    fn try_grant(state: &mut ResourceState, pid: ProcessId, req: &[Units]) -> GrantResult {
        if let Some(j) = first_excess(req, state.need(pid)) {
            debug!(process = %pid, resource = %ResourceTypeId(j), "request exceeds remaining need");
            return GrantResult::Denied {
                reason: DenialReason::ExceedsDeclaredNeed,
            };
        }
        if let Some(j) = first_excess(req, state.available()) {
            debug!(process = %pid, resource = %ResourceTypeId(j), "request exceeds free pool");
            return GrantResult::Denied {
                reason: DenialReason::InsufficientAvailable,
            };
        }

        state.apply_allocation(pid, req);
        match SafetyChecker::check(state) {
            SafetyVerdict::Safe(safe_sequence) => GrantResult::Granted { safe_sequence },
            SafetyVerdict::Unsafe { blocked } => {
                state.undo_allocation(pid, req);
                debug!(process = %pid, ?blocked, "tentative allocation rolled back");
                GrantResult::Denied {
                    reason: DenialReason::DeadlockRisk,
                }
            }
        }
    }

    /// Return `rel` units held by `pid` to the pool
    ///
    /// Releasing never needs a safety check: a larger free pool can only
    /// keep a safe state safe.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRelease` if `pid` holds less than `rel` of any type,
    /// plus the same contract errors as [`AllocationManager::request`].
    /// Nothing is mutated on error.
    pub fn release(&self, pid: ProcessId, rel: &[Units]) -> Result<(), AllocationError> {
        let mut state = self.lock()?;
        state.check_process(pid)?;
        state.check_amounts("release", rel)?;

        let outcome = match first_excess(rel, state.allocated(pid)) {
            Some(j) => Err(AllocationError::InvalidRelease {
                process: pid.index(),
                resource: j,
                requested: rel[j],
                held: state.allocated(pid)[j],
            }),
            None => {
                state.apply_release(pid, rel);
                Ok(state.available().to_vec())
            }
        };

        match outcome {
            Ok(available) => {
                debug!(process = %pid, ?rel, ?available, "resources released");
                self.emit_allocation(AllocationEvent::Released {
                    process: pid,
                    amounts: rel.to_vec(),
                    available,
                });
                Ok(())
            }
            Err(err) => {
                warn!(process = %pid, ?rel, error = %err, "release rejected");
                self.emit_allocation(AllocationEvent::ReleaseRejected {
                    process: pid,
                    amounts: rel.to_vec(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Release everything `pid` holds, returning the amounts
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` or `UnknownProcess`.
    pub fn release_all(&self, pid: ProcessId) -> Result<Vec<Units>, AllocationError> {
        let mut state = self.lock()?;
        state.check_process(pid)?;
        let held = state.allocated(pid).to_vec();
        state.apply_release(pid, &held);
        let available = state.available().to_vec();

        debug!(process = %pid, ?held, ?available, "process released all resources");
        self.emit_allocation(AllocationEvent::Released {
            process: pid,
            amounts: held.clone(),
            available,
        });
        Ok(held)
    }

    /// Consistent copy of the current state
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before initialization.
    pub fn snapshot(&self) -> Result<StateSnapshot, AllocationError> {
        Ok(self.lock()?.snapshot())
    }

    /// Run the safety check against the current state
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before initialization.
    pub fn check_safety(&self) -> Result<SafetyVerdict, AllocationError> {
        let state = self.lock()?;
        Ok(SafetyChecker::check(&state))
    }

    /// Run a read-only closure against the state under the lock
    ///
    /// Meant for invariant checks in tests and diagnostics; the closure must
    /// not block.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` before initialization.
    pub fn inspect<T>(&self, f: impl FnOnce(&ResourceState) -> T) -> Result<T, AllocationError> {
        let state = self.lock()?;
        Ok(f(&state))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ResourceState>, AllocationError> {
        self.state
            .get()
            .map(|state| state.lock())
            .ok_or(AllocationError::NotInitialized)
    }
}

impl EventEmitter for AllocationManager {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}
