use banker_types::{DenialReason, ProcessId, SafeSequence, Units};
use serde::{Deserialize, Serialize};

/// Allocator state transitions and refusals
///
/// Sent while the allocator still holds its lock, so the order of events on
/// the channel matches the order in which operations committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AllocationEvent {
    /// Allocator sized and ready
    Initialized {
        processes: usize,
        resource_types: usize,
        total: Vec<Units>,
    },

    /// Request committed
    Granted {
        process: ProcessId,
        amounts: Vec<Units>,
        safe_sequence: SafeSequence,
        available: Vec<Units>,
    },

    /// Request refused, state unchanged
    Denied {
        process: ProcessId,
        amounts: Vec<Units>,
        reason: DenialReason,
    },

    /// Resources returned to the pool
    Released {
        process: ProcessId,
        amounts: Vec<Units>,
        available: Vec<Units>,
    },

    /// Release refused because the process does not hold the amounts
    ReleaseRejected {
        process: ProcessId,
        amounts: Vec<Units>,
        message: String,
    },
}

impl AllocationEvent {
    /// Process the event concerns, if any
    #[must_use]
    pub fn process(&self) -> Option<ProcessId> {
        match self {
            Self::Initialized { .. } => None,
            Self::Granted { process, .. }
            | Self::Denied { process, .. }
            | Self::Released { process, .. }
            | Self::ReleaseRejected { process, .. } => Some(*process),
        }
    }
}
