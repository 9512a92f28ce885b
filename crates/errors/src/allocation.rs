//! Allocation error types
//!
//! These are caller bugs or contract violations. Denials of well-formed
//! requests (insufficient supply, deadlock risk, exceeding the declared
//! maximum) are not errors; they are reported through `GrantResult`.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum AllocationError {
    #[error(
        "invalid release by P{process}: {requested} units of R{resource} requested, {held} held"
    )]
    InvalidRelease {
        process: usize,
        resource: usize,
        requested: u32,
        held: u32,
    },

    #[error("allocator used before initialization")]
    NotInitialized,

    #[error("allocator already initialized")]
    AlreadyInitialized,

    #[error("unknown process P{process} (allocator tracks {processes} processes)")]
    UnknownProcess { process: usize, processes: usize },

    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("P{process} declares {max_need} units of R{resource} but only {total} exist")]
    MaxNeedExceedsTotal {
        process: usize,
        resource: usize,
        max_need: u32,
        total: u32,
    },
}

impl AllocationError {
    /// Create a dimension mismatch error
    pub fn dimension(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }
}

impl UserFacingError for AllocationError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidRelease { .. } => {
                Some("A process can only release resources it currently holds.")
            }
            Self::NotInitialized => Some("Initialize the allocator with totals and maximum needs first."),
            Self::AlreadyInitialized => Some("Create a new allocator to model a different system."),
            Self::UnknownProcess { .. } | Self::DimensionMismatch { .. } => {
                Some("Check that process ids and vector lengths match the resource table.")
            }
            Self::MaxNeedExceedsTotal { .. } => {
                Some("Lower the declared maximum need or raise the total supply.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::InvalidRelease { .. } => "allocation.invalid_release",
            Self::NotInitialized => "allocation.not_initialized",
            Self::AlreadyInitialized => "allocation.already_initialized",
            Self::UnknownProcess { .. } => "allocation.unknown_process",
            Self::DimensionMismatch { .. } => "allocation.dimension_mismatch",
            Self::MaxNeedExceedsTotal { .. } => "allocation.max_need_exceeds_total",
        })
    }
}
