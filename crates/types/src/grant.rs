//! Results of allocation requests

use crate::ProcessId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a well-formed request was not granted
///
/// None of these mutate the allocator; a denial leaves the state exactly as
/// it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The request is larger than the process's remaining declared need
    ExceedsDeclaredNeed,
    /// The request is larger than the currently free supply
    InsufficientAvailable,
    /// Granting would leave no safe completion order
    DeadlockRisk,
}

impl DenialReason {
    /// Whether the same request may succeed later without the caller changing it
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::InsufficientAvailable | Self::DeadlockRisk)
    }

    /// Stable short code for structured output
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ExceedsDeclaredNeed => "exceeds_declared_need",
            Self::InsufficientAvailable => "insufficient_available",
            Self::DeadlockRisk => "deadlock_risk",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExceedsDeclaredNeed => write!(f, "request exceeds declared need"),
            Self::InsufficientAvailable => write!(f, "insufficient available resources"),
            Self::DeadlockRisk => write!(f, "request could lead to deadlock"),
        }
    }
}

/// Order in which every process can run to completion
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SafeSequence(Vec<ProcessId>);

impl SafeSequence {
    /// Wrap an ordering produced by the safety check
    #[must_use]
    pub fn new(order: Vec<ProcessId>) -> Self {
        Self(order)
    }

    /// Process ids in completion order
    #[must_use]
    pub fn as_slice(&self) -> &[ProcessId] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProcessId> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<ProcessId> {
        self.0
    }
}

impl fmt::Display for SafeSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for pid in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{pid}")?;
            first = false;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a SafeSequence {
    type Item = &'a ProcessId;
    type IntoIter = std::slice::Iter<'a, ProcessId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Outcome of `AllocationManager::request`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum GrantResult {
    /// The allocation was committed; the sequence witnesses the new safe state
    Granted { safe_sequence: SafeSequence },
    /// The allocation was refused and nothing changed
    Denied { reason: DenialReason },
}

impl GrantResult {
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    /// Denial reason, if the request was refused
    #[must_use]
    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Granted { .. } => None,
            Self::Denied { reason } => Some(*reason),
        }
    }

    /// Safe sequence, if the request was granted
    #[must_use]
    pub fn safe_sequence(&self) -> Option<&SafeSequence> {
        match self {
            Self::Granted { safe_sequence } => Some(safe_sequence),
            Self::Denied { .. } => None,
        }
    }
}

impl fmt::Display for GrantResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted { safe_sequence } => write!(f, "granted (safe sequence: {safe_sequence})"),
            Self::Denied { reason } => write!(f, "denied: {reason}"),
        }
    }
}
