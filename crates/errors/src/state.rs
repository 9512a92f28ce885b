//! Resource state error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateError {
    #[error("state invariant violated: {message}")]
    InvariantViolated { message: String },

    #[error("state is unsafe: processes {blocked} cannot complete")]
    Unsafe { blocked: String },
}

impl UserFacingError for StateError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvariantViolated { .. } => Some("This is a bug in the allocator; please report it."),
            Self::Unsafe { .. } => {
                Some("Reduce the initial allocations or raise the total supply.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::InvariantViolated { .. } => "state.invariant_violated",
            Self::Unsafe { .. } => "state.unsafe",
        })
    }
}
