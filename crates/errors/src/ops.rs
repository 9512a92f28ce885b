//! Operation orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpsError {
    #[error("scenario {name} failed at step {step}: {message}")]
    ScenarioFailed {
        name: String,
        step: usize,
        message: String,
    },

    #[error("stress run failed: {message}")]
    StressFailed { message: String },

    #[error("worker task failed: {message}")]
    TaskJoin { message: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },

    #[error("missing component: {component}")]
    MissingComponent { component: String },
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ScenarioFailed { .. } => Some("Fix the failing step in the scenario file."),
            Self::StressFailed { .. } => Some("Run again with --debug to capture the allocator log."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::TaskJoin { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::ScenarioFailed { .. } => "ops.scenario_failed",
            Self::StressFailed { .. } => "ops.stress_failed",
            Self::TaskJoin { .. } => "ops.task_join",
            Self::SerializationError { .. } => "ops.serialization",
            Self::MissingComponent { .. } => "ops.missing_component",
        })
    }
}
