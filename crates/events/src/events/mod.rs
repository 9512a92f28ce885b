use serde::{Deserialize, Serialize};

pub mod allocation;
pub mod general;

pub use allocation::*;
pub use general::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General events (warnings, operation progress)
    General(GeneralEvent),

    /// Allocator events (grants, denials, releases)
    Allocation(AllocationEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::OperationFailed { .. })
            | Self::Allocation(AllocationEvent::ReleaseRejected { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. }) => Level::WARN,

            Self::Allocation(AllocationEvent::Denied { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "banker::events::general",
            Self::Allocation(_) => "banker::events::allocation",
        }
    }
}
