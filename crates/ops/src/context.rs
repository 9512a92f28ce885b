//! Operations context for dependency injection

use banker_config::Config;
use banker_errors::{Error, OpsError};
use banker_events::{EventEmitter, EventSender};

/// Operations context shared by every operation
pub struct OpsCtx {
    /// Event sender for progress reporting; allocators created by an
    /// operation emit through it as well
    pub tx: EventSender,
    /// System configuration
    pub config: Config,
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

/// Builder for [`OpsCtx`]
#[derive(Default)]
pub struct OpsContextBuilder {
    tx: Option<EventSender>,
    config: Option<Config>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context
    ///
    /// A missing configuration falls back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if no event sender was provided.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event_sender".to_string(),
        })?;

        Ok(OpsCtx {
            tx,
            config: self.config.unwrap_or_default(),
        })
    }
}
