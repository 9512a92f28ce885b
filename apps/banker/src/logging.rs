//! Structured logging integration for events
//!
//! Every event received by the CLI is mirrored into `tracing` at the level
//! returned by [`AppEvent::log_level`], with the event's payload as
//! structured fields.

use banker_events::{AllocationEvent, AppEvent, GeneralEvent};
use tracing::{debug, error, info, trace, warn, Level};

/// Emit a tracing record at a level only known at runtime
macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            Level::ERROR => error!($($arg)+),
            Level::WARN => warn!($($arg)+),
            Level::INFO => info!($($arg)+),
            Level::DEBUG => debug!($($arg)+),
            _ => trace!($($arg)+),
        }
    };
}

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let level = event.log_level();
    let domain = event.log_target();

    match event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message, context } => {
                log_at!(level, domain, context = ?context, "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                log_at!(level, domain, operation = %operation, "Operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                log_at!(level, domain, operation = %operation, success, "Operation completed");
            }
            GeneralEvent::OperationFailed { operation, error } => {
                log_at!(level, domain, operation = %operation, error = %error, "Operation failed");
            }
        },

        AppEvent::Allocation(allocation) => match allocation {
            AllocationEvent::Initialized {
                processes,
                resource_types,
                total,
            } => {
                log_at!(
                    level,
                    domain,
                    processes,
                    resource_types,
                    total = ?total,
                    "Allocator initialized"
                );
            }
            AllocationEvent::Granted {
                process,
                amounts,
                safe_sequence,
                available,
            } => {
                log_at!(
                    level,
                    domain,
                    process = %process,
                    amounts = ?amounts,
                    safe_sequence = %safe_sequence,
                    available = ?available,
                    "Request granted"
                );
            }
            AllocationEvent::Denied {
                process,
                amounts,
                reason,
            } => {
                log_at!(
                    level,
                    domain,
                    process = %process,
                    amounts = ?amounts,
                    reason = reason.code(),
                    "Request denied"
                );
            }
            AllocationEvent::Released {
                process,
                amounts,
                available,
            } => {
                log_at!(
                    level,
                    domain,
                    process = %process,
                    amounts = ?amounts,
                    available = ?available,
                    "Resources released"
                );
            }
            AllocationEvent::ReleaseRejected {
                process,
                amounts,
                message,
            } => {
                log_at!(
                    level,
                    domain,
                    process = %process,
                    amounts = ?amounts,
                    message = %message,
                    "Release rejected"
                );
            }
        },
    }
}
