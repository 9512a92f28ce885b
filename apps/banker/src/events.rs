//! Event handling and status display

use crate::logging::log_event_with_tracing;
use banker_events::{AllocationEvent, AppEvent, GeneralEvent};
use console::{Style, Term};

/// Event handler for user feedback
///
/// Status lines go to stderr so stdout carries only the rendered result.
/// Allocator events are shown only in debug mode; a stress run produces
/// thousands of them.
pub struct EventHandler {
    colors_enabled: bool,
    debug_enabled: bool,
    quiet: bool,
    term: Term,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        Self {
            colors_enabled,
            debug_enabled,
            quiet,
            term: Term::stderr(),
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        log_event_with_tracing(&event);
        if self.quiet {
            return;
        }
        if let Some(line) = self.status_line(&event) {
            self.term.write_line(&line).unwrap_or(());
        }
    }

    fn status_line(&self, event: &AppEvent) -> Option<String> {
        match event {
            AppEvent::General(general) => Some(self.general_line(general)),
            AppEvent::Allocation(allocation) if self.debug_enabled => {
                Some(self.allocation_line(allocation))
            }
            AppEvent::Allocation(_) => None,
        }
    }

    fn general_line(&self, event: &GeneralEvent) -> String {
        match event {
            GeneralEvent::OperationStarted { operation } => {
                self.paint(Style::new().dim(), &format!("> {operation}"))
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                if *success {
                    self.paint(Style::new().green(), &format!("ok {operation}"))
                } else {
                    self.paint(Style::new().yellow(), &format!("done {operation} (with failures)"))
                }
            }
            GeneralEvent::OperationFailed { operation, error } => {
                self.paint(Style::new().red(), &format!("failed {operation}: {error}"))
            }
            GeneralEvent::Warning { message, context } => {
                let text = match context {
                    Some(context) => format!("warning: {message} ({context})"),
                    None => format!("warning: {message}"),
                };
                self.paint(Style::new().yellow(), &text)
            }
        }
    }

    fn allocation_line(&self, event: &AllocationEvent) -> String {
        match event {
            AllocationEvent::Initialized {
                processes,
                resource_types,
                ..
            } => format!("allocator ready: {processes} processes, {resource_types} resource types"),
            AllocationEvent::Granted {
                process,
                amounts,
                safe_sequence,
                ..
            } => self.paint(
                Style::new().green(),
                &format!("{process} granted {amounts:?} (safe sequence: {safe_sequence})"),
            ),
            AllocationEvent::Denied {
                process,
                amounts,
                reason,
            } => self.paint(
                Style::new().yellow(),
                &format!("{process} denied {amounts:?}: {reason}"),
            ),
            AllocationEvent::Released {
                process, amounts, ..
            } => format!("{process} released {amounts:?}"),
            AllocationEvent::ReleaseRejected {
                process, message, ..
            } => self.paint(
                Style::new().red(),
                &format!("{process} release rejected: {message}"),
            ),
        }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.colors_enabled {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banker_types::{DenialReason, ProcessId};

    #[test]
    fn test_allocation_events_hidden_without_debug() {
        let handler = EventHandler::new(false, false, false);
        let event = AppEvent::Allocation(AllocationEvent::Denied {
            process: ProcessId(1),
            amounts: vec![1],
            reason: DenialReason::DeadlockRisk,
        });
        assert!(handler.status_line(&event).is_none());

        let handler = EventHandler::new(false, true, false);
        let line = handler.status_line(&event).unwrap();
        assert!(line.starts_with("P1 denied [1]"));
    }

    #[test]
    fn test_warning_line() {
        let handler = EventHandler::new(false, false, false);
        let event = AppEvent::General(GeneralEvent::warning_with_context(
            "scenario x is not in a safe state",
            "blocked: P0",
        ));
        assert_eq!(
            handler.status_line(&event).as_deref(),
            Some("warning: scenario x is not in a safe state (blocked: P0)")
        );
    }

    #[test]
    fn test_quiet_handler_still_accepts_events() {
        let mut handler = EventHandler::new(false, true, true);
        handler.handle_event(AppEvent::General(GeneralEvent::OperationStarted {
            operation: "demo small".to_string(),
        }));
    }
}
