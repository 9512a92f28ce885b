//! Integration tests for events

#[cfg(test)]
mod tests {
    use banker_events::*;
    use banker_types::{DenialReason, ProcessId};

    #[tokio::test]
    async fn test_event_sender_emit() {
        let (tx, mut rx) = channel();

        tx.emit_operation_failed("run classic", "test error");
        tx.emit_warning_with_context("not in a safe state", "blocked: P0");

        let event1 = rx.recv().await.unwrap();
        assert!(matches!(
            event1,
            AppEvent::General(GeneralEvent::OperationFailed { .. })
        ));
        assert_eq!(event1.log_level(), tracing::Level::ERROR);

        let event2 = rx.recv().await.unwrap();
        assert!(matches!(
            event2,
            AppEvent::General(GeneralEvent::Warning {
                context: Some(_),
                ..
            })
        ));
        assert_eq!(event2.log_level(), tracing::Level::WARN);
    }

    #[tokio::test]
    async fn test_dropped_receiver() {
        let (tx, rx) = channel();
        drop(rx);

        // Should not panic when receiver is dropped
        tx.emit_operation_started("ignored");
    }

    #[test]
    fn test_emit_from_plain_thread() {
        let (tx, mut rx) = channel();
        std::thread::spawn(move || {
            tx.emit_allocation(AllocationEvent::Denied {
                process: ProcessId(1),
                amounts: vec![1, 0],
                reason: DenialReason::DeadlockRisk,
            });
        })
        .join()
        .unwrap();

        let event = rx.try_recv().unwrap();
        assert_eq!(event.log_level(), tracing::Level::DEBUG);
        assert_eq!(event.log_target(), "banker::events::allocation");
    }

    #[test]
    fn test_allocation_event_serialization() {
        let event = AppEvent::Allocation(AllocationEvent::Released {
            process: ProcessId(0),
            amounts: vec![0, 1, 0],
            available: vec![5, 5, 5],
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domain"], "allocation");
        assert_eq!(json["event"]["type"], "Released");
        assert_eq!(json["event"]["process"], 0);
    }
}
