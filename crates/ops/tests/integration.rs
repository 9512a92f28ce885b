//! Integration tests for ops crate

#[cfg(test)]
mod tests {
    use banker_config::{Scenario, Step};
    use banker_errors::{Error, OpsError};
    use banker_events::{AllocationEvent, AppEvent, EventReceiver, GeneralEvent};
    use banker_ops::*;
    use banker_types::{DenialReason, ProcessId, StepOutcome};

    fn create_test_context() -> (OpsCtx, EventReceiver) {
        let (tx, rx) = banker_events::channel();
        let ctx = OpsContextBuilder::new().with_event_sender(tx).build().unwrap();
        (ctx, rx)
    }

    fn sequence(outcome: &StepOutcome) -> Vec<usize> {
        match outcome {
            StepOutcome::Granted { safe_sequence } => {
                safe_sequence.iter().map(|p| p.index()).collect()
            }
            other => panic!("expected a grant, got {other:?}"),
        }
    }

    #[test]
    fn test_ops_context_builder_requires_events() {
        let err = OpsContextBuilder::new().build().err().unwrap();
        assert!(matches!(err, Error::Ops(OpsError::MissingComponent { .. })));
    }

    #[test]
    fn test_classic_demo() {
        let (ctx, _rx) = create_test_context();
        let report = run_scenario(&ctx, &Scenario::classic()).unwrap();

        assert!(report.initial.safe);
        assert_eq!(report.steps.len(), 5);
        assert_eq!(sequence(&report.steps[0].outcome), vec![0, 1, 2]);
        assert_eq!(sequence(&report.steps[1].outcome), vec![0, 1, 2]);
        assert_eq!(sequence(&report.steps[2].outcome), vec![1, 0, 2]);
        assert_eq!(report.steps[3].outcome, StepOutcome::Released);
        assert_eq!(report.steps[3].state.available, vec![5, 5, 5]);
        assert_eq!(
            report.steps[4].outcome,
            StepOutcome::Denied {
                reason: DenialReason::DeadlockRisk
            }
        );
        assert_eq!(report.granted(), 3);
        assert_eq!(report.denied(DenialReason::DeadlockRisk), 1);
    }

    #[test]
    fn test_small_demo() {
        let (ctx, _rx) = create_test_context();
        let report = run_scenario(&ctx, &Scenario::small()).unwrap();

        assert_eq!(sequence(&report.steps[0].outcome), vec![0, 1]);
        assert_eq!(sequence(&report.steps[1].outcome), vec![0, 1]);
        assert_eq!(report.steps[1].state.available, vec![3, 2]);
        assert_eq!(report.final_state.available, vec![4, 3]);
    }

    #[test]
    fn test_denial_reasons() {
        let (ctx, _rx) = create_test_context();
        let scenario = Scenario {
            name: "denials".to_string(),
            total: vec![2],
            max_need: vec![vec![2], vec![2]],
            allocated: None,
            steps: vec![
                Step::request(0, vec![1]),
                Step::request(1, vec![1]),
                Step::request(1, vec![2]),
                Step::request(0, vec![2]),
            ],
        };

        let report = run_scenario(&ctx, &scenario).unwrap();
        let reasons: Vec<_> = report.steps[1..]
            .iter()
            .map(|step| match step.outcome {
                StepOutcome::Denied { reason } => reason,
                ref other => panic!("expected a denial, got {other:?}"),
            })
            .collect();
        assert_eq!(
            reasons,
            vec![
                DenialReason::DeadlockRisk,
                DenialReason::InsufficientAvailable,
                DenialReason::ExceedsDeclaredNeed,
            ]
        );
        assert_eq!(report.final_state.allocated, vec![vec![1], vec![0]]);
    }

    #[test]
    fn test_check_safe_table() {
        let (ctx, _rx) = create_test_context();
        let mut scenario = Scenario::textbook();
        scenario.allocated = Some(vec![
            vec![0, 1, 0],
            vec![2, 0, 0],
            vec![3, 0, 2],
            vec![2, 1, 1],
            vec![0, 0, 2],
        ]);

        let report = check_scenario(&ctx, &scenario).unwrap();
        assert!(report.safe);
        let order: Vec<_> = report.safe_sequence.unwrap().iter().map(|p| p.index()).collect();
        assert_eq!(order, vec![1, 3, 0, 2, 4]);
        assert_eq!(report.state.available, vec![3, 3, 2]);
    }

    #[test]
    fn test_check_unsafe_table_warns() {
        let (ctx, mut rx) = create_test_context();
        let mut scenario = Scenario::classic();
        scenario.allocated = Some(vec![vec![5, 4, 3], vec![2, 0, 0], vec![3, 0, 2]]);

        let report = check_scenario(&ctx, &scenario).unwrap();
        assert!(!report.safe);
        assert_eq!(report.blocked, vec![ProcessId(0), ProcessId(1), ProcessId(2)]);
        assert!(!OperationResult::SafetyReport(report).is_success());
        assert!(matches!(
            rx.try_recv().unwrap(),
            AppEvent::General(GeneralEvent::Warning { .. })
        ));
    }

    #[test]
    fn test_run_emits_allocator_events() {
        let (ctx, mut rx) = create_test_context();
        run_scenario(&ctx, &Scenario::small()).unwrap();

        let mut allocation = Vec::new();
        let mut completed = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::Allocation(event) => allocation.push(event),
                AppEvent::General(GeneralEvent::OperationCompleted { success, .. }) => {
                    completed = success;
                }
                AppEvent::General(_) => {}
            }
        }

        assert!(completed);
        assert!(matches!(allocation[0], AllocationEvent::Initialized { .. }));
        assert_eq!(allocation.len(), 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stress_report_serializes() {
        let (ctx, _rx) = create_test_context();
        let report = stress(&ctx, &Scenario::small()).await.unwrap();
        assert!(report.invariants_held);

        let json = OperationResult::StressReport(report).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "StressReport");
        assert_eq!(value["data"]["seed"], 42);
    }
}
