//! Integration tests for the allocator

#[cfg(test)]
mod tests {
    use banker_errors::AllocationError;
    use banker_events::{AllocationEvent, AppEvent};
    use banker_resources::*;
    use banker_types::{DenialReason, GrantResult, ProcessId, Units};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn classic() -> AllocationManager {
        AllocationManager::with_resources(
            vec![10, 5, 7],
            vec![vec![7, 5, 3], vec![3, 2, 2], vec![9, 0, 2]],
        )
        .unwrap()
    }

    fn sequence(result: &GrantResult) -> Vec<usize> {
        result
            .safe_sequence()
            .map(|s| s.iter().map(|p| p.index()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_classic_walkthrough() {
        let manager = classic();

        let r = manager.request(ProcessId(0), &[0, 1, 0]).unwrap();
        assert_eq!(sequence(&r), vec![0, 1, 2]);
        let r = manager.request(ProcessId(1), &[2, 0, 0]).unwrap();
        assert_eq!(sequence(&r), vec![0, 1, 2]);
        let r = manager.request(ProcessId(2), &[3, 0, 2]).unwrap();
        assert_eq!(sequence(&r), vec![1, 0, 2]);
        assert_eq!(manager.snapshot().unwrap().available, vec![5, 4, 5]);

        manager.release(ProcessId(0), &[0, 1, 0]).unwrap();
        assert_eq!(manager.snapshot().unwrap().available, vec![5, 5, 5]);

        let before = manager.snapshot().unwrap();
        let r = manager.request(ProcessId(0), &[5, 4, 3]).unwrap();
        assert_eq!(r.denial(), Some(DenialReason::DeadlockRisk));
        assert_eq!(manager.snapshot().unwrap(), before);
    }

    #[test]
    fn test_small_walkthrough() {
        let manager =
            AllocationManager::with_resources(vec![6, 4], vec![vec![4, 2], vec![3, 3]]).unwrap();

        let r = manager.request(ProcessId(0), &[1, 1]).unwrap();
        assert_eq!(sequence(&r), vec![0, 1]);
        let r = manager.request(ProcessId(1), &[2, 1]).unwrap();
        assert_eq!(sequence(&r), vec![0, 1]);
        assert_eq!(manager.snapshot().unwrap().available, vec![3, 2]);

        manager.release(ProcessId(0), &[1, 1]).unwrap();
        assert_eq!(manager.snapshot().unwrap().available, vec![4, 3]);
    }

    #[test]
    fn test_zero_request_is_always_granted() {
        let manager = classic();
        manager.request(ProcessId(2), &[3, 0, 2]).unwrap();
        let before = manager.snapshot().unwrap();

        for pid in 0..3 {
            let r = manager.request(ProcessId(pid), &[0, 0, 0]).unwrap();
            assert!(r.is_granted());
        }
        assert_eq!(manager.snapshot().unwrap(), before);
    }

    #[test]
    fn test_request_exactly_remaining_need() {
        let manager = classic();
        let r = manager.request(ProcessId(1), &[3, 2, 2]).unwrap();
        assert!(r.is_granted());
        assert_eq!(manager.snapshot().unwrap().need[1], vec![0, 0, 0]);
        assert_eq!(
            manager.request(ProcessId(1), &[1, 0, 0]).unwrap().denial(),
            Some(DenialReason::ExceedsDeclaredNeed)
        );
    }

    #[test]
    fn test_release_more_than_held() {
        let manager = classic();
        manager.request(ProcessId(0), &[0, 1, 0]).unwrap();
        let err = manager.release(ProcessId(0), &[0, 2, 0]).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InvalidRelease {
                process: 0,
                resource: 1,
                requested: 2,
                held: 1
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid release by P0: 2 units of R1 requested, 1 held"
        );
    }

    #[test]
    fn test_concurrent_clients_keep_invariants() {
        let manager = Arc::new(
            AllocationManager::with_resources(
                vec![4, 3],
                vec![vec![3, 2], vec![2, 2], vec![2, 3], vec![4, 1]],
            )
            .unwrap(),
        );

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    let pid = ProcessId(i);
                    let max = manager.snapshot().unwrap().max_need[i].clone();
                    let mut granted = 0u32;
                    for round in 0..200usize {
                        let step: Vec<Units> = max
                            .iter()
                            .enumerate()
                            .map(|(j, &m)| u32::from((round + j) % 2 == 0).min(m))
                            .collect();
                        match manager.request(pid, &step).unwrap() {
                            GrantResult::Granted { .. } => granted += 1,
                            GrantResult::Denied { .. } => {
                                manager.release_all(pid).unwrap();
                            }
                        }
                        manager
                            .inspect(ResourceState::verify_invariants)
                            .unwrap()
                            .unwrap();
                    }
                    manager.release_all(pid).unwrap();
                    granted
                })
            })
            .collect();

        let granted: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert!(granted > 0);

        let snapshot = manager.snapshot().unwrap();
        assert_eq!(snapshot.available, snapshot.total);
        assert!(snapshot.is_conserved());
        assert!(manager.check_safety().unwrap().is_safe());
    }

    #[test]
    fn test_event_stream_follows_lock_order() {
        let (tx, mut rx) = banker_events::channel();
        let manager = Arc::new(AllocationManager::new().with_events(tx));
        manager
            .initialize(vec![3, 2], vec![vec![2, 1], vec![2, 2], vec![1, 2]])
            .unwrap();

        let handles: Vec<_> = (0..3)
            .map(|i| {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || {
                    let pid = ProcessId(i);
                    for _ in 0..500 {
                        manager.request(pid, &[1, 1]).unwrap();
                        assert!(manager.snapshot().unwrap().is_conserved());
                        manager.release_all(pid).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Replaying the events in arrival order must reproduce the free pool
        // each event reports.
        let mut available = vec![3, 2];
        let mut replayed = 0;
        while let Ok(event) = rx.try_recv() {
            let AppEvent::Allocation(event) = event else {
                continue;
            };
            match event {
                AllocationEvent::Granted {
                    amounts,
                    available: reported,
                    ..
                } => {
                    for (free, units) in available.iter_mut().zip(&amounts) {
                        *free -= units;
                    }
                    assert_eq!(available, reported);
                    replayed += 1;
                }
                AllocationEvent::Released {
                    amounts,
                    available: reported,
                    ..
                } => {
                    for (free, units) in available.iter_mut().zip(&amounts) {
                        *free += units;
                    }
                    assert_eq!(available, reported);
                    replayed += 1;
                }
                _ => {}
            }
        }

        assert!(replayed >= 1500);
        assert_eq!(available, vec![3, 2]);
        assert!(manager.check_safety().unwrap().is_safe());
    }

    /// Random system: 1..=3 resource types, 1..=4 processes, `max_need <= total`
    fn system() -> impl Strategy<Value = (Vec<Units>, Vec<Vec<Units>>)> {
        (1usize..=3, 1usize..=4).prop_flat_map(|(r, p)| {
            prop::collection::vec(0u32..=6, r).prop_flat_map(move |total| {
                let row: Vec<_> = total.iter().map(|&t| 0..=t).collect();
                (Just(total), prop::collection::vec(row, p))
            })
        })
    }

    /// (is request, process, amounts); process and width are folded onto the system
    fn operations() -> impl Strategy<Value = Vec<(bool, usize, Vec<Units>)>> {
        prop::collection::vec(
            (any::<bool>(), 0usize..4, prop::collection::vec(0u32..=4, 3)),
            0..40,
        )
    }

    proptest! {
        #[test]
        fn prop_every_committed_state_is_safe_and_consistent(
            (total, max_need) in system(),
            ops in operations(),
        ) {
            let processes = max_need.len();
            let width = total.len();
            let manager = AllocationManager::with_resources(total, max_need).unwrap();

            for (is_request, pid, amounts) in ops {
                let pid = ProcessId(pid % processes);
                let amounts = &amounts[..width];
                let before = manager.snapshot().unwrap();

                if is_request {
                    let result = manager.request(pid, amounts).unwrap();
                    let after = manager.snapshot().unwrap();
                    match result {
                        GrantResult::Granted { safe_sequence } => {
                            prop_assert_eq!(safe_sequence.len(), processes);
                            for j in 0..width {
                                prop_assert_eq!(after.available[j] + amounts[j], before.available[j]);
                            }
                        }
                        GrantResult::Denied { .. } => prop_assert_eq!(&after, &before),
                    }
                } else {
                    match manager.release(pid, amounts) {
                        Ok(()) => {
                            let after = manager.snapshot().unwrap();
                            for j in 0..width {
                                prop_assert!(after.available[j] >= before.available[j]);
                            }
                        }
                        Err(AllocationError::InvalidRelease { .. }) => {
                            prop_assert_eq!(manager.snapshot().unwrap(), before);
                        }
                        Err(other) => prop_assert!(false, "unexpected error: {other}"),
                    }
                }

                prop_assert!(manager.inspect(ResourceState::verify_invariants).unwrap().is_ok());
                prop_assert!(manager.check_safety().unwrap().is_safe());
            }
        }

        #[test]
        fn prop_request_then_release_restores_state(
            (total, max_need) in system(),
            pid in 0usize..4,
            amounts in prop::collection::vec(0u32..=4, 3),
        ) {
            let pid = ProcessId(pid % max_need.len());
            let amounts = amounts[..total.len()].to_vec();
            let manager = AllocationManager::with_resources(total, max_need).unwrap();
            let before = manager.snapshot().unwrap();

            if manager.request(pid, &amounts).unwrap().is_granted() {
                manager.release(pid, &amounts).unwrap();
            }
            prop_assert_eq!(manager.snapshot().unwrap(), before);
        }

        #[test]
        fn prop_safety_check_is_deterministic((total, max_need) in system()) {
            let state = ResourceState::new(total, max_need).unwrap();
            let first = SafetyChecker::check(&state);
            prop_assert!(first.is_safe());
            prop_assert_eq!(first, SafetyChecker::check(&state));
        }
    }
}
