//! Concurrent stress run against one shared allocator
//!
//! Each worker is a blocking task standing in for one process. A round
//! climbs towards the process's declared maximum with random requests,
//! then releases everything. Denied requests are retried up to
//! `max_retries` times in a row before the round is abandoned and the
//! partial allocation released, so a worker never waits on the allocator.

use crate::{elapsed_ms, OpsCtx};
use banker_config::{Scenario, StressConfig};
use banker_errors::{Error, OpsError};
use banker_events::EventEmitter;
use banker_resources::{AllocationManager, ResourceState};
use banker_types::{ProcessId, StressReport, Units, WorkerReport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drive the scenario's table with concurrent workers
///
/// Only the table is used; any scripted steps are ignored. The final state
/// is checked for conservation, bounds, safety and full release.
///
/// # Errors
///
/// Returns an error if the allocator rejects the declarations, a worker
/// violates the call contract, or a worker task fails to join.
pub async fn stress(ctx: &OpsCtx, scenario: &Scenario) -> Result<StressReport, Error> {
    let start = Instant::now();
    let settings = ctx.config.stress.clone();
    let operation = format!("stress {}", scenario.name);
    ctx.emit_operation_started(&operation);

    let manager = Arc::new(AllocationManager::new().with_events(ctx.tx.clone()));
    manager.initialize(scenario.total.clone(), scenario.max_need.clone())?;

    let workers = settings.effective_workers(scenario.processes());
    info!(
        scenario = %scenario.name,
        workers,
        rounds = settings.rounds,
        seed = settings.seed,
        "starting stress run"
    );

    let handles: Vec<_> = (0..workers)
        .map(|index| {
            let manager = Arc::clone(&manager);
            let settings = settings.clone();
            let seed = settings.seed.wrapping_add(index as u64);
            tokio::task::spawn_blocking(move || {
                run_worker(&manager, ProcessId(index), &settings, seed)
            })
        })
        .collect();

    // Join every worker before returning a failure.
    let mut outcomes = Vec::with_capacity(workers);
    for handle in handles {
        outcomes.push(handle.await);
    }
    let reports = collect_reports(outcomes)
        .inspect_err(|err| ctx.emit_operation_failed(&operation, err.to_string()))?;

    let final_state = manager.snapshot()?;
    let invariants = manager.inspect(ResourceState::verify_invariants)?;
    let invariants_held = invariants.is_ok()
        && manager.check_safety()?.is_safe()
        && final_state.available == final_state.total;

    if let Err(err) = invariants {
        warn!(error = %err, "allocator invariant broken after stress run");
        ctx.emit_operation_failed(&operation, err.to_string());
    } else {
        ctx.emit_operation_completed(&operation, invariants_held);
    }

    let report = StressReport {
        seed: settings.seed,
        rounds: settings.rounds as u64,
        workers: reports,
        final_state,
        invariants_held,
        duration_ms: elapsed_ms(start),
    };
    info!(
        granted = report.total_granted(),
        denied = report.total_denied(),
        releases = report.total_releases(),
        invariants_held,
        "stress run finished"
    );
    Ok(report)
}

/// Unwrap joined worker results, keeping the first failure
fn collect_reports(
    outcomes: Vec<Result<Result<WorkerReport, Error>, tokio::task::JoinError>>,
) -> Result<Vec<WorkerReport>, Error> {
    let mut reports = Vec::with_capacity(outcomes.len());
    let mut first_error = None;
    for outcome in outcomes {
        let result = outcome.map_err(|e| {
            Error::from(OpsError::TaskJoin {
                message: e.to_string(),
            })
        });
        match result.and_then(|report| report) {
            Ok(report) => reports.push(report),
            Err(err) => {
                warn!(error = %err, "stress worker failed");
                first_error.get_or_insert(err);
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => Ok(reports),
    }
}

fn run_worker(
    manager: &AllocationManager,
    pid: ProcessId,
    settings: &StressConfig,
    seed: u64,
) -> Result<WorkerReport, Error> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut report = WorkerReport::new(pid);

    for round in 0..settings.rounds {
        if acquire_full_need(manager, pid, settings.max_retries, &mut rng, &mut report)? {
            report.rounds_completed += 1;
        } else {
            report.gave_up += 1;
            debug!(process = %pid, round, "round abandoned after retries");
        }

        let held = manager.release_all(pid)?;
        if held.iter().any(|&units| units > 0) {
            report.releases += 1;
        }
    }

    Ok(report)
}

/// Request random slices of the remaining need until it reaches zero
///
/// Returns `false` if `max_retries` consecutive requests were denied.
fn acquire_full_need(
    manager: &AllocationManager,
    pid: ProcessId,
    max_retries: u32,
    rng: &mut StdRng,
    report: &mut WorkerReport,
) -> Result<bool, Error> {
    let mut denied_in_a_row = 0;

    loop {
        // Only this worker changes its own row, so the need read here is
        // still current when the request below is made.
        let need =
            manager.inspect(|state| state.check_process(pid).map(|()| state.need(pid).to_vec()))??;
        if need.iter().all(|&units| units == 0) {
            return Ok(true);
        }

        let request: Vec<Units> = need.iter().map(|&units| rng.random_range(0..=units)).collect();
        let result = manager.request(pid, &request)?;
        report.record(&result);

        if let Some(reason) = result.denial().filter(|reason| !reason.is_transient()) {
            return Err(OpsError::StressFailed {
                message: format!("{pid} was refused {request:?} within its remaining need: {reason}"),
            }
            .into());
        }

        if result.is_granted() {
            denied_in_a_row = 0;
            continue;
        }

        denied_in_a_row += 1;
        if denied_in_a_row > max_retries {
            return Ok(false);
        }
        std::thread::yield_now();
    }
}
