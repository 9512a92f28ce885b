//! Scenario replay and table safety checks

use crate::{elapsed_ms, OpsCtx};
use banker_config::Scenario;
use banker_errors::{AllocationError, Error, OpsError, UserFacingError};
use banker_events::EventEmitter;
use banker_resources::{AllocationManager, ResourceState, SafetyChecker, SafetyVerdict};
use banker_types::{SafetyReport, ScenarioReport, StateSnapshot, StepAction, StepOutcome, StepReport};
use std::time::Instant;
use tracing::{debug, info};

/// Play a scenario's steps against a fresh allocator
///
/// Denied requests are recorded and the run continues. A release of more
/// than the process holds is recorded as [`StepOutcome::Rejected`] with no
/// effect on the state; any other allocator error aborts the run.
///
/// # Errors
///
/// Returns an error if the scenario is malformed, its declarations are
/// rejected by the allocator, or a step fails with a contract violation.
pub fn run_scenario(ctx: &OpsCtx, scenario: &Scenario) -> Result<ScenarioReport, Error> {
    let start = Instant::now();
    let operation = format!("run {}", scenario.name);
    ctx.emit_operation_started(&operation);

    let result = replay(ctx, scenario);
    match &result {
        Ok(report) => {
            info!(
                scenario = %scenario.name,
                steps = report.steps.len(),
                granted = report.granted(),
                "scenario finished"
            );
            ctx.emit_operation_completed(&operation, true);
        }
        Err(err) => ctx.emit_operation_failed(&operation, err.to_string()),
    }

    result.map(|mut report| {
        report.duration_ms = elapsed_ms(start);
        report
    })
}

fn replay(ctx: &OpsCtx, scenario: &Scenario) -> Result<ScenarioReport, Error> {
    scenario.validate()?;

    let manager = AllocationManager::new().with_events(ctx.tx.clone());
    manager.initialize(scenario.total.clone(), scenario.max_need.clone())?;
    let initial = safety_report(manager.check_safety()?, manager.snapshot()?);

    let mut steps = Vec::with_capacity(scenario.steps.len());
    for (i, step) in scenario.steps.iter().enumerate() {
        let index = i + 1;
        let outcome = match step.action {
            StepAction::Request => manager
                .request(step.process, &step.amounts)
                .map(StepOutcome::from),
            StepAction::Release => manager
                .release(step.process, &step.amounts)
                .map(|()| StepOutcome::Released),
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(err @ AllocationError::InvalidRelease { .. }) => StepOutcome::Rejected {
                code: err.user_code().map(str::to_string),
                message: err.to_string(),
            },
            Err(err) => {
                return Err(OpsError::ScenarioFailed {
                    name: scenario.name.clone(),
                    step: index,
                    message: err.to_string(),
                }
                .into())
            }
        };

        debug!(step = index, process = %step.process, action = %step.action, ?outcome, "step applied");
        steps.push(StepReport {
            index,
            process: step.process,
            action: step.action,
            amounts: step.amounts.clone(),
            outcome,
            state: manager.snapshot()?,
        });
    }

    Ok(ScenarioReport {
        name: scenario.name.clone(),
        initial,
        steps,
        final_state: manager.snapshot()?,
        duration_ms: 0,
    })
}

/// Evaluate the safety of a scenario's table, including any declared
/// starting allocation
///
/// # Errors
///
/// Returns an error if the scenario is malformed or its allocation exceeds
/// a declared maximum or the total supply.
pub fn check_scenario(ctx: &OpsCtx, scenario: &Scenario) -> Result<SafetyReport, Error> {
    scenario.validate()?;
    let state = ResourceState::from_parts(
        scenario.total.clone(),
        scenario.max_need.clone(),
        scenario.initial_allocation(),
    )?;

    let verdict = SafetyChecker::check(&state);
    if let SafetyVerdict::Unsafe { blocked } = &verdict {
        let blocked: Vec<String> = blocked.iter().map(ToString::to_string).collect();
        ctx.emit_warning_with_context(
            format!("scenario {} is not in a safe state", scenario.name),
            format!("blocked: {}", blocked.join(" ")),
        );
    }
    info!(scenario = %scenario.name, safe = verdict.is_safe(), "safety check finished");

    Ok(safety_report(verdict, state.snapshot()))
}

pub(crate) fn safety_report(verdict: SafetyVerdict, state: StateSnapshot) -> SafetyReport {
    match verdict {
        SafetyVerdict::Safe(sequence) => SafetyReport {
            safe: true,
            safe_sequence: Some(sequence),
            blocked: Vec::new(),
            state,
        },
        SafetyVerdict::Unsafe { blocked } => SafetyReport {
            safe: false,
            safe_sequence: None,
            blocked,
            state,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OpsContextBuilder;
    use banker_config::Step;
    use banker_types::DenialReason;

    fn ctx() -> OpsCtx {
        let (tx, _rx) = banker_events::channel();
        OpsContextBuilder::new().with_event_sender(tx).build().unwrap()
    }

    #[test]
    fn test_invalid_release_is_recorded_not_fatal() {
        let mut scenario = Scenario::small();
        scenario.steps.insert(0, Step::release(1, vec![1, 0]));

        let report = run_scenario(&ctx(), &scenario).unwrap();
        assert!(matches!(
            &report.steps[0].outcome,
            StepOutcome::Rejected { code: Some(code), .. } if code == "allocation.invalid_release"
        ));
        assert_eq!(report.steps.len(), 4);
        assert_eq!(report.final_state.available, vec![4, 3]);
    }

    #[test]
    fn test_max_need_above_total_is_an_error() {
        let mut scenario = Scenario::small();
        scenario.max_need[0] = vec![7, 2];
        let err = run_scenario(&ctx(), &scenario).unwrap_err();
        assert!(matches!(
            err,
            Error::Allocation(AllocationError::MaxNeedExceedsTotal { .. })
        ));
    }

    #[test]
    fn test_denials_do_not_change_state() {
        let scenario = Scenario::classic();
        let report = run_scenario(&ctx(), &scenario).unwrap();
        let last = report.steps.last().unwrap();
        assert_eq!(
            last.outcome,
            StepOutcome::Denied {
                reason: DenialReason::DeadlockRisk
            }
        );
        assert_eq!(last.state, report.steps[3].state);
    }
}
