//! Fail-fast sequential execution.
//!
//! The gate runs once. Each step is then resolved, launched and awaited before
//! the next one is even looked up; the first failure ends the sequence.

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::config::OrchestratorConfig;
use crate::error::{Error, ErrorCode};
use crate::gateway::{Gateway, RunHandle};
use crate::interrupt::CancelToken;

use super::diagnostics::FailureReporter;
use super::gate::PrerequisiteGate;
use super::launcher::TaskLauncher;
use super::poller::{CompletionPoller, PollEvent, PollOutcome};
use super::resolver::UnitResolver;
use super::types::{
    FailureReason, SequenceOutcome, SequenceResult, StepFailure, StepReport, StepState,
};

/// A still-waiting line is logged once per this many repeated polls.
const WAITING_LOG_EVERY: u32 = 12;

pub struct Sequencer<'a> {
    gateway: &'a dyn Gateway,
    clock: &'a dyn Clock,
    cancel: CancelToken,
    config: &'a OrchestratorConfig,
}

impl<'a> Sequencer<'a> {
    pub fn new(
        gateway: &'a dyn Gateway,
        clock: &'a dyn Clock,
        cancel: CancelToken,
        config: &'a OrchestratorConfig,
    ) -> Self {
        Self {
            gateway,
            clock,
            cancel,
            config,
        }
    }

    /// Run the configured sequence to completion or first failure.
    ///
    /// Step failures are data in the result, not errors.
    pub fn run(&self) -> SequenceResult {
        let started_at = Utc::now();
        let total = self.config.sequence.len();
        let mut tally = Tally::new(started_at, total);

        log_status!(
            "sequence",
            "Running {} step(s) in project {}",
            total,
            self.config.project_id
        );

        if let Some(failure) = self.check_gate() {
            return tally.finish(SequenceOutcome::Aborted, Some(failure), total);
        }

        for (index, name) in self.config.sequence.iter().enumerate() {
            if self.cancel.is_cancelled() {
                let failure = failure(None, FailureReason::Interrupted, &Error::interrupted());
                return tally.finish(SequenceOutcome::Interrupted, Some(failure), total - index);
            }

            log_status!("step", "[{}/{}] {}", index + 1, total, name);
            let (report, failure) = self.run_step(name);
            tally.steps.push(report);

            if let Some(failure) = failure {
                let outcome = if failure.reason == FailureReason::Interrupted {
                    SequenceOutcome::Interrupted
                } else {
                    SequenceOutcome::Aborted
                };
                return tally.finish(outcome, Some(failure), total - index - 1);
            }

            tally.succeeded.push(name.clone());

            let pause = self.config.timings.step_pause;
            if index + 1 < total && !pause.is_zero() {
                log_status!("sequence", "Waiting {}s before next step", pause.as_secs());
                self.clock.sleep(pause, &self.cancel);
            }
        }

        tally.finish(SequenceOutcome::Completed, None, 0)
    }

    fn check_gate(&self) -> Option<StepFailure> {
        let gate = PrerequisiteGate::new(self.gateway, self.config.prerequisite.as_deref());
        let resource = gate.resource()?.to_string();

        match gate.check() {
            Ok(true) => {
                log_status!("gate", "Found required resource '{}'", resource);
                None
            }
            Ok(false) => Some(failure(
                None,
                FailureReason::PrerequisiteMissing,
                &Error::prerequisite_missing(&resource),
            )),
            Err(err) => Some(failure(None, FailureReason::TransportError, &err)),
        }
    }

    fn run_step(&self, name: &str) -> (StepReport, Option<StepFailure>) {
        let started = self.clock.now();
        let mut report = StepReport::new(name);
        let fail = |mut report: StepReport, failure: StepFailure| {
            report.state = StepState::Failed;
            report.elapsed_secs = (self.clock.now() - started).as_secs();
            log_status!("step", "'{}' failed: {}", name, failure.message);
            (report, Some(failure))
        };

        report.state = StepState::Resolving;
        let unit = match UnitResolver::new(self.gateway).resolve(name) {
            Ok(Some(unit)) => unit,
            Ok(None) => {
                let err = Error::unit_not_found(name);
                return fail(report, failure(Some(name), FailureReason::UnitNotFound, &err));
            }
            Err(err) => {
                return fail(report, failure(Some(name), FailureReason::TransportError, &err));
            }
        };
        report.unit_id = Some(unit.id);

        report.state = StepState::Launching;
        let handle = match TaskLauncher::new(self.gateway).launch(&unit) {
            Ok(handle) => handle,
            Err(err) => {
                return fail(report, failure(Some(name), FailureReason::LaunchError, &err));
            }
        };
        report.run = Some(handle);
        log_status!("step", "Started run {} of unit {}", handle, unit.id);

        report.state = StepState::Polling;
        let poller = CompletionPoller::new(
            self.gateway,
            self.clock,
            &self.cancel,
            self.config.timings.poll_interval,
        );
        let timeout = self.config.timings.step_timeout;
        let outcome = match poller.await_completion(handle, timeout, &mut |event| {
            log_poll_event(handle, event)
        }) {
            Ok(outcome) => outcome,
            Err(err) if err.code == ErrorCode::SequenceInterrupted => {
                return fail(report, failure(Some(name), FailureReason::Interrupted, &err));
            }
            Err(err) => {
                return fail(report, failure(Some(name), FailureReason::TransportError, &err));
            }
        };

        let (status, reason, err) = match outcome {
            PollOutcome::Finished(status) if status.is_success() => {
                report.status = Some(status);
                report.state = StepState::Succeeded;
                report.elapsed_secs = (self.clock.now() - started).as_secs();
                log_status!("step", "'{}' succeeded in {}s", name, report.elapsed_secs);
                return (report, None);
            }
            PollOutcome::Finished(status) => {
                let err = Error::run_failed(name, status.as_str());
                (Some(status), FailureReason::RunFailed, err)
            }
            PollOutcome::DeadlineElapsed { last } => {
                let err = Error::run_timeout(name, timeout.as_secs());
                (last, FailureReason::RunTimeout, err)
            }
        };
        report.status = status.clone();

        let mut step_failure = failure(Some(name), reason, &err);
        step_failure.status = status;
        step_failure.diagnostics = FailureReporter::new(
            self.gateway,
            self.config.diagnostic_lines,
            &self.config.marker_prefixes,
        )
        .diagnostics(handle);

        fail(report, step_failure)
    }
}

fn failure(step: Option<&str>, reason: FailureReason, err: &Error) -> StepFailure {
    StepFailure {
        step: step.map(str::to_string),
        reason,
        status: None,
        message: err.message.clone(),
        diagnostics: Vec::new(),
        hints: err.hints.clone(),
    }
}

fn log_poll_event(handle: RunHandle, event: PollEvent) {
    match event {
        PollEvent::StatusChanged(status) => {
            log_status!("poll", "Run {}: {}", handle, status);
        }
        PollEvent::StillWaiting {
            status,
            repeats,
            elapsed,
        } if repeats % WAITING_LOG_EVERY == 0 => {
            log_status!(
                "poll",
                "Run {}: still {} after {}s",
                handle,
                status,
                elapsed.as_secs()
            );
        }
        PollEvent::StillWaiting { .. } => {}
        PollEvent::TransientError { message } => {
            log_status!("poll", "Run {}: status check failed, retrying: {}", handle, message);
        }
    }
}

fn log_summary(
    outcome: SequenceOutcome,
    succeeded: &[String],
    total: usize,
    failure: Option<&StepFailure>,
) {
    if outcome == SequenceOutcome::Completed {
        log_status!("sequence", "All {} step(s) succeeded", total);
        return;
    }

    log_status!("sequence", "{} of {} step(s) succeeded", succeeded.len(), total);
    for name in succeeded {
        log_status!("sequence", "  ok: {}", name);
    }

    let Some(failure) = failure else {
        return;
    };
    match &failure.step {
        Some(step) => log_status!("sequence", "Failed at '{}': {}", step, failure.message),
        None => log_status!("sequence", "Nothing was run: {}", failure.message),
    }
    for line in &failure.diagnostics {
        log_status!("diagnostics", "  {}", line);
    }
    for hint in &failure.hints {
        log_status!("hint", "{}", hint.message);
    }
}

struct Tally {
    started_at: DateTime<Utc>,
    total: usize,
    succeeded: Vec<String>,
    steps: Vec<StepReport>,
}

impl Tally {
    fn new(started_at: DateTime<Utc>, total: usize) -> Self {
        Self {
            started_at,
            total,
            succeeded: Vec::new(),
            steps: Vec::new(),
        }
    }

    fn finish(
        self,
        outcome: SequenceOutcome,
        failure: Option<StepFailure>,
        remaining: usize,
    ) -> SequenceResult {
        log_summary(outcome, &self.succeeded, self.total, failure.as_ref());

        SequenceResult {
            outcome,
            succeeded: self.succeeded,
            failed_at: failure.as_ref().and_then(|f| f.step.clone()),
            failure,
            aborted_remaining_count: remaining,
            total_steps: self.total,
            steps: self.steps,
            started_at: self.started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
        }
    }
}
