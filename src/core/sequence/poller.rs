//! Waits for a run to reach a terminal status.

use std::time::Duration;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::gateway::{Gateway, RunHandle, RunStatus};
use crate::interrupt::CancelToken;

/// Progress observed while polling.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    /// First observation of a status different from the previous one.
    StatusChanged(RunStatus),
    /// Same non-terminal status as the previous poll. `repeats` counts consecutive repeats.
    StillWaiting {
        status: RunStatus,
        repeats: u32,
        elapsed: Duration,
    },
    /// A status query failed; polling continues.
    TransientError { message: String },
}

/// How a wait ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The service reported a terminal status, its own `timeout` included.
    Finished(RunStatus),
    /// The local deadline passed first. `last` is the most recent status seen.
    DeadlineElapsed { last: Option<RunStatus> },
}

pub struct CompletionPoller<'a> {
    gateway: &'a dyn Gateway,
    clock: &'a dyn Clock,
    cancel: &'a CancelToken,
    interval: Duration,
}

impl<'a> CompletionPoller<'a> {
    pub fn new(
        gateway: &'a dyn Gateway,
        clock: &'a dyn Clock,
        cancel: &'a CancelToken,
        interval: Duration,
    ) -> Self {
        Self {
            gateway,
            clock,
            cancel,
            interval,
        }
    }

    /// Poll until the run is terminal or `timeout` elapses.
    ///
    /// Returns the terminal status, or `PollOutcome::DeadlineElapsed` when the
    /// deadline passes first. Failed status queries are reported through `observer` and
    /// retried until the same deadline. Returns `sequence.interrupted` once the
    /// cancel token is set.
    pub fn await_completion(
        &self,
        handle: RunHandle,
        timeout: Duration,
        observer: &mut dyn FnMut(PollEvent),
    ) -> Result<PollOutcome> {
        let started = self.clock.now();
        let deadline = started + timeout;
        let mut last: Option<RunStatus> = None;
        let mut repeats = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::interrupted());
            }

            let now = self.clock.now();
            if now >= deadline {
                return Ok(PollOutcome::DeadlineElapsed { last });
            }

            match self.gateway.run_status(handle) {
                Ok(status) if last.as_ref() == Some(&status) => {
                    // Terminal statuses return on first sight, so this one is not.
                    repeats += 1;
                    observer(PollEvent::StillWaiting {
                        status,
                        repeats,
                        elapsed: now - started,
                    });
                }
                Ok(status) => {
                    observer(PollEvent::StatusChanged(status.clone()));
                    if status.is_terminal() {
                        return Ok(PollOutcome::Finished(status));
                    }
                    repeats = 0;
                    last = Some(status);
                }
                Err(err) if err.is_transient() => {
                    observer(PollEvent::TransientError {
                        message: describe(&err),
                    });
                }
                Err(err) => return Err(err),
            }

            let remaining = deadline.saturating_sub(self.clock.now());
            self.clock.sleep(self.interval.min(remaining), self.cancel);
        }
    }
}

fn describe(err: &Error) -> String {
    match err.details.get("error").and_then(|v| v.as_str()) {
        Some(cause) => format!("{} ({})", err.message, cause),
        None => err.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::sequence::testing::{transport_error, FakeClock, FakeGateway, RUN_OFFSET};

    const INTERVAL: Duration = Duration::from_secs(5);
    const HANDLE: RunHandle = RunHandle(1 + RUN_OFFSET);

    fn poll(
        gateway: &FakeGateway,
        clock: &FakeClock,
        cancel: &CancelToken,
        timeout: Duration,
    ) -> (Result<PollOutcome>, Vec<PollEvent>) {
        let mut events = Vec::new();
        let result = CompletionPoller::new(gateway, clock, cancel, INTERVAL).await_completion(
            HANDLE,
            timeout,
            &mut |event| events.push(event),
        );
        (result, events)
    }

    #[test]
    fn returns_terminal_status() {
        let gateway = FakeGateway::new(&[(1, "A")]).script(
            1,
            vec![
                Ok(RunStatus::Pending),
                Ok(RunStatus::Running),
                Ok(RunStatus::Failed),
            ],
        );
        let clock = FakeClock::new();

        let (result, events) = poll(&gateway, &clock, &CancelToken::new(), Duration::from_secs(600));
        assert_eq!(result.unwrap(), PollOutcome::Finished(RunStatus::Failed));
        assert_eq!(
            events,
            vec![
                PollEvent::StatusChanged(RunStatus::Pending),
                PollEvent::StatusChanged(RunStatus::Running),
                PollEvent::StatusChanged(RunStatus::Failed),
            ]
        );
        assert_eq!(clock.sleeps(), vec![INTERVAL, INTERVAL]);
    }

    #[test]
    fn repeated_status_is_not_a_new_event() {
        let gateway = FakeGateway::new(&[(1, "A")]).script(
            1,
            vec![
                Ok(RunStatus::Running),
                Ok(RunStatus::Running),
                Ok(RunStatus::Running),
                Ok(RunStatus::Success),
            ],
        );
        let clock = FakeClock::new();

        let (result, events) = poll(&gateway, &clock, &CancelToken::new(), Duration::from_secs(600));
        assert_eq!(result.unwrap(), PollOutcome::Finished(RunStatus::Success));

        let changes: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, PollEvent::StatusChanged(_)))
            .collect();
        assert_eq!(changes.len(), 2);
        assert!(matches!(
            events[2],
            PollEvent::StillWaiting { repeats: 2, .. }
        ));
    }

    #[test]
    fn deadline_without_terminal_status_is_timeout() {
        let gateway = FakeGateway::new(&[(1, "A")]).script(1, vec![Ok(RunStatus::Running)]);
        let clock = FakeClock::new();

        let (result, _) = poll(&gateway, &clock, &CancelToken::new(), Duration::from_secs(12));
        assert_eq!(
            result.unwrap(),
            PollOutcome::DeadlineElapsed {
                last: Some(RunStatus::Running)
            }
        );
        // Last sleep is clipped to the deadline.
        assert_eq!(
            clock.sleeps(),
            vec![INTERVAL, INTERVAL, Duration::from_secs(2)]
        );
        assert_eq!(clock.now(), Duration::from_secs(12));
    }

    #[test]
    fn transport_errors_are_absorbed() {
        let gateway = FakeGateway::new(&[(1, "A")]).script(
            1,
            vec![
                Err(transport_error()),
                Err(transport_error()),
                Ok(RunStatus::Success),
            ],
        );
        let clock = FakeClock::new();

        let (result, events) = poll(&gateway, &clock, &CancelToken::new(), Duration::from_secs(600));
        assert_eq!(result.unwrap(), PollOutcome::Finished(RunStatus::Success));
        assert!(matches!(events[0], PollEvent::TransientError { .. }));
        if let PollEvent::TransientError { message } = &events[1] {
            assert!(message.contains("connection reset"));
        }
    }

    #[test]
    fn persistent_transport_errors_end_in_timeout() {
        let gateway = FakeGateway::new(&[(1, "A")]).script(1, vec![Err(transport_error())]);
        let clock = FakeClock::new();

        let (result, _) = poll(&gateway, &clock, &CancelToken::new(), Duration::from_secs(30));
        assert_eq!(result.unwrap(), PollOutcome::DeadlineElapsed { last: None });
    }

    #[test]
    fn remote_timeout_is_a_terminal_status() {
        let gateway = FakeGateway::new(&[(1, "A")]).script(1, vec![Ok(RunStatus::Timeout)]);
        let clock = FakeClock::new();

        let (result, events) = poll(&gateway, &clock, &CancelToken::new(), Duration::from_secs(600));
        assert_eq!(result.unwrap(), PollOutcome::Finished(RunStatus::Timeout));
        assert_eq!(events, vec![PollEvent::StatusChanged(RunStatus::Timeout)]);
        assert!(clock.sleeps().is_empty());
    }

    #[test]
    fn status_repeated_across_a_failed_query_still_collapses() {
        let gateway = FakeGateway::new(&[(1, "A")]).script(
            1,
            vec![
                Ok(RunStatus::Running),
                Err(transport_error()),
                Ok(RunStatus::Running),
                Ok(RunStatus::Success),
            ],
        );
        let clock = FakeClock::new();

        let (result, events) = poll(&gateway, &clock, &CancelToken::new(), Duration::from_secs(600));
        assert_eq!(result.unwrap(), PollOutcome::Finished(RunStatus::Success));
        assert_eq!(events[0], PollEvent::StatusChanged(RunStatus::Running));
        assert!(matches!(events[1], PollEvent::TransientError { .. }));
        assert_eq!(
            events[2],
            PollEvent::StillWaiting {
                status: RunStatus::Running,
                repeats: 1,
                elapsed: INTERVAL * 2,
            }
        );
        assert_eq!(events[3], PollEvent::StatusChanged(RunStatus::Success));
    }

    #[test]
    fn cancel_during_sleep_interrupts() {
        let gateway = FakeGateway::new(&[(1, "A")]).script(1, vec![Ok(RunStatus::Running)]);
        let clock = FakeClock::new().cancel_on_sleep(2);

        let cancel = CancelToken::new();
        let (result, _) = poll(&gateway, &clock, &cancel, Duration::from_secs(600));
        assert_eq!(result.unwrap_err().code, ErrorCode::SequenceInterrupted);
        assert_eq!(
            gateway.calls(),
            vec![
                format!("status:{}", HANDLE),
                format!("status:{}", HANDLE)
            ]
        );
    }
}
