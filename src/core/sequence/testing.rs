//! In-memory gateway and virtual clock for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use crate::clock::Clock;
use crate::error::{Error, GatewayCallDetails, Result};
use crate::gateway::{Gateway, RunHandle, RunStatus, Session, Unit};
use crate::interrupt::CancelToken;

pub(crate) const RUN_OFFSET: u64 = 1000;

pub(crate) fn transport_error() -> Error {
    Error::gateway_transport(GatewayCallDetails {
        method: "GET".to_string(),
        url: "https://fake/api".to_string(),
        status: None,
        body: None,
        error: Some("connection reset".to_string()),
    })
}

fn launch_error(status: u16) -> Error {
    Error::run_launch_failed(GatewayCallDetails {
        method: "POST".to_string(),
        url: "https://fake/api/project/1/tasks".to_string(),
        status: Some(status),
        body: Some("{\"error\":\"nope\"}".to_string()),
        error: None,
    })
}

/// Runs get handle `unit id + RUN_OFFSET`. A status script's last entry repeats.
#[derive(Default)]
pub(crate) struct FakeGateway {
    pub prerequisite: bool,
    pub prerequisite_fails: bool,
    pub listing_fails: bool,
    pub units: Vec<Unit>,
    pub failing_launches: HashSet<u64>,
    pub scripts: RefCell<HashMap<u64, VecDeque<Result<RunStatus>>>>,
    pub outputs: HashMap<u64, Vec<String>>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeGateway {
    pub fn new(units: &[(u64, &str)]) -> Self {
        Self {
            prerequisite: true,
            units: units
                .iter()
                .map(|(id, name)| Unit {
                    id: *id,
                    name: name.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn script(self, unit_id: u64, statuses: Vec<Result<RunStatus>>) -> Self {
        self.scripts
            .borrow_mut()
            .insert(unit_id + RUN_OFFSET, statuses.into_iter().collect());
        self
    }

    pub fn output(mut self, unit_id: u64, lines: &[&str]) -> Self {
        self.outputs.insert(
            unit_id + RUN_OFFSET,
            lines.iter().map(|l| l.to_string()).collect(),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl Gateway for FakeGateway {
    fn ping(&self) -> Result<()> {
        self.record("ping".to_string());
        Ok(())
    }

    fn authenticate(&self) -> Result<Session> {
        self.record("authenticate".to_string());
        Ok(Session {
            username: "tester".to_string(),
            admin: false,
        })
    }

    fn check_prerequisite(&self, name: &str) -> Result<bool> {
        self.record(format!("prerequisite:{}", name));
        if self.prerequisite_fails {
            return Err(transport_error());
        }
        Ok(self.prerequisite)
    }

    fn list_units(&self) -> Result<Vec<Unit>> {
        self.record("list".to_string());
        if self.listing_fails {
            return Err(transport_error());
        }
        Ok(self.units.clone())
    }

    fn launch_unit(&self, unit: &Unit) -> Result<RunHandle> {
        self.record(format!("launch:{}", unit.name));
        if self.failing_launches.contains(&unit.id) {
            return Err(launch_error(400));
        }
        Ok(RunHandle(unit.id + RUN_OFFSET))
    }

    fn run_status(&self, handle: RunHandle) -> Result<RunStatus> {
        self.record(format!("status:{}", handle));
        let mut scripts = self.scripts.borrow_mut();
        let script = match scripts.get_mut(&handle.0) {
            Some(script) => script,
            None => return Ok(RunStatus::Success),
        };
        if script.len() > 1 {
            return script.pop_front().unwrap_or(Ok(RunStatus::Success));
        }
        script.front().cloned().unwrap_or(Ok(RunStatus::Success))
    }

    fn run_output(&self, handle: RunHandle) -> Result<Vec<String>> {
        self.record(format!("output:{}", handle));
        self.outputs
            .get(&handle.0)
            .cloned()
            .ok_or_else(transport_error)
    }
}

/// Virtual time: `sleep` advances `now` instantly.
#[derive(Default)]
pub(crate) struct FakeClock {
    now: Cell<Duration>,
    sleeps: RefCell<Vec<Duration>>,
    cancel_on_sleep: Cell<Option<usize>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the token during the `n`th sleep (1-based).
    pub fn cancel_on_sleep(self, n: usize) -> Self {
        self.cancel_on_sleep.set(Some(n));
        self
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration, cancel: &CancelToken) {
        let mut sleeps = self.sleeps.borrow_mut();
        sleeps.push(duration);
        if self.cancel_on_sleep.get() == Some(sleeps.len()) {
            cancel.cancel();
            return;
        }
        self.now.set(self.now.get() + duration);
    }
}
