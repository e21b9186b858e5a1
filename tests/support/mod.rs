//! Scripted task service and virtual clock for sequence tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use orchestrator::clock::Clock;
use orchestrator::config::{ConfigSources, OrchestratorConfig};
use orchestrator::error::{Error, GatewayCallDetails};
use orchestrator::gateway::{Gateway, RunHandle, RunStatus, Session, Unit};
use orchestrator::interrupt::CancelToken;
use orchestrator::Result;

pub enum Launch {
    Accept,
    Reject(u16),
}

#[derive(Default)]
struct UnitScript {
    launch: Option<Launch>,
    statuses: VecDeque<RunStatus>,
    output: Vec<String>,
}

/// In-memory task service.
///
/// Each launch of unit `id` yields run `id * 100`. A run reports its scripted
/// statuses in order and then repeats the last one forever.
pub struct ScriptedService {
    prerequisite_present: bool,
    units: Vec<Unit>,
    scripts: RefCell<HashMap<u64, UnitScript>>,
    log: RefCell<Vec<String>>,
}

impl ScriptedService {
    pub fn new(units: &[(u64, &str)]) -> Self {
        Self {
            prerequisite_present: true,
            units: units
                .iter()
                .map(|(id, name)| Unit {
                    id: *id,
                    name: name.to_string(),
                })
                .collect(),
            scripts: RefCell::new(HashMap::new()),
            log: RefCell::new(Vec::new()),
        }
    }

    pub fn without_prerequisite(mut self) -> Self {
        self.prerequisite_present = false;
        self
    }

    pub fn statuses(self, unit_id: u64, statuses: &[&str]) -> Self {
        self.scripts.borrow_mut().entry(unit_id).or_default().statuses =
            statuses.iter().map(|s| RunStatus::parse(s)).collect();
        self
    }

    pub fn launch(self, unit_id: u64, launch: Launch) -> Self {
        self.scripts.borrow_mut().entry(unit_id).or_default().launch = Some(launch);
        self
    }

    pub fn output(self, unit_id: u64, lines: &[&str]) -> Self {
        self.scripts.borrow_mut().entry(unit_id).or_default().output =
            lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Every gateway call, in order.
    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }

    fn record(&self, entry: String) {
        self.log.borrow_mut().push(entry);
    }
}

fn call(method: &str, status: Option<u16>) -> GatewayCallDetails {
    GatewayCallDetails {
        method: method.to_string(),
        url: "https://semaphore.test/api/project/1/tasks".to_string(),
        status,
        body: status.map(|_| "{\"error\":\"rejected\"}".to_string()),
        error: None,
    }
}

impl Gateway for ScriptedService {
    fn ping(&self) -> Result<()> {
        self.record("ping".to_string());
        Ok(())
    }

    fn authenticate(&self) -> Result<Session> {
        self.record("authenticate".to_string());
        Ok(Session {
            username: "admin".to_string(),
            admin: true,
        })
    }

    fn check_prerequisite(&self, name: &str) -> Result<bool> {
        self.record(format!("prerequisite {}", name));
        Ok(self.prerequisite_present)
    }

    fn list_units(&self) -> Result<Vec<Unit>> {
        self.record("list".to_string());
        Ok(self.units.clone())
    }

    fn launch_unit(&self, unit: &Unit) -> Result<RunHandle> {
        self.record(format!("launch {}", unit.name));
        match self
            .scripts
            .borrow()
            .get(&unit.id)
            .and_then(|s| s.launch.as_ref())
        {
            Some(Launch::Reject(status)) => Err(Error::run_launch_failed(call("POST", Some(*status)))),
            Some(Launch::Accept) | None => Ok(RunHandle(unit.id * 100)),
        }
    }

    fn run_status(&self, handle: RunHandle) -> Result<RunStatus> {
        self.record(format!("status {}", handle));
        let mut scripts = self.scripts.borrow_mut();
        let Some(script) = scripts.get_mut(&(handle.0 / 100)) else {
            return Ok(RunStatus::Success);
        };
        if script.statuses.len() > 1 {
            return Ok(script.statuses.pop_front().unwrap());
        }
        Ok(script
            .statuses
            .front()
            .cloned()
            .unwrap_or(RunStatus::Success))
    }

    fn run_output(&self, handle: RunHandle) -> Result<Vec<String>> {
        self.record(format!("output {}", handle));
        Ok(self
            .scripts
            .borrow()
            .get(&(handle.0 / 100))
            .map(|s| s.output.clone())
            .unwrap_or_default())
    }
}

/// Time advances only when something sleeps.
#[derive(Default)]
pub struct VirtualClock {
    now: Cell<Duration>,
    sleeps: Cell<usize>,
    cancel_at_sleep: Cell<Option<usize>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate Ctrl-C during the `n`th sleep.
    pub fn interrupt_at_sleep(self, n: usize) -> Self {
        self.cancel_at_sleep.set(Some(n));
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.now.get()
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration, cancel: &CancelToken) {
        let count = self.sleeps.get() + 1;
        self.sleeps.set(count);
        if self.cancel_at_sleep.get() == Some(count) {
            cancel.cancel();
            return;
        }
        self.now.set(self.now.get() + duration);
    }
}

/// Configuration with a token and the given steps; everything else built in.
pub fn config(steps: &[&str]) -> OrchestratorConfig {
    let mut sources = ConfigSources::default();
    sources
        .assignments
        .insert("SEMAPHORE_API_TOKEN".to_string(), "test-token".to_string());
    sources.overrides.steps = steps.iter().map(|s| s.to_string()).collect();
    OrchestratorConfig::resolve(&sources).unwrap()
}
