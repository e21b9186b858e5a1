//! Capability surface of the remote task service.
//!
//! The sequencer and its helpers only ever talk to [`Gateway`]. The HTTP
//! implementation lives in `semaphore`; tests substitute in-memory fakes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

/// A remote work definition (a template), discovered by name.
///
/// `id` is only meaningful within the current process; units may be recreated
/// between runs, so it is never cached across steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub id: u64,
    pub name: String,
}

/// Handle for one execution of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunHandle(pub u64);

impl fmt::Display for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who the credentials belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub admin: bool,
}

/// Status of a run.
///
/// `success`, `error`, `failed` and `timeout` are terminal. Anything the service
/// reports that is not recognised is carried as `Other` and treated as still in
/// progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Error,
    Failed,
    Timeout,
    Other(String),
}

impl RunStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "waiting" | "pending" => RunStatus::Pending,
            "starting" | "running" => RunStatus::Running,
            "success" => RunStatus::Success,
            "error" => RunStatus::Error,
            "failed" => RunStatus::Failed,
            "timeout" => RunStatus::Timeout,
            other => RunStatus::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Error => "error",
            RunStatus::Failed => "failed",
            RunStatus::Timeout => "timeout",
            RunStatus::Other(raw) => raw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Success | RunStatus::Error | RunStatus::Failed | RunStatus::Timeout
        )
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Success)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operations the orchestrator needs from the task service.
///
/// Failure signals:
/// - `authenticate`: `gateway.auth_failed`
/// - `launch_unit`: `run.launch_failed`
/// - everything else: `gateway.transport` (retryable only while polling)
pub trait Gateway {
    /// Connectivity probe; does not need credentials.
    fn ping(&self) -> Result<()>;

    fn authenticate(&self) -> Result<Session>;

    /// Whether the named pre-existing resource exists.
    fn check_prerequisite(&self, name: &str) -> Result<bool>;

    /// Current unit listing, in service order.
    fn list_units(&self) -> Result<Vec<Unit>>;

    fn launch_unit(&self, unit: &Unit) -> Result<RunHandle>;

    fn run_status(&self, handle: RunHandle) -> Result<RunStatus>;

    /// Output lines of a run, oldest first.
    fn run_output(&self, handle: RunHandle) -> Result<Vec<String>>;
}
