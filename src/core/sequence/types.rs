use serde::{Deserialize, Serialize};

use crate::error::Hint;
use crate::gateway::{RunHandle, RunStatus};
use crate::interrupt::INTERRUPTED_EXIT_CODE;

/// Lifecycle of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    NotStarted,
    Resolving,
    Launching,
    Polling,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceOutcome {
    Completed,
    Aborted,
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    PrerequisiteMissing,
    UnitNotFound,
    LaunchError,
    RunFailed,
    RunTimeout,
    TransportError,
    Interrupted,
}

/// Why the sequence stopped early.
///
/// `step` is `None` when nothing was attempted (gate failures).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    pub reason: FailureReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<Hint>,
}

/// What happened to one attempted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,
    pub state: StepState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    pub elapsed_secs: u64,
}

impl StepReport {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: StepState::NotStarted,
            unit_id: None,
            run: None,
            status: None,
            elapsed_secs: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceResult {
    pub outcome: SequenceOutcome,
    /// Steps that reached `succeeded`, in execution order.
    pub succeeded: Vec<String>,
    pub failed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<StepFailure>,
    /// Steps never attempted.
    pub aborted_remaining_count: usize,
    pub total_steps: usize,
    pub steps: Vec<StepReport>,
    pub started_at: String,
    pub finished_at: String,
}

impl SequenceResult {
    pub fn is_completed(&self) -> bool {
        self.outcome == SequenceOutcome::Completed
    }

    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            SequenceOutcome::Completed => 0,
            SequenceOutcome::Aborted => 1,
            SequenceOutcome::Interrupted => INTERRUPTED_EXIT_CODE,
        }
    }
}
