mod diagnostics;
mod gate;
mod launcher;
mod poller;
mod resolver;
mod runner;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use diagnostics::FailureReporter;
pub use gate::PrerequisiteGate;
pub use launcher::TaskLauncher;
pub use poller::{CompletionPoller, PollEvent, PollOutcome};
pub use resolver::UnitResolver;
pub use runner::Sequencer;
pub use types::{
    FailureReason, SequenceOutcome, SequenceResult, StepFailure, StepReport, StepState,
};
