use crate::error::{Error, ErrorCode, Result};
use crate::gateway::{Gateway, RunHandle, Unit};

/// Starts runs. Does not wait for them.
pub struct TaskLauncher<'a> {
    gateway: &'a dyn Gateway,
}

impl<'a> TaskLauncher<'a> {
    pub fn new(gateway: &'a dyn Gateway) -> Self {
        Self { gateway }
    }

    /// Single attempt. Any failure comes back as `run.launch_failed`, keeping
    /// whatever call details the gateway attached.
    pub fn launch(&self, unit: &Unit) -> Result<RunHandle> {
        self.gateway.launch_unit(unit).map_err(|err| {
            if err.code == ErrorCode::RunLaunchFailed {
                return err;
            }
            let mut launch = Error::new(
                ErrorCode::RunLaunchFailed,
                format!("Failed to start unit '{}': {}", unit.name, err.message),
                err.details,
            );
            launch.hints = err.hints;
            launch
        })
    }
}
