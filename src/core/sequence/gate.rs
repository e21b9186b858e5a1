use crate::error::Result;
use crate::gateway::Gateway;

/// One-time check that a required remote resource exists before any step runs.
pub struct PrerequisiteGate<'a> {
    gateway: &'a dyn Gateway,
    resource: Option<&'a str>,
}

impl<'a> PrerequisiteGate<'a> {
    /// With no resource configured the gate always passes.
    pub fn new(gateway: &'a dyn Gateway, resource: Option<&'a str>) -> Self {
        Self { gateway, resource }
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource
    }

    pub fn check(&self) -> Result<bool> {
        match self.resource {
            Some(name) => self.gateway.check_prerequisite(name),
            None => Ok(true),
        }
    }
}
