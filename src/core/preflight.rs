//! Connectivity and credential checks run before a sequence starts.

use serde::Serialize;

use crate::error::Result;
use crate::gateway::{Gateway, Session};
use crate::sequence::PrerequisiteGate;

#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub session: Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisite: Option<String>,
    /// `None` when no prerequisite is configured or the gate was not checked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prerequisite_present: Option<bool>,
}

impl PreflightReport {
    pub fn is_ready(&self) -> bool {
        self.prerequisite_present != Some(false)
    }
}

/// Ping and authenticate. Errors are fatal and never retried.
pub fn connect(gateway: &dyn Gateway) -> Result<Session> {
    gateway.ping()?;
    log_status!("preflight", "Task service is reachable");

    let session = gateway.authenticate()?;
    log_status!(
        "preflight",
        "Authenticated as {}{}",
        session.username,
        if session.admin { " (admin)" } else { "" }
    );
    Ok(session)
}

/// Ping, authenticate and check the prerequisite without running anything.
pub fn check(gateway: &dyn Gateway, prerequisite: Option<&str>) -> Result<PreflightReport> {
    let session = connect(gateway)?;

    let gate = PrerequisiteGate::new(gateway, prerequisite);
    let prerequisite_present = match gate.resource() {
        Some(_) => Some(gate.check()?),
        None => None,
    };

    Ok(PreflightReport {
        session,
        prerequisite: prerequisite.map(str::to_string),
        prerequisite_present,
    })
}
