use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::paths;

/// Root structure of orchestrator.json
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OrchestratorFile {
    #[serde(default)]
    pub connection: ConnectionDefaults,

    #[serde(default)]
    pub sequence: SequenceDefaults,

    #[serde(default)]
    pub timings: TimingDefaults,

    #[serde(default)]
    pub diagnostics: DiagnosticDefaults,
}

/// Where the task service lives and how to talk to it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionDefaults {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_project_id")]
    pub project_id: u64,

    /// The service sits on an internal VLAN behind a self-signed certificate.
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// The ordered list of units to run and the gate in front of it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceDefaults {
    #[serde(default = "default_prerequisite")]
    pub prerequisite: Option<String>,

    #[serde(default = "default_steps")]
    pub steps: Vec<String>,

    #[serde(default = "default_launch_success_codes")]
    pub launch_success_codes: Vec<u16>,
}

/// All durations are whole seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingDefaults {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_step_timeout_secs")]
    pub step_timeout_secs: u64,

    #[serde(default = "default_step_pause_secs")]
    pub step_pause_secs: u64,

    #[serde(default = "default_metadata_timeout_secs")]
    pub metadata_timeout_secs: u64,

    #[serde(default = "default_status_timeout_secs")]
    pub status_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiagnosticDefaults {
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,

    /// Output lines starting with one of these are framework chatter, not task output.
    #[serde(default = "default_marker_prefixes")]
    pub marker_prefixes: Vec<String>,
}

impl Default for ConnectionDefaults {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_id: default_project_id(),
            accept_invalid_certs: default_accept_invalid_certs(),
            token: None,
        }
    }
}

impl Default for SequenceDefaults {
    fn default() -> Self {
        Self {
            prerequisite: default_prerequisite(),
            steps: default_steps(),
            launch_success_codes: default_launch_success_codes(),
        }
    }
}

impl Default for TimingDefaults {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            step_timeout_secs: default_step_timeout_secs(),
            step_pause_secs: default_step_pause_secs(),
            metadata_timeout_secs: default_metadata_timeout_secs(),
            status_timeout_secs: default_status_timeout_secs(),
        }
    }
}

impl Default for DiagnosticDefaults {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
            marker_prefixes: default_marker_prefixes(),
        }
    }
}

// =============================================================================
// Default value functions
// =============================================================================

fn default_base_url() -> String {
    "https://10.10.20.10:2443".to_string()
}

fn default_project_id() -> u64 {
    1
}

fn default_accept_invalid_certs() -> bool {
    true
}

fn default_prerequisite() -> Option<String> {
    Some("privatebox-env-dns".to_string())
}

fn default_steps() -> Vec<String> {
    [
        "Generate Templates",
        "DynDNS 2a: Prepare Configuration",
        "DynDNS 2b: Configure OPNsense",
        "DynDNS 3: Configure AdGuard",
        "DynDNS 4: Cleanup DNS Records",
        "DynDNS 5: Configure Caddy",
        "DynDNS 6: Verify Complete Setup",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_launch_success_codes() -> Vec<u16> {
    vec![201]
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_step_timeout_secs() -> u64 {
    600
}

fn default_step_pause_secs() -> u64 {
    5
}

fn default_metadata_timeout_secs() -> u64 {
    10
}

fn default_status_timeout_secs() -> u64 {
    5
}

fn default_max_lines() -> usize {
    5
}

fn default_marker_prefixes() -> Vec<String> {
    vec!["Task ".to_string()]
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load orchestrator.json.
///
/// An explicit path must exist and parse. The default path is optional: when it is
/// missing or broken the built-in defaults are used.
pub fn load(explicit: Option<&Path>) -> Result<OrchestratorFile> {
    if let Some(path) = explicit {
        return load_from(path);
    }

    let path = match paths::orchestrator_json() {
        Ok(path) => path,
        Err(_) => return Ok(OrchestratorFile::default()),
    };

    if !path.exists() {
        return Ok(OrchestratorFile::default());
    }

    match load_from(&path) {
        Ok(file) => Ok(file),
        Err(err) => {
            log_status!(
                "config",
                "Ignoring {}: {}",
                path.display(),
                err.details
                    .get("error")
                    .and_then(|v| v.as_str())
                    .unwrap_or(err.message.as_str())
            );
            Ok(OrchestratorFile::default())
        }
    }
}

/// Load and parse a specific config file.
pub fn load_from(path: &Path) -> Result<OrchestratorFile> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::internal_io(e.to_string(), Some(format!("read {}", path.display()))))?;
    parse(&content, &path.display().to_string())
}

pub fn parse(content: &str, origin: &str) -> Result<OrchestratorFile> {
    serde_json::from_str(content).map_err(|e| Error::config_invalid_json(origin, e))
}

/// Get built-in defaults (ignoring any file config)
pub fn builtin() -> OrchestratorFile {
    OrchestratorFile::default()
}
