//! Effective orchestrator configuration.
//!
//! Values are layered, lowest precedence first:
//! 1. built-in defaults / orchestrator.json
//! 2. process environment (`SEMAPHORE_*`)
//! 3. `KEY=VALUE` arguments
//! 4. explicit CLI flags
//!
//! The result is a plain record handed to the gateway and sequencer; nothing
//! here is global.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::defaults::OrchestratorFile;
use crate::error::{Error, Result};

pub const KEY_URL: &str = "SEMAPHORE_URL";
pub const KEY_TOKEN: &str = "SEMAPHORE_API_TOKEN";
pub const KEY_PROJECT_ID: &str = "SEMAPHORE_PROJECT_ID";

const KNOWN_KEYS: [&str; 3] = [KEY_URL, KEY_TOKEN, KEY_PROJECT_ID];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    pub poll_interval: Duration,
    pub step_timeout: Duration,
    pub step_pause: Duration,
    pub metadata_timeout: Duration,
    pub status_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub base_url: String,
    pub token: String,
    pub project_id: u64,
    pub accept_invalid_certs: bool,
    pub prerequisite: Option<String>,
    pub sequence: Vec<String>,
    pub launch_success_codes: Vec<u16>,
    pub timings: Timings,
    pub diagnostic_lines: usize,
    pub marker_prefixes: Vec<String>,
}

/// Flags that override everything else when present.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub steps: Vec<String>,
    pub step_timeout_secs: Option<u64>,
    pub poll_interval_secs: Option<u64>,
    pub pause_secs: Option<u64>,
    pub no_prerequisite: bool,
}

/// Raw inputs the configuration is resolved from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    pub file: OrchestratorFile,
    pub env: HashMap<String, String>,
    pub assignments: HashMap<String, String>,
    pub overrides: ConfigOverrides,
}

impl ConfigSources {
    /// Capture the relevant process environment variables.
    pub fn with_process_env(mut self) -> Self {
        for key in KNOWN_KEYS {
            if let Ok(value) = std::env::var(key) {
                self.env.insert(key.to_string(), value);
            }
        }
        self
    }

    /// Look up a key: assignments first, then environment. Blank values count as unset.
    fn lookup(&self, key: &str) -> Option<&str> {
        self.assignments
            .get(key)
            .or_else(|| self.env.get(key))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl OrchestratorConfig {
    /// Resolve configuration that needs a token (anything talking to the service).
    pub fn resolve(sources: &ConfigSources) -> Result<Self> {
        let config = Self::resolve_unauthenticated(sources)?;
        if config.token.is_empty() {
            return Err(Error::config_missing_key(KEY_TOKEN, None));
        }
        Ok(config)
    }

    /// Resolve without requiring a token. Used to display configuration.
    pub fn resolve_unauthenticated(sources: &ConfigSources) -> Result<Self> {
        let file = &sources.file;

        let base_url = sources
            .lookup(KEY_URL)
            .map(str::to_string)
            .unwrap_or_else(|| file.connection.base_url.clone());
        let base_url = normalize_base_url(&base_url)?;

        let project_id = match sources.lookup(KEY_PROJECT_ID) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                Error::config_invalid_value(
                    KEY_PROJECT_ID,
                    Some(raw.to_string()),
                    "must be a positive integer",
                )
            })?,
            None => file.connection.project_id,
        };
        if project_id == 0 {
            return Err(Error::config_invalid_value(
                KEY_PROJECT_ID,
                Some("0".to_string()),
                "must be a positive integer",
            ));
        }

        let token = sources
            .lookup(KEY_TOKEN)
            .map(str::to_string)
            .or_else(|| file.connection.token.clone())
            .unwrap_or_default();

        let sequence = if sources.overrides.steps.is_empty() {
            file.sequence.steps.clone()
        } else {
            sources.overrides.steps.clone()
        };
        validate_sequence(&sequence)?;

        let prerequisite = if sources.overrides.no_prerequisite {
            None
        } else {
            file.sequence
                .prerequisite
                .as_ref()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
        };

        if file.sequence.launch_success_codes.is_empty() {
            return Err(Error::config_invalid_value(
                "sequence.launch_success_codes",
                None,
                "at least one success code is required",
            ));
        }

        let t = &file.timings;
        let overrides = &sources.overrides;
        let timings = Timings {
            poll_interval: secs(
                "timings.poll_interval_secs",
                overrides.poll_interval_secs.unwrap_or(t.poll_interval_secs),
            )?,
            step_timeout: secs(
                "timings.step_timeout_secs",
                overrides.step_timeout_secs.unwrap_or(t.step_timeout_secs),
            )?,
            step_pause: Duration::from_secs(overrides.pause_secs.unwrap_or(t.step_pause_secs)),
            metadata_timeout: secs("timings.metadata_timeout_secs", t.metadata_timeout_secs)?,
            status_timeout: secs("timings.status_timeout_secs", t.status_timeout_secs)?,
        };

        Ok(Self {
            base_url,
            token,
            project_id,
            accept_invalid_certs: file.connection.accept_invalid_certs,
            prerequisite,
            sequence,
            launch_success_codes: file.sequence.launch_success_codes.clone(),
            timings,
            diagnostic_lines: file.diagnostics.max_lines,
            marker_prefixes: file.diagnostics.marker_prefixes.clone(),
        })
    }

    /// Serializable view with the token redacted.
    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            base_url: self.base_url.clone(),
            project_id: self.project_id,
            token_set: !self.token.is_empty(),
            accept_invalid_certs: self.accept_invalid_certs,
            prerequisite: self.prerequisite.clone(),
            sequence: self.sequence.clone(),
            launch_success_codes: self.launch_success_codes.clone(),
            poll_interval_secs: self.timings.poll_interval.as_secs(),
            step_timeout_secs: self.timings.step_timeout.as_secs(),
            step_pause_secs: self.timings.step_pause.as_secs(),
            metadata_timeout_secs: self.timings.metadata_timeout.as_secs(),
            status_timeout_secs: self.timings.status_timeout.as_secs(),
            diagnostic_lines: self.diagnostic_lines,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RedactedConfig {
    pub base_url: String,
    pub project_id: u64,
    pub token_set: bool,
    pub accept_invalid_certs: bool,
    pub prerequisite: Option<String>,
    pub sequence: Vec<String>,
    pub launch_success_codes: Vec<u16>,
    pub poll_interval_secs: u64,
    pub step_timeout_secs: u64,
    pub step_pause_secs: u64,
    pub metadata_timeout_secs: u64,
    pub status_timeout_secs: u64,
    pub diagnostic_lines: usize,
}

fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::config_invalid_value(
            KEY_URL,
            Some(raw.to_string()),
            "must start with http:// or https://",
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_sequence(sequence: &[String]) -> Result<()> {
    if sequence.is_empty() {
        return Err(Error::config_invalid_value(
            "sequence.steps",
            None,
            "the sequence needs at least one step",
        ));
    }

    let blank: Vec<String> = sequence
        .iter()
        .enumerate()
        .filter(|(_, name)| name.trim().is_empty())
        .map(|(idx, _)| format!("#{}", idx + 1))
        .collect();
    if !blank.is_empty() {
        return Err(Error::config_invalid_value(
            "sequence.steps",
            Some(blank.join(", ")),
            "step names cannot be blank",
        ));
    }

    Ok(())
}

fn secs(key: &str, value: u64) -> Result<Duration> {
    if value == 0 {
        return Err(Error::config_invalid_value(
            key,
            Some("0".to_string()),
            "must be greater than zero",
        ));
    }
    Ok(Duration::from_secs(value))
}
