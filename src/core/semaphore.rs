//! [`Gateway`] implementation for the Semaphore REST API.
//!
//! Endpoints used (project scoped unless noted):
//! - `GET  /api/ping` (unscoped) - connectivity
//! - `GET  /api/user` (unscoped) - who the token belongs to
//! - `GET  /api/project/{p}/environment` - prerequisite lookup
//! - `GET  /api/project/{p}/templates` - unit listing
//! - `POST /api/project/{p}/tasks` - launch
//! - `GET  /api/project/{p}/tasks/{t}` - status
//! - `GET  /api/project/{p}/tasks/{t}/output` - output lines

use serde_json::{json, Value};
use std::time::Duration;

use crate::config::OrchestratorConfig;
use crate::error::{Error, GatewayCallDetails, Result};
use crate::gateway::{Gateway, RunHandle, RunStatus, Session, Unit};
use crate::http::{self, ApiClient};

pub struct SemaphoreGateway {
    client: ApiClient,
    project_id: u64,
    launch_success_codes: Vec<u16>,
    metadata_timeout: Duration,
    status_timeout: Duration,
}

impl SemaphoreGateway {
    pub fn new(config: &OrchestratorConfig) -> Result<Self> {
        let client = ApiClient::new(
            &config.base_url,
            Some(config.token.as_str()),
            config.accept_invalid_certs,
        )?;

        Ok(Self {
            client,
            project_id: config.project_id,
            launch_success_codes: config.launch_success_codes.clone(),
            metadata_timeout: config.timings.metadata_timeout,
            status_timeout: config.timings.status_timeout,
        })
    }

    fn project_path(&self, suffix: &str) -> String {
        format!("/api/project/{}{}", self.project_id, suffix)
    }
}

impl Gateway for SemaphoreGateway {
    fn ping(&self) -> Result<()> {
        let endpoint = "/api/ping";
        let url = self.client.url(endpoint);

        let response = self
            .client
            .get_raw(endpoint, self.metadata_timeout)
            .map_err(|err| {
                let error = err.details["error"].as_str().map(str::to_string);
                Error::gateway_unreachable(GatewayCallDetails {
                    method: "GET".to_string(),
                    url: url.clone(),
                    status: None,
                    body: None,
                    error,
                })
            })?;

        if response.status != 200 {
            return Err(Error::gateway_unreachable(http::call_details(
                "GET",
                &url,
                Some(&response),
                None,
            )));
        }

        Ok(())
    }

    fn authenticate(&self) -> Result<Session> {
        let user = self.client.get_json("/api/user", self.metadata_timeout)?;
        Ok(session_from_json(&user))
    }

    fn check_prerequisite(&self, name: &str) -> Result<bool> {
        let environments = self
            .client
            .get_json(&self.project_path("/environment"), self.metadata_timeout)?;
        Ok(contains_named(&environments, name))
    }

    fn list_units(&self) -> Result<Vec<Unit>> {
        let templates = self
            .client
            .get_json(&self.project_path("/templates"), self.metadata_timeout)?;
        Ok(units_from_json(&templates))
    }

    fn launch_unit(&self, unit: &Unit) -> Result<RunHandle> {
        let endpoint = self.project_path("/tasks");
        let url = self.client.url(&endpoint);
        let payload = json!({
            "template_id": unit.id,
            "debug": false,
            "dry_run": false,
        });

        // One-shot: a transport failure here is a launch failure, never retried.
        let response = self
            .client
            .post_raw(&endpoint, &payload, self.metadata_timeout)
            .map_err(|err| {
                let mut launch = Error::run_launch_failed(GatewayCallDetails {
                    method: "POST".to_string(),
                    url: url.clone(),
                    status: None,
                    body: None,
                    error: err.details["error"].as_str().map(str::to_string),
                });
                launch.message = format!("Failed to start unit: {}", err.message);
                launch
            })?;

        if !self.launch_success_codes.contains(&response.status) {
            return Err(Error::run_launch_failed(http::call_details(
                "POST",
                &url,
                Some(&response),
                None,
            )));
        }

        let task = http::parse_json(&response, "POST", &url)?;
        task_id_from_json(&task).map(RunHandle).ok_or_else(|| {
            let mut details = http::call_details("POST", &url, Some(&response), None);
            details.error = Some("response has no task id".to_string());
            Error::run_launch_failed(details)
        })
    }

    fn run_status(&self, handle: RunHandle) -> Result<RunStatus> {
        let endpoint = self.project_path(&format!("/tasks/{}", handle));
        let url = self.client.url(&endpoint);
        let response = self.client.get_raw(&endpoint, self.status_timeout)?;

        // Any non-2xx answer while polling is transient, including auth hiccups.
        if !response.is_success() {
            return Err(Error::gateway_transport(http::call_details(
                "GET",
                &url,
                Some(&response),
                None,
            )));
        }

        let task = http::parse_json(&response, "GET", &url)?;
        Ok(status_from_json(&task))
    }

    fn run_output(&self, handle: RunHandle) -> Result<Vec<String>> {
        let output = self.client.get_json(
            &self.project_path(&format!("/tasks/{}/output", handle)),
            self.metadata_timeout,
        )?;
        Ok(output_lines_from_json(&output))
    }
}

fn session_from_json(user: &Value) -> Session {
    Session {
        username: user
            .get("username")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        admin: user.get("admin").and_then(Value::as_bool).unwrap_or(false),
    }
}

fn contains_named(items: &Value, name: &str) -> bool {
    items
        .as_array()
        .map(|items| {
            items
                .iter()
                .any(|item| item.get("name").and_then(Value::as_str) == Some(name))
        })
        .unwrap_or(false)
}

/// Templates without a numeric id or a name cannot be launched and are skipped.
fn units_from_json(templates: &Value) -> Vec<Unit> {
    templates
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(Unit {
                        id: item.get("id")?.as_u64()?,
                        name: item.get("name")?.as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn task_id_from_json(task: &Value) -> Option<u64> {
    task.get("id").and_then(Value::as_u64)
}

fn status_from_json(task: &Value) -> RunStatus {
    RunStatus::parse(
        task.get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown"),
    )
}

fn output_lines_from_json(output: &Value) -> Vec<String> {
    output
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("output").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
