//! HTTP client for the task service API.
//!
//! Thin wrapper over the blocking reqwest client: bearer auth, per-request
//! timeouts and uniform error mapping. Interpretation of status codes beyond
//! "2xx or not" is left to the caller.

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::Value;
use std::time::Duration;

use crate::error::{Error, GatewayCallDetails, Result};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const BODY_PREVIEW_CHARS: usize = 500;

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    auth_header: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<&str>, accept_invalid_certs: bool) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("orchestrator/{}", VERSION))
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .map_err(|e| {
                Error::internal_io(e.to_string(), Some("create HTTP client".to_string()))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: token
                .filter(|t| !t.is_empty())
                .map(|t| format!("Bearer {}", t)),
        })
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// GET without interpreting the status code. Errors only on transport failure.
    pub fn get_raw(&self, endpoint: &str, timeout: Duration) -> Result<RawResponse> {
        let url = self.url(endpoint);
        let request = self.authorize(self.client.get(&url)).timeout(timeout);
        send(request, "GET", &url)
    }

    /// POST a JSON body without interpreting the status code.
    pub fn post_raw(&self, endpoint: &str, body: &Value, timeout: Duration) -> Result<RawResponse> {
        let url = self.url(endpoint);
        let request = self
            .authorize(self.client.post(&url))
            .json(body)
            .timeout(timeout);
        send(request, "POST", &url)
    }

    /// GET and parse a JSON body. Non-2xx answers are errors:
    /// 401/403 map to `gateway.auth_failed`, everything else to `gateway.transport`.
    pub fn get_json(&self, endpoint: &str, timeout: Duration) -> Result<Value> {
        let response = self.get_raw(endpoint, timeout)?;
        let url = self.url(endpoint);

        if !response.is_success() {
            let details = call_details("GET", &url, Some(&response), None);
            return Err(match response.status {
                401 | 403 => Error::gateway_auth_failed(details),
                _ => Error::gateway_transport(details),
            });
        }

        parse_json(&response, "GET", &url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_header {
            Some(value) => request.header("Authorization", value),
            None => request,
        }
    }
}

fn send(request: RequestBuilder, method: &str, url: &str) -> Result<RawResponse> {
    let response = request
        .send()
        .map_err(|e| Error::gateway_transport(call_details(method, url, None, Some(&e))))?;

    let status = response.status().as_u16();
    let body = response.text().map_err(|e| {
        Error::gateway_transport(GatewayCallDetails {
            status: Some(status),
            ..call_details(method, url, None, Some(&e))
        })
    })?;

    Ok(RawResponse { status, body })
}

/// Parse a JSON body; a body that is not JSON is an unexpected response, not a transport error.
pub fn parse_json(response: &RawResponse, method: &str, url: &str) -> Result<Value> {
    serde_json::from_str(&response.body).map_err(|e| {
        let mut details = call_details(method, url, Some(response), None);
        details.error = Some(format!("Invalid JSON response: {}", e));
        Error::gateway_unexpected_response(details)
    })
}

pub fn call_details(
    method: &str,
    url: &str,
    response: Option<&RawResponse>,
    error: Option<&reqwest::Error>,
) -> GatewayCallDetails {
    GatewayCallDetails {
        method: method.to_string(),
        url: url.to_string(),
        status: response.map(|r| r.status),
        body: response
            .map(|r| preview(&r.body))
            .filter(|b| !b.is_empty()),
        error: error.map(describe),
    }
}

fn describe(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out ({})", e)
    } else if e.is_connect() {
        format!("connection failed ({})", e)
    } else {
        e.to_string()
    }
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_PREVIEW_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(BODY_PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}
