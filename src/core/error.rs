use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigMissingKey,
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,
    ValidationInvalidJson,

    GatewayUnreachable,
    GatewayAuthFailed,
    GatewayTransport,
    GatewayUnexpectedResponse,

    PrerequisiteMissing,
    UnitNotFound,
    RunLaunchFailed,
    RunFailed,
    RunTimeout,

    SequenceInterrupted,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigMissingKey => "config.missing_key",
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",
            ErrorCode::ValidationInvalidJson => "validation.invalid_json",

            ErrorCode::GatewayUnreachable => "gateway.unreachable",
            ErrorCode::GatewayAuthFailed => "gateway.auth_failed",
            ErrorCode::GatewayTransport => "gateway.transport",
            ErrorCode::GatewayUnexpectedResponse => "gateway.unexpected_response",

            ErrorCode::PrerequisiteMissing => "sequence.prerequisite_missing",
            ErrorCode::UnitNotFound => "unit.not_found",
            ErrorCode::RunLaunchFailed => "run.launch_failed",
            ErrorCode::RunFailed => "run.failed",
            ErrorCode::RunTimeout => "run.timeout",

            ErrorCode::SequenceInterrupted => "sequence.interrupted",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMissingKeyDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tried: Option<Vec<String>>,
}

/// Details attached to every error raised while talking to the task service.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayCallDetails {
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundDetails {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalJsonErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
    pub retryable: Option<bool>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
            retryable: None,
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
        id: Option<String>,
        tried: Option<Vec<String>>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
            id,
            tried,
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn validation_invalid_json(err: serde_json::Error, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": err.to_string(),
            "context": context,
        });

        Self::new(ErrorCode::ValidationInvalidJson, "Invalid JSON", details)
    }

    pub fn config_missing_key(key: impl Into<String>, path: Option<String>) -> Self {
        let key = key.into();
        let hint = format!(
            "Pass {}=<value> as an argument or export it in the environment",
            key
        );
        let details = to_details(ConfigMissingKeyDetails { key, path });

        Self::new(
            ErrorCode::ConfigMissingKey,
            "Missing required configuration key",
            details,
        )
        .with_hint(hint)
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = to_details(ConfigInvalidJsonDetails {
            path: path.into(),
            error: err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    pub fn gateway_unreachable(details: GatewayCallDetails) -> Self {
        Self::new(
            ErrorCode::GatewayUnreachable,
            format!("Task service is not reachable at {}", details.url),
            to_details(details),
        )
        .with_hint("Check SEMAPHORE_URL and that the service is running")
    }

    pub fn gateway_auth_failed(details: GatewayCallDetails) -> Self {
        let message = match details.status {
            Some(status) => format!("Authentication failed: HTTP {}", status),
            None => "Authentication failed".to_string(),
        };

        let mut err = Self::new(ErrorCode::GatewayAuthFailed, message, to_details(details))
            .with_hint("Check that SEMAPHORE_API_TOKEN is valid and not revoked");
        err.retryable = Some(false);
        err
    }

    pub fn gateway_transport(details: GatewayCallDetails) -> Self {
        let message = match (&details.status, &details.error) {
            (Some(status), _) => format!("{} {} returned HTTP {}", details.method, details.url, status),
            (None, Some(error)) => format!("{} {} failed: {}", details.method, details.url, error),
            (None, None) => format!("{} {} failed", details.method, details.url),
        };

        let mut err = Self::new(ErrorCode::GatewayTransport, message, to_details(details));
        err.retryable = Some(true);
        err
    }

    pub fn gateway_unexpected_response(details: GatewayCallDetails) -> Self {
        Self::new(
            ErrorCode::GatewayUnexpectedResponse,
            format!("Unexpected response from {} {}", details.method, details.url),
            to_details(details),
        )
    }

    pub fn prerequisite_missing(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::PrerequisiteMissing,
            format!("Required resource '{}' does not exist", name),
            to_details(NotFoundDetails { id: name.clone() }),
        )
        .with_hint(format!(
            "Run the setup template that creates '{}' before starting the sequence",
            name
        ))
    }

    pub fn unit_not_found(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            ErrorCode::UnitNotFound,
            format!("No unit named '{}'", name),
            to_details(NotFoundDetails { id: name }),
        )
        .with_hint("Units are looked up just-in-time; check the task service UI if it should exist")
    }

    pub fn run_launch_failed(details: GatewayCallDetails) -> Self {
        let message = match details.status {
            Some(status) => format!("Failed to start unit: HTTP {}", status),
            None => "Failed to start unit".to_string(),
        };
        Self::new(ErrorCode::RunLaunchFailed, message, to_details(details))
    }

    pub fn run_failed(step: impl Into<String>, status: impl Into<String>) -> Self {
        let step = step.into();
        let status = status.into();
        Self::new(
            ErrorCode::RunFailed,
            format!("'{}' finished with status: {}", step, status),
            serde_json::json!({ "step": step, "status": status }),
        )
    }

    pub fn run_timeout(step: impl Into<String>, timeout_secs: u64) -> Self {
        let step = step.into();
        Self::new(
            ErrorCode::RunTimeout,
            format!("'{}' did not finish within {} seconds", step, timeout_secs),
            serde_json::json!({ "step": step, "timeoutSecs": timeout_secs }),
        )
    }

    pub fn interrupted() -> Self {
        Self::new(
            ErrorCode::SequenceInterrupted,
            "Interrupted by operator",
            Value::Object(serde_json::Map::new()),
        )
        .with_hint("The remote run, if any, keeps going; check the task service UI")
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalJsonErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }

    /// Errors the poll loop may absorb: a failed or garbled status query says
    /// nothing about the run itself.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::GatewayTransport | ErrorCode::GatewayUnexpectedResponse
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(status: Option<u16>, error: Option<&str>) -> GatewayCallDetails {
        GatewayCallDetails {
            method: "GET".to_string(),
            url: "https://semaphore.local/api/ping".to_string(),
            status,
            body: None,
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn transport_errors_are_retryable_and_transient() {
        let err = Error::gateway_transport(call(None, Some("operation timed out")));
        assert_eq!(err.retryable, Some(true));
        assert!(err.is_transient());
        assert!(err.message.contains("operation timed out"));
    }

    #[test]
    fn auth_errors_are_not_transient() {
        let err = Error::gateway_auth_failed(call(Some(401), None));
        assert_eq!(err.retryable, Some(false));
        assert!(!err.is_transient());
        assert_eq!(err.message, "Authentication failed: HTTP 401");
        assert_eq!(err.details["status"], 401);
    }

    #[test]
    fn missing_key_carries_hint_naming_the_key() {
        let err = Error::config_missing_key("SEMAPHORE_API_TOKEN", None);
        assert_eq!(err.code.as_str(), "config.missing_key");
        assert!(err.hints[0].message.contains("SEMAPHORE_API_TOKEN=<value>"));
    }
}
