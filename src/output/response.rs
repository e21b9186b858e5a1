//! CLI response formatting and output.
//!
//! Provides JSON envelope, printing, and exit code mapping.

use orchestrator::error::Hint;
use orchestrator::interrupt::INTERRUPTED_EXIT_CODE;
use orchestrator::{Error, ErrorCode, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Serialize)]
pub struct CliError {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hints: Option<Vec<Hint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl<T: Serialize> CliResponse<T> {
    /// `success` is false for commands that ran but report an unsuccessful
    /// outcome, such as an aborted sequence.
    pub fn data(data: T, success: bool) -> Self {
        Self {
            success,
            data: Some(data),
            error: None,
        }
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            Error::internal_json(e.to_string(), Some("serialize response".to_string()))
        })
    }
}

impl CliResponse<()> {
    pub fn from_error(err: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(CliError {
                code: err.code.as_str().to_string(),
                message: err.message.clone(),
                details: err.details.clone(),
                hints: if err.hints.is_empty() {
                    None
                } else {
                    Some(err.hints.clone())
                },
                retryable: err.retryable,
            }),
        }
    }
}

fn print_response<T: Serialize>(response: &CliResponse<T>) -> Result<()> {
    use std::io::{self, Write};

    let payload = response.to_json()?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", payload) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            return Ok(()); // Exit gracefully on SIGPIPE
        }
        return Err(Error::internal_io(
            e.to_string(),
            Some("write stdout".to_string()),
        ));
    }
    Ok(())
}

pub fn map_cmd_result_to_json<T: Serialize>(
    result: Result<(T, i32)>,
) -> (Result<serde_json::Value>, i32) {
    match result {
        Ok((data, exit_code)) => match serde_json::to_value(data) {
            Ok(value) => (Ok(value), exit_code),
            Err(err) => (
                Err(Error::internal_json(
                    err.to_string(),
                    Some("serialize response".to_string()),
                )),
                1,
            ),
        },
        Err(err) => {
            let exit_code = exit_code_for_error(err.code);
            (Err(err), exit_code)
        }
    }
}

pub(crate) fn exit_code_for_error(code: ErrorCode) -> i32 {
    match code {
        ErrorCode::ConfigMissingKey
        | ErrorCode::ConfigInvalidJson
        | ErrorCode::ConfigInvalidValue
        | ErrorCode::ValidationInvalidArgument
        | ErrorCode::ValidationInvalidJson => 2,

        ErrorCode::GatewayUnreachable
        | ErrorCode::GatewayAuthFailed
        | ErrorCode::GatewayTransport
        | ErrorCode::GatewayUnexpectedResponse => 10,

        ErrorCode::SequenceInterrupted => INTERRUPTED_EXIT_CODE,

        ErrorCode::PrerequisiteMissing
        | ErrorCode::UnitNotFound
        | ErrorCode::RunLaunchFailed
        | ErrorCode::RunFailed
        | ErrorCode::RunTimeout
        | ErrorCode::InternalIoError
        | ErrorCode::InternalJsonError
        | ErrorCode::InternalUnexpected => 1,
    }
}

pub fn print_json_result(result: Result<serde_json::Value>, exit_code: i32) -> Result<()> {
    match result {
        Ok(data) => print_response(&CliResponse::data(data, exit_code == 0)),
        Err(err) => print_response(&CliResponse::<()>::from_error(&err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator::error::GatewayCallDetails;

    #[test]
    fn configuration_problems_exit_with_2() {
        let err = Error::config_missing_key("SEMAPHORE_API_TOKEN", None);
        let (_, code) = map_cmd_result_to_json::<()>(Err(err));
        assert_eq!(code, 2);
    }

    #[test]
    fn gateway_problems_exit_with_10() {
        let err = Error::gateway_auth_failed(GatewayCallDetails {
            method: "GET".to_string(),
            url: "https://semaphore.local/api/user".to_string(),
            status: Some(401),
            body: None,
            error: None,
        });
        assert_eq!(exit_code_for_error(err.code), 10);
        assert_eq!(exit_code_for_error(ErrorCode::GatewayUnreachable), 10);
    }

    #[test]
    fn interruption_exits_with_130() {
        assert_eq!(exit_code_for_error(ErrorCode::SequenceInterrupted), 130);
    }

    #[test]
    fn data_keeps_the_command_exit_code() {
        let (value, code) = map_cmd_result_to_json(Ok((serde_json::json!({"ok": false}), 1)));
        assert_eq!(code, 1);
        assert_eq!(value.unwrap()["ok"], false);
    }

    #[test]
    fn unsuccessful_data_is_not_marked_success() {
        let value =
            serde_json::to_value(CliResponse::data(serde_json::json!({"outcome": "aborted"}), false))
                .unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["data"]["outcome"], "aborted");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn error_envelope_omits_empty_hints() {
        let err = Error::internal_unexpected("boom");
        let value = serde_json::to_value(CliResponse::<()>::from_error(&err)).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["code"], "internal.unexpected");
        assert!(value["error"].get("hints").is_none());
        assert!(value.get("data").is_none());
    }
}
