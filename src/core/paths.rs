use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Base config directory (~/.config/orchestrator/ on Unix-like systems)
pub fn config_dir() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("orchestrator"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("orchestrator"))
    }
}

/// Default orchestrator.json path
pub fn orchestrator_json() -> Result<PathBuf> {
    Ok(config_dir()?.join("orchestrator.json"))
}

/// Expand `~` and `$VAR` in a user-supplied config path.
pub fn expand(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path).map_err(|e| {
        Error::validation_invalid_argument("config", e.to_string(), Some(path.to_string()), None)
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}
