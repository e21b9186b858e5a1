use clap::Args;
use serde::Serialize;

use orchestrator::config::{ConfigOverrides, OrchestratorConfig, RedactedConfig};
use orchestrator::defaults::{self, OrchestratorFile};
use orchestrator::paths;

use super::{CmdResult, ConnectionArgs, GlobalArgs};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Show only built-in defaults (ignore orchestrator.json and environment)
    #[arg(long)]
    builtin: bool,
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exists: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    effective: Option<RedactedConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    defaults: Option<OrchestratorFile>,
}

pub fn run(args: ConfigArgs, _global: &GlobalArgs) -> CmdResult<ConfigOutput> {
    if args.builtin {
        return Ok((
            ConfigOutput {
                command: "config.builtin".to_string(),
                path: None,
                exists: None,
                effective: None,
                defaults: Some(defaults::builtin()),
            },
            0,
        ));
    }

    let path = match args.connection.config_path()? {
        Some(path) => Some(path),
        None => paths::orchestrator_json().ok(),
    };
    let sources = args.connection.sources(ConfigOverrides::default())?;
    let config = OrchestratorConfig::resolve_unauthenticated(&sources)?;

    Ok((
        ConfigOutput {
            command: "config.show".to_string(),
            exists: path.as_ref().map(|p| p.exists()),
            path: path.map(|p| p.display().to_string()),
            effective: Some(config.redacted()),
            defaults: None,
        },
        0,
    ))
}
