use clap::Args;
use serde::Serialize;

use orchestrator::config::ConfigOverrides;
use orchestrator::preflight::{self, PreflightReport};
use orchestrator::semaphore::SemaphoreGateway;

use super::{CmdResult, ConnectionArgs, GlobalArgs};

#[derive(Args)]
pub struct PreflightArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Skip the prerequisite check
    #[arg(long)]
    no_prerequisite: bool,
}

#[derive(Debug, Serialize)]
pub struct PreflightOutput {
    base_url: String,
    project_id: u64,
    #[serde(flatten)]
    report: PreflightReport,
}

pub fn run(args: PreflightArgs, _global: &GlobalArgs) -> CmdResult<PreflightOutput> {
    let config = args.connection.resolve(ConfigOverrides {
        no_prerequisite: args.no_prerequisite,
        ..Default::default()
    })?;

    let gateway = SemaphoreGateway::new(&config)?;
    let report = preflight::check(&gateway, config.prerequisite.as_deref())?;
    let exit_code = if report.is_ready() { 0 } else { 1 };

    Ok((
        PreflightOutput {
            base_url: config.base_url,
            project_id: config.project_id,
            report,
        },
        exit_code,
    ))
}
