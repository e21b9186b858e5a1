use clap::Args;
use std::path::PathBuf;

use orchestrator::config::{ConfigOverrides, ConfigSources, OrchestratorConfig};
use orchestrator::interrupt::CancelToken;
use orchestrator::utils::args;
use orchestrator::{defaults, paths};

pub type CmdResult<T> = orchestrator::Result<(T, i32)>;

pub(crate) struct GlobalArgs {
    /// Set when the operator presses Ctrl-C.
    pub cancel: CancelToken,
}

/// Connection settings shared by every subcommand.
///
/// The task service passes variables as trailing `KEY=VALUE` arguments:
///
/// ```sh
/// orchestrator run SEMAPHORE_URL=https://10.10.20.10:2443 SEMAPHORE_API_TOKEN=abc
/// ```
#[derive(Args, Default, Debug)]
pub struct ConnectionArgs {
    /// Path to orchestrator.json (default: ~/.config/orchestrator/orchestrator.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// KEY=VALUE settings (SEMAPHORE_URL, SEMAPHORE_API_TOKEN, SEMAPHORE_PROJECT_ID)
    #[arg(value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,
}

impl ConnectionArgs {
    pub fn config_path(&self) -> orchestrator::Result<Option<PathBuf>> {
        self.config.as_deref().map(paths::expand).transpose()
    }

    pub fn sources(&self, overrides: ConfigOverrides) -> orchestrator::Result<ConfigSources> {
        let file = defaults::load(self.config_path()?.as_deref())?;
        Ok(ConfigSources {
            file,
            assignments: args::parse_assignments(&self.assignments)?,
            overrides,
            ..Default::default()
        }
        .with_process_env())
    }

    /// Resolve configuration for commands that talk to the task service.
    pub fn resolve(&self, overrides: ConfigOverrides) -> orchestrator::Result<OrchestratorConfig> {
        OrchestratorConfig::resolve(&self.sources(overrides)?)
    }
}

pub mod config;
pub mod preflight;
pub mod run;
pub mod units;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (orchestrator::Result<serde_json::Value>, i32) {
    crate::tty::status("orchestrator is working...");

    match command {
        crate::Commands::Run(args) => dispatch!(args, global, run),
        crate::Commands::Preflight(args) => dispatch!(args, global, preflight),
        crate::Commands::Units(args) => dispatch!(args, global, units),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
