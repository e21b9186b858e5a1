use clap::Args;

use orchestrator::clock::SystemClock;
use orchestrator::config::ConfigOverrides;
use orchestrator::preflight;
use orchestrator::semaphore::SemaphoreGateway;
use orchestrator::sequence::{SequenceResult, Sequencer};

use super::{CmdResult, ConnectionArgs, GlobalArgs};

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Run these units, in order, instead of the configured sequence
    #[arg(long = "step", value_name = "NAME")]
    steps: Vec<String>,

    /// Seconds to wait for each run to finish
    #[arg(long, value_name = "SECS")]
    step_timeout: Option<u64>,

    /// Seconds between status checks
    #[arg(long, value_name = "SECS")]
    poll_interval: Option<u64>,

    /// Seconds to wait between steps
    #[arg(long, value_name = "SECS")]
    pause: Option<u64>,

    /// Skip the prerequisite check
    #[arg(long)]
    no_prerequisite: bool,
}

pub fn run(args: RunArgs, global: &GlobalArgs) -> CmdResult<SequenceResult> {
    let config = args.connection.resolve(ConfigOverrides {
        steps: args.steps,
        step_timeout_secs: args.step_timeout,
        poll_interval_secs: args.poll_interval,
        pause_secs: args.pause,
        no_prerequisite: args.no_prerequisite,
    })?;

    let gateway = SemaphoreGateway::new(&config)?;
    preflight::connect(&gateway)?;

    let clock = SystemClock::new();
    let result = Sequencer::new(&gateway, &clock, global.cancel.clone(), &config).run();
    let exit_code = result.exit_code();

    Ok((result, exit_code))
}
