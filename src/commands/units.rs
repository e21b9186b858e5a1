use clap::Args;
use serde::Serialize;

use orchestrator::config::ConfigOverrides;
use orchestrator::gateway::{Gateway, Unit};
use orchestrator::preflight;
use orchestrator::semaphore::SemaphoreGateway;

use super::{CmdResult, ConnectionArgs, GlobalArgs};

#[derive(Args)]
pub struct UnitsArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
}

#[derive(Debug, Serialize)]
pub struct UnitsOutput {
    units: Vec<Unit>,
    /// Configured steps and the unit each would resolve to right now.
    sequence: Vec<SequenceEntry>,
}

#[derive(Debug, Serialize)]
pub struct SequenceEntry {
    name: String,
    unit_id: Option<u64>,
}

pub fn run(args: UnitsArgs, _global: &GlobalArgs) -> CmdResult<UnitsOutput> {
    let config = args.connection.resolve(ConfigOverrides::default())?;
    let gateway = SemaphoreGateway::new(&config)?;
    preflight::connect(&gateway)?;

    let units = gateway.list_units()?;
    let sequence = sequence_entries(&config.sequence, &units);

    Ok((UnitsOutput { units, sequence }, 0))
}

fn sequence_entries(steps: &[String], units: &[Unit]) -> Vec<SequenceEntry> {
    steps
        .iter()
        .map(|name| SequenceEntry {
            name: name.clone(),
            unit_id: units.iter().find(|u| &u.name == name).map(|u| u.id),
        })
        .collect()
}
