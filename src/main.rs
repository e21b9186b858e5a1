use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{config, preflight, run, units};
use orchestrator::interrupt;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(version = VERSION)]
#[command(about = "Run Semaphore templates in order, stopping at the first failure")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the configured sequence
    Run(run::RunArgs),
    /// Check connectivity, credentials and the prerequisite without running anything
    Preflight(preflight::PreflightArgs),
    /// List units visible to the token and how the sequence resolves against them
    Units(units::UnitsArgs),
    /// Show the effective configuration (token redacted)
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {
        cancel: interrupt::install_sigint_handler(),
    };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if let Err(err) = output::print_json_result(json_result, exit_code) {
        eprintln!("{}", err);
    }

    let exit_code = final_exit_code(exit_code, global.cancel.is_cancelled());
    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

/// A Ctrl-C that lands after the command already succeeded does not change the outcome.
fn final_exit_code(exit_code: i32, cancelled: bool) -> i32 {
    if cancelled && exit_code != 0 {
        interrupt::INTERRUPTED_EXIT_CODE
    } else {
        exit_code
    }
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
