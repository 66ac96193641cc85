// audex-cli/src/main.rs
//
// Entry point of the `audex` binary: parse arguments, set up logging, run
// the chosen command and turn a failure into a non-zero exit code.

use audex_cli::error::{CliResult, exit_code};
use audex_cli::{Cli, Commands, create_engine, logging, run_extract, run_probe};
use clap::Parser;
use std::process;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(exit_code(&e));
    }
}

/// Runs the chosen command. The engine, and with it its workspace, is
/// dropped before this returns.
fn run(cli: Cli) -> CliResult<()> {
    let engine = create_engine(&cli.engine);
    match cli.command {
        Commands::Probe(args) => run_probe(&engine, args),
        Commands::Extract(args) => run_extract(&engine, args),
    }
}
