//! CLI entry point: parses one positional program-file argument and
//! hands it to the engine.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

/// Universal Machine: executes a segmented-memory program file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to a program file of tightly-packed big-endian 32-bit words.
    program: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    log::debug!("invoked with program={}", args.program.display());

    match rum::vm::run(&args.program) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("rum: {err}");
            ExitCode::FAILURE
        }
    }
}
