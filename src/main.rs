//! Parchiver CLI: archive, extract, list and check multi-part archives.

use clap::Parser;
use parchiver::engine::arg_parser::Cli;
use parchiver::engine::{failure_code, handle_run};
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let start_time = Instant::now();
    let cli = Cli::parse();
    let code = match handle_run(&cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            failure_code()
        }
    };
    log::debug!("Total time: {:?}", start_time.elapsed());
    code
}
