//! mvcopy CLI: copy files across volumes, prompting for a new one when the output is full.

use anyhow::Result;
use clap::Parser;
use mvcopy::engine::arg_parser::Cli;
use mvcopy::engine::handle_run;
use std::process::ExitCode;
use std::time::Instant;

fn main() -> Result<ExitCode> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    let code = handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(code)
}
