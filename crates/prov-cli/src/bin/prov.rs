use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use prov_cli::{CliArgs, run, tracing_config};

fn main() -> Result<ExitCode> {
    tracing_config::init_tracing();
    let args = CliArgs::parse();
    let outcome = run(&args, &mut std::io::stdout().lock(), &mut std::io::stderr().lock())?;
    Ok(ExitCode::from(outcome.exit_code()))
}
