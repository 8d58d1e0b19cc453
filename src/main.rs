// src/main.rs

mod analyzer;
mod classifier;
mod cli;
mod error;
mod logging;
mod model;
mod renderer;

use anyhow::Context;
use clap::Parser;
use cli::Args;
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init_logging();
    let start_time = Instant::now();

    match run(&args) {
        Ok(()) => {
            tracing::debug!(elapsed = ?start_time.elapsed(), "done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let store = analyzer::analyze(&args.logfile, !args.no_progress)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    renderer::render_view(&mut out, &store, args.view()).context("failed to write report")?;
    out.flush().context("failed to write report")?;
    Ok(())
}
