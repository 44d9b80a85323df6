//! `pudlc` — Pudl compiler and REPL entry point.

mod batch;
mod cli;
mod config;
mod error;
mod linker;
mod repl;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Cli;
use config::Config;
use error::DriverError;

// Keep `pudlc-runtime`'s `printd`/`putchard` symbols linked into this
// binary so the JIT's in-process symbol resolution can find them when an
// expression-dialect program calls them via `extern`.
use pudlc_runtime as _;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    if cli.compile_and_output_conflict() {
        eprintln!("error: {}", DriverError::CompileAndOutputBothGiven);
        std::process::exit(1);
    }

    let config = match Config::resolve(cli.linker.clone(), cli.opt_level.clone(), cli.debug) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let exit_code = match &cli.file {
        Some(file) => batch::run(file, &cli, &config)?,
        None => repl::run(&config)?,
    };
    std::process::exit(exit_code);
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_env("PUDLC_LOG").unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_env("PUDLC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}
