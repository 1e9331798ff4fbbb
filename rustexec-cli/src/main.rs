//! `RustExec` CLI - run commands on remote hosts
//!
//! Executes commands through configured WinRM and SSH profiles, and shows
//! how command lines are rendered and composed before they are sent.

mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use cli::Cli;
use rustexec_core::{TracingConfig, TracingLevel, TracingOutput, init_tracing};

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let mut tracing_config =
        TracingConfig::new().with_level(TracingLevel::from_verbosity(cli.verbose, cli.quiet));
    if let Some(ref path) = cli.log_file {
        tracing_config = tracing_config.with_output(TracingOutput::File { path: path.clone() });
    }
    if let Err(e) = init_tracing(&tracing_config) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    match commands::dispatch(config_path, cli.command) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if !cli.quiet {
                eprintln!("Error: {e}");
            }
            std::process::exit(e.exit_code());
        }
    }
}
