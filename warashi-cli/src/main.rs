//! Warashi CLI - operator command line.
//!
//! Manages the configuration file and drives the scheduler and profiler
//! against a synthetic in-memory world.

mod commands;
mod error;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use commands::config::ConfigCommands;
use commands::perf::PerfCommands;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "warashi", author, version, about = "Adaptive chunk-ticket scheduling")]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// View and modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Run the scheduler against a synthetic world
    Simulate(SimulateArgs),

    /// Profile ticket groups of a synthetic world
    Perf {
        #[command(subcommand)]
        command: PerfCommands,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "warashi=debug" } else { "warashi=info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // Ignore error if already set.
    let _ = fmt().with_env_filter(env_filter).with_target(false).try_init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Config { command } => commands::config::run(command),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Perf { command } => commands::perf::run(command),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
