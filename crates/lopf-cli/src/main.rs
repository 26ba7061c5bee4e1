use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use lopf_cli::cli::{Cli, Commands};
use lopf_cli::commands::{compare, solve, solvers, validate};
use lopf_cli::config::LopfConfig;
use tracing_subscriber::FmtSubscriber;

fn run(cli: &Cli, config: &LopfConfig) -> Result<ExitCode> {
    match &cli.command {
        Commands::Solve {
            network,
            solver,
            format,
            out,
        } => solve::handle(config, network, solver, *format, out.as_deref()),
        Commands::Compare {
            old,
            new,
            solver,
            json,
        } => compare::handle(config, old, new, solver, *json),
        Commands::Validate { network } => validate::handle(network),
        Commands::Solvers => solvers::handle().map(|_| ExitCode::SUCCESS),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match LopfConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    let level = match config.log_level(cli.log_level) {
        Ok(level) => level,
        Err(err) => {
            eprintln!("error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("error: setting default subscriber failed: {err}");
        return ExitCode::FAILURE;
    }

    match run(&cli, &config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
