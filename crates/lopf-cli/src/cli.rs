use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lopf", author, version, about = "Least-cost dispatch and capacity expansion", long_about = None)]
pub struct Cli {
    /// Set the logging level (overrides [logging] level in the config file)
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Configuration file (defaults to ./lopf.toml when present)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve one network and print or write the results
    Solve {
        /// Network description (.json, .yaml or .yml)
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
        #[command(flatten)]
        solver: SolverArgs,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Directory for CSV/JSON output files
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: Option<PathBuf>,
    },
    /// Solve two scenarios and compare cost and emissions
    Compare {
        /// Baseline network
        #[arg(value_hint = ValueHint::FilePath)]
        old: PathBuf,
        /// Candidate network
        #[arg(value_hint = ValueHint::FilePath)]
        new: PathBuf,
        #[command(flatten)]
        solver: SolverArgs,
        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load a network and report structural problems without solving
    Validate {
        #[arg(value_hint = ValueHint::FilePath)]
        network: PathBuf,
    },
    /// List the LP backends compiled into this binary
    Solvers,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct SolverArgs {
    /// LP backend (see `lopf solvers`)
    #[arg(long)]
    pub solver: Option<String>,
    /// Wall-clock limit per solve, in seconds
    #[arg(long)]
    pub time_limit: Option<u64>,
    /// Line flow model: transport or dc_angle
    #[arg(long)]
    pub flow_model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}
