//! `lopf.toml` configuration.
//!
//! ```toml
//! [solver]
//! backend = "clarabel"
//! time_limit_seconds = 300
//! max_iterations = 200
//! tolerance = 1e-8
//! flow_model = "transport"
//!
//! [output]
//! format = "table"
//! directory = "results"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Command-line flags override every value here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use lopf_algo::{FlowModel, LopfSolver, LpSolverKind, SolveOptions};
use serde::{Deserialize, Serialize};

use crate::cli::{OutputFormat, SolverArgs};

pub const DEFAULT_CONFIG_FILE: &str = "lopf.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LopfConfig {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default = "default_time_limit")]
    pub time_limit_seconds: u64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_flow_model")]
    pub flow_model: String,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            time_limit_seconds: default_time_limit(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            flow_model: default_flow_model(),
        }
    }
}

fn default_backend() -> String {
    LpSolverKind::default().as_str().to_string()
}

fn default_time_limit() -> u64 {
    300
}

fn default_max_iterations() -> u32 {
    200
}

fn default_tolerance() -> f64 {
    1e-8
}

fn default_flow_model() -> String {
    FlowModel::default().as_str().to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// table, json or csv
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            directory: None,
        }
    }
}

fn default_format() -> String {
    "table".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LopfConfig {
    /// Read `explicit` if given, else `./lopf.toml` if it exists, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn log_level(&self, flag: Option<tracing::Level>) -> Result<tracing::Level> {
        match flag {
            Some(level) => Ok(level),
            None => self
                .logging
                .level
                .parse()
                .map_err(|_| anyhow!("invalid log level '{}' in config", self.logging.level)),
        }
    }

    pub fn output_format(&self, flag: Option<OutputFormat>) -> Result<OutputFormat> {
        match flag {
            Some(format) => Ok(format),
            None => OutputFormat::from_str(&self.output.format, true).map_err(|_| {
                anyhow!(
                    "invalid output format '{}' in config; expected table, json or csv",
                    self.output.format
                )
            }),
        }
    }

    pub fn output_directory(&self, flag: Option<&Path>) -> Option<PathBuf> {
        flag.map(Path::to_path_buf)
            .or_else(|| self.output.directory.clone())
    }

    /// Merge solver flags over the `[solver]` section.
    pub fn build_solver(&self, args: &SolverArgs) -> Result<LopfSolver> {
        let backend: LpSolverKind = args
            .solver
            .as_deref()
            .unwrap_or(&self.solver.backend)
            .parse()?;
        let flow_model: FlowModel = args
            .flow_model
            .as_deref()
            .unwrap_or(&self.solver.flow_model)
            .parse()?;
        let time_limit = args.time_limit.unwrap_or(self.solver.time_limit_seconds);

        let options = SolveOptions::default()
            .with_time_limit(Duration::from_secs(time_limit))
            .with_max_iterations(self.solver.max_iterations)
            .with_tolerance(self.solver.tolerance);

        Ok(LopfSolver::new()
            .with_solver_kind(backend)
            .with_flow_model(flow_model)
            .with_options(options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: LopfConfig = toml::from_str("[solver]\nmax_iterations = 500\n").unwrap();
        assert_eq!(config.solver.max_iterations, 500);
        assert_eq!(config.solver.backend, "clarabel");
        assert_eq!(config.solver.time_limit_seconds, 300);
        assert_eq!(config.output.format, "table");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_flags_override_config() {
        let config: LopfConfig = toml::from_str(
            "[solver]\nflow_model = \"dc_angle\"\ntime_limit_seconds = 10\n[output]\nformat = \"json\"\n",
        )
        .unwrap();

        let solver = config.build_solver(&SolverArgs::default()).unwrap();
        assert_eq!(solver.flow_model(), FlowModel::DcAngle);
        assert_eq!(solver.options().time_limit, Some(Duration::from_secs(10)));

        let args = SolverArgs {
            flow_model: Some("transport".into()),
            time_limit: Some(3),
            ..SolverArgs::default()
        };
        let solver = config.build_solver(&args).unwrap();
        assert_eq!(solver.flow_model(), FlowModel::Transport);
        assert_eq!(solver.options().time_limit, Some(Duration::from_secs(3)));

        assert_eq!(config.output_format(None).unwrap(), OutputFormat::Json);
        assert_eq!(
            config.output_format(Some(OutputFormat::Csv)).unwrap(),
            OutputFormat::Csv
        );
    }

    #[test]
    fn test_bad_values_rejected() {
        let config: LopfConfig =
            toml::from_str("[solver]\nbackend = \"cplex\"\n[logging]\nlevel = \"loud\"\n").unwrap();
        let err = config.build_solver(&SolverArgs::default()).unwrap_err();
        assert!(err.to_string().contains("unknown lp solver 'cplex'"));
        assert!(config.log_level(None).is_err());
        assert_eq!(
            config.log_level(Some(tracing::Level::DEBUG)).unwrap(),
            tracing::Level::DEBUG
        );
    }
}
