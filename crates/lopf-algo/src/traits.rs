//! The solver adapter boundary.
//!
//! A backend receives a [`LinearProgram`] and returns a [`SolverOutput`]. It
//! never returns `Err`: infeasibility, unboundedness, timeouts and setup
//! failures are all statuses the caller branches on. Backends do not retry.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lp::LinearProgram;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// Timeout, iteration limit, numerical trouble or a backend failure.
    SolverError,
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::SolverError => "solver_error",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration passed to backend solvers.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    /// Wall-clock limit; exceeding it yields `SolverError`.
    pub time_limit: Option<Duration>,
    /// Interior-point iteration cap. Simplex backends ignore it.
    pub max_iterations: u32,
    /// Feasibility and optimality-gap tolerance.
    pub tolerance: f64,
    /// Let the backend print its own iteration log.
    pub verbose: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            time_limit: None,
            max_iterations: 200,
            tolerance: 1e-8,
            verbose: false,
        }
    }
}

impl SolveOptions {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// What a backend hands back.
///
/// `primal` has one entry per LP variable and `duals` one per LP constraint,
/// both only when `status` is optimal. Duals follow the convention
/// d(objective)/d(rhs): a binding `≤` row in a minimization has a
/// non-positive dual, a binding `≥` row a non-negative one.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    pub status: SolveStatus,
    pub objective: f64,
    pub primal: Vec<f64>,
    pub duals: Vec<f64>,
    pub iterations: u32,
    pub message: Option<String>,
}

impl SolverOutput {
    pub fn optimal(objective: f64, primal: Vec<f64>, duals: Vec<f64>, iterations: u32) -> Self {
        Self {
            status: SolveStatus::Optimal,
            objective,
            primal,
            duals,
            iterations,
            message: None,
        }
    }

    pub fn failed(status: SolveStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            objective: f64::NAN,
            primal: Vec::new(),
            duals: Vec::new(),
            iterations: 0,
            message: Some(message.into()),
        }
    }
}

/// An LP solver that can be plugged in behind the builder and extractor.
pub trait LpBackend: Send + Sync {
    /// Unique identifier (e.g. "clarabel", "highs").
    fn id(&self) -> &str;

    /// Check if this backend is available at runtime.
    fn is_available(&self) -> bool;

    fn solve(&self, lp: &LinearProgram, options: &SolveOptions) -> SolverOutput;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_trait_is_object_safe() {
        fn _accepts_backend(_b: &dyn LpBackend) {}
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Box<dyn LpBackend>>();
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SolveStatus::SolverError).unwrap(),
            "\"solver_error\""
        );
        assert_eq!(SolveStatus::Infeasible.to_string(), "infeasible");
        assert!(SolveStatus::Optimal.is_optimal());
        assert!(!SolveStatus::Unbounded.is_optimal());
    }

    #[test]
    fn test_failed_output_carries_no_values() {
        let out = SolverOutput::failed(SolveStatus::SolverError, "time limit reached");
        assert!(out.primal.is_empty());
        assert!(out.duals.is_empty());
        assert!(out.objective.is_nan());
        assert_eq!(out.message.as_deref(), Some("time limit reached"));
    }

    #[test]
    fn test_options_defaults() {
        let options = SolveOptions::default();
        assert_eq!(options.time_limit, None);
        assert_eq!(options.max_iterations, 200);
        assert_eq!(options.tolerance, 1e-8);
        let options = options.with_time_limit(Duration::from_secs(5));
        assert_eq!(options.time_limit, Some(Duration::from_secs(5)));
    }
}
