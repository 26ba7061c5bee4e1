//! Built-in LP backends and the registry that selects between them.
//!
//! Each backend wraps an existing solver and exposes it through the
//! [`LpBackend`] trait.

mod clarabel;
#[cfg(feature = "solver-highs")]
mod highs;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use lopf_core::LopfError;
use serde::{Deserialize, Serialize};

use crate::lp::{ConstraintSense, LinearProgram};
use crate::traits::{LpBackend, SolveStatus, SolverOutput};

pub use self::clarabel::ClarabelBackend;
#[cfg(feature = "solver-highs")]
pub use self::highs::HighsBackend;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LpSolverKind {
    #[default]
    Clarabel,
    #[cfg(feature = "solver-highs")]
    Highs,
}

const AVAILABLE_LP_SOLVERS: &[&str] = &[
    "clarabel",
    #[cfg(feature = "solver-highs")]
    "highs",
];

impl LpSolverKind {
    pub fn available() -> &'static [&'static str] {
        AVAILABLE_LP_SOLVERS
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LpSolverKind::Clarabel => "clarabel",
            #[cfg(feature = "solver-highs")]
            LpSolverKind::Highs => "highs",
        }
    }

    pub fn build(&self) -> Arc<dyn LpBackend> {
        match self {
            LpSolverKind::Clarabel => Arc::new(ClarabelBackend),
            #[cfg(feature = "solver-highs")]
            LpSolverKind::Highs => Arc::new(HighsBackend),
        }
    }
}

impl fmt::Display for LpSolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LpSolverKind {
    type Err = LopfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clarabel" => Ok(LpSolverKind::Clarabel),
            #[cfg(feature = "solver-highs")]
            "highs" => Ok(LpSolverKind::Highs),
            other => Err(LopfError::Config(format!(
                "unknown lp solver '{}'; supported values: {}",
                other,
                LpSolverKind::available().join(", ")
            ))),
        }
    }
}

/// A program without variables is decided by its right-hand sides alone.
/// Some solvers reject empty matrices, so backends short-circuit here.
pub(crate) fn solve_without_variables(lp: &LinearProgram, tolerance: f64) -> SolverOutput {
    let violated = lp.constraints().iter().find(|c| match c.sense {
        ConstraintSense::Eq => c.rhs.abs() > tolerance,
        ConstraintSense::Le => c.rhs < -tolerance,
        ConstraintSense::Ge => c.rhs > tolerance,
    });
    match violated {
        Some(c) => SolverOutput::failed(
            SolveStatus::Infeasible,
            format!("constraint {} cannot hold without variables", c.label),
        ),
        None => SolverOutput::optimal(0.0, Vec::new(), vec![0.0; lp.num_constraints()], 0),
    }
}
