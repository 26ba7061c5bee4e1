//! Error taxonomy shared by every lopf crate.
//!
//! Validation failures (`Reference`, `Shape`, `Bounds`, `DuplicateName`) are
//! raised while a [`Network`](crate::Network) is assembled or while a problem
//! is built, so a solver is only ever handed a structurally valid LP. Solver
//! outcomes travel in a solution's status field; the `Infeasible`, `Unbounded`
//! and `Solver` variants exist for callers that prefer to turn a non-optimal
//! status into an error with `?`.
//!
//! ```ignore
//! use lopf_core::{LopfError, LopfResult};
//!
//! fn first_demand(network: &Network, load: &str) -> LopfResult<f64> {
//!     let id = network
//!         .load_id(load)
//!         .ok_or_else(|| LopfError::Validation(format!("no load named '{load}'")))?;
//!     Ok(network.load(id).p_set[0])
//! }
//! ```

use std::fmt;

use thiserror::Error;

/// Kind of network entity named in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Bus,
    Generator,
    Line,
    Load,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Bus => "bus",
            EntityKind::Generator => "generator",
            EntityKind::Line => "line",
            EntityKind::Load => "load",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for network assembly, problem building and solving.
#[derive(Error, Debug)]
pub enum LopfError {
    /// An entity names a bus that does not exist.
    #[error("{kind} '{name}' refers to unknown bus '{bus}'")]
    Reference {
        kind: EntityKind,
        name: String,
        bus: String,
    },

    /// A time series does not have one value per snapshot.
    #[error("{kind} '{name}': {attribute} has {actual} values but the network has {expected} snapshots")]
    Shape {
        kind: EntityKind,
        name: String,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A capacity, cost or demand value is out of range.
    #[error("{kind} '{name}': {message}")]
    Bounds {
        kind: EntityKind,
        name: String,
        message: String,
    },

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("invalid snapshot index: {0}")]
    InvalidSnapshots(String),

    /// Whole-network problems that are not tied to a single entity.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("problem is infeasible: {0}")]
    Infeasible(String),

    #[error("problem is unbounded: {0}")]
    Unbounded(String),

    /// Timeout or external solver failure. Callers may retry.
    #[error("Solver error: {0}")]
    Solver(String),

    /// Builder and extractor disagree about the problem layout. Always a bug.
    #[error("inconsistent solution: {0}")]
    InconsistentSolution(String),

    #[error("incompatible scenarios: {0}")]
    IncompatibleScenarios(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Results using LopfError.
pub type LopfResult<T> = Result<T, LopfError>;

impl LopfError {
    pub fn reference(kind: EntityKind, name: impl Into<String>, bus: impl Into<String>) -> Self {
        LopfError::Reference {
            kind,
            name: name.into(),
            bus: bus.into(),
        }
    }

    pub fn shape(
        kind: EntityKind,
        name: impl Into<String>,
        attribute: &'static str,
        expected: usize,
        actual: usize,
    ) -> Self {
        LopfError::Shape {
            kind,
            name: name.into(),
            attribute,
            expected,
            actual,
        }
    }

    pub fn bounds(kind: EntityKind, name: impl Into<String>, message: impl Into<String>) -> Self {
        LopfError::Bounds {
            kind,
            name: name.into(),
            message: message.into(),
        }
    }

    /// True for errors raised before any solver call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LopfError::Reference { .. }
                | LopfError::Shape { .. }
                | LopfError::Bounds { .. }
                | LopfError::DuplicateName { .. }
                | LopfError::InvalidSnapshots(_)
                | LopfError::Validation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_error_names_entity() {
        let err = LopfError::reference(EntityKind::Generator, "Coal Plant", "Nowhere");
        assert_eq!(
            err.to_string(),
            "generator 'Coal Plant' refers to unknown bus 'Nowhere'"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_shape_error_display() {
        let err = LopfError::shape(EntityKind::Load, "Demand", "p_set", 24, 23);
        assert_eq!(
            err.to_string(),
            "load 'Demand': p_set has 23 values but the network has 24 snapshots"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LopfError = io_err.into();
        assert!(matches!(err, LopfError::Io(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_solver_outcomes_are_not_validation() {
        assert!(!LopfError::Infeasible("demand".into()).is_validation());
        assert!(!LopfError::InconsistentSolution("len".into()).is_validation());
    }
}
