//! Vendor-neutral linear program.
//!
//! ```text
//! minimize    c'x
//! subject to  a_i'x  (=, ≤, ≥)  b_i     for every constraint i
//!             l ≤ x ≤ u                 (bounds may be infinite)
//! ```
//!
//! This is the only shape a backend ever sees. Variables and constraints are
//! addressed by their insertion index.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintSense {
    Eq,
    Le,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LpVariable {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LpConstraint {
    pub label: String,
    /// Sparse `(variable, coefficient)` pairs.
    pub terms: Vec<(usize, f64)>,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearProgram {
    variables: Vec<LpVariable>,
    constraints: Vec<LpConstraint>,
}

impl LinearProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(
        &mut self,
        label: impl Into<String>,
        lower: f64,
        upper: f64,
        cost: f64,
    ) -> usize {
        self.variables.push(LpVariable {
            label: label.into(),
            lower,
            upper,
            cost,
        });
        self.variables.len() - 1
    }

    pub fn add_constraint(
        &mut self,
        label: impl Into<String>,
        terms: Vec<(usize, f64)>,
        sense: ConstraintSense,
        rhs: f64,
    ) -> usize {
        debug_assert!(terms.iter().all(|&(j, _)| j < self.variables.len()));
        self.constraints.push(LpConstraint {
            label: label.into(),
            terms,
            sense,
            rhs,
        });
        self.constraints.len() - 1
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn variables(&self) -> &[LpVariable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LpConstraint] {
        &self.constraints
    }

    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.variables.iter().zip(x).map(|(v, xi)| v.cost * xi).sum()
    }

    /// Left-hand side `a_i'x` of constraint `row`.
    pub fn row_activity(&self, row: usize, x: &[f64]) -> f64 {
        self.constraints[row]
            .terms
            .iter()
            .map(|&(j, a)| a * x[j])
            .sum()
    }

    /// Largest bound or constraint violation of `x`; zero for a feasible point.
    pub fn max_violation(&self, x: &[f64]) -> f64 {
        let bounds = self
            .variables
            .iter()
            .zip(x)
            .map(|(v, &xi)| (v.lower - xi).max(xi - v.upper).max(0.0));
        let rows = self.constraints.iter().enumerate().map(|(i, c)| {
            let lhs = self.row_activity(i, x);
            match c.sense {
                ConstraintSense::Eq => (lhs - c.rhs).abs(),
                ConstraintSense::Le => (lhs - c.rhs).max(0.0),
                ConstraintSense::Ge => (c.rhs - lhs).max(0.0),
            }
        });
        bounds.chain(rows).fold(0.0, f64::max)
    }
}
