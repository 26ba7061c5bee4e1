//! Clarabel backend.
//!
//! Clarabel solves conic programs of the form
//!
//! ```text
//! minimize    ½x'Px + q'x
//! subject to  Ax + s = b,   s ∈ K
//! ```
//!
//! with dual feasibility `Px + q + A'z = 0`. An LP maps onto it with `P = 0`:
//! equalities become zero-cone rows, inequalities and finite variable bounds
//! become nonnegative-cone rows (`a'x ≤ b` as-is, `a'x ≥ b` negated). The
//! dual objective is `-b'z`, so d(objective)/d(b) = -z for a row written as
//! given and +z for a negated row.

use clarabel::algebra::CscMatrix;
use clarabel::solver::{DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT};
use tracing::debug;
use web_time::Instant;

use crate::lp::{ConstraintSense, LinearProgram};
use crate::traits::{LpBackend, SolveOptions, SolveStatus, SolverOutput};

/// Pure-Rust interior-point backend; always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClarabelBackend;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Cone {
    Zero,
    Nonnegative,
}

/// Row-wise assembly of `A`, `b` and the cone list, stored column-wise so
/// the CSC conversion is a single pass.
struct ConicRows {
    columns: Vec<Vec<(usize, f64)>>,
    rhs: Vec<f64>,
    cones: Vec<SupportedConeT<f64>>,
}

impl ConicRows {
    fn new(n_var: usize) -> Self {
        Self {
            columns: vec![Vec::new(); n_var],
            rhs: Vec::new(),
            cones: Vec::new(),
        }
    }

    fn push(&mut self, terms: &[(usize, f64)], scale: f64, b: f64, cone: Cone) -> usize {
        let row = self.rhs.len();
        for &(col, val) in terms {
            self.columns[col].push((row, scale * val));
        }
        self.rhs.push(b);

        // Merge consecutive rows of the same cone
        match (cone, self.cones.last_mut()) {
            (Cone::Zero, Some(SupportedConeT::ZeroConeT(n))) => *n += 1,
            (Cone::Nonnegative, Some(SupportedConeT::NonnegativeConeT(n))) => *n += 1,
            (Cone::Zero, _) => self.cones.push(SupportedConeT::ZeroConeT(1)),
            (Cone::Nonnegative, _) => self.cones.push(SupportedConeT::NonnegativeConeT(1)),
        }
        row
    }

    fn into_csc(self) -> (CscMatrix<f64>, Vec<f64>, Vec<SupportedConeT<f64>>) {
        let n_rows = self.rhs.len();
        let n_cols = self.columns.len();
        let mut col_ptr = Vec::with_capacity(n_cols + 1);
        let mut row_idx = Vec::new();
        let mut values = Vec::new();

        for mut column in self.columns {
            let col_start = row_idx.len();
            col_ptr.push(col_start);
            // CSC needs sorted, unique row indices per column
            column.sort_by_key(|&(r, _)| r);
            for (r, v) in column {
                if row_idx.len() > col_start && row_idx.last() == Some(&r) {
                    if let Some(last) = values.last_mut() {
                        *last += v;
                    }
                } else {
                    row_idx.push(r);
                    values.push(v);
                }
            }
        }
        col_ptr.push(row_idx.len());

        (
            CscMatrix::new(n_rows, n_cols, col_ptr, row_idx, values),
            self.rhs,
            self.cones,
        )
    }
}

fn map_status(status: SolverStatus) -> SolveStatus {
    match status {
        SolverStatus::Solved | SolverStatus::AlmostSolved => SolveStatus::Optimal,
        SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
            SolveStatus::Infeasible
        }
        SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
            SolveStatus::Unbounded
        }
        _ => SolveStatus::SolverError,
    }
}

impl LpBackend for ClarabelBackend {
    fn id(&self) -> &str {
        "clarabel"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn solve(&self, lp: &LinearProgram, options: &SolveOptions) -> SolverOutput {
        let start = Instant::now();
        let n_var = lp.num_variables();
        if n_var == 0 {
            return super::solve_without_variables(lp, options.tolerance);
        }

        let mut rows = ConicRows::new(n_var);

        // (clarabel row, sign) per LP constraint, so that dual = sign * z[row]
        let mut dual_rows = Vec::with_capacity(lp.num_constraints());
        for c in lp.constraints() {
            let entry = match c.sense {
                ConstraintSense::Eq => (rows.push(&c.terms, 1.0, c.rhs, Cone::Zero), -1.0),
                ConstraintSense::Le => (rows.push(&c.terms, 1.0, c.rhs, Cone::Nonnegative), -1.0),
                ConstraintSense::Ge => {
                    (rows.push(&c.terms, -1.0, -c.rhs, Cone::Nonnegative), 1.0)
                }
            };
            dual_rows.push(entry);
        }

        for (j, var) in lp.variables().iter().enumerate() {
            if var.lower == var.upper {
                rows.push(&[(j, 1.0)], 1.0, var.lower, Cone::Zero);
                continue;
            }
            if var.lower.is_finite() {
                rows.push(&[(j, -1.0)], 1.0, -var.lower, Cone::Nonnegative);
            }
            if var.upper.is_finite() {
                rows.push(&[(j, 1.0)], 1.0, var.upper, Cone::Nonnegative);
            }
        }

        let q: Vec<f64> = lp.variables().iter().map(|v| v.cost).collect();
        let p = CscMatrix::new(n_var, n_var, vec![0; n_var + 1], Vec::new(), Vec::new());
        let (a, b, cones) = rows.into_csc();

        let mut settings = DefaultSettingsBuilder::default();
        settings
            .verbose(options.verbose)
            .max_iter(options.max_iterations)
            .tol_feas(options.tolerance)
            .tol_gap_abs(options.tolerance)
            .tol_gap_rel(options.tolerance);
        if let Some(limit) = options.time_limit {
            settings.time_limit(limit.as_secs_f64());
        }
        let settings = match settings.build() {
            Ok(settings) => settings,
            Err(e) => {
                return SolverOutput::failed(
                    SolveStatus::SolverError,
                    format!("Clarabel settings error: {e:?}"),
                )
            }
        };

        let mut solver = match DefaultSolver::new(&p, &q, &a, &b, &cones, settings) {
            Ok(solver) => solver,
            Err(e) => {
                return SolverOutput::failed(
                    SolveStatus::SolverError,
                    format!("Clarabel initialization failed: {e:?}"),
                )
            }
        };
        solver.solve();

        let sol = &solver.solution;
        let status = map_status(sol.status);
        debug!(
            variables = n_var,
            rows = b.len(),
            status = %status,
            iterations = sol.iterations,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "clarabel solve finished"
        );

        if !status.is_optimal() {
            let mut out = SolverOutput::failed(status, format!("Clarabel returned {:?}", sol.status));
            out.iterations = sol.iterations;
            return out;
        }

        let duals = dual_rows
            .iter()
            .map(|&(row, sign)| sign * sol.z[row])
            .collect();
        SolverOutput::optimal(sol.obj_val, sol.x.clone(), duals, sol.iterations)
    }
}
