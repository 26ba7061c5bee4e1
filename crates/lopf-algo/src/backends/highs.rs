//! HiGHS backend (cargo feature `solver-highs`).
//!
//! HiGHS reports row duals as d(objective)/d(row bound) for a minimization,
//! which is already the convention of [`SolverOutput::duals`].

use highs::{Col, HighsModelStatus, RowProblem, Sense};
use tracing::debug;
use web_time::Instant;

use crate::lp::{ConstraintSense, LinearProgram};
use crate::traits::{LpBackend, SolveOptions, SolveStatus, SolverOutput};

/// Dual simplex through HiGHS.
///
/// `SolveOptions::max_iterations` bounds interior-point iterations and is
/// not forwarded: simplex pivot counts grow with model size, so a bound
/// tuned for Clarabel would cut off ordinary models. The `highs` crate does
/// not expose an iteration count either, so solutions report 0 iterations.
/// Time limit, tolerance and verbosity are honoured.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsBackend;

fn map_status(status: HighsModelStatus) -> SolveStatus {
    match status {
        HighsModelStatus::Optimal => SolveStatus::Optimal,
        HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
            SolveStatus::Infeasible
        }
        HighsModelStatus::Unbounded => SolveStatus::Unbounded,
        _ => SolveStatus::SolverError,
    }
}

impl LpBackend for HighsBackend {
    fn id(&self) -> &str {
        "highs"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn solve(&self, lp: &LinearProgram, options: &SolveOptions) -> SolverOutput {
        let start = Instant::now();
        if lp.num_variables() == 0 {
            return super::solve_without_variables(lp, options.tolerance);
        }

        let mut problem = RowProblem::default();
        let cols: Vec<Col> = lp
            .variables()
            .iter()
            .map(|v| problem.add_column(v.cost, v.lower..=v.upper))
            .collect();

        for c in lp.constraints() {
            let factors = c.terms.iter().map(|&(j, a)| (cols[j], a));
            match c.sense {
                ConstraintSense::Eq => {
                    problem.add_row(c.rhs..=c.rhs, factors);
                }
                ConstraintSense::Le => {
                    problem.add_row(..=c.rhs, factors);
                }
                ConstraintSense::Ge => {
                    problem.add_row(c.rhs.., factors);
                }
            }
        }

        let mut model = problem.optimise(Sense::Minimise);
        model.set_option("output_flag", options.verbose);
        model.set_option("primal_feasibility_tolerance", options.tolerance.max(1e-10));
        model.set_option("dual_feasibility_tolerance", options.tolerance.max(1e-10));
        if let Some(limit) = options.time_limit {
            model.set_option("time_limit", limit.as_secs_f64());
        }

        let solved = match model.try_solve() {
            Ok(solved) => solved,
            Err(status) => {
                return SolverOutput::failed(
                    SolveStatus::SolverError,
                    format!("HiGHS rejected the model: {status:?}"),
                )
            }
        };

        let model_status = solved.status();
        let status = map_status(model_status);
        debug!(
            variables = lp.num_variables(),
            constraints = lp.num_constraints(),
            status = %status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "highs solve finished"
        );
        if !status.is_optimal() {
            return SolverOutput::failed(status, format!("HiGHS returned {model_status:?}"));
        }

        let solution = solved.get_solution();
        SolverOutput::optimal(
            solved.objective_value(),
            solution.columns().to_vec(),
            solution.dual_rows().to_vec(),
            0,
        )
    }
}
