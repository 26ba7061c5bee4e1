//! Build → solve → extract in one call.

use std::sync::Arc;

use lopf_core::{LopfResult, Network};
use tracing::{info, warn};
use web_time::Instant;

use crate::backends::LpSolverKind;
use crate::builder::{FlowModel, ProblemBuilder};
use crate::extract::extract;
use crate::solution::Solution;
use crate::traits::{LpBackend, SolveOptions};

/// Least-cost dispatch solver for a [`Network`].
///
/// ```ignore
/// let solution = LopfSolver::new()
///     .with_options(SolveOptions::default().with_time_limit(Duration::from_secs(60)))
///     .solve(&network)?;
/// ```
#[derive(Clone)]
pub struct LopfSolver {
    backend: Arc<dyn LpBackend>,
    flow_model: FlowModel,
    options: SolveOptions,
}

impl LopfSolver {
    /// Clarabel backend, transport flow model, default options.
    pub fn new() -> Self {
        Self {
            backend: LpSolverKind::default().build(),
            flow_model: FlowModel::default(),
            options: SolveOptions::default(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn LpBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_solver_kind(self, kind: LpSolverKind) -> Self {
        self.with_backend(kind.build())
    }

    pub fn with_flow_model(mut self, flow_model: FlowModel) -> Self {
        self.flow_model = flow_model;
        self
    }

    pub fn with_options(mut self, options: SolveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn backend_id(&self) -> &str {
        self.backend.id()
    }

    pub fn flow_model(&self) -> FlowModel {
        self.flow_model
    }

    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    /// Solve one network.
    ///
    /// Validation errors abort before the backend is called. Infeasible,
    /// unbounded and failed solves come back as a [`Solution`] whose status
    /// says so.
    pub fn solve(&self, network: &Network) -> LopfResult<Solution> {
        let problem = ProblemBuilder::new(network)
            .with_flow_model(self.flow_model)
            .build()?;

        let start = Instant::now();
        let output = self.backend.solve(problem.lp(), &self.options);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut solution = extract(network, &problem, &output)?;
        solution.backend = self.backend.id().to_string();
        solution.solve_time_ms = elapsed_ms;

        if solution.is_optimal() {
            info!(
                network = network.name(),
                backend = self.backend.id(),
                objective = solution.objective(),
                iterations = solution.iterations(),
                elapsed_ms,
                "dispatch solved"
            );
        } else {
            warn!(
                network = network.name(),
                backend = self.backend.id(),
                status = %solution.status(),
                message = solution.message().unwrap_or(""),
                "dispatch not solved to optimality"
            );
        }
        Ok(solution)
    }

    /// Solve independent networks, concurrently when the `parallel` feature
    /// is enabled. Results keep the input order.
    pub fn solve_many(&self, networks: &[&Network]) -> Vec<LopfResult<Solution>> {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            networks.par_iter().map(|network| self.solve(network)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            networks.iter().map(|network| self.solve(network)).collect()
        }
    }
}

impl Default for LopfSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LopfSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopfSolver")
            .field("backend", &self.backend.id())
            .field("flow_model", &self.flow_model)
            .field("options", &self.options)
            .finish()
    }
}
