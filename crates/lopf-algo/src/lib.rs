//! Least-cost dispatch and capacity expansion for `lopf` networks.
//!
//! A solve runs in four forward-only stages:
//!
//! 1. [`ProblemBuilder`] turns a [`Network`](lopf_core::Network) into a
//!    vendor-neutral [`LinearProgram`] wrapped in a [`DispatchProblem`].
//! 2. An [`LpBackend`] (Clarabel by default, HiGHS behind `solver-highs`)
//!    solves it and returns a [`SolverOutput`].
//! 3. [`extract`] maps the primal and dual vectors back onto dispatch,
//!    optimized capacity, line flows and nodal prices in a [`Solution`].
//! 4. Optionally, [`compare`] sets two solutions side by side.
//!
//! [`LopfSolver`] runs stages 1-3 in a single call.
//!
//! ## Feature flags
//!
//! - `parallel` (default): [`LopfSolver::solve_many`] on a rayon pool
//! - `csv` (default): CSV table export
//! - `solver-highs`: HiGHS backend

pub mod backends;
pub mod builder;
pub mod compare;
pub mod export;
pub mod extract;
pub mod lp;
pub mod solution;
pub mod solver;
pub mod traits;

pub use backends::{ClarabelBackend, LpSolverKind};
#[cfg(feature = "solver-highs")]
pub use backends::HighsBackend;
pub use builder::{DispatchProblem, FlowModel, ProblemBuilder};
pub use compare::{compare, ScenarioComparison};
pub use extract::extract;
pub use lp::{ConstraintSense, LinearProgram, LpConstraint, LpVariable};
pub use solution::{BusPrices, CapacityDecision, GeneratorDispatch, LineFlow, Solution};
pub use solver::LopfSolver;
pub use traits::{LpBackend, SolveOptions, SolveStatus, SolverOutput};

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use lopf_core::{Capacity, Network, SnapshotIndex};

    pub fn hourly(count: usize) -> SnapshotIndex {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        SnapshotIndex::hourly(start, count).unwrap()
    }

    /// One bus, a 200 MW plant at 40 and a 150 MW plant at 70, flat demand,
    /// three hourly snapshots.
    pub fn single_bus(demand: f64) -> Network {
        let mut network = Network::new(hourly(3)).with_name("single-bus");
        network.add_bus("Bus", "AC").unwrap();
        network
            .add_generator("Coal Plant", "Bus", Capacity::fixed(200.0), 40.0)
            .unwrap();
        network
            .add_generator("Gas Plant", "Bus", Capacity::fixed(150.0), 70.0)
            .unwrap();
        let p_set = network.flat_series(demand);
        network.add_load("Demand", "Bus", p_set).unwrap();
        network
    }

    /// Cheap supply in the west, expensive supply and all demand in the
    /// east, joined by one line of the given rating.
    pub fn two_bus(line_limit: f64) -> Network {
        let mut network = Network::new(hourly(3)).with_name("two-bus");
        network.add_bus("West", "AC").unwrap();
        network.add_bus("East", "AC").unwrap();
        network
            .add_generator("Cheap", "West", Capacity::fixed(200.0), 20.0)
            .unwrap();
        network
            .add_generator("Dear", "East", Capacity::fixed(200.0), 60.0)
            .unwrap();
        network
            .add_line("West-East", "West", "East", 0.1, 0.01, Capacity::fixed(line_limit))
            .unwrap();
        let p_set = network.flat_series(100.0);
        network.add_load("City", "East", p_set).unwrap();
        network
    }
}
