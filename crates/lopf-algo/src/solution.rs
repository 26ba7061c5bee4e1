//! Solved dispatch: the immutable output of one solve.

use std::fmt::Write as _;

use lopf_core::{EntityKind, LopfError, LopfResult, MegawattHours, SnapshotIndex};
use serde::Serialize;

use crate::traits::SolveStatus;

/// Dispatch of one generator over the horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratorDispatch {
    pub name: String,
    pub bus: String,
    pub carrier: Option<String>,
    pub emission_factor: Option<f64>,
    /// MW per snapshot.
    pub p: Vec<f64>,
}

impl GeneratorDispatch {
    pub fn energy(&self) -> MegawattHours {
        MegawattHours::new(self.p.iter().sum())
    }

    pub fn emissions(&self) -> f64 {
        let factor = self.emission_factor.unwrap_or(0.0);
        self.p.iter().map(|p| p * factor).sum()
    }
}

/// Optimized size of an extendable generator or line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityDecision {
    /// `generator` or `line`.
    pub component: &'static str,
    pub name: String,
    pub p_nom_opt: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusPrices {
    pub bus: String,
    /// Marginal price per snapshot, the dual of the bus's power balance.
    pub marginal_price: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineFlow {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    /// Flow per snapshot, positive from `bus0` to `bus1`.
    pub p0: Vec<f64>,
}

/// Result of a solve.
///
/// When `status` is anything but optimal the objective is NaN and every
/// table is empty. Use [`Solution::ensure_optimal`] to turn that into an
/// error.
#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub(crate) network: String,
    pub(crate) status: SolveStatus,
    pub(crate) objective: f64,
    pub(crate) operating_cost: f64,
    pub(crate) investment_cost: f64,
    pub(crate) backend: String,
    pub(crate) iterations: u32,
    pub(crate) solve_time_ms: f64,
    pub(crate) message: Option<String>,
    pub(crate) snapshots: SnapshotIndex,
    pub(crate) demand: Vec<f64>,
    pub(crate) generators: Vec<GeneratorDispatch>,
    pub(crate) capacities: Vec<CapacityDecision>,
    pub(crate) prices: Vec<BusPrices>,
    pub(crate) line_flows: Vec<LineFlow>,
}

impl Solution {
    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn solve_time_ms(&self) -> f64 {
        self.solve_time_ms
    }

    /// Solver message, set for non-optimal outcomes.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn snapshots(&self) -> &SnapshotIndex {
        &self.snapshots
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn generators(&self) -> &[GeneratorDispatch] {
        &self.generators
    }

    pub fn capacities(&self) -> &[CapacityDecision] {
        &self.capacities
    }

    pub fn prices(&self) -> &[BusPrices] {
        &self.prices
    }

    pub fn line_flows(&self) -> &[LineFlow] {
        &self.line_flows
    }

    pub fn generator(&self, name: &str) -> Option<&GeneratorDispatch> {
        self.generators.iter().find(|g| g.name == name)
    }

    /// Dispatch series of a generator.
    pub fn dispatch(&self, name: &str) -> Option<&[f64]> {
        self.generator(name).map(|g| g.p.as_slice())
    }

    fn capacity(&self, component: EntityKind, name: &str) -> Option<f64> {
        self.capacities
            .iter()
            .find(|c| c.component == component.as_str() && c.name == name)
            .map(|c| c.p_nom_opt)
    }

    /// Optimized capacity of an extendable generator.
    pub fn generator_capacity(&self, name: &str) -> Option<f64> {
        self.capacity(EntityKind::Generator, name)
    }

    /// Optimized thermal limit of an extendable line.
    pub fn line_capacity(&self, name: &str) -> Option<f64> {
        self.capacity(EntityKind::Line, name)
    }

    pub fn marginal_price(&self, bus: &str) -> Option<&[f64]> {
        self.prices
            .iter()
            .find(|p| p.bus == bus)
            .map(|p| p.marginal_price.as_slice())
    }

    pub fn line_flow(&self, line: &str) -> Option<&[f64]> {
        self.line_flows
            .iter()
            .find(|l| l.name == line)
            .map(|l| l.p0.as_slice())
    }

    pub fn generator_energy(&self, name: &str) -> Option<MegawattHours> {
        self.generator(name).map(GeneratorDispatch::energy)
    }

    pub fn generator_emissions(&self, name: &str) -> Option<f64> {
        self.generator(name).map(GeneratorDispatch::emissions)
    }

    pub fn total_emissions(&self) -> f64 {
        self.generators.iter().map(GeneratorDispatch::emissions).sum()
    }

    pub fn total_generation(&self) -> MegawattHours {
        self.generators.iter().map(GeneratorDispatch::energy).sum()
    }

    pub fn total_demand(&self) -> MegawattHours {
        MegawattHours::new(self.demand.iter().sum())
    }

    /// Dispatch summed per carrier, in the order carriers first appear.
    /// Generators without a carrier are grouped under `other`.
    pub fn dispatch_by_carrier(&self) -> Vec<(String, Vec<f64>)> {
        let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
        for generator in &self.generators {
            let carrier = generator.carrier.as_deref().unwrap_or("other");
            let idx = match groups.iter().position(|(c, _)| c == carrier) {
                Some(idx) => idx,
                None => {
                    groups.push((carrier.to_string(), vec![0.0; generator.p.len()]));
                    groups.len() - 1
                }
            };
            for (acc, p) in groups[idx].1.iter_mut().zip(&generator.p) {
                *acc += p;
            }
        }
        groups
    }

    /// Marginal-cost part of the objective.
    pub fn operating_cost(&self) -> f64 {
        self.operating_cost
    }

    /// Capital-cost part of the objective.
    pub fn investment_cost(&self) -> f64 {
        self.investment_cost
    }

    pub fn ensure_optimal(&self) -> LopfResult<()> {
        let detail = || match &self.message {
            Some(message) => format!("network '{}': {message}", self.network),
            None => format!("network '{}'", self.network),
        };
        match self.status {
            SolveStatus::Optimal => Ok(()),
            SolveStatus::Infeasible => Err(LopfError::Infeasible(detail())),
            SolveStatus::Unbounded => Err(LopfError::Unbounded(detail())),
            SolveStatus::SolverError => Err(LopfError::Solver(detail())),
        }
    }

    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Network:    {}", self.network);
        let _ = writeln!(
            out,
            "Status:     {} ({}, {} iterations, {:.1} ms)",
            self.status, self.backend, self.iterations, self.solve_time_ms
        );
        if !self.is_optimal() {
            if let Some(message) = &self.message {
                let _ = writeln!(out, "Message:    {message}");
            }
            return out;
        }
        let _ = writeln!(out, "Objective:  {:.2}", self.objective);
        let _ = writeln!(out, "  operating  {:.2}", self.operating_cost);
        let _ = writeln!(out, "  investment {:.2}", self.investment_cost);
        let _ = writeln!(out, "Generation: {}", self.total_generation());
        let _ = writeln!(out, "Demand:     {}", self.total_demand());
        let _ = writeln!(out, "Emissions:  {:.2} t", self.total_emissions());
        if !self.capacities.is_empty() {
            let _ = writeln!(out, "Optimized capacity:");
            for c in &self.capacities {
                let _ = writeln!(out, "  {:<12} {:>10.2} MW ({})", c.name, c.p_nom_opt, c.component);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::hourly;

    fn sample() -> Solution {
        Solution {
            network: "sample".into(),
            status: SolveStatus::Optimal,
            objective: 1000.0,
            operating_cost: 400.0,
            investment_cost: 600.0,
            backend: "clarabel".into(),
            iterations: 8,
            solve_time_ms: 1.5,
            message: None,
            snapshots: hourly(2),
            demand: vec![30.0, 40.0],
            generators: vec![
                GeneratorDispatch {
                    name: "Coal".into(),
                    bus: "Bus".into(),
                    carrier: Some("coal".into()),
                    emission_factor: Some(0.9),
                    p: vec![10.0, 20.0],
                },
                GeneratorDispatch {
                    name: "Solar".into(),
                    bus: "Bus".into(),
                    carrier: None,
                    emission_factor: None,
                    p: vec![15.0, 5.0],
                },
                GeneratorDispatch {
                    name: "Coal 2".into(),
                    bus: "Bus".into(),
                    carrier: Some("coal".into()),
                    emission_factor: Some(1.0),
                    p: vec![5.0, 15.0],
                },
            ],
            capacities: vec![
                CapacityDecision {
                    component: "generator",
                    name: "Solar".into(),
                    p_nom_opt: 1.0,
                },
                CapacityDecision {
                    component: "line",
                    name: "Solar".into(),
                    p_nom_opt: 30.0,
                },
            ],
            prices: vec![BusPrices {
                bus: "Bus".into(),
                marginal_price: vec![40.0, 70.0],
            }],
            line_flows: Vec::new(),
        }
    }

    #[test]
    fn test_energy_and_emissions() {
        let s = sample();
        assert_eq!(s.generator_energy("Coal").unwrap().value(), 30.0);
        assert!((s.generator_emissions("Coal").unwrap() - 27.0).abs() < 1e-12);
        assert_eq!(s.generator_emissions("Solar"), Some(0.0));
        assert!((s.total_emissions() - 47.0).abs() < 1e-12);
        assert_eq!(s.total_generation().value(), 70.0);
        assert_eq!(s.total_demand().value(), 70.0);
        assert!(s.generator_energy("Nuclear").is_none());
    }

    #[test]
    fn test_dispatch_by_carrier_groups_in_first_seen_order() {
        let groups = sample().dispatch_by_carrier();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], ("coal".to_string(), vec![15.0, 35.0]));
        assert_eq!(groups[1], ("other".to_string(), vec![15.0, 5.0]));
    }

    #[test]
    fn test_lookups() {
        let s = sample();
        assert_eq!(s.generator_capacity("Solar"), Some(1.0));
        assert_eq!(s.line_capacity("Solar"), Some(30.0));
        assert!(s.line_capacity("Bus").is_none());
        assert_eq!(s.marginal_price("Bus"), Some(&[40.0, 70.0][..]));
        assert_eq!(s.dispatch("Solar"), Some(&[15.0, 5.0][..]));
        assert!(s.line_flow("Cable").is_none());
        assert_eq!(s.snapshot_count(), 2);
    }

    #[test]
    fn test_ensure_optimal_maps_status() {
        let mut s = sample();
        assert!(s.ensure_optimal().is_ok());
        s.status = SolveStatus::Infeasible;
        assert!(matches!(s.ensure_optimal(), Err(LopfError::Infeasible(_))));
        s.status = SolveStatus::SolverError;
        s.message = Some("time limit reached".into());
        let err = s.ensure_optimal().unwrap_err();
        assert!(err.to_string().contains("time limit reached"));
    }

    #[test]
    fn test_summary_lists_capacities() {
        let text = sample().summary();
        assert!(text.contains("optimal (clarabel, 8 iterations"));
        assert!(text.contains("Solar"));
        assert!(text.contains("Emissions:  47.00 t"));
    }
}
