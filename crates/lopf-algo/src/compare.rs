//! Comparison of two solved scenarios.
//!
//! Pure arithmetic over [`Solution`]s; nothing here solves anything.

use std::fmt::Write as _;

use lopf_core::{LopfError, LopfResult};
use serde::Serialize;

use crate::solution::{CapacityDecision, Solution};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    pub old_network: String,
    pub new_network: String,
    pub old_objective: f64,
    pub new_objective: f64,
    /// `new − old`; negative when the new scenario is cheaper.
    pub objective_delta: f64,
    pub old_emissions: f64,
    pub new_emissions: f64,
    /// `(old − new) / old · 100`, `None` when the old scenario emits nothing.
    pub emissions_reduction_pct: Option<f64>,
    /// `new / old` objective ratio, `None` when the old objective is zero.
    /// No discounting is applied.
    pub payback_ratio: Option<f64>,
    /// Capacity the new scenario chose to build.
    pub built_capacity: Vec<CapacityDecision>,
}

pub fn compare(old: &Solution, new: &Solution) -> LopfResult<ScenarioComparison> {
    old.ensure_optimal()?;
    new.ensure_optimal()?;
    if old.snapshot_count() != new.snapshot_count() {
        return Err(LopfError::IncompatibleScenarios(format!(
            "'{}' has {} snapshots but '{}' has {}",
            old.network(),
            old.snapshot_count(),
            new.network(),
            new.snapshot_count()
        )));
    }

    let old_emissions = old.total_emissions();
    let new_emissions = new.total_emissions();
    let emissions_reduction_pct = (old_emissions != 0.0)
        .then(|| (old_emissions - new_emissions) / old_emissions * 100.0);
    let payback_ratio = (old.objective() != 0.0).then(|| new.objective() / old.objective());

    Ok(ScenarioComparison {
        old_network: old.network().to_string(),
        new_network: new.network().to_string(),
        old_objective: old.objective(),
        new_objective: new.objective(),
        objective_delta: new.objective() - old.objective(),
        old_emissions,
        new_emissions,
        emissions_reduction_pct,
        payback_ratio,
        built_capacity: new.capacities().to_vec(),
    })
}

fn or_undefined(value: Option<f64>, suffix: &str) -> String {
    match value {
        Some(v) => format!("{v:.2}{suffix}"),
        None => "undefined".to_string(),
    }
}

impl ScenarioComparison {
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Old scenario ({}):", self.old_network);
        let _ = writeln!(out, "  objective  {:.2}", self.old_objective);
        let _ = writeln!(out, "  emissions  {:.2} t", self.old_emissions);
        let _ = writeln!(out, "New scenario ({}):", self.new_network);
        let _ = writeln!(out, "  objective  {:.2}", self.new_objective);
        let _ = writeln!(out, "  emissions  {:.2} t", self.new_emissions);
        for c in &self.built_capacity {
            let _ = writeln!(out, "  build {:<10} {:.2} MW", c.name, c.p_nom_opt);
        }
        let _ = writeln!(out, "Objective delta:     {:.2}", self.objective_delta);
        let _ = writeln!(
            out,
            "Emissions reduction: {}",
            or_undefined(self.emissions_reduction_pct, " %")
        );
        let _ = writeln!(
            out,
            "Payback ratio:       {}",
            or_undefined(self.payback_ratio, "")
        );
        out
    }
}
