//! Translation of a [`Network`] into a [`LinearProgram`].
//!
//! ## Variables (in this order)
//!
//! | block | index | bounds | cost |
//! |-------|-------|--------|------|
//! | `p[g,t]` | generator-major | `0 ≤ p ≤ p_nom·p_max_pu` (fixed) or `0 ≤ p` (extendable) | marginal cost |
//! | `cap[g]` | extendable generators | `p_nom_min ≤ cap ≤ p_nom_max` | capital cost |
//! | `flow[l,t]` | line-major | `±s_nom` (fixed) or free (extendable) | 0 |
//! | `s_nom[l]` | extendable lines | `s_nom_min ≤ s_nom ≤ s_nom_max` | capital cost |
//! | `theta[b,t]` | DC angle model only | free, 0 at each island's reference bus | 0 |
//!
//! ## Constraints (in this order)
//!
//! 1. Power balance per bus and snapshot (bus-major):
//!    `Σ p[g,t] + Σ_{l into b} flow[l,t] − Σ_{l out of b} flow[l,t] = demand[b,t]`.
//!    Its dual is the nodal marginal price.
//! 2. `p[g,t] − p_max_pu[g,t]·cap[g] ≤ 0` for extendable generators.
//! 3. `±flow[l,t] − s_nom[l] ≤ 0` for extendable lines.
//! 4. `flow[l,t] − (theta[bus0,t] − theta[bus1,t]) / x_l = 0` under [`FlowModel::DcAngle`].
//!
//! The builder only reads the network and never calls a solver.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use lopf_core::{Capacity, EntityKind, LopfError, LopfResult, Network};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lp::{ConstraintSense, LinearProgram};

/// How line flows relate to each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowModel {
    /// Net-transfer model: each line is an independent flow bounded by its
    /// thermal limit. Reactance and resistance are ignored.
    #[default]
    Transport,
    /// Linearized (DC) power flow: flows follow bus voltage angles through
    /// line reactances.
    DcAngle,
}

impl FlowModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowModel::Transport => "transport",
            FlowModel::DcAngle => "dc_angle",
        }
    }
}

impl fmt::Display for FlowModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowModel {
    type Err = LopfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transport" => Ok(FlowModel::Transport),
            "dc" | "dc_angle" | "dc-angle" => Ok(FlowModel::DcAngle),
            other => Err(LopfError::Config(format!(
                "unknown flow model '{other}'; supported values: transport, dc_angle"
            ))),
        }
    }
}

/// Where each block of variables and constraints starts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VariableLayout {
    pub snapshots: usize,
    pub dispatch_start: usize,
    pub generator_capacity: Vec<Option<usize>>,
    pub flow_start: usize,
    pub line_capacity: Vec<Option<usize>>,
    pub angle_start: Option<usize>,
    pub balance_start: usize,
}

impl VariableLayout {
    pub fn dispatch(&self, generator: usize, t: usize) -> usize {
        self.dispatch_start + generator * self.snapshots + t
    }

    pub fn flow(&self, line: usize, t: usize) -> usize {
        self.flow_start + line * self.snapshots + t
    }

    pub fn angle(&self, bus: usize, t: usize) -> Option<usize> {
        self.angle_start.map(|start| start + bus * self.snapshots + t)
    }

    pub fn balance_row(&self, bus: usize, t: usize) -> usize {
        self.balance_start + bus * self.snapshots + t
    }
}

/// The built LP together with the layout needed to read its solution.
///
/// Handed unchanged from the builder to a backend and then to the extractor.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchProblem {
    lp: LinearProgram,
    layout: VariableLayout,
    flow_model: FlowModel,
}

impl DispatchProblem {
    pub fn lp(&self) -> &LinearProgram {
        &self.lp
    }

    pub fn num_variables(&self) -> usize {
        self.lp.num_variables()
    }

    pub fn num_constraints(&self) -> usize {
        self.lp.num_constraints()
    }

    pub fn snapshot_count(&self) -> usize {
        self.layout.snapshots
    }

    pub fn flow_model(&self) -> FlowModel {
        self.flow_model
    }

    pub(crate) fn layout(&self) -> &VariableLayout {
        &self.layout
    }
}

pub struct ProblemBuilder<'a> {
    network: &'a Network,
    flow_model: FlowModel,
}

impl<'a> ProblemBuilder<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self {
            network,
            flow_model: FlowModel::default(),
        }
    }

    pub fn with_flow_model(mut self, flow_model: FlowModel) -> Self {
        self.flow_model = flow_model;
        self
    }

    pub fn build(&self) -> LopfResult<DispatchProblem> {
        let network = self.network;
        if network.buses().is_empty() {
            return Err(LopfError::Validation(format!(
                "network '{}' has no buses",
                network.name()
            )));
        }
        self.check_shapes()?;

        let n_t = network.snapshot_count();
        let mut lp = LinearProgram::new();

        let dispatch_start = lp.num_variables();
        for g in network.generators() {
            for t in 0..n_t {
                let upper = match g.capacity {
                    Capacity::Fixed { nominal } => nominal.value() * g.p_max_pu[t],
                    Capacity::Extendable { .. } => f64::INFINITY,
                };
                lp.add_variable(format!("p[{},{t}]", g.name), 0.0, upper, g.marginal_cost);
            }
        }

        let generator_capacity = network
            .generators()
            .iter()
            .map(|g| match g.capacity {
                Capacity::Extendable {
                    min,
                    max,
                    capital_cost,
                } => Some(lp.add_variable(
                    format!("cap[{}]", g.name),
                    min.value(),
                    max.value(),
                    capital_cost,
                )),
                Capacity::Fixed { .. } => None,
            })
            .collect();

        let flow_start = lp.num_variables();
        for line in network.lines() {
            let limit = match line.capacity {
                Capacity::Fixed { nominal } => nominal.value(),
                Capacity::Extendable { .. } => f64::INFINITY,
            };
            for t in 0..n_t {
                lp.add_variable(format!("flow[{},{t}]", line.name), -limit, limit, 0.0);
            }
        }

        let line_capacity = network
            .lines()
            .iter()
            .map(|line| match line.capacity {
                Capacity::Extendable {
                    min,
                    max,
                    capital_cost,
                } => Some(lp.add_variable(
                    format!("s_nom[{}]", line.name),
                    min.value(),
                    max.value(),
                    capital_cost,
                )),
                Capacity::Fixed { .. } => None,
            })
            .collect();

        let angle_start = match self.flow_model {
            FlowModel::Transport => None,
            FlowModel::DcAngle => {
                let references: HashSet<_> = network
                    .islands()
                    .iter()
                    .filter_map(|island| island.first().copied())
                    .collect();
                let start = lp.num_variables();
                for bus in network.buses() {
                    let (lo, hi) = if references.contains(&bus.id) {
                        (0.0, 0.0)
                    } else {
                        (f64::NEG_INFINITY, f64::INFINITY)
                    };
                    for t in 0..n_t {
                        lp.add_variable(format!("theta[{},{t}]", bus.name), lo, hi, 0.0);
                    }
                }
                Some(start)
            }
        };

        let layout = VariableLayout {
            snapshots: n_t,
            dispatch_start,
            generator_capacity,
            flow_start,
            line_capacity,
            angle_start,
            balance_start: lp.num_constraints(),
        };

        self.add_power_balance(&mut lp, &layout);
        self.add_capacity_links(&mut lp, &layout);
        if layout.angle_start.is_some() {
            self.add_angle_coupling(&mut lp, &layout)?;
        }

        debug!(
            network = network.name(),
            flow_model = %self.flow_model,
            variables = lp.num_variables(),
            constraints = lp.num_constraints(),
            "built dispatch problem"
        );

        Ok(DispatchProblem {
            lp,
            layout,
            flow_model: self.flow_model,
        })
    }

    /// Series lengths are enforced on mutation; re-checked here so a layout
    /// mismatch can never reach a solver.
    fn check_shapes(&self) -> LopfResult<()> {
        let n_t = self.network.snapshot_count();
        for g in self.network.generators() {
            if g.p_max_pu.len() != n_t {
                return Err(LopfError::shape(
                    EntityKind::Generator,
                    g.name.as_str(),
                    "p_max_pu",
                    n_t,
                    g.p_max_pu.len(),
                ));
            }
        }
        for load in self.network.loads() {
            if load.p_set.len() != n_t {
                return Err(LopfError::shape(
                    EntityKind::Load,
                    load.name.as_str(),
                    "p_set",
                    n_t,
                    load.p_set.len(),
                ));
            }
        }
        Ok(())
    }

    fn add_power_balance(&self, lp: &mut LinearProgram, layout: &VariableLayout) {
        let network = self.network;
        let n_bus = network.buses().len();
        let n_t = layout.snapshots;

        let mut generators_at = vec![Vec::new(); n_bus];
        for g in network.generators() {
            generators_at[g.bus.value()].push(g.id.value());
        }
        let mut lines_in = vec![Vec::new(); n_bus];
        let mut lines_out = vec![Vec::new(); n_bus];
        for line in network.lines() {
            lines_out[line.bus0.value()].push(line.id.value());
            lines_in[line.bus1.value()].push(line.id.value());
        }
        let mut demand = vec![0.0; n_bus * n_t];
        for load in network.loads() {
            let b = load.bus.value();
            for (t, p) in load.p_set.iter().enumerate() {
                demand[b * n_t + t] += p;
            }
        }

        for bus in network.buses() {
            let b = bus.id.value();
            for t in 0..n_t {
                let mut terms =
                    Vec::with_capacity(generators_at[b].len() + lines_in[b].len() + lines_out[b].len());
                terms.extend(generators_at[b].iter().map(|&g| (layout.dispatch(g, t), 1.0)));
                terms.extend(lines_in[b].iter().map(|&l| (layout.flow(l, t), 1.0)));
                terms.extend(lines_out[b].iter().map(|&l| (layout.flow(l, t), -1.0)));
                lp.add_constraint(
                    format!("balance[{},{t}]", bus.name),
                    terms,
                    ConstraintSense::Eq,
                    demand[b * n_t + t],
                );
            }
        }
    }

    fn add_capacity_links(&self, lp: &mut LinearProgram, layout: &VariableLayout) {
        let n_t = layout.snapshots;

        for (g, generator) in self.network.generators().iter().enumerate() {
            let Some(cap) = layout.generator_capacity[g] else {
                continue;
            };
            for t in 0..n_t {
                let mut terms = vec![(layout.dispatch(g, t), 1.0)];
                let p_max_pu = generator.p_max_pu[t];
                if p_max_pu != 0.0 {
                    terms.push((cap, -p_max_pu));
                }
                lp.add_constraint(
                    format!("p_max[{},{t}]", generator.name),
                    terms,
                    ConstraintSense::Le,
                    0.0,
                );
            }
        }

        for (l, line) in self.network.lines().iter().enumerate() {
            let Some(cap) = layout.line_capacity[l] else {
                continue;
            };
            for t in 0..n_t {
                let flow = layout.flow(l, t);
                lp.add_constraint(
                    format!("flow_max[{},{t}]", line.name),
                    vec![(flow, 1.0), (cap, -1.0)],
                    ConstraintSense::Le,
                    0.0,
                );
                lp.add_constraint(
                    format!("flow_min[{},{t}]", line.name),
                    vec![(flow, -1.0), (cap, -1.0)],
                    ConstraintSense::Le,
                    0.0,
                );
            }
        }
    }

    fn add_angle_coupling(&self, lp: &mut LinearProgram, layout: &VariableLayout) -> LopfResult<()> {
        for (l, line) in self.network.lines().iter().enumerate() {
            if !(line.reactance > 0.0) {
                return Err(LopfError::bounds(
                    EntityKind::Line,
                    line.name.as_str(),
                    format!(
                        "DC angle flow needs a positive reactance, got {}",
                        line.reactance
                    ),
                ));
            }
            let susceptance = 1.0 / line.reactance;
            for t in 0..layout.snapshots {
                let (Some(theta0), Some(theta1)) = (
                    layout.angle(line.bus0.value(), t),
                    layout.angle(line.bus1.value(), t),
                ) else {
                    continue;
                };
                lp.add_constraint(
                    format!("kvl[{},{t}]", line.name),
                    vec![
                        (layout.flow(l, t), 1.0),
                        (theta0, -susceptance),
                        (theta1, susceptance),
                    ],
                    ConstraintSense::Eq,
                    0.0,
                );
            }
        }
        Ok(())
    }
}
