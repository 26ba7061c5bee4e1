use std::collections::HashMap;
use std::fmt;

use crate::diagnostics::Diagnostics;
use crate::graph_utils;
use crate::{
    Bus, BusId, Capacity, EntityKind, Generator, GeneratorId, Line, LineId, Load, LoadId,
    LopfError, LopfResult, MegawattHours, Megawatts, SnapshotIndex,
};

/// One network is one optimization problem.
///
/// The network owns every entity plus the snapshot index. It is assembled
/// through the `add_*` / `set_*` methods, which validate eagerly, and is
/// only read afterwards: problem builders take `&Network`.
#[derive(Debug, Clone)]
pub struct Network {
    name: String,
    snapshots: SnapshotIndex,
    buses: Vec<Bus>,
    generators: Vec<Generator>,
    lines: Vec<Line>,
    loads: Vec<Load>,
    bus_index: HashMap<String, BusId>,
    generator_index: HashMap<String, GeneratorId>,
    line_index: HashMap<String, LineId>,
    load_index: HashMap<String, LoadId>,
}

impl Network {
    pub fn new(snapshots: SnapshotIndex) -> Self {
        Self {
            name: "network".to_string(),
            snapshots,
            buses: Vec::new(),
            generators: Vec::new(),
            lines: Vec::new(),
            loads: Vec::new(),
            bus_index: HashMap::new(),
            generator_index: HashMap::new(),
            line_index: HashMap::new(),
            load_index: HashMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snapshots(&self) -> &SnapshotIndex {
        &self.snapshots
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// `value` repeated once per snapshot.
    pub fn flat_series(&self, value: f64) -> Vec<f64> {
        vec![value; self.snapshot_count()]
    }

    // ------------------------------------------------------------------
    // Assembly
    // ------------------------------------------------------------------

    pub fn add_bus(
        &mut self,
        name: impl Into<String>,
        carrier: impl Into<String>,
    ) -> LopfResult<BusId> {
        let name = name.into();
        if self.bus_index.contains_key(&name) {
            return Err(LopfError::DuplicateName {
                kind: EntityKind::Bus,
                name,
            });
        }
        let id = BusId::new(self.buses.len());
        self.bus_index.insert(name.clone(), id);
        self.buses.push(Bus {
            id,
            name,
            carrier: carrier.into(),
        });
        Ok(id)
    }

    /// Adds a generator available at full capacity in every snapshot.
    pub fn add_generator(
        &mut self,
        name: impl Into<String>,
        bus: &str,
        capacity: Capacity,
        marginal_cost: f64,
    ) -> LopfResult<GeneratorId> {
        let name = name.into();
        if self.generator_index.contains_key(&name) {
            return Err(LopfError::DuplicateName {
                kind: EntityKind::Generator,
                name,
            });
        }
        let bus = self.resolve_bus(EntityKind::Generator, &name, bus)?;
        capacity.check(EntityKind::Generator, &name)?;
        check_finite(EntityKind::Generator, &name, "marginal cost", marginal_cost)?;

        let id = GeneratorId::new(self.generators.len());
        let p_max_pu = self.flat_series(1.0);
        self.generator_index.insert(name.clone(), id);
        self.generators.push(Generator {
            id,
            name,
            bus,
            carrier: None,
            capacity,
            marginal_cost,
            p_max_pu,
            emission_factor: None,
        });
        Ok(id)
    }

    pub fn set_p_max_pu(&mut self, id: GeneratorId, values: Vec<f64>) -> LopfResult<()> {
        let expected = self.snapshot_count();
        let generator = self
            .generators
            .get_mut(id.value())
            .ok_or_else(|| unknown_id(EntityKind::Generator, id.value()))?;
        if values.len() != expected {
            return Err(LopfError::shape(
                EntityKind::Generator,
                generator.name.as_str(),
                "p_max_pu",
                expected,
                values.len(),
            ));
        }
        if let Some((t, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(LopfError::bounds(
                EntityKind::Generator,
                generator.name.as_str(),
                format!("p_max_pu[{t}] = {v} is outside [0, 1]"),
            ));
        }
        generator.p_max_pu = values;
        Ok(())
    }

    pub fn set_emission_factor(&mut self, id: GeneratorId, factor: f64) -> LopfResult<()> {
        let generator = self
            .generators
            .get_mut(id.value())
            .ok_or_else(|| unknown_id(EntityKind::Generator, id.value()))?;
        if !(factor >= 0.0 && factor.is_finite()) {
            return Err(LopfError::bounds(
                EntityKind::Generator,
                generator.name.as_str(),
                format!("emission factor must be finite and non-negative, got {factor}"),
            ));
        }
        generator.emission_factor = Some(factor);
        Ok(())
    }

    pub fn set_generator_carrier(
        &mut self,
        id: GeneratorId,
        carrier: impl Into<String>,
    ) -> LopfResult<()> {
        let generator = self
            .generators
            .get_mut(id.value())
            .ok_or_else(|| unknown_id(EntityKind::Generator, id.value()))?;
        generator.carrier = Some(carrier.into());
        Ok(())
    }

    pub fn add_line(
        &mut self,
        name: impl Into<String>,
        bus0: &str,
        bus1: &str,
        reactance: f64,
        resistance: f64,
        capacity: Capacity,
    ) -> LopfResult<LineId> {
        let name = name.into();
        if self.line_index.contains_key(&name) {
            return Err(LopfError::DuplicateName {
                kind: EntityKind::Line,
                name,
            });
        }
        let from = self.resolve_bus(EntityKind::Line, &name, bus0)?;
        let to = self.resolve_bus(EntityKind::Line, &name, bus1)?;
        if from == to {
            return Err(LopfError::bounds(
                EntityKind::Line,
                name,
                format!("both ends connect to bus '{bus0}'"),
            ));
        }
        capacity.check(EntityKind::Line, &name)?;
        check_finite(EntityKind::Line, &name, "reactance", reactance)?;
        check_finite(EntityKind::Line, &name, "resistance", resistance)?;

        let id = LineId::new(self.lines.len());
        self.line_index.insert(name.clone(), id);
        self.lines.push(Line {
            id,
            name,
            bus0: from,
            bus1: to,
            reactance,
            resistance,
            capacity,
        });
        Ok(id)
    }

    pub fn add_load(
        &mut self,
        name: impl Into<String>,
        bus: &str,
        p_set: Vec<f64>,
    ) -> LopfResult<LoadId> {
        let name = name.into();
        if self.load_index.contains_key(&name) {
            return Err(LopfError::DuplicateName {
                kind: EntityKind::Load,
                name,
            });
        }
        let bus = self.resolve_bus(EntityKind::Load, &name, bus)?;
        check_demand(&name, &p_set, self.snapshot_count())?;

        let id = LoadId::new(self.loads.len());
        self.load_index.insert(name.clone(), id);
        self.loads.push(Load {
            id,
            name,
            bus,
            p_set,
        });
        Ok(id)
    }

    pub fn set_p_set(&mut self, id: LoadId, values: Vec<f64>) -> LopfResult<()> {
        let expected = self.snapshot_count();
        let load = self
            .loads
            .get_mut(id.value())
            .ok_or_else(|| unknown_id(EntityKind::Load, id.value()))?;
        check_demand(&load.name, &values, expected)?;
        load.p_set = values;
        Ok(())
    }

    fn resolve_bus(&self, kind: EntityKind, name: &str, bus: &str) -> LopfResult<BusId> {
        self.bus_index
            .get(bus)
            .copied()
            .ok_or_else(|| LopfError::reference(kind, name, bus))
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn buses(&self) -> &[Bus] {
        &self.buses
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn loads(&self) -> &[Load] {
        &self.loads
    }

    pub fn bus(&self, id: BusId) -> &Bus {
        &self.buses[id.value()]
    }

    pub fn generator(&self, id: GeneratorId) -> &Generator {
        &self.generators[id.value()]
    }

    pub fn line(&self, id: LineId) -> &Line {
        &self.lines[id.value()]
    }

    pub fn load(&self, id: LoadId) -> &Load {
        &self.loads[id.value()]
    }

    pub fn bus_id(&self, name: &str) -> Option<BusId> {
        self.bus_index.get(name).copied()
    }

    pub fn generator_id(&self, name: &str) -> Option<GeneratorId> {
        self.generator_index.get(name).copied()
    }

    pub fn line_id(&self, name: &str) -> Option<LineId> {
        self.line_index.get(name).copied()
    }

    pub fn load_id(&self, name: &str) -> Option<LoadId> {
        self.load_index.get(name).copied()
    }

    pub fn generators_at(&self, bus: BusId) -> impl Iterator<Item = &Generator> + '_ {
        self.generators.iter().filter(move |g| g.bus == bus)
    }

    pub fn loads_at(&self, bus: BusId) -> impl Iterator<Item = &Load> + '_ {
        self.loads.iter().filter(move |l| l.bus == bus)
    }

    pub fn has_extendable_generators(&self) -> bool {
        self.generators.iter().any(Generator::is_extendable)
    }

    /// System-wide demand at snapshot `t`.
    pub fn total_demand(&self, t: usize) -> Megawatts {
        self.loads.iter().map(|l| Megawatts(l.p_set[t])).sum()
    }

    /// Largest output all generators could reach at snapshot `t`, counting
    /// extendable generators at their maximum capacity.
    pub fn available_capacity(&self, t: usize) -> Megawatts {
        self.generators.iter().map(|g| g.max_output(t)).sum()
    }

    pub fn islands(&self) -> Vec<Vec<BusId>> {
        graph_utils::islands(self)
    }

    // ------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------

    pub fn stats(&self) -> NetworkStats {
        let peak_demand = (0..self.snapshot_count())
            .map(|t| self.total_demand(t))
            .fold(Megawatts::ZERO, |a, b| if b > a { b } else { a });
        let total_demand = (0..self.snapshot_count())
            .map(|t| self.total_demand(t).over_hours(1.0))
            .sum();

        NetworkStats {
            buses: self.buses.len(),
            generators: self.generators.len(),
            extendable_generators: self
                .generators
                .iter()
                .filter(|g| g.is_extendable())
                .count(),
            lines: self.lines.len(),
            loads: self.loads.len(),
            snapshots: self.snapshot_count(),
            fixed_capacity: self
                .generators
                .iter()
                .filter_map(|g| match g.capacity {
                    Capacity::Fixed { nominal } => Some(nominal),
                    Capacity::Extendable { .. } => None,
                })
                .sum(),
            peak_demand,
            total_demand,
        }
    }

    /// Records advisory findings that do not stop a problem from being built
    /// but usually explain a surprising solve outcome.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        if self.buses.is_empty() {
            diag.add_error("structure", "network has no buses");
            return;
        }
        if self.generators.is_empty() {
            diag.add_warning("structure", "network has no generators");
        }
        if self.loads.is_empty() {
            diag.add_warning("structure", "network has no loads");
        }
        if self.buses.len() > 1 && self.lines.is_empty() {
            diag.add_warning(
                "topology",
                "network has multiple buses but no lines; every bus must balance on its own",
            );
        }

        let islands = self.islands();
        if islands.len() > 1 {
            diag.add_warning(
                "topology",
                &format!("network splits into {} islands", islands.len()),
            );
        }

        for line in &self.lines {
            if let Capacity::Fixed { nominal } = line.capacity {
                if nominal.value() == 0.0 {
                    diag.add_warning_with_entity(
                        "capacity",
                        "line has zero thermal limit and can carry no flow",
                        &format!("line '{}'", line.name),
                    );
                }
            }
        }

        if !self.has_extendable_generators() {
            let short: Vec<usize> = (0..self.snapshot_count())
                .filter(|&t| self.total_demand(t).value() > self.available_capacity(t).value() + 1e-9)
                .collect();
            if let Some(&first) = short.first() {
                let when = self
                    .snapshots
                    .get(first)
                    .map(|ts| ts.to_string())
                    .unwrap_or_default();
                diag.add_warning_with_entity(
                    "capacity",
                    &format!(
                        "demand exceeds available capacity in {} snapshot(s); the problem is likely infeasible",
                        short.len()
                    ),
                    &format!("first at {when}"),
                );
            }
        }
    }
}

/// Size and capacity overview of a network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkStats {
    pub buses: usize,
    pub generators: usize,
    pub extendable_generators: usize,
    pub lines: usize,
    pub loads: usize,
    pub snapshots: usize,
    pub fixed_capacity: Megawatts,
    pub peak_demand: Megawatts,
    pub total_demand: MegawattHours,
}

impl fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} buses, {} lines, {} generators ({} extendable, {:.0} MW fixed), {} loads (peak {:.0} MW), {} snapshots",
            self.buses,
            self.lines,
            self.generators,
            self.extendable_generators,
            self.fixed_capacity.value(),
            self.loads,
            self.peak_demand.value(),
            self.snapshots
        )
    }
}

fn unknown_id(kind: EntityKind, index: usize) -> LopfError {
    LopfError::Validation(format!("no {kind} with id {index} in this network"))
}

fn check_finite(kind: EntityKind, name: &str, what: &str, value: f64) -> LopfResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(LopfError::bounds(
            kind,
            name,
            format!("{what} must be finite, got {value}"),
        ))
    }
}

fn check_demand(name: &str, p_set: &[f64], expected: usize) -> LopfResult<()> {
    if p_set.len() != expected {
        return Err(LopfError::shape(
            EntityKind::Load,
            name,
            "p_set",
            expected,
            p_set.len(),
        ));
    }
    if let Some((t, v)) = p_set
        .iter()
        .enumerate()
        .find(|(_, v)| !(**v >= 0.0 && v.is_finite()))
    {
        return Err(LopfError::bounds(
            EntityKind::Load,
            name,
            format!("p_set[{t}] = {v} must be finite and non-negative"),
        ));
    }
    Ok(())
}
