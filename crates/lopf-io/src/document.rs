//! Serde model of a network description and its conversion to and from
//! [`Network`].

use lopf_core::costs::annualized_capital_cost;
use lopf_core::snapshots::{format_frequency, parse_frequency, parse_timestamp};
use lopf_core::{Capacity, LopfError, LopfResult, Network, SnapshotIndex};
use serde::{Deserialize, Serialize};
use tracing::warn;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    #[serde(default = "default_name")]
    pub name: String,
    pub snapshots: SnapshotsSpec,
    #[serde(default)]
    pub buses: Vec<BusSpec>,
    #[serde(default)]
    pub generators: Vec<GeneratorSpec>,
    #[serde(default)]
    pub lines: Vec<LineSpec>,
    #[serde(default)]
    pub loads: Vec<LoadSpec>,
}

fn default_name() -> String {
    "network".to_string()
}

fn default_carrier() -> String {
    "AC".to_string()
}

fn default_frequency() -> String {
    "h".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotsSpec {
    /// Regular grid from `start` to `end` inclusive.
    Range {
        start: String,
        end: String,
        #[serde(default = "default_frequency")]
        freq: String,
    },
    Explicit { timestamps: Vec<String> },
}

/// A time series given either as one value for every snapshot or as an
/// explicit list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Series {
    Scalar(f64),
    Values(Vec<f64>),
}

impl Series {
    fn resolve(&self, network: &Network) -> Vec<f64> {
        match self {
            Series::Scalar(value) => network.flat_series(*value),
            Series::Values(values) => values.clone(),
        }
    }

    /// Scalar when every value is identical.
    fn compact(values: &[f64]) -> Self {
        match values.split_first() {
            Some((first, rest)) if rest.iter().all(|v| v.to_bits() == first.to_bits()) => {
                Series::Scalar(*first)
            }
            _ => Series::Values(values.to_vec()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CapitalCost {
    /// Cost per MW of built capacity, as seen by the optimizer.
    PerMw(f64),
    /// Overnight cost annualized with a capital recovery factor.
    Annualized {
        overnight: f64,
        lifetime_years: f64,
        discount_rate: f64,
    },
}

impl CapitalCost {
    pub fn per_mw(&self) -> LopfResult<f64> {
        match *self {
            CapitalCost::PerMw(cost) => Ok(cost),
            CapitalCost::Annualized {
                overnight,
                lifetime_years,
                discount_rate,
            } => annualized_capital_cost(overnight, discount_rate, lifetime_years),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusSpec {
    pub name: String,
    #[serde(default = "default_carrier")]
    pub carrier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSpec {
    pub name: String,
    pub bus: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_nom: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub p_nom_extendable: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub p_nom_min: f64,
    /// Absent means no upper limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_nom_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_cost: Option<CapitalCost>,
    #[serde(default)]
    pub marginal_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_max_pu: Option<Series>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emission_factor: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSpec {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub r: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s_nom: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub s_nom_extendable: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub s_nom_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s_nom_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital_cost: Option<CapitalCost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSpec {
    pub name: String,
    pub bus: String,
    pub p_set: Series,
}

/// Shared decoding of the `p_nom`/`s_nom` family of fields.
#[allow(clippy::too_many_arguments)]
fn capacity_from_fields(
    kind: &str,
    name: &str,
    prefix: &str,
    nominal: Option<f64>,
    extendable: bool,
    min: f64,
    max: Option<f64>,
    capital_cost: Option<&CapitalCost>,
) -> LopfResult<Capacity> {
    match (extendable, nominal) {
        (true, Some(_)) => Err(LopfError::Parse(format!(
            "{kind} '{name}': {prefix} and {prefix}_extendable are mutually exclusive"
        ))),
        (true, None) => {
            let capital_cost = match capital_cost {
                Some(cost) => cost.per_mw()?,
                None => 0.0,
            };
            Ok(Capacity::extendable(
                min,
                max.unwrap_or(f64::INFINITY),
                capital_cost,
            ))
        }
        (false, None) => Err(LopfError::Parse(format!(
            "{kind} '{name}': {prefix} is required unless {prefix}_extendable is true"
        ))),
        (false, Some(nominal)) => {
            if capital_cost.is_some() {
                warn!(kind, name, "capital_cost ignored on a fixed-capacity component");
            }
            Ok(Capacity::fixed(nominal))
        }
    }
}

/// `(nominal, extendable, min, max, capital_cost)` for serialization.
fn capacity_fields(capacity: &Capacity) -> (Option<f64>, bool, f64, Option<f64>, Option<CapitalCost>) {
    match *capacity {
        Capacity::Fixed { nominal } => (Some(nominal.value()), false, 0.0, None, None),
        Capacity::Extendable {
            min,
            max,
            capital_cost,
        } => (
            None,
            true,
            min.value(),
            max.is_finite().then(|| max.value()),
            Some(CapitalCost::PerMw(capital_cost)),
        ),
    }
}

impl SnapshotsSpec {
    pub fn to_index(&self) -> LopfResult<SnapshotIndex> {
        match self {
            SnapshotsSpec::Range { start, end, freq } => SnapshotIndex::date_range(
                parse_timestamp(start)?,
                parse_timestamp(end)?,
                parse_frequency(freq)?,
            ),
            SnapshotsSpec::Explicit { timestamps } => SnapshotIndex::from_timestamps(
                timestamps
                    .iter()
                    .map(|ts| parse_timestamp(ts))
                    .collect::<LopfResult<Vec<_>>>()?,
            ),
        }
    }

    /// Range form for regular whole-second grids, explicit timestamps otherwise.
    pub fn from_index(index: &SnapshotIndex) -> Self {
        match index.frequency() {
            Some(freq) if freq.num_seconds() > 0 && freq.subsec_nanos() == 0 => {
                SnapshotsSpec::Range {
                    start: index.start().format(TIMESTAMP_FORMAT).to_string(),
                    end: index.end().format(TIMESTAMP_FORMAT).to_string(),
                    freq: format_frequency(freq),
                }
            }
            _ => SnapshotsSpec::Explicit {
                timestamps: index
                    .iter()
                    .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
                    .collect(),
            },
        }
    }
}

impl NetworkDocument {
    /// Assemble a [`Network`]. Network-level validation errors propagate
    /// unchanged.
    pub fn to_network(&self) -> LopfResult<Network> {
        let mut network = Network::new(self.snapshots.to_index()?).with_name(self.name.as_str());

        for bus in &self.buses {
            network.add_bus(bus.name.as_str(), bus.carrier.as_str())?;
        }

        for spec in &self.generators {
            let capacity = capacity_from_fields(
                "generator",
                &spec.name,
                "p_nom",
                spec.p_nom,
                spec.p_nom_extendable,
                spec.p_nom_min,
                spec.p_nom_max,
                spec.capital_cost.as_ref(),
            )?;
            let id = network.add_generator(spec.name.as_str(), &spec.bus, capacity, spec.marginal_cost)?;
            if let Some(carrier) = &spec.carrier {
                network.set_generator_carrier(id, carrier.as_str())?;
            }
            if let Some(p_max_pu) = &spec.p_max_pu {
                let values = p_max_pu.resolve(&network);
                network.set_p_max_pu(id, values)?;
            }
            if let Some(factor) = spec.emission_factor {
                network.set_emission_factor(id, factor)?;
            }
        }

        for spec in &self.lines {
            let capacity = capacity_from_fields(
                "line",
                &spec.name,
                "s_nom",
                spec.s_nom,
                spec.s_nom_extendable,
                spec.s_nom_min,
                spec.s_nom_max,
                spec.capital_cost.as_ref(),
            )?;
            network.add_line(spec.name.as_str(), &spec.bus0, &spec.bus1, spec.x, spec.r, capacity)?;
        }

        for spec in &self.loads {
            let p_set = spec.p_set.resolve(&network);
            network.add_load(spec.name.as_str(), &spec.bus, p_set)?;
        }

        Ok(network)
    }

    pub fn from_network(network: &Network) -> Self {
        let buses = network
            .buses()
            .iter()
            .map(|bus| BusSpec {
                name: bus.name.clone(),
                carrier: bus.carrier.clone(),
            })
            .collect();

        let generators = network
            .generators()
            .iter()
            .map(|g| {
                let (p_nom, p_nom_extendable, p_nom_min, p_nom_max, capital_cost) =
                    capacity_fields(&g.capacity);
                let p_max_pu = match Series::compact(&g.p_max_pu) {
                    Series::Scalar(v) if v == 1.0 => None,
                    series => Some(series),
                };
                GeneratorSpec {
                    name: g.name.clone(),
                    bus: network.bus(g.bus).name.clone(),
                    carrier: g.carrier.clone(),
                    p_nom,
                    p_nom_extendable,
                    p_nom_min,
                    p_nom_max,
                    capital_cost,
                    marginal_cost: g.marginal_cost,
                    p_max_pu,
                    emission_factor: g.emission_factor,
                }
            })
            .collect();

        let lines = network
            .lines()
            .iter()
            .map(|line| {
                let (s_nom, s_nom_extendable, s_nom_min, s_nom_max, capital_cost) =
                    capacity_fields(&line.capacity);
                LineSpec {
                    name: line.name.clone(),
                    bus0: network.bus(line.bus0).name.clone(),
                    bus1: network.bus(line.bus1).name.clone(),
                    x: line.reactance,
                    r: line.resistance,
                    s_nom,
                    s_nom_extendable,
                    s_nom_min,
                    s_nom_max,
                    capital_cost,
                }
            })
            .collect();

        let loads = network
            .loads()
            .iter()
            .map(|load| LoadSpec {
                name: load.name.clone(),
                bus: network.bus(load.bus).name.clone(),
                p_set: Series::compact(&load.p_set),
            })
            .collect();

        Self {
            name: network.name().to_string(),
            snapshots: SnapshotsSpec::from_index(network.snapshots()),
            buses,
            generators,
            lines,
            loads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopf_core::EntityKind;

    fn document(generators: &str) -> String {
        format!(
            r#"{{
                "name": "doc",
                "snapshots": {{"start": "2024-01-01 00:00", "end": "2024-01-01 02:00", "freq": "h"}},
                "buses": [{{"name": "Bus"}}],
                "generators": {generators},
                "loads": [{{"name": "Load", "bus": "Bus", "p_set": [100, 120, 90]}}]
            }}"#
        )
    }

    fn parse(text: &str) -> NetworkDocument {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_scalar_and_list_series() {
        let doc = parse(&document(
            r#"[{"name": "Solar", "bus": "Bus", "p_nom": 50, "p_max_pu": [0.0, 0.5, 1.0]},
                {"name": "Gas", "bus": "Bus", "p_nom": 200, "marginal_cost": 70, "p_max_pu": 0.9}]"#,
        ));
        let network = doc.to_network().unwrap();
        assert_eq!(network.snapshot_count(), 3);
        assert_eq!(network.buses()[0].carrier, "AC");
        let gas = network.generator(network.generator_id("Gas").unwrap());
        assert_eq!(gas.p_max_pu, vec![0.9; 3]);
        assert_eq!(gas.marginal_cost, 70.0);
        assert_eq!(network.loads()[0].p_set, vec![100.0, 120.0, 90.0]);
    }

    #[test]
    fn test_extendable_generator() {
        let doc = parse(&document(
            r#"[{"name": "Wind", "bus": "Bus", "p_nom_extendable": true,
                 "p_nom_min": 10, "capital_cost": 700}]"#,
        ));
        let network = doc.to_network().unwrap();
        assert_eq!(
            network.generators()[0].capacity,
            Capacity::extendable(10.0, f64::INFINITY, 700.0)
        );
    }

    #[test]
    fn test_annualized_capital_cost() {
        let doc = parse(&document(
            r#"[{"name": "Solar", "bus": "Bus", "p_nom_extendable": true,
                 "capital_cost": {"overnight": 1000, "lifetime_years": 20, "discount_rate": 0.0}}]"#,
        ));
        let network = doc.to_network().unwrap();
        assert!((network.generators()[0].capacity.capital_cost() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_capacity_mode_errors() {
        let both = parse(&document(
            r#"[{"name": "G", "bus": "Bus", "p_nom": 10, "p_nom_extendable": true}]"#,
        ));
        assert!(matches!(both.to_network(), Err(LopfError::Parse(_))));

        let neither = parse(&document(r#"[{"name": "G", "bus": "Bus"}]"#));
        let err = neither.to_network().unwrap_err();
        assert!(err.to_string().contains("p_nom is required"));
    }

    #[test]
    fn test_network_errors_propagate() {
        let doc = parse(&document(r#"[{"name": "G", "bus": "Nowhere", "p_nom": 10}]"#));
        assert!(matches!(
            doc.to_network(),
            Err(LopfError::Reference {
                kind: EntityKind::Generator,
                ..
            })
        ));

        let doc = parse(&document(
            r#"[{"name": "G", "bus": "Bus", "p_nom": 10, "p_max_pu": [1.0, 1.0]}]"#,
        ));
        assert!(matches!(doc.to_network(), Err(LopfError::Shape { .. })));
    }

    #[test]
    fn test_explicit_timestamps() {
        let spec = SnapshotsSpec::Explicit {
            timestamps: vec!["2024-01-01 00:00".into(), "2024-01-01 03:00".into(), "2024-01-02".into()],
        };
        let index = spec.to_index().unwrap();
        assert_eq!(index.len(), 3);
        assert!(matches!(SnapshotsSpec::from_index(&index), SnapshotsSpec::Explicit { .. }));
    }

    #[test]
    fn test_sub_second_timestamps_survive_a_round_trip() {
        let spec = SnapshotsSpec::Explicit {
            timestamps: vec![
                "2024-01-01 00:00:00".into(),
                "2024-01-01 00:00:00.250".into(),
                "2024-01-01 00:00:00.750".into(),
            ],
        };
        let index = spec.to_index().unwrap();
        let written = SnapshotsSpec::from_index(&index);
        let SnapshotsSpec::Explicit { timestamps } = &written else {
            panic!("expected explicit timestamps, got {written:?}");
        };
        assert_eq!(timestamps[0], "2024-01-01 00:00:00");
        assert_eq!(timestamps[1], "2024-01-01 00:00:00.250");
        assert_eq!(written.to_index().unwrap(), index);
    }

    #[test]
    fn test_from_network_compacts_series() {
        let doc = parse(&document(
            r#"[{"name": "Wind", "bus": "Bus", "p_nom_extendable": true, "capital_cost": 700}]"#,
        ));
        let network = doc.to_network().unwrap();
        let written = NetworkDocument::from_network(&network);
        let wind = &written.generators[0];
        assert_eq!(wind.p_max_pu, None);
        assert_eq!(wind.p_nom_max, None);
        assert_eq!(wind.capital_cost, Some(CapitalCost::PerMw(700.0)));
        assert_eq!(
            written.snapshots,
            SnapshotsSpec::Range {
                start: "2024-01-01 00:00:00".into(),
                end: "2024-01-01 02:00:00".into(),
                freq: "1h".into(),
            }
        );
    }
}
