//! # lopf-core: network model for least-cost dispatch
//!
//! Typed, validated representation of an energy network that a linear
//! optimal power flow (LOPF) is built from: buses, generators, lines and
//! loads over a shared [`SnapshotIndex`].
//!
//! ## Design
//!
//! Entities live in per-kind arenas owned by [`Network`] and are addressed
//! by `Copy` newtype ids ([`BusId`], [`GeneratorId`], [`LineId`], [`LoadId`])
//! that wrap the arena index. Generators, lines and loads store the id of
//! their bus rather than its name, so problem assembly never performs a
//! string lookup.
//!
//! All validation happens on mutation. A dangling bus name fails with
//! [`LopfError::Reference`], a series of the wrong length with
//! [`LopfError::Shape`], and out-of-range capacities or demands with
//! [`LopfError::Bounds`]. A network that was assembled without error is
//! structurally valid for optimization.
//!
//! ## Quick Start
//!
//! ```
//! use chrono::NaiveDate;
//! use lopf_core::{Capacity, Network, SnapshotIndex};
//!
//! let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
//! let snapshots = SnapshotIndex::hourly(start, 24).unwrap();
//! let mut network = Network::new(snapshots);
//!
//! network.add_bus("Central_Bus", "AC").unwrap();
//! network
//!     .add_generator("Coal Plant", "Central_Bus", Capacity::fixed(200.0), 80.0)
//!     .unwrap();
//! let demand = network.flat_series(180.0);
//! network.add_load("Demand", "Central_Bus", demand).unwrap();
//!
//! assert_eq!(network.stats().generators, 1);
//! ```
//!
//! ## Modules
//!
//! - [`snapshots`] - snapshot index, frequency strings, daily means
//! - [`diagnostics`] - advisory findings reported by [`Network::validate_into`]
//! - [`graph_utils`] - bus graph and island detection
//! - [`costs`] - annuity factors for capital costs
//! - [`units`] - `Megawatts` / `MegawattHours`

use serde::{Deserialize, Serialize};

pub mod costs;
pub mod diagnostics;
pub mod error;
pub mod graph_utils;
mod network;
pub mod snapshots;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{EntityKind, LopfError, LopfResult};
pub use network::{Network, NetworkStats};
pub use snapshots::SnapshotIndex;
pub use units::{MegawattHours, Megawatts};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub fn new(value: usize) -> Self {
                Self(value)
            }

            #[inline]
            pub fn value(&self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(BusId);
arena_id!(GeneratorId);
arena_id!(LineId);
arena_id!(LoadId);

/// How the size of a generator or line is determined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Capacity {
    /// Installed capacity is given.
    Fixed { nominal: Megawatts },
    /// Installed capacity is a decision variable in `[min, max]`, charged
    /// `capital_cost` per MW built. `max` may be infinite.
    Extendable {
        min: Megawatts,
        max: Megawatts,
        capital_cost: f64,
    },
}

impl Capacity {
    pub fn fixed(nominal: f64) -> Self {
        Capacity::Fixed {
            nominal: Megawatts(nominal),
        }
    }

    pub fn extendable(min: f64, max: f64, capital_cost: f64) -> Self {
        Capacity::Extendable {
            min: Megawatts(min),
            max: Megawatts(max),
            capital_cost,
        }
    }

    /// Extendable from zero with no upper limit.
    pub fn unbounded(capital_cost: f64) -> Self {
        Self::extendable(0.0, f64::INFINITY, capital_cost)
    }

    pub fn is_extendable(&self) -> bool {
        matches!(self, Capacity::Extendable { .. })
    }

    /// Nominal capacity, or the largest capacity the optimizer may build.
    pub fn upper_limit(&self) -> Megawatts {
        match *self {
            Capacity::Fixed { nominal } => nominal,
            Capacity::Extendable { max, .. } => max,
        }
    }

    pub fn capital_cost(&self) -> f64 {
        match *self {
            Capacity::Fixed { .. } => 0.0,
            Capacity::Extendable { capital_cost, .. } => capital_cost,
        }
    }

    pub(crate) fn check(&self, kind: EntityKind, name: &str) -> LopfResult<()> {
        match *self {
            Capacity::Fixed { nominal } => {
                if !(nominal.value() >= 0.0 && nominal.is_finite()) {
                    return Err(LopfError::bounds(
                        kind,
                        name,
                        format!("nominal capacity must be finite and non-negative, got {}", nominal.value()),
                    ));
                }
            }
            Capacity::Extendable {
                min,
                max,
                capital_cost,
            } => {
                if !(min.value() >= 0.0 && min.is_finite()) {
                    return Err(LopfError::bounds(
                        kind,
                        name,
                        format!("minimum capacity must be finite and non-negative, got {}", min.value()),
                    ));
                }
                if max.value().is_nan() || max < min {
                    return Err(LopfError::bounds(
                        kind,
                        name,
                        format!(
                            "minimum capacity {} exceeds maximum capacity {}",
                            min.value(),
                            max.value()
                        ),
                    ));
                }
                if !capital_cost.is_finite() {
                    return Err(LopfError::bounds(kind, name, "capital cost must be finite"));
                }
            }
        }
        Ok(())
    }
}

/// A node where power balance is enforced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    pub carrier: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generator {
    pub id: GeneratorId,
    pub name: String,
    pub bus: BusId,
    /// Technology tag such as `coal` or `solar`, used to aggregate results.
    pub carrier: Option<String>,
    pub capacity: Capacity,
    /// Cost per MWh dispatched.
    pub marginal_cost: f64,
    /// Availability per snapshot as a fraction of capacity, each in [0, 1].
    pub p_max_pu: Vec<f64>,
    /// Emitted mass per MWh. Absent means the generator does not emit.
    pub emission_factor: Option<f64>,
}

impl Generator {
    pub fn is_extendable(&self) -> bool {
        self.capacity.is_extendable()
    }

    /// Upper bound on output at snapshot `t` given the largest allowed capacity.
    pub fn max_output(&self, t: usize) -> Megawatts {
        let p_max_pu = self.p_max_pu[t];
        if p_max_pu == 0.0 {
            return Megawatts::ZERO;
        }
        self.capacity.upper_limit() * p_max_pu
    }

    pub fn emission_factor_or_zero(&self) -> f64 {
        self.emission_factor.unwrap_or(0.0)
    }
}

/// A transmission link. Positive flow runs from `bus0` to `bus1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub id: LineId,
    pub name: String,
    pub bus0: BusId,
    pub bus1: BusId,
    pub reactance: f64,
    pub resistance: f64,
    /// Thermal limit `s_nom`, fixed or extendable.
    pub capacity: Capacity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Load {
    pub id: LoadId,
    pub name: String,
    pub bus: BusId,
    /// Demand per snapshot in MW.
    pub p_set: Vec<f64>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = GeneratorId::new(7);
        assert_eq!(id.value(), 7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }

    #[test]
    fn test_capacity_upper_limit() {
        assert_eq!(Capacity::fixed(200.0).upper_limit(), Megawatts(200.0));
        assert_eq!(
            Capacity::extendable(150.0, 150.0, 700.0).upper_limit(),
            Megawatts(150.0)
        );
        assert!(!Capacity::unbounded(600.0).upper_limit().is_finite());
        assert_eq!(Capacity::fixed(10.0).capital_cost(), 0.0);
    }

    #[test]
    fn test_capacity_check_rejects_inverted_bounds() {
        let err = Capacity::extendable(100.0, 50.0, 1.0)
            .check(EntityKind::Generator, "Wind")
            .unwrap_err();
        assert!(matches!(err, LopfError::Bounds { .. }));
        assert!(err.to_string().contains("exceeds maximum"));
    }

    #[test]
    fn test_capacity_check_rejects_negative() {
        assert!(Capacity::fixed(-1.0)
            .check(EntityKind::Line, "l")
            .is_err());
        assert!(Capacity::extendable(-5.0, 10.0, 1.0)
            .check(EntityKind::Generator, "g")
            .is_err());
        assert!(Capacity::unbounded(600.0)
            .check(EntityKind::Generator, "g")
            .is_ok());
    }

    #[test]
    fn test_capacity_serializes_with_mode_tag() {
        let json = serde_json::to_value(Capacity::fixed(200.0)).unwrap();
        assert_eq!(json["mode"], "fixed");
        assert_eq!(json["nominal"], 200.0);
    }
}
