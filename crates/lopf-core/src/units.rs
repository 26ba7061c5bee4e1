//! Unit newtypes for capacities and energy totals.
//!
//! Capacities are stored as [`Megawatts`]; summing a dispatch series over
//! hourly snapshots gives [`MegawattHours`]. Both are `#[repr(transparent)]`
//! wrappers around `f64`, so they cost nothing at runtime.
//!
//! ```
//! use lopf_core::units::{MegawattHours, Megawatts};
//!
//! let coal = Megawatts::new(200.0);
//! let gas = Megawatts::new(150.0);
//! assert_eq!((coal + gas).value(), 350.0);
//! assert_eq!(MegawattHours::new(10.0).to_string(), "10.0000 MWh");
//! ```

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

macro_rules! unit_newtype {
    ($(#[$meta:meta])* $name:ident, $symbol:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(pub f64);

        impl $name {
            pub const ZERO: Self = Self(0.0);
            pub const INFINITY: Self = Self(f64::INFINITY);

            #[inline]
            pub const fn new(value: f64) -> Self {
                Self(value)
            }

            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $name {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $name {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self {
                Self(self.0 * rhs)
            }
        }

        impl Div<$name> for $name {
            type Output = f64;
            fn div(self, rhs: $name) -> f64 {
                self.0 / rhs.0
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|v| v.0).sum())
            }
        }

        impl From<f64> for $name {
            fn from(value: f64) -> Self {
                Self(value)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:.4} {}", self.0, $symbol)
            }
        }
    };
}

unit_newtype!(
    /// Power or installed capacity.
    Megawatts,
    "MW"
);

unit_newtype!(
    /// Energy delivered over one or more snapshots.
    MegawattHours,
    "MWh"
);

impl Megawatts {
    /// Energy produced when this power is held for `hours`.
    #[inline]
    pub fn over_hours(self, hours: f64) -> MegawattHours {
        MegawattHours(self.0 * hours)
    }
}
