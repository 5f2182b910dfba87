//! Fixed-point time arithmetic.
//!
//! All timing in the engine is expressed in [`Ticks`]: signed 100 ns units.
//! Integer ticks keep nested parent/child conversions exact; floating point
//! only enters when a speed ratio or repeat count scales a span.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A point or span on a timeline, in 100 ns units.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Ticks(pub i64);

impl Ticks {
    pub const ZERO: Ticks = Ticks(0);
    pub const PER_MILLISECOND: i64 = 10_000;
    pub const PER_SECOND: i64 = 10_000_000;

    pub const fn new(ticks: i64) -> Self {
        Self(ticks)
    }

    pub const fn from_millis(ms: i64) -> Self {
        Self(ms * Self::PER_MILLISECOND)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * Self::PER_SECOND)
    }

    /// Convert fractional seconds, rounding to the nearest tick.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs * Self::PER_SECOND as f64).round() as i64)
    }

    /// Convert fractional milliseconds, rounding to the nearest tick.
    pub fn from_millis_f64(ms: f64) -> Self {
        Self((ms * Self::PER_MILLISECOND as f64).round() as i64)
    }

    /// Convert a std duration, saturating at `i64::MAX` ticks.
    pub fn from_std(d: std::time::Duration) -> Self {
        let ticks = d.as_nanos() / 100;
        Self(i64::try_from(ticks).unwrap_or(i64::MAX))
    }

    /// Convert to a std duration; negative spans clamp to zero.
    pub fn to_std(self) -> std::time::Duration {
        std::time::Duration::from_nanos(self.0.max(0) as u64 * 100)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / Self::PER_SECOND as f64
    }

    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / Self::PER_MILLISECOND as f64
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Multiply by a real factor, rounding to the nearest tick.
    ///
    /// A factor of exactly 1.0 is passed through untouched so unscaled
    /// clocks never pick up rounding.
    pub fn scale(self, factor: f64) -> Self {
        if factor == 1.0 {
            self
        } else {
            Self((self.0 as f64 * factor).round() as i64)
        }
    }

    /// Divide by a real factor, rounding to the nearest tick.
    pub fn unscale(self, factor: f64) -> Self {
        if factor == 1.0 {
            self
        } else {
            Self((self.0 as f64 / factor).round() as i64)
        }
    }

    pub fn saturating_add(self, rhs: Ticks) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Add for Ticks {
    type Output = Ticks;
    fn add(self, rhs: Ticks) -> Ticks {
        Ticks(self.0 + rhs.0)
    }
}

impl Sub for Ticks {
    type Output = Ticks;
    fn sub(self, rhs: Ticks) -> Ticks {
        Ticks(self.0 - rhs.0)
    }
}

impl AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Ticks) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Ticks {
    fn sub_assign(&mut self, rhs: Ticks) {
        self.0 -= rhs.0;
    }
}

impl Neg for Ticks {
    type Output = Ticks;
    fn neg(self) -> Ticks {
        Ticks(-self.0)
    }
}

impl Mul<i64> for Ticks {
    type Output = Ticks;
    fn mul(self, rhs: i64) -> Ticks {
        Ticks(self.0 * rhs)
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}ms", self.as_millis_f64())
    }
}
