//! Interpolation for animatable values.
//!
//! `Interpolate` blends two values of the same kind; `Accumulate` adds an
//! offset, which is how `by` animations derive their end value.
//! Colors blend per channel with no color-space conversion.

use crate::types::{AnimatableValue, Color, Point};

/// Types that can be blended between two values.
pub trait Interpolate: Sized {
    /// Blend towards `to`; `t = 0.0` yields `self`, `t = 1.0` yields `to`.
    fn interpolate(&self, to: &Self, t: f64) -> Self;
}

/// Types that support component-wise addition.
pub trait Accumulate: Sized {
    fn accumulate(&self, by: &Self) -> Self;
}

#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp(*self, *to, t)
    }
}

impl Interpolate for Color {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Color {
            r: lerp(self.r, to.r, t),
            g: lerp(self.g, to.g, t),
            b: lerp(self.b, to.b, t),
            a: lerp(self.a, to.a, t),
        }
    }
}

impl Interpolate for Point {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Point {
            x: lerp(self.x, to.x, t),
            y: lerp(self.y, to.y, t),
        }
    }
}

impl Interpolate for AnimatableValue {
    /// Both values must be the same variant; on mismatch `self` is returned.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        match (self, to) {
            (Self::Double { value: a }, Self::Double { value: b }) => Self::Double {
                value: a.interpolate(b, t),
            },
            (Self::Color { color: a }, Self::Color { color: b }) => Self::Color {
                color: a.interpolate(b, t),
            },
            (Self::Point { point: a }, Self::Point { point: b }) => Self::Point {
                point: a.interpolate(b, t),
            },
            _ => *self,
        }
    }
}

impl Accumulate for f64 {
    fn accumulate(&self, by: &Self) -> Self {
        self + by
    }
}

impl Accumulate for Color {
    fn accumulate(&self, by: &Self) -> Self {
        Color {
            r: self.r + by.r,
            g: self.g + by.g,
            b: self.b + by.b,
            a: self.a + by.a,
        }
    }
}

impl Accumulate for Point {
    fn accumulate(&self, by: &Self) -> Self {
        Point {
            x: self.x + by.x,
            y: self.y + by.y,
        }
    }
}

impl Accumulate for AnimatableValue {
    fn accumulate(&self, by: &Self) -> Self {
        match (self, by) {
            (Self::Double { value: a }, Self::Double { value: b }) => Self::Double {
                value: a.accumulate(b),
            },
            (Self::Color { color: a }, Self::Color { color: b }) => Self::Color {
                color: a.accumulate(b),
            },
            (Self::Point { point: a }, Self::Point { point: b }) => Self::Point {
                point: a.accumulate(b),
            },
            _ => *self,
        }
    }
}
