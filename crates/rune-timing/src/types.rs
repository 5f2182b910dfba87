//! Core value and identifier types.
//!
//! - `AnimatableValue`: the closed set of values an animation can produce
//! - `ValueKind`: the static type of a value or property
//! - `TargetId` / `PropertyId`: opaque handles into the property store
//! - `ClockId` / `StorageId`: arena keys owned by the time manager
//! - `ClockState`: the three-state clock machine

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Handle to a live clock in the clock arena.
    pub struct ClockId;
    /// Handle to an animation storage record.
    pub struct StorageId;
}

/// Opaque handle to an animated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u64);

/// Opaque property key, scoped to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub u32);

/// A `(target, property)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimationTarget {
    pub target: TargetId,
    pub property: PropertyId,
}

impl AnimationTarget {
    pub fn new(target: TargetId, property: PropertyId) -> Self {
        Self { target, property }
    }
}

/// Runtime state of a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockState {
    /// Running and producing progress.
    Active,
    /// Finished, holding its final progress.
    Filling,
    /// Not running. Initial state and the result of `stop`.
    #[default]
    Stopped,
}

impl ClockState {
    /// Single-letter code used by clock tree dumps.
    pub fn letter(self) -> char {
        match self {
            Self::Active => 'A',
            Self::Filling => 'F',
            Self::Stopped => 'S',
        }
    }

    /// Active or Filling.
    pub fn is_running(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

/// RGBA color with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

/// 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Static type of an animatable value or property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Double,
    Color,
    Point,
}

/// A value an animation can produce and a property can store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimatableValue {
    Double { value: f64 },
    Color { color: Color },
    Point { point: Point },
}

impl AnimatableValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Double { .. } => ValueKind::Double,
            Self::Color { .. } => ValueKind::Color,
            Self::Point { .. } => ValueKind::Point,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color { color } => Some(*color),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Self::Point { point } => Some(*point),
            _ => None,
        }
    }

    /// The zero value of a kind, used when a base value is unavailable.
    pub fn zero(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Double => Self::Double { value: 0.0 },
            ValueKind::Color => Self::Color {
                color: Color::TRANSPARENT,
            },
            ValueKind::Point => Self::Point {
                point: Point::default(),
            },
        }
    }
}

impl From<f64> for AnimatableValue {
    fn from(value: f64) -> Self {
        Self::Double { value }
    }
}

impl From<Color> for AnimatableValue {
    fn from(color: Color) -> Self {
        Self::Color { color }
    }
}

impl From<Point> for AnimatableValue {
    fn from(point: Point) -> Self {
        Self::Point { point }
    }
}
