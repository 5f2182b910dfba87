//! Easing curves applied to animation progress.
//!
//! [`KeySpline`] is a cubic bezier from `(0,0)` to `(1,1)` with two control
//! points; spline key frames and the named CSS-style curves share its solver.
//!
//! ```
//! use rune_timing::easing::{EasingFunction, KeySpline};
//!
//! let eased = EasingFunction::EaseInOut.ease(0.25);
//! assert!(eased < 0.25);
//!
//! let spline = KeySpline::new(0.0, 0.0, 1.0, 1.0);
//! assert!((spline.progress(0.5) - 0.5).abs() < 1e-6);
//! ```

use serde::{Deserialize, Serialize};

/// Cubic bezier progress curve with fixed end points `(0,0)` and `(1,1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeySpline {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Default for KeySpline {
    /// The linear spline.
    fn default() -> Self {
        Self {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
        }
    }
}

impl KeySpline {
    /// Control point x coordinates are clamped into `[0, 1]` so the curve
    /// stays a function of time.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.clamp(0.0, 1.0),
            y1,
            x2: x2.clamp(0.0, 1.0),
            y2,
        }
    }

    /// Map linear progress to spline progress.
    pub fn progress(&self, linear: f64) -> f64 {
        if linear <= 0.0 {
            return 0.0;
        }
        if linear >= 1.0 {
            return 1.0;
        }
        let t = self.solve_x(linear);
        bezier(self.y1, self.y2, t)
    }

    /// Newton-Raphson on x(t) = target, falling back to bisection when the
    /// derivative flattens out.
    fn solve_x(&self, target: f64) -> f64 {
        let mut t = target;
        for _ in 0..8 {
            let err = bezier(self.x1, self.x2, t) - target;
            if err.abs() < 1e-7 {
                return t;
            }
            let dx = bezier_derivative(self.x1, self.x2, t);
            if dx.abs() < 1e-6 {
                break;
            }
            t = (t - err / dx).clamp(0.0, 1.0);
        }

        let (mut lo, mut hi) = (0.0, 1.0);
        t = target;
        for _ in 0..32 {
            let x = bezier(self.x1, self.x2, t);
            if (x - target).abs() < 1e-7 {
                break;
            }
            if x < target {
                lo = t;
            } else {
                hi = t;
            }
            t = 0.5 * (lo + hi);
        }
        t
    }
}

/// One coordinate of the bezier at parameter `t`:
/// `3(1-t)²t·p1 + 3(1-t)t²·p2 + t³`.
#[inline]
fn bezier(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

#[inline]
fn bezier_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

/// Easing applied to a from/to animation's progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    #[default]
    Linear,
    /// `cubic-bezier(0.25, 0.1, 0.25, 1.0)`
    Ease,
    /// `cubic-bezier(0.42, 0, 1, 1)`
    EaseIn,
    /// `cubic-bezier(0, 0, 0.58, 1)`
    EaseOut,
    /// `cubic-bezier(0.42, 0, 0.58, 1)`
    EaseInOut,
    /// Custom curve.
    Spline { spline: KeySpline },
}

impl EasingFunction {
    /// Map progress in `[0, 1]` to eased progress. Input is clamped.
    pub fn ease(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Ease => KeySpline::new(0.25, 0.1, 0.25, 1.0).progress(t),
            Self::EaseIn => KeySpline::new(0.42, 0.0, 1.0, 1.0).progress(t),
            Self::EaseOut => KeySpline::new(0.0, 0.0, 0.58, 1.0).progress(t),
            Self::EaseInOut => KeySpline::new(0.42, 0.0, 0.58, 1.0).progress(t),
            Self::Spline { spline } => spline.progress(t),
        }
    }

    pub fn spline(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::Spline {
            spline: KeySpline::new(x1, y1, x2, y2),
        }
    }
}
