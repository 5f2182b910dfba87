//! Animation descriptors.
//!
//! An [`Animation`] is the leaf payload of a timeline: it declares which
//! `(target, property)` it drives and how to turn clock progress into a
//! value. Two flavours exist, from/to/by and key frames, over the same
//! closed set of value kinds.

use serde::{Deserialize, Serialize};

use crate::easing::EasingFunction;
use crate::error::{Result, TimingError};
use crate::interpolate::{Accumulate, Interpolate};
use crate::keyframes::{KeyFrameAnimation, ResolvedKeyFrame};
use crate::time::Ticks;
use crate::types::{AnimatableValue, AnimationTarget, ValueKind};

/// Default simple duration of an animation with an automatic duration.
pub const DEFAULT_ANIMATION_DURATION: Ticks = Ticks::from_secs(1);

/// Interpolates from a start value to an end value.
///
/// Start is `from`, else the base value. End is `to`, else `start + by`,
/// else the base value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromToAnimation {
    pub kind: ValueKind,
    #[serde(default)]
    pub from: Option<AnimatableValue>,
    #[serde(default)]
    pub to: Option<AnimatableValue>,
    #[serde(default)]
    pub by: Option<AnimatableValue>,
    #[serde(default)]
    pub easing: Option<EasingFunction>,
}

impl FromToAnimation {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            from: None,
            to: None,
            by: None,
            easing: None,
        }
    }

    pub fn from(mut self, value: impl Into<AnimatableValue>) -> Self {
        self.from = Some(value.into());
        self
    }

    pub fn to(mut self, value: impl Into<AnimatableValue>) -> Self {
        self.to = Some(value.into());
        self
    }

    pub fn by(mut self, value: impl Into<AnimatableValue>) -> Self {
        self.by = Some(value.into());
        self
    }

    pub fn easing(mut self, easing: EasingFunction) -> Self {
        self.easing = Some(easing);
        self
    }

    pub fn start_value(&self, base: &AnimatableValue) -> AnimatableValue {
        self.from.unwrap_or(*base)
    }

    pub fn end_value(&self, base: &AnimatableValue) -> AnimatableValue {
        match (self.to, self.by) {
            (Some(to), _) => to,
            (None, Some(by)) => self.start_value(base).accumulate(&by),
            (None, None) => *base,
        }
    }

    /// `interpolate(base, progress, easing)`.
    pub fn value_at(&self, base: &AnimatableValue, progress: f64) -> AnimatableValue {
        let p = match &self.easing {
            Some(easing) => easing.ease(progress),
            None => progress,
        };
        self.start_value(base).interpolate(&self.end_value(base), p)
    }

    fn validate(&self, name: &str) -> Result<()> {
        for value in [self.from, self.to, self.by].into_iter().flatten() {
            if value.kind() != self.kind {
                return Err(TimingError::InconsistentAnimation {
                    name: name.to_string(),
                    expected: self.kind,
                    found: value.kind(),
                });
            }
        }
        Ok(())
    }
}

/// How an animation computes its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationKind {
    FromTo(FromToAnimation),
    KeyFrames(KeyFrameAnimation),
}

/// Leaf timeline payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    /// Property driven when the animation is started as part of a storyboard.
    #[serde(default)]
    pub target: Option<AnimationTarget>,
    pub kind: AnimationKind,
}

impl Animation {
    pub fn from_to(animation: FromToAnimation) -> Self {
        Self {
            target: None,
            kind: AnimationKind::FromTo(animation),
        }
    }

    pub fn key_frames(animation: KeyFrameAnimation) -> Self {
        Self {
            target: None,
            kind: AnimationKind::KeyFrames(animation),
        }
    }

    pub fn with_target(mut self, target: AnimationTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub fn value_kind(&self) -> ValueKind {
        match &self.kind {
            AnimationKind::FromTo(a) => a.kind,
            AnimationKind::KeyFrames(a) => a.kind,
        }
    }

    /// Simple duration used when the timeline's duration is automatic.
    pub fn natural_duration(&self) -> Ticks {
        match &self.kind {
            AnimationKind::FromTo(_) => DEFAULT_ANIMATION_DURATION,
            AnimationKind::KeyFrames(a) => a
                .natural_duration()
                .unwrap_or(DEFAULT_ANIMATION_DURATION),
        }
    }

    /// Resolve key times for a concrete simple duration. Empty for from/to.
    pub fn resolve_key_times(&self, duration: Ticks) -> Vec<ResolvedKeyFrame> {
        match &self.kind {
            AnimationKind::FromTo(_) => Vec::new(),
            AnimationKind::KeyFrames(a) => a.resolve_key_times(duration),
        }
    }

    /// Value for `progress` through a simple duration of `duration`.
    pub fn current_value(
        &self,
        base: &AnimatableValue,
        progress: f64,
        duration: Ticks,
        key_times: &[ResolvedKeyFrame],
    ) -> AnimatableValue {
        match &self.kind {
            AnimationKind::FromTo(a) => a.value_at(base, progress),
            AnimationKind::KeyFrames(a) => a.value_at(base, key_times, duration.scale(progress)),
        }
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        match &self.kind {
            AnimationKind::FromTo(a) => a.validate(name),
            AnimationKind::KeyFrames(a) => a.validate(name),
        }
    }
}
