//! Key frame animations.
//!
//! A key frame animation is a list of `(key time, value, interpolation)`
//! entries. Before the first tick the declared key times are resolved
//! against the animation's simple duration into a sorted list of
//! [`ResolvedKeyFrame`]s. Each tick the active segment is the first resolved
//! frame whose time is at or after the current simple time; the segment
//! runs from the previous frame's value (or the base value for the first
//! segment) to that frame's value.
//!
//! # Key time resolution
//!
//! 1. `TimeSpan` key times are used as-is.
//! 2. `Percent` key times are scaled by the simple duration.
//! 3. A trailing `Uniform` or `Paced` frame resolves to the full duration;
//!    a leading `Paced` frame resolves to zero.
//! 4. Each run of still-unresolved frames is spread evenly between its
//!    resolved neighbours (time zero stands in for a missing left neighbour).
//!
//! Interior `Paced` frames would need the distance between values to be
//! known; they currently fall back to the even spread of step 4.

use serde::{Deserialize, Serialize};

use crate::easing::KeySpline;
use crate::error::{Result, TimingError};
use crate::interpolate::Interpolate;
use crate::time::Ticks;
use crate::types::{AnimatableValue, ValueKind};

/// When a key frame is reached.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyTime {
    /// Evenly spaced between resolved neighbours.
    #[default]
    Uniform,
    /// Spaced for constant pace. Only resolved exactly at the ends.
    Paced,
    /// Fraction of the simple duration, in `[0, 1]`.
    Percent { value: f64 },
    /// Absolute offset from the start of the simple duration.
    TimeSpan { time: Ticks },
}

impl KeyTime {
    pub fn percent(value: f64) -> Self {
        Self::Percent { value }
    }

    pub fn time(time: Ticks) -> Self {
        Self::TimeSpan { time }
    }

    pub fn millis(ms: i64) -> Self {
        Self::TimeSpan {
            time: Ticks::from_millis(ms),
        }
    }
}

/// How a segment moves from the previous value to this frame's value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeyFrameInterpolation {
    /// Hold the previous value until the key time, then jump.
    Discrete,
    #[default]
    Linear,
    /// Progress shaped by a key spline.
    Spline { spline: KeySpline },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFrame {
    #[serde(default)]
    pub key_time: KeyTime,
    pub value: AnimatableValue,
    #[serde(default)]
    pub interpolation: KeyFrameInterpolation,
}

impl KeyFrame {
    pub fn discrete(key_time: KeyTime, value: impl Into<AnimatableValue>) -> Self {
        Self {
            key_time,
            value: value.into(),
            interpolation: KeyFrameInterpolation::Discrete,
        }
    }

    pub fn linear(key_time: KeyTime, value: impl Into<AnimatableValue>) -> Self {
        Self {
            key_time,
            value: value.into(),
            interpolation: KeyFrameInterpolation::Linear,
        }
    }

    pub fn spline(key_time: KeyTime, value: impl Into<AnimatableValue>, spline: KeySpline) -> Self {
        Self {
            key_time,
            value: value.into(),
            interpolation: KeyFrameInterpolation::Spline { spline },
        }
    }

    /// Value of the segment ending at this frame, at segment progress `p`.
    pub fn interpolate_from(&self, from: &AnimatableValue, p: f64) -> AnimatableValue {
        match self.interpolation {
            KeyFrameInterpolation::Discrete => {
                if p >= 1.0 {
                    self.value
                } else {
                    *from
                }
            }
            KeyFrameInterpolation::Linear => from.interpolate(&self.value, p),
            KeyFrameInterpolation::Spline { spline } => {
                from.interpolate(&self.value, spline.progress(p))
            }
        }
    }
}

/// A frame with its key time resolved against a concrete duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedKeyFrame {
    pub time: Ticks,
    /// Index into the declared frame list.
    pub index: usize,
}

/// Animation driven by a list of key frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFrameAnimation {
    pub kind: ValueKind,
    #[serde(default)]
    pub frames: Vec<KeyFrame>,
}

impl KeyFrameAnimation {
    pub fn new(kind: ValueKind) -> Self {
        Self {
            kind,
            frames: Vec::new(),
        }
    }

    pub fn frame(mut self, frame: KeyFrame) -> Self {
        self.frames.push(frame);
        self
    }

    /// Largest absolute key time, if any frame declares one.
    pub fn natural_duration(&self) -> Option<Ticks> {
        self.frames
            .iter()
            .filter_map(|f| match f.key_time {
                KeyTime::TimeSpan { time } => Some(time),
                _ => None,
            })
            .filter(|t| *t > Ticks::ZERO)
            .max()
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        for frame in &self.frames {
            let found = frame.value.kind();
            if found != self.kind {
                return Err(TimingError::InconsistentAnimation {
                    name: name.to_string(),
                    expected: self.kind,
                    found,
                });
            }
            match frame.key_time {
                KeyTime::Percent { value } if !(0.0..=1.0).contains(&value) => {
                    return Err(TimingError::InvalidKeyFrames {
                        name: name.to_string(),
                        reason: format!("percent key time {value} outside [0, 1]"),
                    });
                }
                KeyTime::TimeSpan { time } if time.is_negative() => {
                    return Err(TimingError::InvalidKeyFrames {
                        name: name.to_string(),
                        reason: format!("negative key time {}", time.get()),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Resolve every key time against `duration` and sort by time.
    ///
    /// The sort is stable, so frames resolving to the same time keep their
    /// declared order and the earliest declared frame wins the scan.
    pub fn resolve_key_times(&self, duration: Ticks) -> Vec<ResolvedKeyFrame> {
        let n = self.frames.len();
        let mut times: Vec<Option<Ticks>> = self
            .frames
            .iter()
            .map(|f| match f.key_time {
                KeyTime::TimeSpan { time } => Some(time),
                KeyTime::Percent { value } => Some(duration.scale(value)),
                KeyTime::Uniform | KeyTime::Paced => None,
            })
            .collect();

        if n == 0 {
            return Vec::new();
        }

        if times[n - 1].is_none() {
            times[n - 1] = Some(duration);
        }
        if n > 1 && times[0].is_none() && self.frames[0].key_time == KeyTime::Paced {
            times[0] = Some(Ticks::ZERO);
        }

        let mut i = 0;
        while i < n {
            if times[i].is_some() {
                i += 1;
                continue;
            }
            let run_start = i;
            while i < n && times[i].is_none() {
                i += 1;
            }
            // times[n - 1] is always resolved, so the run has a right neighbour.
            let right = times.get(i).copied().flatten().unwrap_or(duration);
            let left = if run_start == 0 {
                Ticks::ZERO
            } else {
                times[run_start - 1].unwrap_or(Ticks::ZERO)
            };
            let slots = (i - run_start + 1) as i64;
            let span = right - left;
            for (step, slot) in (run_start..i).enumerate() {
                if self.frames[slot].key_time == KeyTime::Paced {
                    tracing::warn!(
                        frame = slot,
                        "interior paced key time resolved with uniform spacing"
                    );
                }
                let offset = Ticks((span.get() * (step as i64 + 1)) / slots);
                times[slot] = Some(left + offset);
            }
        }

        let mut resolved: Vec<ResolvedKeyFrame> = times
            .into_iter()
            .enumerate()
            .map(|(index, time)| ResolvedKeyFrame {
                time: time.unwrap_or(duration),
                index,
            })
            .collect();
        resolved.sort_by_key(|r| r.time);
        resolved
    }

    /// Value at simple time `time`, given the resolved frame list.
    ///
    /// Past the last frame the last frame's value is held. With no frames
    /// the base value passes through.
    pub fn value_at(
        &self,
        base: &AnimatableValue,
        resolved: &[ResolvedKeyFrame],
        time: Ticks,
    ) -> AnimatableValue {
        let Some(pos) = resolved.iter().position(|r| r.time >= time) else {
            return resolved
                .last()
                .and_then(|r| self.frames.get(r.index))
                .map(|f| f.value)
                .unwrap_or(*base);
        };

        let current = &resolved[pos];
        let Some(frame) = self.frames.get(current.index) else {
            return *base;
        };

        let (from, start) = if pos == 0 {
            (*base, Ticks::ZERO)
        } else {
            let prev = &resolved[pos - 1];
            let value = self.frames.get(prev.index).map(|f| f.value).unwrap_or(*base);
            (value, prev.time)
        };

        let span = current.time - start;
        let p = if span.get() <= 0 {
            1.0
        } else {
            ((time - start).get() as f64 / span.get() as f64).clamp(0.0, 1.0)
        };
        frame.interpolate_from(&from, p)
    }
}
