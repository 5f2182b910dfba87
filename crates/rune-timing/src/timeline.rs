//! Timeline descriptors.
//!
//! A [`Timeline`] is an immutable schedule template. It is built once,
//! wrapped in an `Arc`, and shared by every clock instantiated from it.
//!
//! ```
//! use rune_timing::{FillBehavior, RepeatBehavior, Ticks, Timeline};
//!
//! let timeline = Timeline::plain()
//!     .named("pulse")
//!     .duration_millis(500)
//!     .auto_reverse(true)
//!     .repeat(RepeatBehavior::Count(3.0))
//!     .fill(FillBehavior::Stop);
//! assert!(timeline.validate().is_ok());
//! assert_eq!(timeline.parent_span(), Some(Ticks::from_millis(3000)));
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::animation::Animation;
use crate::error::{Result, TimingError};
use crate::time::Ticks;

/// Simple duration of one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "ticks", rename_all = "snake_case")]
pub enum Duration {
    /// Derived from the timeline's content.
    #[default]
    Automatic,
    Forever,
    Span(Ticks),
}

impl Duration {
    pub fn millis(ms: i64) -> Self {
        Self::Span(Ticks::from_millis(ms))
    }

    pub fn span(&self) -> Option<Ticks> {
        match self {
            Self::Span(t) => Some(*t),
            _ => None,
        }
    }
}

/// How many times the simple duration plays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RepeatBehavior {
    Forever,
    /// Iteration count; fractional counts stop part-way through an iteration.
    Count(f64),
    /// Total active local time.
    Duration(Ticks),
}

impl Default for RepeatBehavior {
    fn default() -> Self {
        Self::Count(1.0)
    }
}

/// What a clock does once its active period ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillBehavior {
    /// Hold the final progress.
    #[default]
    HoldEnd,
    /// Stop and release animated properties.
    Stop,
}

/// Content of a timeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimelineKind {
    /// Timing only.
    #[default]
    Plain,
    /// Children run concurrently in this timeline's time space.
    Parallel {
        #[serde(default)]
        children: Vec<Arc<Timeline>>,
    },
    /// Drives one property.
    Animation(Animation),
}

/// Immutable schedule template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeline {
    pub name: Option<String>,
    /// Offset of the first iteration in the parent's time space.
    pub begin_time: Ticks,
    pub duration: Duration,
    pub speed_ratio: f64,
    pub auto_reverse: bool,
    pub repeat_behavior: RepeatBehavior,
    pub fill_behavior: FillBehavior,
    pub kind: TimelineKind,
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            name: None,
            begin_time: Ticks::ZERO,
            duration: Duration::Automatic,
            speed_ratio: 1.0,
            auto_reverse: false,
            repeat_behavior: RepeatBehavior::default(),
            fill_behavior: FillBehavior::default(),
            kind: TimelineKind::Plain,
        }
    }
}

impl Timeline {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn parallel() -> Self {
        Self {
            kind: TimelineKind::Parallel {
                children: Vec::new(),
            },
            ..Self::default()
        }
    }

    pub fn animation(animation: Animation) -> Self {
        Self {
            kind: TimelineKind::Animation(animation),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn begin_at(mut self, begin: Ticks) -> Self {
        self.begin_time = begin;
        self
    }

    pub fn begin_millis(self, ms: i64) -> Self {
        self.begin_at(Ticks::from_millis(ms))
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn duration_millis(self, ms: i64) -> Self {
        self.duration(Duration::millis(ms))
    }

    pub fn speed(mut self, ratio: f64) -> Self {
        self.speed_ratio = ratio;
        self
    }

    pub fn auto_reverse(mut self, auto_reverse: bool) -> Self {
        self.auto_reverse = auto_reverse;
        self
    }

    pub fn repeat(mut self, repeat: RepeatBehavior) -> Self {
        self.repeat_behavior = repeat;
        self
    }

    pub fn fill(mut self, fill: FillBehavior) -> Self {
        self.fill_behavior = fill;
        self
    }

    /// Append a child. No effect unless this is a parallel timeline.
    pub fn child(mut self, child: Timeline) -> Self {
        if let TimelineKind::Parallel { children } = &mut self.kind {
            children.push(Arc::new(child));
        }
        self
    }

    pub fn children(&self) -> &[Arc<Timeline>] {
        match &self.kind {
            TimelineKind::Parallel { children } => children,
            _ => &[],
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self.kind, TimelineKind::Parallel { .. })
    }

    pub fn as_animation(&self) -> Option<&Animation> {
        match &self.kind {
            TimelineKind::Animation(a) => Some(a),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Check descriptor invariants, recursing into children.
    pub fn validate(&self) -> Result<()> {
        if !self.speed_ratio.is_finite() || self.speed_ratio <= 0.0 {
            return Err(TimingError::InvalidSpeedRatio(self.speed_ratio));
        }
        if self.begin_time.is_negative() {
            return Err(TimingError::NegativeBeginTime(self.begin_time.get()));
        }
        if let Duration::Span(span) = self.duration {
            if span.is_negative() {
                return Err(TimingError::NegativeDuration(span.get()));
            }
            if span.is_zero() && self.begin_time > Ticks::ZERO {
                return Err(TimingError::ZeroDurationWithBeginTime(self.begin_time.get()));
            }
        }
        match self.repeat_behavior {
            RepeatBehavior::Count(count) if !count.is_finite() || count < 0.0 => {
                return Err(TimingError::InvalidRepeat(format!("count {count}")));
            }
            RepeatBehavior::Duration(d) if d.is_negative() => {
                return Err(TimingError::InvalidRepeat(format!("duration {} ticks", d.get())));
            }
            _ => {}
        }
        match &self.kind {
            TimelineKind::Plain => Ok(()),
            TimelineKind::Parallel { children } => children.iter().try_for_each(|c| c.validate()),
            TimelineKind::Animation(animation) => animation.validate(self.display_name()),
        }
    }

    /// Duration of one iteration after resolving `Automatic` from content.
    ///
    /// Plain timelines have no content, so an automatic duration stays
    /// automatic.
    pub fn natural_duration(&self) -> Duration {
        if self.duration != Duration::Automatic {
            return self.duration;
        }
        match &self.kind {
            TimelineKind::Plain => Duration::Automatic,
            TimelineKind::Animation(animation) => Duration::Span(animation.natural_duration()),
            TimelineKind::Parallel { children } => {
                Self::group_duration(children.iter().map(|c| c.as_ref()))
            }
        }
    }

    /// Natural duration of a group holding `children`.
    ///
    /// The longest child extent wins; any unbounded child makes the group
    /// unbounded; children with unresolved durations are skipped. An empty
    /// group is zero-length.
    pub fn group_duration<'a>(children: impl IntoIterator<Item = &'a Timeline>) -> Duration {
        let mut longest = Ticks::ZERO;
        for child in children {
            match child.extent() {
                Extent::Forever => return Duration::Forever,
                Extent::Unresolved => continue,
                Extent::Span(span) => longest = longest.max(span),
            }
        }
        Duration::Span(longest)
    }

    /// Local time at which all iterations are exhausted for a simple
    /// duration `simple`. `None` means the timeline never ends.
    pub fn fill_time(&self, simple: Ticks) -> Option<Ticks> {
        match self.repeat_behavior {
            RepeatBehavior::Forever => None,
            RepeatBehavior::Duration(d) => Some(d),
            RepeatBehavior::Count(count) => {
                let per_iteration = if self.auto_reverse { simple * 2 } else { simple };
                Some(per_iteration.scale(count))
            }
        }
    }

    /// Time this timeline occupies in its parent's time space, begin time
    /// included. `None` when it never ends or cannot be resolved.
    pub fn parent_span(&self) -> Option<Ticks> {
        match self.extent() {
            Extent::Span(span) => Some(span),
            _ => None,
        }
    }

    fn extent(&self) -> Extent {
        if self.repeat_behavior == RepeatBehavior::Forever {
            return Extent::Forever;
        }
        let local = match (self.repeat_behavior, self.natural_duration()) {
            (RepeatBehavior::Duration(d), _) => d,
            (_, Duration::Forever) => return Extent::Forever,
            (_, Duration::Automatic) => return Extent::Unresolved,
            (_, Duration::Span(simple)) => match self.fill_time(simple) {
                Some(t) => t,
                None => return Extent::Forever,
            },
        };
        Extent::Span(self.begin_time + local.unscale(self.speed_ratio))
    }
}

enum Extent {
    Span(Ticks),
    Forever,
    Unresolved,
}
