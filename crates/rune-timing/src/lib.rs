//! Hierarchical timing and animation scheduling.
//!
//! Declarative [`Timeline`] trees are instantiated into live clocks owned by
//! a [`TimeManager`]. Each tick advances every clock from its parent's time,
//! raises clock events, and flushes the resulting property writes into a
//! [`PropertyStore`] in one batch.
//!
//! ```
//! use rune_timing::{
//!     Animation, AnimationTarget, FromToAnimation, ManualTickSource, MemoryStore, PropertyId,
//!     TargetId, Ticks, TimeManager, Timeline, ValueKind,
//! };
//!
//! let opacity = AnimationTarget::new(TargetId(1), PropertyId(0));
//! let mut store = MemoryStore::new();
//! store.register(opacity.target, opacity.property, 0.0);
//!
//! let source = ManualTickSource::new();
//! let clock = source.clock();
//! let mut manager = TimeManager::new(Box::new(source));
//!
//! let fade = Timeline::animation(
//!     Animation::from_to(FromToAnimation::new(ValueKind::Double).to(1.0)).with_target(opacity),
//! )
//! .duration_millis(200);
//! manager.begin_storyboard(fade, &store).unwrap();
//!
//! clock.set(Ticks::from_millis(100));
//! manager.tick(&mut store);
//! assert_eq!(store.value(opacity.target, opacity.property).and_then(|v| v.as_f64()), Some(0.5));
//! ```

pub mod animation;
pub mod applier;
pub mod clock;
pub mod clock_tree;
pub mod easing;
pub mod error;
pub mod events;
pub mod interpolate;
pub mod keyframes;
pub mod storage;
pub mod target;
pub mod tick_source;
pub mod time;
pub mod time_manager;
pub mod timeline;
pub mod types;

pub use animation::{Animation, AnimationKind, FromToAnimation};
pub use applier::{Applier, Precedence, PropertyChange, WriteFailure};
pub use clock::Clock;
pub use clock_tree::{ClockKind, ClockTree};
pub use easing::{EasingFunction, KeySpline};
pub use error::{Result, TimingError, WriteError};
pub use events::{CallbackFailure, ClockCommand, ClockEvent, Deferred, EventQueue, HandlerId};
pub use keyframes::{KeyFrame, KeyFrameAnimation, KeyFrameInterpolation, KeyTime};
pub use storage::AnimationStorage;
pub use target::{MemoryStore, PropertyStore};
pub use tick_source::{ManualClock, ManualTickSource, SystemTickSource, TickSource};
pub use time::Ticks;
pub use time_manager::{TickReport, TimeManager};
pub use timeline::{Duration, FillBehavior, RepeatBehavior, Timeline, TimelineKind};
pub use types::{
    AnimatableValue, AnimationTarget, ClockId, ClockState, Color, Point, PropertyId, StorageId,
    TargetId, ValueKind,
};
