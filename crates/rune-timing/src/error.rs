//! Error types for the timing engine.

use thiserror::Error;

use crate::types::{ClockId, PropertyId, StorageId, TargetId, ValueKind};

/// Result type for timing operations.
pub type Result<T> = std::result::Result<T, TimingError>;

/// Errors reported synchronously by construction and binding operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimingError {
    /// Speed ratio must be finite and strictly positive.
    #[error("invalid speed ratio {0}: must be finite and greater than zero")]
    InvalidSpeedRatio(f64),

    /// Begin time is negative.
    #[error("begin time must not be negative (got {0} ticks)")]
    NegativeBeginTime(i64),

    /// A duration span is negative.
    #[error("duration must not be negative (got {0} ticks)")]
    NegativeDuration(i64),

    /// A zero-length duration cannot be delayed by a begin time.
    #[error("zero-length duration cannot have a begin time ({0} ticks)")]
    ZeroDurationWithBeginTime(i64),

    /// Repeat count or repeat duration is malformed.
    #[error("invalid repeat behavior: {0}")]
    InvalidRepeat(String),

    /// Animation values disagree with the animation's declared value kind.
    #[error("animation '{name}' declares {expected:?} values but holds a {found:?} value")]
    InconsistentAnimation {
        name: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// Key frame animation has no frames or a malformed key time.
    #[error("invalid key frames in '{name}': {reason}")]
    InvalidKeyFrames { name: String, reason: String },

    /// Target does not exist in the property store.
    #[error("unknown target {0:?}")]
    UnknownTarget(TargetId),

    /// Target exists but does not expose the property.
    #[error("target {target:?} has no property {property:?}")]
    UnknownProperty {
        target: TargetId,
        property: PropertyId,
    },

    /// Animation value kind does not match the property's declared kind.
    #[error("cannot animate {property:?} on {target:?}: property is {property_kind:?}, animation produces {animation_kind:?}")]
    TypeMismatch {
        target: TargetId,
        property: PropertyId,
        property_kind: ValueKind,
        animation_kind: ValueKind,
    },

    /// An animation timeline has no target to bind against.
    #[error("animation '{0}' has no target")]
    MissingTarget(String),

    /// Clock handle is stale or was never allocated.
    #[error("unknown clock {0:?}")]
    UnknownClock(ClockId),

    /// Storage handle is stale or was never created.
    #[error("unknown animation storage {0:?}")]
    UnknownStorage(StorageId),

    /// Operation requires an animation clock.
    #[error("clock {0:?} is not an animation clock")]
    NotAnAnimationClock(ClockId),

    /// Operation requires a clock group.
    #[error("clock {0:?} is not a clock group")]
    NotAGroup(ClockId),

    /// Clock already has a parent group.
    #[error("clock {0:?} is already attached to a group")]
    AlreadyAttached(ClockId),

    /// The root group cannot be removed or re-parented.
    #[error("operation is not permitted on the root clock")]
    RootClock,
}

/// Failure of a single deferred property write.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriteError {
    /// Target was destroyed before the write was applied.
    #[error("target {0:?} no longer exists")]
    TargetGone(TargetId),

    /// Property is not present on the target.
    #[error("target {target:?} has no property {property:?}")]
    NoSuchProperty {
        target: TargetId,
        property: PropertyId,
    },

    /// Value kind rejected by the property.
    #[error("value of kind {found:?} rejected, property expects {expected:?}")]
    Rejected { expected: ValueKind, found: ValueKind },

    /// Store-specific failure.
    #[error("{0}")]
    Other(String),
}
