//! Property store boundary.
//!
//! The engine never owns animated objects. It reads a property once when a
//! storage is hooked up and writes values through the [`Applier`] after each
//! tick. Anything that can answer these three calls can be animated.
//!
//! [`Applier`]: crate::applier::Applier

use std::collections::HashMap;

use crate::error::{Result, TimingError, WriteError};
use crate::types::{AnimatableValue, AnimationTarget, PropertyId, TargetId, ValueKind};

/// Typed property storage on animated objects.
pub trait PropertyStore {
    /// Declared kind of `property` on `target`.
    fn value_kind(&self, target: TargetId, property: PropertyId) -> Result<ValueKind>;

    /// Current value of `property` on `target`.
    fn read_value(&self, target: TargetId, property: PropertyId) -> Result<AnimatableValue>;

    fn write_value(
        &mut self,
        target: TargetId,
        property: PropertyId,
        value: AnimatableValue,
    ) -> std::result::Result<(), WriteError>;
}

/// In-memory [`PropertyStore`] that records every successful write.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    targets: HashMap<TargetId, HashMap<PropertyId, AnimatableValue>>,
    writes: Vec<(AnimationTarget, AnimatableValue)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a property with its initial value. The value's kind becomes
    /// the property's kind.
    pub fn register(&mut self, target: TargetId, property: PropertyId, value: impl Into<AnimatableValue>) {
        self.targets
            .entry(target)
            .or_default()
            .insert(property, value.into());
    }

    /// Drop a target and all of its properties.
    pub fn destroy(&mut self, target: TargetId) -> bool {
        self.targets.remove(&target).is_some()
    }

    pub fn contains(&self, target: TargetId) -> bool {
        self.targets.contains_key(&target)
    }

    pub fn value(&self, target: TargetId, property: PropertyId) -> Option<AnimatableValue> {
        self.targets.get(&target)?.get(&property).copied()
    }

    /// Writes applied so far, oldest first.
    pub fn writes(&self) -> &[(AnimationTarget, AnimatableValue)] {
        &self.writes
    }

    /// Values written to one property, oldest first.
    pub fn writes_to(&self, target: AnimationTarget) -> Vec<AnimatableValue> {
        self.writes
            .iter()
            .filter(|(t, _)| *t == target)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl PropertyStore for MemoryStore {
    fn value_kind(&self, target: TargetId, property: PropertyId) -> Result<ValueKind> {
        self.read_value(target, property).map(|v| v.kind())
    }

    fn read_value(&self, target: TargetId, property: PropertyId) -> Result<AnimatableValue> {
        let properties = self
            .targets
            .get(&target)
            .ok_or(TimingError::UnknownTarget(target))?;
        properties
            .get(&property)
            .copied()
            .ok_or(TimingError::UnknownProperty { target, property })
    }

    fn write_value(
        &mut self,
        target: TargetId,
        property: PropertyId,
        value: AnimatableValue,
    ) -> std::result::Result<(), WriteError> {
        let properties = self
            .targets
            .get_mut(&target)
            .ok_or(WriteError::TargetGone(target))?;
        let slot = properties
            .get_mut(&property)
            .ok_or(WriteError::NoSuchProperty { target, property })?;
        if slot.kind() != value.kind() {
            return Err(WriteError::Rejected {
                expected: slot.kind(),
                found: value.kind(),
            });
        }
        *slot = value;
        self.writes.push((AnimationTarget::new(target, property), value));
        Ok(())
    }
}
