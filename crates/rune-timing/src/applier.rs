//! Deferred property writes.
//!
//! Writes produced while walking the clock tree are buffered here and applied
//! once, after the whole tree has been updated and its events raised. One
//! entry is kept per `(target, property)`: later writes replace earlier ones
//! at the same precedence, and a reset is never replaced by an animation
//! write from the same tick.

use std::collections::HashMap;

use crate::error::WriteError;
use crate::target::PropertyStore;
use crate::types::{AnimatableValue, AnimationTarget};

/// Ordering class of a buffered write. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// Value produced by a running animation.
    Animation,
    /// Restores a property when its animation stops.
    AnimationReset,
}

/// A buffered write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyChange {
    pub target: AnimationTarget,
    pub value: AnimatableValue,
    pub precedence: Precedence,
}

/// A write the property store refused.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteFailure {
    pub change: PropertyChange,
    pub error: WriteError,
}

#[derive(Debug, Default)]
pub struct Applier {
    changes: Vec<PropertyChange>,
    index: HashMap<AnimationTarget, usize>,
}

impl Applier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_property_change(
        &mut self,
        target: AnimationTarget,
        value: AnimatableValue,
        precedence: Precedence,
    ) {
        let change = PropertyChange {
            target,
            value,
            precedence,
        };
        match self.index.get(&target) {
            Some(&slot) => {
                let existing = &mut self.changes[slot];
                if precedence >= existing.precedence {
                    *existing = change;
                }
            }
            None => {
                self.index.insert(target, self.changes.len());
                self.changes.push(change);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Buffered writes in first-insertion order.
    pub fn changes(&self) -> &[PropertyChange] {
        &self.changes
    }

    /// Perform every buffered write. A failed write does not stop the rest.
    pub fn apply(&self, store: &mut dyn PropertyStore) -> Vec<WriteFailure> {
        let mut failures = Vec::new();
        for change in &self.changes {
            let AnimationTarget { target, property } = change.target;
            if let Err(error) = store.write_value(target, property, change.value) {
                tracing::warn!(?target, ?property, %error, "property write failed");
                failures.push(WriteFailure {
                    change: *change,
                    error,
                });
            }
        }
        failures
    }

    pub fn flush(&mut self) {
        self.changes.clear();
        self.index.clear();
    }
}
