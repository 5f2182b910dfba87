//! Animation storages: the binding between an animation clock and the one
//! property it drives.
//!
//! At most one storage is *current* for a `(target, property)` pair. Hooking
//! up a new storage chains from the current one: the newcomer inherits the
//! value to restore on stop, and the old storage becomes non-resetable and
//! stops driving the property.
//!
//! A storage whose clock is removed while it is still current *floats*: it
//! no longer writes or resets, and only stays around to hand its stop value
//! to whichever storage binds the property next.

use slotmap::SlotMap;
use std::collections::HashMap;

use crate::animation::Animation;
use crate::applier::{Applier, Precedence};
use crate::clock_tree::ClockTree;
use crate::error::{Result, TimingError};
use crate::target::PropertyStore;
use crate::types::{AnimatableValue, AnimationTarget, ClockId, StorageId, TargetId};

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationStorage {
    clock: Option<ClockId>,
    target: AnimationTarget,
    base_value: AnimatableValue,
    stop_value: AnimatableValue,
    is_floating: bool,
    is_non_resetable: bool,
    detached: bool,
    driving: bool,
}

impl AnimationStorage {
    /// Animation clock driving this storage. `None` once floating.
    pub fn clock(&self) -> Option<ClockId> {
        self.clock
    }

    pub fn target(&self) -> AnimationTarget {
        self.target
    }

    /// Property value captured at hookup.
    pub fn base_value(&self) -> AnimatableValue {
        self.base_value
    }

    /// Value written back when the clock stops.
    pub fn stop_value(&self) -> AnimatableValue {
        self.stop_value
    }

    pub fn is_floating(&self) -> bool {
        self.is_floating
    }

    pub fn is_non_resetable(&self) -> bool {
        self.is_non_resetable
    }

    /// No longer driven, either superseded or its target destroyed.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Wrote an animation value since it last reset.
    pub fn is_driving(&self) -> bool {
        self.driving
    }
}

/// All live storages plus the current one per property.
#[derive(Debug, Default)]
pub struct StorageRegistry {
    storages: SlotMap<StorageId, AnimationStorage>,
    /// Hookup order; storages are updated in this order every tick.
    order: Vec<StorageId>,
    current: HashMap<AnimationTarget, StorageId>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: StorageId) -> Option<&AnimationStorage> {
        self.storages.get(id)
    }

    pub fn len(&self) -> usize {
        self.storages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }

    /// Current storage for a property.
    pub fn current(&self, target: AnimationTarget) -> Option<StorageId> {
        self.current.get(&target).copied()
    }

    pub fn storages_for_clock(&self, clock: ClockId) -> Vec<StorageId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.storages.get(*id).is_some_and(|s| s.clock == Some(clock)))
            .collect()
    }

    /// Bind `clock` to `target`.
    ///
    /// The property must exist and hold the animation's value kind. The base
    /// value is read from the store now.
    pub fn hookup(
        &mut self,
        clock: ClockId,
        animation: &Animation,
        target: AnimationTarget,
        store: &dyn PropertyStore,
    ) -> Result<StorageId> {
        let property_kind = store.value_kind(target.target, target.property)?;
        let animation_kind = animation.value_kind();
        if property_kind != animation_kind {
            return Err(TimingError::TypeMismatch {
                target: target.target,
                property: target.property,
                property_kind,
                animation_kind,
            });
        }
        let base_value = store.read_value(target.target, target.property)?;

        let mut stop_value = base_value;
        if let Some(prior_id) = self.current.remove(&target) {
            if let Some(prior) = self.storages.get_mut(prior_id) {
                stop_value = prior.stop_value;
                prior.is_non_resetable = true;
                prior.detached = true;
                prior.driving = false;
                let floating = prior.is_floating;
                tracing::debug!(?target, ?prior_id, floating, "storage superseded");
                if floating {
                    self.discard(prior_id);
                }
            }
        }

        let id = self.storages.insert(AnimationStorage {
            clock: Some(clock),
            target,
            base_value,
            stop_value,
            is_floating: false,
            is_non_resetable: false,
            detached: false,
            driving: false,
        });
        self.order.push(id);
        self.current.insert(target, id);
        Ok(id)
    }

    /// Override the value restored on stop.
    pub fn set_stop_value(&mut self, id: StorageId, value: AnimatableValue) -> Result<()> {
        let storage = self
            .storages
            .get_mut(id)
            .ok_or(TimingError::UnknownStorage(id))?;
        if storage.base_value.kind() != value.kind() {
            return Err(TimingError::TypeMismatch {
                target: storage.target.target,
                property: storage.target.property,
                property_kind: storage.base_value.kind(),
                animation_kind: value.kind(),
            });
        }
        storage.stop_value = value;
        Ok(())
    }

    /// Queue this tick's writes: a value for each storage whose clock is
    /// running, a reset for each storage whose clock just stopped.
    pub fn update(&mut self, tree: &ClockTree, applier: &mut Applier) {
        for id in &self.order {
            let Some(storage) = self.storages.get_mut(*id) else {
                continue;
            };
            if storage.detached {
                continue;
            }
            let Some(node) = storage.clock.and_then(|c| tree.get(c)) else {
                continue;
            };
            let clock = node.clock();
            let Some(animation) = clock.timeline().as_animation() else {
                continue;
            };

            if clock.state().is_running() {
                if !clock.has_started() {
                    continue;
                }
                let duration = clock
                    .timing()
                    .and_then(|t| t.duration)
                    .unwrap_or_else(|| animation.natural_duration());
                let value = animation.current_value(
                    &storage.base_value,
                    clock.progress(),
                    duration,
                    node.key_times(),
                );
                applier.add_property_change(storage.target, value, Precedence::Animation);
                storage.driving = true;
            } else if storage.driving {
                storage.driving = false;
                if !storage.is_non_resetable {
                    applier.add_property_change(
                        storage.target,
                        storage.stop_value,
                        Precedence::AnimationReset,
                    );
                    tracing::trace!(target = ?storage.target, "animation storage reset");
                }
            }
        }
    }

    /// Detach and drop every storage bound to `target`.
    pub fn target_destroyed(&mut self, target: TargetId) -> usize {
        let doomed: Vec<StorageId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.storages.get(*id).is_some_and(|s| s.target.target == target))
            .collect();
        for id in &doomed {
            self.discard(*id);
        }
        if !doomed.is_empty() {
            tracing::debug!(?target, count = doomed.len(), "target destroyed, storages detached");
        }
        doomed.len()
    }

    /// Forget removed clocks. Current storages float; the rest are dropped.
    pub fn clocks_removed(&mut self, clocks: &[ClockId]) {
        let affected: Vec<StorageId> = self
            .order
            .iter()
            .copied()
            .filter(|id| {
                self.storages
                    .get(*id)
                    .and_then(|s| s.clock)
                    .is_some_and(|c| clocks.contains(&c))
            })
            .collect();
        for id in affected {
            let Some(storage) = self.storages.get_mut(id) else {
                continue;
            };
            if self.current.get(&storage.target) == Some(&id) {
                storage.clock = None;
                storage.is_floating = true;
                storage.driving = false;
                tracing::debug!(target = ?storage.target, "storage floating");
            } else {
                self.discard(id);
            }
        }
    }

    fn discard(&mut self, id: StorageId) {
        if let Some(storage) = self.storages.remove(id) {
            if self.current.get(&storage.target) == Some(&id) {
                self.current.remove(&storage.target);
            }
        }
        self.order.retain(|s| *s != id);
    }
}
