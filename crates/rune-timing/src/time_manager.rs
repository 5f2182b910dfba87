//! Per-tick orchestration.
//!
//! The [`TimeManager`] owns the clock tree, the animation storages, the
//! applier and the tick source, and runs the tick pipeline:
//!
//! 1. one-shot tick calls
//! 2. update every clock from the root down
//! 3. queue property writes from animation storages
//! 4. raise time and state events, children first
//! 5. apply and flush property writes
//! 6. raise completion events and restart dispatcher timers
//! 7. apply commands that handlers deferred during the tick
//!
//! Nothing inside a tick re-enters an earlier step. Work started by a
//! handler participates from the next tick on.

use static_assertions::assert_impl_all;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use rune_config::RuneConfig;

use crate::applier::{Applier, WriteFailure};
use crate::clock::Clock;
use crate::clock_tree::{ClockKind, ClockTree};
use crate::error::{Result, TimingError};
use crate::events::{
    CallbackFailure, ClockCommand, ClockEvent, Deferred, EventQueue, HandlerId, HandlerRegistry,
    panic_message,
};
use crate::storage::{AnimationStorage, StorageRegistry};
use crate::target::PropertyStore;
use crate::tick_source::TickSource;
use crate::time::Ticks;
use crate::timeline::{Duration, Timeline};
use crate::types::{AnimatableValue, AnimationTarget, ClockId, StorageId, TargetId};

assert_impl_all!(Timeline: Send, Sync);
assert_impl_all!(ClockEvent: Send, Sync, Clone);
assert_impl_all!(Ticks: Send, Sync, Copy);

type TickCall = Box<dyn FnOnce(&mut Deferred)>;

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Absolute time the tick ran at.
    pub time: Ticks,
    /// Events raised during the tick.
    pub events_raised: usize,
    /// Property writes the store refused.
    pub write_failures: Vec<WriteFailure>,
    /// Handlers and tick calls that panicked.
    pub callback_failures: Vec<CallbackFailure>,
}

/// Owner of the live timing tree.
pub struct TimeManager {
    source: Box<dyn TickSource>,
    tree: ClockTree,
    storages: StorageRegistry,
    applier: Applier,
    events: EventQueue,
    handlers: HandlerRegistry,
    deferred: Deferred,
    tick_calls: Vec<TickCall>,
    /// Dispatcher timers and the number of intervals each has completed.
    timers: HashMap<ClockId, u64>,
    max_refresh_rate: u32,
    current_time: Ticks,
    tick_count: u64,
}

impl std::fmt::Debug for TimeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeManager")
            .field("clocks", &self.tree.len())
            .field("storages", &self.storages.len())
            .field("timers", &self.timers.len())
            .field("max_refresh_rate", &self.max_refresh_rate)
            .field("current_time", &self.current_time)
            .field("tick_count", &self.tick_count)
            .finish()
    }
}

impl TimeManager {
    /// Default maximum ticks per second.
    pub const DEFAULT_REFRESH_RATE: u32 = rune_config::MAX_FPS;

    pub fn new(source: Box<dyn TickSource>) -> Self {
        let now = source.now();
        let mut tree = ClockTree::new();
        tree.begin_root(now);
        let mut manager = Self {
            source,
            tree,
            storages: StorageRegistry::new(),
            applier: Applier::new(),
            events: EventQueue::new(),
            handlers: HandlerRegistry::default(),
            deferred: Deferred::new(),
            tick_calls: Vec::new(),
            timers: HashMap::new(),
            max_refresh_rate: Self::DEFAULT_REFRESH_RATE,
            current_time: now,
            tick_count: 0,
        };
        manager.set_maximum_refresh_rate(Self::DEFAULT_REFRESH_RATE);
        manager
    }

    /// Build a manager using the `[timing]` section of `config`.
    pub fn from_config(config: &RuneConfig, source: Box<dyn TickSource>) -> Self {
        let mut manager = Self::new(source);
        manager.set_maximum_refresh_rate(config.timing.effective_fps());
        manager.set_event_queue_capacity(config.timing.event_queue_capacity);
        manager
    }

    pub fn start(&mut self) {
        self.source.start();
        tracing::debug!(rate = self.max_refresh_rate, "time manager started");
    }

    pub fn stop(&mut self) {
        self.source.stop();
        tracing::debug!("time manager stopped");
    }

    pub fn is_running(&self) -> bool {
        self.source.is_running()
    }

    /// Cap the tick rate. Zero is treated as one tick per second.
    pub fn set_maximum_refresh_rate(&mut self, hz: u32) {
        let hz = hz.max(1);
        self.max_refresh_rate = hz;
        self.source.set_interval(Ticks(Ticks::PER_SECOND / i64::from(hz)));
    }

    pub fn maximum_refresh_rate(&self) -> u32 {
        self.max_refresh_rate
    }

    pub fn source(&self) -> &dyn TickSource {
        self.source.as_ref()
    }

    /// Absolute time of the last tick.
    pub fn current_time(&self) -> Ticks {
        self.current_time
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Tick if the source says one is due.
    pub fn pump(&mut self, store: &mut dyn PropertyStore) -> Option<TickReport> {
        if self.source.poll_tick() {
            Some(self.tick(store))
        } else {
            None
        }
    }

    /// Run the tick pipeline at the source's current time.
    pub fn tick(&mut self, store: &mut dyn PropertyStore) -> TickReport {
        let now = self.source.now();
        self.current_time = now;
        self.tick_count += 1;
        let mut report = TickReport {
            time: now,
            ..TickReport::default()
        };

        self.run_tick_calls(&mut report);

        self.tree.update(now);
        self.storages.update(&self.tree, &mut self.applier);

        for event in self.tree.take_events() {
            self.raise(event, &mut report);
        }

        report.write_failures = self.applier.apply(store);
        self.applier.flush();

        for event in self.tree.take_completed() {
            let clock = event.clock();
            match self.timers.get_mut(&clock) {
                Some(count) => {
                    *count += 1;
                    let tick = ClockEvent::TimerTick {
                        clock,
                        name: event.name().to_string(),
                        count: *count,
                    };
                    self.raise(tick, &mut report);
                    if let Err(error) = self.tree.begin(clock) {
                        tracing::warn!(?clock, %error, "failed to restart timer");
                    }
                }
                None => self.raise(event, &mut report),
            }
        }

        self.apply_deferred();

        tracing::trace!(
            tick = self.tick_count,
            time = now.get(),
            events = report.events_raised,
            write_failures = report.write_failures.len(),
            "tick complete"
        );
        report
    }

    fn run_tick_calls(&mut self, report: &mut TickReport) {
        let calls = std::mem::take(&mut self.tick_calls);
        if calls.is_empty() {
            return;
        }
        let mut deferred = Deferred::new();
        for call in calls {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| call(&mut deferred))) {
                let message = panic_message(payload.as_ref());
                tracing::error!(%message, "tick call panicked");
                report.callback_failures.push(CallbackFailure {
                    clock: None,
                    message,
                });
            }
        }
        for command in deferred.take() {
            self.apply_command(command);
        }
    }

    fn raise(&mut self, event: ClockEvent, report: &mut TickReport) {
        report.events_raised += 1;
        let failures = self.handlers.dispatch(&event, &mut self.deferred);
        report.callback_failures.extend(failures);
        self.events.push(event);
    }

    fn apply_deferred(&mut self) {
        for command in self.deferred.take() {
            self.apply_command(command);
        }
    }

    fn apply_command(&mut self, command: ClockCommand) {
        let result = match command {
            ClockCommand::Begin(id) => self.begin(id),
            ClockCommand::Stop(id) => self.stop_clock(id),
            ClockCommand::Pause(id) => self.pause(id),
            ClockCommand::Resume(id) => self.resume(id),
            ClockCommand::Seek(id, target) => self.seek(id, target),
            ClockCommand::SkipToFill(id) => self.skip_to_fill(id),
            ClockCommand::Remove(id) => self.remove_clock(id),
        };
        if let Err(error) = result {
            tracing::warn!(?command, %error, "deferred clock command failed");
        }
    }

    // Clocks

    pub fn root_clock(&self) -> ClockId {
        self.tree.root()
    }

    pub fn clock(&self, id: ClockId) -> Option<&Clock> {
        self.tree.clock(id)
    }

    pub fn clock_tree(&self) -> &ClockTree {
        &self.tree
    }

    /// Instantiate a detached clock subtree for `timeline`.
    pub fn allocate_clock(&mut self, timeline: impl Into<Arc<Timeline>>) -> Result<ClockId> {
        self.tree.allocate(timeline.into())
    }

    pub fn add_child(&mut self, group: ClockId, child: ClockId) -> Result<()> {
        self.tree.add_child(group, child)
    }

    /// Discard a clock subtree. Storages it was driving float.
    pub fn remove_clock(&mut self, id: ClockId) -> Result<()> {
        let removed = self.tree.remove(id)?;
        self.storages.clocks_removed(&removed);
        for clock in &removed {
            self.handlers.remove_for_clock(*clock);
            self.timers.remove(clock);
        }
        Ok(())
    }

    pub fn begin(&mut self, id: ClockId) -> Result<()> {
        self.tree.begin(id)
    }

    pub fn begin_on_tick(&mut self, id: ClockId) -> Result<()> {
        self.tree.begin_on_tick(id)
    }

    pub fn pause(&mut self, id: ClockId) -> Result<()> {
        self.tree.pause(id)
    }

    pub fn resume(&mut self, id: ClockId) -> Result<()> {
        self.tree.resume(id)
    }

    pub fn seek(&mut self, id: ClockId, target: Ticks) -> Result<()> {
        self.tree.seek(id, target)
    }

    pub fn skip_to_fill(&mut self, id: ClockId) -> Result<()> {
        self.tree.skip_to_fill(id)
    }

    /// Stop a clock subtree. Storages restore their stop values on the
    /// next tick.
    pub fn stop_clock(&mut self, id: ClockId) -> Result<()> {
        self.tree.stop(id)
    }

    pub fn reset(&mut self, id: ClockId) -> Result<()> {
        self.tree.reset(id)
    }

    /// Render the clock tree for debugging.
    pub fn dump_clocks(&self) -> String {
        self.tree.dump()
    }

    // Storages

    /// Bind an animation clock to a property.
    pub fn hookup_storage(
        &mut self,
        clock: ClockId,
        target: AnimationTarget,
        store: &dyn PropertyStore,
    ) -> Result<StorageId> {
        let node = self.tree.get(clock).ok_or(TimingError::UnknownClock(clock))?;
        let animation = node
            .clock()
            .timeline()
            .as_animation()
            .ok_or(TimingError::NotAnAnimationClock(clock))?;
        let id = self.storages.hookup(clock, animation, target, store)?;
        tracing::debug!(?clock, ?target, "storage hooked up");
        Ok(id)
    }

    pub fn storage(&self, id: StorageId) -> Option<&AnimationStorage> {
        self.storages.get(id)
    }

    pub fn current_storage(&self, target: AnimationTarget) -> Option<StorageId> {
        self.storages.current(target)
    }

    pub fn set_stop_value(&mut self, id: StorageId, value: AnimatableValue) -> Result<()> {
        self.storages.set_stop_value(id, value)
    }

    /// Stop driving every property of a destroyed target.
    pub fn target_destroyed(&mut self, target: TargetId) -> usize {
        self.storages.target_destroyed(target)
    }

    /// Allocate `timeline`, bind every targeted animation in it, attach it
    /// to the root and begin it.
    ///
    /// All bindings are checked before any is made; on error nothing is
    /// attached.
    pub fn begin_storyboard(
        &mut self,
        timeline: impl Into<Arc<Timeline>>,
        store: &dyn PropertyStore,
    ) -> Result<ClockId> {
        let id = self.allocate_clock(timeline)?;
        let bindings = match self.collect_bindings(id, store) {
            Ok(bindings) => bindings,
            Err(error) => {
                if let Err(rollback) = self.tree.remove(id) {
                    tracing::warn!(clock = ?id, error = %rollback, "storyboard rollback failed");
                }
                return Err(error);
            }
        };
        for (clock, target) in bindings {
            if let Err(error) = self.hookup_storage(clock, target, store) {
                if let Err(rollback) = self.remove_clock(id) {
                    tracing::warn!(clock = ?id, error = %rollback, "storyboard rollback failed");
                }
                return Err(error);
            }
        }
        let root = self.tree.root();
        self.tree.add_child(root, id)?;
        tracing::debug!(clock = ?id, "storyboard begun");
        Ok(id)
    }

    fn collect_bindings(
        &self,
        id: ClockId,
        store: &dyn PropertyStore,
    ) -> Result<Vec<(ClockId, AnimationTarget)>> {
        let mut bindings = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.tree.get(current).ok_or(TimingError::UnknownClock(current))?;
            stack.extend(node.children().iter().rev());
            if node.kind() != ClockKind::Animation {
                continue;
            }
            let timeline = node.clock().timeline();
            let Some(animation) = timeline.as_animation() else {
                continue;
            };
            let target = animation
                .target
                .ok_or_else(|| TimingError::MissingTarget(timeline.display_name().to_string()))?;
            let property_kind = store.value_kind(target.target, target.property)?;
            if property_kind != animation.value_kind() {
                return Err(TimingError::TypeMismatch {
                    target: target.target,
                    property: target.property,
                    property_kind,
                    animation_kind: animation.value_kind(),
                });
            }
            bindings.push((current, target));
        }
        Ok(bindings)
    }

    // Events and callbacks

    /// Register a handler for events from `clock`, or from every clock.
    pub fn on_event(
        &mut self,
        clock: Option<ClockId>,
        handler: impl FnMut(&ClockEvent, &mut Deferred) + 'static,
    ) -> HandlerId {
        self.handlers.add(clock, Box::new(handler))
    }

    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(id)
    }

    /// Limit how many unpolled events are kept. Handlers still see every
    /// event; only the polling queue is bounded.
    pub fn set_event_queue_capacity(&mut self, capacity: usize) {
        self.events.set_capacity(capacity);
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Take every event raised since the last drain.
    pub fn drain_events(&mut self) -> Vec<ClockEvent> {
        self.events.drain().collect()
    }

    /// Run `call` once at the start of the next tick, before clocks update.
    pub fn add_tick_call(&mut self, call: impl FnOnce(&mut Deferred) + 'static) {
        self.tick_calls.push(Box::new(call));
    }

    /// Start a repeating timer raising `TimerTick` every `interval`.
    pub fn start_timer(&mut self, name: &str, interval: Ticks) -> Result<ClockId> {
        let timeline = Timeline::plain()
            .named(name)
            .duration(Duration::Span(interval.max(Ticks(1))));
        let id = self.allocate_clock(timeline)?;
        let root = self.tree.root();
        self.tree.add_child(root, id)?;
        self.timers.insert(id, 0);
        tracing::debug!(clock = ?id, interval = interval.get(), "timer started");
        Ok(id)
    }

    pub fn stop_timer(&mut self, id: ClockId) -> Result<()> {
        if self.timers.remove(&id).is_none() {
            return Err(TimingError::UnknownClock(id));
        }
        self.remove_clock(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Animation, FromToAnimation};
    use crate::target::MemoryStore;
    use crate::tick_source::{ManualClock, ManualTickSource};
    use crate::types::{ClockState, PropertyId, ValueKind};

    const NODE: TargetId = TargetId(1);
    const X: PropertyId = PropertyId(0);

    fn manager() -> (TimeManager, ManualClock) {
        let source = ManualTickSource::new();
        let clock = source.clock();
        (TimeManager::new(Box::new(source)), clock)
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.register(NODE, X, 0.0);
        store
    }

    fn slide(to: f64) -> Timeline {
        Timeline::animation(
            Animation::from_to(FromToAnimation::new(ValueKind::Double).to(to))
                .with_target(AnimationTarget::new(NODE, X)),
        )
        .duration(Duration::Span(Ticks(1000)))
    }

    #[test]
    fn test_refresh_rate_sets_interval() {
        let (mut manager, _) = manager();
        assert_eq!(manager.source().interval(), Ticks::from_millis(20));
        manager.set_maximum_refresh_rate(0);
        assert_eq!(manager.maximum_refresh_rate(), 1);
        assert_eq!(manager.source().interval(), Ticks::from_secs(1));
    }

    #[test]
    fn test_from_config_clamps_rate() {
        let mut config = RuneConfig::default();
        config.timing.max_fps = 500;
        let manager = TimeManager::from_config(&config, Box::new(ManualTickSource::new()));
        assert_eq!(manager.maximum_refresh_rate(), 50);
    }

    #[test]
    fn test_pump_follows_source() {
        let (mut manager, clock) = manager();
        let mut store = store();
        assert!(manager.pump(&mut store).is_none());
        manager.start();
        assert!(manager.pump(&mut store).is_some());
        assert!(manager.pump(&mut store).is_none());
        clock.advance_millis(20);
        assert!(manager.pump(&mut store).is_some());
        assert_eq!(manager.tick_count(), 2);
    }

    #[test]
    fn test_hookup_requires_animation_clock() {
        let (mut manager, _) = manager();
        let store = store();
        let plain = manager.allocate_clock(Timeline::plain()).unwrap();
        assert_eq!(
            manager.hookup_storage(plain, AnimationTarget::new(NODE, X), &store),
            Err(TimingError::NotAnAnimationClock(plain))
        );
    }

    #[test]
    fn test_storyboard_requires_targets() {
        let (mut manager, _) = manager();
        let store = store();
        let untargeted = Timeline::animation(Animation::from_to(
            FromToAnimation::new(ValueKind::Double).to(1.0),
        ))
        .named("loose");
        assert_eq!(
            manager.begin_storyboard(untargeted, &store),
            Err(TimingError::MissingTarget("loose".to_string()))
        );
        assert_eq!(manager.clock_tree().len(), 1);
    }

    #[test]
    fn test_deferred_commands_apply_after_tick() {
        let (mut manager, clock) = manager();
        let mut store = store();
        let id = manager.begin_storyboard(slide(100.0), &store).unwrap();
        manager.on_event(Some(id), |event, deferred| {
            if event.is_completed() {
                deferred.seek(event.clock(), Ticks::ZERO);
            }
        });

        clock.set(Ticks(1000));
        manager.tick(&mut store);
        assert_eq!(store.value(NODE, X), Some(AnimatableValue::from(100.0)));
        assert!(manager.clock(id).unwrap().is_seeking());

        clock.set(Ticks(1250));
        manager.tick(&mut store);
        assert_eq!(store.value(NODE, X), Some(AnimatableValue::from(0.0)));
        assert_eq!(manager.clock(id).unwrap().state(), ClockState::Active);
    }

    #[test]
    fn test_tick_call_runs_once_before_update() {
        let (mut manager, clock) = manager();
        let mut store = store();
        let id = manager.begin_storyboard(slide(100.0), &store).unwrap();
        manager.add_tick_call(move |deferred| deferred.seek(id, Ticks(500)));

        clock.set(Ticks(10));
        manager.tick(&mut store);
        assert_eq!(manager.clock(id).unwrap().current_time(), Ticks(500));

        clock.set(Ticks(20));
        manager.tick(&mut store);
        assert_eq!(manager.clock(id).unwrap().current_time(), Ticks(510));
    }

    #[test]
    fn test_panicking_tick_call_is_reported() {
        let (mut manager, _) = manager();
        let mut store = store();
        manager.add_tick_call(|_| panic!("boom"));
        let report = manager.tick(&mut store);
        assert_eq!(report.callback_failures.len(), 1);
        assert_eq!(report.callback_failures[0].message, "boom");
        assert!(manager.tick(&mut store).callback_failures.is_empty());
    }

    #[test]
    fn test_remove_clock_floats_storage() {
        let (mut manager, clock) = manager();
        let mut store = store();
        let id = manager.begin_storyboard(slide(100.0), &store).unwrap();
        clock.set(Ticks(500));
        manager.tick(&mut store);
        let storage = manager.current_storage(AnimationTarget::new(NODE, X)).unwrap();

        manager.remove_clock(id).unwrap();
        assert!(manager.storage(storage).unwrap().is_floating());
        clock.set(Ticks(600));
        manager.tick(&mut store);
        assert_eq!(store.value(NODE, X), Some(AnimatableValue::from(50.0)));
    }

    #[test]
    fn test_unpolled_events_stay_bounded() {
        let (mut manager, clock) = manager();
        let mut store = store();
        let looping = slide(100.0).repeat(crate::timeline::RepeatBehavior::Forever);
        let id = manager.begin_storyboard(looping, &store).unwrap();

        let seen = std::rc::Rc::new(std::cell::Cell::new(0usize));
        let counter = std::rc::Rc::clone(&seen);
        manager.on_event(Some(id), move |_, _| counter.set(counter.get() + 1));

        for t in 1..=5_000 {
            clock.set(Ticks(t * 7));
            manager.tick(&mut store);
        }

        let capacity = rune_config::DEFAULT_EVENT_QUEUE_CAPACITY;
        assert_eq!(manager.events().len(), capacity);
        assert!(seen.get() >= 5_000);
        assert_eq!(manager.events().dropped(), (seen.get() - capacity) as u64);
    }

    #[test]
    fn test_from_config_sets_event_capacity() {
        let mut config = RuneConfig::default();
        config.timing.event_queue_capacity = 8;
        let mut manager = TimeManager::from_config(&config, Box::new(ManualTickSource::new()));
        assert_eq!(manager.events().capacity(), 8);
        manager.set_event_queue_capacity(2);
        assert_eq!(manager.events().capacity(), 2);
    }
}
