//! Clock events, handlers, and deferred commands.
//!
//! Clocks accumulate events while the tree is updated; the time manager
//! raises them afterwards, bottom-up, in two phases: time and state
//! invalidations before property writes are applied, `Completed` after.
//! Every raised event is pushed onto a bounded [`EventQueue`] for polling
//! and offered to registered handlers. Hosts that never poll lose the
//! oldest events once the queue is full.
//!
//! Handlers cannot mutate the clock tree directly. They record
//! [`ClockCommand`]s into a [`Deferred`] buffer which the time manager
//! applies once the tick has finished, so work started from a handler
//! participates from the next tick on.
//!
//! ```ignore
//! let id = manager.begin_storyboard(timeline, &mut store)?;
//! manager.on_event(Some(id), |event, deferred| {
//!     if event.is_completed() {
//!         deferred.seek(event.clock(), Ticks::ZERO);
//!     }
//! });
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::time::Ticks;
use crate::types::{ClockId, ClockState};

/// Event raised by a clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClockEvent {
    /// Current time or progress changed.
    CurrentTimeInvalidated {
        clock: ClockId,
        name: String,
        current_time: Ticks,
        progress: f64,
    },
    /// Clock moved between Active, Filling and Stopped.
    CurrentStateInvalidated {
        clock: ClockId,
        name: String,
        state: ClockState,
    },
    /// Active period ended. Raised once per run.
    Completed { clock: ClockId, name: String },
    /// A dispatcher timer interval elapsed.
    TimerTick {
        clock: ClockId,
        name: String,
        /// Number of intervals elapsed since the timer started.
        count: u64,
    },
}

impl ClockEvent {
    pub fn clock(&self) -> ClockId {
        match self {
            Self::CurrentTimeInvalidated { clock, .. }
            | Self::CurrentStateInvalidated { clock, .. }
            | Self::Completed { clock, .. }
            | Self::TimerTick { clock, .. } => *clock,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::CurrentTimeInvalidated { name, .. }
            | Self::CurrentStateInvalidated { name, .. }
            | Self::Completed { name, .. }
            | Self::TimerTick { name, .. } => name,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn is_timer_tick(&self) -> bool {
        matches!(self, Self::TimerTick { .. })
    }
}

/// Queue of raised events awaiting polling, holding at most `capacity`.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<ClockEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::with_capacity(rune_config::DEFAULT_EVENT_QUEUE_CAPACITY)
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue keeping at most `capacity` events. Zero keeps none.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity,
            dropped: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the limit, dropping the oldest events if over it.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.trim();
    }

    /// Events discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn push(&mut self, event: ClockEvent) {
        self.events.push_back(event);
        self.trim();
    }

    fn trim(&mut self) {
        let excess = self.events.len().saturating_sub(self.capacity);
        if excess == 0 {
            return;
        }
        self.events.drain(..excess);
        self.dropped += excess as u64;
        tracing::debug!(
            excess,
            capacity = self.capacity,
            dropped = self.dropped,
            "event queue full, dropped oldest events"
        );
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<ClockEvent> {
        self.events.pop_front()
    }

    pub fn peek(&self) -> Option<&ClockEvent> {
        self.events.front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = ClockEvent> + '_ {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn events_for_clock(&self, clock: ClockId) -> Vec<&ClockEvent> {
        self.events.iter().filter(|e| e.clock() == clock).collect()
    }
}

/// Clock-tree mutation requested from inside a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockCommand {
    Begin(ClockId),
    Stop(ClockId),
    Pause(ClockId),
    Resume(ClockId),
    Seek(ClockId, Ticks),
    SkipToFill(ClockId),
    Remove(ClockId),
}

/// Commands recorded by handlers, applied after the tick.
#[derive(Debug, Default)]
pub struct Deferred {
    commands: Vec<ClockCommand>,
}

impl Deferred {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: ClockCommand) {
        self.commands.push(command);
    }

    pub fn begin(&mut self, clock: ClockId) {
        self.push(ClockCommand::Begin(clock));
    }

    pub fn stop(&mut self, clock: ClockId) {
        self.push(ClockCommand::Stop(clock));
    }

    pub fn pause(&mut self, clock: ClockId) {
        self.push(ClockCommand::Pause(clock));
    }

    pub fn resume(&mut self, clock: ClockId) {
        self.push(ClockCommand::Resume(clock));
    }

    pub fn seek(&mut self, clock: ClockId, target: Ticks) {
        self.push(ClockCommand::Seek(clock, target));
    }

    pub fn skip_to_fill(&mut self, clock: ClockId) {
        self.push(ClockCommand::SkipToFill(clock));
    }

    pub fn remove(&mut self, clock: ClockId) {
        self.push(ClockCommand::Remove(clock));
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub(crate) fn take(&mut self) -> Vec<ClockCommand> {
        std::mem::take(&mut self.commands)
    }
}

/// Callback invoked for raised events.
pub type EventHandler = Box<dyn FnMut(&ClockEvent, &mut Deferred)>;

/// Handle returned when registering a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// A callback that panicked.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackFailure {
    /// Clock whose event was being dispatched, if any.
    pub clock: Option<ClockId>,
    pub message: String,
}

struct Registration {
    id: HandlerId,
    filter: Option<ClockId>,
    handler: EventHandler,
}

/// Registered event handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    next_id: u64,
    handlers: Vec<Registration>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl HandlerRegistry {
    /// Register a handler for events from `filter`, or from every clock.
    pub fn add(&mut self, filter: Option<ClockId>, handler: EventHandler) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.handlers.push(Registration {
            id,
            filter,
            handler,
        });
        id
    }

    pub fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|r| r.id != id);
        before != self.handlers.len()
    }

    /// Drop handlers filtered on `clock`.
    pub fn remove_for_clock(&mut self, clock: ClockId) {
        self.handlers.retain(|r| r.filter != Some(clock));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Offer `event` to every matching handler. A panicking handler is
    /// reported and does not stop the remaining handlers.
    pub fn dispatch(&mut self, event: &ClockEvent, deferred: &mut Deferred) -> Vec<CallbackFailure> {
        let mut failures = Vec::new();
        let clock = event.clock();
        for registration in &mut self.handlers {
            if registration.filter.is_some_and(|f| f != clock) {
                continue;
            }
            let handler = &mut registration.handler;
            let result = catch_unwind(AssertUnwindSafe(|| handler(event, deferred)));
            if let Err(payload) = result {
                let message = panic_message(payload.as_ref());
                tracing::error!(?clock, %message, "clock event handler panicked");
                failures.push(CallbackFailure {
                    clock: Some(clock),
                    message,
                });
            }
        }
        failures
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ids() -> (ClockId, ClockId) {
        let mut map: SlotMap<ClockId, ()> = SlotMap::with_key();
        (map.insert(()), map.insert(()))
    }

    fn completed(clock: ClockId) -> ClockEvent {
        ClockEvent::Completed {
            clock,
            name: "fade".to_string(),
        }
    }

    #[test]
    fn test_event_accessors() {
        let (a, _) = ids();
        let event = ClockEvent::CurrentStateInvalidated {
            clock: a,
            name: "board".to_string(),
            state: ClockState::Filling,
        };
        assert_eq!(event.clock(), a);
        assert_eq!(event.name(), "board");
        assert!(!event.is_completed());
        assert!(completed(a).is_completed());
    }

    #[test]
    fn test_queue_fifo() {
        let (a, b) = ids();
        let mut queue = EventQueue::new();
        queue.push(completed(a));
        queue.push(completed(b));
        queue.push(ClockEvent::TimerTick {
            clock: a,
            name: String::new(),
            count: 1,
        });

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.events_for_clock(a).len(), 2);
        assert_eq!(queue.peek().map(|e| e.clock()), Some(a));
        assert_eq!(queue.pop().map(|e| e.clock()), Some(a));
        assert_eq!(queue.drain().count(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let (a, b) = ids();
        let mut queue = EventQueue::with_capacity(2);
        queue.push(completed(a));
        for count in 1..=3 {
            queue.push(ClockEvent::TimerTick {
                clock: b,
                name: String::new(),
                count,
            });
        }

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 2);
        let counts: Vec<u64> = queue
            .drain()
            .filter_map(|e| match e {
                ClockEvent::TimerTick { count, .. } => Some(count),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![2, 3]);
    }

    #[test]
    fn test_shrinking_capacity_trims() {
        let (a, _) = ids();
        let mut queue = EventQueue::new();
        for _ in 0..5 {
            queue.push(completed(a));
        }
        queue.set_capacity(1);
        assert_eq!(queue.len(), 1);
        queue.set_capacity(0);
        queue.push(completed(a));
        assert!(queue.is_empty());
        assert_eq!(queue.dropped(), 5);
    }

    #[test]
    fn test_dispatch_filters_by_clock() {
        let (a, b) = ids();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HandlerRegistry::default();

        let log = Rc::clone(&seen);
        registry.add(
            Some(a),
            Box::new(move |event, _| log.borrow_mut().push(event.clock())),
        );
        let log = Rc::clone(&seen);
        registry.add(None, Box::new(move |event, _| log.borrow_mut().push(event.clock())));

        let mut deferred = Deferred::new();
        registry.dispatch(&completed(a), &mut deferred);
        registry.dispatch(&completed(b), &mut deferred);
        assert_eq!(*seen.borrow(), vec![a, a, b]);
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let (a, _) = ids();
        let calls = Rc::new(RefCell::new(0));
        let mut registry = HandlerRegistry::default();
        registry.add(None, Box::new(|_, _| panic!("handler exploded")));
        let counter = Rc::clone(&calls);
        registry.add(None, Box::new(move |_, _| *counter.borrow_mut() += 1));

        let mut deferred = Deferred::new();
        let failures = registry.dispatch(&completed(a), &mut deferred);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].message, "handler exploded");
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_handlers_record_commands() {
        let (a, b) = ids();
        let mut registry = HandlerRegistry::default();
        registry.add(
            Some(a),
            Box::new(move |event, deferred| {
                deferred.seek(event.clock(), Ticks::ZERO);
                deferred.begin(b);
            }),
        );
        let mut deferred = Deferred::new();
        registry.dispatch(&completed(a), &mut deferred);
        assert_eq!(
            deferred.take(),
            vec![ClockCommand::Seek(a, Ticks::ZERO), ClockCommand::Begin(b)]
        );
        assert!(deferred.is_empty());
    }

    #[test]
    fn test_remove_handler() {
        let (a, _) = ids();
        let mut registry = HandlerRegistry::default();
        let id = registry.add(None, Box::new(|_, _| {}));
        registry.add(Some(a), Box::new(|_, _| {}));
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        registry.remove_for_clock(a);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let (a, _) = ids();
        let event = ClockEvent::CurrentTimeInvalidated {
            clock: a,
            name: "x".to_string(),
            current_time: Ticks(5),
            progress: 0.5,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"current_time_invalidated\""));
        let parsed: ClockEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
