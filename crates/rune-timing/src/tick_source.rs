//! Sources of "now" for the time manager.
//!
//! A tick source reports monotonic time and decides when the next tick is
//! due. [`SystemTickSource`] reads the OS monotonic clock;
//! [`ManualTickSource`] only moves when a test tells it to.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use crate::time::Ticks;

/// Default tick interval, 50 ticks per second.
pub const DEFAULT_TICK_INTERVAL: Ticks = Ticks::from_millis(20);

pub trait TickSource {
    /// Current monotonic time.
    fn now(&self) -> Ticks;

    fn start(&mut self);

    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Minimum time between two ticks.
    fn set_interval(&mut self, interval: Ticks);

    fn interval(&self) -> Ticks;

    /// Consume a due tick. Returns false while stopped or before the next
    /// tick is due.
    fn poll_tick(&mut self) -> bool;

    /// Time left until the next tick is due. `None` while stopped.
    fn time_until_next_tick(&self) -> Option<Ticks>;
}

/// Shared tick scheduling state used by both sources.
#[derive(Debug, Clone, Copy)]
struct Schedule {
    interval: Ticks,
    next_due: Option<Ticks>,
}

impl Schedule {
    fn new() -> Self {
        Self {
            interval: DEFAULT_TICK_INTERVAL,
            next_due: None,
        }
    }

    fn start(&mut self, now: Ticks) {
        if self.next_due.is_none() {
            self.next_due = Some(now);
        }
    }

    fn poll(&mut self, now: Ticks) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                // Skip missed ticks instead of bursting to catch up.
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    fn remaining(&self, now: Ticks) -> Option<Ticks> {
        self.next_due.map(|due| (due - now).max(Ticks::ZERO))
    }
}

/// Tick source backed by [`Instant`].
#[derive(Debug)]
pub struct SystemTickSource {
    origin: Instant,
    schedule: Schedule,
}

impl Default for SystemTickSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTickSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            schedule: Schedule::new(),
        }
    }
}

impl TickSource for SystemTickSource {
    fn now(&self) -> Ticks {
        Ticks::from_std(self.origin.elapsed())
    }

    fn start(&mut self) {
        let now = self.now();
        self.schedule.start(now);
    }

    fn stop(&mut self) {
        self.schedule.next_due = None;
    }

    fn is_running(&self) -> bool {
        self.schedule.next_due.is_some()
    }

    fn set_interval(&mut self, interval: Ticks) {
        self.schedule.interval = interval.max(Ticks(1));
    }

    fn interval(&self) -> Ticks {
        self.schedule.interval
    }

    fn poll_tick(&mut self) -> bool {
        let now = self.now();
        self.schedule.poll(now)
    }

    fn time_until_next_tick(&self) -> Option<Ticks> {
        self.schedule.remaining(self.now())
    }
}

/// Handle that moves a [`ManualTickSource`]'s time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Ticks>>,
}

impl ManualClock {
    pub fn now(&self) -> Ticks {
        self.now.get()
    }

    pub fn set(&self, now: Ticks) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Ticks) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_millis(&self, ms: i64) {
        self.advance(Ticks::from_millis(ms));
    }
}

/// Tick source whose time only changes through its [`ManualClock`].
#[derive(Debug)]
pub struct ManualTickSource {
    clock: ManualClock,
    schedule: Schedule,
}

impl Default for ManualTickSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualTickSource {
    pub fn new() -> Self {
        Self {
            clock: ManualClock::default(),
            schedule: Schedule::new(),
        }
    }

    /// Handle for moving time after the source has been handed away.
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }
}

impl TickSource for ManualTickSource {
    fn now(&self) -> Ticks {
        self.clock.now()
    }

    fn start(&mut self) {
        let now = self.now();
        self.schedule.start(now);
    }

    fn stop(&mut self) {
        self.schedule.next_due = None;
    }

    fn is_running(&self) -> bool {
        self.schedule.next_due.is_some()
    }

    fn set_interval(&mut self, interval: Ticks) {
        self.schedule.interval = interval.max(Ticks(1));
    }

    fn interval(&self) -> Ticks {
        self.schedule.interval
    }

    fn poll_tick(&mut self) -> bool {
        let now = self.now();
        self.schedule.poll(now)
    }

    fn time_until_next_tick(&self) -> Option<Ticks> {
        self.schedule.remaining(self.now())
    }
}
