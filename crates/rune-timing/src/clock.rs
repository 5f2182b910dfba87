//! Per-node clock state machine.
//!
//! A [`Clock`] converts its parent's time into local time and progress for
//! one [`Timeline`]. It knows nothing about its children or its storage;
//! the clock tree drives it and fans results out.
//!
//! Local time is
//!
//! ```text
//! local = (parent - root_parent_time - begin_time - accumulated_pause) * speed_ratio
//! ```
//!
//! and progress is local time folded into the current iteration.

use std::sync::Arc;

use crate::time::Ticks;
use crate::timeline::{FillBehavior, Timeline};
use crate::types::ClockState;

/// Durations resolved for one run of a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolvedTiming {
    /// Simple duration of one iteration. `None` when unbounded or unresolved.
    pub duration: Option<Ticks>,
    /// Local time at which all iterations are exhausted. `None` never ends.
    pub fill_time: Option<Ticks>,
}

/// Where a local time falls inside the repeat cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclePosition {
    pub iteration: i64,
    pub progress: f64,
    pub descending: bool,
}

/// Fold `local` into an iteration of length `duration`.
///
/// With `auto_reverse` every odd iteration runs backwards. A non-positive
/// duration is complete as soon as it starts.
pub fn fold(local: Ticks, duration: Ticks, auto_reverse: bool) -> CyclePosition {
    let d = duration.get();
    if d <= 0 {
        return CyclePosition {
            iteration: 0,
            progress: if auto_reverse { 0.0 } else { 1.0 },
            descending: auto_reverse,
        };
    }
    let l = local.get().max(0);
    let iteration = l / d;
    let fract = (l % d) as f64 / d as f64;
    let descending = auto_reverse && iteration % 2 == 1;
    CyclePosition {
        iteration,
        progress: if descending { 1.0 - fract } else { fract },
        descending,
    }
}

/// Position at the very end of the active period.
///
/// An end that lands on an iteration boundary belongs to the iteration it
/// closes, so a forward iteration finishes at 1.0 rather than wrapping to 0.
pub fn fold_end(fill_time: Ticks, duration: Ticks, auto_reverse: bool) -> CyclePosition {
    let d = duration.get();
    let l = fill_time.get();
    if d > 0 && l > 0 && l % d == 0 {
        let iteration = l / d - 1;
        let descending = auto_reverse && iteration % 2 == 1;
        return CyclePosition {
            iteration,
            progress: if descending { 0.0 } else { 1.0 },
            descending,
        };
    }
    fold(fill_time, duration, auto_reverse)
}

/// Events a clock has accumulated since they were last raised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingEvents {
    pub time_invalidated: bool,
    pub state_invalidated: bool,
    pub completed: bool,
}

/// Runtime instance of one timeline.
#[derive(Debug, Clone)]
pub struct Clock {
    timeline: Arc<Timeline>,
    timing: Option<ResolvedTiming>,

    state: ClockState,
    current_time: Ticks,
    progress: f64,
    iteration: i64,
    descending: bool,

    root_parent_time: Ticks,
    accumulated_pause_time: Ticks,
    last_parent_time: Option<Ticks>,

    is_paused: bool,
    pause_parent_time: Ticks,
    resume_pending: bool,

    is_seeking: bool,
    seek_target: Ticks,
    /// Rounding left over after solving a seek against a non-unit speed.
    seek_residual: Ticks,

    has_started: bool,
    has_completed: bool,
    was_stopped: bool,
    begin_on_tick: bool,

    pending: PendingEvents,
}

impl Clock {
    pub fn new(timeline: Arc<Timeline>) -> Self {
        Self {
            timeline,
            timing: None,
            state: ClockState::Stopped,
            current_time: Ticks::ZERO,
            progress: 0.0,
            iteration: 0,
            descending: false,
            root_parent_time: Ticks::ZERO,
            accumulated_pause_time: Ticks::ZERO,
            last_parent_time: None,
            is_paused: false,
            pause_parent_time: Ticks::ZERO,
            resume_pending: false,
            is_seeking: false,
            seek_target: Ticks::ZERO,
            seek_residual: Ticks::ZERO,
            has_started: false,
            has_completed: false,
            was_stopped: false,
            begin_on_tick: false,
            pending: PendingEvents::default(),
        }
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Local time, clamped to the fill time once the clock has finished.
    pub fn current_time(&self) -> Ticks {
        self.current_time
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Zero-based iteration the current time falls in.
    pub fn iteration(&self) -> i64 {
        self.iteration
    }

    /// True while an auto-reversed iteration runs backwards.
    pub fn is_descending(&self) -> bool {
        self.descending
    }

    pub fn root_parent_time(&self) -> Ticks {
        self.root_parent_time
    }

    pub fn accumulated_pause_time(&self) -> Ticks {
        self.accumulated_pause_time
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_seeking(&self) -> bool {
        self.is_seeking
    }

    pub fn seek_target(&self) -> Ticks {
        self.seek_target
    }

    /// Local time has reached zero at least once in this run.
    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn has_completed(&self) -> bool {
        self.has_completed
    }

    pub fn was_stopped(&self) -> bool {
        self.was_stopped
    }

    pub fn begins_on_tick(&self) -> bool {
        self.begin_on_tick
    }

    pub fn timing(&self) -> Option<ResolvedTiming> {
        self.timing
    }

    pub fn fill_time(&self) -> Option<Ticks> {
        self.timing.and_then(|t| t.fill_time)
    }

    pub(crate) fn set_timing(&mut self, timing: ResolvedTiming) {
        self.timing = Some(timing);
    }

    /// Forget resolved durations so they are recomputed before next use.
    pub(crate) fn invalidate_timing(&mut self) {
        self.timing = None;
    }

    /// Stopped → Active, anchored at `parent_time`.
    pub fn begin(&mut self, parent_time: Ticks) {
        let previous = self.state;
        self.state = ClockState::Active;
        self.root_parent_time = parent_time;
        self.accumulated_pause_time = Ticks::ZERO;
        self.last_parent_time = None;
        self.current_time = Ticks::ZERO;
        self.progress = 0.0;
        self.iteration = 0;
        self.descending = false;
        self.is_paused = false;
        self.resume_pending = false;
        self.is_seeking = false;
        self.seek_residual = Ticks::ZERO;
        self.has_started = false;
        self.has_completed = false;
        self.was_stopped = false;
        self.begin_on_tick = false;

        if previous != ClockState::Active {
            self.pending.state_invalidated = true;
        }
        tracing::trace!(
            clock = self.timeline.display_name(),
            parent_time = parent_time.get(),
            "clock began"
        );
    }

    /// Begin on the next update, anchored at that update's parent time.
    pub fn set_begin_on_tick(&mut self) {
        self.begin_on_tick = true;
    }

    /// Advance to `parent_time`.
    pub fn update_from_parent_time(&mut self, parent_time: Ticks) {
        if self.state == ClockState::Stopped {
            if !self.begin_on_tick {
                return;
            }
            self.begin(parent_time);
        }

        if self.is_seeking {
            self.solve_seek(parent_time);
        } else if self.is_paused {
            self.last_parent_time = Some(parent_time);
            return;
        } else if self.resume_pending {
            self.accumulated_pause_time += parent_time - self.pause_parent_time;
            self.resume_pending = false;
        }
        self.last_parent_time = Some(parent_time);

        let local = self.local_time_at(parent_time);
        if local.is_negative() {
            return;
        }
        self.has_started = true;
        self.apply_local_time(local);
    }

    fn local_time_at(&self, parent_time: Ticks) -> Ticks {
        let elapsed = parent_time
            - self.root_parent_time
            - self.timeline.begin_time
            - self.accumulated_pause_time;
        elapsed.scale(self.timeline.speed_ratio) + self.seek_residual
    }

    /// Re-anchor so that `parent_time` maps exactly to the seek target.
    fn solve_seek(&mut self, parent_time: Ticks) {
        let target = self.seek_target;
        let speed = self.timeline.speed_ratio;
        let elapsed = target.unscale(speed);

        self.root_parent_time = parent_time - self.timeline.begin_time - elapsed;
        self.accumulated_pause_time = Ticks::ZERO;
        self.seek_residual = target - elapsed.scale(speed);
        self.is_seeking = false;
        self.resume_pending = false;
        if self.is_paused {
            self.pause_parent_time = parent_time;
        }
        if self.fill_time().is_none_or(|fill| target < fill) {
            self.has_completed = false;
        }
    }

    fn apply_local_time(&mut self, local: Ticks) {
        let timing = self.timing.unwrap_or_default();
        let previous = (self.state, self.current_time, self.progress);

        match timing.fill_time {
            Some(fill) if local >= fill => {
                let end = match timing.duration {
                    Some(d) => fold_end(fill, d, self.timeline.auto_reverse),
                    None => CyclePosition {
                        iteration: 0,
                        progress: 0.0,
                        descending: false,
                    },
                };
                self.current_time = fill;
                self.set_position(end);

                // The tick that first reaches the end stays active so the
                // final value is produced by a running clock.
                let first_arrival = !self.has_completed && local == fill;
                if !self.has_completed {
                    self.has_completed = true;
                    self.pending.completed = true;
                    tracing::debug!(
                        clock = self.timeline.display_name(),
                        fill_time = fill.get(),
                        "clock completed"
                    );
                }
                self.state = if first_arrival {
                    ClockState::Active
                } else {
                    match self.timeline.fill_behavior {
                        FillBehavior::HoldEnd => ClockState::Filling,
                        FillBehavior::Stop => ClockState::Stopped,
                    }
                };
            }
            _ => {
                // A parent moving backwards lets the clock complete again.
                self.has_completed = false;
                self.state = ClockState::Active;
                self.current_time = local;
                match timing.duration {
                    Some(d) => self.set_position(fold(local, d, self.timeline.auto_reverse)),
                    None => self.set_position(CyclePosition {
                        iteration: 0,
                        progress: 0.0,
                        descending: false,
                    }),
                }
            }
        }

        if previous.0 != self.state {
            self.pending.state_invalidated = true;
        }
        if previous.1 != self.current_time || previous.2 != self.progress {
            self.pending.time_invalidated = true;
        }
    }

    fn set_position(&mut self, position: CyclePosition) {
        self.progress = position.progress;
        self.iteration = position.iteration;
        self.descending = position.descending;
    }

    pub fn pause(&mut self) {
        if self.state == ClockState::Stopped {
            return;
        }
        if self.resume_pending {
            // Resumed and paused again without an update in between.
            self.resume_pending = false;
            self.is_paused = true;
            return;
        }
        if self.is_paused {
            return;
        }
        self.is_paused = true;
        self.pause_parent_time = self
            .last_parent_time
            .unwrap_or(self.root_parent_time + self.timeline.begin_time);
    }

    pub fn resume(&mut self) {
        if !self.is_paused {
            return;
        }
        self.is_paused = false;
        self.resume_pending = true;
    }

    /// Seek to local time `target` on the next update. Ignored while stopped.
    pub fn seek(&mut self, target: Ticks) {
        if self.state == ClockState::Stopped {
            return;
        }
        self.is_seeking = true;
        self.seek_target = target.max(Ticks::ZERO);
    }

    /// Jump to the end of the active period and enter the fill state now.
    ///
    /// Clocks that never end are left alone.
    pub fn skip_to_fill(&mut self) {
        if self.state == ClockState::Stopped {
            return;
        }
        let timing = self.timing.unwrap_or_default();
        let Some(fill) = timing.fill_time else {
            return;
        };

        let anchor = self
            .last_parent_time
            .unwrap_or(self.root_parent_time + self.timeline.begin_time);
        self.seek_target = fill;
        self.is_seeking = true;
        self.solve_seek(anchor);
        self.last_parent_time = Some(anchor);
        self.has_started = true;

        // Already completed clocks keep their single Completed event.
        let before = self.has_completed;
        self.has_completed = true;
        self.apply_local_time(fill + Ticks(1));
        if !before {
            self.pending.completed = true;
        }
    }

    /// Any state → Stopped.
    pub fn stop(&mut self) {
        if self.state != ClockState::Stopped {
            self.pending.state_invalidated = true;
        }
        self.state = ClockState::Stopped;
        self.was_stopped = true;
        self.is_paused = false;
        self.resume_pending = false;
        self.is_seeking = false;
        self.begin_on_tick = false;
    }

    /// Any state → Stopped, discarding everything about the current run.
    pub fn reset(&mut self) {
        let timeline = Arc::clone(&self.timeline);
        let timing = self.timing;
        *self = Self::new(timeline);
        self.timing = timing;
    }

    pub(crate) fn take_pending(&mut self) -> PendingEvents {
        let pending = self.pending;
        self.pending.time_invalidated = false;
        self.pending.state_invalidated = false;
        pending
    }

    pub(crate) fn take_completed(&mut self) -> bool {
        std::mem::take(&mut self.pending.completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{Duration, RepeatBehavior};

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    /// Build a begun clock with timing resolved the way the clock tree does.
    fn begun(timeline: Timeline) -> Clock {
        let duration = timeline.duration.span();
        let fill_time = duration.and_then(|d| timeline.fill_time(d));
        let mut clock = Clock::new(Arc::new(timeline));
        clock.set_timing(ResolvedTiming { duration, fill_time });
        clock.begin(Ticks::ZERO);
        clock
    }

    fn simple(duration: i64) -> Timeline {
        Timeline::plain().duration(Duration::Span(Ticks(duration)))
    }

    #[test]
    fn test_fold_ascending() {
        let p = fold(Ticks(1500), Ticks(1000), false);
        assert_eq!(p.iteration, 1);
        assert!(approx_eq(p.progress, 0.5));
        assert!(!p.descending);
    }

    #[test]
    fn test_fold_auto_reverse() {
        let p = fold(Ticks(1250), Ticks(1000), true);
        assert_eq!(p.iteration, 1);
        assert!(approx_eq(p.progress, 0.75));
        assert!(p.descending);

        let p = fold(Ticks(2250), Ticks(1000), true);
        assert!(approx_eq(p.progress, 0.25));
        assert!(!p.descending);
    }

    #[test]
    fn test_fold_end_boundaries() {
        assert!(approx_eq(fold_end(Ticks(1000), Ticks(1000), false).progress, 1.0));
        assert!(approx_eq(fold_end(Ticks(2000), Ticks(1000), false).progress, 1.0));
        assert!(approx_eq(fold_end(Ticks(2000), Ticks(1000), true).progress, 0.0));
        assert!(approx_eq(fold_end(Ticks(1500), Ticks(1000), false).progress, 0.5));
        assert!(approx_eq(fold_end(Ticks(0), Ticks(1000), false).progress, 0.0));
    }

    #[test]
    fn test_unbegun_clock_ignores_ticks() {
        let mut clock = Clock::new(Arc::new(simple(1000)));
        clock.update_from_parent_time(Ticks(500));
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.current_time(), Ticks::ZERO);
        assert!(!clock.has_started());
    }

    #[test]
    fn test_begin_time_delays_start() {
        let mut clock = begun(simple(1000).begin_at(Ticks(300)));
        clock.update_from_parent_time(Ticks(100));
        assert_eq!(clock.state(), ClockState::Active);
        assert!(!clock.has_started());

        clock.update_from_parent_time(Ticks(300));
        assert!(clock.has_started());
        assert_eq!(clock.current_time(), Ticks::ZERO);
        assert!(approx_eq(clock.progress(), 0.0));
    }

    #[test]
    fn test_linear_progression_with_speed() {
        let mut clock = begun(simple(10_000).speed(2.0));
        clock.update_from_parent_time(Ticks(100));
        let t1 = clock.current_time();
        clock.update_from_parent_time(Ticks(700));
        let t2 = clock.current_time();
        assert_eq!(t2 - t1, Ticks(1200));
        assert!(approx_eq(clock.progress(), 0.14));
    }

    #[test]
    fn test_update_is_idempotent() {
        let mut clock = begun(simple(1000).repeat(RepeatBehavior::Count(3.0)).auto_reverse(true));
        clock.update_from_parent_time(Ticks(1337));
        let first = (clock.current_time(), clock.progress());
        clock.update_from_parent_time(Ticks(1337));
        assert_eq!(first, (clock.current_time(), clock.progress()));
    }

    #[test]
    fn test_pause_absorbs_elapsed_time() {
        let mut clock = begun(simple(10_000));
        clock.update_from_parent_time(Ticks(400));
        clock.pause();
        clock.update_from_parent_time(Ticks(900));
        assert_eq!(clock.current_time(), Ticks(400));

        clock.resume();
        clock.update_from_parent_time(Ticks(1500));
        assert_eq!(clock.current_time(), Ticks(400));
        assert_eq!(clock.accumulated_pause_time(), Ticks(1100));

        clock.update_from_parent_time(Ticks(1600));
        assert_eq!(clock.current_time(), Ticks(500));
    }

    #[test]
    fn test_resume_without_pause_is_noop() {
        let mut clock = begun(simple(1000));
        clock.update_from_parent_time(Ticks(100));
        clock.resume();
        clock.update_from_parent_time(Ticks(200));
        assert_eq!(clock.current_time(), Ticks(200));
        assert_eq!(clock.accumulated_pause_time(), Ticks::ZERO);
    }

    #[test]
    fn test_pause_then_resume_before_tick() {
        let mut clock = begun(simple(10_000));
        clock.update_from_parent_time(Ticks(100));
        clock.pause();
        clock.resume();
        clock.pause();
        clock.update_from_parent_time(Ticks(900));
        assert!(clock.is_paused());
        assert_eq!(clock.current_time(), Ticks(100));
    }

    #[test]
    fn test_seek_is_exact() {
        for speed in [1.0, 0.3, 2.0, 3.7] {
            let mut clock = begun(simple(100_000).speed(speed).begin_at(Ticks(50)));
            clock.update_from_parent_time(Ticks(1000));
            clock.seek(Ticks(12_345));
            clock.update_from_parent_time(Ticks(77_777));
            assert_eq!(clock.current_time(), Ticks(12_345), "speed {speed}");
            assert_eq!(clock.accumulated_pause_time(), Ticks::ZERO);
        }
    }

    #[test]
    fn test_seek_to_end_points() {
        for speed in [1.0, 0.3, 3.7] {
            let mut clock = begun(simple(100_000).speed(speed).begin_at(Ticks(50)));
            clock.update_from_parent_time(Ticks(1000));
            clock.seek(Ticks::ZERO);
            clock.update_from_parent_time(Ticks(20_000));
            assert_eq!(clock.current_time(), Ticks::ZERO, "speed {speed}");
            assert_eq!(clock.state(), ClockState::Active);

            clock.seek(Ticks(100_000));
            clock.update_from_parent_time(Ticks(33_333));
            assert_eq!(clock.current_time(), Ticks(100_000), "speed {speed}");
            assert_eq!(clock.state(), ClockState::Active);
            assert!(clock.has_completed());
            assert!(approx_eq(clock.progress(), 1.0));
        }
    }

    #[test]
    fn test_seek_then_continue_linearly() {
        let mut clock = begun(simple(100_000).speed(3.0));
        clock.seek(Ticks(1000));
        clock.update_from_parent_time(Ticks(5000));
        assert_eq!(clock.current_time(), Ticks(1000));
        clock.update_from_parent_time(Ticks(5100));
        assert_eq!(clock.current_time(), Ticks(1300));
    }

    #[test]
    fn test_seek_while_paused_stays_paused() {
        let mut clock = begun(simple(10_000));
        clock.update_from_parent_time(Ticks(100));
        clock.pause();
        clock.seek(Ticks(4000));
        clock.update_from_parent_time(Ticks(200));
        assert_eq!(clock.current_time(), Ticks(4000));
        clock.update_from_parent_time(Ticks(900));
        assert_eq!(clock.current_time(), Ticks(4000));
        clock.resume();
        clock.update_from_parent_time(Ticks(1000));
        assert_eq!(clock.current_time(), Ticks(4000));
    }

    #[test]
    fn test_seek_before_begin_is_ignored() {
        let mut clock = Clock::new(Arc::new(simple(1000)));
        clock.seek(Ticks(500));
        assert!(!clock.is_seeking());
    }

    #[test]
    fn test_repeat_count_without_reverse() {
        let mut clock = begun(simple(1000).repeat(RepeatBehavior::Count(2.0)));
        clock.update_from_parent_time(Ticks(1500));
        assert!(approx_eq(clock.progress(), 0.5));
        assert!(!clock.is_descending());
        clock.update_from_parent_time(Ticks(1750));
        assert!(approx_eq(clock.progress(), 0.75));
    }

    #[test]
    fn test_repeat_count_with_reverse() {
        let mut clock = begun(
            simple(1000)
                .repeat(RepeatBehavior::Count(2.0))
                .auto_reverse(true),
        );
        clock.update_from_parent_time(Ticks(1500));
        assert!(approx_eq(clock.progress(), 0.5));
        assert!(clock.is_descending());
        clock.update_from_parent_time(Ticks(1750));
        assert!(approx_eq(clock.progress(), 0.25));
    }

    #[test]
    fn test_completion_and_hold_end() {
        let mut clock = begun(simple(1000));
        clock.update_from_parent_time(Ticks(999));
        assert!(!clock.take_completed());

        clock.update_from_parent_time(Ticks(1000));
        assert_eq!(clock.state(), ClockState::Active);
        assert!(approx_eq(clock.progress(), 1.0));
        assert!(clock.take_completed());

        clock.update_from_parent_time(Ticks(1500));
        assert_eq!(clock.state(), ClockState::Filling);
        assert_eq!(clock.current_time(), Ticks(1000));
        assert!(approx_eq(clock.progress(), 1.0));
        assert!(!clock.take_completed());
    }

    #[test]
    fn test_overshoot_fills_immediately() {
        let mut clock = begun(simple(1000));
        clock.update_from_parent_time(Ticks(2000));
        assert_eq!(clock.state(), ClockState::Filling);
        assert!(clock.take_completed());
    }

    #[test]
    fn test_fill_stop() {
        let mut clock = begun(simple(1000).fill(FillBehavior::Stop));
        clock.update_from_parent_time(Ticks(1200));
        assert_eq!(clock.state(), ClockState::Stopped);
        assert!(clock.has_completed());
        assert!(!clock.was_stopped());
    }

    #[test]
    fn test_auto_reverse_ends_at_zero() {
        let mut clock = begun(simple(1000).auto_reverse(true));
        clock.update_from_parent_time(Ticks(2500));
        assert_eq!(clock.state(), ClockState::Filling);
        assert_eq!(clock.current_time(), Ticks(2000));
        assert!(approx_eq(clock.progress(), 0.0));
    }

    #[test]
    fn test_forever_duration_free_runs() {
        let mut clock = begun(Timeline::plain().duration(Duration::Forever));
        clock.update_from_parent_time(Ticks(123_456));
        assert_eq!(clock.state(), ClockState::Active);
        assert_eq!(clock.current_time(), Ticks(123_456));
        assert!(approx_eq(clock.progress(), 0.0));
    }

    #[test]
    fn test_seek_back_from_filling_reactivates() {
        let mut clock = begun(simple(1000));
        clock.update_from_parent_time(Ticks(3000));
        assert_eq!(clock.state(), ClockState::Filling);
        assert!(clock.take_completed());

        clock.seek(Ticks(250));
        clock.update_from_parent_time(Ticks(3100));
        assert_eq!(clock.state(), ClockState::Active);
        assert!(approx_eq(clock.progress(), 0.25));

        clock.update_from_parent_time(Ticks(3850));
        assert!(clock.take_completed());
    }

    #[test]
    fn test_skip_to_fill() {
        let mut clock = begun(simple(1000).repeat(RepeatBehavior::Count(2.0)));
        clock.update_from_parent_time(Ticks(100));
        clock.skip_to_fill();
        assert_eq!(clock.state(), ClockState::Filling);
        assert_eq!(clock.current_time(), Ticks(2000));
        assert!(approx_eq(clock.progress(), 1.0));
        assert!(clock.take_completed());

        clock.update_from_parent_time(Ticks(150));
        assert_eq!(clock.state(), ClockState::Filling);
        assert_eq!(clock.current_time(), Ticks(2000));
    }

    #[test]
    fn test_stop_and_reset() {
        let mut clock = begun(simple(1000));
        clock.update_from_parent_time(Ticks(400));
        clock.stop();
        assert_eq!(clock.state(), ClockState::Stopped);
        assert!(clock.was_stopped());

        clock.update_from_parent_time(Ticks(500));
        assert_eq!(clock.current_time(), Ticks(400));

        clock.reset();
        assert_eq!(clock.state(), ClockState::Stopped);
        assert_eq!(clock.current_time(), Ticks::ZERO);
        assert!(!clock.was_stopped());
        assert!(clock.timing().is_some());
    }

    #[test]
    fn test_begin_on_tick() {
        let mut clock = Clock::new(Arc::new(simple(1000)));
        clock.set_timing(ResolvedTiming {
            duration: Some(Ticks(1000)),
            fill_time: Some(Ticks(1000)),
        });
        clock.set_begin_on_tick();
        clock.update_from_parent_time(Ticks(5000));
        assert_eq!(clock.state(), ClockState::Active);
        assert_eq!(clock.root_parent_time(), Ticks(5000));
        clock.update_from_parent_time(Ticks(5250));
        assert!(approx_eq(clock.progress(), 0.25));
    }

    #[test]
    fn test_pending_events() {
        let mut clock = begun(simple(1000));
        let pending = clock.take_pending();
        assert!(pending.state_invalidated);

        clock.update_from_parent_time(Ticks(10));
        let pending = clock.take_pending();
        assert!(pending.time_invalidated);
        assert!(!pending.state_invalidated);

        clock.update_from_parent_time(Ticks(10));
        assert_eq!(clock.take_pending(), PendingEvents::default());
    }
}
