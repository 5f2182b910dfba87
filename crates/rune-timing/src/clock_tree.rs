//! Arena of live clocks and the group logic that connects them.
//!
//! Every clock lives in one [`SlotMap`] owned by the tree. Parent and child
//! links are plain [`ClockId`]s, so detaching a subtree is a list removal
//! with no lifetime hazard. The root is a parallel group with a forever
//! duration; top-level schedules are attached beneath it.
//!
//! Groups pass their own local time to their children as the children's
//! parent time, which makes nested timing hierarchical. Children are
//! anchored at the group's current local time when attached or begun.

use slotmap::SlotMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::clock::{Clock, PendingEvents, ResolvedTiming};
use crate::error::{Result, TimingError};
use crate::events::ClockEvent;
use crate::keyframes::ResolvedKeyFrame;
use crate::time::Ticks;
use crate::timeline::{Duration, RepeatBehavior, Timeline, TimelineKind};
use crate::types::{ClockId, ClockState};

/// What a clock node does with its time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockKind {
    /// Fans time out to child clocks.
    Group,
    /// Drives a property through an animation storage.
    Animation,
    /// Timing only.
    Plain,
}

impl ClockKind {
    fn of(timeline: &Timeline) -> Self {
        match timeline.kind {
            TimelineKind::Parallel { .. } => Self::Group,
            TimelineKind::Animation(_) => Self::Animation,
            TimelineKind::Plain => Self::Plain,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Group => "Group",
            Self::Animation => "Animation",
            Self::Plain => "Clock",
        }
    }
}

/// One clock plus its place in the tree.
#[derive(Debug, Clone)]
pub struct ClockNode {
    clock: Clock,
    kind: ClockKind,
    parent: Option<ClockId>,
    children: Vec<ClockId>,
    key_times: Vec<ResolvedKeyFrame>,
}

impl ClockNode {
    fn new(timeline: Arc<Timeline>) -> Self {
        Self {
            kind: ClockKind::of(&timeline),
            clock: Clock::new(timeline),
            parent: None,
            children: Vec::new(),
            key_times: Vec::new(),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn kind(&self) -> ClockKind {
        self.kind
    }

    pub fn parent(&self) -> Option<ClockId> {
        self.parent
    }

    pub fn children(&self) -> &[ClockId] {
        &self.children
    }

    /// Key times resolved against the clock's simple duration.
    pub fn key_times(&self) -> &[ResolvedKeyFrame] {
        &self.key_times
    }
}

/// Live clock hierarchy.
#[derive(Debug)]
pub struct ClockTree {
    nodes: SlotMap<ClockId, ClockNode>,
    root: ClockId,
}

impl Default for ClockTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockTree {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let timeline = Timeline::parallel().named("root").duration(Duration::Forever);
        let root = nodes.insert(ClockNode::new(Arc::new(timeline)));
        Self { nodes, root }
    }

    pub fn root(&self) -> ClockId {
        self.root
    }

    pub fn get(&self, id: ClockId) -> Option<&ClockNode> {
        self.nodes.get(id)
    }

    pub fn clock(&self, id: ClockId) -> Option<&Clock> {
        self.nodes.get(id).map(|n| &n.clock)
    }

    pub fn contains(&self, id: ClockId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: ClockId) -> Result<&ClockNode> {
        self.nodes.get(id).ok_or(TimingError::UnknownClock(id))
    }

    fn node_mut(&mut self, id: ClockId) -> Result<&mut ClockNode> {
        self.nodes.get_mut(id).ok_or(TimingError::UnknownClock(id))
    }

    /// Instantiate clocks for `timeline` and its children. The new subtree
    /// is detached until passed to [`add_child`](Self::add_child).
    pub fn allocate(&mut self, timeline: Arc<Timeline>) -> Result<ClockId> {
        timeline.validate()?;
        Ok(self.allocate_node(timeline))
    }

    fn allocate_node(&mut self, timeline: Arc<Timeline>) -> ClockId {
        let children: Vec<Arc<Timeline>> = timeline.children().to_vec();
        let id = self.nodes.insert(ClockNode::new(timeline));
        for child_timeline in children {
            let child = self.allocate_node(child_timeline);
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = Some(id);
            }
            if let Some(node) = self.nodes.get_mut(id) {
                node.children.push(child);
            }
        }
        id
    }

    /// Attach a detached clock to `group`.
    ///
    /// A running group begins the child immediately, anchored at the
    /// group's current local time.
    pub fn add_child(&mut self, group: ClockId, child: ClockId) -> Result<()> {
        if child == self.root {
            return Err(TimingError::RootClock);
        }
        if self.node(group)?.kind != ClockKind::Group {
            return Err(TimingError::NotAGroup(group));
        }
        if self.node(child)?.parent.is_some() || self.is_ancestor(child, group) {
            return Err(TimingError::AlreadyAttached(child));
        }

        let group_node = self.node_mut(group)?;
        group_node.children.push(child);
        group_node.clock.invalidate_timing();
        let running = group_node.clock.state().is_running();
        let group_time = group_node.clock.current_time();
        self.node_mut(child)?.parent = Some(group);

        if running {
            self.begin_subtree(child, group_time);
        }
        Ok(())
    }

    /// True when `ancestor` is `id` or lies on the path from `id` to its root.
    fn is_ancestor(&self, ancestor: ClockId, id: ClockId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(current).and_then(|n| n.parent);
        }
        false
    }

    /// Detach and discard `id` and its descendants. Returns the removed ids,
    /// children before parents.
    pub fn remove(&mut self, id: ClockId) -> Result<Vec<ClockId>> {
        if id == self.root {
            return Err(TimingError::RootClock);
        }
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p)) {
            parent.children.retain(|c| *c != id);
            parent.clock.invalidate_timing();
        }

        let mut removed = Vec::new();
        self.collect_post_order(id, &mut removed);
        for clock in &removed {
            self.nodes.remove(*clock);
        }
        tracing::debug!(?id, count = removed.len(), "removed clock subtree");
        Ok(removed)
    }

    fn collect_post_order(&self, id: ClockId, out: &mut Vec<ClockId>) {
        if let Some(node) = self.nodes.get(id) {
            for child in &node.children {
                self.collect_post_order(*child, out);
            }
            out.push(id);
        }
    }

    /// Time a clock's parent currently reports. Detached clocks use the
    /// root's local time, since that is where they are normally attached.
    fn parent_time_of(&self, id: ClockId) -> Ticks {
        let parent = self.nodes.get(id).and_then(|n| n.parent).unwrap_or(self.root);
        self.nodes
            .get(parent)
            .map(|n| n.clock.current_time())
            .unwrap_or_default()
    }

    /// Begin `id` at its parent's current time. Groups restart their
    /// children at their own local zero.
    pub fn begin(&mut self, id: ClockId) -> Result<()> {
        self.node(id)?;
        let parent_time = if id == self.root {
            self.nodes
                .get(id)
                .map(|n| n.clock.root_parent_time())
                .unwrap_or_default()
        } else {
            self.parent_time_of(id)
        };
        self.begin_subtree(id, parent_time);
        Ok(())
    }

    /// Begin the root at an absolute time.
    pub fn begin_root(&mut self, now: Ticks) {
        let root = self.root;
        self.begin_subtree(root, now);
    }

    fn begin_subtree(&mut self, id: ClockId, parent_time: Ticks) {
        self.ensure_timing(id);
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.clock.begin(parent_time);
        let children = node.children.clone();
        for child in children {
            self.begin_subtree(child, Ticks::ZERO);
        }
    }

    /// Begin `id` on the next update, anchored at that update's parent time.
    pub fn begin_on_tick(&mut self, id: ClockId) -> Result<()> {
        self.node_mut(id)?.clock.set_begin_on_tick();
        Ok(())
    }

    pub fn pause(&mut self, id: ClockId) -> Result<()> {
        self.node_mut(id)?.clock.pause();
        Ok(())
    }

    pub fn resume(&mut self, id: ClockId) -> Result<()> {
        self.node_mut(id)?.clock.resume();
        Ok(())
    }

    pub fn seek(&mut self, id: ClockId, target: Ticks) -> Result<()> {
        self.node_mut(id)?.clock.seek(target);
        Ok(())
    }

    /// Jump `id` to its fill state and bring its descendants along.
    pub fn skip_to_fill(&mut self, id: ClockId) -> Result<()> {
        self.node(id)?;
        self.ensure_timing(id);
        let node = self.node_mut(id)?;
        node.clock.skip_to_fill();
        let group_time = node.clock.current_time();
        let children = node.children.clone();
        for child in children {
            self.update_subtree(child, group_time);
        }
        Ok(())
    }

    /// Stop `id` and its descendants.
    ///
    /// The root keeps running and only stops its direct non-group children,
    /// so sibling top-level schedules stay independent.
    pub fn stop(&mut self, id: ClockId) -> Result<()> {
        if id == self.root {
            let children = self.node(id)?.children.clone();
            for child in children {
                if self.nodes.get(child).is_some_and(|n| n.kind != ClockKind::Group) {
                    self.stop_subtree(child);
                }
            }
            return Ok(());
        }
        self.node(id)?;
        self.stop_subtree(id);
        Ok(())
    }

    fn stop_subtree(&mut self, id: ClockId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.clock.stop();
        let children = node.children.clone();
        for child in children {
            self.stop_subtree(child);
        }
    }

    /// Return `id` and its descendants to the never-begun state.
    pub fn reset(&mut self, id: ClockId) -> Result<()> {
        self.node(id)?;
        self.reset_subtree(id);
        Ok(())
    }

    fn reset_subtree(&mut self, id: ClockId) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.clock.reset();
        let children = node.children.clone();
        for child in children {
            self.reset_subtree(child);
        }
    }

    /// Resolve durations for `id` if they are not current.
    fn ensure_timing(&mut self, id: ClockId) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.clock.timing().is_some() {
            return;
        }
        let timeline = Arc::clone(node.clock.timeline());

        let duration = match timeline.duration {
            Duration::Span(span) => Some(span),
            Duration::Forever => None,
            Duration::Automatic => match &timeline.kind {
                TimelineKind::Parallel { .. } => {
                    let children: Vec<Arc<Timeline>> = node
                        .children
                        .iter()
                        .filter_map(|c| self.nodes.get(*c))
                        .map(|n| Arc::clone(n.clock.timeline()))
                        .collect();
                    Timeline::group_duration(children.iter().map(|c| c.as_ref())).span()
                }
                TimelineKind::Animation(animation) => Some(animation.natural_duration()),
                TimelineKind::Plain => None,
            },
        };
        let fill_time = match timeline.repeat_behavior {
            RepeatBehavior::Duration(total) => Some(total),
            _ => duration.and_then(|d| timeline.fill_time(d)),
        };
        let key_times = match (timeline.as_animation(), duration) {
            (Some(animation), Some(d)) => animation.resolve_key_times(d),
            _ => Vec::new(),
        };

        tracing::trace!(
            clock = timeline.display_name(),
            duration = ?duration,
            fill_time = ?fill_time,
            "resolved clock timing"
        );
        if let Some(node) = self.nodes.get_mut(id) {
            node.clock.set_timing(ResolvedTiming { duration, fill_time });
            node.key_times = key_times;
        }
    }

    /// Advance the whole tree to absolute time `now`.
    pub fn update(&mut self, now: Ticks) {
        let root = self.root;
        self.update_subtree(root, now);
    }

    fn update_subtree(&mut self, id: ClockId, parent_time: Ticks) {
        self.ensure_timing(id);
        let starts_now = self
            .nodes
            .get(id)
            .is_some_and(|n| n.clock.state() == ClockState::Stopped && n.clock.begins_on_tick());
        if starts_now {
            self.begin_subtree(id, parent_time);
        }

        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        let was_running = node.clock.state().is_running();
        node.clock.update_from_parent_time(parent_time);
        let state = node.clock.state();
        let group_time = node.clock.current_time();
        let has_started = node.clock.has_started();
        let children = node.children.clone();

        if was_running && state == ClockState::Stopped {
            // Reached the end with a Stop fill.
            for child in children {
                self.stop_subtree(child);
            }
            return;
        }
        if !state.is_running() {
            return;
        }
        for child in children {
            let seeking = self.nodes.get(child).is_some_and(|n| n.clock.is_seeking());
            if has_started || seeking {
                self.update_subtree(child, group_time);
            }
        }
    }

    /// Drain time and state invalidations, children before parents.
    pub fn take_events(&mut self) -> Vec<ClockEvent> {
        let mut order = Vec::new();
        self.collect_post_order(self.root, &mut order);
        let mut events = Vec::new();
        for id in order {
            if id == self.root {
                continue;
            }
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            let PendingEvents {
                time_invalidated,
                state_invalidated,
                ..
            } = node.clock.take_pending();
            let name = node.clock.timeline().display_name().to_string();
            if time_invalidated {
                events.push(ClockEvent::CurrentTimeInvalidated {
                    clock: id,
                    name: name.clone(),
                    current_time: node.clock.current_time(),
                    progress: node.clock.progress(),
                });
            }
            if state_invalidated {
                events.push(ClockEvent::CurrentStateInvalidated {
                    clock: id,
                    name,
                    state: node.clock.state(),
                });
            }
        }
        events
    }

    /// Drain completions, children before parents.
    pub fn take_completed(&mut self) -> Vec<ClockEvent> {
        let root = self.root;
        let mut order = Vec::new();
        self.collect_post_order(root, &mut order);
        order
            .into_iter()
            .filter(|id| *id != root)
            .filter_map(|id| {
                let node = self.nodes.get_mut(id)?;
                node.clock.take_completed().then(|| ClockEvent::Completed {
                    clock: id,
                    name: node.clock.timeline().display_name().to_string(),
                })
            })
            .collect()
    }

    /// Human-readable rendering of the attached tree.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: ClockId, depth: usize, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        let clock = &node.clock;
        let _ = writeln!(
            out,
            "{:indent$}{} '{}' time={} progress={:.3} begin={} state={}{}{}",
            "",
            node.kind.label(),
            clock.timeline().display_name(),
            clock.current_time(),
            clock.progress(),
            clock.timeline().begin_time,
            clock.state().letter(),
            if clock.is_paused() { " paused" } else { "" },
            if clock.is_descending() { " rev" } else { "" },
            indent = depth * 2,
        );
        for child in &node.children {
            self.dump_node(*child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::FillBehavior;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn started_tree() -> ClockTree {
        let mut tree = ClockTree::new();
        tree.begin_root(Ticks::ZERO);
        tree.update(Ticks::ZERO);
        tree
    }

    fn attach(tree: &mut ClockTree, timeline: Timeline) -> ClockId {
        let id = tree.allocate(Arc::new(timeline)).unwrap();
        tree.add_child(tree.root(), id).unwrap();
        id
    }

    #[test]
    fn test_allocate_builds_subtree() {
        let mut tree = ClockTree::new();
        let group = tree
            .allocate(Arc::new(
                Timeline::parallel()
                    .child(Timeline::plain().duration_millis(1))
                    .child(Timeline::plain().duration_millis(2)),
            ))
            .unwrap();
        let node = tree.get(group).unwrap();
        assert_eq!(node.kind(), ClockKind::Group);
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.parent(), None);
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_allocate_rejects_invalid_timeline() {
        let mut tree = ClockTree::new();
        let result = tree.allocate(Arc::new(Timeline::plain().speed(0.0)));
        assert_eq!(result, Err(TimingError::InvalidSpeedRatio(0.0)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_add_child_errors() {
        let mut tree = started_tree();
        let plain = tree.allocate(Arc::new(Timeline::plain())).unwrap();
        let other = tree.allocate(Arc::new(Timeline::plain())).unwrap();
        assert_eq!(tree.add_child(plain, other), Err(TimingError::NotAGroup(plain)));
        assert_eq!(tree.add_child(tree.root(), tree.root()), Err(TimingError::RootClock));

        tree.add_child(tree.root(), plain).unwrap();
        assert_eq!(
            tree.add_child(tree.root(), plain),
            Err(TimingError::AlreadyAttached(plain))
        );
    }

    #[test]
    fn test_add_child_rejects_cycles() {
        let mut tree = ClockTree::new();
        let outer = tree
            .allocate(Arc::new(Timeline::parallel().child(Timeline::parallel())))
            .unwrap();
        let inner = tree.get(outer).unwrap().children()[0];
        assert_eq!(
            tree.add_child(inner, outer),
            Err(TimingError::AlreadyAttached(outer))
        );
    }

    #[test]
    fn test_child_anchored_at_group_time() {
        let mut tree = started_tree();
        tree.update(Ticks(500));
        let id = attach(&mut tree, Timeline::plain().duration(Duration::Span(Ticks(1000))));
        assert_eq!(tree.clock(id).unwrap().root_parent_time(), Ticks(500));

        tree.update(Ticks(750));
        assert_eq!(tree.clock(id).unwrap().current_time(), Ticks(250));
    }

    #[test]
    fn test_nested_groups_compose_time() {
        let mut tree = started_tree();
        let group = attach(
            &mut tree,
            Timeline::parallel()
                .begin_at(Ticks(100))
                .speed(2.0)
                .duration(Duration::Forever)
                .child(Timeline::plain().begin_at(Ticks(200)).duration(Duration::Span(Ticks(10_000)))),
        );
        let leaf = tree.get(group).unwrap().children()[0];

        tree.update(Ticks(150));
        // Group local 100, child not yet begun in its own space.
        assert_eq!(tree.clock(group).unwrap().current_time(), Ticks(100));
        assert!(!tree.clock(leaf).unwrap().has_started());

        tree.update(Ticks(400));
        assert_eq!(tree.clock(group).unwrap().current_time(), Ticks(600));
        assert_eq!(tree.clock(leaf).unwrap().current_time(), Ticks(400));
    }

    #[test]
    fn test_group_automatic_duration_is_longest_child() {
        let mut tree = started_tree();
        let group = attach(
            &mut tree,
            Timeline::parallel()
                .child(Timeline::plain().duration(Duration::Span(Ticks(300))))
                .child(
                    Timeline::plain()
                        .begin_at(Ticks(100))
                        .duration(Duration::Span(Ticks(400)))
                        .repeat(RepeatBehavior::Count(2.0)),
                ),
        );
        let timing = tree.clock(group).unwrap().timing().unwrap();
        assert_eq!(timing.duration, Some(Ticks(900)));
        assert_eq!(timing.fill_time, Some(Ticks(900)));

        tree.update(Ticks(950));
        assert_eq!(tree.clock(group).unwrap().state(), ClockState::Filling);
    }

    #[test]
    fn test_group_paused_freezes_children() {
        let mut tree = started_tree();
        let group = attach(
            &mut tree,
            Timeline::parallel().child(Timeline::plain().duration(Duration::Span(Ticks(10_000)))),
        );
        let leaf = tree.get(group).unwrap().children()[0];
        tree.update(Ticks(100));
        tree.pause(group).unwrap();
        tree.update(Ticks(900));
        assert_eq!(tree.clock(leaf).unwrap().current_time(), Ticks(100));
        tree.resume(group).unwrap();
        tree.update(Ticks(1000));
        tree.update(Ticks(1100));
        assert_eq!(tree.clock(leaf).unwrap().current_time(), Ticks(200));
    }

    #[test]
    fn test_group_seek_moves_children() {
        let mut tree = started_tree();
        let group = attach(
            &mut tree,
            Timeline::parallel().duration(Duration::Forever).child(Timeline::plain().duration(Duration::Span(Ticks(1000)))),
        );
        let leaf = tree.get(group).unwrap().children()[0];
        tree.update(Ticks(2000));
        assert_eq!(tree.clock(leaf).unwrap().state(), ClockState::Filling);

        tree.seek(group, Ticks(250)).unwrap();
        tree.update(Ticks(2100));
        let clock = tree.clock(leaf).unwrap();
        assert_eq!(clock.state(), ClockState::Active);
        assert!(approx_eq(clock.progress(), 0.25));
    }

    #[test]
    fn test_fill_stop_group_stops_children() {
        let mut tree = started_tree();
        let group = attach(
            &mut tree,
            Timeline::parallel()
                .duration(Duration::Span(Ticks(500)))
                .fill(FillBehavior::Stop)
                .child(Timeline::plain().duration(Duration::Forever)),
        );
        let leaf = tree.get(group).unwrap().children()[0];
        tree.update(Ticks(600));
        assert_eq!(tree.clock(group).unwrap().state(), ClockState::Stopped);
        assert_eq!(tree.clock(leaf).unwrap().state(), ClockState::Stopped);
    }

    #[test]
    fn test_stop_group_stops_children() {
        let mut tree = started_tree();
        let group = attach(
            &mut tree,
            Timeline::parallel().child(Timeline::plain().duration(Duration::Forever)),
        );
        let leaf = tree.get(group).unwrap().children()[0];
        tree.update(Ticks(10));
        tree.stop(group).unwrap();
        assert!(tree.clock(leaf).unwrap().was_stopped());
    }

    #[test]
    fn test_root_stop_spares_groups() {
        let mut tree = started_tree();
        let group = attach(&mut tree, Timeline::parallel().duration(Duration::Forever));
        let plain = attach(&mut tree, Timeline::plain().duration(Duration::Forever));
        tree.stop(tree.root()).unwrap();

        assert_eq!(tree.clock(tree.root()).unwrap().state(), ClockState::Active);
        assert_eq!(tree.clock(group).unwrap().state(), ClockState::Active);
        assert_eq!(tree.clock(plain).unwrap().state(), ClockState::Stopped);
    }

    #[test]
    fn test_begin_restarts_children() {
        let mut tree = started_tree();
        let group = attach(
            &mut tree,
            Timeline::parallel().child(Timeline::plain().duration(Duration::Span(Ticks(1000)))),
        );
        let leaf = tree.get(group).unwrap().children()[0];
        tree.update(Ticks(800));
        tree.begin(group).unwrap();
        tree.update(Ticks(900));
        assert_eq!(tree.clock(leaf).unwrap().current_time(), Ticks(100));
    }

    #[test]
    fn test_begin_on_tick_for_detached_group() {
        let mut tree = started_tree();
        let group = tree
            .allocate(Arc::new(
                Timeline::parallel().child(Timeline::plain().duration(Duration::Span(Ticks(1000)))),
            ))
            .unwrap();
        let leaf = tree.get(group).unwrap().children()[0];
        tree.reset(tree.root()).unwrap();
        tree.begin_on_tick(tree.root()).unwrap();
        tree.add_child(tree.root(), group).unwrap();
        tree.begin_on_tick(group).unwrap();

        tree.update(Ticks(300));
        tree.update(Ticks(400));
        assert_eq!(tree.clock(leaf).unwrap().current_time(), Ticks(100));
    }

    #[test]
    fn test_remove_returns_subtree() {
        let mut tree = started_tree();
        let group = attach(&mut tree, Timeline::parallel().child(Timeline::plain()));
        let leaf = tree.get(group).unwrap().children()[0];
        let removed = tree.remove(group).unwrap();
        assert_eq!(removed, vec![leaf, group]);
        assert!(!tree.contains(group));
        assert!(tree.get(tree.root()).unwrap().children().is_empty());
        assert_eq!(tree.remove(tree.root()), Err(TimingError::RootClock));
        assert_eq!(tree.remove(group), Err(TimingError::UnknownClock(group)));
    }

    #[test]
    fn test_events_children_first() {
        let mut tree = started_tree();
        let group = attach(
            &mut tree,
            Timeline::parallel()
                .named("outer")
                .child(Timeline::plain().named("inner").duration(Duration::Span(Ticks(100)))),
        );
        tree.take_events();
        tree.update(Ticks(100));

        let events = tree.take_events();
        let names: Vec<&str> = events.iter().map(|e| e.name()).collect();
        assert_eq!(names.first(), Some(&"inner"));
        assert_eq!(names.last(), Some(&"outer"));

        tree.update(Ticks(200));
        let completed = tree.take_completed();
        assert!(completed.iter().any(|e| e.clock() == group));
        let inner_pos = completed.iter().position(|e| e.name() == "inner");
        let outer_pos = completed.iter().position(|e| e.name() == "outer");
        assert!(inner_pos < outer_pos);
    }

    #[test]
    fn test_skip_to_fill_carries_children() {
        let mut tree = started_tree();
        let group = attach(
            &mut tree,
            Timeline::parallel().child(Timeline::plain().duration(Duration::Span(Ticks(700)))),
        );
        let leaf = tree.get(group).unwrap().children()[0];
        tree.update(Ticks(10));
        tree.skip_to_fill(group).unwrap();
        assert_eq!(tree.clock(group).unwrap().state(), ClockState::Filling);
        assert_eq!(tree.clock(leaf).unwrap().current_time(), Ticks(700));
        assert!(approx_eq(tree.clock(leaf).unwrap().progress(), 1.0));
    }

    #[test]
    fn test_dump_lists_tree() {
        let mut tree = started_tree();
        let group = attach(&mut tree, Timeline::parallel().named("board").child(Timeline::plain().named("leaf")));
        tree.pause(group).unwrap();
        let dump = tree.dump();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Group 'root'"));
        assert!(lines[1].starts_with("  Group 'board'"));
        assert!(lines[1].ends_with("state=A paused"));
        assert!(lines[2].starts_with("    Clock 'leaf'"));
    }

    #[test]
    fn test_dump_marks_reversing_clock() {
        let mut tree = started_tree();
        attach(
            &mut tree,
            Timeline::plain()
                .named("swing")
                .duration(Duration::Span(Ticks(100)))
                .auto_reverse(true)
                .repeat(RepeatBehavior::Forever),
        );
        tree.update(Ticks(50));
        assert!(tree.dump().lines().any(|l| l.contains("'swing'") && !l.ends_with(" rev")));
        tree.update(Ticks(150));
        assert!(tree.dump().lines().any(|l| l.contains("'swing'") && l.ends_with("state=A rev")));
    }
}
