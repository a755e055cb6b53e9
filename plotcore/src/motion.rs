use std::collections::VecDeque;

use tracing::trace;

use crate::{MachineState, Position};

/// Whether a segment leaves ink on the paper.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum SegmentKind {
    /// Pen down.
    Draw,
    /// Pen up.
    Travel,
}

/// Straight path covered by the tool during one tick.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Segment {
    pub from: Position,
    pub to: Position,
    pub kind: SegmentKind,
}
impl Segment {
    pub fn length(&self) -> f64 {
        self.from.distance_to(self.to)
    }
}

/// Result of advancing the interpolator by one tick.
#[derive(Debug, PartialEq, Copy, Clone)]
pub struct Step {
    pub segment: Segment,
    /// The head target was reached and popped this tick.
    pub arrived: bool,
}

/// FIFO of pending target positions.
///
/// The head of the queue is the active target. An empty queue means the
/// machine is idle. The queue is unbounded; senders are expected to wait for
/// each move to be acknowledged.
#[derive(Debug, Default, Clone)]
pub struct MotionQueue {
    targets: VecDeque<Position>,
}
impl MotionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a target.
    pub fn push(&mut self, target: Position) {
        self.targets.push_back(target);
    }

    /// Drops every pending target, including the active one.
    pub fn clear(&mut self) {
        self.targets.clear();
    }

    /// The active target, if any.
    pub fn head(&self) -> Option<Position> {
        self.targets.front().copied()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Advances the machine position one tick toward the active target.
    ///
    /// The direction is recomputed from the live position every tick, so a
    /// position set externally mid-move re-aims the path. The distance covered
    /// is capped at `speed_limit * dt`; when the target is within that
    /// distance the position snaps onto it and the target is popped.
    ///
    /// # Returns
    ///
    /// - `None` if the queue is empty.
    /// - `Some(step)` describing the segment covered.
    pub fn step(&mut self, state: &mut MachineState, dt: f64) -> Option<Step> {
        let target = self.head()?;
        let from = state.position();
        let kind = if state.pen_down() {
            SegmentKind::Draw
        } else {
            SegmentKind::Travel
        };

        let delta = target - from;
        let distance = delta.norm();
        let max_step = state.speed_limit() * dt;

        let stepped = from + delta * (max_step / distance);
        // A step too small to bring a far-off position any closer still
        // counts as arrival.
        let arrived =
            distance <= max_step || stepped.distance_to(target) >= distance;
        let to = if arrived {
            self.targets.pop_front();
            target
        } else {
            stepped
        };
        state.set_position(to);

        trace!(
            "{} to {}{}",
            match kind {
                SegmentKind::Draw => "line",
                SegmentKind::Travel => "move",
            },
            to,
            if arrived { " (arrived)" } else { "" }
        );

        Some(Step {
            segment: Segment { from, to, kind },
            arrived,
        })
    }
}
