//! Draw coalescing.
//!
//! The scheduler owns no timers or tasks. The controller asks it what to do
//! at three points: when new points arrive ([`DrawScheduler::request`]), when
//! a queued pass starts ([`DrawScheduler::begin`]) and when a render call
//! settles ([`DrawScheduler::finish`]).

use scatterview_core::Point;
use serde::Serialize;
use std::sync::Arc;

/// Shared, read-only point list handed to the renderer.
pub type PointList = Arc<[Point]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DrawPhase {
    /// Nothing queued, nothing rendering.
    Idle,
    /// A pass is queued but has not started.
    Scheduled,
    /// A render call is executing.
    Drawing,
    /// A render call is executing and another pass is queued.
    DrawingScheduled,
}

#[derive(Debug)]
pub struct DrawScheduler {
    phase: DrawPhase,
    pending: Option<PointList>,
    renders_started: u64,
}

impl Default for DrawScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawScheduler {
    pub fn new() -> Self {
        Self {
            phase: DrawPhase::Idle,
            pending: None,
            renders_started: 0,
        }
    }

    pub fn phase(&self) -> DrawPhase {
        self.phase
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn renders_started(&self) -> u64 {
        self.renders_started
    }

    /// Store `points` as the latest update, replacing any unsent one.
    ///
    /// Returns `true` when the caller must queue a pass.
    pub fn request(&mut self, points: PointList) -> bool {
        self.pending = Some(points);
        match self.phase {
            DrawPhase::Idle => {
                self.phase = DrawPhase::Scheduled;
                true
            }
            DrawPhase::Drawing => {
                self.phase = DrawPhase::DrawingScheduled;
                true
            }
            DrawPhase::Scheduled | DrawPhase::DrawingScheduled => false,
        }
    }

    /// Start a queued pass.
    ///
    /// Returns the points to render, or `None` when a render is already in
    /// flight (the update stays pending) or nothing is pending.
    pub fn begin(&mut self) -> Option<PointList> {
        match self.phase {
            DrawPhase::Drawing | DrawPhase::DrawingScheduled => {
                self.phase = DrawPhase::Drawing;
                None
            }
            DrawPhase::Idle | DrawPhase::Scheduled => match self.pending.take() {
                Some(points) => {
                    self.phase = DrawPhase::Drawing;
                    self.renders_started += 1;
                    Some(points)
                }
                None => {
                    self.phase = DrawPhase::Idle;
                    None
                }
            },
        }
    }

    /// Record that the in-flight render completed or failed.
    ///
    /// Returns `true` when an update arrived during the render and no pass
    /// is queued for it yet; the caller must queue one.
    pub fn finish(&mut self) -> bool {
        match self.phase {
            DrawPhase::DrawingScheduled => {
                self.phase = DrawPhase::Scheduled;
                false
            }
            DrawPhase::Drawing if self.pending.is_some() => {
                self.phase = DrawPhase::Scheduled;
                true
            }
            DrawPhase::Drawing => {
                self.phase = DrawPhase::Idle;
                false
            }
            DrawPhase::Idle | DrawPhase::Scheduled => false,
        }
    }

    /// Drop pending work, e.g. on teardown.
    pub fn clear(&mut self) {
        self.pending = None;
        self.phase = DrawPhase::Idle;
    }
}
