//! Hover/tooltip state machine.
//!
//! Pure transitions only; the controller turns [`HoverCommand`]s into timers
//! and tooltip notifications.

use crate::settings::HoverTiming;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HoverPhase {
    Idle,
    PendingShow { index: usize, generation: u64 },
    Shown { index: usize },
}

/// What the controller must do after a pointer transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverCommand {
    /// Cancel any running timer and arm a new one.
    Schedule { generation: u64, delay: Duration },
    /// Cancel any running timer and hide the tooltip.
    Hide,
    /// Already tracking this index.
    Keep,
}

#[derive(Debug)]
pub struct HoverMachine {
    phase: HoverPhase,
    timing: HoverTiming,
    generation: u64,
    last_shown_at: Option<Instant>,
}

impl HoverMachine {
    pub fn new(timing: HoverTiming) -> Self {
        Self {
            phase: HoverPhase::Idle,
            timing,
            generation: 0,
            last_shown_at: None,
        }
    }

    pub fn phase(&self) -> HoverPhase {
        self.phase
    }

    pub fn set_timing(&mut self, timing: HoverTiming) {
        self.timing = timing;
    }

    pub fn hovered_index(&self) -> Option<usize> {
        match self.phase {
            HoverPhase::Idle => None,
            HoverPhase::PendingShow { index, .. } | HoverPhase::Shown { index } => Some(index),
        }
    }

    /// Show delay for a tooltip requested at `now`.
    pub fn delay_at(&self, now: Instant) -> Duration {
        match self.last_shown_at {
            Some(shown) if now.saturating_duration_since(shown) <= self.timing.warm_window() => {
                Duration::ZERO
            }
            _ => self.timing.cold_delay(),
        }
    }

    /// The renderer reported the pointer over `index`.
    pub fn pointer_over(&mut self, index: usize, valid_count: usize, now: Instant) -> HoverCommand {
        if index >= valid_count {
            return self.pointer_out();
        }
        if self.hovered_index() == Some(index) {
            return HoverCommand::Keep;
        }
        self.generation += 1;
        let delay = self.delay_at(now);
        self.phase = HoverPhase::PendingShow {
            index,
            generation: self.generation,
        };
        HoverCommand::Schedule {
            generation: self.generation,
            delay,
        }
    }

    /// The pointer left the hovered point.
    pub fn pointer_out(&mut self) -> HoverCommand {
        self.generation += 1;
        self.phase = HoverPhase::Idle;
        HoverCommand::Hide
    }

    /// A show timer fired. Returns the index to show, or `None` if the timer
    /// is stale.
    pub fn fire(&mut self, generation: u64, now: Instant) -> Option<usize> {
        match self.phase {
            HoverPhase::PendingShow {
                index,
                generation: pending,
            } if pending == generation => {
                self.phase = HoverPhase::Shown { index };
                self.last_shown_at = Some(now);
                Some(index)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COUNT: usize = 10;

    fn machine() -> HoverMachine {
        HoverMachine::new(HoverTiming::default())
    }

    fn scheduled(command: HoverCommand) -> (u64, Duration) {
        match command {
            HoverCommand::Schedule { generation, delay } => (generation, delay),
            other => panic!("Expected Schedule, got {other:?}"),
        }
    }

    #[test]
    fn test_first_hover_uses_cold_delay() {
        let mut hover = machine();
        let (generation, delay) = scheduled(hover.pointer_over(3, COUNT, Instant::now()));
        assert_eq!(delay, Duration::from_millis(150));
        assert_eq!(hover.phase(), HoverPhase::PendingShow { index: 3, generation });
    }

    #[test]
    fn test_warm_hover_within_window_is_immediate() {
        let start = Instant::now();
        let mut hover = machine();
        let (generation, _) = scheduled(hover.pointer_over(1, COUNT, start));
        let shown_at = start + Duration::from_millis(150);
        assert_eq!(hover.fire(generation, shown_at), Some(1));

        let (_, delay) = scheduled(hover.pointer_over(2, COUNT, shown_at + Duration::from_millis(500)));
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn test_hover_after_window_is_cold_again() {
        let start = Instant::now();
        let mut hover = machine();
        let (generation, _) = scheduled(hover.pointer_over(1, COUNT, start));
        let shown_at = start + Duration::from_millis(150);
        hover.fire(generation, shown_at);

        let (_, delay) = scheduled(hover.pointer_over(2, COUNT, shown_at + Duration::from_millis(801)));
        assert_eq!(delay, Duration::from_millis(150));
    }

    #[test]
    fn test_same_index_is_kept() {
        let mut hover = machine();
        scheduled(hover.pointer_over(4, COUNT, Instant::now()));
        assert_eq!(hover.pointer_over(4, COUNT, Instant::now()), HoverCommand::Keep);
    }

    #[test]
    fn test_out_of_range_index_hides() {
        let mut hover = machine();
        scheduled(hover.pointer_over(4, COUNT, Instant::now()));
        assert_eq!(hover.pointer_over(COUNT, COUNT, Instant::now()), HoverCommand::Hide);
        assert_eq!(hover.phase(), HoverPhase::Idle);
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let now = Instant::now();
        let mut hover = machine();
        let (first, _) = scheduled(hover.pointer_over(1, COUNT, now));
        let (second, _) = scheduled(hover.pointer_over(2, COUNT, now));
        assert_eq!(hover.fire(first, now), None);
        assert_eq!(hover.fire(second, now), Some(2));
        assert_eq!(hover.phase(), HoverPhase::Shown { index: 2 });
    }

    #[test]
    fn test_pointer_out_cancels_pending_show() {
        let now = Instant::now();
        let mut hover = machine();
        let (generation, _) = scheduled(hover.pointer_over(1, COUNT, now));
        assert_eq!(hover.pointer_out(), HoverCommand::Hide);
        assert_eq!(hover.fire(generation, now), None);
        assert_eq!(hover.hovered_index(), None);
    }
}
