//! ABOUTME: Leaky-bucket debouncing of per-frame motion scores
//! ABOUTME: Turns noisy scores into a stable sustained-motion signal

use crate::MotionScore;
use tracing::debug;

/// Leaky-bucket debouncer turning per-frame motion scores into a stable
/// "motion sustained" signal.
///
/// Motion frames raise the counter by one, quiet frames lower it by one
/// (floored at zero). Motion is sustained while the counter is strictly above
/// the alarm threshold. Crossing the threshold does not reset the counter;
/// only [`MotionDebouncer::reset`] does.
#[derive(Debug, Clone)]
pub struct MotionDebouncer {
    motion_threshold: MotionScore,
    alarm_threshold: u32,
    counter: u32,
}

impl MotionDebouncer {
    pub fn new(motion_threshold: MotionScore, alarm_threshold: u32) -> Self {
        Self {
            motion_threshold,
            alarm_threshold,
            counter: 0,
        }
    }

    /// Feed one frame's score and report whether motion is sustained
    pub fn update(&mut self, score: MotionScore) -> bool {
        if score > self.motion_threshold {
            self.counter = self.counter.saturating_add(1);
        } else {
            self.counter = self.counter.saturating_sub(1);
        }
        self.is_sustained()
    }

    pub fn is_sustained(&self) -> bool {
        self.counter > self.alarm_threshold
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn alarm_threshold(&self) -> u32 {
        self.alarm_threshold
    }

    pub fn reset(&mut self) {
        debug!(counter = self.counter, "Resetting motion debouncer");
        self.counter = 0;
    }
}
