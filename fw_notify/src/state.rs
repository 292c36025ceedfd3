//! ABOUTME: Flags shared between the frame loop and alert tasks
//! ABOUTME: Armed mode is written by the loop; alarm state is a single-writer handoff

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Armed/disarmed mode flag.
///
/// Only the detection controller writes it; alarm tasks poll it once per
/// sound cycle for cooperative cancellation.
#[derive(Debug, Clone, Default)]
pub struct ArmedMode(Arc<AtomicBool>);

impl ArmedMode {
    pub fn new(armed: bool) -> Self {
        Self(Arc::new(AtomicBool::new(armed)))
    }

    pub fn is_armed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, armed: bool) {
        self.0.store(armed, Ordering::Release);
    }
}

/// Idle/sounding flag guarding the single alarm task.
///
/// Set by the dispatcher when it launches the alarm, cleared by the alarm
/// task itself when it finishes.
#[derive(Debug, Clone, Default)]
pub struct AlarmState(Arc<AtomicBool>);

impl AlarmState {
    pub fn is_sounding(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Move idle -> sounding; false if an alarm is already sounding
    pub(crate) fn try_begin(&self) -> bool {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn finish(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Returns the alarm to idle when the alarm task ends, including by panic
pub(crate) struct SoundingGuard(pub(crate) AlarmState);

impl Drop for SoundingGuard {
    fn drop(&mut self) {
        self.0.finish();
    }
}
