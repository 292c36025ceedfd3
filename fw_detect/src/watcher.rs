//! ABOUTME: Frame acquisition loop that drives the detection controller
//! ABOUTME: Reads frames, normalizes width, and polls user controls between frames

use crate::controller::{DetectionController, Mode};
use fw_capture::FrameSource;
use fw_config::ControlsConfig;
use fw_core::Result;
use metrics::counter;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tracing::{error, info, trace, warn};

/// User commands delivered to the loop between frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlInput {
    Toggle,
    Quit,
}

impl ControlInput {
    /// Map a key press to a command using the configured bindings
    pub fn from_key(key: char, controls: &ControlsConfig) -> Option<Self> {
        if key == controls.toggle() {
            Some(Self::Toggle)
        } else if key == controls.quit() {
            Some(Self::Quit)
        } else {
            None
        }
    }
}

/// Counters for one run of the loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub frames: u64,
    pub armed_frames: u64,
    pub alarms: u64,
    pub snapshot_batches: u64,
}

/// Single-threaded watch loop. Owns the frame source and the controller;
/// alert work happens on tasks the controller launches.
pub struct Watcher<S: FrameSource> {
    source: S,
    controller: DetectionController,
    controls: Receiver<ControlInput>,
    poll_interval: Duration,
    frame_width: Option<u32>,
    summary: WatchSummary,
}

impl<S: FrameSource> Watcher<S> {
    pub fn new(
        source: S,
        controller: DetectionController,
        controls: Receiver<ControlInput>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            controller,
            controls,
            poll_interval,
            frame_width: None,
            summary: WatchSummary::default(),
        }
    }

    /// Resize every frame to this width before processing
    pub fn with_frame_width(mut self, width: u32) -> Self {
        self.frame_width = Some(width);
        self
    }

    pub fn controller(&self) -> &DetectionController {
        &self.controller
    }

    /// Run until the user quits or the source fails.
    ///
    /// The system is disarmed on the way out either way, so a sounding alarm
    /// stops at its next cycle. In-flight notifications are not awaited.
    pub fn run(mut self) -> Result<WatchSummary> {
        info!(source = self.source.name(), "Watch loop started");
        let mut controls_open = true;

        loop {
            let frame = match self.source.read() {
                Ok(frame) => frame,
                Err(e) => {
                    error!(source = self.source.name(), error = %e, "Frame acquisition failed, stopping");
                    self.controller.shutdown();
                    return Err(e);
                }
            };

            let frame = match self.frame_width {
                Some(width) if frame.width() != width => frame.resize_to_width(width),
                _ => frame,
            };

            let outcome = self.controller.process_frame(&frame, Instant::now());
            self.summary.frames += 1;
            counter!("frames_processed_total").increment(1);
            if outcome.mode == Mode::Armed {
                self.summary.armed_frames += 1;
            }
            if outcome.alarm_launched {
                self.summary.alarms += 1;
            }
            if outcome.snapshot_files.is_some() {
                self.summary.snapshot_batches += 1;
            }
            trace!(view = ?outcome.view, score = ?outcome.score, "Frame handled");

            let input = if controls_open {
                match self.controls.recv_timeout(self.poll_interval) {
                    Ok(input) => Some(input),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => {
                        warn!("Control input closed, continuing without controls");
                        controls_open = false;
                        None
                    }
                }
            } else {
                std::thread::sleep(self.poll_interval);
                None
            };

            match input {
                Some(ControlInput::Toggle) => {
                    let mode = self.controller.toggle(&frame);
                    info!(mode = ?mode, "Mode toggled");
                }
                Some(ControlInput::Quit) => {
                    let in_flight = self.controller.in_flight_tasks();
                    self.controller.shutdown();
                    info!(
                        frames = self.summary.frames,
                        in_flight = in_flight,
                        "Quit requested, watch loop stopped"
                    );
                    return Ok(self.summary);
                }
                None => {}
            }
        }
    }
}
