//! ABOUTME: Detection controller state machine driven once per frame
//! ABOUTME: Armed/disarmed mode, rolling baseline, face-gated snapshots, alarm escalation

use fw_capture::{SnapshotStore, SnapshotThrottle};
use fw_config::Config;
use fw_notify::{AlertDispatcher, ArmedMode};
use fw_vision::{FaceDetector, FaceRegion, Frame, FrameDifferencer, MotionDebouncer, MotionScore};
use fw_vision::image::GrayImage;
use metrics::gauge;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Operating mode of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Raw feed only, no processing
    Disarmed,
    /// Full pipeline
    Armed,
}

/// What a display surface would show for this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameView {
    Raw,
    MotionMask,
}

/// Per-frame report, useful for display and diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameOutcome {
    pub mode: Mode,
    pub view: FrameView,
    /// Motion score against the baseline; `None` while disarmed
    pub score: Option<MotionScore>,
    pub counter: u32,
    pub sustained: bool,
    /// Faces found this frame (only looked for while sustained)
    pub faces: usize,
    /// Files in the snapshot batch handed off this frame, if any
    pub snapshot_files: Option<usize>,
    pub alarm_launched: bool,
}

impl FrameOutcome {
    fn disarmed() -> Self {
        Self {
            mode: Mode::Disarmed,
            view: FrameView::Raw,
            score: None,
            counter: 0,
            sustained: false,
            faces: 0,
            snapshot_files: None,
            alarm_launched: false,
        }
    }
}

/// Top-level detection state machine.
///
/// Owns the reference frame, debouncer, and throttle exclusively. The armed
/// flag is shared with alert tasks, which only read it.
pub struct DetectionController {
    differencer: FrameDifferencer,
    debouncer: MotionDebouncer,
    throttle: SnapshotThrottle,
    store: SnapshotStore,
    detector: Box<dyn FaceDetector>,
    dispatcher: AlertDispatcher,
    armed: ArmedMode,
    reference: Option<GrayImage>,
    tasks: Vec<JoinHandle<()>>,
}

impl DetectionController {
    /// Assemble a controller; it starts disarmed
    pub fn new(
        differencer: FrameDifferencer,
        debouncer: MotionDebouncer,
        throttle: SnapshotThrottle,
        store: SnapshotStore,
        detector: Box<dyn FaceDetector>,
        dispatcher: AlertDispatcher,
    ) -> Self {
        let armed = dispatcher.armed_mode().clone();
        armed.set(false);

        info!(
            detector = detector.name(),
            alarm_threshold = debouncer.alarm_threshold(),
            snapshot_interval_secs = throttle.interval().as_secs(),
            "Detection controller created"
        );

        Self {
            differencer,
            debouncer,
            throttle,
            store,
            detector,
            dispatcher,
            armed,
            reference: None,
            tasks: Vec::new(),
        }
    }

    /// Build from configuration; the snapshot cool-down starts at `start`
    pub fn from_config(
        config: &Config,
        detector: Box<dyn FaceDetector>,
        dispatcher: AlertDispatcher,
        start: Instant,
    ) -> Self {
        let detection = &config.detection;
        Self::new(
            FrameDifferencer::new(detection.blur_sigma, detection.pixel_threshold),
            MotionDebouncer::new(detection.motion_threshold, detection.alarm_threshold),
            SnapshotThrottle::primed_at(config.snapshot.interval(), start),
            SnapshotStore::new(&config.snapshot.dir),
            detector,
            dispatcher,
        )
    }

    pub fn mode(&self) -> Mode {
        if self.armed.is_armed() {
            Mode::Armed
        } else {
            Mode::Disarmed
        }
    }

    pub fn counter(&self) -> u32 {
        self.debouncer.counter()
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    /// Alert tasks launched by this controller that have not finished
    pub fn in_flight_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    /// Flip between armed and disarmed. Clears the debouncer either way;
    /// arming also takes `current` as the new baseline. The snapshot
    /// throttle is left alone.
    pub fn toggle(&mut self, current: &Frame) -> Mode {
        self.debouncer.reset();

        if self.armed.is_armed() {
            self.armed.set(false);
            info!("Disarmed");
        } else {
            self.reference = Some(self.differencer.preprocess(current));
            self.armed.set(true);
            info!("Armed");
        }

        gauge!("detection_armed").set(if self.armed.is_armed() { 1.0 } else { 0.0 });
        self.mode()
    }

    /// Run one frame through the pipeline
    pub fn process_frame(&mut self, frame: &Frame, now: Instant) -> FrameOutcome {
        self.tasks.retain(|task| !task.is_finished());

        if !self.armed.is_armed() {
            return FrameOutcome::disarmed();
        }

        let current = self.differencer.preprocess(frame);
        let score = match &self.reference {
            Some(reference) => match self.differencer.score(reference, &current) {
                Ok(score) => score,
                Err(e) => {
                    warn!(error = %e, "Baseline does not match frame, restarting baseline");
                    0
                }
            },
            None => 0,
        };
        self.reference = Some(current);

        let sustained = self.debouncer.update(score);
        let mut outcome = FrameOutcome {
            mode: Mode::Armed,
            view: FrameView::MotionMask,
            score: Some(score),
            counter: self.debouncer.counter(),
            sustained,
            faces: 0,
            snapshot_files: None,
            alarm_launched: false,
        };

        if sustained {
            let faces = self.detect_faces(frame);
            outcome.faces = faces.len();

            if !faces.is_empty() && self.throttle.allow(now) {
                outcome.snapshot_files = self.capture_and_notify(frame, &faces, now);
            }
        }

        if self.debouncer.is_sustained() && !self.dispatcher.alarm_state().is_sounding() {
            if let Some(task) = self.dispatcher.launch_alarm() {
                self.tasks.push(task);
                outcome.alarm_launched = true;
            }
        }

        debug!(
            score = score,
            counter = outcome.counter,
            faces = outcome.faces,
            "Frame processed"
        );
        outcome
    }

    /// Disarm and hand back the unfinished alert tasks. Callers may drop
    /// them; notification tasks keep running detached.
    pub fn shutdown(&mut self) -> Vec<JoinHandle<()>> {
        self.armed.set(false);
        self.tasks.retain(|task| !task.is_finished());
        info!(in_flight = self.tasks.len(), "Detection controller shut down");
        std::mem::take(&mut self.tasks)
    }

    fn detect_faces(&mut self, frame: &Frame) -> Vec<FaceRegion> {
        match self.detector.detect(frame) {
            Ok(faces) => faces,
            Err(e) => {
                warn!(detector = self.detector.name(), error = %e, "Face detection failed, treating as no faces");
                Vec::new()
            }
        }
    }

    /// Persist and send one batch. The cool-down starts once a batch is
    /// written or a write fails; a batch with every face outside the frame
    /// leaves it untouched.
    fn capture_and_notify(
        &mut self,
        frame: &Frame,
        faces: &[FaceRegion],
        now: Instant,
    ) -> Option<usize> {
        let batch = match self.store.capture(frame, faces) {
            Ok(batch) => batch,
            Err(e) => {
                self.throttle.mark(now);
                error!(
                    dir = %self.store.dir().display(),
                    error = %e,
                    "Failed to persist snapshots, skipping alert"
                );
                return None;
            }
        };

        if batch.is_empty() {
            debug!("No face inside the frame, cool-down not started");
            return None;
        }
        self.throttle.mark(now);

        let files = batch.len();
        let triggered_at = batch.captured_at();
        let task = self.dispatcher.dispatch_notification(batch, triggered_at);
        self.tasks.push(task);
        Some(files)
    }
}
