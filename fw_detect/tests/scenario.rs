//! End-to-end runs of the watch loop over scripted frames

use async_trait::async_trait;
use fw_capture::{FrameSource, SnapshotStore, SnapshotThrottle};
use fw_core::{Error, Result};
use fw_detect::{ControlInput, DetectionController, Mode, Watcher};
use fw_notify::{
    AlertDispatcher, AlertMessage, ArmedMode, DispatcherConfig, Notifier,
    Result as NotifyResult, SilentAudioSink,
};
use fw_vision::utils::{create_solid_frame, create_test_frame_with_motion};
use fw_vision::{FaceDetector, FaceRegion, Frame, FrameDifferencer, MotionDebouncer};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use test_support::scratch_dir;
use tokio::runtime::Handle;

struct ScriptedSource {
    frames: VecDeque<Frame>,
}

impl ScriptedSource {
    fn alternating(count: usize) -> Self {
        let frames = (0..count)
            .map(|i| {
                if i % 2 == 0 {
                    create_solid_frame(64, 48, 64)
                } else {
                    create_test_frame_with_motion(64, 48, 8, 8, 30, 20, 220)
                }
            })
            .collect();
        Self { frames }
    }
}

impl FrameSource for ScriptedSource {
    fn read(&mut self) -> Result<Frame> {
        self.frames
            .pop_front()
            .ok_or_else(|| Error::Capture("script exhausted".to_string()))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct OneFace;

impl FaceDetector for OneFace {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceRegion>> {
        Ok(vec![FaceRegion::new(10, 10, 20, 20)])
    }

    fn name(&self) -> &'static str {
        "one-face"
    }
}

/// Records each alert and whether its attachments existed at send time
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(Vec<PathBuf>, bool)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, msg: &AlertMessage) -> NotifyResult<()> {
        let present = msg.attachments.iter().all(|p| p.exists());
        self.sent
            .lock()
            .unwrap()
            .push((msg.attachments.clone(), present));
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

fn controller(
    snapshot_dir: &std::path::Path,
    notifier: Arc<RecordingNotifier>,
    start: Instant,
) -> DetectionController {
    let dispatcher = AlertDispatcher::new(
        DispatcherConfig {
            alarm_duration: Duration::from_secs(5),
            ..Default::default()
        },
        notifier,
        Arc::new(SilentAudioSink::new(Duration::from_millis(5))),
        ArmedMode::default(),
        Handle::current(),
    );

    DetectionController::new(
        FrameDifferencer::new(0.0, 25),
        MotionDebouncer::new(300, 20),
        SnapshotThrottle::primed_at(Duration::from_secs(5), start),
        SnapshotStore::new(snapshot_dir),
        Box::new(OneFace),
        dispatcher,
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sustained_motion_with_face_alerts_once() {
    let dir = scratch_dir();
    let notifier = Arc::new(RecordingNotifier::default());
    let start = Instant::now();
    let mut controller = controller(dir.path(), notifier.clone(), start);

    let baseline = create_solid_frame(64, 48, 64);
    assert_eq!(controller.toggle(&baseline), Mode::Armed);

    let mut source = ScriptedSource::alternating(26);
    source.frames.pop_front();

    // Cool-down from construction has elapsed by the time motion is seen
    let now = start + Duration::from_secs(10);
    let outcomes: Vec<_> = (0..25)
        .map(|i| {
            let frame = source.read().unwrap();
            controller.process_frame(&frame, now + Duration::from_millis(33 * i))
        })
        .collect();

    assert!(controller.counter() > 20);
    assert_eq!(outcomes.iter().filter(|o| o.sustained).count(), 5);
    assert_eq!(outcomes.iter().filter(|o| o.alarm_launched).count(), 1);
    assert_eq!(controller.dispatcher().alarm_launches(), 1);

    let batches: Vec<_> = outcomes.iter().filter_map(|o| o.snapshot_files).collect();
    assert_eq!(batches, vec![1]);
    assert_eq!(controller.dispatcher().notifications_dispatched(), 1);

    for task in controller.shutdown() {
        task.await.unwrap();
    }

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (paths, present) = &sent[0];
    assert_eq!(paths.len(), 1);
    assert!(*present, "snapshot must exist while the alert is sent");
    assert!(!paths[0].exists(), "snapshot must be removed after sending");
    assert!(!controller.dispatcher().alarm_state().is_sounding());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watcher_stops_on_source_exhaustion() {
    let dir = scratch_dir();
    let notifier = Arc::new(RecordingNotifier::default());
    let controller = controller(dir.path(), notifier.clone(), Instant::now());
    let armed = controller.dispatcher().armed_mode().clone();

    let (tx, rx) = mpsc::channel();
    tx.send(ControlInput::Toggle).unwrap();

    let watcher = Watcher::new(
        ScriptedSource::alternating(30),
        controller,
        rx,
        Duration::from_millis(1),
    );

    let result = tokio::task::spawn_blocking(move || watcher.run())
        .await
        .unwrap();

    assert!(matches!(result, Err(Error::Capture(_))));
    assert!(!armed.is_armed());
    drop(tx);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watcher_quit_disarms_and_returns_summary() {
    let dir = scratch_dir();
    let notifier = Arc::new(RecordingNotifier::default());
    let controller = controller(dir.path(), notifier.clone(), Instant::now());
    let armed = controller.dispatcher().armed_mode().clone();

    let (tx, rx) = mpsc::channel();
    tx.send(ControlInput::Toggle).unwrap();
    tx.send(ControlInput::Quit).unwrap();

    let watcher = Watcher::new(
        ScriptedSource::alternating(10),
        controller,
        rx,
        Duration::from_millis(1),
    )
    .with_frame_width(32);

    let summary = tokio::task::spawn_blocking(move || watcher.run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(summary.frames, 2);
    assert_eq!(summary.armed_frames, 1);
    assert_eq!(summary.alarms, 0);
    assert!(!armed.is_armed());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watcher_without_controls_runs_until_source_ends() {
    let dir = scratch_dir();
    let notifier = Arc::new(RecordingNotifier::default());
    let controller = controller(dir.path(), notifier, Instant::now());

    let (tx, rx) = mpsc::channel::<ControlInput>();
    drop(tx);

    let watcher = Watcher::new(
        ScriptedSource::alternating(4),
        controller,
        rx,
        Duration::from_millis(1),
    );

    let result = tokio::task::spawn_blocking(move || watcher.run())
        .await
        .unwrap();
    assert!(matches!(result, Err(Error::Capture(_))));
}
