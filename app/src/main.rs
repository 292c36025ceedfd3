use fw_capture::{FrameSource, ImageSequenceSource};
use fw_config::{AlarmConfig, CaptureConfig, Config, ControlsConfig, NotifyConfig};
use fw_core::{telemetry, Error, Result};
use fw_detect::{ControlInput, DetectionController, Watcher};
use fw_notify::{
    AlertDispatcher, ArmedMode, AudioSink, CommandAudioSink, DispatcherConfig, LogNotifier,
    Notifier, SilentAudioSink, SmtpNotifier,
};
use fw_vision::{FaceDetector, NullFaceDetector};
use std::io::BufRead;
use std::process;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Instant;

fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            telemetry::init_tracing("pretty", "facewatch");
            tracing::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    telemetry::init_tracing(config.telemetry.log_format.as_str(), "facewatch");
    tracing::debug!(?config, "Configuration loaded successfully");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .thread_name("facewatch-alerts")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {}", e);
            process::exit(1);
        }
    };

    let result = run(&config, runtime.handle().clone());

    // In-flight alerts are abandoned rather than awaited
    runtime.shutdown_background();

    match result {
        Ok(()) => tracing::info!("facewatch stopped"),
        Err(e) => {
            tracing::error!("facewatch stopped with error: {}", e);
            process::exit(1);
        }
    }
}

fn run(config: &Config, runtime: tokio::runtime::Handle) -> Result<()> {
    let source = open_source(&config.capture)?;
    let detector = build_detector(&config.capture)?;

    let dispatcher = AlertDispatcher::new(
        DispatcherConfig {
            recipient: config.notify.recipient.clone(),
            subject: config.notify.subject.clone(),
            alarm_duration: config.alarm.duration(),
        },
        build_notifier(&config.notify)?,
        build_audio(&config.alarm),
        ArmedMode::default(),
        runtime,
    );

    let controller = DetectionController::from_config(config, detector, dispatcher, Instant::now());

    let (tx, rx) = mpsc::channel();
    spawn_key_reader(config.controls.clone(), tx);

    tracing::info!(
        toggle = %config.controls.toggle(),
        quit = %config.controls.quit(),
        "facewatch ready, disarmed"
    );

    let summary = Watcher::new(source, controller, rx, config.capture.poll_interval())
        .with_frame_width(config.detection.frame_width)
        .run()?;

    tracing::info!(
        frames = summary.frames,
        armed_frames = summary.armed_frames,
        alarms = summary.alarms,
        snapshot_batches = summary.snapshot_batches,
        "Watch summary"
    );
    Ok(())
}

fn open_source(config: &CaptureConfig) -> Result<Box<dyn FrameSource>> {
    if let Some(dir) = &config.source_dir {
        return Ok(Box::new(ImageSequenceSource::open(dir, config.loop_sequence)?));
    }

    #[cfg(feature = "heavy_opencv")]
    {
        Ok(Box::new(fw_capture::CameraSource::open(config.device)?))
    }

    #[cfg(not(feature = "heavy_opencv"))]
    {
        Err(Error::Config(
            "No frame source: set capture.source_dir or build with heavy_opencv".to_string(),
        ))
    }
}

fn build_detector(config: &CaptureConfig) -> Result<Box<dyn FaceDetector>> {
    match &config.cascade_path {
        #[cfg(feature = "heavy_opencv")]
        Some(path) => Ok(Box::new(fw_vision::HaarCascadeDetector::new(path)?)),
        #[cfg(not(feature = "heavy_opencv"))]
        Some(path) => {
            tracing::warn!(cascade = %path, "Face detection needs heavy_opencv, snapshots disabled");
            Ok(Box::new(NullFaceDetector))
        }
        None => {
            tracing::warn!("No face cascade configured, snapshots disabled");
            Ok(Box::new(NullFaceDetector))
        }
    }
}

fn build_notifier(config: &NotifyConfig) -> Result<Arc<dyn Notifier>> {
    match &config.smtp {
        Some(smtp) => {
            let notifier = SmtpNotifier::new(
                &smtp.host,
                smtp.port,
                &smtp.username,
                &smtp.password,
                &config.sender,
            )
            .map_err(|e| Error::Notification(e.to_string()))?;
            tracing::info!(host = %smtp.host, port = smtp.port, "Email alerts enabled");
            Ok(Arc::new(notifier))
        }
        None => {
            tracing::info!("No SMTP configured, alerts go to the log");
            Ok(Arc::new(LogNotifier))
        }
    }
}

fn build_audio(config: &AlarmConfig) -> Arc<dyn AudioSink> {
    match &config.sound_path {
        Some(sound) => Arc::new(CommandAudioSink::new(&config.player, sound)),
        None => Arc::new(SilentAudioSink::new(config.silent_cycle())),
    }
}

/// Forward key presses from stdin to the watch loop. The thread is detached;
/// it ends when stdin closes or the loop goes away.
fn spawn_key_reader(controls: ControlsConfig, tx: Sender<ControlInput>) {
    let spawned = std::thread::Builder::new()
        .name("facewatch-keys".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                for key in line.trim().chars() {
                    if let Some(input) = ControlInput::from_key(key, &controls) {
                        if tx.send(input).is_err() {
                            return;
                        }
                    }
                }
            }
            tracing::debug!("stdin closed, key reader stopped");
        });

    if let Err(e) = spawned {
        tracing::warn!("Failed to start key reader, running without controls: {}", e);
    }
}
