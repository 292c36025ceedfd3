//! ABOUTME: Alert dispatcher that launches the alarm and notification tasks
//! ABOUTME: Owns task lifecycle, the alarm singleton, and snapshot cleanup

use crate::{
    state::SoundingGuard, AlarmState, AlertMessage, ArmedMode, AudioSink, Notifier,
};
use chrono::{DateTime, Local};
use fw_capture::SnapshotBatch;
use fw_core::AlertId;
use metrics::counter;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::{debug, error, info, warn};

/// Configuration for the alert dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub recipient: String,
    pub subject: String,
    /// Wall-clock bound of one alarm episode
    pub alarm_duration: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            recipient: "alerts@example.com".to_string(),
            subject: "Alert: Multiple People Detected!".to_string(),
            alarm_duration: Duration::from_secs(3),
        }
    }
}

/// Launches alert side effects as tasks on a tokio runtime.
///
/// Nothing here blocks the caller: the alarm runs on the blocking pool, the
/// notification runs as an async task, and both hand back a `JoinHandle`
/// the caller may keep for diagnostics but never has to await.
pub struct AlertDispatcher {
    config: DispatcherConfig,
    notifier: Arc<dyn Notifier>,
    audio: Arc<dyn AudioSink>,
    armed: ArmedMode,
    alarm: AlarmState,
    runtime: Handle,
    alarm_launches: Arc<AtomicU64>,
    notifications_dispatched: Arc<AtomicU64>,
}

impl AlertDispatcher {
    pub fn new(
        config: DispatcherConfig,
        notifier: Arc<dyn Notifier>,
        audio: Arc<dyn AudioSink>,
        armed: ArmedMode,
        runtime: Handle,
    ) -> Self {
        info!(
            notifier = notifier.name(),
            audio = audio.name(),
            alarm_duration_ms = config.alarm_duration.as_millis() as u64,
            "Alert dispatcher ready"
        );

        Self {
            config,
            notifier,
            audio,
            armed,
            alarm: AlarmState::default(),
            runtime,
            alarm_launches: Arc::new(AtomicU64::new(0)),
            notifications_dispatched: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn alarm_state(&self) -> &AlarmState {
        &self.alarm
    }

    pub fn armed_mode(&self) -> &ArmedMode {
        &self.armed
    }

    /// Total alarm tasks launched
    pub fn alarm_launches(&self) -> u64 {
        self.alarm_launches.load(Ordering::SeqCst)
    }

    /// Total notification tasks launched
    pub fn notifications_dispatched(&self) -> u64 {
        self.notifications_dispatched.load(Ordering::SeqCst)
    }

    /// Start the alarm task unless one is already sounding.
    ///
    /// Returns `None` when the trigger is dropped; triggers are never queued.
    pub fn launch_alarm(&self) -> Option<JoinHandle<()>> {
        if !self.alarm.try_begin() {
            counter!("alarm_triggers_dropped_total").increment(1);
            debug!("Alarm already sounding, trigger dropped");
            return None;
        }

        let launches = self.alarm_launches.fetch_add(1, Ordering::SeqCst) + 1;
        counter!("alarm_launches_total").increment(1);
        info!(launches = launches, "Launching alarm");

        let guard = SoundingGuard(self.alarm.clone());
        let audio = Arc::clone(&self.audio);
        let armed = self.armed.clone();
        let duration = self.config.alarm_duration;

        Some(self.runtime.spawn_blocking(move || {
            let _guard = guard;
            run_alarm(audio.as_ref(), &armed, duration);
        }))
    }

    /// Send `batch` as one alert. The task owns the batch, so its files are
    /// deleted once the send attempt ends, whatever the outcome.
    pub fn dispatch_notification(
        &self,
        batch: SnapshotBatch,
        triggered_at: DateTime<Local>,
    ) -> JoinHandle<()> {
        let alert_id = AlertId::new();
        self.notifications_dispatched.fetch_add(1, Ordering::SeqCst);
        debug!(alert_id = %alert_id, files = batch.len(), "Dispatching notification");

        let notifier = Arc::clone(&self.notifier);
        let recipient = self.config.recipient.clone();
        let subject = self.config.subject.clone();

        self.runtime.spawn(async move {
            let message = AlertMessage::motion_alert(
                alert_id,
                &recipient,
                &subject,
                triggered_at,
                batch.paths().to_vec(),
            );

            match notifier.send(&message).await {
                Ok(()) => {
                    counter!("notifications_sent_total").increment(1);
                    info!(alert_id = %alert_id, notifier = notifier.name(), "Alert delivered");
                }
                Err(e) => {
                    counter!("notifications_failed_total").increment(1);
                    error!(
                        alert_id = %alert_id,
                        notifier = notifier.name(),
                        error = %e,
                        "Failed to send alert"
                    );
                }
            }

            drop(batch);
        })
    }
}

/// Play the alarm repeatedly until `duration` elapses or the system is
/// disarmed, checked before every cycle. Returns the number of cycles played.
pub fn run_alarm(audio: &dyn AudioSink, armed: &ArmedMode, duration: Duration) -> u32 {
    let deadline = Instant::now() + duration;
    let mut cycles = 0u32;

    while Instant::now() < deadline {
        if !armed.is_armed() {
            debug!(cycles = cycles, "Disarmed, stopping alarm");
            break;
        }

        warn!("ALARM");
        if let Err(e) = audio.play() {
            warn!(error = %e, audio = audio.name(), "Alarm playback failed, stopping alarm");
            break;
        }
        cycles += 1;
    }

    debug!(cycles = cycles, "Alarm finished");
    cycles
}
