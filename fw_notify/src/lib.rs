//! ABOUTME: Alert dispatch with alarm sound and notification channel adapters
//! ABOUTME: Runs side effects as tasks that never block the frame loop

use async_trait::async_trait;
use chrono::{DateTime, Local};
use fw_core::{format_alert_time, AlertId};
use std::path::PathBuf;
use thiserror::Error;

pub mod adapters;
pub mod audio;
pub mod dispatcher;
pub mod state;

pub use adapters::{LogNotifier, SmtpNotifier};
pub use audio::{AudioSink, CommandAudioSink, SilentAudioSink};
pub use dispatcher::{AlertDispatcher, DispatcherConfig};
pub use state::{AlarmState, ArmedMode};

/// Result type for notification operations
pub type Result<T> = std::result::Result<T, NotificationError>;

/// Errors that can occur while composing or sending an alert
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Address error: {0}")]
    AddressError(String),
    #[error("Attachment error: {0}")]
    AttachmentError(String),
    #[error("Compose error: {0}")]
    ComposeError(String),
    #[error("SMTP error: {0}")]
    SmtpError(String),
}

/// One outbound alert: who gets it, what it says, which snapshots ride along
#[derive(Debug, Clone)]
pub struct AlertMessage {
    pub id: AlertId,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub triggered_at: DateTime<Local>,
    /// Snapshot image paths, in face enumeration order
    pub attachments: Vec<PathBuf>,
}

impl AlertMessage {
    /// Build the standard motion alert for a snapshot batch
    pub fn motion_alert(
        id: AlertId,
        recipient: &str,
        subject: &str,
        triggered_at: DateTime<Local>,
        attachments: Vec<PathBuf>,
    ) -> Self {
        Self {
            id,
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: format!(
                "Motion detected at {}! See the attached images.",
                format_alert_time(&triggered_at)
            ),
            triggered_at,
            attachments,
        }
    }
}

/// Core trait for notification sinks
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Compose and transmit the alert
    async fn send(&self, msg: &AlertMessage) -> Result<()>;

    /// Get the adapter's name for logging/debugging
    fn name(&self) -> &str;
}
