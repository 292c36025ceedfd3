use async_trait::async_trait;
use tracing::info;

use crate::{AlertMessage, Notifier, Result};

/// Notifier used when no mail transport is configured; records the alert in
/// the log and succeeds
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, msg: &AlertMessage) -> Result<()> {
        info!(
            alert_id = %msg.id,
            recipient = %msg.recipient,
            subject = %msg.subject,
            attachments = ?msg.attachments,
            "{}",
            msg.body
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
