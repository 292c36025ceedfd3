//! ABOUTME: SMTP notification adapter for emailed snapshot alerts
//! ABOUTME: Builds a multipart message with JPEG attachments and sends via STARTTLS

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{debug, info};

use crate::{AlertMessage, NotificationError, Notifier, Result};

/// SMTP notification adapter
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpNotifier {
    /// Create an adapter that relays through `host:port` with STARTTLS
    pub fn new(host: &str, port: u16, username: &str, password: &str, sender: &str) -> Result<Self> {
        let sender = parse_mailbox(sender)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| NotificationError::SmtpError(format!("Invalid relay {}: {}", host, e)))?
            .port(port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();

        Ok(Self { transport, sender })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .map_err(|e| NotificationError::AddressError(format!("{}: {}", address, e)))
}

/// Compose the email for an alert, reading every attachment from disk
pub async fn compose_email(sender: &Mailbox, msg: &AlertMessage) -> Result<Message> {
    let recipient = parse_mailbox(&msg.recipient)?;
    let jpeg = ContentType::parse("image/jpeg")
        .map_err(|e| NotificationError::ComposeError(e.to_string()))?;

    let mut body = MultiPart::mixed().singlepart(SinglePart::plain(msg.body.clone()));

    for path in &msg.attachments {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            NotificationError::AttachmentError(format!("{}: {}", path.display(), e))
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot.jpg".to_string());

        debug!(alert_id = %msg.id, file = %filename, size = bytes.len(), "Attaching snapshot");
        body = body.singlepart(Attachment::new(filename).body(bytes, jpeg.clone()));
    }

    Message::builder()
        .from(sender.clone())
        .to(recipient)
        .subject(msg.subject.clone())
        .multipart(body)
        .map_err(|e| NotificationError::ComposeError(e.to_string()))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, msg: &AlertMessage) -> Result<()> {
        let email = compose_email(&self.sender, msg).await?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotificationError::SmtpError(e.to_string()))?;

        info!(
            alert_id = %msg.id,
            recipient = %msg.recipient,
            attachments = msg.attachments.len(),
            "Alert email sent"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}
