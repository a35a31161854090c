//! SMTP transport: sends the booking request as a plain email via lettre.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};

use crate::booking::message::BookingMessage;
use crate::error::SubmissionError;

use super::relay::SubmissionTransport;

/// SMTP account used to email booking requests.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
    /// Where booking requests land.
    pub recipient: String,
}

pub struct SmtpRelay {
    settings: SmtpSettings,
}

impl SmtpRelay {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    /// Build the email. Reply-To carries the client's address so the
    /// coach can answer directly.
    fn build(&self, message: &BookingMessage) -> Result<Message, SubmissionError> {
        let from: Mailbox = self
            .settings
            .from_address
            .parse()
            .map_err(|e| SubmissionError::InvalidAddress(format!("from: {e}")))?;
        let to: Mailbox = self
            .settings
            .recipient
            .parse()
            .map_err(|e| SubmissionError::InvalidAddress(format!("to: {e}")))?;

        let mut builder = Message::builder().from(from).to(to).subject(&message.subject);
        if !message.reply_to.is_empty() {
            let reply_to: Mailbox = message
                .reply_to
                .parse()
                .map_err(|e| SubmissionError::InvalidAddress(format!("reply-to: {e}")))?;
            builder = builder.reply_to(reply_to);
        }

        builder
            .body(message.body.clone())
            .map_err(|e| SubmissionError::Rejected {
                transport: "smtp".into(),
                reason: format!("Failed to build email: {e}"),
            })
    }
}

fn send_blocking(settings: &SmtpSettings, email: &Message) -> Result<(), SubmissionError> {
    let creds = Credentials::new(
        settings.username.clone(),
        settings.password.expose_secret().to_string(),
    );

    let transport = SmtpTransport::relay(&settings.host)
        .map_err(|e| SubmissionError::RequestFailed {
            transport: "smtp".into(),
            reason: format!("SMTP relay error: {e}"),
        })?
        .port(settings.port)
        .credentials(creds)
        .build();

    transport
        .send(email)
        .map_err(|e| SubmissionError::RequestFailed {
            transport: "smtp".into(),
            reason: format!("SMTP send failed: {e}"),
        })?;
    Ok(())
}

#[async_trait]
impl SubmissionTransport for SmtpRelay {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn deliver(&self, message: &BookingMessage) -> Result<(), SubmissionError> {
        let email = self.build(message)?;
        let settings = self.settings.clone();

        tokio::task::spawn_blocking(move || send_blocking(&settings, &email))
            .await
            .map_err(|e| SubmissionError::RequestFailed {
                transport: "smtp".into(),
                reason: format!("SMTP task failed: {e}"),
            })??;

        tracing::info!(to = %self.settings.recipient, "Booking request emailed");
        Ok(())
    }
}
