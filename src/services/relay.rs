//! Submission collaborator: delivers the booking request through a mail relay.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::booking::message::BookingMessage;
use crate::booking::model::BookingDraft;
use crate::error::SubmissionError;

use super::handoff::MailClientHandoff;

/// Default public form relay endpoint.
pub const DEFAULT_RELAY_URL: &str = "https://api.web3forms.com/submit";
/// Page the relay sends the browser to after a form post.
pub const DEFAULT_RELAY_REDIRECT: &str = "https://web3forms.com/success";

/// Sends a completed draft somewhere a human will read it.
///
/// Never fails past this boundary: `false` means the booking was not
/// delivered and the caller may let the user try again.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, draft: &BookingDraft) -> bool;
}

/// One way of getting a rendered message out of the process.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    fn name(&self) -> &str;

    async fn deliver(&self, message: &BookingMessage) -> Result<(), SubmissionError>;
}

#[derive(Debug, Serialize)]
struct RelayPayload<'a> {
    access_key: &'a str,
    subject: &'a str,
    from_name: &'a str,
    email: &'a str,
    message: &'a str,
    redirect: &'a str,
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// JSON form relay (Web3Forms-compatible).
pub struct HttpRelay {
    client: reqwest::Client,
    url: String,
    access_key: SecretString,
    redirect: String,
}

impl HttpRelay {
    pub fn new(url: impl Into<String>, access_key: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            access_key,
            redirect: DEFAULT_RELAY_REDIRECT.to_string(),
        }
    }

    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = redirect.into();
        self
    }
}

#[async_trait]
impl SubmissionTransport for HttpRelay {
    fn name(&self) -> &str {
        "http-relay"
    }

    async fn deliver(&self, message: &BookingMessage) -> Result<(), SubmissionError> {
        let payload = RelayPayload {
            access_key: self.access_key.expose_secret(),
            subject: &message.subject,
            from_name: &message.from_name,
            email: &message.reply_to,
            message: &message.body,
            redirect: &self.redirect,
        };

        let resp = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| SubmissionError::RequestFailed {
                transport: self.name().into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let body: RelayResponse =
            resp.json()
                .await
                .map_err(|e| SubmissionError::InvalidResponse {
                    transport: self.name().into(),
                    reason: format!("HTTP {status}: {e}"),
                })?;

        if !body.success {
            return Err(SubmissionError::Rejected {
                transport: self.name().into(),
                reason: body
                    .message
                    .unwrap_or_else(|| format!("relay answered HTTP {status} without success")),
            });
        }

        tracing::info!(transport = self.name(), "Booking request delivered");
        Ok(())
    }
}

/// Composes the message, hands it to a transport and, on success, opens
/// the local mail client with the same content.
pub struct RelaySubmitter {
    transport: Arc<dyn SubmissionTransport>,
    handoff: Option<(Arc<dyn MailClientHandoff>, String)>,
}

impl RelaySubmitter {
    pub fn new(transport: Arc<dyn SubmissionTransport>) -> Self {
        Self {
            transport,
            handoff: None,
        }
    }

    /// Open a `mailto:` addressed to `recipient` after each delivery. An
    /// empty `recipient` leaves the address for the user to fill in.
    pub fn with_handoff(
        mut self,
        handoff: Arc<dyn MailClientHandoff>,
        recipient: impl Into<String>,
    ) -> Self {
        self.handoff = Some((handoff, recipient.into()));
        self
    }
}

#[async_trait]
impl Submitter for RelaySubmitter {
    async fn submit(&self, draft: &BookingDraft) -> bool {
        let message = BookingMessage::compose(draft);

        if let Err(e) = self.transport.deliver(&message).await {
            tracing::error!(transport = self.transport.name(), error = %e, "Booking submission failed");
            return false;
        }

        if let Some((handoff, recipient)) = &self.handoff {
            let uri = message.mailto_uri(recipient);
            if let Err(e) = handoff.open(&uri).await {
                // Delivery already succeeded; the mail client is a courtesy.
                tracing::warn!(error = %e, "Mail client handoff failed");
            }
        }

        true
    }
}
