//! Local mail-client handoff: opens a `mailto:` URI after a successful relay.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SubmissionError;

/// Hands a `mailto:` URI to something that can open it.
#[async_trait]
pub trait MailClientHandoff: Send + Sync {
    async fn open(&self, uri: &str) -> Result<(), SubmissionError>;
}

/// Launches the desktop's default handler for the URI.
pub struct SystemMailClient {
    program: String,
}

impl SystemMailClient {
    pub fn new() -> Self {
        let program = if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "explorer"
        } else {
            "xdg-open"
        };
        Self {
            program: program.to_string(),
        }
    }

    /// Use a specific opener program instead of the platform default.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemMailClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailClientHandoff for SystemMailClient {
    async fn open(&self, uri: &str) -> Result<(), SubmissionError> {
        let status = tokio::process::Command::new(&self.program)
            .arg(uri)
            .status()
            .await
            .map_err(|e| SubmissionError::Handoff(format!("{}: {e}", self.program)))?;
        if !status.success() {
            return Err(SubmissionError::Handoff(format!(
                "{} exited with {status}",
                self.program
            )));
        }
        tracing::info!(program = %self.program, "Mail client opened");
        Ok(())
    }
}

/// Records URIs instead of opening them; for headless runs and tests.
#[derive(Default)]
pub struct RecordingHandoff {
    opened: Mutex<Vec<String>>,
}

impl RecordingHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MailClientHandoff for RecordingHandoff {
    async fn open(&self, uri: &str) -> Result<(), SubmissionError> {
        tracing::info!(uri_len = uri.len(), "Mail client handoff recorded");
        if let Ok(mut opened) = self.opened.lock() {
            opened.push(uri.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recording_handoff_keeps_uris() {
        let handoff = RecordingHandoff::new();
        handoff.open("mailto:a@example.com?subject=x").await.unwrap();
        assert_eq!(handoff.opened(), vec!["mailto:a@example.com?subject=x"]);
    }

    #[tokio::test]
    async fn missing_opener_is_a_handoff_error() {
        let handoff = SystemMailClient::with_program("definitely-not-a-real-opener-binary");
        let err = handoff.open("mailto:a@example.com").await.unwrap_err();
        assert!(matches!(err, SubmissionError::Handoff(_)));
    }
}
