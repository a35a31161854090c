//! Error types for the booking wizard.

use chrono::NaiveDate;

/// Top-level error type for the booking wizard.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Availability error: {0}")]
    Availability(#[from] AvailabilityError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised inside an availability provider.
///
/// These never cross the availability boundary: `check_availability`
/// turns them into an unavailable result plus a warning.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} returned HTTP {status}")]
    Status { provider: String, status: u16 },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Slot {slot} on {date} is not bookable")]
    SlotUnavailable { date: NaiveDate, slot: String },
}

/// Errors raised while delivering a booking request.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Transport {transport} request failed: {reason}")]
    RequestFailed { transport: String, reason: String },

    #[error("Transport {transport} rejected the booking: {reason}")]
    Rejected { transport: String, reason: String },

    #[error("Invalid response from {transport}: {reason}")]
    InvalidResponse { transport: String, reason: String },

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Mail client handoff failed: {0}")]
    Handoff(String),
}

/// Wizard transition errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("The booking has already been submitted")]
    AlreadySubmitted,

    #[error("Step {step} is the final step of {total}")]
    AtFinalStep { step: u8, total: u8 },

    #[error("Cannot submit from step {step}; the final step is {total}")]
    NotOnFinalStep { step: u8, total: u8 },

    #[error("Step {step} is outside a {total}-step plan")]
    StepOutOfRange { step: u8, total: u8 },
}

/// Result type alias for the booking wizard.
pub type Result<T> = std::result::Result<T, Error>;
