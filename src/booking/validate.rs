//! Field schema: one rule per draft field, checked on blur and on Next.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::fields::Field;
use super::model::BookingDraft;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// Minimum number of digits in a phone number.
const MIN_PHONE_DIGITS: usize = 7;

/// What a field must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Non-blank text of at least `min_len` characters.
    Text { min_len: usize },
    /// Free text that may be left blank.
    OptionalText,
    /// Non-blank, email-shaped text.
    Email,
    /// Non-blank text with enough digits to dial.
    Phone,
    /// A single choice (date, slot, package, enum option) must be made.
    Choice,
    /// Choice with a sensible default; always satisfied.
    Defaulted,
    /// Integer within bounds.
    Range { min: u8, max: u8 },
    /// Integer within bounds, may be left blank.
    OptionalRange { min: u8, max: u8 },
    /// Yes/no question that must be answered either way.
    Answered,
    /// Yes/no question that may be skipped.
    OptionalAnswer,
    /// Checkbox that must be ticked.
    MustAccept,
    /// Multi-select with at least `min` entries.
    AtLeast { min: usize },
    /// A choice required only when the follow-up call was requested.
    RequiredWithFollowUp,
}

/// Why a field failed its rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldError {
    Required,
    TooShort { min: usize },
    InvalidEmail,
    InvalidPhone,
    OutOfRange { min: u8, max: u8 },
    NotAccepted,
    NoneSelected,
    /// Raw input that could not be parsed into the field's type.
    Unparsable { input: String },
}

impl FieldError {
    /// User-facing message for this error on `field`.
    pub fn message(&self, field: Field) -> String {
        match self {
            Self::Required => required_message(field).to_string(),
            Self::TooShort { min } => format!("{} must be at least {min} characters", field.label()),
            Self::InvalidEmail => "Invalid email address".to_string(),
            Self::InvalidPhone => "Please enter a valid phone number".to_string(),
            Self::OutOfRange { min, max } => {
                format!("{} must be between {min} and {max}", field.label())
            }
            Self::NotAccepted => "You must accept the terms to continue".to_string(),
            Self::NoneSelected => match field {
                Field::ImprovementAreas => "Please select at least one improvement area".to_string(),
                Field::SupportType => "Please select at least one support type".to_string(),
                Field::AvailableDays => "Please select at least one available day".to_string(),
                _ => format!("Please select at least one option for {}", field.label()),
            },
            Self::Unparsable { input } => format!("'{input}' is not a valid answer for {}", field.label()),
        }
    }
}

fn required_message(field: Field) -> &'static str {
    match field {
        Field::SelectedDate => "Please select a date for your session",
        Field::SelectedTime => "Please select a time slot",
        Field::FirstName => "First name is required",
        Field::LastName => "Last name is required",
        Field::Email => "Email is required",
        Field::PhoneNumber => "Phone number is required",
        Field::Location => "Location is required",
        Field::Occupation => "Occupation is required",
        Field::CurrentSituation => "Current situation is required",
        Field::Background => "Background information is required",
        Field::Passions => "Passions are required",
        Field::TopThreeGoals => "Goals are required",
        Field::Challenges => "Challenges are required",
        Field::SuccessVision => "Success vision is required",
        Field::ConfidenceLevel => "Confidence level is required",
        _ => "This field is required",
    }
}

impl Field {
    /// The schema rule for this field.
    pub fn rule(&self) -> Rule {
        match self {
            Self::SelectedDate | Self::SelectedTime => Rule::Choice,
            Self::FirstName | Self::LastName => Rule::Text { min_len: 1 },
            Self::Email => Rule::Email,
            Self::PhoneCountryCode => Rule::Defaulted,
            Self::PhoneNumber => Rule::Phone,
            Self::Age => Rule::OptionalRange { min: 13, max: 120 },
            Self::Location | Self::Occupation => Rule::Text { min_len: 2 },
            Self::Description => Rule::Text { min_len: 10 },
            Self::CurrentSituation
            | Self::Background
            | Self::Passions
            | Self::TopThreeGoals
            | Self::Challenges
            | Self::SuccessVision
            | Self::PreviousAttempts
            | Self::UncertaintyReason
            | Self::ResourceInvestment => Rule::Text { min_len: 3 },
            Self::ConfidenceLevel => Rule::Text { min_len: 1 },
            Self::ImprovementAreas | Self::SupportType | Self::AvailableDays => {
                Rule::AtLeast { min: 1 }
            }
            Self::CommitmentLevel => Rule::Range { min: 1, max: 10 },
            Self::OpenToStrategies | Self::FollowUpCall => Rule::Answered,
            Self::DistributeSessions => Rule::OptionalAnswer,
            Self::Package | Self::TimeRange | Self::Platform | Self::PaymentMethod => Rule::Choice,
            Self::BillingStreet | Self::BillingCity | Self::AdditionalInfo => Rule::OptionalText,
            Self::TermsAccepted => Rule::MustAccept,
            Self::FollowUpTime => Rule::RequiredWithFollowUp,
        }
    }
}

/// Typed view of one field's current value.
enum Value<'a> {
    Text(&'a str),
    Present(bool),
    Number(Option<u8>),
    Flag(Option<bool>),
    Checked(bool),
    Count(usize),
}

fn value_of(draft: &BookingDraft, field: Field) -> Value<'_> {
    match field {
        Field::SelectedDate => Value::Present(draft.selected_date.is_some()),
        Field::SelectedTime => Value::Present(draft.selected_time.is_some()),
        Field::FirstName => Value::Text(&draft.first_name),
        Field::LastName => Value::Text(&draft.last_name),
        Field::Email => Value::Text(&draft.email),
        Field::PhoneCountryCode => Value::Present(true),
        Field::PhoneNumber => Value::Text(&draft.phone_number),
        Field::Age => Value::Number(draft.age),
        Field::Location => Value::Text(&draft.location),
        Field::Occupation => Value::Text(&draft.occupation),
        Field::Description => Value::Text(&draft.description),
        Field::CurrentSituation => Value::Text(&draft.current_situation),
        Field::Background => Value::Text(&draft.background),
        Field::Passions => Value::Text(&draft.passions),
        Field::TopThreeGoals => Value::Text(&draft.top_three_goals),
        Field::Challenges => Value::Text(&draft.challenges),
        Field::ImprovementAreas => Value::Count(draft.improvement_areas.len()),
        Field::SuccessVision => Value::Text(&draft.success_vision),
        Field::PreviousAttempts => Value::Text(&draft.previous_attempts),
        Field::SupportType => Value::Count(
            draft
                .support_type
                .iter()
                .filter(|s| !s.trim().is_empty())
                .count(),
        ),
        Field::ConfidenceLevel => Value::Text(&draft.confidence_level),
        Field::UncertaintyReason => Value::Text(&draft.uncertainty_reason),
        Field::CommitmentLevel => Value::Number(draft.commitment_level),
        Field::ResourceInvestment => Value::Text(&draft.resource_investment),
        Field::OpenToStrategies => Value::Flag(draft.open_to_strategies),
        Field::Package => Value::Present(draft.package.is_some()),
        Field::DistributeSessions => Value::Flag(draft.distribute_sessions),
        Field::AvailableDays => Value::Count(draft.available_days.len()),
        Field::TimeRange => Value::Present(draft.time_range.is_some()),
        Field::Platform => Value::Present(draft.platform.is_some()),
        Field::PaymentMethod => Value::Present(draft.payment_method.is_some()),
        Field::BillingStreet => Value::Text(&draft.billing_street),
        Field::BillingCity => Value::Text(&draft.billing_city),
        Field::TermsAccepted => Value::Checked(draft.terms_accepted),
        Field::AdditionalInfo => Value::Text(&draft.additional_info),
        Field::FollowUpCall => Value::Flag(draft.follow_up_call),
        Field::FollowUpTime => Value::Present(draft.follow_up_time.is_some()),
    }
}

/// Check one field of the draft against its rule.
pub fn validate_field(draft: &BookingDraft, field: Field) -> Result<(), FieldError> {
    let value = value_of(draft, field);
    match (field.rule(), value) {
        (Rule::Text { min_len }, Value::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Err(FieldError::Required)
            } else if text.chars().count() < min_len {
                Err(FieldError::TooShort { min: min_len })
            } else {
                Ok(())
            }
        }
        (Rule::OptionalText, _) | (Rule::Defaulted, _) | (Rule::OptionalAnswer, _) => Ok(()),
        (Rule::Email, Value::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                Err(FieldError::Required)
            } else if !EMAIL_RE.is_match(text) {
                Err(FieldError::InvalidEmail)
            } else {
                Ok(())
            }
        }
        (Rule::Phone, Value::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(FieldError::Required);
            }
            let allowed = text
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.'));
            let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
            if allowed && digits >= MIN_PHONE_DIGITS {
                Ok(())
            } else {
                Err(FieldError::InvalidPhone)
            }
        }
        (Rule::Choice, Value::Present(present)) => {
            if present {
                Ok(())
            } else {
                Err(FieldError::Required)
            }
        }
        (Rule::Range { min, max }, Value::Number(number)) => match number {
            None => Err(FieldError::Required),
            Some(n) if n < min || n > max => Err(FieldError::OutOfRange { min, max }),
            Some(_) => Ok(()),
        },
        (Rule::OptionalRange { min, max }, Value::Number(number)) => match number {
            Some(n) if n < min || n > max => Err(FieldError::OutOfRange { min, max }),
            _ => Ok(()),
        },
        (Rule::Answered, Value::Flag(flag)) => {
            if flag.is_some() {
                Ok(())
            } else {
                Err(FieldError::Required)
            }
        }
        (Rule::MustAccept, Value::Checked(checked)) => {
            if checked {
                Ok(())
            } else {
                Err(FieldError::NotAccepted)
            }
        }
        (Rule::AtLeast { min }, Value::Count(count)) => {
            if count >= min {
                Ok(())
            } else {
                Err(FieldError::NoneSelected)
            }
        }
        (Rule::RequiredWithFollowUp, Value::Present(present)) => {
            if draft.follow_up_call != Some(true) || present {
                Ok(())
            } else {
                Err(FieldError::Required)
            }
        }
        (rule, _) => {
            tracing::error!(field = %field, ?rule, "Rule does not fit field value");
            Err(FieldError::Required)
        }
    }
}

/// Per-field validation errors, kept in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<Field, FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    pub fn set(&mut self, field: Field, error: FieldError) {
        self.0.insert(field, error);
    }

    pub fn clear(&mut self, field: Field) {
        self.0.remove(&field);
    }

    /// Record the outcome of validating `field`.
    pub fn record(&mut self, field: Field, outcome: Result<(), FieldError>) {
        match outcome {
            Ok(()) => self.clear(field),
            Err(e) => self.set(field, e),
        }
    }

    pub fn fields(&self) -> Vec<Field> {
        self.0.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        self.0.iter().map(|(f, e)| (*f, e))
    }

    /// Merge another set, overwriting errors for the same field.
    pub fn extend(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }
}

/// Validate exactly the given fields, in order.
pub fn validate_fields(draft: &BookingDraft, fields: &[Field]) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in fields {
        if let Err(e) = validate_field(draft, *field) {
            errors.set(*field, e);
        }
    }
    errors
}
