//! Parse raw text answers into typed draft fields.
//!
//! Choices accept either the option number shown in the prompt (1-based)
//! or the option label, case-insensitively. Multi-selects take a comma
//! separated list of either.

use chrono::NaiveDate;

use super::fields::Field;
use super::model::{
    BookingDraft, CountryCode, FollowUpWindow, ImprovementArea, PaymentMethod, Platform,
    SessionPackage, TimeRange, TimeSlot, WEEKDAYS, weekday_name,
};
use super::validate::FieldError;

/// Option labels offered for a choice field, in prompt order.
pub fn options(field: Field) -> Option<Vec<String>> {
    let labels: Vec<String> = match field {
        Field::PhoneCountryCode => CountryCode::ALL.iter().map(|c| c.label().into()).collect(),
        Field::ImprovementAreas => ImprovementArea::ALL
            .iter()
            .map(|a| a.label().into())
            .collect(),
        Field::Package => SessionPackage::ALL.iter().map(|p| p.label()).collect(),
        Field::AvailableDays => WEEKDAYS.iter().map(|d| weekday_name(*d).into()).collect(),
        Field::TimeRange => TimeRange::ALL.iter().map(|t| t.label().into()).collect(),
        Field::Platform => Platform::ALL.iter().map(|p| p.label().into()).collect(),
        Field::PaymentMethod => PaymentMethod::ALL.iter().map(|m| m.label().into()).collect(),
        Field::FollowUpTime => FollowUpWindow::ALL.iter().map(|w| w.label().into()).collect(),
        Field::OpenToStrategies => vec![
            "Yes, I'm open to new approaches".into(),
            "I prefer traditional methods".into(),
        ],
        Field::FollowUpCall => vec![
            "Yes, I would like a follow-up call".into(),
            "No, email confirmation is sufficient".into(),
        ],
        Field::DistributeSessions => vec!["Yes".into(), "No".into()],
        _ => return None,
    };
    Some(labels)
}

/// Whether the field takes several comma separated answers.
pub fn is_multi_select(field: Field) -> bool {
    matches!(
        field,
        Field::ImprovementAreas | Field::AvailableDays | Field::SupportType
    )
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| unparsable(raw))
}

/// Pick a slot from `offered` by number or label.
pub fn parse_slot(raw: &str, offered: &[TimeSlot]) -> Result<TimeSlot, FieldError> {
    let labels: Vec<String> = offered.iter().map(|s| s.label()).collect();
    pick(raw, &labels).map(|i| offered[i])
}

/// Apply a raw answer to `field` of the draft.
///
/// Blank input clears optional answers; required ones are then caught by
/// validation, not here.
pub fn apply(draft: &mut BookingDraft, field: Field, raw: &str) -> Result<(), FieldError> {
    let text = raw.trim();
    match field {
        Field::SelectedDate => {
            draft.selected_date = if text.is_empty() { None } else { Some(parse_date(text)?) };
            draft.selected_time = None;
        }
        Field::SelectedTime => {
            draft.selected_time = if text.is_empty() {
                None
            } else {
                Some(TimeSlot::parse_label(text).ok_or_else(|| unparsable(raw))?)
            };
        }
        Field::FirstName => draft.first_name = text.into(),
        Field::LastName => draft.last_name = text.into(),
        Field::Email => draft.email = text.into(),
        Field::PhoneCountryCode => {
            if !text.is_empty() {
                let by_prefix = CountryCode::ALL.iter().position(|c| c.prefix() == text);
                let index = match by_prefix {
                    Some(i) => i,
                    None => pick_option(field, text)?,
                };
                draft.phone_country_code = CountryCode::ALL[index];
            }
        }
        Field::PhoneNumber => draft.phone_number = text.into(),
        Field::Age => {
            draft.age = if text.is_empty() {
                None
            } else {
                Some(text.parse().map_err(|_| unparsable(raw))?)
            };
        }
        Field::Location => draft.location = text.into(),
        Field::Occupation => draft.occupation = text.into(),
        Field::Description => draft.description = text.into(),
        Field::CurrentSituation => draft.current_situation = text.into(),
        Field::Background => draft.background = text.into(),
        Field::Passions => draft.passions = text.into(),
        Field::TopThreeGoals => draft.top_three_goals = text.into(),
        Field::Challenges => draft.challenges = text.into(),
        Field::ImprovementAreas => {
            draft.improvement_areas = pick_many(field, text)?
                .into_iter()
                .map(|i| ImprovementArea::ALL[i])
                .collect();
        }
        Field::SuccessVision => draft.success_vision = text.into(),
        Field::PreviousAttempts => draft.previous_attempts = text.into(),
        Field::SupportType => {
            draft.support_type = split_list(text).map(String::from).collect();
        }
        Field::ConfidenceLevel => draft.confidence_level = text.into(),
        Field::UncertaintyReason => draft.uncertainty_reason = text.into(),
        Field::CommitmentLevel => {
            draft.commitment_level = if text.is_empty() {
                None
            } else {
                Some(text.parse().map_err(|_| unparsable(raw))?)
            };
        }
        Field::ResourceInvestment => draft.resource_investment = text.into(),
        Field::OpenToStrategies => draft.open_to_strategies = optional_yes_no(field, text)?,
        Field::Package => {
            if text.is_empty() {
                draft.package = None;
                draft.distribute_sessions = None;
            } else {
                let by_hours = text.parse::<u32>().ok().and_then(SessionPackage::from_hours);
                let package = match by_hours {
                    Some(p) => p,
                    None => SessionPackage::ALL[pick_option(field, text)?],
                };
                draft.choose_package(package);
            }
        }
        Field::DistributeSessions => draft.distribute_sessions = optional_yes_no(field, text)?,
        Field::AvailableDays => {
            draft.available_days = pick_many(field, text)?
                .into_iter()
                .map(|i| WEEKDAYS[i])
                .collect();
        }
        Field::TimeRange => {
            draft.time_range = if text.is_empty() {
                None
            } else {
                let by_code = TimeRange::ALL
                    .iter()
                    .position(|t| t.code().eq_ignore_ascii_case(text));
                let index = match by_code {
                    Some(i) => i,
                    None => pick_option(field, text)?,
                };
                Some(TimeRange::ALL[index])
            };
        }
        Field::Platform => {
            draft.platform = optional_pick(field, text)?.map(|i| Platform::ALL[i]);
        }
        Field::PaymentMethod => {
            draft.payment_method = optional_pick(field, text)?.map(|i| PaymentMethod::ALL[i]);
        }
        Field::BillingStreet => draft.billing_street = text.into(),
        Field::BillingCity => draft.billing_city = text.into(),
        Field::TermsAccepted => {
            draft.terms_accepted = yes_no(text).ok_or_else(|| unparsable(raw))?;
        }
        Field::AdditionalInfo => draft.additional_info = text.into(),
        Field::FollowUpCall => match optional_yes_no(field, text)? {
            Some(wanted) => draft.set_follow_up_call(wanted),
            None => {
                draft.follow_up_call = None;
                draft.follow_up_time = None;
            }
        },
        Field::FollowUpTime => {
            draft.follow_up_time = optional_pick(field, text)?.map(|i| FollowUpWindow::ALL[i]);
        }
    }
    Ok(())
}

fn unparsable(raw: &str) -> FieldError {
    FieldError::Unparsable {
        input: raw.trim().to_string(),
    }
}

fn split_list(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Index of `raw` among `labels`, by 1-based number or label.
fn pick(raw: &str, labels: &[String]) -> Result<usize, FieldError> {
    let text = raw.trim();
    if let Ok(n) = text.parse::<usize>() {
        if (1..=labels.len()).contains(&n) {
            return Ok(n - 1);
        }
    }
    labels
        .iter()
        .position(|l| l.eq_ignore_ascii_case(text))
        .ok_or_else(|| unparsable(raw))
}

fn pick_option(field: Field, text: &str) -> Result<usize, FieldError> {
    let labels = options(field).unwrap_or_default();
    pick(text, &labels)
}

fn optional_pick(field: Field, text: &str) -> Result<Option<usize>, FieldError> {
    if text.is_empty() {
        Ok(None)
    } else {
        pick_option(field, text).map(Some)
    }
}

fn pick_many(field: Field, text: &str) -> Result<Vec<usize>, FieldError> {
    let labels = options(field).unwrap_or_default();
    let mut picked = Vec::new();
    for item in split_list(text) {
        let index = pick(item, &labels)?;
        if !picked.contains(&index) {
            picked.push(index);
        }
    }
    Ok(picked)
}

fn yes_no(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "y" | "yes" | "true" | "accept" => Some(true),
        "n" | "no" | "false" => Some(false),
        _ => None,
    }
}

/// Yes/no answer; option 1 means yes and option 2 means no.
fn optional_yes_no(field: Field, text: &str) -> Result<Option<bool>, FieldError> {
    if text.is_empty() {
        return Ok(None);
    }
    if let Some(answer) = yes_no(text) {
        return Ok(Some(answer));
    }
    pick_option(field, text).map(|i| Some(i == 0))
}
