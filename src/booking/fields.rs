//! Field registry: which fields each wizard step collects and gates on.

use serde::{Deserialize, Serialize};

use super::model::BookingDraft;

/// Identifier of one booking draft field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SelectedDate,
    SelectedTime,
    FirstName,
    LastName,
    Email,
    PhoneCountryCode,
    PhoneNumber,
    Age,
    Location,
    Occupation,
    Description,
    CurrentSituation,
    Background,
    Passions,
    TopThreeGoals,
    Challenges,
    ImprovementAreas,
    SuccessVision,
    PreviousAttempts,
    SupportType,
    ConfidenceLevel,
    UncertaintyReason,
    CommitmentLevel,
    ResourceInvestment,
    OpenToStrategies,
    Package,
    DistributeSessions,
    AvailableDays,
    TimeRange,
    Platform,
    PaymentMethod,
    BillingStreet,
    BillingCity,
    TermsAccepted,
    AdditionalInfo,
    FollowUpCall,
    FollowUpTime,
}

impl Field {
    /// Stable identifier, matching the serde name.
    pub fn key(&self) -> &'static str {
        match self {
            Self::SelectedDate => "selected_date",
            Self::SelectedTime => "selected_time",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Email => "email",
            Self::PhoneCountryCode => "phone_country_code",
            Self::PhoneNumber => "phone_number",
            Self::Age => "age",
            Self::Location => "location",
            Self::Occupation => "occupation",
            Self::Description => "description",
            Self::CurrentSituation => "current_situation",
            Self::Background => "background",
            Self::Passions => "passions",
            Self::TopThreeGoals => "top_three_goals",
            Self::Challenges => "challenges",
            Self::ImprovementAreas => "improvement_areas",
            Self::SuccessVision => "success_vision",
            Self::PreviousAttempts => "previous_attempts",
            Self::SupportType => "support_type",
            Self::ConfidenceLevel => "confidence_level",
            Self::UncertaintyReason => "uncertainty_reason",
            Self::CommitmentLevel => "commitment_level",
            Self::ResourceInvestment => "resource_investment",
            Self::OpenToStrategies => "open_to_strategies",
            Self::Package => "package",
            Self::DistributeSessions => "distribute_sessions",
            Self::AvailableDays => "available_days",
            Self::TimeRange => "time_range",
            Self::Platform => "platform",
            Self::PaymentMethod => "payment_method",
            Self::BillingStreet => "billing_street",
            Self::BillingCity => "billing_city",
            Self::TermsAccepted => "terms_accepted",
            Self::AdditionalInfo => "additional_info",
            Self::FollowUpCall => "follow_up_call",
            Self::FollowUpTime => "follow_up_time",
        }
    }

    /// Question shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SelectedDate => "Session date",
            Self::SelectedTime => "Time slot",
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Email => "Email",
            Self::PhoneCountryCode => "Country code",
            Self::PhoneNumber => "Phone number",
            Self::Age => "Age",
            Self::Location => "Location",
            Self::Occupation => "Occupation",
            Self::Description => "Describe yourself in a sentence",
            Self::CurrentSituation => "Where are you right now in life?",
            Self::Background => "Tell us about your background",
            Self::Passions => "What are you passionate about?",
            Self::TopThreeGoals => "What are your top three goals?",
            Self::Challenges => "What challenges are you currently facing?",
            Self::ImprovementAreas => "Which areas do you want to improve?",
            Self::SuccessVision => "What does success look like for you?",
            Self::PreviousAttempts => "What have you already tried?",
            Self::SupportType => "What kind of support are you looking for?",
            Self::ConfidenceLevel => "How confident are you that coaching will help?",
            Self::UncertaintyReason => "What makes you uncertain, if anything?",
            Self::CommitmentLevel => "Commitment level (1-10)",
            Self::ResourceInvestment => "What resources are you willing to invest in your growth?",
            Self::OpenToStrategies => "Are you open to new strategies?",
            Self::Package => "How many hours would you like to book?",
            Self::DistributeSessions => "Distribute the sessions over multiple weeks?",
            Self::AvailableDays => "Available days",
            Self::TimeRange => "Preferred time range",
            Self::Platform => "Preferred platform",
            Self::PaymentMethod => "Payment method",
            Self::BillingStreet => "Billing street address",
            Self::BillingCity => "Billing city",
            Self::TermsAccepted => {
                "I agree to receive booking emails/SMS and accept the 48-hour cancellation policy"
            }
            Self::AdditionalInfo => "Anything else you would like to share?",
            Self::FollowUpCall => "Would you like a follow-up call?",
            Self::FollowUpTime => "Preferred follow-up time",
        }
    }

    /// Whether the field is shown for the current answers.
    ///
    /// The distribution question only follows a multi-hour package and the
    /// follow-up window only follows a requested call.
    pub fn is_visible(&self, draft: &BookingDraft) -> bool {
        match self {
            Self::DistributeSessions => draft.package.is_some_and(|p| p.is_multi_session()),
            Self::FollowUpTime => draft.follow_up_call == Some(true),
            _ => true,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One page of the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    DateSelection,
    PersonalInfo,
    GoalsExpectations,
    Investment,
    SessionPreferences,
    Payment,
    FinalThoughts,
}

impl Step {
    /// Progress bar label.
    pub fn title(&self) -> &'static str {
        match self {
            Self::DateSelection => "Select Date",
            Self::PersonalInfo => "Personal Information",
            Self::GoalsExpectations => "Goals & Expectations",
            Self::Investment => "Investment",
            Self::SessionPreferences => "Preferences",
            Self::Payment => "Summation",
            Self::FinalThoughts => "Final Thoughts",
        }
    }

    /// Fields that must be present and valid before leaving this step.
    pub fn gating_fields(&self) -> &'static [Field] {
        use Field::*;
        match self {
            Self::DateSelection => &[SelectedDate, SelectedTime],
            Self::PersonalInfo => &[
                FirstName,
                LastName,
                Email,
                PhoneNumber,
                Location,
                Occupation,
                Description,
            ],
            Self::GoalsExpectations => &[
                CurrentSituation,
                Background,
                Passions,
                TopThreeGoals,
                Challenges,
                ImprovementAreas,
                SuccessVision,
                PreviousAttempts,
                SupportType,
                ConfidenceLevel,
                UncertaintyReason,
            ],
            Self::Investment => &[CommitmentLevel, ResourceInvestment, OpenToStrategies],
            Self::SessionPreferences => &[Package, AvailableDays, TimeRange, Platform],
            Self::Payment => &[PaymentMethod, TermsAccepted],
            Self::FinalThoughts => &[FollowUpCall, FollowUpTime],
        }
    }

    /// Every field rendered on this step, gating or not, in display order.
    pub fn input_fields(&self) -> &'static [Field] {
        use Field::*;
        match self {
            Self::DateSelection => &[SelectedDate, SelectedTime],
            Self::PersonalInfo => &[
                FirstName,
                LastName,
                Email,
                PhoneCountryCode,
                PhoneNumber,
                Age,
                Location,
                Occupation,
                Description,
            ],
            Self::GoalsExpectations => self.gating_fields(),
            Self::Investment => self.gating_fields(),
            Self::SessionPreferences => &[Package, DistributeSessions, AvailableDays, TimeRange, Platform],
            Self::Payment => &[PaymentMethod, BillingStreet, BillingCity, TermsAccepted],
            Self::FinalThoughts => &[AdditionalInfo, FollowUpCall, FollowUpTime],
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Ordered steps of one wizard variant. Step numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    steps: &'static [Step],
}

const WITH_DATE_SELECTION: &[Step] = &[
    Step::DateSelection,
    Step::PersonalInfo,
    Step::GoalsExpectations,
    Step::Investment,
    Step::SessionPreferences,
    Step::Payment,
    Step::FinalThoughts,
];

const WITHOUT_DATE_SELECTION: &[Step] = &[
    Step::PersonalInfo,
    Step::GoalsExpectations,
    Step::Investment,
    Step::SessionPreferences,
    Step::Payment,
    Step::FinalThoughts,
];

impl StepPlan {
    /// Seven steps, opening with the calendar.
    pub fn with_date_selection() -> Self {
        Self {
            steps: WITH_DATE_SELECTION,
        }
    }

    /// Six steps, no calendar.
    pub fn without_date_selection() -> Self {
        Self {
            steps: WITHOUT_DATE_SELECTION,
        }
    }

    /// Number of steps (N).
    pub fn len(&self) -> u8 {
        self.steps.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step at a 1-based position.
    pub fn step(&self, number: u8) -> Option<Step> {
        let index = usize::from(number).checked_sub(1)?;
        self.steps.get(index).copied()
    }

    /// 1-based position of a step, if the plan includes it.
    pub fn number_of(&self, step: Step) -> Option<u8> {
        self.steps
            .iter()
            .position(|s| *s == step)
            .map(|i| i as u8 + 1)
    }

    pub fn includes(&self, step: Step) -> bool {
        self.steps.contains(&step)
    }

    pub fn steps(&self) -> &'static [Step] {
        self.steps
    }

    /// Gating fields for a 1-based step number; empty for unknown steps.
    pub fn fields_for_step(&self, number: u8) -> &'static [Field] {
        self.step(number).map(|s| s.gating_fields()).unwrap_or(&[])
    }
}

impl Default for StepPlan {
    fn default() -> Self {
        Self::with_date_selection()
    }
}

/// Gating fields for a step of the default seven-step wizard.
pub fn fields_for_step(step: u8) -> &'static [Field] {
    StepPlan::default().fields_for_step(step)
}
