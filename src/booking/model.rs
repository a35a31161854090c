//! Booking draft and the option catalogs offered by each step.

use chrono::{NaiveDate, NaiveTime, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A bookable time slot, labelled like `"09:00 AM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot(NaiveTime);

impl TimeSlot {
    const LABEL_FORMAT: &'static str = "%I:%M %p";

    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    /// Build a slot from a 24-hour clock time. Returns `None` for invalid times.
    pub fn at(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Parse a label such as `"02:00 PM"`.
    pub fn parse_label(label: &str) -> Option<Self> {
        NaiveTime::parse_from_str(label.trim(), Self::LABEL_FORMAT)
            .ok()
            .map(Self)
    }

    pub fn time(&self) -> NaiveTime {
        self.0
    }

    pub fn label(&self) -> String {
        self.0.format(Self::LABEL_FORMAT).to_string()
    }
}

impl std::fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for TimeSlot {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for TimeSlot {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Self::parse_label(&label)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid time slot label: {label}")))
    }
}

/// Dialling prefix offered next to the phone number input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountryCode {
    #[default]
    #[serde(rename = "+1")]
    UnitedStates,
    #[serde(rename = "+44")]
    UnitedKingdom,
    #[serde(rename = "+91")]
    India,
}

impl CountryCode {
    pub const ALL: [CountryCode; 3] = [Self::UnitedStates, Self::UnitedKingdom, Self::India];

    pub fn prefix(&self) -> &'static str {
        match self {
            Self::UnitedStates => "+1",
            Self::UnitedKingdom => "+44",
            Self::India => "+91",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::UnitedStates => "United States (+1)",
            Self::UnitedKingdom => "United Kingdom (+44)",
            Self::India => "India (+91)",
        }
    }
}

/// Areas the client wants to improve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementArea {
    PersonalGrowth,
    CareerBusinessDevelopment,
    RelationshipImprovement,
    FinancialEmpowerment,
    HealthWellness,
    Philanthropy,
    Other,
}

impl ImprovementArea {
    pub const ALL: [ImprovementArea; 7] = [
        Self::PersonalGrowth,
        Self::CareerBusinessDevelopment,
        Self::RelationshipImprovement,
        Self::FinancialEmpowerment,
        Self::HealthWellness,
        Self::Philanthropy,
        Self::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::PersonalGrowth => "Personal Growth",
            Self::CareerBusinessDevelopment => "Career/Business Development",
            Self::RelationshipImprovement => "Relationship Improvement",
            Self::FinancialEmpowerment => "Financial Empowerment",
            Self::HealthWellness => "Health & Wellness",
            Self::Philanthropy => "Philanthropy",
            Self::Other => "Other",
        }
    }
}

/// Coaching packages with their list price and bundle discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPackage {
    OneHour,
    FiveHours,
    TenHours,
    TwentyHours,
}

impl SessionPackage {
    pub const ALL: [SessionPackage; 4] = [
        Self::OneHour,
        Self::FiveHours,
        Self::TenHours,
        Self::TwentyHours,
    ];

    pub fn from_hours(hours: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.hours() == hours)
    }

    pub fn hours(&self) -> u32 {
        match self {
            Self::OneHour => 1,
            Self::FiveHours => 5,
            Self::TenHours => 10,
            Self::TwentyHours => 20,
        }
    }

    /// Total price in USD, discount already applied.
    pub fn price(&self) -> Decimal {
        match self {
            Self::OneHour => dec!(595.99),
            Self::FiveHours => dec!(2830.95),
            Self::TenHours => dec!(5323.92),
            Self::TwentyHours => dec!(9779.85),
        }
    }

    pub fn discount_percent(&self) -> u32 {
        match self {
            Self::OneHour => 0,
            Self::FiveHours => 5,
            Self::TenHours => 12,
            Self::TwentyHours => 15,
        }
    }

    /// Whether the sessions can be spread over several weeks.
    pub fn is_multi_session(&self) -> bool {
        self.hours() > 1
    }

    pub fn label(&self) -> String {
        let hours = self.hours();
        let plural = if hours > 1 { "s" } else { "" };
        let mut label = format!("{hours} Hour{plural} ({})", format_usd(self.price()));
        if self.discount_percent() > 0 {
            label.push_str(&format!(" - Includes {}% discount", self.discount_percent()));
        }
        label
    }
}

/// Preferred time-of-day window for sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "9AM-12PM")]
    Morning,
    #[serde(rename = "1PM-5PM")]
    Afternoon,
    #[serde(rename = "6PM-9PM")]
    Evening,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [Self::Morning, Self::Afternoon, Self::Evening];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Morning => "9AM-12PM",
            Self::Afternoon => "1PM-5PM",
            Self::Evening => "6PM-9PM",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "9 AM - 12 PM",
            Self::Afternoon => "1 PM - 5 PM",
            Self::Evening => "6 PM - 9 PM",
        }
    }
}

/// Where the sessions take place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    GoogleMeet,
    Zoom,
    PhoneCall,
    Any,
}

impl Platform {
    pub const ALL: [Platform; 4] = [Self::GoogleMeet, Self::Zoom, Self::PhoneCall, Self::Any];

    pub fn label(&self) -> &'static str {
        match self {
            Self::GoogleMeet => "Google meets",
            Self::Zoom => "Zoom calls",
            Self::PhoneCall => "Phone call",
            Self::Any => "Any of the above",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    PayPal,
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [Self::Card, Self::PayPal, Self::BankTransfer];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Card => "Credit/Debit Card",
            Self::PayPal => "PayPal",
            Self::BankTransfer => "Bank Transfer",
        }
    }
}

/// When the client would like the follow-up call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpWindow {
    Morning,
    Afternoon,
    Evening,
}

impl FollowUpWindow {
    pub const ALL: [FollowUpWindow; 3] = [Self::Morning, Self::Afternoon, Self::Evening];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "Morning (9 AM - 12 PM)",
            Self::Afternoon => "Afternoon (1 PM - 5 PM)",
            Self::Evening => "Evening (6 PM - 9 PM)",
        }
    }
}

/// Days offered by the "available days" checklist, Monday first.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Format a USD amount with thousands separators, e.g. `$2,830.95`.
pub fn format_usd(amount: Decimal) -> String {
    let fixed = format!("{:.2}", amount.round_dp(2));
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let (sign, digits) = match whole.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", whole),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}${grouped}.{cents}")
}

/// Every answer collected by the wizard, across all steps.
///
/// Created empty when the wizard starts and mutated as the user answers
/// each step. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    // Date selection
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<TimeSlot>,

    // Personal information
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_country_code: CountryCode,
    pub phone_number: String,
    pub age: Option<u8>,
    pub location: String,
    pub occupation: String,
    pub description: String,

    // Goals and expectations
    pub current_situation: String,
    pub background: String,
    pub passions: String,
    pub top_three_goals: String,
    pub challenges: String,
    pub improvement_areas: Vec<ImprovementArea>,
    pub success_vision: String,
    pub previous_attempts: String,
    pub support_type: Vec<String>,
    pub confidence_level: String,
    pub uncertainty_reason: String,

    // Investment
    pub commitment_level: Option<u8>,
    pub resource_investment: String,
    pub open_to_strategies: Option<bool>,

    // Session preferences
    pub package: Option<SessionPackage>,
    pub distribute_sessions: Option<bool>,
    pub available_days: Vec<Weekday>,
    pub time_range: Option<TimeRange>,
    pub platform: Option<Platform>,

    // Payment
    pub payment_method: Option<PaymentMethod>,
    pub billing_street: String,
    pub billing_city: String,
    pub terms_accepted: bool,

    // Final thoughts
    pub additional_info: String,
    pub follow_up_call: Option<bool>,
    pub follow_up_time: Option<FollowUpWindow>,
}

impl BookingDraft {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// Phone number with its dialling prefix.
    pub fn full_phone(&self) -> String {
        format!("{} {}", self.phone_country_code.prefix(), self.phone_number.trim())
    }

    /// Toggle an improvement area in the multi-select.
    pub fn toggle_improvement_area(&mut self, area: ImprovementArea) {
        toggle(&mut self.improvement_areas, area);
    }

    /// Toggle a day in the "available days" checklist.
    pub fn toggle_available_day(&mut self, day: Weekday) {
        toggle(&mut self.available_days, day);
    }

    /// Choose a package. Clears the distribution answer for single sessions,
    /// where the question is not asked.
    pub fn choose_package(&mut self, package: SessionPackage) {
        self.package = Some(package);
        if !package.is_multi_session() {
            self.distribute_sessions = None;
        }
    }

    /// Answer the follow-up question. Declining drops any chosen window.
    pub fn set_follow_up_call(&mut self, wanted: bool) {
        self.follow_up_call = Some(wanted);
        if !wanted {
            self.follow_up_time = None;
        }
    }

    /// Total cost of the chosen package, if any.
    pub fn total_cost(&self) -> Option<Decimal> {
        self.package.map(|p| p.price())
    }
}

fn toggle<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if let Some(pos) = items.iter().position(|i| *i == item) {
        items.remove(pos);
    } else {
        items.push(item);
    }
}
