//! Booking request message: the text every relay delivers.

use serde::Serialize;

use super::model::{BookingDraft, format_usd, weekday_name};

/// Subject used for the mail-client handoff.
pub const MAILTO_SUBJECT: &str = "New Booking Request";

/// A rendered booking request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingMessage {
    pub subject: String,
    pub from_name: String,
    /// Client's email, used as reply-to.
    pub reply_to: String,
    pub body: String,
}

impl BookingMessage {
    /// Render the draft, embedding every field.
    pub fn compose(draft: &BookingDraft) -> Self {
        let name = draft.full_name();
        Self {
            subject: format!("New Booking Request from {name}"),
            from_name: name,
            reply_to: draft.email.trim().to_string(),
            body: render_body(draft),
        }
    }

    /// `mailto:` URI carrying the same body, for the local mail client.
    pub fn mailto_uri(&self, recipient: &str) -> String {
        format!(
            "mailto:{recipient}?subject={}&body={}",
            urlencoding::encode(MAILTO_SUBJECT),
            urlencoding::encode(&self.body)
        )
    }
}

fn yes_no(flag: Option<bool>) -> &'static str {
    match flag {
        Some(true) => "Yes",
        Some(false) => "No",
        None => "Not answered",
    }
}

fn or_dash(text: &str) -> &str {
    let text = text.trim();
    if text.is_empty() { "-" } else { text }
}

fn render_body(d: &BookingDraft) -> String {
    let mut lines: Vec<String> = Vec::new();

    if d.selected_date.is_some() || d.selected_time.is_some() {
        lines.push("Requested Session:".into());
        lines.push(format!(
            "- Date: {}",
            d.selected_date
                .map(|date| date.format("%B %-d, %Y").to_string())
                .unwrap_or_else(|| "-".into())
        ));
        lines.push(format!(
            "- Time: {}",
            d.selected_time
                .map(|slot| slot.label())
                .unwrap_or_else(|| "-".into())
        ));
        lines.push(String::new());
    }

    lines.push("Personal Information:".into());
    lines.push(format!("- Name: {}", or_dash(&d.full_name())));
    lines.push(format!("- Email: {}", or_dash(&d.email)));
    lines.push(format!("- Phone: {}", d.full_phone().trim()));
    lines.push(format!(
        "- Age: {}",
        d.age.map(|a| a.to_string()).unwrap_or_else(|| "-".into())
    ));
    lines.push(format!("- Location: {}", or_dash(&d.location)));
    lines.push(format!("- Occupation: {}", or_dash(&d.occupation)));
    lines.push(format!("- Description: {}", or_dash(&d.description)));
    lines.push(String::new());

    lines.push("Goals & Expectations:".into());
    lines.push(format!("- Current Situation: {}", or_dash(&d.current_situation)));
    lines.push(format!("- Background: {}", or_dash(&d.background)));
    lines.push(format!("- Passions: {}", or_dash(&d.passions)));
    lines.push(format!("- Top 3 Goals: {}", or_dash(&d.top_three_goals)));
    lines.push(format!("- Challenges: {}", or_dash(&d.challenges)));
    let areas: Vec<&str> = d.improvement_areas.iter().map(|a| a.label()).collect();
    lines.push(format!("- Improvement Areas: {}", or_dash(&areas.join(", "))));
    lines.push(format!("- Success Vision: {}", or_dash(&d.success_vision)));
    lines.push(format!("- Previous Attempts: {}", or_dash(&d.previous_attempts)));
    lines.push(format!("- Support Type: {}", or_dash(&d.support_type.join(", "))));
    lines.push(format!("- Confidence Level: {}", or_dash(&d.confidence_level)));
    lines.push(format!("- Uncertainty Reason: {}", or_dash(&d.uncertainty_reason)));
    lines.push(String::new());

    lines.push("Investment:".into());
    lines.push(format!(
        "- Commitment Level: {}/10",
        d.commitment_level
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".into())
    ));
    lines.push(format!("- Resource Investment: {}", or_dash(&d.resource_investment)));
    lines.push(format!("- Open to New Strategies: {}", yes_no(d.open_to_strategies)));
    lines.push(String::new());

    lines.push("Session Preferences:".into());
    lines.push(format!(
        "- Package Hours: {}",
        d.package
            .map(|p| p.hours().to_string())
            .unwrap_or_else(|| "-".into())
    ));
    if d.package.is_some_and(|p| p.is_multi_session()) {
        lines.push(format!(
            "- Distributed Over Multiple Weeks: {}",
            yes_no(d.distribute_sessions)
        ));
    }
    let days: Vec<&str> = d.available_days.iter().map(|day| weekday_name(*day)).collect();
    lines.push(format!("- Available Days: {}", or_dash(&days.join(", "))));
    lines.push(format!(
        "- Time Range: {}",
        d.time_range.map(|t| t.label()).unwrap_or("-")
    ));
    lines.push(format!(
        "- Platform: {}",
        d.platform.map(|p| p.label()).unwrap_or("-")
    ));
    lines.push(String::new());

    lines.push("Payment Details:".into());
    lines.push(format!(
        "- Total Cost: {}",
        d.total_cost().map(format_usd).unwrap_or_else(|| "-".into())
    ));
    lines.push(format!(
        "- Payment Method: {}",
        d.payment_method.map(|m| m.label()).unwrap_or("-")
    ));
    lines.push(format!("- Billing Street: {}", or_dash(&d.billing_street)));
    lines.push(format!("- Billing City: {}", or_dash(&d.billing_city)));
    lines.push(format!(
        "- Terms Accepted: {}",
        if d.terms_accepted { "Yes" } else { "No" }
    ));
    lines.push(String::new());

    lines.push("Final Thoughts:".into());
    lines.push(format!("- Additional Info: {}", or_dash(&d.additional_info)));
    lines.push(format!("- Follow-up Call: {}", yes_no(d.follow_up_call)));
    if d.follow_up_call == Some(true) {
        lines.push(format!(
            "- Preferred Follow-up Time: {}",
            d.follow_up_time.map(|w| w.label()).unwrap_or("-")
        ));
    }

    lines.join("\n")
}
