//! Scheduling provider: availability and reservations from a Cal.com-style API.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, TimeDelta};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::booking::model::TimeSlot;
use crate::error::AvailabilityError;

use super::availability::{
    AvailabilityResult, AvailabilityService, Attendee, BookingConfirmation, WeekdayCalendar,
    slot_catalog,
};

const PROVIDER: &str = "scheduling-provider";

/// Length of one coaching session.
fn session_length() -> TimeDelta {
    TimeDelta::hours(1)
}

#[derive(Debug, Deserialize)]
struct SchedulesResponse {
    #[serde(default)]
    schedules: Vec<Schedule>,
}

#[derive(Debug, Deserialize)]
struct Schedule {
    #[serde(default)]
    availability: Vec<AvailabilityWindow>,
}

/// Weekly open hours. `days` counts from Sunday = 0.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityWindow {
    #[serde(default)]
    days: Vec<u32>,
    start_time: String,
    end_time: String,
}

impl AvailabilityWindow {
    fn covers(&self, weekday_from_sunday: u32, slot: TimeSlot) -> bool {
        if !self.days.contains(&weekday_from_sunday) {
            return false;
        }
        let (Some(start), Some(end)) = (parse_clock(&self.start_time), parse_clock(&self.end_time))
        else {
            return false;
        };
        slot.time() >= start && slot.time() + session_length() <= end
    }
}

fn parse_clock(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

#[derive(Debug, Deserialize)]
struct BookingResponse {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    uid: Option<String>,
}

/// Availability backed by the scheduling provider's HTTP API.
///
/// Past dates and weekends are closed before the provider is asked. An
/// account with no configured schedule offers the whole slot catalog.
pub struct SchedulingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    event_type_id: u64,
    calendar: WeekdayCalendar,
}

impl SchedulingProvider {
    pub fn new(base_url: impl Into<String>, api_key: SecretString, event_type_id: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            event_type_id,
            calendar: WeekdayCalendar::new(),
        }
    }

    /// Pin "today", for deterministic checks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.calendar = self.calendar.with_today(today);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    fn request_failed(e: reqwest::Error) -> AvailabilityError {
        AvailabilityError::RequestFailed {
            provider: PROVIDER.into(),
            reason: e.to_string(),
        }
    }

    fn invalid_response(e: reqwest::Error) -> AvailabilityError {
        AvailabilityError::InvalidResponse {
            provider: PROVIDER.into(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl AvailabilityService for SchedulingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn check(&self, date: NaiveDate) -> Result<AvailabilityResult, AvailabilityError> {
        if !self.calendar.is_open(date) {
            return Ok(AvailabilityResult::unavailable());
        }

        let resp = self
            .client
            .get(self.url("schedules"))
            .bearer_auth(self.api_key.expose_secret())
            .query(&[("date", date.format("%Y-%m-%d").to_string())])
            .send()
            .await
            .map_err(Self::request_failed)?;

        if !resp.status().is_success() {
            return Err(AvailabilityError::Status {
                provider: PROVIDER.into(),
                status: resp.status().as_u16(),
            });
        }

        let body: SchedulesResponse = resp.json().await.map_err(Self::invalid_response)?;
        let windows: Vec<&AvailabilityWindow> = body
            .schedules
            .iter()
            .flat_map(|s| s.availability.iter())
            .collect();

        if windows.is_empty() {
            tracing::debug!(%date, "Provider has no schedule configured; offering full catalog");
            return Ok(AvailabilityResult::open(slot_catalog()));
        }

        let day = date.weekday().num_days_from_sunday();
        let slots = slot_catalog()
            .into_iter()
            .filter(|slot| windows.iter().any(|w| w.covers(day, *slot)))
            .collect();
        Ok(AvailabilityResult::open(slots))
    }

    async fn create_booking(
        &self,
        date: NaiveDate,
        slot: TimeSlot,
        attendee: &Attendee,
    ) -> Result<BookingConfirmation, AvailabilityError> {
        let start = date.and_time(slot.time());
        let end = start + session_length();
        let payload = serde_json::json!({
            "eventTypeId": self.event_type_id,
            "start": start.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "end": end.format("%Y-%m-%dT%H:%M:%S").to_string(),
            "responses": {
                "name": attendee.name,
                "email": attendee.email,
            },
        });

        let resp = self
            .client
            .post(self.url("bookings"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(Self::request_failed)?;

        if !resp.status().is_success() {
            return Err(AvailabilityError::Status {
                provider: PROVIDER.into(),
                status: resp.status().as_u16(),
            });
        }

        let body: BookingResponse = resp.json().await.map_err(Self::invalid_response)?;
        let reference = body
            .uid
            .or_else(|| {
                body.id.map(|id| match id {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
            })
            .ok_or_else(|| AvailabilityError::InvalidResponse {
                provider: PROVIDER.into(),
                reason: "booking response carried no id".into(),
            })?;

        tracing::info!(%date, slot = %slot, reference = %reference, "Slot reserved with provider");
        Ok(BookingConfirmation {
            reference,
            date,
            slot,
        })
    }
}
