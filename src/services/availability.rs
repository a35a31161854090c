//! Availability collaborator: which dates can be booked, and at what times.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::model::TimeSlot;
use crate::booking::notify::{AVAILABILITY_FAILED_MESSAGE, Notification, Notifier};
use crate::error::AvailabilityError;

/// Bookable slots offered on an open day.
pub fn slot_catalog() -> Vec<TimeSlot> {
    [(9, 0), (10, 0), (11, 0), (14, 0), (15, 0), (16, 0)]
        .into_iter()
        .filter_map(|(h, m)| TimeSlot::at(h, m))
        .collect()
}

/// Outcome of one availability lookup. Not cached between lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResult {
    pub available: bool,
    pub time_slots: Vec<TimeSlot>,
}

impl AvailabilityResult {
    pub fn open(time_slots: Vec<TimeSlot>) -> Self {
        Self {
            available: !time_slots.is_empty(),
            time_slots,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            time_slots: Vec::new(),
        }
    }
}

/// Who the reserved slot is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attendee {
    pub name: String,
    pub email: String,
}

/// Reference returned after a slot was reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub reference: String,
    pub date: NaiveDate,
    pub slot: TimeSlot,
}

/// Source of truth for open dates and slots.
#[async_trait]
pub trait AvailabilityService: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Look up whether `date` can be booked and which slots are open.
    async fn check(&self, date: NaiveDate) -> Result<AvailabilityResult, AvailabilityError>;

    /// Reserve `slot` on `date` for `attendee`.
    async fn create_booking(
        &self,
        date: NaiveDate,
        slot: TimeSlot,
        attendee: &Attendee,
    ) -> Result<BookingConfirmation, AvailabilityError>;
}

/// Check availability without failing: provider errors become an
/// unavailable result and a warning for the user.
pub async fn check_availability(
    service: &dyn AvailabilityService,
    notifier: &dyn Notifier,
    date: NaiveDate,
) -> AvailabilityResult {
    match service.check(date).await {
        Ok(result) => {
            tracing::debug!(
                provider = service.name(),
                %date,
                available = result.available,
                slots = result.time_slots.len(),
                "Availability checked"
            );
            result
        }
        Err(e) => availability_fallback(service.name(), date, &e, notifier),
    }
}

/// What a failed lookup turns into: a warning and an unavailable date.
pub(crate) fn availability_fallback(
    provider: &str,
    date: NaiveDate,
    error: &AvailabilityError,
    notifier: &dyn Notifier,
) -> AvailabilityResult {
    tracing::warn!(provider, %date, "Availability check failed: {}", error);
    notifier.notify(Notification::warning(AVAILABILITY_FAILED_MESSAGE));
    AvailabilityResult::unavailable()
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn local_reservation(date: NaiveDate, slot: TimeSlot) -> BookingConfirmation {
    BookingConfirmation {
        reference: Uuid::new_v4().to_string(),
        date,
        slot,
    }
}

/// Weekdays from today onward are open, with the full slot catalog.
#[derive(Debug, Clone, Default)]
pub struct WeekdayCalendar {
    today: Option<NaiveDate>,
}

impl WeekdayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin "today", for deterministic checks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Past dates and weekends are never bookable.
    pub fn is_open(&self, date: NaiveDate) -> bool {
        date >= self.today() && !is_weekend(date)
    }
}

#[async_trait]
impl AvailabilityService for WeekdayCalendar {
    fn name(&self) -> &str {
        "weekdays"
    }

    async fn check(&self, date: NaiveDate) -> Result<AvailabilityResult, AvailabilityError> {
        if self.is_open(date) {
            Ok(AvailabilityResult::open(slot_catalog()))
        } else {
            Ok(AvailabilityResult::unavailable())
        }
    }

    async fn create_booking(
        &self,
        date: NaiveDate,
        slot: TimeSlot,
        _attendee: &Attendee,
    ) -> Result<BookingConfirmation, AvailabilityError> {
        if !self.is_open(date) || !slot_catalog().contains(&slot) {
            return Err(AvailabilityError::SlotUnavailable {
                date,
                slot: slot.label(),
            });
        }
        Ok(local_reservation(date, slot))
    }
}

/// Weekday calendar minus a fixed list of blocked dates.
#[derive(Debug, Clone, Default)]
pub struct BlockedDatesCalendar {
    calendar: WeekdayCalendar,
    blocked: BTreeSet<NaiveDate>,
}

impl BlockedDatesCalendar {
    pub fn new(blocked: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            calendar: WeekdayCalendar::new(),
            blocked: blocked.into_iter().collect(),
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.calendar = self.calendar.with_today(today);
        self
    }

    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.blocked.contains(&date)
    }
}

#[async_trait]
impl AvailabilityService for BlockedDatesCalendar {
    fn name(&self) -> &str {
        "blocked-dates"
    }

    async fn check(&self, date: NaiveDate) -> Result<AvailabilityResult, AvailabilityError> {
        if self.is_blocked(date) {
            return Ok(AvailabilityResult::unavailable());
        }
        self.calendar.check(date).await
    }

    async fn create_booking(
        &self,
        date: NaiveDate,
        slot: TimeSlot,
        attendee: &Attendee,
    ) -> Result<BookingConfirmation, AvailabilityError> {
        if self.is_blocked(date) {
            return Err(AvailabilityError::SlotUnavailable {
                date,
                slot: slot.label(),
            });
        }
        self.calendar.create_booking(date, slot, attendee).await
    }
}

/// Delays every call to another service, to mimic network latency.
pub struct SimulatedLatency {
    inner: Arc<dyn AvailabilityService>,
    delay: Duration,
}

impl SimulatedLatency {
    pub fn new(inner: Arc<dyn AvailabilityService>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl AvailabilityService for SimulatedLatency {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn check(&self, date: NaiveDate) -> Result<AvailabilityResult, AvailabilityError> {
        tokio::time::sleep(self.delay).await;
        self.inner.check(date).await
    }

    async fn create_booking(
        &self,
        date: NaiveDate,
        slot: TimeSlot,
        attendee: &Attendee,
    ) -> Result<BookingConfirmation, AvailabilityError> {
        tokio::time::sleep(self.delay).await;
        self.inner.create_booking(date, slot, attendee).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::notify::NotificationLog;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-11-02 is a Monday.
    const TODAY: (i32, u32, u32) = (2026, 11, 2);

    fn today() -> NaiveDate {
        date(TODAY.0, TODAY.1, TODAY.2)
    }

    struct FailingProvider;

    #[async_trait]
    impl AvailabilityService for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn check(&self, _date: NaiveDate) -> Result<AvailabilityResult, AvailabilityError> {
            Err(AvailabilityError::Status {
                provider: "failing".into(),
                status: 503,
            })
        }

        async fn create_booking(
            &self,
            date: NaiveDate,
            slot: TimeSlot,
            _attendee: &Attendee,
        ) -> Result<BookingConfirmation, AvailabilityError> {
            Err(AvailabilityError::SlotUnavailable {
                date,
                slot: slot.label(),
            })
        }
    }

    fn attendee() -> Attendee {
        Attendee {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
        }
    }

    #[test]
    fn catalog_has_six_slots() {
        let labels: Vec<String> = slot_catalog().iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            ["09:00 AM", "10:00 AM", "11:00 AM", "02:00 PM", "03:00 PM", "04:00 PM"]
        );
    }

    #[test]
    fn result_serializes_camel_case() {
        let json = serde_json::to_value(AvailabilityResult::open(slot_catalog())).unwrap();
        assert_eq!(json["available"], true);
        assert_eq!(json["timeSlots"][0], "09:00 AM");
    }

    #[tokio::test]
    async fn open_weekday_offers_catalog() {
        let calendar = WeekdayCalendar::new().with_today(today());
        let result = calendar.check(date(2026, 11, 4)).await.unwrap();
        assert!(result.available);
        assert_eq!(result.time_slots, slot_catalog());
    }

    #[tokio::test]
    async fn weekends_and_past_dates_are_closed() {
        let calendar = WeekdayCalendar::new().with_today(today());
        assert_eq!(
            calendar.check(date(2026, 11, 7)).await.unwrap(),
            AvailabilityResult::unavailable()
        );
        assert_eq!(
            calendar.check(date(2026, 10, 30)).await.unwrap(),
            AvailabilityResult::unavailable()
        );
        assert!(calendar.check(today()).await.unwrap().available);
    }

    #[tokio::test]
    async fn blocked_date_is_unavailable() {
        let blocked = date(2026, 11, 26);
        let calendar = BlockedDatesCalendar::new([blocked]).with_today(today());
        let result = calendar.check(blocked).await.unwrap();
        assert!(!result.available);
        assert!(result.time_slots.is_empty());

        let open = calendar.check(date(2026, 11, 25)).await.unwrap();
        assert!(open.available);
        assert_eq!(open.time_slots.len(), 6);
    }

    #[tokio::test]
    async fn local_booking_rejects_closed_slots() {
        let calendar = BlockedDatesCalendar::new([date(2026, 11, 26)]).with_today(today());
        let slot = TimeSlot::at(9, 0).unwrap();

        let confirmation = calendar
            .create_booking(date(2026, 11, 5), slot, &attendee())
            .await
            .unwrap();
        assert_eq!(confirmation.slot, slot);
        assert!(Uuid::parse_str(&confirmation.reference).is_ok());

        assert!(matches!(
            calendar.create_booking(date(2026, 11, 26), slot, &attendee()).await,
            Err(AvailabilityError::SlotUnavailable { .. })
        ));
        let off_catalog = TimeSlot::at(13, 0).unwrap();
        assert!(
            calendar
                .create_booking(date(2026, 11, 5), off_catalog, &attendee())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn failures_become_unavailable_with_warning() {
        let notifier = NotificationLog::new();
        let result = check_availability(&FailingProvider, &notifier, today()).await;
        assert_eq!(result, AvailabilityResult::unavailable());
        assert!(notifier.contains(AVAILABILITY_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn success_raises_no_warning() {
        let notifier = NotificationLog::new();
        let calendar = WeekdayCalendar::new().with_today(today());
        let result = check_availability(&calendar, &notifier, today()).await;
        assert!(result.available);
        assert!(notifier.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_latency_delays_then_delegates() {
        let inner: Arc<dyn AvailabilityService> = Arc::new(WeekdayCalendar::new().with_today(today()));
        let slow = SimulatedLatency::new(inner, Duration::from_millis(800));

        let started = tokio::time::Instant::now();
        let result = slow.check(date(2026, 11, 3)).await.unwrap();
        assert!(result.available);
        assert!(started.elapsed() >= Duration::from_millis(800));
        assert_eq!(slow.name(), "weekdays");
    }
}
