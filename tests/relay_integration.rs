//! Integration tests for the HTTP collaborators.
//!
//! Each test spins up an Axum server on a random port standing in for the
//! form relay or the scheduling provider, and drives the real reqwest
//! clients against it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Weekday};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use session_booking::booking::message::BookingMessage;
use session_booking::booking::model::{
    ImprovementArea, PaymentMethod, Platform, SessionPackage, TimeRange, TimeSlot,
};
use session_booking::booking::notify::{AVAILABILITY_FAILED_MESSAGE, SUBMISSION_FAILED_MESSAGE};
use session_booking::booking::{BookingDraft, BookingWizard, NotificationLog, StepPlan, Transition};
use session_booking::config::BookingConfig;
use session_booking::error::{AvailabilityError, SubmissionError};
use session_booking::services::relay::DEFAULT_RELAY_REDIRECT;
use session_booking::services::{
    AvailabilityService, Attendee, HttpRelay, RecordingHandoff, RelaySubmitter, SchedulingProvider,
    SubmissionTransport, Submitter, WeekdayCalendar, check_availability,
};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// What the fake servers saw.
#[derive(Default)]
struct Recorded {
    bodies: Mutex<Vec<Value>>,
    auth: Mutex<Vec<String>>,
    queries: Mutex<Vec<HashMap<String, String>>>,
}

#[derive(Clone)]
struct FakeState {
    recorded: Arc<Recorded>,
    reply: Value,
    status: StatusCode,
}

async fn relay_submit(State(state): State<FakeState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    state.recorded.bodies.lock().unwrap().push(body);
    (state.status, Json(state.reply.clone()))
}

fn record_auth(state: &FakeState, headers: &HeaderMap) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.recorded.auth.lock().unwrap().push(auth);
}

async fn provider_schedules(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    record_auth(&state, &headers);
    state.recorded.queries.lock().unwrap().push(query);
    (state.status, Json(state.reply.clone()))
}

async fn provider_bookings(
    State(state): State<FakeState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    record_auth(&state, &headers);
    state.recorded.bodies.lock().unwrap().push(body);
    (
        StatusCode::OK,
        Json(json!({ "id": 981, "uid": "bk_9f2c" })),
    )
}

/// Start an Axum server on a random port, return its base URL.
async fn start_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}")
}

async fn start_relay(reply: Value, status: StatusCode) -> (String, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());
    let state = FakeState {
        recorded: recorded.clone(),
        reply,
        status,
    };
    let app = Router::new()
        .route("/submit", post(relay_submit))
        .with_state(state);
    let base = start_server(app).await;
    (format!("{base}/submit"), recorded)
}

async fn start_provider(schedules: Value, status: StatusCode) -> (String, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());
    let state = FakeState {
        recorded: recorded.clone(),
        reply: schedules,
        status,
    };
    let app = Router::new()
        .route("/v1/schedules", get(provider_schedules))
        .route("/v1/bookings", post(provider_bookings))
        .with_state(state);
    let base = start_server(app).await;
    (format!("{base}/v1"), recorded)
}

fn draft() -> BookingDraft {
    BookingDraft {
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        email: "jane@example.com".into(),
        location: "Austin".into(),
        ..Default::default()
    }
}

/// A draft that passes every step of the six-step plan.
fn complete_draft() -> BookingDraft {
    let mut d = draft();
    d.phone_number = "512 555 0100".into();
    d.occupation = "Founder".into();
    d.description = "Building a second company.".into();
    d.current_situation = "Exited first startup".into();
    d.background = "Engineering".into();
    d.passions = "Climbing".into();
    d.top_three_goals = "Focus, hire, ship".into();
    d.challenges = "Burnout".into();
    d.toggle_improvement_area(ImprovementArea::CareerBusinessDevelopment);
    d.success_vision = "A calm launch".into();
    d.previous_attempts = "Therapy".into();
    d.support_type = vec!["Strategy".into()];
    d.confidence_level = "High".into();
    d.uncertainty_reason = "Timing".into();
    d.commitment_level = Some(7);
    d.resource_investment = "Weekly call".into();
    d.open_to_strategies = Some(true);
    d.choose_package(SessionPackage::OneHour);
    d.toggle_available_day(Weekday::Fri);
    d.time_range = Some(TimeRange::Afternoon);
    d.platform = Some(Platform::Zoom);
    d.payment_method = Some(PaymentMethod::BankTransfer);
    d.terms_accepted = true;
    d.follow_up_call = Some(false);
    d
}

fn key(raw: &str) -> SecretString {
    SecretString::from(raw.to_string())
}

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, 3).unwrap()
}

#[tokio::test]
async fn relay_receives_full_payload() {
    timeout(TEST_TIMEOUT, async {
        let (url, recorded) = start_relay(json!({ "success": true }), StatusCode::OK).await;
        let relay = HttpRelay::new(url, key("relay-key")).with_redirect("https://example.com/thanks");

        relay
            .deliver(&BookingMessage::compose(&draft()))
            .await
            .unwrap();

        let bodies = recorded.bodies.lock().unwrap();
        assert_eq!(bodies.len(), 1);
        let body = &bodies[0];
        assert_eq!(body["access_key"], "relay-key");
        assert_eq!(body["subject"], "New Booking Request from Jane Doe");
        assert_eq!(body["from_name"], "Jane Doe");
        assert_eq!(body["email"], "jane@example.com");
        assert_eq!(body["redirect"], "https://example.com/thanks");
        assert!(body["message"].as_str().unwrap().contains("- Location: Austin"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn relay_reported_failure_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let (url, _) = start_relay(
            json!({ "success": false, "message": "Invalid access key" }),
            StatusCode::OK,
        )
        .await;
        let relay = HttpRelay::new(url, key("wrong"));

        let err = relay
            .deliver(&BookingMessage::compose(&draft()))
            .await
            .unwrap_err();
        assert!(
            matches!(err, SubmissionError::Rejected { ref reason, .. } if reason == "Invalid access key")
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn submitter_hands_off_only_after_success() {
    timeout(TEST_TIMEOUT, async {
        let (url, _) = start_relay(json!({ "success": true }), StatusCode::OK).await;
        let handoff = Arc::new(RecordingHandoff::new());
        let submitter = RelaySubmitter::new(Arc::new(HttpRelay::new(url, key("k"))))
            .with_handoff(handoff.clone(), "coach@example.com");
        assert!(submitter.submit(&draft()).await);
        assert_eq!(handoff.opened().len(), 1);

        let (bad_url, _) = start_relay(json!({ "error": "boom" }), StatusCode::INTERNAL_SERVER_ERROR).await;
        let handoff = Arc::new(RecordingHandoff::new());
        let submitter = RelaySubmitter::new(Arc::new(HttpRelay::new(bad_url, key("k"))))
            .with_handoff(handoff.clone(), "coach@example.com");
        assert!(!submitter.submit(&draft()).await);
        assert!(handoff.opened().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn relay_only_config_still_opens_mail_client() {
    timeout(TEST_TIMEOUT, async {
        let (url, recorded) = start_relay(json!({ "success": true }), StatusCode::OK).await;
        let env: HashMap<&str, String> = HashMap::from([
            ("BOOKING_RELAY_ACCESS_KEY", "relay-key".to_string()),
            ("BOOKING_RELAY_URL", url),
        ]);
        let config = BookingConfig::from_lookup(|key| env.get(key).cloned()).unwrap();
        assert!(config.mailto_recipient.is_none());

        let handoff = Arc::new(RecordingHandoff::new());
        let submitter = config.submitter(handoff.clone()).unwrap();
        assert!(submitter.submit(&draft()).await);

        let opened = handoff.opened();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].starts_with("mailto:?subject="));

        let bodies = recorded.bodies.lock().unwrap();
        assert_eq!(bodies[0]["redirect"], DEFAULT_RELAY_REDIRECT);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_relay_leaves_wizard_resubmittable() {
    timeout(TEST_TIMEOUT, async {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let submitter = RelaySubmitter::new(Arc::new(HttpRelay::new(
            format!("http://127.0.0.1:{port}/submit"),
            key("k"),
        )));
        let log = Arc::new(NotificationLog::new());
        let wizard = BookingWizard::with_plan(
            StepPlan::without_date_selection(),
            Arc::new(WeekdayCalendar::new()),
            Arc::new(submitter),
            log.clone(),
        );
        wizard.update(|d| *d = complete_draft()).await;

        for _ in 1..StepPlan::without_date_selection().len() {
            assert!(matches!(wizard.next().await, Transition::Moved { .. }));
        }
        assert_eq!(wizard.next().await, Transition::SubmissionFailed);

        let state = wizard.state().await;
        assert!(state.is_final_step());
        assert!(!state.is_submitting());
        assert!(!state.is_submitted());
        assert!(log.contains(SUBMISSION_FAILED_MESSAGE));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn provider_filters_catalog_by_schedule() {
    timeout(TEST_TIMEOUT, async {
        // Tuesday is day 2 counting from Sunday.
        let schedules = json!({
            "schedules": [{
                "availability": [
                    { "days": [2], "startTime": "09:00:00", "endTime": "11:00:00" },
                    { "days": [2], "startTime": "15:00:00", "endTime": "17:00:00" }
                ]
            }]
        });
        let (base, recorded) = start_provider(schedules, StatusCode::OK).await;
        let provider = SchedulingProvider::new(base, key("cal_live_123"), 7)
            .with_today(NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());

        let result = provider.check(tuesday()).await.unwrap();
        let labels: Vec<String> = result.time_slots.iter().map(|s| s.label()).collect();
        assert!(result.available);
        assert_eq!(labels, ["09:00 AM", "10:00 AM", "03:00 PM", "04:00 PM"]);

        assert_eq!(
            recorded.auth.lock().unwrap().as_slice(),
            ["Bearer cal_live_123".to_string()]
        );
        assert_eq!(
            recorded.queries.lock().unwrap()[0].get("date").map(String::as_str),
            Some("2026-11-03")
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn provider_without_schedule_offers_full_catalog() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_provider(json!({ "schedules": [] }), StatusCode::OK).await;
        let provider = SchedulingProvider::new(base, key("k"), 7)
            .with_today(NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());

        let result = provider.check(tuesday()).await.unwrap();
        assert_eq!(result.time_slots.len(), 6);

        // Weekends never reach the provider.
        let saturday = NaiveDate::from_ymd_opt(2026, 11, 7).unwrap();
        assert!(!provider.check(saturday).await.unwrap().available);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn provider_error_becomes_warning() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_provider(json!({}), StatusCode::UNAUTHORIZED).await;
        let provider = SchedulingProvider::new(base, key("expired"), 7)
            .with_today(NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());

        let err = provider.check(tuesday()).await.unwrap_err();
        assert!(matches!(err, AvailabilityError::Status { status: 401, .. }));

        let log = NotificationLog::new();
        let result = check_availability(&provider, &log, tuesday()).await;
        assert!(!result.available);
        assert!(result.time_slots.is_empty());
        assert!(log.contains(AVAILABILITY_FAILED_MESSAGE));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn provider_creates_booking() {
    timeout(TEST_TIMEOUT, async {
        let (base, recorded) = start_provider(json!({ "schedules": [] }), StatusCode::OK).await;
        let provider = SchedulingProvider::new(base, key("k"), 7)
            .with_today(NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());
        let attendee = Attendee {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
        };

        let confirmation = provider
            .create_booking(tuesday(), TimeSlot::at(14, 0).unwrap(), &attendee)
            .await
            .unwrap();
        assert_eq!(confirmation.reference, "bk_9f2c");

        let bodies = recorded.bodies.lock().unwrap();
        assert_eq!(bodies[0]["eventTypeId"], 7);
        assert_eq!(bodies[0]["start"], "2026-11-03T14:00:00");
        assert_eq!(bodies[0]["end"], "2026-11-03T15:00:00");
        assert_eq!(bodies[0]["responses"]["email"], "jane@example.com");
    })
    .await
    .expect("test timed out");
}
