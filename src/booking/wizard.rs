//! BookingWizard: coordinates navigation, validation, availability lookups
//! and the final submission for one booking session.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tokio::task::{AbortHandle, JoinHandle};

use crate::error::WizardError;
use crate::services::availability::{
    Attendee, AvailabilityResult, AvailabilityService, BookingConfirmation, availability_fallback,
};
use crate::services::relay::Submitter;

use super::fields::{Field, Step, StepPlan};
use super::input;
use super::model::{BookingDraft, TimeSlot};
use super::notify::{
    DATE_UNAVAILABLE_MESSAGE, Notification, Notifier, REQUIRED_FIELDS_MESSAGE,
    SUBMISSION_FAILED_MESSAGE,
};
use super::state::WizardState;
use super::validate::{FieldError, FieldErrors, validate_field, validate_fields};

/// Shown once the booking request went through.
pub const SUBMITTED_MESSAGE: &str = "Your booking request has been submitted!";
/// Shown when the request went out but the slot could not be held.
pub const RESERVATION_FAILED_MESSAGE: &str =
    "Your request was sent, but the time slot could not be reserved. We will confirm it by email.";

/// Outcome of pressing Next or Previous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The wizard moved between steps.
    Moved { from: u8, to: u8 },
    /// Nothing to do, e.g. Previous on step 1.
    Unchanged,
    /// Required fields on `step` are missing or invalid.
    Blocked { step: u8, errors: FieldErrors },
    /// The booking was delivered; controls are now hidden.
    Submitted,
    /// Delivery failed; the final step can be submitted again.
    SubmissionFailed,
    /// The wizard was closed while the submission was in flight.
    SubmissionCancelled,
    /// A submission is in flight; the press was ignored.
    Busy,
    /// Controls are hidden after a successful submission.
    Hidden,
    /// The wizard was closed.
    Closed,
}

/// Read-only view of the wizard for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct WizardSnapshot {
    pub state: WizardState,
    pub step: Option<Step>,
    pub draft: BookingDraft,
    pub errors: FieldErrors,
    pub offered_slots: Vec<TimeSlot>,
    pub confirmation: Option<BookingConfirmation>,
}

impl WizardSnapshot {
    /// Fields to prompt for on the current step, given current answers.
    pub fn visible_fields(&self) -> Vec<Field> {
        self.step
            .map(|step| {
                step.input_fields()
                    .iter()
                    .copied()
                    .filter(|f| f.is_visible(&self.draft))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// One booking session.
///
/// Collaborator calls run as spawned tasks owned by the wizard; `close()`
/// or dropping the wizard aborts whatever is still in flight.
pub struct BookingWizard {
    plan: StepPlan,
    draft: Arc<RwLock<BookingDraft>>,
    state: Arc<RwLock<WizardState>>,
    errors: RwLock<FieldErrors>,
    offered_slots: RwLock<Vec<TimeSlot>>,
    confirmation: Arc<RwLock<Option<BookingConfirmation>>>,
    availability: Arc<dyn AvailabilityService>,
    submitter: Arc<dyn Submitter>,
    notifier: Arc<dyn Notifier>,
    tasks: Mutex<Vec<AbortHandle>>,
    date_epoch: AtomicU64,
    closed: AtomicBool,
}

impl BookingWizard {
    pub fn new(
        availability: Arc<dyn AvailabilityService>,
        submitter: Arc<dyn Submitter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::with_plan(StepPlan::default(), availability, submitter, notifier)
    }

    pub fn with_plan(
        plan: StepPlan,
        availability: Arc<dyn AvailabilityService>,
        submitter: Arc<dyn Submitter>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            plan,
            draft: Arc::new(RwLock::new(BookingDraft::default())),
            state: Arc::new(RwLock::new(WizardState::new(plan.len()))),
            errors: RwLock::new(FieldErrors::new()),
            offered_slots: RwLock::new(Vec::new()),
            confirmation: Arc::new(RwLock::new(None)),
            availability,
            submitter,
            notifier,
            tasks: Mutex::new(Vec::new()),
            date_epoch: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn plan(&self) -> StepPlan {
        self.plan
    }

    pub async fn state(&self) -> WizardState {
        *self.state.read().await
    }

    pub async fn draft(&self) -> BookingDraft {
        self.draft.read().await.clone()
    }

    pub async fn errors(&self) -> FieldErrors {
        self.errors.read().await.clone()
    }

    pub async fn offered_slots(&self) -> Vec<TimeSlot> {
        self.offered_slots.read().await.clone()
    }

    /// Reservation made with the availability provider, if any.
    pub async fn confirmation(&self) -> Option<BookingConfirmation> {
        self.confirmation.read().await.clone()
    }

    pub async fn snapshot(&self) -> WizardSnapshot {
        let state = self.state().await;
        WizardSnapshot {
            state,
            step: self.plan.step(state.current_step()),
            draft: self.draft().await,
            errors: self.errors().await,
            offered_slots: self.offered_slots().await,
            confirmation: self.confirmation().await,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // ── Editing ─────────────────────────────────────────────────────

    /// Mutate the draft directly. Fields that currently show an error are
    /// checked again so fixed answers clear their message.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut BookingDraft),
    {
        let draft = {
            let mut draft = self.draft.write().await;
            f(&mut draft);
            draft.clone()
        };
        let mut errors = self.errors.write().await;
        for field in errors.fields() {
            errors.record(field, validate_field(&draft, field));
        }
    }

    /// Validate a single field, as when it loses focus.
    pub async fn touch(&self, field: Field) -> Result<(), FieldError> {
        let outcome = {
            let draft = self.draft.read().await;
            validate_field(&draft, field)
        };
        if let Err(e) = &outcome {
            tracing::debug!(field = %field, error = ?e, "Field failed validation");
        }
        self.errors.write().await.record(field, outcome.clone());
        outcome
    }

    /// Apply a raw text answer to `field` and validate it.
    ///
    /// A date goes through the availability lookup; a time must be one of
    /// the slots offered for the selected date.
    pub async fn set_field(&self, field: Field, raw: &str) -> Result<(), FieldError> {
        let outcome = match field {
            Field::SelectedDate => match input::parse_date(raw) {
                Ok(date) => {
                    self.select_date(date).await;
                    return Ok(());
                }
                Err(e) => Err(e),
            },
            Field::SelectedTime => {
                let offered = self.offered_slots().await;
                match input::parse_slot(raw, &offered) {
                    Ok(slot) => return self.select_time(slot).await,
                    Err(e) => Err(e),
                }
            }
            _ => {
                let applied = {
                    let mut draft = self.draft.write().await;
                    input::apply(&mut draft, field, raw)
                };
                match applied {
                    Ok(()) => return self.touch(field).await,
                    Err(e) => Err(e),
                }
            }
        };
        self.errors.write().await.record(field, outcome.clone());
        outcome
    }

    /// Select a date and look up its open slots.
    ///
    /// The date is held optimistically and rolled back when the lookup
    /// says it cannot be booked or fails. A newer selection supersedes the
    /// result of an older one still in flight.
    pub async fn select_date(&self, date: NaiveDate) -> AvailabilityResult {
        if self.is_closed() {
            return AvailabilityResult::unavailable();
        }
        let epoch = self.date_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut draft = self.draft.write().await;
            draft.selected_date = Some(date);
            draft.selected_time = None;
        }
        self.offered_slots.write().await.clear();

        let service = self.availability.clone();
        let handle = tokio::spawn(async move { service.check(date).await });
        let joined = self.join_tracked(handle).await;

        let result = match joined {
            Ok(Ok(result)) => {
                tracing::debug!(
                    provider = self.availability.name(),
                    %date,
                    available = result.available,
                    slots = result.time_slots.len(),
                    "Availability checked"
                );
                if !result.available && self.is_current_epoch(epoch) {
                    self.notifier
                        .notify(Notification::warning(DATE_UNAVAILABLE_MESSAGE));
                }
                result
            }
            Ok(Err(e)) => {
                if self.is_current_epoch(epoch) {
                    availability_fallback(self.availability.name(), date, &e, self.notifier.as_ref())
                } else {
                    AvailabilityResult::unavailable()
                }
            }
            Err(e) if e.is_cancelled() => {
                tracing::warn!(%date, "Availability check cancelled");
                AvailabilityResult::unavailable()
            }
            Err(e) => {
                tracing::error!(%date, "Availability task failed: {}", e);
                AvailabilityResult::unavailable()
            }
        };

        if !self.is_current_epoch(epoch) {
            tracing::debug!(%date, "Discarding superseded availability result");
            return result;
        }

        if result.available {
            *self.offered_slots.write().await = result.time_slots.clone();
            self.errors.write().await.clear(Field::SelectedDate);
        } else {
            let mut draft = self.draft.write().await;
            if draft.selected_date == Some(date) {
                draft.selected_date = None;
                draft.selected_time = None;
            }
        }
        result
    }

    /// Pick one of the offered slots for the selected date.
    pub async fn select_time(&self, slot: TimeSlot) -> Result<(), FieldError> {
        let offered = self.offered_slots().await;
        if !offered.contains(&slot) {
            let err = FieldError::Unparsable {
                input: slot.label(),
            };
            self.errors
                .write()
                .await
                .record(Field::SelectedTime, Err(err.clone()));
            return Err(err);
        }
        self.draft.write().await.selected_time = Some(slot);
        self.touch(Field::SelectedTime).await
    }

    // ── Navigation ──────────────────────────────────────────────────

    /// Go back one step. No-op on step 1 and while submitting.
    pub async fn previous(&self) -> Transition {
        if self.is_closed() {
            return Transition::Closed;
        }
        let mut state = self.state.write().await;
        let from = state.current_step();
        match state.retreat() {
            Ok(to) if to == from => Transition::Unchanged,
            Ok(to) => {
                tracing::debug!(from, to, "Wizard moved back");
                Transition::Moved { from, to }
            }
            Err(e) => refused(e),
        }
    }

    /// Validate the current step, then advance or, on the final step,
    /// submit the booking.
    pub async fn next(&self) -> Transition {
        if self.is_closed() {
            return Transition::Closed;
        }
        let state = self.state().await;
        if state.is_submitted() {
            return Transition::Hidden;
        }
        if state.is_submitting() {
            return Transition::Busy;
        }

        let step = state.current_step();
        let fields = self.plan.fields_for_step(step);
        let draft = self.draft().await;
        let step_errors = validate_fields(&draft, fields);
        {
            let mut errors = self.errors.write().await;
            for field in fields {
                errors.clear(*field);
            }
            errors.extend(step_errors.clone());
        }

        if !step_errors.is_empty() {
            tracing::info!(step, invalid = ?step_errors.fields(), "Step blocked by validation");
            self.notifier
                .notify(Notification::blocking_error(REQUIRED_FIELDS_MESSAGE));
            return Transition::Blocked {
                step,
                errors: step_errors,
            };
        }

        if state.is_final_step() {
            return self.submit(draft).await;
        }

        let mut state = self.state.write().await;
        if state.current_step() != step {
            return Transition::Unchanged;
        }
        match state.advance() {
            Ok(to) => {
                tracing::info!(from = step, to, "Wizard advanced");
                Transition::Moved { from: step, to }
            }
            Err(e) => refused(e),
        }
    }

    /// Runs the whole submission in one tracked task, so the outcome is
    /// recorded even if the caller stops waiting for it.
    async fn submit(&self, draft: BookingDraft) -> Transition {
        let claim = {
            let mut state = self.state.write().await;
            if let Err(e) = state.begin_submission() {
                return refused(e);
            }
            SubmissionClaim::new(self.state.clone())
        };
        tracing::info!(email = %draft.email, "Submitting booking request");

        let job = Submission {
            claim,
            submitter: self.submitter.clone(),
            availability: self.availability.clone(),
            notifier: self.notifier.clone(),
            confirmation: self.confirmation.clone(),
        };
        let handle = tokio::spawn(job.run(draft));

        match self.join_tracked(handle).await {
            Ok(transition) => transition,
            Err(e) if e.is_cancelled() => {
                tracing::warn!("Booking submission cancelled");
                Transition::SubmissionCancelled
            }
            Err(e) => {
                tracing::error!("Submission task failed: {}", e);
                self.notifier
                    .notify(Notification::blocking_error(SUBMISSION_FAILED_MESSAGE));
                Transition::SubmissionFailed
            }
        }
    }

    // ── Task ownership ──────────────────────────────────────────────

    /// Abort in-flight collaborator calls and refuse further input.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let handles = match self.tasks.lock() {
            Ok(mut tasks) => std::mem::take(&mut *tasks),
            Err(_) => return,
        };
        let in_flight = handles.iter().filter(|h| !h.is_finished()).count();
        for handle in handles {
            handle.abort();
        }
        tracing::info!(in_flight, "Booking wizard closed");
    }

    async fn join_tracked<T>(&self, handle: JoinHandle<T>) -> Result<T, tokio::task::JoinError> {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.retain(|h| !h.is_finished());
            tasks.push(handle.abort_handle());
        }
        // close() may have run between the spawn and the push above.
        if self.is_closed() {
            handle.abort();
        }
        handle.await
    }

    fn is_current_epoch(&self, epoch: u64) -> bool {
        self.date_epoch.load(Ordering::SeqCst) == epoch
    }
}

impl Drop for BookingWizard {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.get_mut() {
            for handle in tasks.drain(..) {
                handle.abort();
            }
        }
    }
}

// ── Submission task ─────────────────────────────────────────────────

/// Holds `is_submitting` for one submission. Dropped without `finish`
/// (task aborted or panicked), it releases the flag as a failure.
struct SubmissionClaim {
    state: Arc<RwLock<WizardState>>,
    armed: bool,
}

impl SubmissionClaim {
    fn new(state: Arc<RwLock<WizardState>>) -> Self {
        Self { state, armed: true }
    }

    async fn finish(mut self, delivered: bool) {
        self.state.write().await.finish_submission(delivered);
        self.armed = false;
    }
}

impl Drop for SubmissionClaim {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Ok(mut state) = self.state.try_write() {
            state.finish_submission(false);
            return;
        }
        let state = self.state.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move { state.write().await.finish_submission(false) });
        }
    }
}

/// Everything the submission task needs once it is detached from the wizard.
struct Submission {
    claim: SubmissionClaim,
    submitter: Arc<dyn Submitter>,
    availability: Arc<dyn AvailabilityService>,
    notifier: Arc<dyn Notifier>,
    confirmation: Arc<RwLock<Option<BookingConfirmation>>>,
}

impl Submission {
    async fn run(self, draft: BookingDraft) -> Transition {
        let Submission {
            claim,
            submitter,
            availability,
            notifier,
            confirmation,
        } = self;

        let delivered = submitter.submit(&draft).await;
        claim.finish(delivered).await;

        if !delivered {
            notifier.notify(Notification::blocking_error(SUBMISSION_FAILED_MESSAGE));
            return Transition::SubmissionFailed;
        }

        if let Some(reserved) = reserve_slot(availability.as_ref(), notifier.as_ref(), &draft).await
        {
            *confirmation.write().await = Some(reserved);
        }
        notifier.notify(Notification::success(SUBMITTED_MESSAGE));
        Transition::Submitted
    }
}

/// Hold the chosen slot with the availability provider. Failure here
/// does not undo the delivered request.
async fn reserve_slot(
    availability: &dyn AvailabilityService,
    notifier: &dyn Notifier,
    draft: &BookingDraft,
) -> Option<BookingConfirmation> {
    let (Some(date), Some(slot)) = (draft.selected_date, draft.selected_time) else {
        return None;
    };
    let attendee = Attendee {
        name: draft.full_name(),
        email: draft.email.trim().to_string(),
    };
    match availability.create_booking(date, slot, &attendee).await {
        Ok(confirmation) => {
            tracing::info!(reference = %confirmation.reference, "Slot reserved");
            Some(confirmation)
        }
        Err(e) => {
            tracing::warn!(%date, slot = %slot, "Slot reservation failed: {}", e);
            notifier.notify(Notification::warning(RESERVATION_FAILED_MESSAGE));
            None
        }
    }
}

fn refused(error: WizardError) -> Transition {
    match error {
        WizardError::SubmissionInFlight => Transition::Busy,
        WizardError::AlreadySubmitted => Transition::Hidden,
        WizardError::AtFinalStep { .. }
        | WizardError::NotOnFinalStep { .. }
        | WizardError::StepOutOfRange { .. } => Transition::Unchanged,
    }
}

// ── Tests ───────────────────────────────────────────────────────────
