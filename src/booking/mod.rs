//! Booking wizard core: the draft, its fields and rules, and the wizard
//! that walks a client through them.

pub mod fields;
pub mod input;
pub mod message;
pub mod model;
pub mod notify;
pub mod state;
pub mod validate;
pub mod wizard;

pub use fields::{Field, Step, StepPlan, fields_for_step};
pub use message::BookingMessage;
pub use model::{BookingDraft, SessionPackage, TimeSlot};
pub use notify::{Level, Notification, NotificationLog, Notifier};
pub use state::WizardState;
pub use validate::{FieldError, FieldErrors, validate_field, validate_fields};
pub use wizard::{BookingWizard, Transition, WizardSnapshot};
