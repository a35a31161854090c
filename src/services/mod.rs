//! External collaborators: availability providers, submission transports,
//! and the local mail-client handoff.

pub mod availability;
pub mod handoff;
pub mod relay;
pub mod scheduling;
pub mod smtp;

pub use availability::{
    AvailabilityResult, AvailabilityService, Attendee, BlockedDatesCalendar, BookingConfirmation,
    SimulatedLatency, WeekdayCalendar, check_availability, slot_catalog,
};
pub use handoff::{MailClientHandoff, RecordingHandoff, SystemMailClient};
pub use relay::{HttpRelay, RelaySubmitter, SubmissionTransport, Submitter};
pub use scheduling::SchedulingProvider;
pub use smtp::{SmtpRelay, SmtpSettings};
