//! Configuration types, read from `BOOKING_*` environment variables.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use secrecy::SecretString;

use crate::booking::fields::StepPlan;
use crate::booking::notify::Notifier;
use crate::booking::wizard::BookingWizard;
use crate::error::{ConfigError, Error};
use crate::services::availability::{
    AvailabilityService, BlockedDatesCalendar, SimulatedLatency, WeekdayCalendar,
};
use crate::services::handoff::MailClientHandoff;
use crate::services::relay::{
    DEFAULT_RELAY_REDIRECT, DEFAULT_RELAY_URL, HttpRelay, RelaySubmitter, SubmissionTransport,
};
use crate::services::scheduling::SchedulingProvider;
use crate::services::smtp::{SmtpRelay, SmtpSettings};

pub const DEFAULT_PROVIDER_URL: &str = "https://api.cal.com/v1";

/// Form relay settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub url: String,
    pub access_key: SecretString,
    pub redirect: String,
}

/// Scheduling provider settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub event_type_id: u64,
}

/// Which calendar decides open dates.
#[derive(Debug, Clone)]
pub enum AvailabilityMode {
    /// Weekdays from today on.
    Weekdays,
    /// Weekdays minus a fixed list.
    Blocked(Vec<NaiveDate>),
    /// The external scheduling provider.
    Provider(ProviderConfig),
}

/// Everything the booking binary needs to wire its collaborators.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    pub relay: Option<RelayConfig>,
    /// When set, requests go out by email instead of the form relay.
    pub smtp: Option<SmtpSettings>,
    /// Address for the `mailto:` handoff after a successful submission.
    /// The handoff still runs without one, leaving the address blank.
    pub mailto_recipient: Option<String>,
    pub availability: AvailabilityMode,
    pub simulated_latency: Option<Duration>,
    /// Run the six-step variant without the calendar step.
    pub skip_date_step: bool,
}

impl BookingConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mailto_recipient = get("BOOKING_MAILTO_RECIPIENT");

        let relay = get("BOOKING_RELAY_ACCESS_KEY").map(|key| RelayConfig {
            url: get("BOOKING_RELAY_URL").unwrap_or_else(|| DEFAULT_RELAY_URL.to_string()),
            access_key: SecretString::from(key),
            redirect: get("BOOKING_RELAY_REDIRECT")
                .unwrap_or_else(|| DEFAULT_RELAY_REDIRECT.to_string()),
        });

        let smtp = match get("BOOKING_SMTP_HOST") {
            Some(host) => {
                let port = match get("BOOKING_SMTP_PORT") {
                    Some(raw) => parse_number::<u16>("BOOKING_SMTP_PORT", &raw)?,
                    None => 587,
                };
                let username = get("BOOKING_SMTP_USERNAME").unwrap_or_default();
                let from_address = get("BOOKING_SMTP_FROM").unwrap_or_else(|| username.clone());
                let recipient = mailto_recipient.clone().ok_or_else(|| ConfigError::MissingRequired {
                    key: "BOOKING_MAILTO_RECIPIENT".into(),
                    hint: "SMTP delivery needs an address to send booking requests to.".into(),
                })?;
                Some(SmtpSettings {
                    host,
                    port,
                    username,
                    password: SecretString::from(get("BOOKING_SMTP_PASSWORD").unwrap_or_default()),
                    from_address,
                    recipient,
                })
            }
            None => None,
        };

        if relay.is_none() && smtp.is_none() {
            return Err(ConfigError::MissingRequired {
                key: "BOOKING_RELAY_ACCESS_KEY".into(),
                hint: "Set it, or configure BOOKING_SMTP_HOST to email requests instead.".into(),
            });
        }

        let availability = match get("BOOKING_AVAILABILITY").as_deref() {
            None | Some("weekdays") => AvailabilityMode::Weekdays,
            Some("blocked") => {
                let dates = get("BOOKING_BLOCKED_DATES").unwrap_or_default();
                AvailabilityMode::Blocked(parse_dates(&dates)?)
            }
            Some("provider") => {
                let api_key = get("BOOKING_PROVIDER_API_KEY").ok_or_else(|| {
                    ConfigError::MissingRequired {
                        key: "BOOKING_PROVIDER_API_KEY".into(),
                        hint: "The scheduling provider needs an API key.".into(),
                    }
                })?;
                let event_type_id = get("BOOKING_PROVIDER_EVENT_TYPE_ID").ok_or_else(|| {
                    ConfigError::MissingRequired {
                        key: "BOOKING_PROVIDER_EVENT_TYPE_ID".into(),
                        hint: "Bookings are created against one event type.".into(),
                    }
                })?;
                AvailabilityMode::Provider(ProviderConfig {
                    base_url: get("BOOKING_PROVIDER_URL")
                        .unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_string()),
                    api_key: SecretString::from(api_key),
                    event_type_id: parse_number("BOOKING_PROVIDER_EVENT_TYPE_ID", &event_type_id)?,
                })
            }
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "BOOKING_AVAILABILITY".into(),
                    message: format!("expected weekdays, blocked or provider, got '{other}'"),
                });
            }
        };

        let simulated_latency = match get("BOOKING_SIMULATED_LATENCY_MS") {
            Some(raw) => Some(Duration::from_millis(parse_number(
                "BOOKING_SIMULATED_LATENCY_MS",
                &raw,
            )?)),
            None => None,
        };

        let skip_date_step = match get("BOOKING_SKIP_DATE_STEP") {
            Some(raw) => parse_flag("BOOKING_SKIP_DATE_STEP", &raw)?,
            None => false,
        };

        Ok(Self {
            relay,
            smtp,
            mailto_recipient,
            availability,
            simulated_latency,
            skip_date_step,
        })
    }

    // ── Service wiring ──────────────────────────────────────────────

    pub fn step_plan(&self) -> StepPlan {
        if self.skip_date_step {
            StepPlan::without_date_selection()
        } else {
            StepPlan::with_date_selection()
        }
    }

    /// Build the configured availability calendar.
    pub fn availability_service(&self) -> Arc<dyn AvailabilityService> {
        let service: Arc<dyn AvailabilityService> = match &self.availability {
            AvailabilityMode::Weekdays => Arc::new(WeekdayCalendar::new()),
            AvailabilityMode::Blocked(dates) => {
                Arc::new(BlockedDatesCalendar::new(dates.iter().copied()))
            }
            AvailabilityMode::Provider(p) => Arc::new(SchedulingProvider::new(
                p.base_url.clone(),
                p.api_key.clone(),
                p.event_type_id,
            )),
        };
        match self.simulated_latency {
            Some(delay) if !delay.is_zero() => Arc::new(SimulatedLatency::new(service, delay)),
            _ => service,
        }
    }

    /// Build the submitter: SMTP when configured, otherwise the form relay.
    pub fn submitter(
        &self,
        handoff: Arc<dyn MailClientHandoff>,
    ) -> Result<RelaySubmitter, ConfigError> {
        let transport: Arc<dyn SubmissionTransport> = match (&self.smtp, &self.relay) {
            (Some(smtp), _) => Arc::new(SmtpRelay::new(smtp.clone())),
            (None, Some(relay)) => Arc::new(
                HttpRelay::new(relay.url.clone(), relay.access_key.clone())
                    .with_redirect(relay.redirect.clone()),
            ),
            (None, None) => {
                return Err(ConfigError::MissingRequired {
                    key: "BOOKING_RELAY_ACCESS_KEY".into(),
                    hint: "No submission transport is configured.".into(),
                });
            }
        };
        let recipient = self.mailto_recipient.clone().unwrap_or_default();
        Ok(RelaySubmitter::new(transport).with_handoff(handoff, recipient))
    }

    /// Wire a wizard with the configured step plan, calendar and submitter.
    pub fn build_wizard(
        &self,
        handoff: Arc<dyn MailClientHandoff>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<BookingWizard, Error> {
        let submitter = self.submitter(handoff)?;
        Ok(BookingWizard::with_plan(
            self.step_plan(),
            self.availability_service(),
            Arc::new(submitter),
            notifier,
        ))
    }
}

// ── Parsing helpers ─────────────────────────────────────────────────

fn parse_number<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| ConfigError::InvalidValue {
        key: key.into(),
        message: format!("'{raw}': {e}"),
    })
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected true or false, got '{raw}'"),
        }),
    }
}

fn parse_dates(raw: &str) -> Result<Vec<NaiveDate>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| ConfigError::InvalidValue {
                key: "BOOKING_BLOCKED_DATES".into(),
                message: format!("'{s}': {e}"),
            })
        })
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;
    use crate::booking::notify::NotificationLog;
    use crate::services::handoff::RecordingHandoff;

    fn config(pairs: &[(&str, &str)]) -> Result<BookingConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BookingConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn relay_defaults() {
        let cfg = config(&[("BOOKING_RELAY_ACCESS_KEY", "abc")]).unwrap();
        let relay = cfg.relay.as_ref().unwrap();
        assert_eq!(relay.url, DEFAULT_RELAY_URL);
        assert_eq!(relay.access_key.expose_secret(), "abc");
        assert_eq!(relay.redirect, DEFAULT_RELAY_REDIRECT);
        assert!(cfg.mailto_recipient.is_none());
        assert!(matches!(cfg.availability, AvailabilityMode::Weekdays));
        assert!(cfg.smtp.is_none());
        assert!(cfg.simulated_latency.is_none());
        assert_eq!(cfg.step_plan().len(), 7);
    }

    #[test]
    fn no_transport_is_missing_required() {
        let err = config(&[]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingRequired { ref key, .. } if key == "BOOKING_RELAY_ACCESS_KEY"
        ));
        // whitespace counts as unset
        assert!(config(&[("BOOKING_RELAY_ACCESS_KEY", "   ")]).is_err());
    }

    #[test]
    fn blocked_dates_are_parsed() {
        let cfg = config(&[
            ("BOOKING_RELAY_ACCESS_KEY", "abc"),
            ("BOOKING_AVAILABILITY", "blocked"),
            ("BOOKING_BLOCKED_DATES", "2026-11-04, 2026-12-25,"),
        ])
        .unwrap();
        let AvailabilityMode::Blocked(dates) = cfg.availability else {
            panic!("expected blocked mode");
        };
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2026, 11, 4).unwrap(),
                NaiveDate::from_ymd_opt(2026, 12, 25).unwrap(),
            ]
        );
    }

    #[test]
    fn bad_blocked_date_is_invalid() {
        let err = config(&[
            ("BOOKING_RELAY_ACCESS_KEY", "abc"),
            ("BOOKING_AVAILABILITY", "blocked"),
            ("BOOKING_BLOCKED_DATES", "next tuesday"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "BOOKING_BLOCKED_DATES"));
    }

    #[test]
    fn provider_mode_needs_key_and_event_type() {
        let err = config(&[
            ("BOOKING_RELAY_ACCESS_KEY", "abc"),
            ("BOOKING_AVAILABILITY", "provider"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "BOOKING_PROVIDER_API_KEY"));

        let cfg = config(&[
            ("BOOKING_RELAY_ACCESS_KEY", "abc"),
            ("BOOKING_AVAILABILITY", "provider"),
            ("BOOKING_PROVIDER_API_KEY", "cal_live"),
            ("BOOKING_PROVIDER_EVENT_TYPE_ID", "42"),
        ])
        .unwrap();
        let AvailabilityMode::Provider(provider) = cfg.availability else {
            panic!("expected provider mode");
        };
        assert_eq!(provider.base_url, DEFAULT_PROVIDER_URL);
        assert_eq!(provider.event_type_id, 42);
    }

    #[test]
    fn unknown_mode_and_bad_numbers_are_invalid() {
        assert!(matches!(
            config(&[("BOOKING_RELAY_ACCESS_KEY", "abc"), ("BOOKING_AVAILABILITY", "sometimes")]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config(&[
                ("BOOKING_RELAY_ACCESS_KEY", "abc"),
                ("BOOKING_SIMULATED_LATENCY_MS", "fast"),
            ]),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            config(&[("BOOKING_RELAY_ACCESS_KEY", "abc"), ("BOOKING_SKIP_DATE_STEP", "maybe")]),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn smtp_needs_recipient_and_defaults_port() {
        let err = config(&[("BOOKING_SMTP_HOST", "smtp.example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key, .. } if key == "BOOKING_MAILTO_RECIPIENT"));

        let cfg = config(&[
            ("BOOKING_SMTP_HOST", "smtp.example.com"),
            ("BOOKING_SMTP_USERNAME", "bot@example.com"),
            ("BOOKING_MAILTO_RECIPIENT", "coach@example.com"),
        ])
        .unwrap();
        let smtp = cfg.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.from_address, "bot@example.com");
        assert_eq!(smtp.recipient, "coach@example.com");
        assert!(cfg.relay.is_none());
    }

    #[test]
    fn build_wizard_uses_configured_plan() {
        let cfg = config(&[
            ("BOOKING_RELAY_ACCESS_KEY", "abc"),
            ("BOOKING_SKIP_DATE_STEP", "true"),
        ])
        .unwrap();
        let wizard = cfg
            .build_wizard(Arc::new(RecordingHandoff::new()), Arc::new(NotificationLog::new()))
            .unwrap();
        assert_eq!(wizard.plan().len(), 6);

        let mut no_transport = cfg;
        no_transport.relay = None;
        let err = no_transport
            .build_wizard(Arc::new(RecordingHandoff::new()), Arc::new(NotificationLog::new()))
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(ConfigError::MissingRequired { .. })));
    }

    #[test]
    fn latency_and_six_step_variant() {
        let cfg = config(&[
            ("BOOKING_RELAY_ACCESS_KEY", "abc"),
            ("BOOKING_SIMULATED_LATENCY_MS", "250"),
            ("BOOKING_SKIP_DATE_STEP", "yes"),
        ])
        .unwrap();
        assert_eq!(cfg.simulated_latency, Some(Duration::from_millis(250)));
        assert_eq!(cfg.step_plan().len(), 6);
    }
}
