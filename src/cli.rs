//! Terminal front end: walks a client through the booking wizard on
//! stdin/stdout.
//!
//! Each step prompts for its fields in order. An empty answer keeps the
//! current value when it is already valid. `:next`, `:back` and `:quit`
//! work at any prompt.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

use crate::booking::fields::{Field, Step, StepPlan};
use crate::booking::input;
use crate::booking::model::format_usd;
use crate::booking::notify::{Level, NotificationLog};
use crate::booking::validate::{FieldErrors, Rule, validate_field};
use crate::booking::wizard::{BookingWizard, Transition, WizardSnapshot};
use crate::error::Result;

pub const SUCCESS_TITLE: &str = "Thank you for Submitting Your Details!";
pub const SUCCESS_BODY: &str = "Your booking will be confirmed, and you'll receive a calendar invite \
along with payment instructions. Thank you for trusting us to support you on your journey!";

/// How a terminal session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Submitted,
    Quit,
}

// ── Commands ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Next,
    Back,
    Quit,
    Answer(String),
}

fn parse_command(line: &str) -> Command {
    match line.trim() {
        ":next" | ":n" => Command::Next,
        ":back" | ":b" => Command::Back,
        ":quit" | ":q" => Command::Quit,
        other => Command::Answer(other.to_string()),
    }
}

/// One-line progress bar: filled squares for reached steps, then the title.
pub fn render_progress(plan: StepPlan, current: u8) -> String {
    let bar: String = (1..=plan.len())
        .map(|n| if n <= current { '■' } else { '□' })
        .collect();
    let title = plan.step(current).map(|s| s.title()).unwrap_or("");
    format!("[{bar}] Step {current} of {}: {title}", plan.len())
}

fn is_optional(field: Field) -> bool {
    matches!(
        field.rule(),
        Rule::OptionalText | Rule::OptionalRange { .. } | Rule::OptionalAnswer | Rule::Defaulted
    )
}

fn hint(field: Field) -> Option<&'static str> {
    match field {
        Field::SelectedDate => Some("YYYY-MM-DD, weekdays only"),
        Field::CommitmentLevel => Some("1-10"),
        Field::Age => Some("13-120"),
        Field::TermsAccepted => Some("yes/no"),
        Field::SupportType => Some("comma separated"),
        _ if input::is_multi_select(field) => Some("comma separated numbers or names"),
        _ => None,
    }
}

// ── Terminal session ────────────────────────────────────────────────

/// Interactive session over any line reader and writer.
pub struct TerminalWizard<R, W> {
    wizard: BookingWizard,
    notifications: Arc<NotificationLog>,
    lines: Lines<R>,
    out: W,
}

impl<R, W> TerminalWizard<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// `notifications` must be the log the wizard notifies into.
    pub fn new(wizard: BookingWizard, notifications: Arc<NotificationLog>, input: R, out: W) -> Self {
        Self {
            wizard,
            notifications,
            lines: input.lines(),
            out,
        }
    }

    pub fn wizard(&self) -> &BookingWizard {
        &self.wizard
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run until the booking is submitted, the user quits, or input ends.
    pub async fn run(&mut self) -> Result<SessionEnd> {
        let mut only: Option<Vec<Field>> = None;

        loop {
            let snapshot = self.wizard.snapshot().await;
            if snapshot.state.is_submitted() {
                self.print_success(&snapshot).await?;
                return Ok(SessionEnd::Submitted);
            }

            self.write_line("").await?;
            self.write_line(&render_progress(self.wizard.plan(), snapshot.state.current_step()))
                .await?;
            if snapshot.step == Some(Step::Payment) {
                self.print_payment_summary(&snapshot).await?;
            }

            let command = match self.ask_step(only.take()).await? {
                Some(command) => command,
                None => {
                    self.wizard.close();
                    return Ok(SessionEnd::Quit);
                }
            };

            match command {
                Command::Quit => {
                    self.wizard.close();
                    return Ok(SessionEnd::Quit);
                }
                Command::Back => {
                    if self.wizard.previous().await == Transition::Unchanged {
                        self.write_line("Already on the first step.").await?;
                    }
                }
                Command::Next | Command::Answer(_) => match self.wizard.next().await {
                    Transition::Blocked { errors, .. } => {
                        self.flush_notifications().await?;
                        self.print_errors(&errors).await?;
                        only = Some(errors.fields());
                    }
                    Transition::Busy => {
                        self.write_line("A submission is already in progress.").await?;
                    }
                    Transition::Closed | Transition::SubmissionCancelled => {
                        return Ok(SessionEnd::Quit);
                    }
                    _ => {}
                },
            }
            self.flush_notifications().await?;
        }
    }

    /// Prompt for each visible field of the current step. Returns the
    /// navigation command that ended the step, or `None` at end of input.
    async fn ask_step(&mut self, only: Option<Vec<Field>>) -> std::io::Result<Option<Command>> {
        let mut answered: Vec<Field> = Vec::new();

        loop {
            let snapshot = self.wizard.snapshot().await;
            let next_field = snapshot.visible_fields().into_iter().find(|f| {
                !answered.contains(f) && only.as_ref().is_none_or(|only| only.contains(f))
            });
            let Some(field) = next_field else {
                return Ok(Some(Command::Next));
            };

            self.prompt(field, &snapshot).await?;
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };

            let raw = match parse_command(&line) {
                Command::Answer(raw) => raw,
                other => return Ok(Some(other)),
            };

            if raw.is_empty() && validate_field(&snapshot.draft, field).is_ok() {
                answered.push(field);
                continue;
            }

            match self.wizard.set_field(field, &raw).await {
                Ok(()) => {
                    let accepted = field != Field::SelectedDate
                        || self.wizard.draft().await.selected_date.is_some();
                    if accepted {
                        answered.push(field);
                    }
                }
                Err(e) => {
                    self.write_line(&format!("  ! {}", e.message(field))).await?;
                }
            }
            self.flush_notifications().await?;
        }
    }

    async fn prompt(&mut self, field: Field, snapshot: &WizardSnapshot) -> std::io::Result<()> {
        let options: Option<Vec<String>> = if field == Field::SelectedTime {
            Some(snapshot.offered_slots.iter().map(|s| s.label()).collect())
        } else {
            input::options(field)
        };
        if let Some(options) = options {
            for (i, option) in options.iter().enumerate() {
                self.write_line(&format!("  {}. {option}", i + 1)).await?;
            }
        }

        let mut prompt = field.label().to_string();
        if let Some(hint) = hint(field) {
            prompt.push_str(&format!(" ({hint})"));
        }
        if is_optional(field) {
            prompt.push_str(" [optional]");
        }
        self.write(&format!("{prompt}: ")).await
    }

    // ── Output ──────────────────────────────────────────────────────

    async fn print_payment_summary(&mut self, snapshot: &WizardSnapshot) -> std::io::Result<()> {
        if let (Some(package), Some(total)) = (snapshot.draft.package, snapshot.draft.total_cost()) {
            self.write_line(&format!(
                "Session package: {} hours, total cost {}",
                package.hours(),
                format_usd(total)
            ))
            .await?;
        }
        Ok(())
    }

    async fn print_errors(&mut self, errors: &FieldErrors) -> std::io::Result<()> {
        for (field, error) in errors.iter() {
            self.write_line(&format!("  ! {}: {}", field.label(), error.message(field)))
                .await?;
        }
        Ok(())
    }

    async fn print_success(&mut self, snapshot: &WizardSnapshot) -> std::io::Result<()> {
        self.flush_notifications().await?;
        self.write_line("").await?;
        self.write_line(SUCCESS_TITLE).await?;
        self.write_line(SUCCESS_BODY).await?;
        if let Some(confirmation) = &snapshot.confirmation {
            self.write_line(&format!(
                "Reserved {} at {} (reference {})",
                confirmation.date.format("%B %-d, %Y"),
                confirmation.slot,
                confirmation.reference
            ))
            .await?;
        }
        Ok(())
    }

    async fn flush_notifications(&mut self) -> std::io::Result<()> {
        for note in self.notifications.drain() {
            let icon = match note.level {
                Level::Error => "✖",
                Level::Warning => "⚠",
                Level::Success => "✔",
            };
            self.write_line(&format!("{icon} {}", note.message)).await?;
        }
        Ok(())
    }

    async fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await
    }

    async fn write_line(&mut self, text: &str) -> std::io::Result<()> {
        self.write(&format!("{text}\n")).await
    }
}

// ── Tests ───────────────────────────────────────────────────────────
