//! Wizard state machine: which step is shown and whether a submission ran.

use serde::{Deserialize, Serialize};

use crate::error::WizardError;

/// Navigation state of one wizard session.
///
/// `current_step` is 1-based and always within `1..=total_steps`.
/// `is_submitted` only becomes true on the final step after a successful
/// submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredWizardState")]
pub struct WizardState {
    current_step: u8,
    total_steps: u8,
    is_submitting: bool,
    is_submitted: bool,
}

impl WizardState {
    /// Start on step 1 of `total_steps` (at least one step).
    pub fn new(total_steps: u8) -> Self {
        Self {
            current_step: 1,
            total_steps: total_steps.max(1),
            is_submitting: false,
            is_submitted: false,
        }
    }

    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn total_steps(&self) -> u8 {
        self.total_steps
    }

    pub fn is_submitting(&self) -> bool {
        self.is_submitting
    }

    pub fn is_submitted(&self) -> bool {
        self.is_submitted
    }

    pub fn is_final_step(&self) -> bool {
        self.current_step == self.total_steps
    }

    /// Navigation controls are hidden once the booking went through.
    pub fn controls_visible(&self) -> bool {
        !(self.is_submitted && self.is_final_step())
    }

    /// Move one step forward. Fails on the final step or mid-submission.
    pub fn advance(&mut self) -> Result<u8, WizardError> {
        self.ensure_idle()?;
        if self.is_final_step() {
            return Err(WizardError::AtFinalStep {
                step: self.current_step,
                total: self.total_steps,
            });
        }
        self.current_step = (self.current_step + 1).min(self.total_steps);
        Ok(self.current_step)
    }

    /// Move one step back, stopping at step 1.
    pub fn retreat(&mut self) -> Result<u8, WizardError> {
        self.ensure_idle()?;
        self.current_step = self.current_step.saturating_sub(1).max(1);
        Ok(self.current_step)
    }

    /// Claim the submission slot. Only one submission may be in flight.
    pub fn begin_submission(&mut self) -> Result<(), WizardError> {
        self.ensure_idle()?;
        if !self.is_final_step() {
            return Err(WizardError::NotOnFinalStep {
                step: self.current_step,
                total: self.total_steps,
            });
        }
        self.is_submitting = true;
        Ok(())
    }

    /// Release the submission slot, recording whether it succeeded.
    pub fn finish_submission(&mut self, success: bool) {
        self.is_submitting = false;
        if success && self.is_final_step() {
            self.is_submitted = true;
        }
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.is_submitted {
            return Err(WizardError::AlreadySubmitted);
        }
        if self.is_submitting {
            return Err(WizardError::SubmissionInFlight);
        }
        Ok(())
    }
}

/// Wire shape of [`WizardState`], checked before it becomes one.
#[derive(Deserialize)]
struct StoredWizardState {
    current_step: u8,
    total_steps: u8,
    is_submitting: bool,
    is_submitted: bool,
}

impl TryFrom<StoredWizardState> for WizardState {
    type Error = WizardError;

    fn try_from(stored: StoredWizardState) -> Result<Self, Self::Error> {
        let StoredWizardState {
            current_step,
            total_steps,
            is_submitting,
            is_submitted,
        } = stored;
        if !(1..=total_steps).contains(&current_step) {
            return Err(WizardError::StepOutOfRange {
                step: current_step,
                total: total_steps,
            });
        }
        if is_submitted && current_step != total_steps {
            return Err(WizardError::NotOnFinalStep {
                step: current_step,
                total: total_steps,
            });
        }
        Ok(Self {
            current_step,
            total_steps,
            is_submitting,
            is_submitted,
        })
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new(7)
    }
}
