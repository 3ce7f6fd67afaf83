use crate::error::{HoldingError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DiagnosticData (phase 1)
// ---------------------------------------------------------------------------

/// Four sequential intake steps, each gated by the previous one. Completing
/// the data-verification step requires every partner member to pass the
/// qualification-completeness check, unless a staff member overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticData {
    #[serde(default)]
    pub data_verified: bool,
    #[serde(default)]
    pub form_completed: bool,
    #[serde(default)]
    pub meeting_scheduled: bool,
    #[serde(default)]
    pub minutes_recorded: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_date: Option<DateTime<Utc>>,
    /// Meeting minutes document, attached when the last step closes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_document_id: Option<String>,
}

impl DiagnosticData {
    pub fn step_completed(&self, step: u8) -> bool {
        match step {
            1 => self.data_verified,
            2 => self.form_completed,
            3 => self.meeting_scheduled,
            4 => self.minutes_recorded,
            _ => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.data_verified && self.form_completed && self.meeting_scheduled && self.minutes_recorded
    }

    /// Complete one step. Steps close strictly in order 1..=4.
    /// `partners_data_complete` reflects the qualification check over every
    /// partner member; staff may verify step 1 regardless.
    pub fn complete_step(
        &mut self,
        step: u8,
        partners_data_complete: bool,
        actor_is_staff: bool,
    ) -> Result<()> {
        if !(1..=4).contains(&step) {
            return Err(HoldingError::InvalidTransition {
                from: "diagnostic".to_string(),
                to: format!("step {step}"),
                reason: "diagnostic has steps 1 through 4".to_string(),
            });
        }
        if self.step_completed(step) {
            return Err(HoldingError::InvalidTransition {
                from: format!("step {step} completed"),
                to: format!("step {step} completed"),
                reason: "step already completed".to_string(),
            });
        }
        if step > 1 && !self.step_completed(step - 1) {
            return Err(HoldingError::InvalidTransition {
                from: format!("step {}", step - 1),
                to: format!("step {step}"),
                reason: "previous step not completed".to_string(),
            });
        }
        if step == 1 && !partners_data_complete && !actor_is_staff {
            return Err(HoldingError::Forbidden(
                "all partners must complete their qualification data first".to_string(),
            ));
        }
        match step {
            1 => self.data_verified = true,
            2 => self.form_completed = true,
            3 => self.meeting_scheduled = true,
            _ => self.minutes_recorded = true,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_close_in_order() {
        let mut data = DiagnosticData::default();
        assert!(data.complete_step(2, true, false).is_err());

        data.complete_step(1, true, false).unwrap();
        data.complete_step(2, true, false).unwrap();
        data.complete_step(3, true, false).unwrap();
        data.complete_step(4, true, false).unwrap();
        assert!(data.is_complete());
    }

    #[test]
    fn step_one_requires_partner_data_unless_staff() {
        let mut data = DiagnosticData::default();
        assert!(data.complete_step(1, false, false).is_err());
        data.complete_step(1, false, true).unwrap();
        assert!(data.data_verified);
    }

    #[test]
    fn completed_step_cannot_repeat() {
        let mut data = DiagnosticData::default();
        data.complete_step(1, true, false).unwrap();
        assert!(data.complete_step(1, true, false).is_err());
    }

    #[test]
    fn step_out_of_range() {
        let mut data = DiagnosticData::default();
        assert!(data.complete_step(0, true, true).is_err());
        assert!(data.complete_step(5, true, true).is_err());
    }
}
