use crate::error::{HoldingError, Result};
use crate::types::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// HandoffSide
// ---------------------------------------------------------------------------

/// Which side of the desk uploads a given step's document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffSide {
    Staff,
    Client,
}

impl HandoffSide {
    pub fn allows(self, role: Role) -> bool {
        match self {
            HandoffSide::Staff => role.is_staff(),
            HandoffSide::Client => role == Role::Client,
        }
    }
}

// ---------------------------------------------------------------------------
// HandoffProcess
// ---------------------------------------------------------------------------

/// One step of a document relay: named slot, designated uploader side,
/// filled exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffStep {
    pub name: String,
    pub uploader: HandoffSide,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached_at: Option<DateTime<Utc>>,
}

/// An ordered staff/client document relay. ITBI runs guide -> payment proof,
/// registration runs fee guide -> fee payment -> certificate. Steps fill
/// strictly in order and each attachment advances the relay by exactly one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffProcess {
    pub steps: Vec<HandoffStep>,
    /// Terminal shortcut: an exemption closes the relay without filling the
    /// remaining steps. Used for ITBI exemptions.
    #[serde(default)]
    pub exempt: bool,
}

impl HandoffProcess {
    pub fn new(steps: &[(&str, HandoffSide)]) -> Self {
        Self {
            steps: steps
                .iter()
                .map(|(name, uploader)| HandoffStep {
                    name: (*name).to_string(),
                    uploader: *uploader,
                    document_id: None,
                    attached_by: None,
                    attached_at: None,
                })
                .collect(),
            exempt: false,
        }
    }

    /// First unfilled step, or None when the relay is done.
    pub fn current_step(&self) -> Option<&HandoffStep> {
        if self.exempt {
            return None;
        }
        self.steps.iter().find(|s| s.document_id.is_none())
    }

    pub fn is_complete(&self) -> bool {
        self.exempt || self.steps.iter().all(|s| s.document_id.is_some())
    }

    /// Derived state string: `pending_<step>` while a step is open, then
    /// `completed`, or `exempt` when an exemption closed the relay.
    pub fn status(&self) -> String {
        if self.exempt {
            return "exempt".to_string();
        }
        match self.current_step() {
            Some(step) => format!("pending_{}", step.name),
            None => "completed".to_string(),
        }
    }

    /// Attach a document to the named step. The step must be the current one
    /// and the actor must sit on the step's uploader side.
    pub fn attach(
        &mut self,
        step_name: &str,
        actor_id: impl Into<String>,
        actor_role: Role,
        document_id: impl Into<String>,
    ) -> Result<()> {
        if self.exempt {
            return Err(HoldingError::InvalidTransition {
                from: "exempt".to_string(),
                to: format!("pending_{step_name}"),
                reason: "process closed by exemption".to_string(),
            });
        }
        let current = match self.steps.iter().position(|s| s.document_id.is_none()) {
            Some(i) => i,
            None => {
                return Err(HoldingError::InvalidTransition {
                    from: "completed".to_string(),
                    to: format!("pending_{step_name}"),
                    reason: "process already completed".to_string(),
                })
            }
        };
        if self.steps[current].name != step_name {
            return Err(HoldingError::InvalidTransition {
                from: self.status(),
                to: format!("pending_{step_name}"),
                reason: format!("current step is '{}'", self.steps[current].name),
            });
        }
        if !self.steps[current].uploader.allows(actor_role) {
            return Err(HoldingError::Forbidden(format!(
                "step '{step_name}' expects an upload from the {} side",
                match self.steps[current].uploader {
                    HandoffSide::Staff => "staff",
                    HandoffSide::Client => "client",
                }
            )));
        }
        let step = &mut self.steps[current];
        step.document_id = Some(document_id.into());
        step.attached_by = Some(actor_id.into());
        step.attached_at = Some(Utc::now());
        Ok(())
    }

    /// Close the relay with an exemption. Only meaningful while still open.
    pub fn grant_exemption(&mut self) -> Result<()> {
        if self.is_complete() {
            return Err(HoldingError::InvalidTransition {
                from: self.status(),
                to: "exempt".to_string(),
                reason: "process already closed".to_string(),
            });
        }
        self.exempt = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
