use crate::error::{HoldingError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ConclusionData (phase 7)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConclusionStatus {
    Pending,
    Completed,
}

impl Default for ConclusionStatus {
    fn default() -> Self {
        ConclusionStatus::Pending
    }
}

impl fmt::Display for ConclusionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConclusionStatus::Pending => "pending",
            ConclusionStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Client feedback collected after the engagement closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub author_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    pub comment: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConclusionData {
    #[serde(default)]
    pub status: ConclusionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub feedback: Vec<FeedbackEntry>,
}

impl ConclusionData {
    /// Close the engagement. Irreversible; the caller is responsible for
    /// checking that phases 1 through 6 are completed first.
    pub fn finalize(&mut self, actor_id: impl Into<String>) -> Result<()> {
        if self.status == ConclusionStatus::Completed {
            return Err(HoldingError::InvalidTransition {
                from: self.status.to_string(),
                to: ConclusionStatus::Completed.to_string(),
                reason: "project already finalized".to_string(),
            });
        }
        self.status = ConclusionStatus::Completed;
        self.finalized_by = Some(actor_id.into());
        self.finalized_at = Some(Utc::now());
        Ok(())
    }

    /// Feedback form unlocks only after finalization.
    pub fn add_feedback(
        &mut self,
        author_id: impl Into<String>,
        rating: Option<u8>,
        comment: impl Into<String>,
    ) -> Result<()> {
        if self.status != ConclusionStatus::Completed {
            return Err(HoldingError::Forbidden(
                "feedback opens after the project is finalized".to_string(),
            ));
        }
        self.feedback.push(FeedbackEntry {
            author_id: author_id.into(),
            rating,
            comment: comment.into(),
            sent_at: Utc::now(),
        });
        Ok(())
    }
}
