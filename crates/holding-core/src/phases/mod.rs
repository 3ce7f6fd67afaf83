use serde::{Deserialize, Serialize};
use std::fmt;

pub mod agreement;
pub mod conclusion;
pub mod constitution;
pub mod diagnostic;
pub mod integralization;
pub mod itbi;
pub mod quotas;
pub mod registration;
pub mod support;

// ---------------------------------------------------------------------------
// SubmissionStatus
// ---------------------------------------------------------------------------

/// Client-fills-then-consultant-reviews cycle shared by the constitution and
/// integralization phases. Client edits are only allowed while
/// `PendingClient`; submission freezes the form until the consultant rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    PendingClient,
    PendingConsultantReview,
    Approved,
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        SubmissionStatus::PendingClient
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionStatus::PendingClient => "pending_client",
            SubmissionStatus::PendingConsultantReview => "pending_consultant_review",
            SubmissionStatus::Approved => "approved",
        };
        f.write_str(s)
    }
}
