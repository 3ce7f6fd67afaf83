use crate::review::DraftReview;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// AgreementData (phase 9)
// ---------------------------------------------------------------------------

/// Partner agreement drafting: the same review cycle as the minuta, plus a
/// clause checklist and observation fields filled by each side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgreementData {
    #[serde(default)]
    pub review: DraftReview,
    #[serde(default)]
    pub included_clauses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consultant_observations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_observations: Option<String>,
}

impl AgreementData {
    pub fn set_clauses(&mut self, clauses: Vec<String>) {
        self.included_clauses = clauses;
    }
}
