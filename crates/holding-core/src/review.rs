use crate::chat::{self, ChatMessage};
use crate::error::{HoldingError, Result};
use crate::types::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ReviewStatus
// ---------------------------------------------------------------------------

/// Lifecycle of a staff-drafted document under partner review. The minuta,
/// quota transfer contracts and the partner agreement all run this protocol.
///
/// `ChangesRequested` is part of the wire contract but no transition sets it;
/// partners request changes through the discussion thread and the consultant
/// re-uploads, which resets approvals instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    PendingDraft,
    InReview,
    ChangesRequested,
    Approved,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReviewStatus::PendingDraft => "pending_draft",
            ReviewStatus::InReview => "in_review",
            ReviewStatus::ChangesRequested => "changes_requested",
            ReviewStatus::Approved => "approved",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// DraftReview
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftVersion {
    pub document_id: String,
    pub version: u32,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Draft-and-approve protocol: staff upload draft versions, every partner
/// must approve the latest one, then the review locks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftReview {
    #[serde(default = "default_status")]
    pub status: ReviewStatus,
    #[serde(default)]
    pub drafts: Vec<DraftVersion>,
    #[serde(default)]
    pub version_seq: u32,
    /// Partner ID -> has approved the current draft.
    #[serde(default)]
    pub approvals: BTreeMap<String, bool>,
    #[serde(default)]
    pub discussion: Vec<ChatMessage>,
    #[serde(default)]
    pub message_seq: u32,
}

fn default_status() -> ReviewStatus {
    ReviewStatus::PendingDraft
}

impl Default for ReviewStatus {
    fn default() -> Self {
        ReviewStatus::PendingDraft
    }
}

impl DraftReview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_draft(&self) -> Option<&DraftVersion> {
        self.drafts.last()
    }

    /// Upload a draft version. Allowed while not yet approved; a re-upload
    /// supersedes the current draft and clears all recorded approvals.
    pub fn submit_draft(
        &mut self,
        document_id: impl Into<String>,
        uploaded_by: impl Into<String>,
    ) -> Result<u32> {
        if self.status == ReviewStatus::Approved {
            return Err(HoldingError::InvalidTransition {
                from: self.status.to_string(),
                to: ReviewStatus::InReview.to_string(),
                reason: "review is already approved".to_string(),
            });
        }
        self.version_seq += 1;
        self.drafts.push(DraftVersion {
            document_id: document_id.into(),
            version: self.version_seq,
            uploaded_by: uploaded_by.into(),
            uploaded_at: Utc::now(),
        });
        self.approvals.clear();
        self.status = ReviewStatus::InReview;
        Ok(self.version_seq)
    }

    /// Record one partner's approval of the current draft. Approvals are
    /// monotonic: a recorded approval cannot be withdrawn.
    pub fn record_approval(&mut self, partner_id: impl Into<String>) -> Result<()> {
        if self.status != ReviewStatus::InReview {
            return Err(HoldingError::InvalidTransition {
                from: self.status.to_string(),
                to: self.status.to_string(),
                reason: "no draft is under review".to_string(),
            });
        }
        self.approvals.insert(partner_id.into(), true);
        Ok(())
    }

    /// True once every listed partner has approved. An empty partner list
    /// never counts as approved.
    pub fn all_approved(&self, partner_ids: &[String]) -> bool {
        !partner_ids.is_empty()
            && partner_ids
                .iter()
                .all(|id| self.approvals.get(id).copied().unwrap_or(false))
    }

    /// Lock the review once every partner has approved. Returns whether the
    /// review transitioned to approved on this call.
    pub fn finalize_if_approved(&mut self, partner_ids: &[String]) -> bool {
        if self.status == ReviewStatus::InReview && self.all_approved(partner_ids) {
            self.status = ReviewStatus::Approved;
            return true;
        }
        false
    }

    pub fn post_message(
        &mut self,
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        author_role: Role,
        body: impl Into<String>,
    ) -> String {
        chat::push_message(
            &mut self.discussion,
            &mut self.message_seq,
            author_id,
            author_name,
            author_role,
            body,
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn partners() -> Vec<String> {
        vec!["p1".to_string(), "p2".to_string()]
    }

    #[test]
    fn starts_pending_draft() {
        let review = DraftReview::new();
        assert_eq!(review.status, ReviewStatus::PendingDraft);
        assert!(review.current_draft().is_none());
    }

    #[test]
    fn submit_draft_moves_to_in_review() {
        let mut review = DraftReview::new();
        let version = review.submit_draft("doc-1", "cons-1").unwrap();
        assert_eq!(version, 1);
        assert_eq!(review.status, ReviewStatus::InReview);
        assert_eq!(review.current_draft().unwrap().document_id, "doc-1");
    }

    #[test]
    fn reupload_bumps_version_and_clears_approvals() {
        let mut review = DraftReview::new();
        review.submit_draft("doc-1", "cons-1").unwrap();
        review.record_approval("p1").unwrap();

        let version = review.submit_draft("doc-2", "cons-1").unwrap();
        assert_eq!(version, 2);
        assert!(review.approvals.is_empty());
        assert_eq!(review.status, ReviewStatus::InReview);
    }

    #[test]
    fn approval_requires_draft_under_review() {
        let mut review = DraftReview::new();
        assert!(review.record_approval("p1").is_err());
    }

    #[test]
    fn all_partners_must_approve() {
        let mut review = DraftReview::new();
        let partners = partners();
        review.submit_draft("doc-1", "cons-1").unwrap();

        review.record_approval("p1").unwrap();
        assert!(!review.all_approved(&partners));
        assert!(!review.finalize_if_approved(&partners));

        review.record_approval("p2").unwrap();
        assert!(review.all_approved(&partners));
        assert!(review.finalize_if_approved(&partners));
        assert_eq!(review.status, ReviewStatus::Approved);
    }

    #[test]
    fn empty_partner_list_never_approves() {
        let mut review = DraftReview::new();
        review.submit_draft("doc-1", "cons-1").unwrap();
        assert!(!review.all_approved(&[]));
        assert!(!review.finalize_if_approved(&[]));
    }

    #[test]
    fn approved_review_rejects_new_drafts() {
        let mut review = DraftReview::new();
        let partners = partners();
        review.submit_draft("doc-1", "cons-1").unwrap();
        review.record_approval("p1").unwrap();
        review.record_approval("p2").unwrap();
        review.finalize_if_approved(&partners);

        assert!(review.submit_draft("doc-3", "cons-1").is_err());
    }

    #[test]
    fn discussion_thread_is_embedded() {
        let mut review = DraftReview::new();
        review.submit_draft("doc-1", "cons-1").unwrap();
        let id = review.post_message("p1", "Ana", Role::Client, "favor revisar a cláusula 3");
        assert_eq!(id, "M1");
        assert_eq!(review.discussion.len(), 1);
    }
}
