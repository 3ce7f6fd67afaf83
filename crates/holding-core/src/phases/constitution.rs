use crate::error::{HoldingError, Result};
use crate::phases::SubmissionStatus;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ConstitutionData (phase 2)
// ---------------------------------------------------------------------------

/// Bureaucratic progress of the company itself, independent of the review
/// cycle. Flips to `Completed` once both the signed contract and the CNPJ
/// card are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    PendingStart,
    InProgress,
    Completed,
}

impl Default for ProcessStatus {
    fn default() -> Self {
        ProcessStatus::PendingStart
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessStatus::PendingStart => "pending_start",
            ProcessStatus::InProgress => "in_progress",
            ProcessStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstitutionSlot {
    Contract,
    Cnpj,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
}

/// One partner's intended stake in the new company.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerEntry {
    pub user_id: String,
    pub quota_percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstitutionData {
    #[serde(default)]
    pub status: SubmissionStatus,
    #[serde(default)]
    pub process_status: ProcessStatus,
    #[serde(default)]
    pub company: CompanyInfo,
    #[serde(default)]
    pub partner_entries: Vec<PartnerEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_document_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnpj_document_id: Option<String>,
}

impl ConstitutionData {
    /// Replace the company form and partner stakes. Only while the form is
    /// still with the client.
    pub fn update_form(
        &mut self,
        company: CompanyInfo,
        partner_entries: Vec<PartnerEntry>,
    ) -> Result<()> {
        self.ensure_pending_client("edit the constitution form")?;
        self.company = company;
        self.partner_entries = partner_entries;
        Ok(())
    }

    /// Hand the form to the consultant. Freezes client edits.
    pub fn submit(&mut self) -> Result<()> {
        self.ensure_pending_client("submit the constitution form")?;
        self.status = SubmissionStatus::PendingConsultantReview;
        Ok(())
    }

    /// Consultant sign-off. Also kicks off the bureaucratic process.
    pub fn approve(&mut self) -> Result<()> {
        if self.status != SubmissionStatus::PendingConsultantReview {
            return Err(HoldingError::InvalidTransition {
                from: self.status.to_string(),
                to: SubmissionStatus::Approved.to_string(),
                reason: "form is not under consultant review".to_string(),
            });
        }
        self.status = SubmissionStatus::Approved;
        if self.process_status == ProcessStatus::PendingStart {
            self.process_status = ProcessStatus::InProgress;
        }
        Ok(())
    }

    /// Attach the signed contract or the CNPJ card. Once both slots are
    /// filled the process auto-completes.
    pub fn attach_document(&mut self, slot: ConstitutionSlot, document_id: impl Into<String>) {
        match slot {
            ConstitutionSlot::Contract => self.contract_document_id = Some(document_id.into()),
            ConstitutionSlot::Cnpj => self.cnpj_document_id = Some(document_id.into()),
        }
        if self.process_status != ProcessStatus::Completed {
            self.process_status = ProcessStatus::InProgress;
        }
        if self.contract_document_id.is_some() && self.cnpj_document_id.is_some() {
            self.process_status = ProcessStatus::Completed;
        }
    }

    fn ensure_pending_client(&self, what: &str) -> Result<()> {
        if self.status != SubmissionStatus::PendingClient {
            return Err(HoldingError::InvalidTransition {
                from: self.status.to_string(),
                to: self.status.to_string(),
                reason: format!("can only {what} while pending with the client"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_freezes_client_edits() {
        let mut data = ConstitutionData::default();
        data.update_form(CompanyInfo::default(), Vec::new()).unwrap();
        data.submit().unwrap();
        assert_eq!(data.status, SubmissionStatus::PendingConsultantReview);
        assert!(data.update_form(CompanyInfo::default(), Vec::new()).is_err());
        assert!(data.submit().is_err());
    }

    #[test]
    fn approve_requires_review() {
        let mut data = ConstitutionData::default();
        assert!(data.approve().is_err());
        data.submit().unwrap();
        data.approve().unwrap();
        assert_eq!(data.status, SubmissionStatus::Approved);
        assert_eq!(data.process_status, ProcessStatus::InProgress);
    }

    #[test]
    fn process_completes_when_both_documents_attached() {
        let mut data = ConstitutionData::default();
        data.attach_document(ConstitutionSlot::Contract, "doc-1");
        assert_eq!(data.process_status, ProcessStatus::InProgress);

        data.attach_document(ConstitutionSlot::Cnpj, "doc-2");
        assert_eq!(data.process_status, ProcessStatus::Completed);
    }
}
