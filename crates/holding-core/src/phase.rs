use crate::document::Document;
use crate::error::{HoldingError, Result};
use crate::phases::agreement::AgreementData;
use crate::phases::conclusion::ConclusionData;
use crate::phases::constitution::ConstitutionData;
use crate::phases::diagnostic::DiagnosticData;
use crate::phases::integralization::IntegralizationData;
use crate::phases::itbi::ItbiData;
use crate::phases::quotas::QuotasData;
use crate::phases::registration::RegistrationData;
use crate::phases::support::SupportData;
use crate::review::DraftReview;
use crate::task::Task;
use crate::types::{PhaseId, PhaseStatus};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PhaseData
// ---------------------------------------------------------------------------

/// Phase-specific workflow payload. One variant per pipeline step; each
/// variant owns its own sub-status and transition rules, so reaching into a
/// phase's data is always a typed match, never a synthesized field name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhaseData {
    Diagnostic(DiagnosticData),
    Constitution(ConstitutionData),
    Integralization(IntegralizationData),
    Minuta(DraftReview),
    Itbi(ItbiData),
    Registration(RegistrationData),
    Conclusion(ConclusionData),
    Quotas(QuotasData),
    Agreement(AgreementData),
    Support(SupportData),
}

impl PhaseData {
    pub fn default_for(id: PhaseId) -> Self {
        match id {
            PhaseId::Diagnostic => PhaseData::Diagnostic(DiagnosticData::default()),
            PhaseId::Constitution => PhaseData::Constitution(ConstitutionData::default()),
            PhaseId::Integralization => PhaseData::Integralization(IntegralizationData::default()),
            PhaseId::Minuta => PhaseData::Minuta(DraftReview::new()),
            PhaseId::Itbi => PhaseData::Itbi(ItbiData::default()),
            PhaseId::Registration => PhaseData::Registration(RegistrationData::default()),
            PhaseId::Conclusion => PhaseData::Conclusion(ConclusionData::default()),
            PhaseId::Quotas => PhaseData::Quotas(QuotasData::default()),
            PhaseId::Agreement => PhaseData::Agreement(AgreementData::default()),
            PhaseId::Support => PhaseData::Support(SupportData::default()),
        }
    }

    pub fn phase_id(&self) -> PhaseId {
        match self {
            PhaseData::Diagnostic(_) => PhaseId::Diagnostic,
            PhaseData::Constitution(_) => PhaseId::Constitution,
            PhaseData::Integralization(_) => PhaseId::Integralization,
            PhaseData::Minuta(_) => PhaseId::Minuta,
            PhaseData::Itbi(_) => PhaseId::Itbi,
            PhaseData::Registration(_) => PhaseId::Registration,
            PhaseData::Conclusion(_) => PhaseId::Conclusion,
            PhaseData::Quotas(_) => PhaseId::Quotas,
            PhaseData::Agreement(_) => PhaseId::Agreement,
            PhaseData::Support(_) => PhaseId::Support,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// One step of the ten-step pipeline. The outer status stays coarse
/// (pending, in progress, completed); anything finer lives in the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub status: PhaseStatus,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub task_seq: u32,
    #[serde(default)]
    pub documents: Vec<Document>,
    pub data: PhaseData,
}

impl Phase {
    pub fn default_for(id: PhaseId) -> Self {
        Self {
            id,
            status: PhaseStatus::Pending,
            tasks: Vec::new(),
            task_seq: 0,
            documents: Vec::new(),
            data: PhaseData::default_for(id),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed payload accessors
// ---------------------------------------------------------------------------

macro_rules! payload_accessor {
    ($name:ident, $name_mut:ident, $variant:ident, $ty:ty) => {
        impl Phase {
            pub fn $name(&self) -> Result<&$ty> {
                match &self.data {
                    PhaseData::$variant(data) => Ok(data),
                    other => Err(HoldingError::InvalidPhase(other.phase_id().number())),
                }
            }

            pub fn $name_mut(&mut self) -> Result<&mut $ty> {
                match &mut self.data {
                    PhaseData::$variant(data) => Ok(data),
                    other => Err(HoldingError::InvalidPhase(other.phase_id().number())),
                }
            }
        }
    };
}

payload_accessor!(diagnostic, diagnostic_mut, Diagnostic, DiagnosticData);
payload_accessor!(constitution, constitution_mut, Constitution, ConstitutionData);
payload_accessor!(integralization, integralization_mut, Integralization, IntegralizationData);
payload_accessor!(minuta, minuta_mut, Minuta, DraftReview);
payload_accessor!(itbi, itbi_mut, Itbi, ItbiData);
payload_accessor!(registration, registration_mut, Registration, RegistrationData);
payload_accessor!(conclusion, conclusion_mut, Conclusion, ConclusionData);
payload_accessor!(quotas, quotas_mut, Quotas, QuotasData);
payload_accessor!(agreement, agreement_mut, Agreement, AgreementData);
payload_accessor!(support, support_mut, Support, SupportData);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_phase_is_pending_with_matching_payload() {
        for id in PhaseId::all() {
            let phase = Phase::default_for(*id);
            assert_eq!(phase.status, PhaseStatus::Pending);
            assert_eq!(phase.data.phase_id(), *id);
            assert!(phase.tasks.is_empty());
        }
    }

    #[test]
    fn accessor_matches_variant() {
        let mut phase = Phase::default_for(PhaseId::Integralization);
        assert!(phase.integralization().is_ok());
        assert!(phase.integralization_mut().is_ok());
        assert!(phase.minuta().is_err());
    }

    #[test]
    fn payload_serializes_with_kind_tag() {
        let phase = Phase::default_for(PhaseId::Support);
        let yaml = serde_yaml::to_string(&phase).unwrap();
        assert!(yaml.contains("kind: support"));

        let back: Phase = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.data.phase_id(), PhaseId::Support);
    }
}
