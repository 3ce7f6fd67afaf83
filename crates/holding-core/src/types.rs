use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Consultant,
    Auxiliary,
    Administrator,
}

impl Role {
    /// Staff can see internal threads and edit completed phases.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Consultant | Role::Auxiliary | Role::Administrator)
    }

    /// Only consultants and administrators may advance phases, approve
    /// reviews, or finalize a project.
    pub fn can_advance_phase(self) -> bool {
        matches!(self, Role::Consultant | Role::Administrator)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Consultant => "consultant",
            Role::Auxiliary => "auxiliary",
            Role::Administrator => "administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = crate::error::HoldingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "consultant" => Ok(Role::Consultant),
            "auxiliary" => Ok(Role::Auxiliary),
            "administrator" => Ok(Role::Administrator),
            _ => Err(crate::error::HoldingError::InvalidRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ClientType
// ---------------------------------------------------------------------------

/// Partners hold equity and must supply full qualification data.
/// Interested members (e.g. heirs) have view-only access and no equity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientType {
    Partner,
    Interested,
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClientType::Partner => "partner",
            ClientType::Interested => "interested",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// PhaseId
// ---------------------------------------------------------------------------

/// The ten fixed steps of the holding-formation pipeline, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    Diagnostic,
    Constitution,
    Integralization,
    Minuta,
    Itbi,
    Registration,
    Conclusion,
    Quotas,
    Agreement,
    Support,
}

impl PhaseId {
    pub fn all() -> &'static [PhaseId] {
        &[
            PhaseId::Diagnostic,
            PhaseId::Constitution,
            PhaseId::Integralization,
            PhaseId::Minuta,
            PhaseId::Itbi,
            PhaseId::Registration,
            PhaseId::Conclusion,
            PhaseId::Quotas,
            PhaseId::Agreement,
            PhaseId::Support,
        ]
    }

    /// 1-based pipeline number (1–10).
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_number(n: u8) -> Option<PhaseId> {
        PhaseId::all().get((n as usize).checked_sub(1)?).copied()
    }

    pub fn next(self) -> Option<PhaseId> {
        PhaseId::from_number(self.number() + 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            PhaseId::Diagnostic => "Diagnóstico",
            PhaseId::Constitution => "Constituição da Holding",
            PhaseId::Integralization => "Integralização de Bens",
            PhaseId::Minuta => "Análise da Minuta",
            PhaseId::Itbi => "Recolhimento de ITBI",
            PhaseId::Registration => "Registro da Holding",
            PhaseId::Conclusion => "Conclusão",
            PhaseId::Quotas => "Transferência de Quotas",
            PhaseId::Agreement => "Acordo de Sócios",
            PhaseId::Support => "Suporte",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseId::Diagnostic => "diagnostic",
            PhaseId::Constitution => "constitution",
            PhaseId::Integralization => "integralization",
            PhaseId::Minuta => "minuta",
            PhaseId::Itbi => "itbi",
            PhaseId::Registration => "registration",
            PhaseId::Conclusion => "conclusion",
            PhaseId::Quotas => "quotas",
            PhaseId::Agreement => "agreement",
            PhaseId::Support => "support",
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PhaseStatus
// ---------------------------------------------------------------------------

/// Coarse outer phase status. `AwaitingApproval` exists on the wire but no
/// transition sets it — each phase payload tracks its own finer sub-status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Pending,
    InProgress,
    AwaitingApproval,
    Completed,
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PhaseStatus::Pending => "pending",
            PhaseStatus::InProgress => "in_progress",
            PhaseStatus::AwaitingApproval => "awaiting_approval",
            PhaseStatus::Completed => "completed",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ProjectStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    InProgress,
    Completed,
    Archived,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Archived => "archived",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// TaskStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    Approved,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Approved => "approved",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// DocumentStatus / DocumentCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Active,
    Deprecated,
}

/// Category tag for a user's personal documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Identity,
    Address,
    MarriageCertificate,
    TaxReturn,
    Other,
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentCategory::Identity => "identity",
            DocumentCategory::Address => "address",
            DocumentCategory::MarriageCertificate => "marriage_certificate",
            DocumentCategory::TaxReturn => "tax_return",
            DocumentCategory::Other => "other",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// MaritalStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaritalStatus {
    Solteiro,
    Casado,
    UniaoEstavel,
    Divorciado,
    Viuvo,
}

impl MaritalStatus {
    /// Married and stable-union partners must declare a property regime.
    pub fn requires_property_regime(self) -> bool {
        matches!(self, MaritalStatus::Casado | MaritalStatus::UniaoEstavel)
    }
}

// ---------------------------------------------------------------------------
// Post-completion gate
// ---------------------------------------------------------------------------

/// Phases 8 and 9 unlock only after conclusion, via an explicit client choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostCompletionStatus {
    NotAvailable,
    PendingChoice,
    InProgress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostCompletionPath {
    QuotaTransfer,
    PartnerAgreement,
}

impl PostCompletionPath {
    pub fn phase(self) -> PhaseId {
        match self {
            PostCompletionPath::QuotaTransfer => PhaseId::Quotas,
            PostCompletionPath::PartnerAgreement => PhaseId::Agreement,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_numbers_are_one_through_ten() {
        let numbers: Vec<u8> = PhaseId::all().iter().map(|p| p.number()).collect();
        assert_eq!(numbers, (1..=10).collect::<Vec<u8>>());
    }

    #[test]
    fn phase_from_number_roundtrip() {
        for phase in PhaseId::all() {
            assert_eq!(PhaseId::from_number(phase.number()), Some(*phase));
        }
        assert_eq!(PhaseId::from_number(0), None);
        assert_eq!(PhaseId::from_number(11), None);
    }

    #[test]
    fn phase_next_follows_pipeline_order() {
        assert_eq!(PhaseId::Diagnostic.next(), Some(PhaseId::Constitution));
        assert_eq!(PhaseId::Conclusion.next(), Some(PhaseId::Quotas));
        assert_eq!(PhaseId::Support.next(), None);
    }

    #[test]
    fn phase_ordering() {
        assert!(PhaseId::Diagnostic < PhaseId::Constitution);
        assert!(PhaseId::Itbi < PhaseId::Conclusion);
        assert!(PhaseId::Support > PhaseId::Agreement);
    }

    #[test]
    fn staff_roles() {
        assert!(Role::Consultant.is_staff());
        assert!(Role::Auxiliary.is_staff());
        assert!(Role::Administrator.is_staff());
        assert!(!Role::Client.is_staff());

        assert!(Role::Consultant.can_advance_phase());
        assert!(!Role::Auxiliary.can_advance_phase());
        assert!(!Role::Client.can_advance_phase());
    }

    #[test]
    fn role_roundtrip() {
        use std::str::FromStr;
        for role in [Role::Client, Role::Consultant, Role::Auxiliary, Role::Administrator] {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert!(Role::from_str("manager").is_err());
    }

    #[test]
    fn property_regime_requirement() {
        assert!(MaritalStatus::Casado.requires_property_regime());
        assert!(MaritalStatus::UniaoEstavel.requires_property_regime());
        assert!(!MaritalStatus::Solteiro.requires_property_regime());
        assert!(!MaritalStatus::Viuvo.requires_property_regime());
    }

    #[test]
    fn post_completion_path_targets() {
        assert_eq!(PostCompletionPath::QuotaTransfer.phase(), PhaseId::Quotas);
        assert_eq!(PostCompletionPath::PartnerAgreement.phase(), PhaseId::Agreement);
    }
}
