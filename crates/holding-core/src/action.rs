use crate::error::{HoldingError, Result};
use crate::phase::{Phase, PhaseData};
use crate::phases::constitution::{CompanyInfo, ConstitutionSlot, PartnerEntry};
use crate::phases::integralization::AssetKind;
use crate::phases::support::{TicketPriority, TicketStatus};
use crate::project::{Actor, Project};
use crate::review::DraftReview;
use crate::task;
use crate::types::{ClientType, Role};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// ActionContext
// ---------------------------------------------------------------------------

/// Project-member facts an action may need but which live outside the
/// manifest. The caller resolves them against the user store.
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    /// IDs of partner-typed client members, the approval quorum.
    pub partner_ids: Vec<String>,
    /// Whether every partner passes the qualification-completeness check.
    pub partners_data_complete: bool,
}

// ---------------------------------------------------------------------------
// PhaseAction
// ---------------------------------------------------------------------------

/// Every phase mutation, as one tagged union dispatched against the phase
/// the request addresses. Wrong-phase requests fail on the typed payload
/// accessor instead of silently writing into the wrong record.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PhaseAction {
    // phase 1
    CompleteDiagnosticStep { step: u8 },

    // phase 2
    UpdateConstitutionForm {
        company: CompanyInfo,
        #[serde(default)]
        partner_entries: Vec<PartnerEntry>,
    },
    SubmitConstitution,
    ApproveConstitution,
    AttachConstitutionDocument {
        slot: ConstitutionSlot,
        document_id: String,
    },

    // phase 3
    AddAsset {
        description: String,
        kind: AssetKind,
        #[serde(default)]
        declared_value: Option<String>,
        #[serde(default)]
        registration: Option<String>,
    },
    RemoveAsset { asset_id: String },
    SubmitAssets,
    ApproveAssets,

    // phases 4 and 9 (draft review)
    SubmitDraft { document_id: String },
    ApproveDraft,
    PostDiscussionMessage { body: String },

    // phase 5
    AttachTaxDocument {
        process_id: String,
        step: String,
        document_id: String,
    },
    GrantTaxExemption { process_id: String },

    // phase 6
    AttachRegistrationDocument {
        process_id: String,
        step: String,
        document_id: String,
    },

    // phase 7
    Finalize,
    SubmitFeedback {
        #[serde(default)]
        rating: Option<u8>,
        comment: String,
    },

    // phase 8
    OpenTransfer {
        description: String,
        from_user_id: String,
        to_user_id: String,
        #[serde(default)]
        quota_percentage: Option<f64>,
    },
    SubmitTransferDraft {
        process_id: String,
        document_id: String,
    },
    ApproveTransferDraft { process_id: String },
    PostTransferMessage { process_id: String, body: String },
    AttachTransferTaxDocument {
        process_id: String,
        step: String,
        document_id: String,
    },
    GrantTransferTaxExemption { process_id: String },

    // phase 9
    SetClauses { clauses: Vec<String> },
    SetObservations { observations: String },

    // phase 10
    OpenTicket {
        subject: String,
        body: String,
        #[serde(default)]
        priority: Option<TicketPriority>,
    },
    SetTicketStatus {
        ticket_id: String,
        status: TicketStatus,
    },
    SetTicketPriority {
        ticket_id: String,
        priority: TicketPriority,
    },
    ReplyTicket { ticket_id: String, body: String },

    // any phase
    AddTask {
        description: String,
        #[serde(default)]
        assignee_id: Option<String>,
    },
    CompleteTask { task_id: String },
    ApproveTask { task_id: String },
    AttachTaskDocument {
        task_id: String,
        document_id: String,
    },
}

impl PhaseAction {
    /// Short label for the activity trail.
    pub fn describe(&self) -> &'static str {
        match self {
            PhaseAction::CompleteDiagnosticStep { .. } => "concluiu uma etapa do diagnóstico",
            PhaseAction::UpdateConstitutionForm { .. } => "atualizou os dados da constituição",
            PhaseAction::SubmitConstitution => "enviou a constituição para revisão",
            PhaseAction::ApproveConstitution => "aprovou os dados da constituição",
            PhaseAction::AttachConstitutionDocument { .. } => "anexou documento da constituição",
            PhaseAction::AddAsset { .. } => "adicionou um bem",
            PhaseAction::RemoveAsset { .. } => "removeu um bem",
            PhaseAction::SubmitAssets => "enviou a lista de bens para revisão",
            PhaseAction::ApproveAssets => "aprovou a lista de bens",
            PhaseAction::SubmitDraft { .. } => "enviou uma nova versão da minuta",
            PhaseAction::ApproveDraft => "aprovou a minuta",
            PhaseAction::PostDiscussionMessage { .. } => "comentou na discussão da fase",
            PhaseAction::AttachTaxDocument { .. } => "anexou documento de ITBI",
            PhaseAction::GrantTaxExemption { .. } => "registrou isenção de ITBI",
            PhaseAction::AttachRegistrationDocument { .. } => "anexou documento de registro",
            PhaseAction::Finalize => "finalizou o projeto",
            PhaseAction::SubmitFeedback { .. } => "enviou feedback",
            PhaseAction::OpenTransfer { .. } => "abriu uma transferência de quotas",
            PhaseAction::SubmitTransferDraft { .. } => "enviou minuta de transferência",
            PhaseAction::ApproveTransferDraft { .. } => "aprovou minuta de transferência",
            PhaseAction::PostTransferMessage { .. } => "comentou em uma transferência",
            PhaseAction::AttachTransferTaxDocument { .. } => "anexou documento de ITCD",
            PhaseAction::GrantTransferTaxExemption { .. } => "registrou isenção de ITCD",
            PhaseAction::SetClauses { .. } => "atualizou as cláusulas do acordo",
            PhaseAction::SetObservations { .. } => "registrou observações no acordo",
            PhaseAction::OpenTicket { .. } => "abriu um chamado de suporte",
            PhaseAction::SetTicketStatus { .. } => "alterou o status de um chamado",
            PhaseAction::SetTicketPriority { .. } => "alterou a prioridade de um chamado",
            PhaseAction::ReplyTicket { .. } => "respondeu a um chamado",
            PhaseAction::AddTask { .. } => "criou uma tarefa",
            PhaseAction::CompleteTask { .. } => "concluiu uma tarefa",
            PhaseAction::ApproveTask { .. } => "aprovou uma tarefa",
            PhaseAction::AttachTaskDocument { .. } => "anexou documento a uma tarefa",
        }
    }

    pub fn apply(
        self,
        project: &mut Project,
        phase_number: u8,
        actor: &Actor,
        ctx: &ActionContext,
    ) -> Result<()> {
        // Feedback opens on an otherwise frozen phase after finalization.
        let skip_freeze_check = matches!(self, PhaseAction::SubmitFeedback { .. });
        if !skip_freeze_check && project.phase_read_only(phase_number, actor)? {
            return Err(HoldingError::Forbidden(
                "this phase is read-only for the current user".to_string(),
            ));
        }

        match self {
            PhaseAction::CompleteDiagnosticStep { step } => {
                project.phase_mut(phase_number)?.diagnostic_mut()?.complete_step(
                    step,
                    ctx.partners_data_complete,
                    actor.role.is_staff(),
                )
            }

            PhaseAction::UpdateConstitutionForm { company, partner_entries } => project
                .phase_mut(phase_number)?
                .constitution_mut()?
                .update_form(company, partner_entries),
            PhaseAction::SubmitConstitution => {
                project.phase_mut(phase_number)?.constitution_mut()?.submit()
            }
            PhaseAction::ApproveConstitution => {
                require_reviewer(actor)?;
                project.phase_mut(phase_number)?.constitution_mut()?.approve()
            }
            PhaseAction::AttachConstitutionDocument { slot, document_id } => {
                require_staff(actor)?;
                project
                    .phase_mut(phase_number)?
                    .constitution_mut()?
                    .attach_document(slot, document_id);
                Ok(())
            }

            PhaseAction::AddAsset { description, kind, declared_value, registration } => project
                .phase_mut(phase_number)?
                .integralization_mut()?
                .add_asset(description, kind, declared_value, registration)
                .map(|_| ()),
            PhaseAction::RemoveAsset { asset_id } => project
                .phase_mut(phase_number)?
                .integralization_mut()?
                .remove_asset(&asset_id),
            PhaseAction::SubmitAssets => {
                project.phase_mut(phase_number)?.integralization_mut()?.submit()
            }
            PhaseAction::ApproveAssets => {
                require_reviewer(actor)?;
                project.phase_mut(phase_number)?.integralization_mut()?.approve()
            }

            PhaseAction::SubmitDraft { document_id } => {
                require_staff(actor)?;
                review_mut(project.phase_mut(phase_number)?)?
                    .submit_draft(document_id, actor.id.clone())
                    .map(|_| ())
            }
            PhaseAction::ApproveDraft => {
                require_partner(actor)?;
                let partner_ids = ctx.partner_ids.clone();
                let review = review_mut(project.phase_mut(phase_number)?)?;
                review.record_approval(actor.id.clone())?;
                review.finalize_if_approved(&partner_ids);
                Ok(())
            }
            PhaseAction::PostDiscussionMessage { body } => {
                review_mut(project.phase_mut(phase_number)?)?.post_message(
                    actor.id.clone(),
                    actor.name.clone(),
                    actor.role,
                    body,
                );
                Ok(())
            }

            PhaseAction::AttachTaxDocument { process_id, step, document_id } => project
                .phase_mut(phase_number)?
                .itbi_mut()?
                .process_mut(&process_id)?
                .relay
                .attach(&step, actor.id.clone(), actor.role, document_id),
            PhaseAction::GrantTaxExemption { process_id } => {
                require_staff(actor)?;
                project
                    .phase_mut(phase_number)?
                    .itbi_mut()?
                    .process_mut(&process_id)?
                    .relay
                    .grant_exemption()
            }

            PhaseAction::AttachRegistrationDocument { process_id, step, document_id } => project
                .phase_mut(phase_number)?
                .registration_mut()?
                .process_mut(&process_id)?
                .relay
                .attach(&step, actor.id.clone(), actor.role, document_id),

            PhaseAction::Finalize => project.finalize(actor),
            PhaseAction::SubmitFeedback { rating, comment } => {
                if actor.is_interested() {
                    return Err(HoldingError::Forbidden(
                        "interested members have view-only access".to_string(),
                    ));
                }
                project
                    .phase_mut(phase_number)?
                    .conclusion_mut()?
                    .add_feedback(actor.id.clone(), rating, comment)
            }

            PhaseAction::OpenTransfer {
                description,
                from_user_id,
                to_user_id,
                quota_percentage,
            } => {
                require_staff(actor)?;
                project
                    .phase_mut(phase_number)?
                    .quotas_mut()?
                    .open_transfer(description, from_user_id, to_user_id, quota_percentage);
                Ok(())
            }
            PhaseAction::SubmitTransferDraft { process_id, document_id } => {
                require_staff(actor)?;
                project
                    .phase_mut(phase_number)?
                    .quotas_mut()?
                    .transfer_mut(&process_id)?
                    .review
                    .submit_draft(document_id, actor.id.clone())
                    .map(|_| ())
            }
            PhaseAction::ApproveTransferDraft { process_id } => {
                require_partner(actor)?;
                let partner_ids = ctx.partner_ids.clone();
                let transfer = project
                    .phase_mut(phase_number)?
                    .quotas_mut()?
                    .transfer_mut(&process_id)?;
                transfer.review.record_approval(actor.id.clone())?;
                transfer.review.finalize_if_approved(&partner_ids);
                Ok(())
            }
            PhaseAction::PostTransferMessage { process_id, body } => {
                project
                    .phase_mut(phase_number)?
                    .quotas_mut()?
                    .transfer_mut(&process_id)?
                    .review
                    .post_message(actor.id.clone(), actor.name.clone(), actor.role, body);
                Ok(())
            }
            PhaseAction::AttachTransferTaxDocument { process_id, step, document_id } => project
                .phase_mut(phase_number)?
                .quotas_mut()?
                .transfer_mut(&process_id)?
                .tax
                .attach(&step, actor.id.clone(), actor.role, document_id),
            PhaseAction::GrantTransferTaxExemption { process_id } => {
                require_staff(actor)?;
                project
                    .phase_mut(phase_number)?
                    .quotas_mut()?
                    .transfer_mut(&process_id)?
                    .tax
                    .grant_exemption()
            }

            PhaseAction::SetClauses { clauses } => {
                require_staff(actor)?;
                project.phase_mut(phase_number)?.agreement_mut()?.set_clauses(clauses);
                Ok(())
            }
            PhaseAction::SetObservations { observations } => {
                let data = project.phase_mut(phase_number)?.agreement_mut()?;
                if actor.role.is_staff() {
                    data.consultant_observations = Some(observations);
                } else {
                    data.client_observations = Some(observations);
                }
                Ok(())
            }

            PhaseAction::OpenTicket { subject, body, priority } => {
                project
                    .phase_mut(phase_number)?
                    .support_mut()?
                    .open_ticket(subject, body, actor.id.clone(), priority);
                Ok(())
            }
            PhaseAction::SetTicketStatus { ticket_id, status } => project
                .phase_mut(phase_number)?
                .support_mut()?
                .set_status(&ticket_id, status, actor.role),
            PhaseAction::SetTicketPriority { ticket_id, priority } => project
                .phase_mut(phase_number)?
                .support_mut()?
                .set_priority(&ticket_id, priority, actor.role),
            PhaseAction::ReplyTicket { ticket_id, body } => project
                .phase_mut(phase_number)?
                .support_mut()?
                .reply(&ticket_id, actor.id.clone(), actor.name.clone(), actor.role, body)
                .map(|_| ()),

            PhaseAction::AddTask { description, assignee_id } => {
                require_staff(actor)?;
                let assignee = assignee_id
                    .or_else(|| project.auxiliary_id.clone())
                    .unwrap_or_else(|| actor.id.clone());
                let phase = project.phase_mut(phase_number)?;
                let mut seq = phase.task_seq;
                task::add_task(&mut phase.tasks, &mut seq, description, assignee, actor.id.clone());
                phase.task_seq = seq;
                Ok(())
            }
            PhaseAction::CompleteTask { task_id } => {
                let phase = project.phase_mut(phase_number)?;
                task::complete_task(&mut phase.tasks, &task_id, &actor.id)
            }
            PhaseAction::ApproveTask { task_id } => {
                let phase = project.phase_mut(phase_number)?;
                task::approve_task(&mut phase.tasks, &task_id, actor.role)
            }
            PhaseAction::AttachTaskDocument { task_id, document_id } => {
                let phase = project.phase_mut(phase_number)?;
                task::link_document(&mut phase.tasks, &task_id, document_id)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Role guards
// ---------------------------------------------------------------------------

fn require_staff(actor: &Actor) -> Result<()> {
    if !actor.role.is_staff() {
        return Err(HoldingError::Forbidden(
            "this action is restricted to staff".to_string(),
        ));
    }
    Ok(())
}

fn require_reviewer(actor: &Actor) -> Result<()> {
    if !actor.role.can_advance_phase() {
        return Err(HoldingError::Forbidden(
            "this action is restricted to consultants and administrators".to_string(),
        ));
    }
    Ok(())
}

fn require_partner(actor: &Actor) -> Result<()> {
    if actor.role != Role::Client || actor.client_type != Some(ClientType::Partner) {
        return Err(HoldingError::Forbidden(
            "approvals are recorded by partner members".to_string(),
        ));
    }
    Ok(())
}

/// The minuta and agreement phases both carry a draft review at the top
/// level of their payload.
fn review_mut(phase: &mut Phase) -> Result<&mut DraftReview> {
    match &mut phase.data {
        PhaseData::Minuta(review) => Ok(review),
        PhaseData::Agreement(data) => Ok(&mut data.review),
        other => Err(HoldingError::InvalidPhase(other.phase_id().number())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
