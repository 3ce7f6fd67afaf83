use crate::activity::{self, LogEntry};
use crate::chat::{self, ChatMessage};
use crate::error::{HoldingError, Result};
use crate::phase::Phase;
use crate::types::{
    ClientType, PhaseId, PhaseStatus, PostCompletionPath, PostCompletionStatus, ProjectStatus,
    Role,
};
use crate::user::User;
use crate::{io, paths};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// The authenticated user on whose behalf an operation runs. Carried into
/// every mutation so permission checks stay next to the transition they
/// guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<ClientType>,
}

impl Actor {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            role: user.role,
            client_type: user.client_type,
        }
    }

    /// Interested members browse but never mutate.
    pub fn is_interested(&self) -> bool {
        self.role == Role::Client && self.client_type == Some(ClientType::Interested)
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// One holding-formation engagement. Owns its ten phases, both chat threads
/// and the activity trail; member users are referenced by id, never owned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    /// 1-based number of the active phase. Only ever increases.
    pub current_phase: u8,
    pub consultant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auxiliary_id: Option<String>,
    pub client_ids: Vec<String>,
    pub phases: Vec<Phase>,
    #[serde(default = "default_post_completion")]
    pub post_completion: PostCompletionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_completion_path: Option<PostCompletionPath>,
    #[serde(default)]
    pub client_chat: Vec<ChatMessage>,
    #[serde(default)]
    pub client_chat_seq: u32,
    #[serde(default)]
    pub internal_chat: Vec<ChatMessage>,
    #[serde(default)]
    pub internal_chat_seq: u32,
    #[serde(default)]
    pub activity_log: Vec<LogEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_post_completion() -> PostCompletionStatus {
    PostCompletionStatus::NotAvailable
}

/// Partial update applied through the generic project PUT. Absent fields are
/// left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub status: Option<ProjectStatus>,
    pub current_phase: Option<u8>,
    pub client_ids: Option<Vec<String>>,
    pub auxiliary_id: Option<Option<String>>,
}

impl Project {
    /// Seed a new engagement: all ten phases pre-created, phase 1 already in
    /// progress.
    pub fn new(
        name: impl Into<String>,
        consultant_id: impl Into<String>,
        client_ids: Vec<String>,
    ) -> Self {
        let mut phases: Vec<Phase> = PhaseId::all().iter().map(|id| Phase::default_for(*id)).collect();
        phases[0].status = PhaseStatus::InProgress;
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            status: ProjectStatus::InProgress,
            current_phase: 1,
            consultant_id: consultant_id.into(),
            auxiliary_id: None,
            client_ids,
            phases,
            post_completion: PostCompletionStatus::NotAvailable,
            post_completion_path: None,
            client_chat: Vec::new(),
            client_chat_seq: 0,
            internal_chat: Vec::new(),
            internal_chat_seq: 0,
            activity_log: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // -- phase access -------------------------------------------------------

    pub fn phase(&self, number: u8) -> Result<&Phase> {
        PhaseId::from_number(number)
            .and_then(|id| self.phases.iter().find(|p| p.id == id))
            .ok_or(HoldingError::InvalidPhase(number))
    }

    pub fn phase_mut(&mut self, number: u8) -> Result<&mut Phase> {
        PhaseId::from_number(number)
            .and_then(|id| self.phases.iter_mut().find(|p| p.id == id))
            .ok_or(HoldingError::InvalidPhase(number))
    }

    /// Whether a phase is frozen for this viewer. Staff keep editing
    /// completed phases; interested members and archived projects are always
    /// read-only; a completed project freezes the pipeline phases (1-7) but
    /// leaves the post-completion phases live.
    pub fn phase_read_only(&self, phase_number: u8, actor: &Actor) -> Result<bool> {
        let phase = self.phase(phase_number)?;
        if actor.is_interested() {
            return Ok(true);
        }
        if self.status == ProjectStatus::Archived {
            return Ok(true);
        }
        if actor.role.is_staff() {
            return Ok(false);
        }
        if self.status == ProjectStatus::Completed && phase_number <= 7 {
            return Ok(true);
        }
        Ok(phase.status == PhaseStatus::Completed)
    }

    // -- phase advancement --------------------------------------------------

    /// Advance the pipeline by one phase. `from_phase` must name the phase
    /// the caller believes is current; a stale number is a no-op rather than
    /// an error, so a double-click never double-advances. Returns whether
    /// the pipeline moved.
    pub fn advance_phase(&mut self, from_phase: u8, actor: &Actor) -> Result<bool> {
        if !actor.role.can_advance_phase() {
            return Err(HoldingError::Forbidden(
                "only consultants and administrators can advance phases".to_string(),
            ));
        }
        if from_phase != self.current_phase {
            return Ok(false);
        }
        if self.current_phase >= 7 {
            return Err(HoldingError::InvalidTransition {
                from: format!("phase {}", self.current_phase),
                to: format!("phase {}", self.current_phase + 1),
                reason: "the pipeline ends at conclusion; later phases unlock after finalization"
                    .to_string(),
            });
        }
        let next = self.current_phase + 1;
        self.phase_mut(self.current_phase)?.status = PhaseStatus::Completed;
        self.phase_mut(next)?.status = PhaseStatus::InProgress;
        self.current_phase = next;
        self.seed_property_processes()?;
        self.touch();
        Ok(true)
    }

    /// Entering the ITBI or registration phase materializes one sub-process
    /// per real-estate asset approved in the integralization phase.
    fn seed_property_processes(&mut self) -> Result<()> {
        let assets: Vec<crate::phases::integralization::Asset> = self
            .phase(3)?
            .integralization()?
            .real_estate_assets()
            .into_iter()
            .cloned()
            .collect();
        let refs: Vec<&crate::phases::integralization::Asset> = assets.iter().collect();
        match self.current_phase {
            5 => self.phase_mut(5)?.itbi_mut()?.seed_from_assets(&refs),
            6 => self.phase_mut(6)?.registration_mut()?.seed_from_assets(&refs),
            _ => {}
        }
        Ok(())
    }

    /// Close the engagement at phase 7. Requires phases 1 through 6 to be
    /// completed; flips the project itself to completed and opens the
    /// post-completion choice and the support desk.
    pub fn finalize(&mut self, actor: &Actor) -> Result<()> {
        if !actor.role.can_advance_phase() {
            return Err(HoldingError::Forbidden(
                "only consultants and administrators can finalize a project".to_string(),
            ));
        }
        for n in 1..=6 {
            if self.phase(n)?.status != PhaseStatus::Completed {
                return Err(HoldingError::InvalidTransition {
                    from: format!("phase {n} {}", self.phase(n)?.status),
                    to: "finalized".to_string(),
                    reason: format!("phase {n} is not completed"),
                });
            }
        }
        self.phase_mut(7)?.conclusion_mut()?.finalize(actor.id.clone())?;
        self.phase_mut(7)?.status = PhaseStatus::Completed;
        self.phase_mut(10)?.status = PhaseStatus::InProgress;
        self.status = ProjectStatus::Completed;
        self.post_completion = PostCompletionStatus::PendingChoice;
        self.touch();
        Ok(())
    }

    /// The client's choice of what follows conclusion. Bumps
    /// `current_phase` as a high-water mark, never backwards.
    pub fn choose_post_completion(&mut self, path: PostCompletionPath, actor: &Actor) -> Result<()> {
        if actor.is_interested() {
            return Err(HoldingError::Forbidden(
                "interested members cannot choose the post-completion path".to_string(),
            ));
        }
        if self.post_completion != PostCompletionStatus::PendingChoice {
            return Err(HoldingError::InvalidTransition {
                from: "post_completion".to_string(),
                to: "in_progress".to_string(),
                reason: "the post-completion choice is not open".to_string(),
            });
        }
        self.post_completion = PostCompletionStatus::InProgress;
        self.post_completion_path = Some(path);
        let target = path.phase().number();
        self.phase_mut(target)?.status = PhaseStatus::InProgress;
        if target > self.current_phase {
            self.current_phase = target;
        }
        self.touch();
        Ok(())
    }

    // -- membership ---------------------------------------------------------

    pub fn add_client(&mut self, user_id: impl Into<String>) -> Result<()> {
        let user_id = user_id.into();
        if !self.client_ids.contains(&user_id) {
            self.client_ids.push(user_id);
            self.touch();
        }
        Ok(())
    }

    /// A project always keeps at least one client member.
    pub fn remove_client(&mut self, user_id: &str) -> Result<()> {
        if !self.client_ids.iter().any(|id| id == user_id) {
            return Err(HoldingError::UserNotFound(user_id.to_string()));
        }
        if self.client_ids.len() == 1 {
            return Err(HoldingError::LastMember);
        }
        self.client_ids.retain(|id| id != user_id);
        self.touch();
        Ok(())
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.client_ids.iter().any(|id| id == user_id)
            || self.consultant_id == user_id
            || self.auxiliary_id.as_deref() == Some(user_id)
    }

    pub fn visible_to(&self, actor: &Actor) -> bool {
        actor.role.is_staff() || self.is_member(&actor.id)
    }

    // -- chat and activity --------------------------------------------------

    pub fn post_client_message(&mut self, actor: &Actor, body: impl Into<String>) -> Result<String> {
        if actor.is_interested() {
            return Err(HoldingError::Forbidden(
                "interested members have view-only access".to_string(),
            ));
        }
        let id = chat::push_message(
            &mut self.client_chat,
            &mut self.client_chat_seq,
            actor.id.clone(),
            actor.name.clone(),
            actor.role,
            body,
        );
        self.touch();
        Ok(id)
    }

    pub fn post_internal_message(
        &mut self,
        actor: &Actor,
        body: impl Into<String>,
    ) -> Result<String> {
        if !actor.role.is_staff() {
            return Err(HoldingError::Forbidden(
                "the internal thread is staff-only".to_string(),
            ));
        }
        let id = chat::push_message(
            &mut self.internal_chat,
            &mut self.internal_chat_seq,
            actor.id.clone(),
            actor.name.clone(),
            actor.role,
            body,
        );
        self.touch();
        Ok(id)
    }

    pub fn log(&mut self, actor: &Actor, action: impl Into<String>) {
        activity::record(&mut self.activity_log, actor.id.clone(), actor.name.clone(), action);
        self.touch();
    }

    // -- generic partial update --------------------------------------------

    pub fn apply_update(&mut self, update: ProjectUpdate) -> Result<()> {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(current) = update.current_phase {
            if PhaseId::from_number(current).is_none() {
                return Err(HoldingError::InvalidPhase(current));
            }
            if current < self.current_phase {
                return Err(HoldingError::InvalidTransition {
                    from: format!("phase {}", self.current_phase),
                    to: format!("phase {current}"),
                    reason: "the current phase never decreases".to_string(),
                });
            }
            self.current_phase = current;
        }
        if let Some(client_ids) = update.client_ids {
            if client_ids.is_empty() {
                return Err(HoldingError::LastMember);
            }
            self.client_ids = client_ids;
        }
        if let Some(auxiliary_id) = update.auxiliary_id {
            self.auxiliary_id = auxiliary_id;
        }
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// Persistence (one manifest per project under .holding/projects/)
// ---------------------------------------------------------------------------

pub fn save(root: &Path, project: &Project) -> Result<()> {
    io::save_yaml(&paths::project_manifest(root, &project.id), project)
}

pub fn load(root: &Path, id: &str) -> Result<Project> {
    let path = paths::project_manifest(root, id);
    if !path.exists() {
        return Err(HoldingError::ProjectNotFound(id.to_string()));
    }
    io::load_yaml(&path)
}

pub fn delete(root: &Path, id: &str) -> Result<()> {
    let dir = paths::project_dir(root, id);
    if !dir.exists() {
        return Err(HoldingError::ProjectNotFound(id.to_string()));
    }
    std::fs::remove_dir_all(dir)?;
    Ok(())
}

/// All projects, newest first.
pub fn list(root: &Path) -> Result<Vec<Project>> {
    let dir = root.join(paths::PROJECTS_DIR);
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut projects = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let manifest = entry.path().join(paths::MANIFEST_FILE);
        if !manifest.exists() {
            continue;
        }
        projects.push(io::load_yaml::<Project>(&manifest)?);
    }
    projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(projects)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phases::integralization::AssetKind;
    use tempfile::TempDir;

    fn consultant() -> Actor {
        Actor {
            id: "cons-1".to_string(),
            name: "Caio".to_string(),
            role: Role::Consultant,
            client_type: None,
        }
    }

    fn client() -> Actor {
        Actor {
            id: "cli-1".to_string(),
            name: "Ana".to_string(),
            role: Role::Client,
            client_type: Some(ClientType::Partner),
        }
    }

    fn interested() -> Actor {
        Actor {
            id: "cli-2".to_string(),
            name: "Beto".to_string(),
            role: Role::Client,
            client_type: Some(ClientType::Interested),
        }
    }

    fn sample() -> Project {
        Project::new("Holding Família Silva", "cons-1", vec!["cli-1".to_string()])
    }

    fn advance_to(project: &mut Project, target: u8) {
        let actor = consultant();
        while project.current_phase < target {
            let from = project.current_phase;
            project.advance_phase(from, &actor).unwrap();
        }
    }

    #[test]
    fn new_project_seeds_ten_phases() {
        let project = sample();
        assert_eq!(project.phases.len(), 10);
        assert_eq!(project.current_phase, 1);
        assert_eq!(project.phases[0].status, PhaseStatus::InProgress);
        for phase in &project.phases[1..] {
            assert_eq!(phase.status, PhaseStatus::Pending);
        }
        let numbers: Vec<u8> = project.phases.iter().map(|p| p.id.number()).collect();
        assert_eq!(numbers, (1..=10).collect::<Vec<u8>>());
    }

    #[test]
    fn advance_moves_exactly_one_phase() {
        let mut project = sample();
        advance_to(&mut project, 2);

        let moved = project.advance_phase(2, &consultant()).unwrap();
        assert!(moved);
        assert_eq!(project.current_phase, 3);
        assert_eq!(project.phase(2).unwrap().status, PhaseStatus::Completed);
        assert_eq!(project.phase(3).unwrap().status, PhaseStatus::InProgress);
    }

    #[test]
    fn stale_advance_is_a_noop() {
        let mut project = sample();
        advance_to(&mut project, 3);

        let moved = project.advance_phase(2, &consultant()).unwrap();
        assert!(!moved);
        assert_eq!(project.current_phase, 3);
    }

    #[test]
    fn clients_cannot_advance() {
        let mut project = sample();
        assert!(project.advance_phase(1, &client()).is_err());
        assert!(project.advance_phase(1, &interested()).is_err());
    }

    #[test]
    fn auxiliary_cannot_advance() {
        let mut project = sample();
        let aux = Actor {
            id: "aux-1".to_string(),
            name: "Duda".to_string(),
            role: Role::Auxiliary,
            client_type: None,
        };
        assert!(project.advance_phase(1, &aux).is_err());
    }

    #[test]
    fn entering_itbi_seeds_processes_from_real_estate_assets() {
        let mut project = sample();
        {
            let data = project.phase_mut(3).unwrap().integralization_mut().unwrap();
            data.add_asset("Apartamento", AssetKind::RealEstate, None, None).unwrap();
            data.add_asset("Carro", AssetKind::Vehicle, None, None).unwrap();
            data.add_asset("Sala", AssetKind::RealEstate, None, None).unwrap();
        }
        advance_to(&mut project, 5);

        let itbi = project.phase(5).unwrap().itbi().unwrap();
        assert_eq!(itbi.processes.len(), 2);

        advance_to(&mut project, 6);
        let reg = project.phase(6).unwrap().registration().unwrap();
        assert_eq!(reg.processes.len(), 2);
    }

    #[test]
    fn pipeline_stops_at_conclusion() {
        let mut project = sample();
        advance_to(&mut project, 7);
        assert!(project.advance_phase(7, &consultant()).is_err());
    }

    #[test]
    fn finalize_requires_all_pipeline_phases_completed() {
        let mut project = sample();
        assert!(project.finalize(&consultant()).is_err());

        advance_to(&mut project, 7);
        project.finalize(&consultant()).unwrap();
        assert_eq!(project.status, ProjectStatus::Completed);
        assert_eq!(project.post_completion, PostCompletionStatus::PendingChoice);
        assert_eq!(project.phase(7).unwrap().status, PhaseStatus::Completed);
        assert_eq!(project.phase(10).unwrap().status, PhaseStatus::InProgress);
    }

    #[test]
    fn post_completion_choice_unlocks_target_phase() {
        let mut project = sample();
        advance_to(&mut project, 7);
        project.finalize(&consultant()).unwrap();

        project.choose_post_completion(PostCompletionPath::QuotaTransfer, &client()).unwrap();
        assert_eq!(project.post_completion, PostCompletionStatus::InProgress);
        assert_eq!(project.current_phase, 8);
        assert_eq!(project.phase(8).unwrap().status, PhaseStatus::InProgress);

        let again = project.choose_post_completion(PostCompletionPath::PartnerAgreement, &client());
        assert!(again.is_err());
    }

    #[test]
    fn post_completion_choice_closed_before_finalize() {
        let mut project = sample();
        assert!(project
            .choose_post_completion(PostCompletionPath::PartnerAgreement, &client())
            .is_err());
    }

    #[test]
    fn last_member_cannot_be_removed() {
        let mut project = sample();
        assert!(matches!(
            project.remove_client("cli-1"),
            Err(HoldingError::LastMember)
        ));

        project.add_client("cli-2").unwrap();
        project.remove_client("cli-1").unwrap();
        assert_eq!(project.client_ids, vec!["cli-2".to_string()]);
    }

    #[test]
    fn add_client_is_idempotent() {
        let mut project = sample();
        project.add_client("cli-1").unwrap();
        assert_eq!(project.client_ids.len(), 1);
    }

    #[test]
    fn internal_thread_is_staff_only() {
        let mut project = sample();
        assert!(project.post_internal_message(&client(), "nota interna").is_err());
        project.post_internal_message(&consultant(), "nota interna").unwrap();
        assert_eq!(project.internal_chat.len(), 1);
    }

    #[test]
    fn interested_member_cannot_post() {
        let mut project = sample();
        project.add_client("cli-2").unwrap();
        assert!(project.post_client_message(&interested(), "olá").is_err());
    }

    #[test]
    fn read_only_matrix() {
        let mut project = sample();
        project.add_client("cli-2").unwrap();

        assert!(!project.phase_read_only(1, &client()).unwrap());
        assert!(project.phase_read_only(1, &interested()).unwrap());

        advance_to(&mut project, 3);
        // completed phase stays editable for staff, frozen for clients
        assert!(project.phase_read_only(1, &client()).unwrap());
        assert!(!project.phase_read_only(1, &consultant()).unwrap());

        advance_to(&mut project, 7);
        project.finalize(&consultant()).unwrap();
        // completed project freezes pipeline phases for clients, support stays live
        assert!(project.phase_read_only(3, &client()).unwrap());
        assert!(!project.phase_read_only(10, &client()).unwrap());

        project.status = ProjectStatus::Archived;
        assert!(project.phase_read_only(10, &consultant()).unwrap());
    }

    #[test]
    fn update_rejects_phase_regression() {
        let mut project = sample();
        advance_to(&mut project, 4);

        let update = ProjectUpdate {
            current_phase: Some(2),
            ..Default::default()
        };
        assert!(project.apply_update(update).is_err());
        assert_eq!(project.current_phase, 4);
    }

    #[test]
    fn update_rejects_empty_member_list() {
        let mut project = sample();
        let update = ProjectUpdate {
            client_ids: Some(Vec::new()),
            ..Default::default()
        };
        assert!(project.apply_update(update).is_err());
    }

    #[test]
    fn update_applies_present_fields_only() {
        let mut project = sample();
        let update = ProjectUpdate {
            name: Some("Holding Família Souza".to_string()),
            ..Default::default()
        };
        project.apply_update(update).unwrap();
        assert_eq!(project.name, "Holding Família Souza");
        assert_eq!(project.status, ProjectStatus::InProgress);
    }

    #[test]
    fn persistence_roundtrip_and_listing() {
        let dir = TempDir::new().unwrap();
        let mut project = sample();
        project.log(&consultant(), "criou o projeto");
        save(dir.path(), &project).unwrap();

        let loaded = load(dir.path(), &project.id).unwrap();
        assert_eq!(loaded.name, project.name);
        assert_eq!(loaded.phases.len(), 10);
        assert_eq!(loaded.activity_log.len(), 1);

        let all = list(dir.path()).unwrap();
        assert_eq!(all.len(), 1);

        delete(dir.path(), &project.id).unwrap();
        assert!(load(dir.path(), &project.id).is_err());
        assert!(list(dir.path()).unwrap().is_empty());
    }
}
