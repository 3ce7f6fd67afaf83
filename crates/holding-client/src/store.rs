use crate::api::{ApiClient, ProjectSummary, UserView};
use crate::Result;

// ---------------------------------------------------------------------------
// LocalState
// ---------------------------------------------------------------------------

/// The client-side mirror of server state. Mutations touch this first, then
/// the backend; the backend copy is always the canonical one.
#[derive(Debug, Default)]
pub struct LocalState {
    pub projects: Vec<ProjectSummary>,
    pub users: Vec<UserView>,
}

impl LocalState {
    fn project_position(&self, id: &str) -> Option<usize> {
        self.projects.iter().position(|p| p.id == id)
    }
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

/// One optimistic mutation as an apply/commit/rollback triple. `apply` makes
/// the local edit and records whatever `rollback` needs to undo it; `commit`
/// issues the single corresponding backend call. The store invokes all three
/// uniformly, so failure handling is identical for every mutation.
#[derive(Debug)]
pub enum Mutation {
    DeleteProject {
        id: String,
        removed: Option<(usize, ProjectSummary)>,
    },
    RenameProject {
        id: String,
        name: String,
        previous: Option<String>,
    },
    AdvancePhase {
        id: String,
        from_phase: u8,
        previous_phase: Option<u8>,
    },
    RemoveClient {
        project_id: String,
        user_id: String,
        restored_position: Option<usize>,
    },
}

impl Mutation {
    pub fn delete_project(id: impl Into<String>) -> Self {
        Mutation::DeleteProject {
            id: id.into(),
            removed: None,
        }
    }

    pub fn rename_project(id: impl Into<String>, name: impl Into<String>) -> Self {
        Mutation::RenameProject {
            id: id.into(),
            name: name.into(),
            previous: None,
        }
    }

    pub fn advance_phase(id: impl Into<String>, from_phase: u8) -> Self {
        Mutation::AdvancePhase {
            id: id.into(),
            from_phase,
            previous_phase: None,
        }
    }

    pub fn remove_client(project_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Mutation::RemoveClient {
            project_id: project_id.into(),
            user_id: user_id.into(),
            restored_position: None,
        }
    }

    fn apply(&mut self, state: &mut LocalState) {
        match self {
            Mutation::DeleteProject { id, removed } => {
                if let Some(pos) = state.project_position(id) {
                    *removed = Some((pos, state.projects.remove(pos)));
                }
            }
            Mutation::RenameProject { id, name, previous } => {
                if let Some(pos) = state.project_position(id) {
                    *previous = Some(std::mem::replace(&mut state.projects[pos].name, name.clone()));
                }
            }
            Mutation::AdvancePhase { id, previous_phase, .. } => {
                if let Some(pos) = state.project_position(id) {
                    let project = &mut state.projects[pos];
                    *previous_phase = Some(project.current_phase);
                    if project.current_phase < 7 {
                        project.current_phase += 1;
                    }
                }
            }
            Mutation::RemoveClient { project_id, user_id, restored_position } => {
                if let Some(pos) = state.project_position(project_id) {
                    let clients = &mut state.projects[pos].client_ids;
                    if let Some(i) = clients.iter().position(|c| c == user_id) {
                        clients.remove(i);
                        *restored_position = Some(i);
                    }
                }
            }
        }
    }

    fn commit(&self, api: &ApiClient) -> Result<()> {
        match self {
            Mutation::DeleteProject { id, .. } => api.delete_project(id),
            Mutation::RenameProject { id, name, .. } => {
                api.update_project(id, &serde_json::json!({ "name": name }))?;
                Ok(())
            }
            Mutation::AdvancePhase { id, from_phase, .. } => {
                api.advance_phase(id, *from_phase)?;
                Ok(())
            }
            Mutation::RemoveClient { project_id, user_id, .. } => {
                api.remove_client(project_id, user_id)?;
                Ok(())
            }
        }
    }

    fn rollback(&mut self, state: &mut LocalState) {
        match self {
            Mutation::DeleteProject { removed, .. } => {
                if let Some((pos, summary)) = removed.take() {
                    let pos = pos.min(state.projects.len());
                    state.projects.insert(pos, summary);
                }
            }
            Mutation::RenameProject { id, previous, .. } => {
                if let (Some(pos), Some(previous)) = (state.project_position(id), previous.take()) {
                    state.projects[pos].name = previous;
                }
            }
            Mutation::AdvancePhase { id, previous_phase, .. } => {
                if let (Some(pos), Some(phase)) = (state.project_position(id), previous_phase.take())
                {
                    state.projects[pos].current_phase = phase;
                }
            }
            Mutation::RemoveClient { project_id, user_id, restored_position } => {
                if let (Some(pos), Some(i)) =
                    (state.project_position(project_id), restored_position.take())
                {
                    let clients = &mut state.projects[pos].client_ids;
                    let i = i.min(clients.len());
                    clients.insert(i, user_id.clone());
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Local mirror plus the API client that keeps it honest.
pub struct Store {
    pub api: ApiClient,
    pub state: LocalState,
}

impl Store {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: LocalState::default(),
        }
    }

    /// Pull the canonical project list and visible user set.
    pub fn load(&mut self) -> Result<()> {
        self.state.projects = self.api.list_projects()?;
        self.state.users = self.visible_users()?;
        Ok(())
    }

    /// The user directory is staff-only; a client gets 403 and instead
    /// derives the visible set from the members of its own projects.
    fn visible_users(&self) -> Result<Vec<UserView>> {
        match self.api.list_users() {
            Ok(users) => Ok(users),
            Err(e) if e.is_forbidden() => {
                let mut users: Vec<UserView> = Vec::new();
                for project in &self.state.projects {
                    for member in self.api.list_members(&project.id)? {
                        if !users.iter().any(|u| u.id == member.id) {
                            users.push(member);
                        }
                    }
                }
                Ok(users)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply the mutation locally, commit it to the backend, and on failure
    /// roll the local edit back and reload canonical state. The error is
    /// still returned so the caller can surface it.
    pub fn execute(&mut self, mut mutation: Mutation) -> Result<()> {
        mutation.apply(&mut self.state);
        match mutation.commit(&self.api) {
            Ok(()) => Ok(()),
            Err(e) => {
                mutation.rollback(&mut self.state);
                if let Err(reload) = self.load() {
                    tracing::warn!("reload after failed mutation also failed: {reload}");
                }
                Err(e)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
