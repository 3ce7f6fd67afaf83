use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::routes::{ok, user_json};
use crate::state::AppState;
use holding_core::project::{self, Actor, Project, ProjectUpdate};
use holding_core::types::{ClientType, PostCompletionPath, Role};
use holding_core::user::User;
use holding_core::HoldingError;

fn project_json(p: &Project) -> serde_json::Value {
    serde_json::json!({
        "id": p.id,
        "name": p.name,
        "status": p.status,
        "current_phase": p.current_phase,
        "consultant_id": p.consultant_id,
        "auxiliary_id": p.auxiliary_id,
        "client_ids": p.client_ids,
        "phases": p.phases,
        "post_completion": p.post_completion,
        "post_completion_path": p.post_completion_path,
        "created_at": p.created_at,
        "updated_at": p.updated_at,
    })
}

fn summary_json(p: &Project) -> serde_json::Value {
    serde_json::json!({
        "id": p.id,
        "name": p.name,
        "status": p.status,
        "current_phase": p.current_phase,
        "consultant_id": p.consultant_id,
        "client_ids": p.client_ids,
        "updated_at": p.updated_at,
    })
}

fn load_visible(root: &std::path::Path, id: &str, actor: &Actor) -> Result<Project, HoldingError> {
    let p = project::load(root, id)?;
    if !p.visible_to(actor) {
        return Err(HoldingError::Forbidden(
            "not a member of this project".to_string(),
        ));
    }
    Ok(p)
}

/// GET /api/projects — the projects visible to the caller. Staff see all,
/// clients see their memberships.
pub async fn list_projects(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let list: Vec<serde_json::Value> = project::list(&root)?
            .iter()
            .filter(|p| p.visible_to(&actor))
            .map(summary_json)
            .collect();
        Ok::<_, HoldingError>(serde_json::json!(list))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

#[derive(serde::Deserialize)]
pub struct NewClientBody {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub client_type: Option<ClientType>,
}

#[derive(serde::Deserialize)]
pub struct CreateProjectBody {
    pub name: String,
    #[serde(default)]
    pub consultant_id: Option<String>,
    #[serde(default)]
    pub auxiliary_id: Option<String>,
    pub main_client: NewClientBody,
    #[serde(default)]
    pub additional_clients: Vec<NewClientBody>,
}

/// POST /api/projects — provision a project with its ten phases and create
/// the member users, each with a provisional password and a forced change
/// at first login.
pub async fn create_project(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Json(body): Json<CreateProjectBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !current.role.is_staff() {
        return Err(AppError::forbidden("only staff can create projects"));
    }
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let consultant_id = body.consultant_id.unwrap_or_else(|| current.id.clone());
    let result = tokio::task::spawn_blocking(move || {
        let mut client_ids = Vec::new();
        let mut credentials = Vec::new();
        let members = std::iter::once(body.main_client).chain(body.additional_clients);
        for member in members {
            let mut user = User::new(member.name, member.email, Role::Client, "")?;
            user.set_client_type(member.client_type.unwrap_or(ClientType::Partner));
            let provisional = user.assign_provisional_password();
            let user = User::create(&root, user)?;
            credentials.push(serde_json::json!({
                "email": user.email,
                "provisional_password": provisional,
            }));
            client_ids.push(user.id);
        }

        let mut p = Project::new(body.name, consultant_id, client_ids);
        p.auxiliary_id = body.auxiliary_id;
        p.log(&actor, "criou o projeto");
        project::save(&root, &p)?;
        Ok::<_, HoldingError>(serde_json::json!({
            "project": project_json(&p),
            "credentials": credentials,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// GET /api/projects/{id}
pub async fn get_project(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let p = load_visible(&root, &id, &actor)?;
        Ok::<_, HoldingError>(project_json(&p))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// GET /api/projects/{id}/members — the member user records, so clients can
/// see who is involved without the staff-only directory.
pub async fn list_members(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let p = load_visible(&root, &id, &actor)?;
        let mut ids = p.client_ids.clone();
        ids.push(p.consultant_id.clone());
        if let Some(aux) = &p.auxiliary_id {
            ids.push(aux.clone());
        }
        let mut members = Vec::new();
        for user_id in ids {
            members.push(user_json(&User::load(&root, &user_id)?));
        }
        Ok::<_, HoldingError>(serde_json::json!(members))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// PUT /api/projects/{id} — generic partial update, staff only.
pub async fn update_project(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(update): Json<ProjectUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !current.role.is_staff() {
        return Err(AppError::forbidden("only staff can update project fields"));
    }
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let mut p = load_visible(&root, &id, &actor)?;
        p.apply_update(update)?;
        p.log(&actor, "atualizou o projeto");
        project::save(&root, &p)?;
        Ok::<_, HoldingError>(project_json(&p))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// DELETE /api/projects/{id} — hard delete, staff only.
pub async fn delete_project(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !current.role.is_staff() {
        return Err(AppError::forbidden("only staff can delete projects"));
    }
    let root = app.root.clone();
    tokio::task::spawn_blocking(move || project::delete(&root, &id))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(serde_json::json!({})))
}

#[derive(serde::Deserialize)]
pub struct AdvancePhaseBody {
    pub from_phase: u8,
}

/// POST /api/projects/{id}/advance-phase — move the pipeline forward by one.
/// A stale `from_phase` is answered with `advanced: false` instead of moving
/// twice.
pub async fn advance_phase(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<AdvancePhaseBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let mut p = load_visible(&root, &id, &actor)?;
        let advanced = p.advance_phase(body.from_phase, &actor)?;
        if advanced {
            p.log(&actor, format!("avançou para a fase {}", p.current_phase));
            project::save(&root, &p)?;
        }
        Ok::<_, HoldingError>(serde_json::json!({
            "advanced": advanced,
            "current_phase": p.current_phase,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

#[derive(serde::Deserialize)]
pub struct PostCompletionBody {
    pub path: PostCompletionPath,
}

/// POST /api/projects/{id}/post-completion — the client's choice between
/// quota transfer and partner agreement, once the conclusion phase opens it.
pub async fn choose_post_completion(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<PostCompletionBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let mut p = load_visible(&root, &id, &actor)?;
        p.choose_post_completion(body.path, &actor)?;
        p.log(&actor, "escolheu o caminho pós-conclusão");
        project::save(&root, &p)?;
        Ok::<_, HoldingError>(project_json(&p))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

#[derive(serde::Deserialize)]
pub struct AddClientBody {
    pub user_id: String,
}

/// POST /api/projects/{id}/clients — attach an existing user.
pub async fn add_client(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<AddClientBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !current.role.is_staff() {
        return Err(AppError::forbidden("only staff can manage members"));
    }
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        User::load(&root, &body.user_id)?;
        let mut p = load_visible(&root, &id, &actor)?;
        p.add_client(body.user_id)?;
        p.log(&actor, "adicionou um membro");
        project::save(&root, &p)?;
        Ok::<_, HoldingError>(project_json(&p))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// DELETE /api/projects/{id}/clients/{user_id} — detach a member. The last
/// client member cannot be removed.
pub async fn remove_client(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !current.role.is_staff() {
        return Err(AppError::forbidden("only staff can manage members"));
    }
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let mut p = load_visible(&root, &id, &actor)?;
        p.remove_client(&user_id)?;
        p.log(&actor, "removeu um membro");
        project::save(&root, &p)?;
        Ok::<_, HoldingError>(project_json(&p))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

// ---------------------------------------------------------------------------
// Chat and activity
// ---------------------------------------------------------------------------

/// GET /api/projects/{id}/chat/{thread} — `client` or `internal`.
pub async fn get_chat(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path((id, thread)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    if thread != "client" && thread != "internal" {
        return Err(AppError::not_found(format!("unknown chat thread: {thread}")));
    }
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let p = load_visible(&root, &id, &actor)?;
        let messages = if thread == "internal" {
            if !actor.role.is_staff() {
                return Err(HoldingError::Forbidden(
                    "the internal thread is staff-only".to_string(),
                ));
            }
            &p.internal_chat
        } else {
            &p.client_chat
        };
        Ok::<_, HoldingError>(serde_json::json!(messages))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

#[derive(serde::Deserialize)]
pub struct ChatBody {
    pub body: String,
}

/// POST /api/projects/{id}/chat/{thread}
pub async fn post_chat(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path((id, thread)): Path<(String, String)>,
    Json(body): Json<ChatBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if thread != "client" && thread != "internal" {
        return Err(AppError::not_found(format!("unknown chat thread: {thread}")));
    }
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let mut p = load_visible(&root, &id, &actor)?;
        let message_id = if thread == "internal" {
            p.post_internal_message(&actor, body.body)?
        } else {
            p.post_client_message(&actor, body.body)?
        };
        project::save(&root, &p)?;
        Ok::<_, HoldingError>(serde_json::json!({ "message_id": message_id }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// GET /api/projects/{id}/activity — most recent first.
pub async fn get_activity(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let p = load_visible(&root, &id, &actor)?;
        Ok::<_, HoldingError>(serde_json::json!(p.activity_log))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

#[derive(serde::Deserialize)]
pub struct ActivityBody {
    pub action: String,
}

/// POST /api/projects/{id}/activity — client-synthesized trail entries.
/// Best effort, not an audit record.
pub async fn post_activity(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<ActivityBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    tokio::task::spawn_blocking(move || {
        let mut p = load_visible(&root, &id, &actor)?;
        p.log(&actor, body.action);
        project::save(&root, &p)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(serde_json::json!({})))
}
