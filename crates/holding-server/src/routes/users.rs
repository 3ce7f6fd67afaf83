use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::routes::{ok, user_json};
use crate::state::AppState;
use holding_core::types::{ClientType, Role};
use holding_core::user::{QualificationData, User};
use holding_core::{project, HoldingError};

/// GET /api/users — full directory, staff only. Clients get a 403 and are
/// expected to derive the visible set from their projects instead.
pub async fn list_users(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !current.role.is_staff() {
        return Err(AppError::forbidden("the user directory is staff-only"));
    }
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let users = User::list(&root)?;
        let list: Vec<serde_json::Value> = users.iter().map(user_json).collect();
        Ok::<_, HoldingError>(serde_json::json!(list))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

#[derive(serde::Deserialize)]
pub struct CreateUserBody {
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub client_type: Option<ClientType>,
    /// Absent means a provisional password is generated and returned once.
    #[serde(default)]
    pub password: Option<String>,
}

/// POST /api/users — create a user, staff only.
pub async fn create_user(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Json(body): Json<CreateUserBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !current.role.is_staff() {
        return Err(AppError::forbidden("only staff can create users"));
    }
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut user = User::new(body.name, body.email, body.role, "")?;
        if let Some(client_type) = body.client_type {
            user.set_client_type(client_type);
        }
        let provisional = match body.password {
            Some(password) => {
                user.set_password(&password);
                None
            }
            None => Some(user.assign_provisional_password()),
        };
        let user = User::create(&root, user)?;
        Ok::<_, HoldingError>(serde_json::json!({
            "user": user_json(&user),
            "provisional_password": provisional,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !current.role.is_staff() && current.id != id {
        return Err(AppError::forbidden("clients can only read their own record"));
    }
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let user = User::load(&root, &id)?;
        Ok::<_, HoldingError>(user_json(&user))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

#[derive(serde::Deserialize)]
pub struct UpdateUserBody {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub client_type: Option<ClientType>,
    #[serde(default)]
    pub qualification: Option<QualificationData>,
}

/// PUT /api/users/{id} — partial update. Users edit their own profile;
/// role and client-type changes are staff-only.
pub async fn update_user(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let is_staff = current.role.is_staff();
    if !is_staff && current.id != id {
        return Err(AppError::forbidden("clients can only edit their own record"));
    }
    if !is_staff && (body.role.is_some() || body.client_type.is_some()) {
        return Err(AppError::forbidden("role assignment is staff-only"));
    }
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut user = User::load(&root, &id)?;
        if let Some(name) = body.name {
            user.name = name;
        }
        if let Some(role) = body.role {
            user.role = role;
        }
        if let Some(client_type) = body.client_type {
            user.set_client_type(client_type);
        }
        if let Some(qualification) = body.qualification {
            user.set_qualification(qualification);
        }
        user.save(&root)?;
        Ok::<_, HoldingError>(user_json(&user))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// DELETE /api/users/{id} — staff only. Hard-blocked while the user is still
/// a member of any project; remove them from the project first.
pub async fn delete_user(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !current.role.is_staff() {
        return Err(AppError::forbidden("only staff can delete users"));
    }
    let root = app.root.clone();
    tokio::task::spawn_blocking(move || {
        for p in project::list(&root)? {
            if p.is_member(&id) {
                return Err(HoldingError::UserReferenced {
                    user: id.clone(),
                    project: p.name.clone(),
                });
            }
        }
        User::delete(&root, &id)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(serde_json::json!({})))
}

/// POST /api/users/{id}/reset-password — staff only. Issues a fresh
/// provisional password and forces a change at next login.
pub async fn reset_password(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !current.role.is_staff() {
        return Err(AppError::forbidden("only staff can reset passwords"));
    }
    let root = app.root.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut user = User::load(&root, &id)?;
        let provisional = user.assign_provisional_password();
        user.save(&root)?;
        Ok::<_, HoldingError>(serde_json::json!({ "provisional_password": provisional }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}
