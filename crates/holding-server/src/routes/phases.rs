use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::routes::{member_context, ok};
use crate::state::AppState;
use holding_core::action::PhaseAction;
use holding_core::project::{self, Actor};
use holding_core::HoldingError;

/// GET /api/projects/{id}/phases/{n} — one phase with its payload, tasks and
/// documents, plus whether it is frozen for the caller.
pub async fn get_phase(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path((id, number)): Path<(String, u8)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let p = project::load(&root, &id)?;
        if !p.visible_to(&actor) {
            return Err(HoldingError::Forbidden(
                "not a member of this project".to_string(),
            ));
        }
        let phase = p.phase(number)?;
        Ok::<_, HoldingError>(serde_json::json!({
            "id": phase.id,
            "number": phase.id.number(),
            "title": phase.id.title(),
            "status": phase.status,
            "tasks": phase.tasks,
            "documents": phase.documents,
            "data": phase.data,
            "read_only": p.phase_read_only(number, &actor)?,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// POST /api/projects/{id}/phases/{n}/actions — apply one phase action. The
/// body carries the tagged action payload; the result is the updated phase.
pub async fn apply_action(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path((id, number)): Path<(String, u8)>,
    Json(action): Json<PhaseAction>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let actor = Actor::from_user(&current);
    let result = tokio::task::spawn_blocking(move || {
        let mut p = project::load(&root, &id)?;
        if !p.visible_to(&actor) {
            return Err(HoldingError::Forbidden(
                "not a member of this project".to_string(),
            ));
        }
        let ctx = member_context(&root, &p.client_ids)?;
        let description = action.describe();
        action.apply(&mut p, number, &actor, &ctx)?;
        p.log(&actor, description);
        project::save(&root, &p)?;

        let phase = p.phase(number)?;
        Ok::<_, HoldingError>(serde_json::json!({
            "id": phase.id,
            "status": phase.status,
            "tasks": phase.tasks,
            "documents": phase.documents,
            "data": phase.data,
        }))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}
