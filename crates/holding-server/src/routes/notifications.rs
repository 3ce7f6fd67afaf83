use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::routes::ok;
use crate::state::AppState;
use holding_core::notification;

/// GET /api/notifications — the caller's inbox, newest first. Delivery is an
/// external concern; this server only stores and serves what producers push.
pub async fn list_notifications(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user_id = current.id.clone();
    let result = tokio::task::spawn_blocking(move || {
        let all = notification::list(&root, &user_id)?;
        Ok::<_, holding_core::HoldingError>(serde_json::json!(all))
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(result))
}

/// POST /api/notifications/{id}/read
pub async fn mark_read(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user_id = current.id.clone();
    tokio::task::spawn_blocking(move || notification::mark_read(&root, &user_id, &id))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(serde_json::json!({})))
}

/// POST /api/notifications/read-all
pub async fn mark_all_read(
    State(app): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user_id = current.id.clone();
    tokio::task::spawn_blocking(move || notification::mark_all_read(&root, &user_id))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    Ok(ok(serde_json::json!({})))
}
