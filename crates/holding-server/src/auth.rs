use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::Engine as _;
use rand::RngCore;

use crate::error::AppError;
use crate::routes::{ok, user_json};
use crate::state::AppState;
use holding_core::user::User;

/// The authenticated user, injected into request extensions by
/// [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

fn new_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

/// Middleware gating every API route except the login and password-change
/// endpoints. Resolves the bearer token to a user record and stashes it in
/// request extensions.
pub async fn require_auth(State(app): State<AppState>, mut req: Request, next: Next) -> Response {
    let Some(token) = bearer_token(&req) else {
        return AppError::unauthorized("missing bearer token").into_response();
    };
    let Some(user_id) = app.session_user(&token).await else {
        return AppError::unauthorized("invalid or expired token").into_response();
    };

    let root = app.root.clone();
    let user = tokio::task::spawn_blocking(move || User::load(&root, &user_id)).await;
    match user {
        Ok(Ok(user)) => {
            req.extensions_mut().insert(CurrentUser(user));
            next.run(req).await
        }
        Ok(Err(e)) => AppError(e.into()).into_response(),
        Err(e) => AppError(anyhow::anyhow!("task join error: {e}")).into_response(),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login — exchange credentials for a bearer token.
///
/// A user flagged `requires_password_change` gets the distinguished
/// `PASSWORD_CHANGE_REQUIRED` signal with a minimal stub instead of a token;
/// the caller must go through the password-change endpoint first.
pub async fn login(
    State(app): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = tokio::task::spawn_blocking(move || {
        let user = User::find_by_email(&root, &body.email)?
            .ok_or(holding_core::HoldingError::InvalidCredentials)?;
        if !user.verify_password(&body.password) {
            return Err(holding_core::HoldingError::InvalidCredentials);
        }
        Ok::<_, holding_core::HoldingError>(user)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    if user.requires_password_change {
        return Ok(ok(serde_json::json!({
            "code": "PASSWORD_CHANGE_REQUIRED",
            "user": {
                "id": user.id,
                "name": user.name,
                "email": user.email,
            },
        })));
    }

    let token = new_token();
    app.open_session(token.clone(), user.id.clone()).await;
    Ok(ok(serde_json::json!({
        "token": token,
        "user": user_json(&user),
    })))
}

/// POST /api/auth/logout — drop the session behind the bearer token.
pub async fn logout(State(app): State<AppState>, req: Request) -> Json<serde_json::Value> {
    if let Some(token) = bearer_token(&req) {
        app.close_session(&token).await;
    }
    ok(serde_json::json!({}))
}

/// GET /api/auth/me — the user behind the current token.
pub async fn me(
    axum::Extension(CurrentUser(user)): axum::Extension<CurrentUser>,
) -> Json<serde_json::Value> {
    ok(user_json(&user))
}

#[derive(serde::Deserialize)]
pub struct ChangePasswordBody {
    pub email: String,
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/auth/change-password — verify the current password, set the new
/// one and log the user in. Serves both the forced first-login change and a
/// voluntary one, so it lives outside the auth gate.
pub async fn change_password(
    State(app): State<AppState>,
    Json(body): Json<ChangePasswordBody>,
) -> Result<Json<serde_json::Value>, AppError> {
    let root = app.root.clone();
    let user = tokio::task::spawn_blocking(move || {
        let mut user = User::find_by_email(&root, &body.email)?
            .ok_or(holding_core::HoldingError::InvalidCredentials)?;
        if !user.verify_password(&body.current_password) {
            return Err(holding_core::HoldingError::InvalidCredentials);
        }
        user.set_password(&body.new_password);
        user.requires_password_change = false;
        user.save(&root)?;
        Ok::<_, holding_core::HoldingError>(user)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;

    let token = new_token();
    app.open_session(token.clone(), user.id.clone()).await;
    Ok(ok(serde_json::json!({
        "token": token,
        "user": user_json(&user),
    })))
}
