use axum::http::StatusCode;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Bootstrap a workspace with the demo seed data.
fn init_workspace(dir: &TempDir) {
    let config = holding_core::config::Config::new("escritorio-teste");
    config.save(dir.path()).unwrap();
    holding_core::seed::plant(dir.path()).unwrap();
}

async fn send(
    app: axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(app: axum::Router, uri: &str, token: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, Some(token), None).await
}

async fn post_json(
    app: axum::Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(token), Some(body)).await
}

/// Log in and return the bearer token.
async fn login(app: axum::Router, email: &str, password: &str) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {json}");
    json["data"]["token"].as_str().expect("token in login response").to_string()
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_returns_token_and_user() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());

    let (status, json) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": "joao.completo@email.com", "password": "123" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["user"]["role"], "client");
    assert_eq!(json["data"]["user"]["client_type"], "partner");
    assert_eq!(json["data"]["user"]["data_complete"], true);
    assert!(json["data"]["token"].is_string());
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());

    let (status, _) = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": "joao.completo@email.com", "password": "errada" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn provisional_password_triggers_change_required_signal() {
    let dir = TempDir::new().unwrap();
    let config = holding_core::config::Config::new("escritorio-teste");
    config.save(dir.path()).unwrap();
    let mut user = holding_core::user::User::new(
        "Nova Cliente",
        "nova@email.com",
        holding_core::types::Role::Client,
        "",
    )
    .unwrap();
    let provisional = user.assign_provisional_password();
    holding_core::user::User::create(dir.path(), user).unwrap();

    let app = holding_server::build_router(dir.path().to_path_buf());
    let (status, json) = send(
        app.clone(),
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": "nova@email.com", "password": provisional })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["code"], "PASSWORD_CHANGE_REQUIRED");
    assert!(json["data"]["token"].is_null());

    // the change-password endpoint completes the flow and logs in
    let (status, json) = send(
        app,
        "POST",
        "/api/auth/change-password",
        None,
        Some(serde_json::json!({
            "email": "nova@email.com",
            "current_password": provisional,
            "new_password": "definitiva",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["token"].is_string());
    assert_eq!(json["data"]["user"]["requires_password_change"], false);
}

#[tokio::test]
async fn requests_without_token_are_401() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());

    let (status, _) = send(app, "GET", "/api/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clients_cannot_list_the_user_directory() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());

    let token = login(app.clone(), "joao.completo@email.com", "123").await;
    let (status, _) = get(app, "/api/users", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn staff_list_users_and_see_seed_records() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());

    let token = login(app.clone(), "caio@escritorio.com", "caio").await;
    let (status, json) = get(app, "/api/users", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn deleting_a_project_member_is_blocked() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());

    let token = login(app.clone(), "admin@escritorio.com", "admin").await;
    let joao = holding_core::user::User::find_by_email(dir.path(), "joao.completo@email.com")
        .unwrap()
        .unwrap();

    let (status, _) = send(
        app,
        "DELETE",
        &format!("/api/users/{}", joao.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_project_provisions_members_with_provisional_passwords() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());

    let token = login(app.clone(), "caio@escritorio.com", "caio").await;
    let (status, json) = post_json(
        app,
        "/api/projects",
        &token,
        serde_json::json!({
            "name": "Holding Família Souza",
            "main_client": { "name": "Rita Souza", "email": "rita@email.com" },
            "additional_clients": [
                { "name": "Pedro Souza", "email": "pedro@email.com" },
                { "name": "Lia Souza", "email": "lia@email.com", "client_type": "interested" },
            ],
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "create failed: {json}");
    let project = &json["data"]["project"];
    assert_eq!(project["client_ids"].as_array().unwrap().len(), 3);
    assert_eq!(project["current_phase"], 1);
    assert_eq!(project["phases"].as_array().unwrap().len(), 10);
    assert_eq!(json["data"]["credentials"].as_array().unwrap().len(), 3);

    for cred in json["data"]["credentials"].as_array().unwrap() {
        let email = cred["email"].as_str().unwrap();
        let user = holding_core::user::User::find_by_email(dir.path(), email)
            .unwrap()
            .unwrap();
        assert!(user.requires_password_change);
    }
}

#[tokio::test]
async fn clients_see_only_their_projects() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());

    let staff = login(app.clone(), "caio@escritorio.com", "caio").await;
    post_json(
        app.clone(),
        "/api/projects",
        &staff,
        serde_json::json!({
            "name": "Outro Projeto",
            "main_client": { "name": "Rita", "email": "rita@email.com" },
        }),
    )
    .await;

    let (_, staff_list) = get(app.clone(), "/api/projects", &staff).await;
    assert_eq!(staff_list["data"].as_array().unwrap().len(), 2);

    let client = login(app.clone(), "joao.completo@email.com", "123").await;
    let (_, client_list) = get(app, "/api/projects", &client).await;
    assert_eq!(client_list["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn advance_phase_moves_once_and_stale_requests_noop() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());
    let token = login(app.clone(), "caio@escritorio.com", "caio").await;

    let projects = holding_core::project::list(dir.path()).unwrap();
    let id = projects[0].id.clone();
    assert_eq!(projects[0].current_phase, 2);

    let (status, json) = post_json(
        app.clone(),
        &format!("/api/projects/{id}/advance-phase"),
        &token,
        serde_json::json!({ "from_phase": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["advanced"], true);
    assert_eq!(json["data"]["current_phase"], 3);

    let (status, json) = post_json(
        app,
        &format!("/api/projects/{id}/advance-phase"),
        &token,
        serde_json::json!({ "from_phase": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["advanced"], false);
    assert_eq!(json["data"]["current_phase"], 3);
}

#[tokio::test]
async fn clients_cannot_advance_phases() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());
    let token = login(app.clone(), "joao.completo@email.com", "123").await;

    let id = holding_core::project::list(dir.path()).unwrap()[0].id.clone();
    let (status, _) = post_json(
        app,
        &format!("/api/projects/{id}/advance-phase"),
        &token,
        serde_json::json!({ "from_phase": 2 }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn removing_the_last_client_is_a_conflict() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());
    let token = login(app.clone(), "caio@escritorio.com", "caio").await;

    let project = &holding_core::project::list(dir.path()).unwrap()[0];
    let id = project.id.clone();
    let members = project.client_ids.clone();
    assert_eq!(members.len(), 2);

    let (status, _) = send(
        app.clone(),
        "DELETE",
        &format!("/api/projects/{id}/clients/{}", members[0]),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        app,
        "DELETE",
        &format!("/api/projects/{id}/clients/{}", members[1]),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn phase_actions_drive_the_integralization_cycle() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());
    let staff = login(app.clone(), "caio@escritorio.com", "caio").await;
    let client = login(app.clone(), "joao.completo@email.com", "123").await;

    let id = holding_core::project::list(dir.path()).unwrap()[0].id.clone();
    post_json(
        app.clone(),
        &format!("/api/projects/{id}/advance-phase"),
        &staff,
        serde_json::json!({ "from_phase": 2 }),
    )
    .await;

    // the seed already added one asset; the client submits for review
    let (status, json) = post_json(
        app.clone(),
        &format!("/api/projects/{id}/phases/3/actions"),
        &client,
        serde_json::json!({ "action": "submit_assets" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "submit failed: {json}");
    assert_eq!(json["data"]["data"]["status"], "pending_consultant_review");

    // duplicate submit is rejected, not double-applied
    let (status, _) = post_json(
        app.clone(),
        &format!("/api/projects/{id}/phases/3/actions"),
        &client,
        serde_json::json!({ "action": "submit_assets" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, json) = post_json(
        app,
        &format!("/api/projects/{id}/phases/3/actions"),
        &staff,
        serde_json::json!({ "action": "approve_assets" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["data"]["status"], "approved");
}

#[tokio::test]
async fn itbi_guide_upload_advances_to_pending_payment() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());
    let staff = login(app.clone(), "caio@escritorio.com", "caio").await;

    let id = holding_core::project::list(dir.path()).unwrap()[0].id.clone();
    for from in 2..=4 {
        post_json(
            app.clone(),
            &format!("/api/projects/{id}/advance-phase"),
            &staff,
            serde_json::json!({ "from_phase": from }),
        )
        .await;
    }

    let (_, phase) = get(app.clone(), &format!("/api/projects/{id}/phases/5"), &staff).await;
    let process_id = phase["data"]["data"]["processes"][0]["id"].as_str().unwrap().to_string();

    let (status, json) = post_json(
        app,
        &format!("/api/projects/{id}/phases/5/actions"),
        &staff,
        serde_json::json!({
            "action": "attach_tax_document",
            "process_id": process_id,
            "step": "guide",
            "document_id": "doc-guia",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "attach failed: {json}");
    let relay = &json["data"]["data"]["processes"][0]["relay"];
    assert_eq!(relay["steps"][0]["document_id"], "doc-guia");
    assert!(relay["steps"][1]["document_id"].is_null());
}

#[tokio::test]
async fn internal_chat_is_hidden_from_clients() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());
    let client = login(app.clone(), "joao.completo@email.com", "123").await;

    let id = holding_core::project::list(dir.path()).unwrap()[0].id.clone();
    let (status, _) = get(app.clone(), &format!("/api/projects/{id}/chat/internal"), &client).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = get(app, &format!("/api/projects/{id}/chat/client"), &client).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_chat_thread_is_404_with_plain_message() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);
    let app = holding_server::build_router(dir.path().to_path_buf());
    let staff = login(app.clone(), "caio@escritorio.com", "caio").await;

    let id = holding_core::project::list(dir.path()).unwrap()[0].id.clone();
    let (status, json) = get(app, &format!("/api/projects/{id}/chat/geral"), &staff).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "unknown chat thread: geral");
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn notification_inbox_roundtrip() {
    let dir = TempDir::new().unwrap();
    init_workspace(&dir);

    let joao = holding_core::user::User::find_by_email(dir.path(), "joao.completo@email.com")
        .unwrap()
        .unwrap();
    holding_core::notification::push(
        dir.path(),
        &joao.id,
        holding_core::notification::Notification::new("Fase avançada", "Fase 2 iniciada", None),
    )
    .unwrap();

    let app = holding_server::build_router(dir.path().to_path_buf());
    let token = login(app.clone(), "joao.completo@email.com", "123").await;

    let (status, json) = get(app.clone(), "/api/notifications", &token).await;
    assert_eq!(status, StatusCode::OK);
    let id = json["data"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(json["data"][0]["read"], false);

    let (status, _) = post_json(
        app.clone(),
        &format!("/api/notifications/{id}/read"),
        &token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = get(app, "/api/notifications", &token).await;
    assert_eq!(json["data"][0]["read"], true);
}
