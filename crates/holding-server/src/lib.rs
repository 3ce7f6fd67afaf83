pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::Router;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(root: PathBuf) -> Router {
    let app_state = state::AppState::new(root);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        // Auth
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Users
        .route("/api/users", get(routes::users::list_users))
        .route("/api/users", post(routes::users::create_user))
        .route("/api/users/{id}", get(routes::users::get_user))
        .route("/api/users/{id}", put(routes::users::update_user))
        .route("/api/users/{id}", delete(routes::users::delete_user))
        .route(
            "/api/users/{id}/reset-password",
            post(routes::users::reset_password),
        )
        .route(
            "/api/users/{id}/documents",
            post(routes::documents::upload_user_document),
        )
        .route(
            "/api/users/{id}/documents/{doc_id}/download",
            get(routes::documents::download_user_document),
        )
        // Projects
        .route("/api/projects", get(routes::projects::list_projects))
        .route("/api/projects", post(routes::projects::create_project))
        .route("/api/projects/{id}", get(routes::projects::get_project))
        .route("/api/projects/{id}", put(routes::projects::update_project))
        .route("/api/projects/{id}", delete(routes::projects::delete_project))
        .route(
            "/api/projects/{id}/members",
            get(routes::projects::list_members),
        )
        .route(
            "/api/projects/{id}/advance-phase",
            post(routes::projects::advance_phase),
        )
        .route(
            "/api/projects/{id}/post-completion",
            post(routes::projects::choose_post_completion),
        )
        .route(
            "/api/projects/{id}/clients",
            post(routes::projects::add_client),
        )
        .route(
            "/api/projects/{id}/clients/{user_id}",
            delete(routes::projects::remove_client),
        )
        .route(
            "/api/projects/{id}/chat/{thread}",
            get(routes::projects::get_chat),
        )
        .route(
            "/api/projects/{id}/chat/{thread}",
            post(routes::projects::post_chat),
        )
        .route(
            "/api/projects/{id}/activity",
            get(routes::projects::get_activity),
        )
        .route(
            "/api/projects/{id}/activity",
            post(routes::projects::post_activity),
        )
        // Phases
        .route(
            "/api/projects/{id}/phases/{number}",
            get(routes::phases::get_phase),
        )
        .route(
            "/api/projects/{id}/phases/{number}/actions",
            post(routes::phases::apply_action),
        )
        // Documents
        .route(
            "/api/projects/{id}/phases/{number}/documents",
            post(routes::documents::upload_phase_document),
        )
        .route(
            "/api/projects/{id}/phases/{number}/documents/{doc_id}/download",
            get(routes::documents::download_phase_document),
        )
        // Notifications
        .route(
            "/api/notifications",
            get(routes::notifications::list_notifications),
        )
        .route(
            "/api/notifications/{id}/read",
            post(routes::notifications::mark_read),
        )
        .route(
            "/api/notifications/read-all",
            post(routes::notifications::mark_all_read),
        )
        // Assistant
        .route("/api/assistant/chat", post(routes::assistant::chat))
        .route(
            "/api/assistant/analyze-document",
            post(routes::assistant::analyze_document),
        )
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/change-password", post(auth::change_password))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the API server.
pub async fn serve(root: PathBuf, port: u16) -> anyhow::Result<()> {
    let app = build_router(root);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("holding API server listening on http://localhost:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Start the API server on a pre-bound listener, so the caller can read the
/// actual port first (useful when `port = 0`).
pub async fn serve_on(root: PathBuf, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(root);

    tracing::info!("holding API server listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
