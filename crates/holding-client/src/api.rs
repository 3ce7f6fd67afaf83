use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::Result;
use holding_core::chat::ChatMessage;
use holding_core::notification::Notification;
use holding_core::phase::Phase;
use holding_core::types::{ClientType, PostCompletionPath, PostCompletionStatus, ProjectStatus, Role};

// ---------------------------------------------------------------------------
// Wire views
// ---------------------------------------------------------------------------

/// Every endpoint answers `{ success, data }`; failures carry `error`.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub client_type: Option<ClientType>,
    #[serde(default)]
    pub requires_password_change: bool,
    #[serde(default)]
    pub data_complete: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub current_phase: u8,
    pub consultant_id: String,
    pub client_ids: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectView {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub current_phase: u8,
    pub consultant_id: String,
    #[serde(default)]
    pub auxiliary_id: Option<String>,
    pub client_ids: Vec<String>,
    pub phases: Vec<Phase>,
    pub post_completion: PostCompletionStatus,
    #[serde(default)]
    pub post_completion_path: Option<PostCompletionPath>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_type: Option<ClientType>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewProject {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary_id: Option<String>,
    pub main_client: NewClient,
    #[serde(default)]
    pub additional_clients: Vec<NewClient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionedCredentials {
    pub email: String,
    pub provisional_password: String,
}

#[derive(Debug, Deserialize)]
pub struct CreatedProject {
    pub project: ProjectView,
    pub credentials: Vec<ProvisionedCredentials>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AdvanceOutcome {
    pub advanced: bool,
    pub current_phase: u8,
}

/// What a login attempt resolved to. The password-change signal is a normal
/// outcome, not an error: the caller reroutes to the change-password flow.
#[derive(Debug)]
pub enum LoginOutcome {
    LoggedIn(UserView),
    PasswordChangeRequired { email: String },
}

// ---------------------------------------------------------------------------
// ApiClient
// ---------------------------------------------------------------------------

/// Blocking HTTP client for the holding API. Holds the bearer token after a
/// successful login and attaches it to every subsequent call.
pub struct ApiClient {
    base_url: String,
    http: reqwest::blocking::Client,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
            token: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Resume a stored session instead of logging in again.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::blocking::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    fn unwrap<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T> {
        let status = response.status();
        let envelope: Envelope = response.json()?;
        if !status.is_success() || !envelope.success {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: envelope.error.unwrap_or_else(|| "request failed".to_string()),
            });
        }
        Ok(serde_json::from_value(envelope.data)?)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Self::unwrap(self.request(reqwest::Method::GET, path).send()?)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        Self::unwrap(self.request(reqwest::Method::POST, path).json(body).send()?)
    }

    fn put<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> Result<T> {
        Self::unwrap(self.request(reqwest::Method::PUT, path).json(body).send()?)
    }

    fn delete(&self, path: &str) -> Result<()> {
        let _: serde_json::Value = Self::unwrap(self.request(reqwest::Method::DELETE, path).send()?)?;
        Ok(())
    }

    // -- auth ---------------------------------------------------------------

    pub fn login(&mut self, email: &str, password: &str) -> Result<LoginOutcome> {
        let data: serde_json::Value = self.post(
            "/api/auth/login",
            &serde_json::json!({ "email": email, "password": password }),
        )?;
        if data["code"] == "PASSWORD_CHANGE_REQUIRED" {
            return Ok(LoginOutcome::PasswordChangeRequired {
                email: email.to_string(),
            });
        }
        let token = data["token"]
            .as_str()
            .ok_or(ClientError::NotLoggedIn)?
            .to_string();
        let user: UserView = serde_json::from_value(data["user"].clone())?;
        self.token = Some(token);
        Ok(LoginOutcome::LoggedIn(user))
    }

    /// Completes the forced first-login flow; the returned session is live.
    pub fn change_password(
        &mut self,
        email: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<UserView> {
        let data: serde_json::Value = self.post(
            "/api/auth/change-password",
            &serde_json::json!({
                "email": email,
                "current_password": current_password,
                "new_password": new_password,
            }),
        )?;
        let token = data["token"]
            .as_str()
            .ok_or(ClientError::NotLoggedIn)?
            .to_string();
        let user: UserView = serde_json::from_value(data["user"].clone())?;
        self.token = Some(token);
        Ok(user)
    }

    pub fn logout(&mut self) -> Result<()> {
        let _: serde_json::Value = self.post("/api/auth/logout", &serde_json::json!({}))?;
        self.token = None;
        Ok(())
    }

    pub fn me(&self) -> Result<UserView> {
        self.get("/api/auth/me")
    }

    // -- users --------------------------------------------------------------

    pub fn list_users(&self) -> Result<Vec<UserView>> {
        self.get("/api/users")
    }

    pub fn get_user(&self, id: &str) -> Result<UserView> {
        self.get(&format!("/api/users/{id}"))
    }

    pub fn delete_user(&self, id: &str) -> Result<()> {
        self.delete(&format!("/api/users/{id}"))
    }

    pub fn reset_password(&self, id: &str) -> Result<String> {
        let data: serde_json::Value = self.post(
            &format!("/api/users/{id}/reset-password"),
            &serde_json::json!({}),
        )?;
        Ok(data["provisional_password"].as_str().unwrap_or_default().to_string())
    }

    // -- projects -----------------------------------------------------------

    pub fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        self.get("/api/projects")
    }

    pub fn get_project(&self, id: &str) -> Result<ProjectView> {
        self.get(&format!("/api/projects/{id}"))
    }

    pub fn create_project(&self, body: &NewProject) -> Result<CreatedProject> {
        self.post("/api/projects", &serde_json::to_value(body)?)
    }

    pub fn update_project(&self, id: &str, patch: &serde_json::Value) -> Result<ProjectView> {
        self.put(&format!("/api/projects/{id}"), patch)
    }

    pub fn delete_project(&self, id: &str) -> Result<()> {
        self.delete(&format!("/api/projects/{id}"))
    }

    pub fn list_members(&self, id: &str) -> Result<Vec<UserView>> {
        self.get(&format!("/api/projects/{id}/members"))
    }

    pub fn advance_phase(&self, id: &str, from_phase: u8) -> Result<AdvanceOutcome> {
        self.post(
            &format!("/api/projects/{id}/advance-phase"),
            &serde_json::json!({ "from_phase": from_phase }),
        )
    }

    pub fn choose_post_completion(&self, id: &str, path: PostCompletionPath) -> Result<ProjectView> {
        self.post(
            &format!("/api/projects/{id}/post-completion"),
            &serde_json::json!({ "path": path }),
        )
    }

    pub fn add_client(&self, id: &str, user_id: &str) -> Result<ProjectView> {
        self.post(
            &format!("/api/projects/{id}/clients"),
            &serde_json::json!({ "user_id": user_id }),
        )
    }

    pub fn remove_client(&self, id: &str, user_id: &str) -> Result<ProjectView> {
        let response = self
            .request(
                reqwest::Method::DELETE,
                &format!("/api/projects/{id}/clients/{user_id}"),
            )
            .send()?;
        Self::unwrap(response)
    }

    // -- phases -------------------------------------------------------------

    pub fn get_phase(&self, id: &str, number: u8) -> Result<serde_json::Value> {
        self.get(&format!("/api/projects/{id}/phases/{number}"))
    }

    /// Submit one tagged phase action, e.g. `{"action": "submit_assets"}`.
    pub fn phase_action(
        &self,
        id: &str,
        number: u8,
        action: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        self.post(&format!("/api/projects/{id}/phases/{number}/actions"), action)
    }

    // -- chat, activity, notifications --------------------------------------

    pub fn get_chat(&self, id: &str, thread: &str) -> Result<Vec<ChatMessage>> {
        self.get(&format!("/api/projects/{id}/chat/{thread}"))
    }

    pub fn post_chat(&self, id: &str, thread: &str, body: &str) -> Result<()> {
        let _: serde_json::Value = self.post(
            &format!("/api/projects/{id}/chat/{thread}"),
            &serde_json::json!({ "body": body }),
        )?;
        Ok(())
    }

    pub fn notifications(&self) -> Result<Vec<Notification>> {
        self.get("/api/notifications")
    }

    pub fn mark_notification_read(&self, id: &str) -> Result<()> {
        let _: serde_json::Value =
            self.post(&format!("/api/notifications/{id}/read"), &serde_json::json!({}))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_stores_the_token() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success":true,"data":{"token":"tok-1","user":{
                    "id":"u1","name":"Ana","email":"ana@email.com","role":"client",
                    "client_type":"partner","requires_password_change":false,"data_complete":true}}}"#,
            )
            .create();

        let mut api = ApiClient::new(server.url());
        let outcome = api.login("ana@email.com", "123").unwrap();
        assert!(matches!(outcome, LoginOutcome::LoggedIn(ref u) if u.name == "Ana"));
        assert_eq!(api.token(), Some("tok-1"));
    }

    #[test]
    fn login_surfaces_the_password_change_signal() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/api/auth/login")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success":true,"data":{"code":"PASSWORD_CHANGE_REQUIRED",
                    "user":{"id":"u1","name":"Ana","email":"ana@email.com"}}}"#,
            )
            .create();

        let mut api = ApiClient::new(server.url());
        let outcome = api.login("ana@email.com", "provisional").unwrap();
        assert!(matches!(outcome, LoginOutcome::PasswordChangeRequired { .. }));
        assert!(api.token().is_none());
    }

    #[test]
    fn api_errors_carry_status_and_message() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/users")
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":false,"error":"only staff can list users"}"#)
            .create();

        let api = ApiClient::new(server.url()).with_token("tok");
        let err = api.list_users().unwrap_err();
        assert!(err.is_forbidden());
        assert!(err.to_string().contains("only staff"));
    }

    #[test]
    fn list_projects_decodes_summaries() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/api/projects")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"success":true,"data":[{
                    "id":"p1","name":"Holding Família","status":"in_progress",
                    "current_phase":2,"consultant_id":"c1","client_ids":["u1"],
                    "updated_at":"2026-05-01T12:00:00Z"}]}"#,
            )
            .create();

        let api = ApiClient::new(server.url()).with_token("tok");
        let projects = api.list_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].current_phase, 2);
        assert_eq!(projects[0].status, ProjectStatus::InProgress);
    }
}
