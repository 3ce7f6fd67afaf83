use axum::Json;
use holding_core::action::ActionContext;
use holding_core::types::ClientType;
use holding_core::user::User;
use holding_core::Result;
use std::path::Path;

pub mod assistant;
pub mod documents;
pub mod notifications;
pub mod phases;
pub mod projects;
pub mod users;

/// Every endpoint answers `{ success, data }`.
pub fn ok(data: serde_json::Value) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": data }))
}

/// Public view of a user record. Password material never leaves the server.
pub fn user_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "client_type": user.client_type,
        "qualification": user.qualification,
        "documents": user.documents,
        "requires_password_change": user.requires_password_change,
        "data_complete": user.is_data_complete(),
        "created_at": user.created_at,
        "updated_at": user.updated_at,
    })
}

/// Resolve the partner quorum facts for a project's members.
pub fn member_context(root: &Path, client_ids: &[String]) -> Result<ActionContext> {
    let mut partner_ids = Vec::new();
    let mut partners_data_complete = true;
    for id in client_ids {
        let user = User::load(root, id)?;
        if user.client_type == Some(ClientType::Partner) {
            if !user.is_data_complete() {
                partners_data_complete = false;
            }
            partner_ids.push(user.id);
        }
    }
    Ok(ActionContext {
        partner_ids,
        partners_data_complete,
    })
}
