use crate::error::Result;
use crate::{io, paths};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A per-user inbox entry. Producers push; the owner lists and marks read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        project_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            body: body.into(),
            project_id,
            read: false,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-user store (one YAML file per user, newest first)
// ---------------------------------------------------------------------------

pub fn list(root: &Path, user_id: &str) -> Result<Vec<Notification>> {
    let path = paths::notifications_path(root, user_id);
    if !path.exists() {
        return Ok(Vec::new());
    }
    io::load_yaml(&path)
}

pub fn push(root: &Path, user_id: &str, notification: Notification) -> Result<()> {
    let mut all = list(root, user_id)?;
    all.insert(0, notification);
    save(root, user_id, &all)
}

/// Mark a single notification read. Unknown IDs are ignored so that a stale
/// client cannot fail the whole request.
pub fn mark_read(root: &Path, user_id: &str, notification_id: &str) -> Result<()> {
    let mut all = list(root, user_id)?;
    for n in all.iter_mut() {
        if n.id == notification_id {
            n.read = true;
        }
    }
    save(root, user_id, &all)
}

pub fn mark_all_read(root: &Path, user_id: &str) -> Result<()> {
    let mut all = list(root, user_id)?;
    for n in all.iter_mut() {
        n.read = true;
    }
    save(root, user_id, &all)
}

fn save(root: &Path, user_id: &str, notifications: &[Notification]) -> Result<()> {
    io::save_yaml(&paths::notifications_path(root, user_id), &notifications)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
