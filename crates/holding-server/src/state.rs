use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state passed to all route handlers. Sessions are
/// in-memory only; a restart logs everyone out.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub sessions: Arc<RwLock<HashMap<String, String>>>,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn open_session(&self, token: String, user_id: String) {
        self.sessions.write().await.insert(token, user_id);
    }

    pub async fn close_session(&self, token: &str) {
        self.sessions.write().await.remove(token);
    }

    pub async fn session_user(&self, token: &str) -> Option<String> {
        self.sessions.read().await.get(token).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_round_trip() {
        let state = AppState::new(PathBuf::from("/tmp/test"));
        state.open_session("tok".to_string(), "u1".to_string()).await;
        assert_eq!(state.session_user("tok").await.as_deref(), Some("u1"));

        state.close_session("tok").await;
        assert!(state.session_user("tok").await.is_none());
    }
}
