use crate::types::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ChatMessage
// ---------------------------------------------------------------------------

/// One message in an append-only thread. Used for the project-level client
/// and internal threads, for phase-level discussion threads, and for support
/// ticket replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_role: Role,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Append a message and return its auto-generated ID.
///
/// `seq` is a monotonic counter stored on the owning record, so IDs stay
/// unique regardless of how the list is later filtered or truncated.
pub fn push_message(
    messages: &mut Vec<ChatMessage>,
    seq: &mut u32,
    author_id: impl Into<String>,
    author_name: impl Into<String>,
    author_role: Role,
    body: impl Into<String>,
) -> String {
    *seq += 1;
    let id = format!("M{}", *seq);
    messages.push(ChatMessage {
        id: id.clone(),
        author_id: author_id.into(),
        author_name: author_name.into(),
        author_role,
        body: body.into(),
        sent_at: Utc::now(),
    });
    id
}
