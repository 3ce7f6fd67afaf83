use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// LogEntry
// ---------------------------------------------------------------------------

/// One line of a project's activity log. Best-effort trail, not an
/// audit-grade record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub actor_id: String,
    pub actor_name: String,
    pub action: String,
    pub at: DateTime<Utc>,
}

/// Prepend an entry: the log reads most-recent-first.
pub fn record(
    log: &mut Vec<LogEntry>,
    actor_id: impl Into<String>,
    actor_name: impl Into<String>,
    action: impl Into<String>,
) {
    log.insert(
        0,
        LogEntry {
            actor_id: actor_id.into(),
            actor_name: actor_name.into(),
            action: action.into(),
            at: Utc::now(),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_prepends_most_recent_first() {
        let mut log = Vec::new();
        record(&mut log, "u1", "Ana", "criou o projeto");
        record(&mut log, "u2", "Caio", "avançou para a fase 2");
        assert_eq!(log[0].action, "avançou para a fase 2");
        assert_eq!(log[1].action, "criou o projeto");
    }
}
