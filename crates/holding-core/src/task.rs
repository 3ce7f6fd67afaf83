use crate::error::{HoldingError, Result};
use crate::types::{Role, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A delegated to-do scoped to one phase. The assignee completes it; any
/// staff member approves the completion. Tasks are never auto-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub description: String,
    pub assignee_id: String,
    pub created_by: String,
    pub status: TaskStatus,
    /// Document produced to satisfy this task, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Task list operations (operate on a mutable Vec<Task>)
// ---------------------------------------------------------------------------

pub fn add_task(
    tasks: &mut Vec<Task>,
    seq: &mut u32,
    description: impl Into<String>,
    assignee_id: impl Into<String>,
    created_by: impl Into<String>,
) -> String {
    *seq += 1;
    let id = format!("T{}", *seq);
    tasks.push(Task {
        id: id.clone(),
        description: description.into(),
        assignee_id: assignee_id.into(),
        created_by: created_by.into(),
        status: TaskStatus::Pending,
        document_id: None,
        created_at: Utc::now(),
        completed_at: None,
        approved_at: None,
    });
    id
}

/// Pending → completed, by the assignee only.
pub fn complete_task(tasks: &mut [Task], id: &str, actor_id: &str) -> Result<()> {
    let task = find_mut(tasks, id)?;
    if task.assignee_id != actor_id {
        return Err(HoldingError::Forbidden(
            "only the assignee can complete a task".to_string(),
        ));
    }
    if task.status != TaskStatus::Pending {
        return Err(HoldingError::InvalidTransition {
            from: task.status.to_string(),
            to: TaskStatus::Completed.to_string(),
            reason: "task is not pending".to_string(),
        });
    }
    task.status = TaskStatus::Completed;
    task.completed_at = Some(Utc::now());
    Ok(())
}

/// Completed → approved, by any staff member.
pub fn approve_task(tasks: &mut [Task], id: &str, actor_role: Role) -> Result<()> {
    if !actor_role.is_staff() {
        return Err(HoldingError::Forbidden(
            "only staff can approve a task".to_string(),
        ));
    }
    let task = find_mut(tasks, id)?;
    if task.status != TaskStatus::Completed {
        return Err(HoldingError::InvalidTransition {
            from: task.status.to_string(),
            to: TaskStatus::Approved.to_string(),
            reason: "task is not completed".to_string(),
        });
    }
    task.status = TaskStatus::Approved;
    task.approved_at = Some(Utc::now());
    Ok(())
}

/// Attach the document produced to satisfy a task.
pub fn link_document(tasks: &mut [Task], id: &str, document_id: impl Into<String>) -> Result<()> {
    let task = find_mut(tasks, id)?;
    task.document_id = Some(document_id.into());
    Ok(())
}

fn find_mut<'a>(tasks: &'a mut [Task], id: &str) -> Result<&'a mut Task> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| HoldingError::TaskNotFound(id.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_lifecycle() {
        let mut tasks = Vec::new();
        let mut seq = 0;
        let id = add_task(&mut tasks, &mut seq, "Enviar certidão", "aux-1", "cons-1");
        assert_eq!(tasks[0].status, TaskStatus::Pending);

        complete_task(&mut tasks, &id, "aux-1").unwrap();
        assert_eq!(tasks[0].status, TaskStatus::Completed);
        assert!(tasks[0].completed_at.is_some());

        approve_task(&mut tasks, &id, Role::Consultant).unwrap();
        assert_eq!(tasks[0].status, TaskStatus::Approved);
    }

    #[test]
    fn only_assignee_completes() {
        let mut tasks = Vec::new();
        let mut seq = 0;
        let id = add_task(&mut tasks, &mut seq, "Enviar certidão", "aux-1", "cons-1");
        assert!(complete_task(&mut tasks, &id, "someone-else").is_err());
        assert_eq!(tasks[0].status, TaskStatus::Pending);
    }

    #[test]
    fn client_cannot_approve() {
        let mut tasks = Vec::new();
        let mut seq = 0;
        let id = add_task(&mut tasks, &mut seq, "Enviar certidão", "aux-1", "cons-1");
        complete_task(&mut tasks, &id, "aux-1").unwrap();
        assert!(approve_task(&mut tasks, &id, Role::Client).is_err());
    }

    #[test]
    fn approve_requires_completed() {
        let mut tasks = Vec::new();
        let mut seq = 0;
        let id = add_task(&mut tasks, &mut seq, "Enviar certidão", "aux-1", "cons-1");
        assert!(approve_task(&mut tasks, &id, Role::Administrator).is_err());
    }

    #[test]
    fn task_not_found() {
        let mut tasks: Vec<Task> = Vec::new();
        assert!(complete_task(&mut tasks, "T9", "u1").is_err());
    }
}
