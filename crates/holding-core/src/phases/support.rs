use crate::chat::{self, ChatMessage};
use crate::error::{HoldingError, Result};
use crate::types::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// SupportData (phase 10)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    Medium,
    High,
}

impl Default for TicketPriority {
    fn default() -> Self {
        TicketPriority::Medium
    }
}

/// A freeform support request raised by a client after the engagement closes.
/// Staff manage status and priority; both sides reply in-thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub subject: String,
    pub body: String,
    pub opened_by: String,
    pub status: TicketStatus,
    #[serde(default)]
    pub priority: TicketPriority,
    #[serde(default)]
    pub replies: Vec<ChatMessage>,
    #[serde(default)]
    pub reply_seq: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupportData {
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub ticket_seq: u32,
}

impl SupportData {
    pub fn open_ticket(
        &mut self,
        subject: impl Into<String>,
        body: impl Into<String>,
        opened_by: impl Into<String>,
        priority: Option<TicketPriority>,
    ) -> String {
        self.ticket_seq += 1;
        let id = format!("S{}", self.ticket_seq);
        let now = Utc::now();
        self.tickets.push(Ticket {
            id: id.clone(),
            subject: subject.into(),
            body: body.into(),
            opened_by: opened_by.into(),
            status: TicketStatus::Open,
            priority: priority.unwrap_or_default(),
            replies: Vec::new(),
            reply_seq: 0,
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn set_status(&mut self, ticket_id: &str, status: TicketStatus, actor_role: Role) -> Result<()> {
        if !actor_role.is_staff() {
            return Err(HoldingError::Forbidden(
                "only staff can change a ticket's status".to_string(),
            ));
        }
        let ticket = self.ticket_mut(ticket_id)?;
        ticket.status = status;
        ticket.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_priority(
        &mut self,
        ticket_id: &str,
        priority: TicketPriority,
        actor_role: Role,
    ) -> Result<()> {
        if !actor_role.is_staff() {
            return Err(HoldingError::Forbidden(
                "only staff can change a ticket's priority".to_string(),
            ));
        }
        let ticket = self.ticket_mut(ticket_id)?;
        ticket.priority = priority;
        ticket.updated_at = Utc::now();
        Ok(())
    }

    pub fn reply(
        &mut self,
        ticket_id: &str,
        author_id: impl Into<String>,
        author_name: impl Into<String>,
        author_role: Role,
        body: impl Into<String>,
    ) -> Result<String> {
        let ticket = self.ticket_mut(ticket_id)?;
        let id = chat::push_message(
            &mut ticket.replies,
            &mut ticket.reply_seq,
            author_id,
            author_name,
            author_role,
            body,
        );
        ticket.updated_at = Utc::now();
        Ok(id)
    }

    fn ticket_mut(&mut self, id: &str) -> Result<&mut Ticket> {
        self.tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| HoldingError::TicketNotFound(id.to_string()))
    }
}
