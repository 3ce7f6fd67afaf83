use thiserror::Error;

#[derive(Debug, Error)]
pub enum HoldingError {
    #[error("workspace not initialized: run 'holding init'")]
    NotInitialized,

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("user '{user}' is still a member of project '{project}'")]
    UserReferenced { user: String, project: String },

    #[error("invalid email: {0}")]
    InvalidEmail(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid phase number: {0}")]
    InvalidPhase(u8),

    #[error("phase {requested} is not the current phase ({current})")]
    NotCurrentPhase { requested: u8, current: u8 },

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("operation not allowed: {0}")]
    Forbidden(String),

    #[error("a project must keep at least one client member")]
    LastMember,

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("process not found: {0}")]
    ProcessNotFound(String),

    #[error("ticket not found: {0}")]
    TicketNotFound(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HoldingError>;
