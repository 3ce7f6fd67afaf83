use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("password change required for {email}")]
    PasswordChangeRequired { email: String },

    #[error("not logged in")]
    NotLoggedIn,

    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the server answered 403 for this call.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, ClientError::Api { status: 403, .. })
    }
}
