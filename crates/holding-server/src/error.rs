use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use holding_core::HoldingError;

// ---------------------------------------------------------------------------
// Sentinels for explicit status codes
// ---------------------------------------------------------------------------

/// Carry an explicit HTTP status through the `anyhow::Error` chain without
/// touching the `HoldingError` enum. Used where a handler rejects a request
/// for reasons no domain variant describes (missing token, malformed
/// multipart body, unknown sub-resource).
macro_rules! sentinel {
    ($name:ident) => {
        #[derive(Debug)]
        struct $name(String);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::error::Error for $name {}
    };
}

sentinel!(UnauthorizedError);
sentinel!(BadRequestError);
sentinel!(NotFoundError);

// ---------------------------------------------------------------------------
// AppError — unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(BadRequestError(msg.into()).into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self(HoldingError::Forbidden(msg.into()).into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(NotFoundError(msg.into()).into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self(UnauthorizedError(msg.into()).into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let sentinel_status = if self.0.downcast_ref::<UnauthorizedError>().is_some() {
            Some(StatusCode::UNAUTHORIZED)
        } else if self.0.downcast_ref::<BadRequestError>().is_some() {
            Some(StatusCode::BAD_REQUEST)
        } else if self.0.downcast_ref::<NotFoundError>().is_some() {
            Some(StatusCode::NOT_FOUND)
        } else {
            None
        };
        if let Some(status) = sentinel_status {
            let body = serde_json::json!({ "success": false, "error": self.0.to_string() });
            return (status, axum::Json(body)).into_response();
        }

        let status = if let Some(e) = self.0.downcast_ref::<HoldingError>() {
            match e {
                HoldingError::NotInitialized => StatusCode::BAD_REQUEST,
                HoldingError::ProjectNotFound(_)
                | HoldingError::UserNotFound(_)
                | HoldingError::TaskNotFound(_)
                | HoldingError::DocumentNotFound(_)
                | HoldingError::AssetNotFound(_)
                | HoldingError::ProcessNotFound(_)
                | HoldingError::TicketNotFound(_) => StatusCode::NOT_FOUND,
                HoldingError::UserExists(_)
                | HoldingError::UserReferenced { .. }
                | HoldingError::LastMember => StatusCode::CONFLICT,
                HoldingError::InvalidEmail(_)
                | HoldingError::InvalidRole(_)
                | HoldingError::InvalidPhase(_) => StatusCode::BAD_REQUEST,
                HoldingError::NotCurrentPhase { .. } | HoldingError::InvalidTransition { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                HoldingError::Forbidden(_) => StatusCode::FORBIDDEN,
                HoldingError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                HoldingError::Io(_) | HoldingError::Yaml(_) | HoldingError::Json(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = serde_json::json!({ "success": false, "error": self.0.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
