use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::documents::DocumentError;
use crate::editor::{EditorError, PendingTransition};
use crate::session::SessionError;

/// PortalError
///
/// HTTP-facing error. Every variant resolves to an inline message for the
/// browser; none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] EditorError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Confirmation required")]
    ConfirmationRequired(PendingTransition),

    #[error("Backend error: {0}")]
    Backend(#[from] DocumentError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

impl IntoResponse for PortalError {
    fn into_response(self) -> Response {
        let (status, code, message, detail) = match &self {
            PortalError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            PortalError::Validation(e) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string(), None)
            }
            PortalError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
                None,
            ),
            PortalError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
                None,
            ),
            PortalError::ConfirmationRequired(pending) => (
                StatusCode::CONFLICT,
                "CONFIRMATION_REQUIRED",
                pending.prompt.clone(),
                serde_json::to_value(pending).ok(),
            ),
            PortalError::Backend(DocumentError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Document {id} not found"),
                None,
            ),
            PortalError::Backend(e) => {
                tracing::error!("Backend error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_ERROR",
                    "The document service could not be reached".to_string(),
                    None,
                )
            }
            PortalError::Session(e) => {
                tracing::error!("Session error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SESSION_ERROR",
                    "The session could not be updated".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message,
        });
        if let Some(detail) = detail {
            error["detail"] = detail;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
