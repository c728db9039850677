use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Clients match on these, never on the message.

pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// The error shape every module hands to the HTTP boundary.
///
/// Modules scrub the message before building a variant; whatever is inside
/// is sent to the client verbatim:
///
/// ```json
/// {"code": "UNAUTHENTICATED", "message": "not authorized"}
/// ```
#[derive(Error, Debug)]
pub enum ServiceError {
    /// HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate account, or a one-shot transition that already happened. HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// Malformed or inconsistent input. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or stale credentials. HTTP 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Anything the client cannot fix. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    fn classify(&self) -> (StatusCode, &'static str) {
        use error_code::*;
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, NOT_FOUND),
            Self::Conflict(_) => (StatusCode::CONFLICT, ALREADY_EXISTS),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, VALIDATION_FAILED),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, UNAUTHENTICATED),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL),
        }
    }

    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        self.classify().1
    }

    pub fn status_code(&self) -> StatusCode {
        self.classify().0
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = self.classify();
        let body = serde_json::json!({
            "code": code,
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
