//! Server error taxonomy.
//!
//! Every failure a handler can surface maps onto one variant; the
//! `IntoResponse` impl renders an OperationOutcome body with the matching
//! status code. Validation findings for inbound submissions travel as data
//! (`kurier_bundle::validate`), not through this type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("record {id} not found")]
    RecordNotFound { id: Uuid },

    #[error("communication {id} not found")]
    CommunicationNotFound { id: Uuid },

    #[error("practitioner {id} not found")]
    ActorNotFound { id: Uuid },

    #[error("no practitioner registered for {email}")]
    RecipientNotFound { email: String },

    #[error("illegal status transition: {0}")]
    InvalidTransition(String),

    #[error("registry dispatch failed: {0}")]
    Transport(String),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("missing or invalid practitioner identity")]
    Unauthenticated,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRecord(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::RecordNotFound { .. }
            | Error::CommunicationNotFound { .. }
            | Error::ActorNotFound { .. }
            | Error::RecipientNotFound { .. } => StatusCode::NOT_FOUND,
            Error::InvalidTransition(_) => StatusCode::CONFLICT,
            Error::Transport(_) => StatusCode::BAD_GATEWAY,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Database(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// OperationOutcome issue code for the variant.
    fn outcome_code(&self) -> &'static str {
        match self {
            Error::InvalidRecord(_) | Error::Validation(_) => "invalid",
            Error::RecordNotFound { .. }
            | Error::CommunicationNotFound { .. }
            | Error::ActorNotFound { .. }
            | Error::RecipientNotFound { .. } => "not-found",
            Error::InvalidTransition(_) => "conflict",
            Error::Transport(_) => "transient",
            Error::Unauthenticated => "security",
            Error::Database(_) | Error::Internal(_) => "exception",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Full detail goes to the log; 5xx bodies stay generic so storage
        // internals never reach a client.
        let diagnostics = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "resourceType": "OperationOutcome",
            "issue": [{
                "severity": "error",
                "code": self.outcome_code(),
                "diagnostics": diagnostics,
            }]
        });
        (status, Json(body)).into_response()
    }
}

impl From<kurier_bundle::AssembleError> for Error {
    fn from(err: kurier_bundle::AssembleError) -> Self {
        Error::InvalidRecord(err.to_string())
    }
}

impl From<kurier_bundle::ExtractError> for Error {
    fn from(err: kurier_bundle::ExtractError) -> Self {
        Error::InvalidRecord(err.to_string())
    }
}
