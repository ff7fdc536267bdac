use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use spindle_core::{AssignmentError, PreviewError, StoreError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "message": self.message,
                "status": self.status.as_u16(),
            }
        }));

        (self.status, body).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(kind, id) => Self::not_found(format!("{kind} not found: {id}")),
            StoreError::InvalidTransition(e) => Self::bad_request(e.to_string()),
            StoreError::Conflict(msg) => Self::conflict(msg),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<PreviewError> for AppError {
    fn from(err: PreviewError) -> Self {
        match err {
            PreviewError::NoTitles => Self::bad_request(err.to_string()),
            PreviewError::Store(e) => e.into(),
            PreviewError::Metadata(msg) => Self::internal(format!("metadata lookup failed: {msg}")),
        }
    }
}

impl From<AssignmentError> for AppError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::NoEligibleWorker => Self::conflict(err.to_string()),
            AssignmentError::NotAwaitingApproval(_) | AssignmentError::AlreadyTerminal(_) => {
                Self::bad_request(err.to_string())
            }
            AssignmentError::Store(e) => e.into(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(err.to_string())
    }
}

impl From<spindle_model::ModelError> for AppError {
    fn from(err: spindle_model::ModelError) -> Self {
        Self::bad_request(err.to_string())
    }
}
