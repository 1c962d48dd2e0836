use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::repository::errors::RepositoryError;

#[derive(Debug, Error)]
pub enum UsecaseError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<RepositoryError> for UsecaseError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => UsecaseError::NotFound("Resource".to_string()),
            RepositoryError::Conflict(constraint) => {
                UsecaseError::Conflict(format!("Already exists ({constraint})"))
            }
            RepositoryError::DatabaseError(msg) => UsecaseError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for UsecaseError {
    fn from(rejection: JsonRejection) -> Self {
        UsecaseError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for UsecaseError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(e) => UsecaseError::Validation(e.body_text()),
            other => UsecaseError::Internal(other.body_text()),
        }
    }
}

impl From<anyhow::Error> for UsecaseError {
    fn from(e: anyhow::Error) -> Self {
        UsecaseError::Internal(e.to_string())
    }
}

impl UsecaseError {
    pub fn status(&self) -> StatusCode {
        match self {
            UsecaseError::NotFound(_) => StatusCode::NOT_FOUND,
            UsecaseError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            UsecaseError::Forbidden(_) => StatusCode::FORBIDDEN,
            UsecaseError::Validation(_) => StatusCode::BAD_REQUEST,
            UsecaseError::Conflict(_) => StatusCode::CONFLICT,
            UsecaseError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UsecaseError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        match &self {
            UsecaseError::Internal(_) => {
                tracing::error!(error = %self, "internal error");
            }
            UsecaseError::NotFound(_) => {
                tracing::warn!(error = %self, "resource not found");
            }
            UsecaseError::Forbidden(_) | UsecaseError::Unauthorized(_) => {
                tracing::warn!(error = %self, "access denied");
            }
            _ => {
                tracing::debug!(error = %self);
            }
        }

        // Store details stay in the logs.
        let error = match &self {
            UsecaseError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
