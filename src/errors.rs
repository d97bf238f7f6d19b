use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::records::repo::StoreError;
use crate::records::repo_types::{IdError, RecordTypeError};

/// Failure of an RPC. Nothing is returned to the caller except this error.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument(_) => "invalid_argument",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::PermissionDenied(_) => "permission_denied",
            ServiceError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<IdError> for ServiceError {
    fn from(e: IdError) -> Self {
        ServiceError::InvalidArgument(e.to_string())
    }
}

impl From<RecordTypeError> for ServiceError {
    fn from(e: RecordTypeError) -> Self {
        ServiceError::InvalidArgument(e.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => ServiceError::NotFound(e.to_string()),
            StoreError::OwnerMismatch { .. } => ServiceError::PermissionDenied(e.to_string()),
            StoreError::Backend(inner) => ServiceError::Internal(inner),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ServiceError::Internal(inner) => {
                error!(error = ?inner, "rpc failed");
                "internal error".to_string()
            }
            other => {
                warn!(code = other.code(), error = %other, "rpc rejected");
                other.to_string()
            }
        };
        (
            status,
            Json(ErrorBody {
                code: self.code(),
                message,
            }),
        )
            .into_response()
    }
}
