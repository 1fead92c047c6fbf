use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use projtree_store::StoreError;
use projtree_types::StorageId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// JSON body returned with every error status.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub already_deleted: Vec<StorageId>,
}

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The blocking worker running the repository call panicked or was
    /// cancelled.
    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(e) => match e {
                StoreError::Unauthenticated => StatusCode::UNAUTHORIZED,
                StoreError::Forbidden { .. } => StatusCode::FORBIDDEN,
                StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                StoreError::DuplicateName { .. } => StatusCode::CONFLICT,
                StoreError::TransactionConflict => StatusCode::SERVICE_UNAVAILABLE,
                StoreError::InvalidName(_)
                | StoreError::InvalidParent(_)
                | StoreError::InvalidStorage(_)
                | StoreError::NotAFile(_) => StatusCode::BAD_REQUEST,
                StoreError::BlobDeleteFailed { .. } => StatusCode::BAD_GATEWAY,
                StoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }
        let (code, already_deleted) = match &self {
            Self::Store(StoreError::BlobDeleteFailed { already_deleted, .. }) => {
                ("blob_delete_failed", already_deleted.clone())
            }
            Self::Store(e) => (e.code(), Vec::new()),
            Self::Task(_) => ("internal", Vec::new()),
        };
        let body = ErrorBody {
            error: code.to_string(),
            message: self.to_string(),
            already_deleted,
        };
        (status, Json(body)).into_response()
    }
}
