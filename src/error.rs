use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::naming::NamingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No images uploaded")]
    NoFilesProvided,

    #[error("File too large. Maximum size is {max_bytes} bytes")]
    FileTooLarge { max_bytes: u64 },

    #[error("Too many files. Maximum is {max_files} files")]
    TooManyFiles { max_files: usize },

    #[error("Only JPEG, PNG and WebP images are allowed (got {0})")]
    UnsupportedMediaType(String),

    #[error("Image storage quota reached ({used} of {ceiling} bytes). Remove old images or contact support")]
    QuotaExceeded { used: u64, ceiling: u64 },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage write failed: {0}")]
    StorageWrite(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<NamingError> for AppError {
    fn from(err: NamingError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            // Every validation failure is client-fault and maps to 400,
            // quota exhaustion included (the caller can free space).
            AppError::NoFilesProvided
            | AppError::FileTooLarge { .. }
            | AppError::TooManyFiles { .. }
            | AppError::UnsupportedMediaType(_)
            | AppError::QuotaExceeded { .. }
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StorageWrite(_)
            | AppError::Internal(_)
            | AppError::Io(_)
            | AppError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        tracing::error!(status = %status, error = %message);

        let body = json!({
            "data": null,
            "error": {
                "code": status.as_u16(),
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
