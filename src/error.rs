use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::importer::ImportError;

const PROCESSING_FAILED: &str = "An error occurred during file processing";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Rejected client input; the message is returned verbatim.
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    /// A failure while processing an upload, reported with its details.
    #[error("An error occurred during file processing: {0:#}")]
    Processing(anyhow::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(anyhow::Error::new(err))
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        if err.is_client_error() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Processing(anyhow::Error::new(err))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, json!({ "error": msg }))
            },
            AppError::Processing(err) => {
                tracing::error!(error = ?err, "file processing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": PROCESSING_FAILED, "details": format!("{err:#}") }),
                )
            },
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
