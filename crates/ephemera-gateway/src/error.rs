use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ephemera_core::{ContentRejection, PasteError, StorageError};
use ephemera_ratelimit::Bucket;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Paste(#[from] PasteError),
    #[error("rate limit exceeded for {0}")]
    RateLimited(Bucket),
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

fn storage_status(err: &StorageError) -> StatusCode {
    match err {
        StorageError::PoolExhausted(_) | StorageError::Unavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Paste(PasteError::InvalidContent(rejection)) => {
                let status = match rejection {
                    ContentRejection::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, rejection.to_string())
            }
            AppError::Paste(PasteError::InvalidId(reason)) => {
                (StatusCode::BAD_REQUEST, format!("invalid paste id: {reason}"))
            }
            AppError::Paste(PasteError::NotFound) => {
                (StatusCode::NOT_FOUND, "paste not found or expired".to_string())
            }
            AppError::Paste(PasteError::CollisionExhausted { attempts }) => {
                error!(attempts, "could not allocate a unique paste id");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "could not allocate a paste id, try again".to_string(),
                )
            }
            AppError::Paste(PasteError::Storage(err)) => {
                let status = storage_status(&err);
                error!(error = %err, status = status.as_u16(), "storage failure");
                (status, "storage temporarily unavailable".to_string())
            }
            AppError::RateLimited(bucket) => {
                warn!(bucket = %bucket, "rate limit exceeded");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "rate limit exceeded, try again later".to_string(),
                )
            }
            AppError::Rejected { status, message } => (status, message),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
