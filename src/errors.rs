use crate::ledger::LedgerError;
use crate::storage::ArchiveError;
use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use serde_json::json;

/// Request-local failure, rendered as `{"detail": message}`.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let status = match err {
            LedgerError::UnknownFlavor(_) => StatusCode::NOT_FOUND,
            LedgerError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
            LedgerError::InsufficientStock { .. } => StatusCode::CONFLICT,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        Self::internal(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(json!({ "detail": self.message }))).into_response()
    }
}
