use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::screening::batch::{BatchError, FileError};
use crate::screening::report::ReportError;

pub const NO_RESULTS_MESSAGE: &str = "Could not analyze resumes. Check API key or PDF format.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// The run finished but not a single résumé could be evaluated.
    #[error("No results")]
    NoResults(Vec<FileError>),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, also used as the SSE `error` payload.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::MissingCredential(_) => "MISSING_CREDENTIAL",
            AppError::InvalidCredential(_) => "INVALID_CREDENTIAL",
            AppError::NoResults(_) => "NO_RESULTS",
            AppError::Report(_) => "REPORT_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingCredential(_) | AppError::InvalidCredential(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::NoResults(_) | AppError::Report(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON error body shared by plain responses and the event stream.
    pub fn body(&self) -> Value {
        let message = match self {
            AppError::Validation(msg)
            | AppError::MissingCredential(msg)
            | AppError::InvalidCredential(msg)
            | AppError::Report(msg) => msg.clone(),
            AppError::NoResults(_) => NO_RESULTS_MESSAGE.to_string(),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        };

        let mut error = json!({
            "code": self.code(),
            "message": message,
        });
        if let AppError::NoResults(details) = self {
            error["details"] = json!(details);
        }
        json!({ "error": error })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<BatchError> for AppError {
    fn from(err: BatchError) -> Self {
        match err {
            BatchError::MissingJobDescription | BatchError::NoFiles => {
                AppError::Validation(err.to_string())
            }
            BatchError::MissingCredential => AppError::MissingCredential(err.to_string()),
            BatchError::InvalidCredential { .. } => AppError::InvalidCredential(err.to_string()),
        }
    }
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::Empty => AppError::NoResults(Vec::new()),
            ReportError::InvalidScore { .. } => AppError::Report(err.to_string()),
            ReportError::Csv(_) | ReportError::Buffer(_) | ReportError::ListCell(_) => {
                AppError::Internal(anyhow::anyhow!(err.to_string()))
            }
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::Validation(format!("Malformed upload: {err}"))
    }
}
