use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::upload::storage::StorageError;
use crate::upload::validation::ValidationError;

/// Application-level error type: everything that can cross the HTTP
/// boundary funnels through here. Implements `IntoResponse` so handlers
/// return `Result<T, AppError>`, and the mapping below is the single place
/// the client-facing contract lives. Raw diagnostics are logged, never
/// serialized into a body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("required file {0} not found")]
    MissingDependency(String),

    #[error("worker could not be started: {0}")]
    WorkerLaunch(String),

    #[error("worker exited with code {exit_code}")]
    WorkerExit {
        exit_code: i32,
        stderr_excerpt: String,
    },

    #[error("worker output was not usable")]
    WorkerOutput(String),

    #[error("worker timed out after {0:?}")]
    WorkerTimeout(std::time::Duration),

    /// The worker ran to completion but reported a semantic problem.
    #[error("{0}")]
    Domain(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// The flat wire shape of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            AppError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string(), None),
            AppError::MissingDependency(file) => {
                tracing::error!(file = %file, "required reference file missing");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!(
                        "Required file {file} not found. Please ensure all required files are present."
                    ),
                    None,
                )
            }
            AppError::WorkerLaunch(reason) => {
                tracing::error!(reason = %reason, "worker launch failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process resume".to_string(),
                    Some("Could not start processing".to_string()),
                )
            }
            AppError::WorkerExit {
                exit_code,
                stderr_excerpt,
            } => {
                tracing::error!(exit_code, "worker exited non-zero");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error processing resume".to_string(),
                    Some(stderr_excerpt),
                )
            }
            AppError::WorkerOutput(raw) => {
                tracing::error!(raw = %raw, "worker produced unusable output");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error processing resume results".to_string(),
                    Some("Invalid response format".to_string()),
                )
            }
            AppError::WorkerTimeout(elapsed) => {
                tracing::error!(?elapsed, "worker timed out");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process resume".to_string(),
                    Some("Processing timed out".to_string()),
                )
            }
            AppError::Domain(message) => (StatusCode::BAD_REQUEST, message, None),
            AppError::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}
