use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::interview::InterviewError;
use crate::llm_client::CompletionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("LLM error: {0}")]
    Llm(#[from] CompletionError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<InterviewError> for AppError {
    fn from(e: InterviewError) -> Self {
        match e {
            InterviewError::UnknownPersona(_) => AppError::Validation(e.to_string()),
            InterviewError::AlreadyStarted
            | InterviewError::NotActive
            | InterviewError::NoPendingTurn => AppError::Conflict(e.to_string()),
            InterviewError::EmptyTranscript => AppError::UnprocessableEntity(e.to_string()),
            InterviewError::Completion(inner) => AppError::Llm(inner),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                match e {
                    CompletionError::TransportFailure { timed_out: true, .. } => (
                        StatusCode::GATEWAY_TIMEOUT,
                        "LLM_TIMEOUT",
                        "The interviewer took too long to answer. Please try again.".to_string(),
                    ),
                    CompletionError::TransportFailure { .. } => (
                        StatusCode::BAD_GATEWAY,
                        "LLM_UNAVAILABLE",
                        "Could not reach the language model provider".to_string(),
                    ),
                    // provider messages (bad key, rate limit) are actionable for the caller
                    CompletionError::ProviderError { message, .. } => (
                        StatusCode::BAD_GATEWAY,
                        "LLM_PROVIDER_ERROR",
                        message.clone(),
                    ),
                    CompletionError::MalformedResponse(_) => (
                        StatusCode::BAD_GATEWAY,
                        "LLM_MALFORMED_RESPONSE",
                        "The language model returned an unexpected response".to_string(),
                    ),
                }
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
