use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::generation::orchestrator::GenerationError;
use crate::generation::validator::ValidationError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Generation failed: {0}")]
    Generation(GenerationError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Validation(e) => AppError::Validation(e),
            other => AppError::Generation(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                e.to_string(),
                validation_details(e),
            ),
            AppError::MalformedBody(message) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                message.clone(),
                Some(json!({ "field": "body" })),
            ),
            AppError::Generation(e) => {
                tracing::error!("Generation error: {e}");
                match e {
                    GenerationError::AllVariantsFailed {
                        request_id,
                        first,
                        failed,
                    } => {
                        let status = if first.kind == "timeout" {
                            StatusCode::GATEWAY_TIMEOUT
                        } else {
                            StatusCode::BAD_GATEWAY
                        };
                        (
                            status,
                            "GENERATION_FAILED",
                            e.to_string(),
                            Some(json!({
                                "request_id": request_id,
                                "failed_variants": failed,
                                "first_error": first,
                            })),
                        )
                    }
                    GenerationError::Validation(v) => (
                        StatusCode::BAD_REQUEST,
                        "VALIDATION_ERROR",
                        v.to_string(),
                        validation_details(v),
                    ),
                }
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

fn validation_details(err: &ValidationError) -> Option<Value> {
    match err {
        ValidationError::UnknownEnumValue { field, allowed, .. } => {
            Some(json!({ "field": field, "allowed": allowed }))
        }
        ValidationError::OutOfRange { field, min, max, .. } => {
            Some(json!({ "field": field, "min": min, "max": max }))
        }
        ValidationError::EmptyInput { field } | ValidationError::InputTooLong { field, .. } => {
            Some(json!({ "field": field }))
        }
    }
}
