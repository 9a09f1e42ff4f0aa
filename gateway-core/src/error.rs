use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Too many requests for {operation}")]
    TooManyRequests {
        operation: String,
        limit: u32,
        retry_after: u64,
    },

    #[error("Upstream service unavailable")]
    UpstreamUnavailable,

    #[error("Upstream request failed: {0}")]
    UpstreamFailed(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details, rate_limit) = match self {
            AppError::ValidationError(err) => (
                StatusCode::BAD_REQUEST,
                "Validation error".to_string(),
                Some(err.to_string()),
                None,
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None, None),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, msg, None, None)
            }
            AppError::TooManyRequests {
                operation,
                limit,
                retry_after,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!("Rate limit exceeded for {}. Please try again later.", operation),
                None,
                Some((limit, retry_after)),
            ),
            AppError::UpstreamUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "RAG service unavailable".to_string(),
                None,
                None,
            ),
            // Upstream detail stays in the logs, never in the client body.
            AppError::UpstreamFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Request processing failed".to_string(),
                None,
                None,
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
                None,
            ),
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
                None,
            ),
        };

        let mut res = (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response();

        if let Some((limit, retry_after)) = rate_limit {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry_after.into());
            res.headers_mut().insert("ratelimit-limit", limit.into());
        }

        res
    }
}
