//! Error types for the contact relay.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::chat::{ChatReply, INTERNAL_ERROR_REPLY, MISSING_MESSAGE_REPLY};

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mail transport errors.
///
/// Every variant is terminal for the request that hit it; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Failed to build email: {0}")]
    Build(String),

    #[error("SMTP connection setup failed: {0}")]
    Connection(String),

    #[error("SMTP verification failed: {0}")]
    Verify(String),

    #[error("SMTP send failed: {0}")]
    Send(String),

    #[error("Mail transport unavailable: {0}")]
    Unavailable(String),

    #[error("Mail task failed: {0}")]
    Task(String),
}

/// Errors surfaced by the HTTP handlers.
///
/// Server-side detail stays in the logs; callers only see the fixed bodies
/// produced by [`IntoResponse`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Chat request without a usable `message`.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Contact form body that is not a JSON object of strings.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    /// Anything unexpected while answering a chat message.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Generic text returned to callers when a send fails.
pub const SEND_FAILED_DETAIL: &str = "The message could not be delivered. Please try again later.";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                Json(ChatReply::new(MISSING_MESSAGE_REPLY)),
            )
                .into_response(),
            ApiError::InvalidBody(_) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "message": "Invalid request body" })),
            )
                .into_response(),
            ApiError::Mail(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "message": "Failed to send email",
                    "error": SEND_FAILED_DETAIL,
                })),
            )
                .into_response(),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ChatReply::new(INTERNAL_ERROR_REPLY)),
            )
                .into_response(),
        }
    }
}
