//! `POST /api/send-email`: relay a contact form submission.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Serialize;
use tracing::{error, info, warn};

use super::{AppState, JsonBody, read_json_body};
use crate::error::{ApiError, MailError};
use crate::mail::{ContactSubmission, SendInfo};

/// Body of a successful send.
#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub message: &'static str,
    pub info: SendInfo,
}

pub async fn send_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SendEmailResponse>, ApiError> {
    let submission = parse_submission(&headers, &body)?;

    let email = submission.to_email();
    info!(subject = %email.subject, "Relaying contact form submission");

    // Verification and send share one failure path.
    let result: Result<SendInfo, MailError> = async {
        state.mailer.verify().await?;
        state.mailer.send(email).await
    }
    .await;

    match result {
        Ok(info) => {
            info!(message_id = %info.message_id, "Contact email sent");
            Ok(Json(SendEmailResponse {
                message: "Email sent successfully",
                info,
            }))
        }
        Err(e) => {
            error!(error = %e, "Email sending error");
            Err(e.into())
        }
    }
}

/// A missing body is an all-empty submission. Declared JSON must be an object.
fn parse_submission(headers: &HeaderMap, body: &[u8]) -> Result<ContactSubmission, ApiError> {
    let rejected = |reason: String| {
        warn!(error = %reason, "Rejected contact form body");
        ApiError::InvalidBody(reason)
    };

    match read_json_body(headers, body) {
        Ok(JsonBody::Absent) => Ok(ContactSubmission::default()),
        Ok(JsonBody::Value(value @ serde_json::Value::Object(_))) => {
            serde_json::from_value(value).map_err(|e| rejected(e.to_string()))
        }
        Ok(JsonBody::Value(other)) => Err(rejected(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(rejected(e.to_string())),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
