//! `POST /api/chat`: canned replies from the rule table.

use std::any::Any;

use axum::Json;
use axum::body::Bytes;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use tracing::{debug, error};

use super::{JsonBody, read_json_body};
use crate::chat::{ChatReply, ChatRequest, respond};
use crate::error::ApiError;

pub async fn chat(headers: HeaderMap, body: Bytes) -> Result<Json<ChatReply>, ApiError> {
    let request = parse_request(&headers, &body)?;
    debug!(message = ?request.message, "Received chat message");

    let message = request
        .message
        .filter(|m| !m.is_empty())
        .ok_or_else(|| ApiError::Validation("message is required".into()))?;

    let (category, reply) = respond(&message);
    debug!(category = category.as_str(), reply, "Sending reply");

    Ok(Json(ChatReply::new(reply)))
}

/// Missing bodies and non-object JSON carry no message; broken JSON and a
/// `message` of the wrong type are faults.
fn parse_request(headers: &HeaderMap, body: &[u8]) -> Result<ChatRequest, ApiError> {
    let value = match read_json_body(headers, body) {
        Ok(JsonBody::Value(value @ serde_json::Value::Object(_))) => value,
        Ok(_) => return Ok(ChatRequest { message: None }),
        Err(e) => {
            error!(error = %e, "Chat request could not be read");
            return Err(ApiError::Internal(e.to_string()));
        }
    };

    serde_json::from_value(value).map_err(|e| {
        error!(error = %e, "Chat request could not be read");
        ApiError::Internal(e.to_string())
    })
}

/// Turns a panic inside the chat handler into the fixed apology.
pub fn panic_reply(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("Chat handler panicked");
    ApiError::Internal("handler panicked".into()).into_response()
}
