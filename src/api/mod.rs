//! HTTP surface: router, shared state and CORS policy.

pub mod chat;
pub mod email;

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderValue, Method, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ServerConfig;
use crate::mail::Mailer;

/// Text served at `/`.
pub const ROOT_BANNER: &str = "Inochi Backend API is running 🚀";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }
}

/// Build the Axum router with every route and the shared middleware.
pub fn router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/send-email", post(email::send_email))
        .route(
            "/api/chat",
            post(chat::chat).layer(CatchPanicLayer::custom(chat::panic_reply)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.allowed_origins))
        .with_state(state)
}

/// CORS policy: listed origins only, with credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            if origin == "*" {
                warn!("Ignoring wildcard CORS origin; credentials require explicit origins");
                return None;
            }
            match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                    None
                }
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ORIGIN,
            header::ACCEPT,
        ])
        .allow_credentials(true)
}

// ── Request bodies ──────────────────────────────────────────────────────

/// A request body read the way browsers' form posts expect.
#[derive(Debug, PartialEq)]
pub enum JsonBody {
    /// No body, a blank body, or a body that is not declared as JSON.
    Absent,
    Value(serde_json::Value),
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Parse a JSON body leniently.
///
/// Bodies that are missing, blank, or sent without a JSON content type are
/// `Absent` rather than an error. Only a declared JSON body that fails to
/// parse is an error.
pub fn read_json_body(headers: &HeaderMap, body: &[u8]) -> Result<JsonBody, serde_json::Error> {
    if !is_json_content_type(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(JsonBody::Absent);
    }
    serde_json::from_slice(body).map(JsonBody::Value)
}

// ── Liveness ────────────────────────────────────────────────────────────

async fn root() -> &'static str {
    ROOT_BANNER
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "contact-relay"
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::mail::UnavailableMailer;

    fn app() -> Router {
        let state = AppState::new(Arc::new(UnavailableMailer::new("not configured")));
        router(state, &ServerConfig::default())
    }

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers
    }

    #[test]
    fn body_without_content_type_is_absent() {
        let body = read_json_body(&HeaderMap::new(), br#"{"message":"hi"}"#).unwrap();
        assert_eq!(body, JsonBody::Absent);
    }

    #[test]
    fn blank_json_body_is_absent() {
        assert_eq!(read_json_body(&json_headers(), b"").unwrap(), JsonBody::Absent);
        assert_eq!(read_json_body(&json_headers(), b" \n").unwrap(), JsonBody::Absent);
    }

    #[test]
    fn form_body_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        assert_eq!(
            read_json_body(&headers, b"message=hello").unwrap(),
            JsonBody::Absent
        );
    }

    #[test]
    fn json_body_is_parsed() {
        let body = read_json_body(&json_headers(), br#"{"message":"hi"}"#).unwrap();
        assert_eq!(body, JsonBody::Value(serde_json::json!({ "message": "hi" })));
    }

    #[test]
    fn broken_json_is_an_error() {
        assert!(read_json_body(&json_headers(), b"{not json").is_err());
    }

    #[tokio::test]
    async fn root_banner() {
        let resp = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], ROOT_BANNER.as_bytes());
    }

    #[tokio::test]
    async fn unavailable_mailer_yields_500() {
        let resp = app()
            .oneshot(
                Request::post("/api/send-email")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"from_name":"A"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn chat_works_without_mailer() {
        let resp = app()
            .oneshot(
                Request::post("/api/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"message":"price?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn wildcard_origin_is_not_allowed() {
        let config = ServerConfig {
            allowed_origins: vec!["*".into(), "https://ok.example".into()],
            ..ServerConfig::default()
        };
        let state = AppState::new(Arc::new(UnavailableMailer::new("not configured")));
        let resp = router(state, &config)
            .oneshot(
                Request::options("/api/chat")
                    .header(header::ORIGIN, "https://other.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }
}
