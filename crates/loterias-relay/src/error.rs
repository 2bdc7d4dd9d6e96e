use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Rejections and upstream failures. Responses carry only a stable code; the
/// upstream URL and the underlying error stay in the logs.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("route not relayed")]
    NotFound,

    #[error("missing or mismatched proxy key")]
    Unauthorized,

    #[error("upstream did not answer within {timeout_ms}ms")]
    UpstreamTimeout { timeout_ms: u64 },

    #[error("upstream request failed: {0}")]
    UpstreamFailed(#[source] reqwest::Error),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::NotFound => StatusCode::NOT_FOUND,
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::UpstreamTimeout { .. } | RelayError::UpstreamFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RelayError::NotFound => "not_found",
            RelayError::Unauthorized => "unauthorized",
            RelayError::UpstreamTimeout { .. } => "proxy_upstream_timeout",
            RelayError::UpstreamFailed(_) => "proxy_upstream_failed",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(json!({ "error": self.code() }))).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}
