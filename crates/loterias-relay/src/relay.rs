//! Forwarding handler.
//!
//! Only `GET` requests under [`ALLOWED_PATH_PREFIX`] reach the upstream. The
//! outbound request carries the browser identity of the official web client;
//! the response comes back with the upstream status, a fixed allowlist of
//! headers and the raw (still encoded) body.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use loterias_core::{identity, RelayConfig};
use serde_json::json;
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::error::RelayError;

pub const ALLOWED_PATH_PREFIX: &str = "/portaldeloterias/api/";
const SERVICE_NAME: &str = "loterias-caixa-proxy";

const FORWARDED_HEADERS: [HeaderName; 6] = [
    header::CONTENT_TYPE,
    header::CONTENT_ENCODING,
    header::ETAG,
    header::LAST_MODIFIED,
    header::EXPIRES,
    header::PRAGMA,
];

#[derive(Clone)]
pub struct RelayState {
    client: reqwest::Client,
    upstream_base_url: Arc<str>,
    proxy_key: Option<Arc<str>>,
    timeout: Duration,
}

impl RelayState {
    /// Builds the outbound client. Decompression is disabled so the body and
    /// its `content-encoding` are forwarded together untouched.
    ///
    /// # Errors
    ///
    /// Returns [`reqwest::Error`] if the client cannot be constructed.
    pub fn from_config(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(identity::USER_AGENT)
            .default_headers(browser_headers())
            .no_gzip()
            .no_brotli()
            .no_deflate()
            .build()?;

        Ok(Self {
            client,
            upstream_base_url: Arc::from(config.upstream_base_url.trim_end_matches('/')),
            proxy_key: config.proxy_key.as_deref().map(Arc::from),
            timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }

    fn key_matches(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = self.proxy_key.as_deref() else {
            return true;
        };
        let provided = headers
            .get(identity::PROXY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();
        !provided.is_empty() && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
    }
}

impl std::fmt::Debug for RelayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayState")
            .field("upstream_base_url", &self.upstream_base_url)
            .field("proxy_key", &self.proxy_key.as_ref().map(|_| "[redacted]"))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static(identity::ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static(identity::ACCEPT_LANGUAGE),
    );
    headers.insert(header::ORIGIN, HeaderValue::from_static(identity::ORIGIN));
    headers.insert(header::REFERER, HeaderValue::from_static(identity::REFERER));
    headers
}

pub fn build_relay_app(state: RelayState) -> Router {
    Router::new()
        .fallback(relay)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn relay(
    State(state): State<RelayState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }

    let path = uri.path();
    if path == "/" || path == "/health" {
        return liveness();
    }

    match forward(&state, &method, &uri, &headers).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                RelayError::UpstreamTimeout { .. } | RelayError::UpstreamFailed(_) => {
                    tracing::warn!(path = %path, code = err.code(), error = %err, "relay upstream failure");
                }
                RelayError::NotFound | RelayError::Unauthorized => {
                    tracing::debug!(method = %method, path = %path, code = err.code(), "relay rejected request");
                }
            }
            err.into_response()
        }
    }
}

fn liveness() -> Response {
    let mut response = Json(json!({
        "ok": true,
        "service": SERVICE_NAME,
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
    .into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

async fn forward(
    state: &RelayState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<Response, RelayError> {
    if method != Method::GET || !uri.path().starts_with(ALLOWED_PATH_PREFIX) {
        return Err(RelayError::NotFound);
    }
    let path_and_query = uri.path_and_query().map_or(uri.path(), |pq| pq.as_str());
    let upstream_url = resolve_upstream_url(&state.upstream_base_url, path_and_query)
        .ok_or(RelayError::NotFound)?;
    if !state.key_matches(headers) {
        return Err(RelayError::Unauthorized);
    }

    let mut request = state.client.get(upstream_url);
    if let Some(encoding) = headers.get(header::ACCEPT_ENCODING) {
        request = request.header(header::ACCEPT_ENCODING, encoding.clone());
    }

    let timeout_ms = u64::try_from(state.timeout.as_millis()).unwrap_or(u64::MAX);
    let exchange = async {
        let upstream = request.send().await?;
        let status = upstream.status();
        let upstream_headers = upstream.headers().clone();
        let body = upstream.bytes().await?;
        Ok::<_, reqwest::Error>((status, upstream_headers, body))
    };

    let (status, upstream_headers, body) = tokio::time::timeout(state.timeout, exchange)
        .await
        .map_err(|_| RelayError::UpstreamTimeout { timeout_ms })?
        .map_err(|e| {
            if e.is_timeout() {
                RelayError::UpstreamTimeout { timeout_ms }
            } else {
                RelayError::UpstreamFailed(e)
            }
        })?;

    tracing::debug!(path = %uri.path(), status = status.as_u16(), bytes = body.len(), "relayed upstream response");
    Ok(relayed_response(status, &upstream_headers, body))
}

/// Joins the request onto the upstream base after dot-segment resolution
/// (including `%2e` forms) and rejects anything that lands outside the
/// allowed prefix.
fn resolve_upstream_url(base: &str, path_and_query: &str) -> Option<Url> {
    let base_path = Url::parse(base).ok()?.path().trim_end_matches('/').to_owned();
    let resolved = Url::parse(&format!("{base}{path_and_query}")).ok()?;
    let allowed = format!("{base_path}{ALLOWED_PATH_PREFIX}");
    resolved.path().starts_with(&allowed).then_some(resolved)
}

fn relayed_response(status: StatusCode, upstream_headers: &HeaderMap, body: Bytes) -> Response {
    let mut response = (status, Body::from(body)).into_response();
    let out = response.headers_mut();
    for name in &FORWARDED_HEADERS {
        if let Some(value) = upstream_headers.get(name) {
            out.insert(name.clone(), value.clone());
        }
    }
    out.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
