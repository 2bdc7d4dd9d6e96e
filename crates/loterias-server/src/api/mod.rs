mod official_results;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use loterias_official::OfficialResultsService;
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::{
    enforce_origin, enforce_rate_limit, error_response, request_id, OriginPolicy, RateLimitState,
};

#[derive(Clone)]
pub struct AppState {
    pub official: Arc<OfficialResultsService>,
}

fn build_cors(origins: &OriginPolicy) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins.header_values()))
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
        .max_age(std::time::Duration::from_secs(86_400))
}

fn api_router(origins: OriginPolicy, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/official-results",
            get(official_results::get_official_results),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    origins,
                    enforce_origin,
                )),
        )
}

pub fn build_app(state: AppState, origins: OriginPolicy, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/health", get(api_health));

    Router::new()
        .merge(public_routes)
        .merge(api_router(origins.clone(), rate_limit))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors(&origins))
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn root() -> impl IntoResponse {
    Json(json!({ "ok": true, "service": "loterias-api" }))
}

async fn health() -> &'static str {
    "ok"
}

async fn api_health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not_found")
}
