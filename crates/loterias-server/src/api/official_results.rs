use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::SecondsFormat;
use loterias_core::CanonicalResult;
use loterias_official::ResultsUnavailable;
use serde::{Deserialize, Serialize};

use crate::middleware::{error_response, RequestId};

use super::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct OfficialResultsQuery {
    pub force: Option<String>,
}

impl OfficialResultsQuery {
    /// Only the literal `1` forces a refresh.
    fn is_forced(&self) -> bool {
        self.force.as_deref() == Some("1")
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OfficialResultsBody<'a> {
    updated_at: String,
    source: &'static str,
    results: &'a [CanonicalResult],
}

pub(super) async fn get_official_results(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OfficialResultsQuery>,
) -> Response {
    let force = query.is_forced();

    match state.official.official_results(force).await {
        Ok(entry) => Json(OfficialResultsBody {
            updated_at: entry
                .fetched_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            source: entry.source.source_tag(),
            results: &entry.results,
        })
        .into_response(),
        Err(err) => unavailable(&req_id, force, &err),
    }
}

fn unavailable(req_id: &RequestId, force: bool, err: &ResultsUnavailable) -> Response {
    tracing::error!(
        request_id = %req_id.0,
        force,
        error = %err,
        "official results request failed"
    );
    error_response(StatusCode::BAD_GATEWAY, ResultsUnavailable::CODE)
}
