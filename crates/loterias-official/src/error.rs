use thiserror::Error;

use crate::diagnostics::FetchDiagnostics;

/// Longest body excerpt kept for diagnostics.
const PREVIEW_CHARS: usize = 160;

/// Failure of a single outbound call or of one tier.
///
/// Both transport strategies normalise into these variants, so callers cannot
/// tell which strategy produced an error.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The body did not parse as JSON or lacked the expected shape.
    #[error("invalid payload from {context}: {reason}")]
    InvalidPayload {
        context: String,
        reason: String,
        preview: Option<String>,
    },

    /// The upstream answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from {url}")]
    UpstreamHttp {
        status: u16,
        url: String,
        preview: String,
    },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    /// Connection, TLS or other transport-level failure.
    #[error("network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The payload parsed but produced zero usable records.
    #[error("no usable records from {context}")]
    EmptyResult { context: String },
}

impl FetchError {
    /// Stable machine-readable code recorded in diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            FetchError::InvalidPayload { .. } => "invalid_payload",
            FetchError::UpstreamHttp { .. } => "upstream_http_error",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Network { .. } => "network_error",
            FetchError::EmptyResult { .. } => "empty_result",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body_preview(&self) -> Option<&str> {
        match self {
            FetchError::UpstreamHttp { preview, .. } => Some(preview.as_str()),
            FetchError::InvalidPayload { preview, .. } => preview.as_deref(),
            _ => None,
        }
    }

    /// Classifies a `reqwest` failure into the shared taxonomy.
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_owned(),
            }
        } else if err.is_decode() || err.is_body() {
            FetchError::InvalidPayload {
                context: url.to_owned(),
                reason: err.to_string(),
                preview: None,
            }
        } else {
            FetchError::Network {
                url: url.to_owned(),
                source: err,
            }
        }
    }

    pub(crate) fn invalid_json(url: &str, err: &serde_json::Error, body: &str) -> Self {
        FetchError::InvalidPayload {
            context: url.to_owned(),
            reason: err.to_string(),
            preview: Some(preview(body)),
        }
    }
}

/// Collapses whitespace and truncates `body` for logging.
pub(crate) fn preview(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(PREVIEW_CHARS).collect()
}

/// Every tier failed; carries what each one reported.
#[derive(Debug, Error)]
#[error("official results unavailable ({})", .diagnostics.summary())]
pub struct ResultsUnavailable {
    pub diagnostics: FetchDiagnostics,
}

impl ResultsUnavailable {
    pub const CODE: &'static str = "official_results_unavailable";
}

/// Errors while wiring up the fetch pipeline at startup.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("HTTP client construction failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid endpoint URL \"{url}\": {source}")]
    Endpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
