//! Caller-side fallback chain: official feed, then the intermediate service,
//! then the local snapshot.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use loterias_core::{sort_by_game_order, CanonicalResult, ClientConfig, GameId};
use loterias_official::{
    fetch_aggregate, map_home_record, BuildError, Endpoints, HttpUpstream, Upstream,
};
use serde_json::Value;
use url::Url;

use crate::error::ClientError;
use crate::payload::extract_results;
use crate::snapshot::{bundled_results, load_snapshot_results};

const SERVICE_PATH: &str = "/api/official-results";

/// Where a [`ClientResults`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsSource {
    Direct,
    Service,
    Snapshot,
}

impl ResultsSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Service => "service",
            Self::Snapshot => "snapshot",
        }
    }
}

impl fmt::Display for ResultsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ClientResults {
    pub results: Vec<CanonicalResult>,
    pub source: ResultsSource,
    /// Set when every live layer failed and the snapshot was served instead.
    pub refresh_failed: bool,
}

pub struct ResultsClient {
    upstream: Arc<dyn Upstream>,
    home_url: Url,
    service_bases: Vec<String>,
    http: reqwest::Client,
    snapshot_file: Option<PathBuf>,
}

impl fmt::Debug for ResultsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultsClient")
            .field("home_url", &self.home_url.as_str())
            .field("service_bases", &self.service_bases)
            .field("snapshot_file", &self.snapshot_file)
            .finish_non_exhaustive()
    }
}

impl ResultsClient {
    /// # Errors
    ///
    /// Returns [`BuildError`] if an HTTP client cannot be built or the official
    /// base URL does not parse.
    pub fn new(config: &ClientConfig) -> Result<Self, BuildError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let upstream: Arc<dyn Upstream> = Arc::new(HttpUpstream::new(timeout, None)?);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("loterias-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_parts(
            upstream,
            Endpoints::home_for(&config.official_base_url)?,
            config.api_base_urls.clone(),
            http,
        ))
    }

    pub fn with_parts(
        upstream: Arc<dyn Upstream>,
        home_url: Url,
        service_bases: Vec<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            upstream,
            home_url,
            service_bases: service_bases
                .into_iter()
                .map(|base| base.trim_end_matches('/').to_string())
                .filter(|base| !base.is_empty())
                .collect(),
            http,
            snapshot_file: None,
        }
    }

    /// Prefer this file over the bundled results when falling back.
    #[must_use]
    pub fn with_snapshot_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_file = Some(path.into());
        self
    }

    /// Never fails: the bundled results are the floor.
    pub async fn fetch_results(&self, force: bool) -> ClientResults {
        match self.fetch_direct().await {
            Ok(results) => {
                tracing::debug!(count = results.len(), "official feed answered directly");
                return ClientResults {
                    results,
                    source: ResultsSource::Direct,
                    refresh_failed: false,
                };
            }
            Err(e) => {
                tracing::warn!(url = %self.home_url, error = %e, "direct fetch failed");
            }
        }

        for base in &self.service_bases {
            match self.fetch_service(base, force).await {
                Ok(results) => {
                    tracing::debug!(base = %base, count = results.len(), "service answered");
                    return ClientResults {
                        results,
                        source: ResultsSource::Service,
                        refresh_failed: false,
                    };
                }
                Err(e) => {
                    tracing::warn!(base = %base, error = %e, "service fetch failed");
                }
            }
        }

        tracing::warn!("all live sources failed; serving snapshot");
        ClientResults {
            results: self.snapshot_results(),
            source: ResultsSource::Snapshot,
            refresh_failed: true,
        }
    }

    async fn fetch_direct(&self) -> Result<Vec<CanonicalResult>, loterias_official::FetchError> {
        let mut results = fetch_aggregate(
            self.upstream.as_ref(),
            &self.home_url,
            GameId::home_key,
            map_home_record,
        )
        .await?;
        sort_by_game_order(&mut results);
        Ok(results)
    }

    async fn fetch_service(
        &self,
        base: &str,
        force: bool,
    ) -> Result<Vec<CanonicalResult>, ClientError> {
        let url = format!("{base}{SERVICE_PATH}");
        let mut request = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json");
        if force {
            request = request.query(&[("force", "1")]);
        }

        let response = request.send().await.map_err(|source| ClientError::Http {
            url: url.clone(),
            source,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url,
                status: status.as_u16(),
            });
        }
        let payload: Value = response.json().await.map_err(|source| ClientError::Http {
            url: url.clone(),
            source,
        })?;

        let mut results = extract_results(&payload)
            .ok_or_else(|| ClientError::InvalidPayload { url: url.clone() })?;
        if results.is_empty() {
            return Err(ClientError::Empty { url });
        }
        sort_by_game_order(&mut results);
        Ok(results)
    }

    fn snapshot_results(&self) -> Vec<CanonicalResult> {
        self.snapshot_file
            .as_deref()
            .and_then(load_snapshot_results)
            .map(|mut results| {
                sort_by_game_order(&mut results);
                results
            })
            .unwrap_or_else(bundled_results)
    }
}
