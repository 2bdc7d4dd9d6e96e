//! Tiered acquisition of the latest official draws.
//!
//! Tiers run in order and stop at the first one that yields at least one valid
//! record:
//!
//! 1. the aggregate feed (`{base}/home/ultimos-resultados`),
//! 2. per-game endpoints (`{base}/{slug}`), in bounded concurrent batches with
//!    retry,
//! 3. the third-party lookup feed.
//!
//! Each tier swallows its own failures into [`FetchDiagnostics`]; only a fetch
//! where every tier came up empty surfaces as [`ResultsUnavailable`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use loterias_core::{sort_by_game_order, AppConfig, CanonicalResult, GameId};
use serde_json::Value;
use url::Url;

use crate::cache::{CacheEntry, ResultCache};
use crate::diagnostics::{
    DiagnosticsBuilder, FetchDiagnostics, GameFailure, Tier, TierOutcome, TierReport,
};
use crate::error::{BuildError, FetchError, ResultsUnavailable};
use crate::mapper::{map_game_record, map_home_record, map_lookup_record};
use crate::retry::RetryPolicy;
use crate::transport::{HttpUpstream, Upstream};

const HOME_PATH: &str = "home/ultimos-resultados";

/// Resolved upstream URLs, computed once at startup.
#[derive(Debug, Clone)]
pub struct Endpoints {
    home: Url,
    games: Vec<(GameId, Url)>,
    lookup: Url,
}

impl Endpoints {
    /// # Errors
    ///
    /// Returns [`BuildError::Endpoint`] if any derived URL fails to parse.
    pub fn new(official_base_url: &str, lookup_url: &str) -> Result<Self, BuildError> {
        let base = official_base_url.trim_end_matches('/');
        let home = Self::home_for(base)?;
        let games = GameId::ALL
            .iter()
            .map(|game| Ok((*game, parse_url(&format!("{base}/{}", game.official_slug()))?)))
            .collect::<Result<Vec<_>, BuildError>>()?;
        let lookup = parse_url(lookup_url)?;
        Ok(Self {
            home,
            games,
            lookup,
        })
    }

    /// Aggregate feed URL under `official_base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Endpoint`] if the URL fails to parse.
    pub fn home_for(official_base_url: &str) -> Result<Url, BuildError> {
        parse_url(&format!(
            "{}/{HOME_PATH}",
            official_base_url.trim_end_matches('/')
        ))
    }

    pub fn home(&self) -> &Url {
        &self.home
    }

    pub fn game(&self, game: GameId) -> Option<&Url> {
        self.games
            .iter()
            .find(|(candidate, _)| *candidate == game)
            .map(|(_, url)| url)
    }

    pub fn lookup(&self) -> &Url {
        &self.lookup
    }
}

fn parse_url(raw: &str) -> Result<Url, BuildError> {
    Url::parse(raw).map_err(|source| BuildError::Endpoint {
        url: raw.to_owned(),
        source,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct FetchSettings {
    pub per_game_retry: RetryPolicy,
    /// Per-game calls in flight at once. Values below 1 are treated as 1.
    pub batch_size: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            per_game_retry: RetryPolicy::linear(2, Duration::from_millis(200)),
            batch_size: 3,
        }
    }
}

/// Output of one successful tiered fetch.
#[derive(Debug, Clone)]
pub struct FetchedResults {
    pub results: Vec<CanonicalResult>,
    pub source: Tier,
    pub diagnostics: FetchDiagnostics,
}

/// Fetches a JSON object keyed by provider game key and maps every entry that
/// is present and valid.
///
/// # Errors
///
/// - [`FetchError::InvalidPayload`] if the body is not a JSON object.
/// - [`FetchError::EmptyResult`] if no entry maps to a valid record.
/// - Any transport error from `upstream`.
pub async fn fetch_aggregate<K, M>(
    upstream: &dyn Upstream,
    url: &Url,
    key_for: K,
    map: M,
) -> Result<Vec<CanonicalResult>, FetchError>
where
    K: Fn(GameId) -> &'static str,
    M: Fn(GameId, &Value) -> Option<CanonicalResult>,
{
    let payload = upstream.get_json(url).await?;
    let Some(feed) = payload.as_object() else {
        return Err(FetchError::InvalidPayload {
            context: url.to_string(),
            reason: "expected a JSON object keyed by game".to_owned(),
            preview: None,
        });
    };

    let results: Vec<CanonicalResult> = GameId::ALL
        .iter()
        .filter_map(|game| {
            feed.get(key_for(*game))
                .filter(|entry| entry.is_object())
                .and_then(|entry| map(*game, entry))
        })
        .collect();

    if results.is_empty() {
        return Err(FetchError::EmptyResult {
            context: url.to_string(),
        });
    }
    Ok(results)
}

pub struct TieredFetcher {
    upstream: Arc<dyn Upstream>,
    endpoints: Endpoints,
    settings: FetchSettings,
}

impl TieredFetcher {
    pub fn new(upstream: Arc<dyn Upstream>, endpoints: Endpoints, settings: FetchSettings) -> Self {
        Self {
            upstream,
            endpoints,
            settings,
        }
    }

    /// Runs the tiers in order.
    ///
    /// # Errors
    ///
    /// Returns [`ResultsUnavailable`] when all three tiers yield nothing.
    pub async fn fetch(&self) -> Result<FetchedResults, ResultsUnavailable> {
        let mut diagnostics = DiagnosticsBuilder::new();

        for (idx, tier) in Tier::ORDER.iter().copied().enumerate() {
            let started = Instant::now();
            let (attempt, game_failures) = match tier {
                Tier::Home => (self.home_tier().await, Vec::new()),
                Tier::PerGame => self.per_game_tier().await,
                Tier::Lookup => (self.lookup_tier().await, Vec::new()),
            };
            let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            match attempt {
                Ok(mut results) => {
                    sort_by_game_order(&mut results);
                    tracing::info!(tier = %tier, records = results.len(), elapsed_ms, "official results fetched");
                    diagnostics = diagnostics.record(TierReport {
                        tier,
                        outcome: TierOutcome::Succeeded {
                            records: results.len(),
                        },
                        game_failures,
                        elapsed_ms,
                    });
                    for skipped in &Tier::ORDER[idx + 1..] {
                        diagnostics = diagnostics.record(TierReport {
                            tier: *skipped,
                            outcome: TierOutcome::Skipped,
                            game_failures: Vec::new(),
                            elapsed_ms: 0,
                        });
                    }
                    return Ok(FetchedResults {
                        results,
                        source: tier,
                        diagnostics: diagnostics.finish(),
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        tier = %tier,
                        code = err.code(),
                        error = %err,
                        elapsed_ms,
                        "official results tier failed; falling back"
                    );
                    diagnostics = diagnostics.record(TierReport {
                        tier,
                        outcome: TierOutcome::failed(&err),
                        game_failures,
                        elapsed_ms,
                    });
                }
            }
        }

        let diagnostics = diagnostics.finish();
        tracing::error!(summary = %diagnostics.summary(), "official results unavailable from every tier");
        Err(ResultsUnavailable { diagnostics })
    }

    async fn home_tier(&self) -> Result<Vec<CanonicalResult>, FetchError> {
        fetch_aggregate(
            self.upstream.as_ref(),
            self.endpoints.home(),
            GameId::home_key,
            map_home_record,
        )
        .await
    }

    async fn lookup_tier(&self) -> Result<Vec<CanonicalResult>, FetchError> {
        fetch_aggregate(
            self.upstream.as_ref(),
            self.endpoints.lookup(),
            GameId::lookup_key,
            map_lookup_record,
        )
        .await
    }

    /// Batches of `batch_size` run concurrently; the next batch starts only once
    /// every call in the current one has settled.
    async fn per_game_tier(&self) -> (Result<Vec<CanonicalResult>, FetchError>, Vec<GameFailure>) {
        let mut results = Vec::new();
        let mut failures = Vec::new();

        for batch in GameId::ALL.chunks(self.settings.batch_size.max(1)) {
            let settled = join_all(batch.iter().map(|game| self.fetch_game(*game))).await;
            for (game, outcome) in settled {
                match outcome {
                    Ok(result) => results.push(result),
                    Err(err) => {
                        tracing::warn!(game = %game, code = err.code(), error = %err, "per-game fetch failed");
                        failures.push(GameFailure::new(game, &err));
                    }
                }
            }
        }

        if results.is_empty() {
            let err = FetchError::EmptyResult {
                context: format!("per-game endpoints ({} failed)", failures.len()),
            };
            return (Err(err), failures);
        }
        (Ok(results), failures)
    }

    async fn fetch_game(&self, game: GameId) -> (GameId, Result<CanonicalResult, FetchError>) {
        let Some(url) = self.endpoints.game(game) else {
            let err = FetchError::InvalidPayload {
                context: game.to_string(),
                reason: "no endpoint configured".to_owned(),
                preview: None,
            };
            return (game, Err(err));
        };

        let outcome = self
            .settings
            .per_game_retry
            .run(game.as_str(), |_| async move {
                let payload = self.upstream.get_json(url).await?;
                map_game_record(game, &payload).ok_or_else(|| FetchError::InvalidPayload {
                    context: url.to_string(),
                    reason: "record has no drawn numbers".to_owned(),
                    preview: None,
                })
            })
            .await;
        (game, outcome)
    }
}

/// Cached front of [`TieredFetcher`].
///
/// Concurrent non-forced misses coalesce: only the first runs the tiers, the
/// rest wait on the refresh lock and then read what it stored. Forced
/// refreshes invalidate the cache and always run the tiers themselves.
pub struct OfficialResultsService {
    fetcher: TieredFetcher,
    cache: Arc<ResultCache>,
    refresh: tokio::sync::Mutex<()>,
}

impl OfficialResultsService {
    pub fn new(fetcher: TieredFetcher, cache: Arc<ResultCache>) -> Self {
        Self {
            fetcher,
            cache,
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    /// Wires the HTTP transport, endpoints, retry policy and cache from config.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the HTTP clients cannot be built or an
    /// endpoint URL is invalid.
    pub fn from_config(config: &AppConfig) -> Result<Self, BuildError> {
        let upstream = HttpUpstream::new(
            Duration::from_millis(config.official_timeout_ms),
            config.official_proxy_key.as_deref(),
        )?;
        let endpoints = Endpoints::new(&config.official_base_url, &config.lookup_url)?;
        let settings = FetchSettings {
            per_game_retry: RetryPolicy::linear(
                config.official_max_attempts,
                Duration::from_millis(config.official_backoff_ms),
            ),
            batch_size: config.official_batch_size,
        };
        let cache = ResultCache::new(Duration::from_millis(config.results_ttl_ms));
        Ok(Self::new(
            TieredFetcher::new(Arc::new(upstream), endpoints, settings),
            Arc::new(cache),
        ))
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Returns the cached entry while fresh, otherwise runs the tiers and
    /// stores the outcome. `force` skips the cache read; the previous entry
    /// is only replaced once the forced fetch succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ResultsUnavailable`] when a fetch was needed and every tier
    /// failed. The cache is left untouched in that case.
    pub async fn official_results(
        &self,
        force: bool,
    ) -> Result<Arc<CacheEntry>, ResultsUnavailable> {
        if !force {
            if let Some(entry) = self.fresh_entry() {
                tracing::debug!(source = %entry.source, "official results cache hit");
                return Ok(entry);
            }
        }

        let _guard = self.refresh.lock().await;
        if !force {
            if let Some(entry) = self.fresh_entry() {
                tracing::debug!(source = %entry.source, "official results filled while waiting");
                return Ok(entry);
            }
        }

        let fetched = self.fetcher.fetch().await?;
        Ok(self
            .cache
            .store(fetched.results, fetched.source, fetched.diagnostics))
    }

    fn fresh_entry(&self) -> Option<Arc<CacheEntry>> {
        match self.cache.get() {
            (Some(entry), true) => Some(entry),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cache::Clock;
    use crate::testutils::{
        full_home_payload, game_payload, home_entry, FakeUpstream, ManualClock, Reply,
    };

    const BASE: &str = "http://official.test/api";
    const LOOKUP: &str = "http://lookup.test/v1/latest";
    const HOME: &str = "/api/home/ultimos-resultados";
    const LOOKUP_PATH: &str = "/v1/latest";

    fn game_path(game: GameId) -> String {
        format!("/api/{}", game.official_slug())
    }

    fn settings() -> FetchSettings {
        FetchSettings {
            per_game_retry: RetryPolicy::linear(2, Duration::from_millis(1)),
            batch_size: 3,
        }
    }

    fn fetcher(upstream: &Arc<FakeUpstream>) -> TieredFetcher {
        TieredFetcher::new(
            Arc::clone(upstream) as Arc<dyn Upstream>,
            Endpoints::new(BASE, LOOKUP).unwrap(),
            settings(),
        )
    }

    fn service(upstream: &Arc<FakeUpstream>, clock: &Arc<ManualClock>) -> OfficialResultsService {
        let cache = ResultCache::with_clock(
            Duration::from_secs(120),
            Arc::clone(clock) as Arc<dyn Clock>,
        );
        OfficialResultsService::new(fetcher(upstream), Arc::new(cache))
    }

    fn per_game_calls(upstream: &FakeUpstream) -> usize {
        GameId::ALL
            .iter()
            .map(|game| upstream.calls(&game_path(*game)))
            .sum()
    }

    #[test]
    fn endpoints_derive_from_base() {
        let endpoints = Endpoints::new("https://host/api/", LOOKUP).unwrap();
        assert_eq!(
            endpoints.home().as_str(),
            "https://host/api/home/ultimos-resultados"
        );
        assert_eq!(
            endpoints.game(GameId::Milionaria).unwrap().as_str(),
            "https://host/api/maismilionaria"
        );
        assert_eq!(endpoints.lookup().as_str(), LOOKUP);
    }

    #[test]
    fn endpoints_reject_garbage_base() {
        assert!(matches!(
            Endpoints::new("not a url", LOOKUP),
            Err(BuildError::Endpoint { .. })
        ));
    }

    #[tokio::test]
    async fn home_success_short_circuits_other_tiers() {
        let upstream = Arc::new(FakeUpstream::new().reply(HOME, Reply::Json(full_home_payload())));
        let fetched = fetcher(&upstream).fetch().await.unwrap();

        assert_eq!(fetched.source, Tier::Home);
        assert_eq!(fetched.results.len(), 10);
        assert_eq!(upstream.calls(HOME), 1);
        assert_eq!(per_game_calls(&upstream), 0);
        assert_eq!(upstream.calls(LOOKUP_PATH), 0);
        assert_eq!(
            fetched.diagnostics.tier(Tier::PerGame).unwrap().outcome,
            TierOutcome::Skipped
        );
        assert_eq!(
            fetched.diagnostics.tier(Tier::Lookup).unwrap().outcome,
            TierOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn home_with_missing_and_empty_games_yields_seven_sorted() {
        // Keys deliberately out of order; federal and super-sete missing;
        // quina present with no numbers.
        let mut payload = serde_json::Map::new();
        for game in GameId::ALL.iter().rev() {
            if matches!(game, GameId::Federal | GameId::SuperSete) {
                continue;
            }
            let entry = if *game == GameId::Quina {
                json!({ "numeroDoConcurso": 1, "dezenas": [] })
            } else {
                home_entry(1)
            };
            payload.insert(game.home_key().to_owned(), entry);
        }
        let upstream = Arc::new(FakeUpstream::new().reply(HOME, Reply::Json(json!(payload))));

        let fetched = fetcher(&upstream).fetch().await.unwrap();

        assert_eq!(fetched.results.len(), 7);
        let positions: Vec<usize> = fetched.results.iter().map(|r| r.game_id.position()).collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        assert!(fetched.results.iter().all(|r| r.game_id != GameId::Quina));
        assert_eq!(per_game_calls(&upstream), 0);
    }

    #[tokio::test]
    async fn home_failure_falls_back_to_per_game() {
        let mut fake = FakeUpstream::new().reply(HOME, Reply::Status(503));
        for game in [GameId::MegaSena, GameId::Lotofacil, GameId::Timemania] {
            fake = fake.reply(&game_path(game), Reply::Json(game_payload(10)));
        }
        let upstream = Arc::new(fake);

        let fetched = fetcher(&upstream).fetch().await.unwrap();

        assert_eq!(fetched.source, Tier::PerGame);
        assert_eq!(fetched.results.len(), 3);
        assert_eq!(upstream.calls(LOOKUP_PATH), 0);

        let home = fetched.diagnostics.tier(Tier::Home).unwrap();
        assert!(matches!(
            home.outcome,
            TierOutcome::Failed {
                code: "upstream_http_error",
                http_status: Some(503),
                ..
            }
        ));
        let per_game = fetched.diagnostics.tier(Tier::PerGame).unwrap();
        assert_eq!(per_game.game_failures.len(), 7);
        assert!(per_game.game_failures.iter().all(|f| f.status == Some(404)));
    }

    #[tokio::test]
    async fn per_game_failures_retry_once_each() {
        let upstream = Arc::new(
            FakeUpstream::new()
                .reply(HOME, Reply::Timeout)
                .reply(&game_path(GameId::Quina), Reply::Json(game_payload(1)))
                .reply(&game_path(GameId::MegaSena), Reply::Status(500)),
        );

        fetcher(&upstream).fetch().await.unwrap();

        assert_eq!(upstream.calls(&game_path(GameId::Quina)), 1);
        assert_eq!(upstream.calls(&game_path(GameId::MegaSena)), 2);
    }

    #[tokio::test]
    async fn per_game_record_without_numbers_is_retried_as_invalid() {
        let upstream = Arc::new(
            FakeUpstream::new()
                .reply(HOME, Reply::Status(500))
                .reply(&game_path(GameId::Quina), Reply::Json(json!({ "listaDezenas": [] })))
                .reply(&game_path(GameId::Lotomania), Reply::Json(game_payload(1))),
        );

        let fetched = fetcher(&upstream).fetch().await.unwrap();

        assert_eq!(upstream.calls(&game_path(GameId::Quina)), 2);
        let failures = &fetched.diagnostics.tier(Tier::PerGame).unwrap().game_failures;
        let quina = failures.iter().find(|f| f.game == GameId::Quina).unwrap();
        assert_eq!(quina.code, "invalid_payload");
    }

    #[tokio::test]
    async fn per_game_tier_never_exceeds_batch_concurrency() {
        let mut fake = FakeUpstream::new()
            .reply(HOME, Reply::Status(502))
            .with_delay(Duration::from_millis(20));
        for game in GameId::ALL {
            fake = fake.reply(&game_path(game), Reply::Json(game_payload(5)));
        }
        let upstream = Arc::new(fake);

        let fetched = fetcher(&upstream).fetch().await.unwrap();

        assert_eq!(fetched.results.len(), 10);
        assert_eq!(per_game_calls(&upstream), 10);
        assert_eq!(upstream.max_in_flight(), 3);
    }

    #[tokio::test]
    async fn lookup_runs_only_when_first_two_tiers_are_empty() {
        let mut lookup = serde_json::Map::new();
        lookup.insert(GameId::DiaDeSorte.lookup_key().to_owned(), game_payload(890));
        lookup.insert(GameId::MegaSena.lookup_key().to_owned(), game_payload(2705));
        let upstream = Arc::new(
            FakeUpstream::new()
                .reply(HOME, Reply::Json(json!({})))
                .reply(LOOKUP_PATH, Reply::Json(json!(lookup))),
        );

        let fetched = fetcher(&upstream).fetch().await.unwrap();

        assert_eq!(fetched.source, Tier::Lookup);
        assert_eq!(fetched.results[0].game_id, GameId::MegaSena);
        assert_eq!(fetched.results[1].game_id, GameId::DiaDeSorte);
        assert_eq!(per_game_calls(&upstream), 20);
    }

    #[tokio::test]
    async fn total_failure_carries_every_tier_reason() {
        let upstream = Arc::new(
            FakeUpstream::new()
                .reply(HOME, Reply::Timeout)
                .reply(LOOKUP_PATH, Reply::Json(json!(["not", "an", "object"]))),
        );

        let err = fetcher(&upstream).fetch().await.unwrap_err();

        let codes: Vec<(Tier, &str)> = err
            .diagnostics
            .reports()
            .iter()
            .map(|report| match &report.outcome {
                TierOutcome::Failed { code, .. } => (report.tier, *code),
                other => panic!("unexpected outcome {other:?}"),
            })
            .collect();
        assert_eq!(
            codes,
            vec![
                (Tier::Home, "timeout"),
                (Tier::PerGame, "empty_result"),
                (Tier::Lookup, "invalid_payload"),
            ]
        );
        let message = err.to_string();
        assert!(message.contains("caixa_home=timeout"), "{message}");
        assert!(message.contains("lottolookup=invalid_payload"), "{message}");
    }

    #[tokio::test]
    async fn cached_read_within_ttl_is_identical_and_fetches_once() {
        let upstream = Arc::new(FakeUpstream::new().reply(HOME, Reply::Json(full_home_payload())));
        let clock = Arc::new(ManualClock::new());
        let service = service(&upstream, &clock);

        let first = service.official_results(false).await.unwrap();
        clock.advance(Duration::from_secs(60));
        let second = service.official_results(false).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            serde_json::to_string(&first.results).unwrap(),
            serde_json::to_string(&second.results).unwrap()
        );
        assert_eq!(upstream.total_calls(), 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_new_fetch() {
        let upstream = Arc::new(FakeUpstream::new().reply(HOME, Reply::Json(full_home_payload())));
        let clock = Arc::new(ManualClock::new());
        let service = service(&upstream, &clock);

        service.official_results(false).await.unwrap();
        clock.advance(Duration::from_secs(121));
        service.official_results(false).await.unwrap();

        assert_eq!(upstream.calls(HOME), 2);
    }

    #[tokio::test]
    async fn forced_refresh_always_fetches_and_replaces_entry() {
        let upstream = Arc::new(FakeUpstream::new().reply(HOME, Reply::Json(full_home_payload())));
        let clock = Arc::new(ManualClock::new());
        let service = service(&upstream, &clock);

        let first = service.official_results(false).await.unwrap();
        let forced = service.official_results(true).await.unwrap();

        assert_eq!(upstream.calls(HOME), 2);
        assert!(!Arc::ptr_eq(&first, &forced));
        let cached = service.cache().get().0.unwrap();
        assert!(Arc::ptr_eq(&cached, &forced));
    }

    #[tokio::test]
    async fn failed_forced_refresh_keeps_the_fresh_entry() {
        let healthy = Arc::new(FakeUpstream::new().reply(HOME, Reply::Json(full_home_payload())));
        let dead = Arc::new(FakeUpstream::new());
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(ResultCache::with_clock(
            Duration::from_secs(120),
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));
        let warm = OfficialResultsService::new(fetcher(&healthy), Arc::clone(&cache));
        let outage = OfficialResultsService::new(fetcher(&dead), Arc::clone(&cache));

        let first = warm.official_results(false).await.unwrap();
        assert!(outage.official_results(true).await.is_err());

        let (cached, hit) = cache.get();
        assert!(hit);
        assert!(Arc::ptr_eq(&cached.unwrap(), &first));
        let after = outage.official_results(false).await.unwrap();
        assert!(Arc::ptr_eq(&after, &first));
        assert_eq!(dead.calls(HOME), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_fetch() {
        let upstream = Arc::new(
            FakeUpstream::new()
                .reply(HOME, Reply::Json(full_home_payload()))
                .with_delay(Duration::from_millis(20)),
        );
        let clock = Arc::new(ManualClock::new());
        let service = service(&upstream, &clock);

        let (a, b) = tokio::join!(service.official_results(false), service.official_results(false));

        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(upstream.calls(HOME), 1);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_cache_empty() {
        let upstream = Arc::new(FakeUpstream::new());
        let clock = Arc::new(ManualClock::new());
        let service = service(&upstream, &clock);

        assert!(service.official_results(false).await.is_err());
        assert!(service.cache().get().0.is_none());
    }
}
