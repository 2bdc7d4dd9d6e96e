//! Official draw-results acquisition pipeline.
//!
//! Three upstream tiers (aggregate feed, per-game endpoints, third-party
//! lookup) are tried in order until one yields usable records. Results are
//! mapped into [`CanonicalResult`](loterias_core::CanonicalResult), sorted by
//! the fixed game order, and cached in-process.

pub mod cache;
pub mod diagnostics;
pub mod error;
pub mod fetcher;
pub mod mapper;
pub mod retry;
pub mod transport;

#[cfg(test)]
mod testutils;

pub use cache::{CacheEntry, Clock, ResultCache, SystemClock};
pub use diagnostics::{DiagnosticsBuilder, FetchDiagnostics, GameFailure, Tier, TierOutcome, TierReport};
pub use error::{BuildError, FetchError, ResultsUnavailable};
pub use fetcher::{
    fetch_aggregate, Endpoints, FetchSettings, FetchedResults, OfficialResultsService,
    TieredFetcher,
};
pub use mapper::{
    format_brl, map_game_record, map_home_record, map_lookup_record, month_name_to_number,
    parse_numeric_list,
};
pub use retry::{Backoff, RetryPolicy};
pub use transport::{HttpUpstream, Upstream};
