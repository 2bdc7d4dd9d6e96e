//! In-process TTL cache holding the last successful result set.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use loterias_core::CanonicalResult;
use parking_lot::RwLock;

use crate::diagnostics::{FetchDiagnostics, Tier};

/// Monotonic time source, injectable so tests can move time forward.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A complete, immutable snapshot of one successful fetch.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub results: Vec<CanonicalResult>,
    pub source: Tier,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: Instant,
    pub diagnostics: FetchDiagnostics,
}

/// Single-slot cache. Entries are swapped whole behind an `Arc`, so a reader
/// holds either the previous entry or the new one.
pub struct ResultCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: RwLock<Option<Arc<CacheEntry>>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the current entry and whether it is still fresh.
    ///
    /// An expired entry is still returned (with `hit == false`) so callers can
    /// inspect it; expiry is only checked here, never swept.
    pub fn get(&self) -> (Option<Arc<CacheEntry>>, bool) {
        let entry = self.slot.read().clone();
        let hit = entry
            .as_ref()
            .is_some_and(|entry| self.clock.now() < entry.expires_at);
        (entry, hit)
    }

    /// Replaces the entry atomically.
    pub fn set(&self, entry: CacheEntry) -> Arc<CacheEntry> {
        let entry = Arc::new(entry);
        *self.slot.write() = Some(Arc::clone(&entry));
        entry
    }

    /// Builds an entry expiring one TTL from now and stores it.
    pub fn store(
        &self,
        results: Vec<CanonicalResult>,
        source: Tier,
        diagnostics: FetchDiagnostics,
    ) -> Arc<CacheEntry> {
        self.set(CacheEntry {
            results,
            source,
            fetched_at: Utc::now(),
            expires_at: self.clock.now() + self.ttl,
            diagnostics,
        })
    }

    pub fn force_invalidate(&self) {
        *self.slot.write() = None;
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("ttl", &self.ttl)
            .field("populated", &self.slot.read().is_some())
            .finish_non_exhaustive()
    }
}
