use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use loterias_core::GameId;
use parking_lot::Mutex;
use serde_json::{json, Value};
use url::Url;

use crate::cache::Clock;
use crate::error::FetchError;
use crate::transport::Upstream;

/// Canned reply for one URL.
#[derive(Clone)]
pub(crate) enum Reply {
    Json(Value),
    Status(u16),
    Timeout,
}

/// In-process [`Upstream`] that serves canned replies by URL path and tracks
/// call counts and peak concurrency.
pub(crate) struct FakeUpstream {
    replies: HashMap<String, Reply>,
    delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeUpstream {
    pub(crate) fn new() -> Self {
        Self {
            replies: HashMap::new(),
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Unregistered paths answer 404.
    pub(crate) fn reply(mut self, path: &str, reply: Reply) -> Self {
        self.replies.insert(path.to_owned(), reply);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self, path: &str) -> usize {
        self.calls.lock().get(path).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for FakeUpstream {
    async fn get_json(&self, url: &Url) -> Result<Value, FetchError> {
        let path = url.path().to_owned();
        *self.calls.lock().entry(path.clone()).or_default() += 1;

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.replies.get(&path) {
            Some(Reply::Json(body)) => Ok(body.clone()),
            Some(Reply::Status(status)) => Err(FetchError::UpstreamHttp {
                status: *status,
                url: url.to_string(),
                preview: "fake failure".to_owned(),
            }),
            Some(Reply::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
            None => Err(FetchError::UpstreamHttp {
                status: 404,
                url: url.to_string(),
                preview: String::new(),
            }),
        }
    }
}

/// Clock that only moves when [`ManualClock::advance`] is called.
#[derive(Debug)]
pub(crate) struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}

/// Minimal valid draw in the per-game / lookup shape.
pub(crate) fn game_payload(contest: u32) -> Value {
    json!({
        "numero": contest,
        "dataApuracao": "01/03/2024",
        "listaDezenas": ["01", "02", "03"],
        "acumulado": false,
        "valorEstimadoProximoConcurso": 1000.0,
        "dataProximoConcurso": "02/03/2024"
    })
}

/// Minimal valid draw in the aggregate-feed shape.
pub(crate) fn home_entry(contest: u32) -> Value {
    json!({
        "numeroDoConcurso": contest,
        "dataApuracao": "01/03/2024",
        "dezenas": ["04", "05", "06"],
        "acumulado": true,
        "valorEstimadoProximoConcurso": 2500.5,
        "dataProximoConcurso": "04/03/2024"
    })
}

/// Aggregate feed containing every game.
pub(crate) fn full_home_payload() -> Value {
    let mut feed = serde_json::Map::new();
    for (idx, game) in GameId::ALL.iter().enumerate() {
        let contest = u32::try_from(idx).unwrap_or(0) + 100;
        feed.insert(game.home_key().to_owned(), home_entry(contest));
    }
    Value::Object(feed)
}
