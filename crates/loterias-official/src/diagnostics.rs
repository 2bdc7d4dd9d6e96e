//! Per-fetch record of what each tier did.
//!
//! A [`DiagnosticsBuilder`] is owned by one fetch cycle and appended to as tiers
//! run; [`DiagnosticsBuilder::finish`] freezes it into a [`FetchDiagnostics`]
//! that is attached to the cache entry and never mutated again.

use std::fmt;

use loterias_core::GameId;
use serde::Serialize;

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Home,
    PerGame,
    Lookup,
}

impl Tier {
    pub const ORDER: [Tier; 3] = [Tier::Home, Tier::PerGame, Tier::Lookup];

    /// Coarse provider tag exposed to callers as `source`.
    pub fn source_tag(self) -> &'static str {
        match self {
            Tier::Home => "caixa_home",
            Tier::PerGame => "caixa_games",
            Tier::Lookup => "lottolookup",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TierOutcome {
    Succeeded {
        records: usize,
    },
    Failed {
        code: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        http_status: Option<u16>,
        #[serde(skip_serializing_if = "Option::is_none")]
        preview: Option<String>,
        message: String,
    },
    /// An earlier tier already produced records.
    Skipped,
}

impl TierOutcome {
    pub fn failed(err: &FetchError) -> Self {
        TierOutcome::Failed {
            code: err.code(),
            http_status: err.status(),
            preview: err.body_preview().map(ToOwned::to_owned),
            message: err.to_string(),
        }
    }
}

/// One game's failure inside the per-game tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameFailure {
    pub game: GameId,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl GameFailure {
    pub fn new(game: GameId, err: &FetchError) -> Self {
        Self {
            game,
            code: err.code(),
            status: err.status(),
            preview: err.body_preview().map(ToOwned::to_owned),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierReport {
    pub tier: Tier,
    pub outcome: TierOutcome,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub game_failures: Vec<GameFailure>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Default)]
pub struct DiagnosticsBuilder {
    reports: Vec<TierReport>,
}

impl DiagnosticsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn record(mut self, report: TierReport) -> Self {
        self.reports.push(report);
        self
    }

    pub fn finish(self) -> FetchDiagnostics {
        FetchDiagnostics {
            reports: self.reports,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchDiagnostics {
    reports: Vec<TierReport>,
}

impl FetchDiagnostics {
    pub fn reports(&self) -> &[TierReport] {
        &self.reports
    }

    pub fn tier(&self, tier: Tier) -> Option<&TierReport> {
        self.reports.iter().find(|report| report.tier == tier)
    }

    /// One-line `tier=outcome` summary, e.g.
    /// `caixa_home=timeout; caixa_games=empty_result(10 games failed); lottolookup=upstream_http_error`.
    pub fn summary(&self) -> String {
        self.reports
            .iter()
            .map(|report| {
                let outcome = match &report.outcome {
                    TierOutcome::Succeeded { records } => format!("ok({records})"),
                    TierOutcome::Failed { code, .. } if !report.game_failures.is_empty() => {
                        format!("{code}({} games failed)", report.game_failures.len())
                    }
                    TierOutcome::Failed { code, .. } => (*code).to_owned(),
                    TierOutcome::Skipped => "skipped".to_owned(),
                };
                format!("{}={outcome}", report.tier)
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}
