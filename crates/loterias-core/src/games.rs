//! Closed registry of the supported lottery games.
//!
//! Each upstream provider addresses games with its own key-space. The three
//! tables below are exhaustive `match`es over [`GameId`], so adding a variant
//! fails to compile until every provider mapping is filled in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable identifier of a supported game.
///
/// Declaration order is the display order used to sort result lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameId {
    MegaSena,
    Lotofacil,
    Quina,
    Lotomania,
    Timemania,
    DuplaSena,
    DiaDeSorte,
    SuperSete,
    Milionaria,
    Federal,
}

impl GameId {
    /// Every game, in display order.
    pub const ALL: [GameId; 10] = [
        GameId::MegaSena,
        GameId::Lotofacil,
        GameId::Quina,
        GameId::Lotomania,
        GameId::Timemania,
        GameId::DuplaSena,
        GameId::DiaDeSorte,
        GameId::SuperSete,
        GameId::Milionaria,
        GameId::Federal,
    ];

    /// The identifier used on the wire (`"mega-sena"`, `"dia-de-sorte"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            GameId::MegaSena => "mega-sena",
            GameId::Lotofacil => "lotofacil",
            GameId::Quina => "quina",
            GameId::Lotomania => "lotomania",
            GameId::Timemania => "timemania",
            GameId::DuplaSena => "dupla-sena",
            GameId::DiaDeSorte => "dia-de-sorte",
            GameId::SuperSete => "super-sete",
            GameId::Milionaria => "milionaria",
            GameId::Federal => "federal",
        }
    }

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            GameId::MegaSena => "Mega-Sena",
            GameId::Lotofacil => "Lotofácil",
            GameId::Quina => "Quina",
            GameId::Lotomania => "Lotomania",
            GameId::Timemania => "Timemania",
            GameId::DuplaSena => "Dupla Sena",
            GameId::DiaDeSorte => "Dia de Sorte",
            GameId::SuperSete => "Super Sete",
            GameId::Milionaria => "+Milionária",
            GameId::Federal => "Loteria Federal",
        }
    }

    /// Position in the fixed result ordering.
    pub fn position(self) -> usize {
        match self {
            GameId::MegaSena => 0,
            GameId::Lotofacil => 1,
            GameId::Quina => 2,
            GameId::Lotomania => 3,
            GameId::Timemania => 4,
            GameId::DuplaSena => 5,
            GameId::DiaDeSorte => 6,
            GameId::SuperSete => 7,
            GameId::Milionaria => 8,
            GameId::Federal => 9,
        }
    }

    /// Path segment of the official per-game endpoint (`{base}/{slug}`).
    pub fn official_slug(self) -> &'static str {
        match self {
            GameId::MegaSena => "megasena",
            GameId::Lotofacil => "lotofacil",
            GameId::Quina => "quina",
            GameId::Lotomania => "lotomania",
            GameId::Timemania => "timemania",
            GameId::DuplaSena => "duplasena",
            GameId::DiaDeSorte => "diadesorte",
            GameId::SuperSete => "supersete",
            GameId::Milionaria => "maismilionaria",
            GameId::Federal => "federal",
        }
    }

    /// Object key inside the official aggregate ("home") feed.
    pub fn home_key(self) -> &'static str {
        match self {
            GameId::MegaSena => "megasena",
            GameId::Lotofacil => "lotofacil",
            GameId::Quina => "quina",
            GameId::Lotomania => "lotomania",
            GameId::Timemania => "timemania",
            GameId::DuplaSena => "duplasena",
            GameId::DiaDeSorte => "diaDeSorte",
            GameId::SuperSete => "superSete",
            GameId::Milionaria => "maisMilionaria",
            GameId::Federal => "federal",
        }
    }

    /// Object key inside the third-party lookup feed.
    pub fn lookup_key(self) -> &'static str {
        match self {
            GameId::MegaSena => "megasena",
            GameId::Lotofacil => "lotofacil",
            GameId::Quina => "quina",
            GameId::Lotomania => "lotomania",
            GameId::Timemania => "timemania",
            GameId::DuplaSena => "duplasena",
            GameId::DiaDeSorte => "diadesorte",
            GameId::SuperSete => "supersete",
            GameId::Milionaria => "maismilionaria",
            GameId::Federal => "federal",
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game id: {0}")]
pub struct UnknownGame(pub String);

impl FromStr for GameId {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameId::ALL
            .into_iter()
            .find(|game| game.as_str() == s)
            .ok_or_else(|| UnknownGame(s.to_owned()))
    }
}
