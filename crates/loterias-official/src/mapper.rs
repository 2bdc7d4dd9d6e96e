//! Translation of upstream draw payloads into [`CanonicalResult`].
//!
//! Three upstream shapes are supported: the official aggregate ("home") feed,
//! the official per-game endpoint, and the third-party lookup feed. They share
//! one mapping routine parameterised by a [`RecordFields`] table of field
//! names, so the validity gate and the game-specific extras behave identically
//! across all of them.

use loterias_core::{CanonicalResult, GameId};
use serde_json::Value;

const MONTH_NAMES: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// Field names used by one upstream shape.
struct RecordFields {
    shape: &'static str,
    numbers: &'static str,
    /// Tried in order when `numbers` is missing or an empty array.
    numbers_fallback: &'static [&'static str],
    contest: &'static str,
    clovers: &'static str,
    lucky_month: &'static str,
    team: &'static str,
}

const HOME_FIELDS: RecordFields = RecordFields {
    shape: "home",
    numbers: "dezenas",
    numbers_fallback: &["dezenasSorteadasOrdemSorteio"],
    contest: "numeroDoConcurso",
    clovers: "trevosSorteados",
    lucky_month: "mesDaSorte",
    team: "timeDoCoracao",
};

const GAME_FIELDS: RecordFields = RecordFields {
    shape: "game",
    numbers: "listaDezenas",
    numbers_fallback: &["dezenasSorteadasOrdemSorteio"],
    contest: "numero",
    clovers: "trevosSorteados",
    lucky_month: "nomeTimeCoracaoMesSorte",
    team: "nomeTimeCoracaoMesSorte",
};

const LOOKUP_FIELDS: RecordFields = RecordFields {
    shape: "lookup",
    numbers: "listaDezenas",
    numbers_fallback: &["dezenasSorteadasOrdemSorteio", "dezenas"],
    contest: "numero",
    clovers: "trevosSorteados",
    lucky_month: "nomeTimeCoracaoMesSorte",
    team: "nomeTimeCoracaoMesSorte",
};

/// Maps one game's entry from the official aggregate feed.
pub fn map_home_record(game: GameId, raw: &Value) -> Option<CanonicalResult> {
    map_record(&HOME_FIELDS, game, raw)
}

/// Maps the body of an official per-game endpoint.
pub fn map_game_record(game: GameId, raw: &Value) -> Option<CanonicalResult> {
    map_record(&GAME_FIELDS, game, raw)
}

/// Maps one game's entry from the third-party lookup feed.
pub fn map_lookup_record(game: GameId, raw: &Value) -> Option<CanonicalResult> {
    map_record(&LOOKUP_FIELDS, game, raw)
}

fn map_record(fields: &RecordFields, game: GameId, raw: &Value) -> Option<CanonicalResult> {
    let source = std::iter::once(fields.numbers)
        .chain(fields.numbers_fallback.iter().copied())
        .filter_map(|field| raw.get(field).and_then(Value::as_array))
        .find(|values| !values.is_empty());

    let (numbers, discarded) = source.map_or_else(|| (Vec::new(), 0), |v| parse_numeric_entries(v));
    if discarded > 0 {
        tracing::debug!(
            game = %game,
            shape = fields.shape,
            discarded,
            "dropped non-numeric draw entries"
        );
    }
    if numbers.is_empty() {
        return None;
    }

    let mut special_numbers = None;
    let mut extra_string = None;

    match game {
        GameId::Milionaria => {
            let clovers = raw
                .get(fields.clovers)
                .and_then(Value::as_array)
                .map(|v| parse_numeric_list(v))
                .unwrap_or_default();
            if !clovers.is_empty() {
                special_numbers = Some(clovers);
            }
        }
        GameId::DiaDeSorte => {
            special_numbers = raw
                .get(fields.lucky_month)
                .and_then(Value::as_str)
                .and_then(month_name_to_number)
                .map(|month| vec![i64::from(month)]);
        }
        GameId::Timemania => {
            extra_string = raw
                .get(fields.team)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|team| !team.is_empty())
                .map(ToOwned::to_owned);
        }
        _ => {}
    }

    Some(CanonicalResult {
        game_id: game,
        contest_number: contest_number(raw.get(fields.contest)),
        date: string_field(raw, "dataApuracao"),
        numbers,
        special_numbers,
        extra_string,
        accumulated: raw.get("acumulado").is_some_and(is_truthy),
        next_prize: format_brl(raw.get("valorEstimadoProximoConcurso").map_or(0.0, coerce_amount)),
        next_date: string_field(raw, "dataProximoConcurso"),
    })
}

/// Parses each entry as a base-10 integer, skipping anything non-numeric.
///
/// Strings are read like a lenient integer parser: leading whitespace and sign
/// are accepted and parsing stops at the first non-digit (`"07"` → 7,
/// `"12a"` → 12, `"x1"` → skipped).
pub fn parse_numeric_list(values: &[Value]) -> Vec<i64> {
    parse_numeric_entries(values).0
}

fn parse_numeric_entries(values: &[Value]) -> (Vec<i64>, usize) {
    let mut numbers = Vec::with_capacity(values.len());
    let mut discarded = 0;
    for value in values {
        match parse_integer(value) {
            Some(n) => numbers.push(n),
            None => discarded += 1,
        }
    }
    (numbers, discarded)
}

#[allow(clippy::cast_possible_truncation)]
fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_integer_prefix(s),
        _ => None,
    }
}

fn parse_integer_prefix(s: &str) -> Option<i64> {
    let trimmed = s.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let magnitude: i64 = rest[..digits_end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Resolves a Portuguese month name (case-insensitive) to 1-12.
pub fn month_name_to_number(name: &str) -> Option<u8> {
    let normalized = name.trim().to_lowercase();
    MONTH_NAMES
        .iter()
        .position(|month| *month == normalized)
        .and_then(|idx| u8::try_from(idx + 1).ok())
}

/// Formats an amount as Brazilian reais, e.g. `R$ 1.234.567,89`.
///
/// Non-finite input is formatted as zero.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_brl(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let cents = (amount.abs() * 100.0).round() as u64;
    let integer = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}R$ {grouped},{fraction:02}")
}

/// Loose numeric coercion: numbers pass through, numeric strings are parsed,
/// `true` is 1, everything else is NaN (and thus formats as zero).
fn coerce_amount(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        _ => f64::NAN,
    }
}

fn contest_number(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn string_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .unwrap_or_default()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
