//! Tolerant decoding of result lists returned by the intermediate service.

use loterias_core::{retain_valid, CanonicalResult};
use serde_json::Value;

/// Accepts either a bare array or an object with a `results` array. Each
/// element is decoded on its own; malformed ones and ones without drawn
/// numbers are dropped.
///
/// Returns `None` when the payload has neither shape.
pub fn extract_results(payload: &Value) -> Option<Vec<CanonicalResult>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(map) => map.get("results")?.as_array()?,
        _ => return None,
    };

    let mut dropped = 0usize;
    let decoded: Vec<CanonicalResult> = items
        .iter()
        .filter_map(|item| {
            let parsed = serde_json::from_value::<CanonicalResult>(item.clone()).ok();
            if parsed.is_none() {
                dropped += 1;
            }
            parsed
        })
        .collect();
    if dropped > 0 {
        tracing::debug!(dropped, "discarded malformed result entries");
    }
    Some(retain_valid(decoded))
}

/// The `source` string of an object payload, if any.
pub fn payload_source(payload: &Value) -> Option<&str> {
    payload.get("source").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use loterias_core::GameId;
    use serde_json::json;

    use super::*;

    fn entry(game: &str, numbers: &Value) -> Value {
        json!({
            "gameId": game,
            "contestNumber": "1",
            "date": "01/01/2025",
            "numbers": numbers,
            "accumulated": false,
            "nextPrize": "R$ 0,00",
            "nextDate": ""
        })
    }

    #[test]
    fn accepts_bare_array() {
        let payload = json!([entry("quina", &json!([1, 2]))]);
        let results = extract_results(&payload).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].game_id, GameId::Quina);
    }

    #[test]
    fn accepts_results_envelope() {
        let payload = json!({ "source": "caixa_home", "results": [entry("mega-sena", &json!([4]))] });
        assert_eq!(extract_results(&payload).unwrap().len(), 1);
        assert_eq!(payload_source(&payload), Some("caixa_home"));
    }

    #[test]
    fn drops_invalid_elements_independently() {
        let payload = json!([
            entry("quina", &json!([1])),
            entry("unknown-game", &json!([1])),
            entry("lotofacil", &json!([])),
            { "gameId": "quina" },
            "garbage"
        ]);
        let results = extract_results(&payload).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(extract_results(&json!({ "error": "official_results_unavailable" })).is_none());
        assert!(extract_results(&json!({ "results": "nope" })).is_none());
        assert!(extract_results(&json!("text")).is_none());
    }
}
