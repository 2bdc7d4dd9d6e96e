use serde::{Deserialize, Serialize};

use crate::games::GameId;

/// One game's latest draw, normalised from whichever upstream supplied it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalResult {
    pub game_id: GameId,
    pub contest_number: String,
    /// Upstream draw date, passed through as-is.
    pub date: String,
    pub numbers: Vec<i64>,
    /// Clover numbers (+Milionária) or the lucky month as 1-12 (Dia de Sorte).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_numbers: Option<Vec<i64>>,
    /// Team name tied to the draw (Timemania).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_string: Option<String>,
    pub accumulated: bool,
    pub next_prize: String,
    pub next_date: String,
}

impl CanonicalResult {
    /// A result without drawn numbers is never cached or returned.
    pub fn is_valid(&self) -> bool {
        !self.numbers.is_empty()
    }
}

/// Drops every record that fails [`CanonicalResult::is_valid`].
pub fn retain_valid(results: Vec<CanonicalResult>) -> Vec<CanonicalResult> {
    results.into_iter().filter(CanonicalResult::is_valid).collect()
}

/// Sorts by the fixed game ordering. Stable, so duplicates keep arrival order.
pub fn sort_by_game_order(results: &mut [CanonicalResult]) {
    results.sort_by_key(|result| result.game_id.position());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(game_id: GameId, numbers: Vec<i64>) -> CanonicalResult {
        CanonicalResult {
            game_id,
            contest_number: "1".to_string(),
            date: "01/01/2025".to_string(),
            numbers,
            special_numbers: None,
            extra_string: None,
            accumulated: false,
            next_prize: "R$ 0,00".to_string(),
            next_date: String::new(),
        }
    }

    #[test]
    fn serializes_with_camel_case_and_omits_absent_extras() {
        let json = serde_json::to_value(result(GameId::MegaSena, vec![1, 2])).unwrap();
        assert_eq!(json["gameId"], "mega-sena");
        assert_eq!(json["contestNumber"], "1");
        assert_eq!(json["nextPrize"], "R$ 0,00");
        assert!(json.get("specialNumbers").is_none());
        assert!(json.get("extraString").is_none());
    }

    #[test]
    fn retain_valid_drops_empty_numbers() {
        let kept = retain_valid(vec![
            result(GameId::Quina, vec![]),
            result(GameId::Federal, vec![1]),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].game_id, GameId::Federal);
    }

    #[test]
    fn sort_by_game_order_ignores_arrival_order() {
        let mut results = vec![
            result(GameId::Federal, vec![1]),
            result(GameId::MegaSena, vec![1]),
            result(GameId::DiaDeSorte, vec![1]),
        ];
        sort_by_game_order(&mut results);
        let ids: Vec<_> = results.iter().map(|r| r.game_id).collect();
        assert_eq!(
            ids,
            vec![GameId::MegaSena, GameId::DiaDeSorte, GameId::Federal]
        );
    }
}
