//! Fuzzy dish matching over a cached or freshly extracted dish list.

use crate::domain::model::{Dish, MatchResult};

/// Matches below this confidence are reported as "not found". The raw
/// confidence still rides along for diagnostics.
pub const CONFIDENCE_FLOOR: f64 = 0.4;

/// Token-order-insensitive similarity in [0, 100]: both names are
/// lower-cased, whitespace-tokenized and sorted before comparing, so
/// "salad caesar" scores like "caesar salad".
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&token_sorted(a), &token_sorted(b)) * 100.0
}

fn token_sorted(s: &str) -> String {
    let lowered = s.to_lowercase();
    let mut tokens: Vec<&str> = lowered.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Score the query against every candidate and keep the best. Stable scan:
/// on a tie the first-encountered candidate wins.
pub fn find_best_match(dish_name: &str, dishes: &[Dish]) -> MatchResult {
    let mut best: Option<&Dish> = None;
    let mut best_score = 0.0f64;

    for dish in dishes {
        let score = similarity(dish_name, &dish.name);
        if score > best_score {
            best_score = score;
            best = Some(dish);
        }
    }

    let confidence = best_score / 100.0;
    if confidence < CONFIDENCE_FLOOR {
        return MatchResult {
            dish: None,
            confidence,
        };
    }

    MatchResult {
        dish: best.cloned(),
        confidence,
    }
}
