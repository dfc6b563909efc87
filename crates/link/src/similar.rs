//! Bounded name-similarity scoring.

use crate::normalize::normalize;

/// A fuzzy match is accepted only if its score strictly exceeds this.
pub const MATCH_CUTOFF: u8 = 70;

/// Symmetric similarity between two school names, 0..=100.
/// 100 means identical after normalization.
pub fn score(a: &str, b: &str) -> u8 {
    let na = normalize(a);
    let nb = normalize(b);
    (strsim::normalized_levenshtein(&na, &nb) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_names_score_100() {
        assert_eq!(score("Central", "Central"), 100);
    }

    #[test]
    fn identical_after_normalization() {
        assert_eq!(score("Central High School", "CENTRAL"), 100);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            ("Central High School", "Centrol HS"),
            ("Boulder Academy", "Boulder Prep"),
            ("", "anything"),
            ("a", "b"),
        ];
        for (a, b) in pairs {
            assert_eq!(score(a, b), score(b, a), "asymmetric for {a:?} / {b:?}");
        }
    }

    #[test]
    fn bounded() {
        for (a, b) in [("x", "completely different"), ("", ""), ("same", "same")] {
            let s = score(a, b);
            assert!(s <= 100, "score {s} out of range");
        }
    }

    #[test]
    fn near_miss_scores_high() {
        assert!(score("Central High School", "Centrel High School") > MATCH_CUTOFF);
    }

    #[test]
    fn unrelated_scores_low() {
        assert!(score("Central High School", "Pacific Coast Maritime Institute") < MATCH_CUTOFF);
    }
}
