//! Heuristic scorer
//!
//! A cheap 0-10 signal built from three bounded terms:
//!
//! | term        | formula                                   | cap |
//! |-------------|-------------------------------------------|-----|
//! | affiliation | 2.0 per matched watch-list keyword        | 4.0 |
//! | reputation  | max author h-index / 60 * 4               | 4.0 |
//! | citations   | ln(1 + n) / ln(101) * 2, zero when n == 0 | 2.0 |

use std::collections::HashSet;

const AFFILIATION_POINTS_PER_KEYWORD: f64 = 2.0;
const AFFILIATION_CAP: f64 = 4.0;
const REPUTATION_SCALE: f64 = 60.0;
const REPUTATION_CAP: f64 = 4.0;
const CITATION_CAP: f64 = 2.0;
const MAX_SCORE: f64 = 10.0;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute the heuristic score for one paper.
///
/// Negative inputs count as zero. The result is in `[0, 10]`, rounded to two
/// decimals, and non-decreasing in every input.
pub fn compute_heuristic(
    matched_keywords: &HashSet<String>,
    max_h_index: Option<i64>,
    citation_count: i64,
) -> f64 {
    let affiliation =
        (matched_keywords.len() as f64 * AFFILIATION_POINTS_PER_KEYWORD).min(AFFILIATION_CAP);

    let h_index = max_h_index.unwrap_or(0).max(0) as f64;
    let reputation = (h_index / REPUTATION_SCALE * REPUTATION_CAP).min(REPUTATION_CAP);

    let citations = citation_count.max(0);
    let citation = if citations == 0 {
        0.0
    } else {
        ((1.0 + citations as f64).ln() / 101f64.ln() * CITATION_CAP).min(CITATION_CAP)
    };

    round2((affiliation + reputation + citation).clamp(0.0, MAX_SCORE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_inputs_score_zero() {
        assert_eq!(compute_heuristic(&HashSet::new(), None, 0), 0.0);
    }

    #[test]
    fn test_all_terms_saturate() {
        assert_eq!(compute_heuristic(&keywords(&["k1", "k2", "k3"]), Some(100), 10_000), 10.0);
    }

    #[test]
    fn test_affiliation_term_caps_at_four() {
        assert_eq!(compute_heuristic(&keywords(&["A", "B", "C", "D", "E"]), Some(0), 0), 4.0);
        assert_eq!(compute_heuristic(&keywords(&["A"]), None, 0), 2.0);
    }

    #[test]
    fn test_reputation_and_citation_terms() {
        assert_eq!(compute_heuristic(&HashSet::new(), Some(30), 0), 2.0);
        assert_eq!(compute_heuristic(&HashSet::new(), Some(60), 0), 4.0);
        // ln(101)/ln(101) * 2
        assert_eq!(compute_heuristic(&HashSet::new(), None, 100), 2.0);
        assert_eq!(compute_heuristic(&HashSet::new(), None, 1), 0.3);
    }

    #[test]
    fn test_negative_inputs_count_as_zero() {
        assert_eq!(compute_heuristic(&HashSet::new(), Some(-20), -5), 0.0);
    }

    #[test]
    fn test_bounded_and_monotone() {
        let sets = [
            keywords(&[]),
            keywords(&["a"]),
            keywords(&["a", "b"]),
            keywords(&["a", "b", "c"]),
        ];
        let h_values = [None, Some(0), Some(5), Some(30), Some(59), Some(60), Some(500)];
        let citations = [0, 1, 2, 10, 99, 100, 101, 100_000];

        for (si, set) in sets.iter().enumerate() {
            for (hi, h) in h_values.iter().enumerate() {
                for (ci, &c) in citations.iter().enumerate() {
                    let score = compute_heuristic(set, *h, c);
                    assert!((0.0..=10.0).contains(&score));

                    if si + 1 < sets.len() {
                        assert!(compute_heuristic(&sets[si + 1], *h, c) >= score);
                    }
                    if hi + 1 < h_values.len() {
                        assert!(compute_heuristic(set, h_values[hi + 1], c) >= score);
                    }
                    if ci + 1 < citations.len() {
                        assert!(compute_heuristic(set, *h, citations[ci + 1]) >= score);
                    }
                }
            }
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.236), 1.24);
        assert_eq!(round2(0.4 * 7.5), 3.0);
    }
}
