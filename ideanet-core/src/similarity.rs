//! Local similarity estimation
//!
//! Pairwise Jaccard similarity over token sets, used as the fallback
//! when the remote AI scorer is unavailable or returns nothing. Pure
//! and deterministic: same texts in the same order, same output.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Estimated relatedness of two idea texts, by index into the input.
///
/// Always `i < j`; never self-pairs. Scores are in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityPair {
    pub i: usize,
    pub j: usize,
    pub score: f64,
}

/// Lowercase, split on runs of non-word characters (word = alphanumeric
/// or `_`), dedupe. Duplicate tokens within one text carry no weight.
fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Score every unordered pair of texts by token overlap.
///
/// Jaccard similarity: `|intersection| / |union|`. An empty union (both
/// texts tokenize to nothing) counts as size 1, yielding a score of 0
/// rather than a division by zero. Output is sorted by descending
/// score; ties carry no guaranteed relative order.
///
/// Returns empty for fewer than two texts.
pub fn estimate_similarities<S: AsRef<str>>(texts: &[S]) -> Vec<SimilarityPair> {
    if texts.len() < 2 {
        return Vec::new();
    }

    let sets: Vec<BTreeSet<String>> = texts.iter().map(|t| tokenize(t.as_ref())).collect();

    let mut pairs = Vec::with_capacity(sets.len() * (sets.len() - 1) / 2);
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            let intersection = sets[i].intersection(&sets[j]).count();
            let union = sets[i].union(&sets[j]).count().max(1);
            pairs.push(SimilarityPair {
                i,
                j,
                score: intersection as f64 / union as f64,
            });
        }
    }

    pairs.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fewer_than_two_texts_is_empty() {
        assert!(estimate_similarities::<&str>(&[]).is_empty());
        assert!(estimate_similarities(&["run 5k"]).is_empty());
    }

    #[test]
    fn shared_token_scores_by_jaccard() {
        // {run, 5k} vs {run, a, mile}: intersection 1, union 4
        let pairs = estimate_similarities(&["run 5k", "run a mile"]);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].i, 0);
        assert_eq!(pairs[0].j, 1);
        assert_eq!(pairs[0].score, 0.25);
    }

    #[test]
    fn identical_texts_score_one() {
        let pairs = estimate_similarities(&["learn rust", "learn rust"]);
        assert_eq!(pairs[0].score, 1.0);
    }

    #[test]
    fn empty_texts_score_zero_not_nan() {
        let pairs = estimate_similarities(&["", ""]);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].score, 0.0);
    }

    #[test]
    fn punctuation_only_text_tokenizes_to_nothing() {
        let pairs = estimate_similarities(&["...!!!", "run"]);
        assert_eq!(pairs[0].score, 0.0);
    }

    #[test]
    fn duplicate_tokens_carry_no_weight() {
        // "run run run" is the same set as "run"
        let a = estimate_similarities(&["run run run", "run fast"]);
        let b = estimate_similarities(&["run", "run fast"]);
        assert_eq!(a[0].score, b[0].score);
    }

    #[test]
    fn tokenization_is_case_insensitive() {
        let pairs = estimate_similarities(&["Learn RUST", "learn rust"]);
        assert_eq!(pairs[0].score, 1.0);
    }

    #[test]
    fn pairs_cover_all_combinations_with_i_less_than_j() {
        let pairs = estimate_similarities(&["a", "b", "c", "d"]);
        assert_eq!(pairs.len(), 6);
        for p in &pairs {
            assert!(p.i < p.j);
        }
    }

    #[test]
    fn output_sorted_by_descending_score() {
        let pairs = estimate_similarities(&[
            "write a novel",
            "write a short novel",
            "fix the bike",
        ]);
        for w in pairs.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
        // the two writing goals outrank any pairing with the bike
        assert_eq!((pairs[0].i, pairs[0].j), (0, 1));
    }

    #[test]
    fn deterministic_across_calls() {
        let texts = ["run 5k", "run a mile", "read a book"];
        assert_eq!(estimate_similarities(&texts), estimate_similarities(&texts));
    }
}
