//! Top-k selection over per-chunk similarity scores.
//!
//! The core ranking step is pure: the calling application loads the
//! tenant's artifact, scores the query against every row through
//! [`SimilarityBackend::score`](crate::backend::SimilarityBackend::score),
//! and hands the score vector to [`rank`].
//!
//! # Ordering
//!
//! 1. Score, descending (`f32::total_cmp`, so NaN never panics).
//! 2. Chunk id, ascending, for equal scores.
//! 3. Truncate to `min(k, scores.len())`.

use std::cmp::Ordering;

use crate::models::SearchHit;

/// Select the `k` best rows. Row index `i` is chunk id `i`.
///
/// `k` larger than the corpus is clamped silently; `k == 0` returns nothing.
pub fn rank(scores: &[f32], k: usize) -> Vec<SearchHit> {
    let mut hits: Vec<SearchHit> = scores
        .iter()
        .enumerate()
        .map(|(chunk_id, &score)| SearchHit {
            chunk_id,
            score: if score.is_nan() { f32::MIN } else { score },
        })
        .collect();

    hits.sort_by(compare_hits);
    hits.truncate(k.min(scores.len()));
    hits
}

fn compare_hits(a: &SearchHit, b: &SearchHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.chunk_id.cmp(&b.chunk_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(hits: &[SearchHit]) -> Vec<usize> {
        hits.iter().map(|h| h.chunk_id).collect()
    }

    #[test]
    fn test_rank_orders_by_score() {
        let hits = rank(&[0.1, 0.9, 0.5], 3);
        assert_eq!(ids(&hits), vec![1, 2, 0]);
        assert_eq!(hits[0].score, 0.9);
    }

    #[test]
    fn test_rank_clamps_k() {
        let hits = rank(&[0.3, 0.2, 0.1, 0.0], 1000);
        assert_eq!(hits.len(), 4);
        assert!(rank(&[0.3], 0).is_empty());
        assert!(rank(&[], 5).is_empty());
    }

    #[test]
    fn test_ties_prefer_lower_id() {
        let hits = rank(&[0.5, 0.7, 0.5, 0.7], 4);
        assert_eq!(ids(&hits), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_nan_sorts_last() {
        let hits = rank(&[f32::NAN, 0.0, -0.5], 3);
        assert_eq!(ids(&hits), vec![1, 2, 0]);
    }
}
