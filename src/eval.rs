//! Ranking metrics over held-out interactions.
//!
//! Recall@K and NDCG@K, averaged across the users present in the test split.
//! The IDCG convention follows the original evaluation: a single relevant
//! hit at rank 1 defines the ideal, so NDCG@K is the sum of 1/log2(rank+1)
//! over hits.

use std::collections::HashSet;

use crate::interactions::InteractionMap;
use crate::scorer::ScoredItem;

/// Fraction of a user's held-out items that appear in the top-K.
pub fn recall_at_k(recommended: &[ScoredItem], ground_truth: &HashSet<usize>, k: usize) -> f64 {
    if ground_truth.is_empty() {
        return 0.0;
    }
    let hits = recommended
        .iter()
        .take(k)
        .filter(|entry| ground_truth.contains(&entry.item))
        .count();
    hits as f64 / ground_truth.len() as f64
}

/// Discounted cumulative gain at K against a unit ideal.
pub fn ndcg_at_k(recommended: &[ScoredItem], ground_truth: &HashSet<usize>, k: usize) -> f64 {
    recommended
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, entry)| ground_truth.contains(&entry.item))
        .map(|(rank, _)| 1.0 / ((rank as f64) + 2.0).log2())
        .sum()
}

/// Mean recall@K and NDCG@K over every user in the test split.
///
/// `recommend` produces the ranked list for a user (typically a
/// [`crate::scorer::Scorer`] call with the train-set exclusion).
pub fn evaluate<F>(test: &InteractionMap, k: usize, mut recommend: F) -> (f64, f64)
where
    F: FnMut(usize) -> Vec<ScoredItem>,
{
    let mut recalls = Vec::new();
    let mut ndcgs = Vec::new();
    for user in test.users() {
        let truth = test.item_set(user);
        let ranked = recommend(user);
        recalls.push(recall_at_k(&ranked, &truth, k));
        ndcgs.push(ndcg_at_k(&ranked, &truth, k));
    }
    if recalls.is_empty() {
        return (0.0, 0.0);
    }
    let n = recalls.len() as f64;
    (
        recalls.iter().sum::<f64>() / n,
        ndcgs.iter().sum::<f64>() / n,
    )
}
