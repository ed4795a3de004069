//! Scoring and top-K extraction over propagated embeddings.
//!
//! Affinity is the plain dot product between a user row and the item block
//! (rows [Nu, N)). Already-interacted items can be excluded — they are
//! withheld from the candidate set, which is observationally the same as
//! forcing their score to negative infinity. Ties break toward the lower
//! item index so rankings are stable under low-precision arithmetic.

use std::collections::HashSet;

use ndarray::{Array2, ArrayView1, s};
use rayon::prelude::*;

use crate::error::{ModelError, ModelResult};

/// One ranked candidate: local item index in [0, Ni) and its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredItem {
    /// Local item index.
    pub item: usize,
    /// Dot-product affinity.
    pub score: f32,
}

/// Top-K scorer over a propagated `[N, d]` embedding matrix.
pub struct Scorer<'a> {
    embeddings: &'a Array2<f32>,
    num_users: usize,
}

impl<'a> Scorer<'a> {
    /// Wrap a propagated embedding matrix with its partition boundary.
    ///
    /// Fails if `num_users` exceeds the matrix height; the item block
    /// `[num_users, N)` would be ill-defined.
    pub fn new(embeddings: &'a Array2<f32>, num_users: usize) -> ModelResult<Self> {
        if num_users > embeddings.nrows() {
            return Err(ModelError::PartitionOutOfRange {
                num_users,
                table_rows: embeddings.nrows(),
            });
        }
        Ok(Self {
            embeddings,
            num_users,
        })
    }

    /// Number of items in the embedding matrix.
    pub fn num_items(&self) -> usize {
        self.embeddings.nrows() - self.num_users
    }

    /// Top-K items for one user, highest score first.
    ///
    /// `exclude` holds local item indices to withhold (typically the user's
    /// interaction set). Output length is exactly
    /// `min(k, num_items - excluded)`.
    pub fn top_k(
        &self,
        user: usize,
        k: usize,
        exclude: Option<&HashSet<usize>>,
    ) -> ModelResult<Vec<ScoredItem>> {
        if user >= self.num_users {
            return Err(ModelError::UserOutOfRange {
                user,
                num_users: self.num_users,
            });
        }
        let user_emb = self.embeddings.row(user);
        Ok(self.rank(user_emb, k, exclude, None))
    }

    /// Top-K for a batch of users, scored in parallel.
    pub fn top_k_batch(
        &self,
        users: &[usize],
        k: usize,
        exclude: impl Fn(usize) -> Option<HashSet<usize>> + Sync,
    ) -> ModelResult<Vec<Vec<ScoredItem>>> {
        if let Some(&bad) = users.iter().find(|&&u| u >= self.num_users) {
            return Err(ModelError::UserOutOfRange {
                user: bad,
                num_users: self.num_users,
            });
        }
        Ok(users
            .par_iter()
            .map(|&user| {
                let excluded = exclude(user);
                self.rank(self.embeddings.row(user), k, excluded.as_ref(), None)
            })
            .collect())
    }

    /// Top-K most similar items to a query item, the query itself excluded.
    pub fn similar_items(&self, item: usize, k: usize) -> ModelResult<Vec<ScoredItem>> {
        if item >= self.num_items() {
            return Err(ModelError::ItemOutOfRange {
                item,
                num_items: self.num_items(),
            });
        }
        let query = self.embeddings.row(self.num_users + item);
        Ok(self.rank(query, k, None, Some(item)))
    }

    fn rank(
        &self,
        query: ArrayView1<'_, f32>,
        k: usize,
        exclude: Option<&HashSet<usize>>,
        skip_item: Option<usize>,
    ) -> Vec<ScoredItem> {
        let items = self.embeddings.slice(s![self.num_users.., ..]);
        let scores = items.dot(&query);

        let mut candidates: Vec<ScoredItem> = scores
            .iter()
            .enumerate()
            .filter(|(item, _)| {
                skip_item != Some(*item) && !exclude.is_some_and(|set| set.contains(item))
            })
            .map(|(item, &score)| ScoredItem { item, score })
            .collect();

        // Descending score; equal scores break toward the lower item index.
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.item.cmp(&b.item))
        });
        candidates.truncate(k);
        candidates
    }
}
