//! User→item interaction map: exclusion sets, splits, negative sampling.
//!
//! Built once per snapshot from the same rows as the purchase edges. Each
//! user's items are kept in time order with duplicates removed, so "most
//! recent" holdout splits are a suffix slice. Samplers take an explicitly
//! threaded RNG — reproducibility is the caller's choice of seed, never a
//! hidden process-wide source.

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::index::IdIndex;
use crate::txn::Transaction;

/// A BPR-style training triple: user, interacted item, sampled non-item.
///
/// Item indices are local, in [0, Ni).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BprTriple {
    pub user: usize,
    pub positive: usize,
    pub negative: usize,
}

/// Per-user interacted item lists, time-ordered, local item indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionMap {
    map: BTreeMap<usize, Vec<usize>>,
}

impl InteractionMap {
    /// Build from transaction rows.
    ///
    /// Rows with ids unknown to the index are skipped (they were already
    /// counted by the edge builders). Repeat purchases of the same item keep
    /// only the first occurrence, preserving time order.
    pub fn from_transactions(rows: &[Transaction], index: &IdIndex) -> Self {
        let mut map: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut ordered: Vec<&Transaction> = rows.iter().collect();
        ordered.sort_by_key(|r| r.timestamp);

        for row in ordered {
            let (Some(u), Some(i)) = (
                index.customer_index(&row.customer_id),
                index.product_index(&row.product_id),
            ) else {
                continue;
            };
            let items = map.entry(u).or_default();
            if !items.contains(&i) {
                items.push(i);
            }
        }
        Self { map }
    }

    /// Number of users with at least one interaction.
    pub fn num_users(&self) -> usize {
        self.map.len()
    }

    /// Total number of (user, item) interactions.
    pub fn num_interactions(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    /// Time-ordered items for a user.
    pub fn items(&self, user: usize) -> Option<&[usize]> {
        self.map.get(&user).map(Vec::as_slice)
    }

    /// The user's items as a set, for scoring exclusion.
    pub fn item_set(&self, user: usize) -> HashSet<usize> {
        self.map
            .get(&user)
            .map(|items| items.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Users in ascending index order.
    pub fn users(&self) -> impl Iterator<Item = usize> + '_ {
        self.map.keys().copied()
    }

    /// Whether a user has interacted with an item.
    pub fn contains(&self, user: usize, item: usize) -> bool {
        self.map
            .get(&user)
            .is_some_and(|items| items.contains(&item))
    }

    /// Hold out each user's `holdout` most recent items as the test set.
    ///
    /// Users with fewer than `min_interactions` items stay entirely in
    /// train. Returns (train, test).
    pub fn split_by_recency(&self, holdout: usize, min_interactions: usize) -> (Self, Self) {
        let mut train = BTreeMap::new();
        let mut test = BTreeMap::new();
        for (&user, items) in &self.map {
            if items.len() < min_interactions || items.len() <= holdout {
                train.insert(user, items.clone());
                continue;
            }
            let cut = items.len() - holdout;
            train.insert(user, items[..cut].to_vec());
            test.insert(user, items[cut..].to_vec());
        }
        (Self { map: train }, Self { map: test })
    }

    /// Hold out a trailing fraction of each eligible user's items.
    ///
    /// `ratio` is clamped to [0, 1]; the holdout count per user is
    /// `ceil(ratio * items)`, capped so at least one item stays in train.
    pub fn split_by_ratio(&self, ratio: f64, min_interactions: usize) -> (Self, Self) {
        let ratio = ratio.clamp(0.0, 1.0);
        let mut train = BTreeMap::new();
        let mut test = BTreeMap::new();
        for (&user, items) in &self.map {
            let holdout = ((items.len() as f64 * ratio).ceil() as usize).min(items.len() - 1);
            if items.len() < min_interactions || holdout == 0 {
                train.insert(user, items.clone());
                continue;
            }
            let cut = items.len() - holdout;
            train.insert(user, items[..cut].to_vec());
            test.insert(user, items[cut..].to_vec());
        }
        (Self { map: train }, Self { map: test })
    }

    /// Sample `num_neg` non-interacted items per user, uniformly.
    ///
    /// Users who have interacted with every item are skipped. Rejection
    /// sampling is fine here: retail interaction sets are tiny relative to
    /// the catalog.
    pub fn sample_negatives<R: Rng>(
        &self,
        num_items: usize,
        num_neg: usize,
        rng: &mut R,
    ) -> BTreeMap<usize, Vec<usize>> {
        let mut out = BTreeMap::new();
        for (&user, items) in &self.map {
            if items.len() >= num_items {
                continue;
            }
            let positives: HashSet<usize> = items.iter().copied().collect();
            let available = num_items - positives.len();
            let want = num_neg.min(available);
            let mut negatives = Vec::with_capacity(want);
            let mut seen: HashSet<usize> = HashSet::new();
            while negatives.len() < want {
                let candidate = rng.gen_range(0..num_items);
                if positives.contains(&candidate) || !seen.insert(candidate) {
                    continue;
                }
                negatives.push(candidate);
            }
            out.insert(user, negatives);
        }
        out
    }

    /// Build one BPR batch: for each of `batch_size` draws, a random user
    /// with interactions, one of their items, and one sampled negative.
    pub fn bpr_batch<R: Rng>(
        &self,
        num_items: usize,
        batch_size: usize,
        rng: &mut R,
    ) -> Vec<BprTriple> {
        let users: Vec<usize> = self
            .map
            .iter()
            .filter(|(_, items)| !items.is_empty() && items.len() < num_items)
            .map(|(&u, _)| u)
            .collect();
        if users.is_empty() {
            return Vec::new();
        }

        let mut batch = Vec::with_capacity(batch_size);
        for _ in 0..batch_size {
            let user = users[rng.gen_range(0..users.len())];
            let items = &self.map[&user];
            let positive = items[rng.gen_range(0..items.len())];
            let negative = loop {
                let candidate = rng.gen_range(0..num_items);
                if !items.contains(&candidate) {
                    break candidate;
                }
            };
            batch.push(BprTriple {
                user,
                positive,
                negative,
            });
        }
        batch
    }
}
