//! Co-occurrence edges: items bought together in the same basket.
//!
//! Baskets are keyed by invoice id (or customer + exact timestamp as a
//! fallback, see [`crate::txn::Transaction::basket_key`]). Every unordered
//! pair of distinct items in a basket increments a sparse symmetric counter
//! keyed by `(min_index, max_index)`, so each pair is stored once; the
//! assembler's symmetrization restores both directions. Counting is parallel
//! over baskets — increments merge by plain addition, so partition order
//! does not matter.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use dashmap::DashMap;
use rayon::prelude::*;

use crate::index::IdIndex;
use crate::txn::{self, Transaction};

use super::TypedEdges;

/// Configuration for co-occurrence edge construction.
#[derive(Debug, Clone)]
pub struct CooccurConfig {
    /// Minimum raw pair count for an edge to be emitted.
    pub min_cooccur: u32,
    /// Per-day decay rate for the recency blend. `None` disables the blend
    /// and weights edges by raw count alone.
    ///
    /// The blended weight is `count * (1 + recency)` where `recency` sums
    /// `exp(-rate * days_before_reference)` over the pair's baskets. Its
    /// scale relative to `count` is not normalized; treat it as a coarse
    /// recency bias, not a calibrated score.
    pub recency_decay: Option<f64>,
    /// Reference date for the recency blend. `None` uses the max observed
    /// timestamp.
    pub reference_date: Option<NaiveDateTime>,
}

impl Default for CooccurConfig {
    fn default() -> Self {
        Self {
            min_cooccur: 3,
            recency_decay: None,
            reference_date: None,
        }
    }
}

/// Result of a co-occurrence build.
#[derive(Debug, Clone)]
pub struct CooccurEdges {
    /// Directed item → item edges, one per surviving pair, sorted by
    /// `(src, dst)` for reproducible output.
    pub edges: TypedEdges,
    /// Rows skipped because the product id was unknown to the index.
    pub skipped_unknown: usize,
    /// Number of baskets processed (including single-item baskets, which
    /// contribute no pairs).
    pub baskets: usize,
}

#[derive(Default)]
struct PairStat {
    count: u32,
    recency: f64,
}

/// Build item↔item co-occurrence edges from transaction rows.
pub fn build(rows: &[Transaction], index: &IdIndex, config: &CooccurConfig) -> CooccurEdges {
    let reference = config
        .reference_date
        .or_else(|| txn::max_timestamp(rows))
        .unwrap_or_default();

    // Group rows into baskets. BTreeMap keeps basket iteration stable, and
    // the per-basket item set deduplicates repeat rows of the same product.
    let mut baskets: BTreeMap<String, (BTreeSet<usize>, NaiveDateTime)> = BTreeMap::new();
    let mut skipped_unknown = 0usize;
    for row in rows {
        let Some(item) = index.product_node(&row.product_id) else {
            skipped_unknown += 1;
            continue;
        };
        let entry = baskets
            .entry(row.basket_key())
            .or_insert_with(|| (BTreeSet::new(), row.timestamp));
        entry.0.insert(item);
        entry.1 = entry.1.max(row.timestamp);
    }

    let num_baskets = baskets.len();
    let basket_list: Vec<(Vec<usize>, NaiveDateTime)> = baskets
        .into_values()
        .map(|(items, ts)| (items.into_iter().collect(), ts))
        .collect();

    // Parallel pairwise counting. The merge is a plain sum per (min, max)
    // key, so concurrent partitions combine correctly in any order.
    let pairs: DashMap<(usize, usize), PairStat> = DashMap::new();
    basket_list.par_iter().for_each(|(items, basket_ts)| {
        let recency = config.recency_decay.map(|rate| {
            let days = (reference - *basket_ts).num_days() as f64;
            (-rate * days).exp()
        });
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                // Items come from a BTreeSet, so items[i] < items[j].
                let mut stat = pairs.entry((items[i], items[j])).or_default();
                stat.count += 1;
                if let Some(r) = recency {
                    stat.recency += r;
                }
            }
        }
    });

    // Emit surviving pairs once, in sorted order so rebuilds are
    // byte-identical regardless of hash-map iteration order.
    let mut survivors: Vec<((usize, usize), u32, f64)> = pairs
        .into_iter()
        .filter(|(_, stat)| stat.count >= config.min_cooccur)
        .map(|(key, stat)| (key, stat.count, stat.recency))
        .collect();
    survivors.sort_unstable_by_key(|(key, _, _)| *key);

    let mut edges = TypedEdges::with_capacity(survivors.len());
    for ((a, b), count, recency) in survivors {
        let weight = if config.recency_decay.is_some() {
            count as f64 * (1.0 + recency)
        } else {
            count as f64
        };
        edges.push(a, b, weight as f32);
    }

    if skipped_unknown > 0 {
        tracing::warn!(skipped_unknown, "skipped basket rows with unknown ids");
    }
    tracing::info!(
        baskets = num_baskets,
        edges = edges.len(),
        min_cooccur = config.min_cooccur,
        "built co-occurrence edges"
    );

    CooccurEdges {
        edges,
        skipped_unknown,
        baskets: num_baskets,
    }
}
