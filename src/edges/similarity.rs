//! Similarity edges: domain-specific links with uniform weight 1.0.
//!
//! Three optional link families:
//!
//! - same-country customer links, with a bounded fan-out per country so large
//!   markets do not produce O(n²) edges
//! - same-price-bucket product links over equal-width bins of mean unit price
//! - same-category product links keyed by the first description token
//!
//! All families emit directed edges once; the assembler adds reverses.

use std::collections::BTreeMap;

use crate::index::IdIndex;
use crate::txn::Transaction;

use super::TypedEdges;

/// Configuration for similarity-edge construction.
#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    /// Link customers from the same country.
    pub country_links: bool,
    /// Maximum forward links per customer inside a country group.
    pub country_fanout: usize,
    /// Link products in the same mean-price bucket.
    pub price_links: bool,
    /// Number of equal-width price buckets.
    pub num_price_bins: usize,
    /// Link products sharing a first-description-token category.
    pub category_links: bool,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            country_links: true,
            country_fanout: 9,
            price_links: false,
            num_price_bins: 10,
            category_links: false,
        }
    }
}

/// Result of a similarity-edge build.
#[derive(Debug, Clone)]
pub struct SimilarityEdges {
    /// Directed similarity edges, uniform weight 1.0.
    pub edges: TypedEdges,
    /// Rows skipped because an id was unknown to the index.
    pub skipped_unknown: usize,
}

/// Build the configured similarity link families.
pub fn build(rows: &[Transaction], index: &IdIndex, config: &SimilarityConfig) -> SimilarityEdges {
    let mut edges = TypedEdges::new();
    let mut skipped_unknown = 0usize;

    if config.country_links {
        skipped_unknown += country_links(rows, index, config.country_fanout, &mut edges);
    }
    if config.price_links {
        skipped_unknown += price_links(rows, index, config.num_price_bins, &mut edges);
    }
    if config.category_links {
        skipped_unknown += category_links(rows, index, &mut edges);
    }

    if skipped_unknown > 0 {
        tracing::warn!(skipped_unknown, "skipped similarity rows with unknown ids");
    }
    tracing::info!(edges = edges.len(), "built similarity edges");

    SimilarityEdges {
        edges,
        skipped_unknown,
    }
}

/// Same-country customer links with bounded fan-out.
///
/// Each customer links forward to at most `fanout` later customers in its
/// country group, keeping edge counts linear in the group size.
fn country_links(
    rows: &[Transaction],
    index: &IdIndex,
    fanout: usize,
    edges: &mut TypedEdges,
) -> usize {
    // First-seen country per customer index.
    let mut customer_country: BTreeMap<usize, &str> = BTreeMap::new();
    let mut skipped = 0usize;
    for row in rows {
        let Some(country) = row.country.as_deref() else {
            continue;
        };
        match index.customer_index(&row.customer_id) {
            Some(u) => {
                customer_country.entry(u).or_insert(country);
            }
            None => skipped += 1,
        }
    }

    // Country → customers in index order (BTreeMap iteration is sorted).
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (u, country) in &customer_country {
        groups.entry(*country).or_default().push(*u);
    }

    for customers in groups.values() {
        for i in 0..customers.len() {
            let upper = (i + 1 + fanout).min(customers.len());
            for j in (i + 1)..upper {
                edges.push(customers[i], customers[j], 1.0);
            }
        }
    }
    skipped
}

/// Same-price-bucket product links over equal-width bins of mean unit price.
fn price_links(
    rows: &[Transaction],
    index: &IdIndex,
    num_bins: usize,
    edges: &mut TypedEdges,
) -> usize {
    // Mean unit price per local item index.
    let mut sums: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
    let mut skipped = 0usize;
    for row in rows {
        match index.product_index(&row.product_id) {
            Some(i) => {
                let entry = sums.entry(i).or_insert((0.0, 0));
                entry.0 += row.unit_price as f64;
                entry.1 += 1;
            }
            None => skipped += 1,
        }
    }
    if sums.is_empty() || num_bins == 0 {
        return skipped;
    }

    let means: BTreeMap<usize, f64> = sums
        .into_iter()
        .map(|(i, (total, n))| (i, total / n as f64))
        .collect();
    let min = means.values().cloned().fold(f64::INFINITY, f64::min);
    let max = means.values().cloned().fold(f64::NEG_INFINITY, f64::max);
    let width = (max - min) / num_bins as f64;

    let mut buckets: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (item, mean) in &means {
        let bin = if width > 0.0 {
            (((mean - min) / width) as usize).min(num_bins - 1)
        } else {
            0
        };
        buckets
            .entry(bin)
            .or_default()
            .push(item + index.num_customers());
    }

    for items in buckets.values() {
        all_pairs(items, edges);
    }
    skipped
}

/// Same-category product links, category = first description token, lowercased.
fn category_links(rows: &[Transaction], index: &IdIndex, edges: &mut TypedEdges) -> usize {
    // First-seen category per local item index.
    let mut item_category: BTreeMap<usize, String> = BTreeMap::new();
    let mut skipped = 0usize;
    for row in rows {
        let Some(description) = row.description.as_deref() else {
            continue;
        };
        let Some(token) = description.split_whitespace().next() else {
            continue;
        };
        match index.product_index(&row.product_id) {
            Some(i) => {
                item_category.entry(i).or_insert_with(|| token.to_lowercase());
            }
            None => skipped += 1,
        }
    }

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (item, category) in item_category {
        groups
            .entry(category)
            .or_default()
            .push(item + index.num_customers());
    }

    for items in groups.values() {
        all_pairs(items, edges);
    }
    skipped
}

fn all_pairs(nodes: &[usize], edges: &mut TypedEdges) {
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            edges.push(nodes[i], nodes[j], 1.0);
        }
    }
}
