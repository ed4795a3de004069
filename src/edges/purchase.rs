//! Purchase edges: customer → item with exponential time decay.
//!
//! Each valid transaction row yields exactly one directed edge weighted by
//! `exp(-decay_rate * days_before_reference)`, so recent purchases count for
//! more. The reference date defaults to the newest timestamp in the dataset,
//! which pins the freshest purchase at weight 1.0.

use chrono::NaiveDateTime;

use crate::index::IdIndex;
use crate::txn::{self, Transaction};

use super::TypedEdges;

/// Configuration for purchase-edge construction.
#[derive(Debug, Clone)]
pub struct PurchaseConfig {
    /// Exponential decay rate per day. Typical values sit in 0.001–0.01.
    pub decay_rate: f64,
    /// Multiply each weight by the row's purchase quantity.
    pub weight_by_quantity: bool,
    /// Reference date for decay. `None` uses the max observed timestamp.
    pub reference_date: Option<NaiveDateTime>,
}

impl Default for PurchaseConfig {
    fn default() -> Self {
        Self {
            decay_rate: 0.005,
            weight_by_quantity: false,
            reference_date: None,
        }
    }
}

/// Result of a purchase-edge build.
#[derive(Debug, Clone)]
pub struct PurchaseEdges {
    /// Directed customer → item edges (item endpoints are global node indices).
    pub edges: TypedEdges,
    /// Rows skipped because an id was unknown to the index.
    pub skipped_unknown: usize,
}

/// Build customer→item purchase edges from transaction rows.
///
/// Rows whose customer or product id is unknown to `index` are skipped and
/// counted, never fatal. Pre-symmetrization: exactly one
/// directed edge per surviving row, in row order.
pub fn build(rows: &[Transaction], index: &IdIndex, config: &PurchaseConfig) -> PurchaseEdges {
    let reference = config
        .reference_date
        .or_else(|| txn::max_timestamp(rows))
        .unwrap_or_default();

    let mut edges = TypedEdges::with_capacity(rows.len());
    let mut skipped_unknown = 0usize;

    for row in rows {
        let (Some(u), Some(i)) = (
            index.customer_index(&row.customer_id),
            index.product_node(&row.product_id),
        ) else {
            skipped_unknown += 1;
            continue;
        };

        let days = (reference - row.timestamp).num_days() as f64;
        let mut weight = (-config.decay_rate * days).exp() as f32;
        if config.weight_by_quantity {
            weight *= row.quantity;
        }
        edges.push(u, i, weight);
    }

    if skipped_unknown > 0 {
        tracing::warn!(skipped_unknown, "skipped purchase rows with unknown ids");
    }
    tracing::info!(edges = edges.len(), "built purchase edges");

    PurchaseEdges {
        edges,
        skipped_unknown,
    }
}
