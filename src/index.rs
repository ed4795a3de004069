//! Identity indexing: raw customer/product ids to dense node indices.
//!
//! Customers occupy [0, Nu) and items occupy [Nu, Nu + Ni), so a single
//! embedding table addresses both partitions. The mapping is bijective with
//! no gaps and reproducible: it preserves the first-seen order of the input
//! sequences, so the same transactions always produce the same indices.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bidirectional raw-id ↔ dense-index mapping for both node partitions.
///
/// Only the dense id vectors are persisted; the forward maps are rebuilt on
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "IdIndexData", into = "IdIndexData")]
pub struct IdIndex {
    customer_to_idx: HashMap<String, usize>,
    product_to_idx: HashMap<String, usize>,
    /// Customer index → raw id (dense, in index order).
    customers: Vec<String>,
    /// Local item index → raw id (dense, in index order).
    products: Vec<String>,
}

/// Serialized form: the dense id vectors.
#[derive(Serialize, Deserialize)]
struct IdIndexData {
    customers: Vec<String>,
    products: Vec<String>,
}

impl From<IdIndex> for IdIndexData {
    fn from(index: IdIndex) -> Self {
        Self {
            customers: index.customers,
            products: index.products,
        }
    }
}

impl From<IdIndexData> for IdIndex {
    fn from(data: IdIndexData) -> Self {
        IdIndex::build(data.customers, data.products)
    }
}

impl IdIndex {
    /// Build the index from deduplicated id sequences in first-seen order.
    ///
    /// Duplicate ids in the input are ignored after their first occurrence,
    /// so callers may also pass raw id streams.
    pub fn build<C, P>(customer_ids: C, product_ids: P) -> Self
    where
        C: IntoIterator<Item = String>,
        P: IntoIterator<Item = String>,
    {
        let mut customer_to_idx = HashMap::new();
        let mut customers = Vec::new();
        for id in customer_ids {
            if !customer_to_idx.contains_key(&id) {
                customer_to_idx.insert(id.clone(), customers.len());
                customers.push(id);
            }
        }

        let mut product_to_idx = HashMap::new();
        let mut products = Vec::new();
        for id in product_ids {
            if !product_to_idx.contains_key(&id) {
                product_to_idx.insert(id.clone(), products.len());
                products.push(id);
            }
        }

        tracing::info!(
            customers = customers.len(),
            products = products.len(),
            "built identity index"
        );

        Self {
            customer_to_idx,
            product_to_idx,
            customers,
            products,
        }
    }

    /// Build from a transaction stream, taking ids in row order.
    pub fn from_transactions(rows: &[crate::txn::Transaction]) -> Self {
        Self::build(
            rows.iter().map(|r| r.customer_id.clone()),
            rows.iter().map(|r| r.product_id.clone()),
        )
    }

    /// Number of customers (Nu).
    pub fn num_customers(&self) -> usize {
        self.customers.len()
    }

    /// Number of items (Ni).
    pub fn num_products(&self) -> usize {
        self.products.len()
    }

    /// Total node count (Nu + Ni).
    pub fn num_nodes(&self) -> usize {
        self.customers.len() + self.products.len()
    }

    /// Customer node index for a raw id, if known.
    pub fn customer_index(&self, raw: &str) -> Option<usize> {
        self.customer_to_idx.get(raw).copied()
    }

    /// Local item index in [0, Ni) for a raw id, if known.
    pub fn product_index(&self, raw: &str) -> Option<usize> {
        self.product_to_idx.get(raw).copied()
    }

    /// Global node index in [Nu, N) for a raw product id, if known.
    pub fn product_node(&self, raw: &str) -> Option<usize> {
        self.product_index(raw).map(|i| i + self.num_customers())
    }

    /// Raw customer id for a customer index.
    pub fn customer_id(&self, index: usize) -> Option<&str> {
        self.customers.get(index).map(String::as_str)
    }

    /// Raw product id for a local item index.
    pub fn product_id(&self, index: usize) -> Option<&str> {
        self.products.get(index).map(String::as_str)
    }

    /// Raw customer ids in index order.
    pub fn customer_ids(&self) -> &[String] {
        &self.customers
    }

    /// Raw product ids in local-index order.
    pub fn product_ids(&self) -> &[String] {
        &self.products
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customers_first_items_offset() {
        let idx = IdIndex::build(
            ["a".to_string(), "b".to_string()],
            ["x".to_string(), "y".to_string(), "z".to_string()],
        );
        assert_eq!(idx.num_customers(), 2);
        assert_eq!(idx.num_products(), 3);
        assert_eq!(idx.num_nodes(), 5);
        assert_eq!(idx.customer_index("a"), Some(0));
        assert_eq!(idx.customer_index("b"), Some(1));
        assert_eq!(idx.product_index("x"), Some(0));
        assert_eq!(idx.product_node("x"), Some(2));
        assert_eq!(idx.product_node("z"), Some(4));
    }

    #[test]
    fn unknown_ids_are_none_not_errors() {
        let idx = IdIndex::build(["a".to_string()], ["x".to_string()]);
        assert_eq!(idx.customer_index("ghost"), None);
        assert_eq!(idx.product_node("ghost"), None);
    }

    #[test]
    fn duplicates_keep_first_seen_index() {
        let idx = IdIndex::build(
            ["a".to_string(), "b".to_string(), "a".to_string()],
            ["x".to_string(), "x".to_string()],
        );
        assert_eq!(idx.num_customers(), 2);
        assert_eq!(idx.num_products(), 1);
        assert_eq!(idx.customer_index("a"), Some(0));
    }

    #[test]
    fn round_trip_raw_ids() {
        let idx = IdIndex::build(
            ["a".to_string(), "b".to_string()],
            ["x".to_string(), "y".to_string()],
        );
        assert_eq!(idx.customer_id(1), Some("b"));
        assert_eq!(idx.product_id(0), Some("x"));
        assert_eq!(idx.customer_id(5), None);
    }
}
