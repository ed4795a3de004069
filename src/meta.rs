//! Snapshot metadata: everything needed to translate indices back to raw
//! ids at the system boundary.
//!
//! A persisted snapshot must retain the customer/item counts, the id↔index
//! mappings in both directions, and the per-user interaction sets. The
//! forward maps are rebuilt from the dense id vectors on load, so the file
//! carries no redundant state. Two encodings: pretty JSON for inspection,
//! bincode for size.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MetaError, MetaResult};
use crate::index::IdIndex;
use crate::interactions::InteractionMap;

/// Persistable snapshot metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// Customer count Nu.
    pub num_customers: usize,
    /// Item count Ni.
    pub num_products: usize,
    /// Raw↔index mappings for both partitions.
    pub index: IdIndex,
    /// Per-user interaction lists (local item indices, time-ordered).
    pub interactions: InteractionMap,
}

impl SnapshotMeta {
    /// Capture metadata from a built index and interaction map.
    pub fn new(index: IdIndex, interactions: InteractionMap) -> Self {
        Self {
            num_customers: index.num_customers(),
            num_products: index.num_products(),
            index,
            interactions,
        }
    }

    /// Write as pretty JSON.
    pub fn save_json(&self, path: &Path) -> MetaResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| MetaError::Serialization {
            message: format!("encode metadata: {e}"),
        })?;
        std::fs::write(path, json).map_err(|e| MetaError::Io {
            message: format!("write {}: {e}", path.display()),
        })
    }

    /// Read back from JSON.
    pub fn load_json(path: &Path) -> MetaResult<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| MetaError::Io {
            message: format!("read {}: {e}", path.display()),
        })?;
        serde_json::from_str(&data).map_err(|e| MetaError::Serialization {
            message: format!("parse {}: {e}", path.display()),
        })
    }

    /// Write as compact bincode.
    pub fn save_bin(&self, path: &Path) -> MetaResult<()> {
        let encoded = bincode::serialize(self).map_err(|e| MetaError::Serialization {
            message: format!("encode metadata: {e}"),
        })?;
        std::fs::write(path, encoded).map_err(|e| MetaError::Io {
            message: format!("write {}: {e}", path.display()),
        })
    }

    /// Read back from bincode.
    pub fn load_bin(path: &Path) -> MetaResult<Self> {
        let data = std::fs::read(path).map_err(|e| MetaError::Io {
            message: format!("read {}: {e}", path.display()),
        })?;
        bincode::deserialize(&data).map_err(|e| MetaError::Serialization {
            message: format!("parse {}: {e}", path.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::txn::Transaction;
    use chrono::NaiveDate;

    fn sample_meta() -> SnapshotMeta {
        let rows = vec![
            Transaction {
                customer_id: "a".into(),
                product_id: "x".into(),
                timestamp: NaiveDate::from_ymd_opt(2011, 6, 1)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
                quantity: 1.0,
                unit_price: 2.0,
                basket_id: None,
                country: None,
                description: None,
            },
            Transaction {
                customer_id: "b".into(),
                product_id: "y".into(),
                timestamp: NaiveDate::from_ymd_opt(2011, 6, 2)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
                quantity: 1.0,
                unit_price: 2.0,
                basket_id: None,
                country: None,
                description: None,
            },
        ];
        let index = IdIndex::from_transactions(&rows);
        let interactions = InteractionMap::from_transactions(&rows, &index);
        SnapshotMeta::new(index, interactions)
    }

    #[test]
    fn json_round_trip_preserves_mappings() {
        let meta = sample_meta();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("meta.json");

        meta.save_json(&path).unwrap();
        let restored = SnapshotMeta::load_json(&path).unwrap();

        assert_eq!(restored.num_customers, 2);
        assert_eq!(restored.num_products, 2);
        assert_eq!(restored.index.customer_index("b"), Some(1));
        assert_eq!(restored.index.product_id(0), Some("x"));
        assert_eq!(restored.interactions, meta.interactions);
    }

    #[test]
    fn bincode_round_trip_preserves_mappings() {
        let meta = sample_meta();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("meta.bin");

        meta.save_bin(&path).unwrap();
        let restored = SnapshotMeta::load_bin(&path).unwrap();
        assert_eq!(restored.index.customer_ids(), meta.index.customer_ids());
        assert_eq!(restored.index.product_ids(), meta.index.product_ids());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = SnapshotMeta::load_json(Path::new("/nonexistent/meta.json")).unwrap_err();
        assert!(matches!(err, MetaError::Io { .. }));
    }
}
