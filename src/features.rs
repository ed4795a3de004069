//! Static node features: demographic/behavioral aggregates.
//!
//! Side artifact for downstream models — the propagation engine never reads
//! these. Customers get RFM features (recency inverted so higher is better,
//! frequency = distinct baskets, monetary = total spend); items get
//! popularity, mean price, customer diversity, and country diversity. Each
//! column is min-max normalized within its partition, and the partitions are
//! zero-padded to a common width before stacking customers-first.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::Array2;

use crate::index::IdIndex;
use crate::txn::{self, Transaction};

/// Customer feature width (recency, frequency, monetary).
pub const CUSTOMER_WIDTH: usize = 3;
/// Product feature width (popularity, price, customer diversity, country diversity).
pub const PRODUCT_WIDTH: usize = 4;

/// Build the `[N, w]` node feature matrix, customers in rows [0, Nu).
///
/// Customers or items with no surviving transactions get all-zero rows, the
/// same convention as a padded column.
pub fn build(rows: &[Transaction], index: &IdIndex) -> Array2<f32> {
    let customers = customer_features(rows, index);
    let products = product_features(rows, index);
    stack_partitions(customers, products)
}

/// RFM features per customer, min-max normalized per column.
pub fn customer_features(rows: &[Transaction], index: &IdIndex) -> Array2<f32> {
    let nu = index.num_customers();
    let reference = txn::max_timestamp(rows).unwrap_or_default();

    struct Stats {
        last_purchase: chrono::NaiveDateTime,
        baskets: BTreeSet<String>,
        monetary: f64,
    }
    let mut stats: BTreeMap<usize, Stats> = BTreeMap::new();
    for row in rows {
        let Some(u) = index.customer_index(&row.customer_id) else {
            continue;
        };
        let entry = stats.entry(u).or_insert_with(|| Stats {
            last_purchase: row.timestamp,
            baskets: BTreeSet::new(),
            monetary: 0.0,
        });
        entry.last_purchase = entry.last_purchase.max(row.timestamp);
        entry.baskets.insert(row.basket_key());
        entry.monetary += row.total_value() as f64;
    }

    let mut raw = Array2::<f32>::zeros((nu, CUSTOMER_WIDTH));
    for (u, s) in &stats {
        raw[[*u, 0]] = (reference - s.last_purchase).num_days() as f32;
        raw[[*u, 1]] = s.baskets.len() as f32;
        raw[[*u, 2]] = s.monetary as f32;
    }
    min_max_normalize(&mut raw);
    // Invert recency so recent buyers score high. Customers with no
    // surviving rows keep the all-zero convention rather than inheriting a
    // normalized recency artifact.
    for u in 0..nu {
        if stats.contains_key(&u) {
            raw[[u, 0]] = 1.0 - raw[[u, 0]];
        } else {
            raw.row_mut(u).fill(0.0);
        }
    }
    raw
}

/// Aggregate features per product, min-max normalized per column.
pub fn product_features(rows: &[Transaction], index: &IdIndex) -> Array2<f32> {
    let ni = index.num_products();

    struct Stats {
        quantity: f64,
        price_total: f64,
        price_rows: usize,
        customers: BTreeSet<usize>,
        countries: BTreeSet<String>,
    }
    let mut stats: BTreeMap<usize, Stats> = BTreeMap::new();
    for row in rows {
        let Some(i) = index.product_index(&row.product_id) else {
            continue;
        };
        let entry = stats.entry(i).or_insert_with(|| Stats {
            quantity: 0.0,
            price_total: 0.0,
            price_rows: 0,
            customers: BTreeSet::new(),
            countries: BTreeSet::new(),
        });
        entry.quantity += row.quantity as f64;
        entry.price_total += row.unit_price as f64;
        entry.price_rows += 1;
        if let Some(u) = index.customer_index(&row.customer_id) {
            entry.customers.insert(u);
        }
        if let Some(country) = &row.country {
            entry.countries.insert(country.clone());
        }
    }

    let mut raw = Array2::<f32>::zeros((ni, PRODUCT_WIDTH));
    for (i, s) in &stats {
        raw[[*i, 0]] = s.quantity as f32;
        raw[[*i, 1]] = (s.price_total / s.price_rows.max(1) as f64) as f32;
        raw[[*i, 2]] = s.customers.len() as f32;
        raw[[*i, 3]] = s.countries.len() as f32;
    }
    min_max_normalize(&mut raw);
    raw
}

/// Stack partition matrices customers-first, zero-padding the narrower
/// partition to the common width.
///
/// Concatenating un-padded partitions of different widths would be a shape
/// error; always padding makes that unrepresentable.
pub fn stack_partitions(customers: Array2<f32>, products: Array2<f32>) -> Array2<f32> {
    let width = customers.ncols().max(products.ncols());
    let n = customers.nrows() + products.nrows();

    let mut out = Array2::<f32>::zeros((n, width));
    for (r, row) in customers.rows().into_iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            out[[r, c]] = v;
        }
    }
    let offset = customers.nrows();
    for (r, row) in products.rows().into_iter().enumerate() {
        for (c, &v) in row.iter().enumerate() {
            out[[offset + r, c]] = v;
        }
    }
    out
}

/// Min-max normalize each column in place. Constant columns become zero.
fn min_max_normalize(matrix: &mut Array2<f32>) {
    for mut col in matrix.columns_mut() {
        let min = col.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = col.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let range = max - min;
        if range > 0.0 {
            col.mapv_inplace(|v| (v - min) / range);
        } else {
            col.fill(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(customer: &str, product: &str, basket: &str, day: u32, qty: f32, price: f32) -> Transaction {
        Transaction {
            customer_id: customer.into(),
            product_id: product.into(),
            timestamp: NaiveDate::from_ymd_opt(2011, 6, day)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            quantity: qty,
            unit_price: price,
            basket_id: Some(basket.into()),
            country: Some("France".into()),
            description: None,
        }
    }

    #[test]
    fn matrix_shape_is_n_by_common_width() {
        let rows = vec![
            row("a", "x", "b1", 1, 1.0, 2.0),
            row("b", "y", "b2", 2, 3.0, 4.0),
        ];
        let index = IdIndex::from_transactions(&rows);
        let features = build(&rows, &index);
        assert_eq!(features.nrows(), index.num_nodes());
        assert_eq!(features.ncols(), PRODUCT_WIDTH);
    }

    #[test]
    fn customer_partition_is_zero_padded() {
        let rows = vec![row("a", "x", "b1", 1, 1.0, 2.0)];
        let index = IdIndex::from_transactions(&rows);
        let features = build(&rows, &index);
        // Customer rows have width 3; the padded 4th column must be zero.
        assert_eq!(features[[0, CUSTOMER_WIDTH]], 0.0);
    }

    #[test]
    fn features_are_bounded() {
        let rows = vec![
            row("a", "x", "b1", 1, 1.0, 2.0),
            row("a", "y", "b2", 5, 10.0, 1.0),
            row("b", "x", "b3", 9, 2.0, 2.0),
        ];
        let index = IdIndex::from_transactions(&rows);
        let features = build(&rows, &index);
        assert!(features.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn frequent_recent_customer_scores_higher() {
        let rows = vec![
            row("frequent", "x", "b1", 1, 1.0, 5.0),
            row("frequent", "y", "b2", 28, 1.0, 5.0),
            row("lapsed", "x", "b3", 1, 1.0, 5.0),
        ];
        let index = IdIndex::from_transactions(&rows);
        let features = customer_features(&rows, &index);
        let frequent = index.customer_index("frequent").unwrap();
        let lapsed = index.customer_index("lapsed").unwrap();
        // Recency (inverted) and frequency both favor the active customer.
        assert!(features[[frequent, 0]] > features[[lapsed, 0]]);
        assert!(features[[frequent, 1]] > features[[lapsed, 1]]);
    }

    #[test]
    fn customer_without_rows_gets_an_all_zero_row() {
        let rows = vec![
            row("active", "x", "b1", 1, 1.0, 2.0),
            row("busy", "y", "b2", 5, 2.0, 3.0),
        ];
        // A wider index than the rows cover: "silent" never transacted.
        let index = IdIndex::build(
            ["active".to_string(), "busy".to_string(), "silent".to_string()],
            ["x".to_string(), "y".to_string()],
        );
        let features = customer_features(&rows, &index);
        let silent = index.customer_index("silent").unwrap();
        assert!(features.row(silent).iter().all(|&v| v == 0.0));
        // Active customers still get the inverted-recency treatment.
        let active = index.customer_index("active").unwrap();
        assert_eq!(features[[active, 0]], 0.0);
        let busy = index.customer_index("busy").unwrap();
        assert_eq!(features[[busy, 0]], 1.0);
    }

    #[test]
    fn stack_pads_whichever_side_is_narrower() {
        let customers = Array2::<f32>::ones((2, 5));
        let products = Array2::<f32>::ones((1, 2));
        let stacked = stack_partitions(customers, products);
        assert_eq!(stacked.dim(), (3, 5));
        assert_eq!(stacked[[2, 4]], 0.0);
        assert_eq!(stacked[[2, 1]], 1.0);
    }
}
