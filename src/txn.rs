//! Transaction records and defensive row filtering.
//!
//! Upstream loaders (CSV, parquet) are external collaborators; this module
//! defines the record shape they must produce and enforces the row-level
//! preconditions defensively: rows with a non-positive quantity or a blank
//! customer/product id are dropped and counted, never propagated into the
//! graph build.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single retail transaction row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Raw customer identifier.
    pub customer_id: String,
    /// Raw product identifier.
    pub product_id: String,
    /// Purchase timestamp.
    pub timestamp: NaiveDateTime,
    /// Units purchased. Must be positive; returns show up as negative rows
    /// in raw exports and are filtered out.
    pub quantity: f32,
    /// Unit price at purchase time.
    pub unit_price: f32,
    /// Invoice/order identifier grouping rows into a basket, when the
    /// dataset carries one.
    pub basket_id: Option<String>,
    /// Customer country, used for same-country similarity edges.
    pub country: Option<String>,
    /// Free-text product description, used for category similarity edges.
    pub description: Option<String>,
}

impl Transaction {
    /// Total monetary value of the row.
    pub fn total_value(&self) -> f32 {
        self.quantity * self.unit_price
    }

    /// The basket this row belongs to.
    ///
    /// Datasets without invoice numbers fall back to customer + exact
    /// timestamp, which groups rows entered at the same instant.
    pub fn basket_key(&self) -> String {
        match &self.basket_id {
            Some(id) => id.clone(),
            None => format!("{}@{}", self.customer_id, self.timestamp),
        }
    }

    /// Row-level precondition check applied by [`filter_rows`].
    pub fn is_valid(&self) -> bool {
        self.quantity > 0.0
            && self.unit_price >= 0.0
            && !self.customer_id.trim().is_empty()
            && !self.product_id.trim().is_empty()
    }
}

/// Outcome of the defensive row filter.
#[derive(Debug, Clone, Default)]
pub struct FilterReport {
    /// Rows that passed validation.
    pub kept: usize,
    /// Rows dropped for a non-positive quantity.
    pub dropped_quantity: usize,
    /// Rows dropped for a negative unit price.
    pub dropped_price: usize,
    /// Rows dropped for a blank customer or product id.
    pub dropped_missing_id: usize,
}

impl FilterReport {
    /// Total number of rows dropped.
    pub fn dropped(&self) -> usize {
        self.dropped_quantity + self.dropped_price + self.dropped_missing_id
    }
}

/// Drop rows that violate the input contract, keeping input order.
///
/// Returns the surviving rows and a count of what was removed. The filter is
/// a local recovery, not an error: bad rows are expected in raw retail
/// exports (returns, anonymous checkouts).
pub fn filter_rows(rows: Vec<Transaction>) -> (Vec<Transaction>, FilterReport) {
    let mut report = FilterReport::default();
    let kept: Vec<Transaction> = rows
        .into_iter()
        .filter(|row| {
            if row.customer_id.trim().is_empty() || row.product_id.trim().is_empty() {
                report.dropped_missing_id += 1;
                return false;
            }
            if row.quantity <= 0.0 {
                report.dropped_quantity += 1;
                return false;
            }
            if row.unit_price < 0.0 {
                report.dropped_price += 1;
                return false;
            }
            true
        })
        .collect();
    report.kept = kept.len();

    if report.dropped() > 0 {
        tracing::warn!(
            kept = report.kept,
            dropped_quantity = report.dropped_quantity,
            dropped_price = report.dropped_price,
            dropped_missing_id = report.dropped_missing_id,
            "dropped invalid transaction rows"
        );
    }

    (kept, report)
}

/// Latest timestamp across a set of rows, if any.
///
/// Used as the default reference date for time-decay weighting.
pub fn max_timestamp(rows: &[Transaction]) -> Option<NaiveDateTime> {
    rows.iter().map(|r| r.timestamp).max()
}
