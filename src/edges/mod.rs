//! Edge construction: typed, weighted edge lists from transaction rows.
//!
//! Three independent, composable builders:
//!
//! - [`purchase`]: customer→item edges with exponential time decay
//! - [`cooccur`]: item↔item edges from market-basket co-occurrence
//! - [`similarity`]: same-country, same-price-bucket, and same-category links
//!
//! Every builder emits edges in one direction only; the assembler in
//! [`crate::graph`] adds the reverse copies. Rows referencing ids unknown to
//! the [`crate::index::IdIndex`] are skipped and counted, never fatal.

pub mod cooccur;
pub mod purchase;
pub mod similarity;

use serde::{Deserialize, Serialize};

/// Semantic provenance of an edge.
///
/// The discriminant doubles as the row index into the model's edge-type
/// embedding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EdgeType {
    /// Customer bought item (time-decay weighted).
    Purchase = 0,
    /// Items appeared together in a basket (count weighted).
    CoOccurrence = 1,
    /// Domain similarity link (uniform weight).
    Similarity = 2,
}

impl EdgeType {
    /// Number of distinct edge types (T).
    pub const COUNT: usize = 3;

    /// Row index into the edge-type embedding table.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeType::Purchase => write!(f, "purchase"),
            EdgeType::CoOccurrence => write!(f, "co-occurrence"),
            EdgeType::Similarity => write!(f, "similarity"),
        }
    }
}

/// A directed edge list of one type, as parallel arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedEdges {
    /// Source node indices.
    pub src: Vec<usize>,
    /// Destination node indices.
    pub dst: Vec<usize>,
    /// Non-negative edge weights, parallel to `src`/`dst`.
    pub weight: Vec<f32>,
}

impl TypedEdges {
    /// Empty edge list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty edge list with reserved capacity.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            src: Vec::with_capacity(n),
            dst: Vec::with_capacity(n),
            weight: Vec::with_capacity(n),
        }
    }

    /// Append one directed edge.
    pub fn push(&mut self, src: usize, dst: usize, weight: f32) {
        self.src.push(src);
        self.dst.push(dst);
        self.weight.push(weight);
    }

    /// Number of directed edges.
    pub fn len(&self) -> usize {
        self.src.len()
    }

    /// Whether the list holds no edges.
    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }
}
