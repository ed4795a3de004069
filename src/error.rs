//! Diagnostic error types for the basketgraph pipeline.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Data-quality issues (unknown ids, empty
//! baskets) are not errors at all — they are recovered locally and counted.
//! The variants here are structural invariant violations that must stop the
//! pipeline rather than produce a silently corrupt graph or embedding table.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the basketgraph crate.
///
/// Each variant wraps a subsystem-specific error, preserving the full
/// diagnostic chain (error codes, help text) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum RecError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Meta(#[from] MetaError),
}

/// Result alias used across the crate.
pub type RecResult<T> = std::result::Result<T, RecError>;

// ---------------------------------------------------------------------------
// Graph construction errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("parallel edge arrays disagree: {src} sources, {dst} destinations, {weights} weights")]
    #[diagnostic(
        code(basketgraph::graph::length_mismatch),
        help(
            "Source, destination, and weight arrays must have the same length. \
             This indicates a bug in an edge builder, not bad input data."
        )
    )]
    LengthMismatch {
        src: usize,
        dst: usize,
        weights: usize,
    },

    #[error("edge endpoint {index} is out of range for a graph with {num_nodes} nodes")]
    #[diagnostic(
        code(basketgraph::graph::node_out_of_range),
        help(
            "Every endpoint must be a dense node index in [0, num_nodes). \
             Check that item indices were offset by the customer count before \
             the edge list was handed to the assembler."
        )
    )]
    NodeOutOfRange { index: usize, num_nodes: usize },

    #[error("negative edge weight {weight} at edge {index}")]
    #[diagnostic(
        code(basketgraph::graph::negative_weight),
        help(
            "Edge weights are non-negative by contract; time-decay weights and \
             co-occurrence counts cannot go below zero."
        )
    )]
    NegativeWeight { index: usize, weight: f32 },
}

/// Result type for graph assembly.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

// ---------------------------------------------------------------------------
// Propagation / scoring errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ModelError {
    #[error("graph has {graph_nodes} nodes but the embedding table has {table_rows} rows")]
    #[diagnostic(
        code(basketgraph::model::node_count_mismatch),
        help(
            "The model was constructed for a different snapshot. Rebuild the \
             model with the snapshot's customer and item counts, or re-run the \
             graph build."
        )
    )]
    NodeCountMismatch {
        graph_nodes: usize,
        table_rows: usize,
    },

    #[error("edge endpoint {index} exceeds the node count {num_nodes} at propagation time")]
    #[diagnostic(
        code(basketgraph::model::edge_out_of_range),
        help(
            "This is a fatal precondition violation by the caller: the forward \
             pass never truncates or wraps indices. The snapshot and the \
             embedding table must come from the same build."
        )
    )]
    EdgeOutOfRange { index: usize, num_nodes: usize },

    #[error("partition boundary {num_users} exceeds the {table_rows} embedding rows")]
    #[diagnostic(
        code(basketgraph::model::partition_out_of_range),
        help(
            "Customer rows occupy [0, num_users) and item rows the remainder, \
             so num_users can never exceed the matrix height. The boundary \
             and the matrix must come from the same snapshot."
        )
    )]
    PartitionOutOfRange {
        num_users: usize,
        table_rows: usize,
    },

    #[error("user index {user} is out of range for {num_users} customers")]
    #[diagnostic(
        code(basketgraph::model::user_out_of_range),
        help(
            "Query users must be customer indices in [0, num_users); \
             item rows start at num_users."
        )
    )]
    UserOutOfRange { user: usize, num_users: usize },

    #[error("item index {item} is out of range for {num_items} items")]
    #[diagnostic(
        code(basketgraph::model::item_out_of_range),
        help("Item queries take local item indices in [0, num_items), not global node indices.")
    )]
    ItemOutOfRange { item: usize, num_items: usize },
}

/// Result type for model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;

// ---------------------------------------------------------------------------
// Metadata persistence errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum MetaError {
    #[error("metadata I/O failed: {message}")]
    #[diagnostic(
        code(basketgraph::meta::io),
        help("Check that the path exists and is writable.")
    )]
    Io { message: String },

    #[error("metadata serialization failed: {message}")]
    #[diagnostic(
        code(basketgraph::meta::serialization),
        help(
            "The snapshot metadata could not be encoded or decoded; the file \
             may be truncated or from an incompatible version."
        )
    )]
    Serialization { message: String },
}

/// Result type for metadata persistence.
pub type MetaResult<T> = std::result::Result<T, MetaError>;
