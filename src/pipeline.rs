//! Pipeline facade: transactions in, recommendation-ready artifacts out.
//!
//! Runs the full build in order: defensive row filter → identity index →
//! typed edge builders → assembly → features → interaction map → metadata.
//! The build is deterministic: the same rows always produce byte-identical
//! snapshot arrays.

use ndarray::Array2;

use crate::edges::EdgeType;
use crate::edges::cooccur::{self, CooccurConfig};
use crate::edges::purchase::{self, PurchaseConfig};
use crate::edges::similarity::{self, SimilarityConfig};
use crate::error::RecResult;
use crate::features;
use crate::graph::{self, GraphSnapshot};
use crate::index::IdIndex;
use crate::interactions::InteractionMap;
use crate::meta::SnapshotMeta;
use crate::txn::{self, Transaction};

/// Configuration for the full graph build.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Purchase-edge settings.
    pub purchase: PurchaseConfig,
    /// Co-occurrence settings.
    pub cooccur: CooccurConfig,
    /// Similarity-link settings.
    pub similarity: SimilarityConfig,
    /// Also compute the static node feature matrix.
    pub build_features: bool,
}

/// Counters from one build, for logging and sanity checks.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Rows dropped by the defensive input filter.
    pub invalid_rows: usize,
    /// Rows skipped across edge builders because an id was unknown.
    pub skipped_unknown: usize,
    /// Directed purchase edges before symmetrization.
    pub purchase_edges: usize,
    /// Directed co-occurrence edges before symmetrization.
    pub cooccur_edges: usize,
    /// Directed similarity edges before symmetrization.
    pub similarity_edges: usize,
}

/// Everything a training or inference run needs from one snapshot.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    /// The merged undirected snapshot.
    pub snapshot: GraphSnapshot,
    /// Metadata: counts, id maps, interaction sets.
    pub meta: SnapshotMeta,
    /// Optional `[N, w]` static feature matrix.
    pub features: Option<Array2<f32>>,
    /// Build counters.
    pub report: BuildReport,
}

/// Run the full pipeline over raw transaction rows.
///
/// Data-quality problems (invalid rows, unknown ids, empty edge types) are
/// recovered locally and surface only in the report; structural invariant
/// violations abort with an error.
pub fn build(rows: Vec<Transaction>, config: &PipelineConfig) -> RecResult<BuiltGraph> {
    let (rows, filter_report) = txn::filter_rows(rows);
    let index = IdIndex::from_transactions(&rows);

    let purchase = purchase::build(&rows, &index, &config.purchase);
    let cooccur = cooccur::build(&rows, &index, &config.cooccur);
    let similarity = similarity::build(&rows, &index, &config.similarity);

    let report = BuildReport {
        invalid_rows: filter_report.dropped(),
        skipped_unknown: purchase.skipped_unknown
            + cooccur.skipped_unknown
            + similarity.skipped_unknown,
        purchase_edges: purchase.edges.len(),
        cooccur_edges: cooccur.edges.len(),
        similarity_edges: similarity.edges.len(),
    };

    // Merge order is part of the snapshot contract: purchase, then
    // co-occurrence, then similarity.
    let snapshot = graph::assemble(
        index.num_nodes(),
        vec![
            (EdgeType::Purchase, purchase.edges),
            (EdgeType::CoOccurrence, cooccur.edges),
            (EdgeType::Similarity, similarity.edges),
        ],
    )?;

    let node_features = config.build_features.then(|| features::build(&rows, &index));
    let interactions = InteractionMap::from_transactions(&rows, &index);
    let meta = SnapshotMeta::new(index, interactions);

    tracing::info!(
        nodes = snapshot.num_nodes,
        edges = snapshot.num_edges(),
        invalid_rows = report.invalid_rows,
        skipped_unknown = report.skipped_unknown,
        "pipeline build complete"
    );

    Ok(BuiltGraph {
        snapshot,
        meta,
        features: node_features,
        report,
    })
}
