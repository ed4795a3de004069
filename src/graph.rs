//! Graph assembly: merge typed edge lists into one undirected snapshot.
//!
//! Each typed list is symmetrized (the reversed copy is appended directly
//! after the forward copy, same weights) and the lists are concatenated in
//! the order they are given — the pipeline passes purchase, then
//! co-occurrence, then similarity. No deduplication happens across types:
//! parallel edges between the same pair carry distinct semantic signal and
//! are kept.

use serde::{Deserialize, Serialize};

use crate::edges::{EdgeType, TypedEdges};
use crate::error::{GraphError, GraphResult};

/// An immutable merged multigraph, stored as parallel edge arrays.
///
/// Invariants, checked at assembly:
/// - `src`, `dst`, `weight`, and `etype` have equal length
/// - every endpoint is in `[0, num_nodes)`
/// - every weight is non-negative
/// - for every edge `(u, v, w, t)` the reverse `(v, u, w, t)` is present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    /// Source node per edge.
    pub src: Vec<usize>,
    /// Destination node per edge.
    pub dst: Vec<usize>,
    /// Weight per edge.
    pub weight: Vec<f32>,
    /// Provenance tag per edge.
    pub etype: Vec<EdgeType>,
    /// Total node count (customers + items).
    pub num_nodes: usize,
}

impl GraphSnapshot {
    /// Number of directed edges (twice the undirected count).
    pub fn num_edges(&self) -> usize {
        self.src.len()
    }

    /// Whether the snapshot holds no edges.
    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    /// Out-degree per node over the directed edge list.
    ///
    /// Post-symmetrization this equals total degree in the undirected graph.
    pub fn out_degrees(&self) -> Vec<f32> {
        let mut deg = vec![0.0f32; self.num_nodes];
        for &s in &self.src {
            deg[s] += 1.0;
        }
        deg
    }
}

/// Merge typed edge lists into one undirected snapshot.
///
/// Lists are consumed in the given order; an empty list is legal and simply
/// contributes nothing. Fails on any structural invariant violation so a bad
/// list never becomes a silently corrupt graph.
pub fn assemble(
    num_nodes: usize,
    typed_lists: Vec<(EdgeType, TypedEdges)>,
) -> GraphResult<GraphSnapshot> {
    let directed: usize = typed_lists.iter().map(|(_, e)| e.len()).sum();
    let mut snapshot = GraphSnapshot {
        src: Vec::with_capacity(directed * 2),
        dst: Vec::with_capacity(directed * 2),
        weight: Vec::with_capacity(directed * 2),
        etype: Vec::with_capacity(directed * 2),
        num_nodes,
    };

    for (etype, edges) in typed_lists {
        validate(num_nodes, &edges)?;
        if edges.is_empty() {
            tracing::debug!(%etype, "edge type contributed no edges, omitted");
            continue;
        }

        let count = edges.len();
        // Forward copy, then the reversed copy.
        snapshot.src.extend_from_slice(&edges.src);
        snapshot.dst.extend_from_slice(&edges.dst);
        snapshot.weight.extend_from_slice(&edges.weight);

        snapshot.src.extend_from_slice(&edges.dst);
        snapshot.dst.extend_from_slice(&edges.src);
        snapshot.weight.extend_from_slice(&edges.weight);

        snapshot.etype.extend(std::iter::repeat_n(etype, count * 2));
        tracing::debug!(%etype, directed = count * 2, "merged edge type");
    }

    tracing::info!(
        nodes = snapshot.num_nodes,
        edges = snapshot.num_edges(),
        "assembled graph snapshot"
    );
    Ok(snapshot)
}

fn validate(num_nodes: usize, edges: &TypedEdges) -> GraphResult<()> {
    if edges.src.len() != edges.dst.len() || edges.src.len() != edges.weight.len() {
        return Err(GraphError::LengthMismatch {
            src: edges.src.len(),
            dst: edges.dst.len(),
            weights: edges.weight.len(),
        });
    }
    for &endpoint in edges.src.iter().chain(&edges.dst) {
        if endpoint >= num_nodes {
            return Err(GraphError::NodeOutOfRange {
                index: endpoint,
                num_nodes,
            });
        }
    }
    for (i, &w) in edges.weight.iter().enumerate() {
        if w < 0.0 {
            return Err(GraphError::NegativeWeight { index: i, weight: w });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(edges: &[(usize, usize, f32)]) -> TypedEdges {
        let mut out = TypedEdges::new();
        for &(s, d, w) in edges {
            out.push(s, d, w);
        }
        out
    }

    #[test]
    fn symmetrization_adds_reverse_edges() {
        let snapshot = assemble(
            3,
            vec![(EdgeType::Purchase, list(&[(0, 2, 0.5), (1, 2, 0.25)]))],
        )
        .unwrap();

        assert_eq!(snapshot.num_edges(), 4);
        for i in 0..snapshot.num_edges() {
            let (u, v, w, t) = (
                snapshot.src[i],
                snapshot.dst[i],
                snapshot.weight[i],
                snapshot.etype[i],
            );
            let reversed = (0..snapshot.num_edges()).any(|j| {
                snapshot.src[j] == v
                    && snapshot.dst[j] == u
                    && snapshot.weight[j] == w
                    && snapshot.etype[j] == t
            });
            assert!(reversed, "missing reverse of edge {i}");
        }
    }

    #[test]
    fn merge_order_is_stable() {
        let snapshot = assemble(
            4,
            vec![
                (EdgeType::Purchase, list(&[(0, 2, 1.0)])),
                (EdgeType::CoOccurrence, list(&[(2, 3, 5.0)])),
                (EdgeType::Similarity, list(&[(0, 1, 1.0)])),
            ],
        )
        .unwrap();

        assert_eq!(
            snapshot.etype,
            vec![
                EdgeType::Purchase,
                EdgeType::Purchase,
                EdgeType::CoOccurrence,
                EdgeType::CoOccurrence,
                EdgeType::Similarity,
                EdgeType::Similarity,
            ]
        );
        // Forward copy precedes its reverse within each type block.
        assert_eq!((snapshot.src[0], snapshot.dst[0]), (0, 2));
        assert_eq!((snapshot.src[1], snapshot.dst[1]), (2, 0));
    }

    #[test]
    fn empty_type_is_omitted() {
        let snapshot = assemble(
            3,
            vec![
                (EdgeType::Purchase, list(&[(0, 2, 1.0)])),
                (EdgeType::CoOccurrence, TypedEdges::new()),
            ],
        )
        .unwrap();
        assert_eq!(snapshot.num_edges(), 2);
        assert!(snapshot.etype.iter().all(|&t| t == EdgeType::Purchase));
    }

    #[test]
    fn out_of_range_endpoint_is_fatal() {
        let err = assemble(2, vec![(EdgeType::Purchase, list(&[(0, 5, 1.0)]))]).unwrap_err();
        assert!(matches!(
            err,
            GraphError::NodeOutOfRange {
                index: 5,
                num_nodes: 2
            }
        ));
    }

    #[test]
    fn negative_weight_is_fatal() {
        let err = assemble(2, vec![(EdgeType::Purchase, list(&[(0, 1, -0.5)]))]).unwrap_err();
        assert!(matches!(err, GraphError::NegativeWeight { index: 0, .. }));
    }

    #[test]
    fn parallel_edges_across_types_are_kept() {
        let snapshot = assemble(
            2,
            vec![
                (EdgeType::Purchase, list(&[(0, 1, 1.0)])),
                (EdgeType::Similarity, list(&[(0, 1, 1.0)])),
            ],
        )
        .unwrap();
        assert_eq!(snapshot.num_edges(), 4);
    }

    #[test]
    fn degrees_count_directed_out_edges() {
        let snapshot = assemble(3, vec![(EdgeType::Purchase, list(&[(0, 2, 1.0)]))]).unwrap();
        assert_eq!(snapshot.out_degrees(), vec![1.0, 0.0, 1.0]);
    }
}
