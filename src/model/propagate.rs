//! The forward pass: layer-wise neighbor aggregation over the snapshot.
//!
//! Each layer scatter-adds per-edge messages into destination rows, scaled
//! by the edge weight and the symmetric normalization `deg^-1/2 * deg^-1/2`.
//! The returned matrix is the equal-weight average of layer 0 (the raw
//! embeddings) and all L propagated layers — averaging rather than keeping
//! the last layer damps over-smoothing, and the 1/(L+1) weights are part of
//! the model contract, not a tunable.
//!
//! Within a layer the edge list is split into fixed chunks aggregated in
//! parallel; partial sums merge in chunk order, so output is reproducible
//! for a given snapshot.

use ndarray::Array2;
use rayon::prelude::*;

use crate::error::{ModelError, ModelResult};
use crate::graph::GraphSnapshot;

use super::{EdgeTypeMix, PropagationModel};

impl PropagationModel {
    /// Run the L-layer forward pass and return the `[N, d]` output.
    ///
    /// Fatal preconditions: the snapshot's node count must match the
    /// embedding table, and every edge endpoint must be in range — a bad
    /// index aborts rather than truncating.
    pub fn propagate(&self, graph: &GraphSnapshot) -> ModelResult<Array2<f32>> {
        let n = self.num_nodes();
        if graph.num_nodes != n {
            return Err(ModelError::NodeCountMismatch {
                graph_nodes: graph.num_nodes,
                table_rows: n,
            });
        }
        if let Some(&bad) = graph
            .src
            .iter()
            .chain(&graph.dst)
            .find(|&&endpoint| endpoint >= n)
        {
            return Err(ModelError::EdgeOutOfRange {
                index: bad,
                num_nodes: n,
            });
        }

        let num_layers = self.config().num_layers;
        let norm_inv = norm_inverse(&graph.out_degrees());
        let layer_weight = 1.0 / (num_layers as f32 + 1.0);

        let mut current = self.embeddings().clone();
        let mut out = &current * layer_weight;
        for _ in 0..num_layers {
            let next = self.aggregate(graph, &current, &norm_inv);
            out.scaled_add(layer_weight, &next);
            current = next;
        }
        Ok(out)
    }

    /// One round of scatter-add aggregation: `next[dst] += msg(edge)`.
    fn aggregate(
        &self,
        graph: &GraphSnapshot,
        current: &Array2<f32>,
        norm_inv: &[f32],
    ) -> Array2<f32> {
        let (n, d) = current.dim();
        let num_edges = graph.num_edges();
        if num_edges == 0 {
            return Array2::zeros((n, d));
        }

        let chunk = num_edges.div_ceil(rayon::current_num_threads()).max(1024);
        let ranges: Vec<std::ops::Range<usize>> = (0..num_edges)
            .step_by(chunk)
            .map(|start| start..(start + chunk).min(num_edges))
            .collect();

        let partials: Vec<Array2<f32>> = ranges
            .into_par_iter()
            .map(|range| {
                let mut acc = Array2::<f32>::zeros((n, d));
                for e in range {
                    let (src, dst) = (graph.src[e], graph.dst[e]);
                    let coeff = norm_inv[src] * norm_inv[dst] * graph.weight[e];
                    if coeff == 0.0 {
                        continue;
                    }
                    let mut row = acc.row_mut(dst);
                    row.scaled_add(coeff, &current.row(src));
                    if let EdgeTypeMix::AdditiveBias { scale } = self.config().edge_type_mix {
                        let etype = graph.etype[e].index();
                        row.scaled_add(coeff * scale, &self.edge_type_embeddings().row(etype));
                    }
                }
                acc
            })
            .collect();

        // Merge partials in chunk order so the float sum is reproducible.
        let mut next = Array2::<f32>::zeros((n, d));
        for partial in partials {
            next += &partial;
        }
        next
    }
}

/// `deg^(-1/2)` per node, with 0 (not infinity) for isolated nodes.
fn norm_inverse(degrees: &[f32]) -> Vec<f32> {
    degrees
        .iter()
        .map(|&deg| if deg > 0.0 { deg.powf(-0.5) } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edges::{EdgeType, TypedEdges};
    use crate::graph;
    use crate::model::ModelConfig;
    use ndarray::array;

    /// A model with fixed embeddings so aggregation is hand-checkable.
    fn fixed_model(num_users: usize, num_items: usize, config: ModelConfig) -> PropagationModel {
        let n = num_users + num_items;
        let d = config.embed_dim;
        let embeddings = Array2::from_shape_fn((n, d), |(r, c)| (r * d + c) as f32 + 1.0);
        let edge_type_embeddings = Array2::ones((EdgeType::COUNT, d));
        PropagationModel::with_embeddings(
            num_users,
            num_items,
            config,
            embeddings,
            edge_type_embeddings,
        )
    }

    fn bipartite_snapshot() -> crate::graph::GraphSnapshot {
        // One user (node 0) bought two items (nodes 1, 2).
        let mut edges = TypedEdges::new();
        edges.push(0, 1, 1.0);
        edges.push(0, 2, 1.0);
        graph::assemble(3, vec![(EdgeType::Purchase, edges)]).unwrap()
    }

    #[test]
    fn norm_inverse_is_bounded_and_zero_iff_isolated() {
        let norms = norm_inverse(&[0.0, 1.0, 4.0, 100.0]);
        assert_eq!(norms[0], 0.0);
        assert_eq!(norms[1], 1.0);
        assert_eq!(norms[2], 0.5);
        for (&deg, &norm) in [0.0f32, 1.0, 4.0, 100.0].iter().zip(&norms) {
            assert!((0.0..=1.0).contains(&norm));
            assert_eq!(norm == 0.0, deg == 0.0);
        }
    }

    #[test]
    fn zero_layers_is_identity() {
        let config = ModelConfig {
            embed_dim: 4,
            num_layers: 0,
            ..Default::default()
        };
        let model = fixed_model(1, 2, config);
        let out = model.propagate(&bipartite_snapshot()).unwrap();
        assert_eq!(out, *model.embeddings());
    }

    #[test]
    fn one_layer_matches_hand_computation() {
        let config = ModelConfig {
            embed_dim: 2,
            num_layers: 1,
            ..Default::default()
        };
        let model = fixed_model(1, 2, config);
        // Embeddings: node0 = [1,2], node1 = [3,4], node2 = [5,6].
        // Degrees: node0 = 2, node1 = 1, node2 = 1.
        // Messages into node0: norm(1,0)=1/sqrt(2) * [3,4] + 1/sqrt(2) * [5,6].
        // Messages into node1: 1/sqrt(2) * [1,2]; node2 likewise.
        let out = model.propagate(&bipartite_snapshot()).unwrap();

        let s = 1.0 / 2.0f32.sqrt();
        let h1 = array![
            [s * (3.0 + 5.0), s * (4.0 + 6.0)],
            [s * 1.0, s * 2.0],
            [s * 1.0, s * 2.0],
        ];
        let expected = (model.embeddings() + &h1) / 2.0;
        for (a, b) in out.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-5, "{a} vs {b}");
        }
    }

    #[test]
    fn isolated_node_stays_at_scaled_layer_zero() {
        let config = ModelConfig {
            embed_dim: 2,
            num_layers: 2,
            ..Default::default()
        };
        // Node 3 exists but has no edges.
        let mut edges = TypedEdges::new();
        edges.push(0, 1, 1.0);
        let snapshot = graph::assemble(4, vec![(EdgeType::Purchase, edges)]).unwrap();
        let model = fixed_model(2, 2, config);

        let out = model.propagate(&snapshot).unwrap();
        // All propagated layers contribute zero to the isolate; only the
        // 1/(L+1) share of layer 0 remains.
        let expected = model.embeddings().row(3).mapv(|v| v / 3.0);
        for (a, b) in out.row(3).iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn edge_weights_scale_messages() {
        let config = ModelConfig {
            embed_dim: 2,
            num_layers: 1,
            ..Default::default()
        };
        let model = fixed_model(1, 1, config.clone());

        let mut unit = TypedEdges::new();
        unit.push(0, 1, 1.0);
        let unit_graph = graph::assemble(2, vec![(EdgeType::Purchase, unit)]).unwrap();

        let mut halved = TypedEdges::new();
        halved.push(0, 1, 0.5);
        let halved_graph = graph::assemble(2, vec![(EdgeType::Purchase, halved)]).unwrap();

        let full = model.propagate(&unit_graph).unwrap();
        let half = model.propagate(&halved_graph).unwrap();

        // out = (H0 + w * H1) / 2, so the propagated share halves exactly.
        let h0 = model.embeddings();
        for ((f, h), e0) in full.iter().zip(half.iter()).zip(h0.iter()) {
            let full_msg = 2.0 * f - e0;
            let half_msg = 2.0 * h - e0;
            assert!((half_msg - 0.5 * full_msg).abs() < 1e-5);
        }
    }

    #[test]
    fn additive_bias_shifts_messages_by_type_embedding() {
        let base = ModelConfig {
            embed_dim: 2,
            num_layers: 1,
            edge_type_mix: EdgeTypeMix::WeightOnly,
        };
        let biased = ModelConfig {
            edge_type_mix: EdgeTypeMix::AdditiveBias { scale: 0.1 },
            ..base.clone()
        };
        let snapshot = bipartite_snapshot();
        let plain = fixed_model(1, 2, base).propagate(&snapshot).unwrap();
        let mixed = fixed_model(1, 2, biased).propagate(&snapshot).unwrap();

        // ET rows are all ones, so each message gains coeff * 0.1 per
        // component; node1 receives one message with coeff 1/sqrt(2), and
        // the layer average halves it.
        let s = 1.0 / 2.0f32.sqrt();
        let delta = mixed[[1, 0]] - plain[[1, 0]];
        assert!((delta - s * 0.1 / 2.0).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_edge_is_fatal() {
        let config = ModelConfig {
            embed_dim: 2,
            num_layers: 1,
            ..Default::default()
        };
        let model = fixed_model(1, 1, config);
        let snapshot = GraphSnapshot {
            src: vec![0, 9],
            dst: vec![9, 0],
            weight: vec![1.0, 1.0],
            etype: vec![EdgeType::Purchase, EdgeType::Purchase],
            num_nodes: 2,
        };
        let err = model.propagate(&snapshot).unwrap_err();
        assert!(matches!(err, ModelError::EdgeOutOfRange { index: 9, .. }));
    }

    #[test]
    fn node_count_mismatch_is_fatal() {
        let config = ModelConfig::default();
        let model = fixed_model(1, 1, config);
        let snapshot = graph::assemble(5, vec![]).unwrap();
        let err = model.propagate(&snapshot).unwrap_err();
        assert!(matches!(err, ModelError::NodeCountMismatch { .. }));
    }
}
