//! Embedding propagation model (LightGCN-style).
//!
//! Holds one learnable vector per node (customers then items, matching the
//! index layout) and one per edge type. The forward pass in [`propagate`]
//! runs L rounds of symmetric-normalized weighted neighbor aggregation and
//! averages all layer outputs, layer 0 included.
//!
//! The embedding table is externally-owned state from the optimizer's point
//! of view: [`PropagationModel::embeddings_mut`] hands out the raw buffer for
//! in-place updates between forward passes. The graph snapshot, by contrast,
//! is shared read-only.

pub mod propagate;

use ndarray::Array2;
use rand::Rng;

use crate::edges::EdgeType;

/// How edge-type identity mixes into messages.
///
/// A model instance commits to one strategy at construction and uses it for
/// every forward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EdgeTypeMix {
    /// Messages are scaled by edge weight and degree normalization only;
    /// the edge-type table is ignored.
    WeightOnly,
    /// A scaled edge-type embedding is added to each message before the
    /// weight and normalization scaling: `msg = H[src] + scale * ET[type]`.
    AdditiveBias {
        /// Contribution scale; 0.1 keeps type identity a small nudge.
        scale: f32,
    },
}

impl Default for EdgeTypeMix {
    fn default() -> Self {
        EdgeTypeMix::WeightOnly
    }
}

/// Model hyperparameters.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Embedding dimension d.
    pub embed_dim: usize,
    /// Number of propagation layers L. 0 is legal and returns the raw
    /// embeddings unchanged.
    pub num_layers: usize,
    /// Edge-type mixing strategy.
    pub edge_type_mix: EdgeTypeMix,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embed_dim: 64,
            num_layers: 3,
            edge_type_mix: EdgeTypeMix::WeightOnly,
        }
    }
}

/// The embedding model: node table, edge-type table, and hyperparameters.
#[derive(Debug, Clone)]
pub struct PropagationModel {
    num_users: usize,
    num_items: usize,
    config: ModelConfig,
    /// Learnable `[N, d]` node embeddings.
    embeddings: Array2<f32>,
    /// Learnable `[T, d]` edge-type embeddings.
    edge_type_embeddings: Array2<f32>,
}

impl PropagationModel {
    /// Create a model with Xavier-uniform initialized tables.
    ///
    /// The RNG is caller-supplied so initialization is reproducible under a
    /// fixed seed.
    pub fn new<R: Rng>(num_users: usize, num_items: usize, config: ModelConfig, rng: &mut R) -> Self {
        let n = num_users + num_items;
        let embeddings = xavier_uniform(n, config.embed_dim, rng);
        let edge_type_embeddings = xavier_uniform(EdgeType::COUNT, config.embed_dim, rng);
        Self {
            num_users,
            num_items,
            config,
            embeddings,
            edge_type_embeddings,
        }
    }

    /// Create a model from an existing embedding table (e.g. a restored
    /// checkpoint). The table must be `[num_users + num_items, d]`.
    pub fn with_embeddings(
        num_users: usize,
        num_items: usize,
        config: ModelConfig,
        embeddings: Array2<f32>,
        edge_type_embeddings: Array2<f32>,
    ) -> Self {
        Self {
            num_users,
            num_items,
            config,
            embeddings,
            edge_type_embeddings,
        }
    }

    /// Customer count Nu (partition boundary).
    pub fn num_users(&self) -> usize {
        self.num_users
    }

    /// Item count Ni.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// Total node count N.
    pub fn num_nodes(&self) -> usize {
        self.num_users + self.num_items
    }

    /// Model hyperparameters.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// The raw node embedding table (layer 0).
    pub fn embeddings(&self) -> &Array2<f32> {
        &self.embeddings
    }

    /// Mutable access for the external optimizer.
    pub fn embeddings_mut(&mut self) -> &mut Array2<f32> {
        &mut self.embeddings
    }

    /// The edge-type embedding table.
    pub fn edge_type_embeddings(&self) -> &Array2<f32> {
        &self.edge_type_embeddings
    }

    /// Mutable access to the edge-type table for the external optimizer.
    pub fn edge_type_embeddings_mut(&mut self) -> &mut Array2<f32> {
        &mut self.edge_type_embeddings
    }
}

/// Xavier/Glorot uniform initialization for a `[rows, cols]` table.
fn xavier_uniform<R: Rng>(rows: usize, cols: usize, rng: &mut R) -> Array2<f32> {
    let bound = (6.0 / (rows + cols) as f32).sqrt();
    Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-bound..=bound))
}
