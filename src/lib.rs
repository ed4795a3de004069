//! # basketgraph
//!
//! Recommendation core for retail transaction logs: builds a weighted
//! heterogeneous customer–item graph and learns node embeddings via
//! LightGCN-style propagation.
//!
//! ## Architecture
//!
//! - **Indexing** (`index`): raw ids → dense node indices, customers [0, Nu), items [Nu, N)
//! - **Edge builders** (`edges`): time-decayed purchases, market-basket co-occurrence, similarity links
//! - **Assembly** (`graph`): symmetrized, typed multigraph snapshot as parallel arrays
//! - **Propagation** (`model`): L-layer symmetric-normalized aggregation with 1/(L+1) layer averaging
//! - **Scoring** (`scorer`): dot-product top-K with interaction exclusion
//! - **Support** (`features`, `interactions`, `eval`, `meta`): static node features,
//!   splits and negative sampling, ranking metrics, persistable metadata
//!
//! CSV/parquet loading, the training loop, and optimizer internals live
//! outside this crate; [`model::PropagationModel::embeddings_mut`] is the
//! seam an external optimizer updates between forward passes.
//!
//! ## Library usage
//!
//! ```
//! use basketgraph::model::{ModelConfig, PropagationModel};
//! use basketgraph::pipeline::{self, PipelineConfig};
//! use basketgraph::scorer::Scorer;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! # fn demo(transactions: Vec<basketgraph::txn::Transaction>) -> basketgraph::error::RecResult<()> {
//! let built = pipeline::build(transactions, &PipelineConfig::default())?;
//! let mut rng = StdRng::seed_from_u64(42);
//! let model = PropagationModel::new(
//!     built.meta.num_customers,
//!     built.meta.num_products,
//!     ModelConfig::default(),
//!     &mut rng,
//! );
//! let embeddings = model.propagate(&built.snapshot)?;
//! let scorer = Scorer::new(&embeddings, built.meta.num_customers)?;
//! let exclude = built.meta.interactions.item_set(0);
//! let picks = scorer.top_k(0, 10, Some(&exclude))?;
//! # let _ = picks;
//! # Ok(())
//! # }
//! ```

pub mod edges;
pub mod error;
pub mod eval;
pub mod features;
pub mod graph;
pub mod index;
pub mod interactions;
pub mod meta;
pub mod model;
pub mod pipeline;
pub mod scorer;
pub mod txn;
