//! polytree: polynomial regression trees for Rust.
//!
//! A regression tree whose nodes each carry a least-squares polynomial
//! surrogate fitted to the rows that reach them. Predictions blend the leaf
//! polynomial with its ancestors, and a fitted tree can be pruned against
//! held-out data.
//!
//! # Key Types
//!
//! - [`PolyTree`] - High-level model with fit / predict / apply / prune
//! - [`PolyTreeConfig`] - Validated configuration builder
//! - [`SplitCriterion`] / [`SearchStrategy`] - How splits are found
//! - [`BasisKind`] - Index set of the node polynomials
//!
//! # Fitting
//!
//! Use `PolyTreeConfig::builder()` to configure, then `PolyTree::fit()`.
//! See the [`model`] module for an example.
//!
//! # Exporting
//!
//! `PolyTree::to_graphviz()` returns DOT source; see the [`export`] module.

// Re-export approx traits for users who want to compare predictions
pub use approx;

pub mod data;
pub mod export;
pub mod inference;
pub mod model;
pub mod poly;
pub mod repr;
pub mod testing;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// High-level model types
pub use model::{ConfigError, ModelError, PolyTree, PolyTreeConfig};

// Configuration enums
pub use poly::BasisKind;
pub use training::{SearchStrategy, SplitCriterion, Verbosity};

// Tree representation
pub use repr::{FittedTree, TreeNode};

// Export
pub use export::ExportError;

// Shared utilities
pub use utils::Parallelism;
