//! Tree training: node fitting, split search, assembly and pruning.
//!
//! # Module Organization
//!
//! - [`fitter`]: least-squares fit of one node ([`NodeFitter`])
//! - [`split`]: split criteria, threshold search and the gradient selector
//! - [`builder`]: recursive assembly ([`TreeBuilder`], [`NodeIndexer`])
//! - [`pruner`]: held-out pruning ([`Pruner`])
//! - [`logger`]: verbosity-gated diagnostics ([`TrainingLogger`])
//!
//! Most users go through [`PolyTree`](crate::model::PolyTree) instead of
//! using these types directly.

pub mod builder;
pub mod fitter;
pub mod logger;
pub mod pruner;
pub mod split;

pub use builder::{NodeIndexer, TreeBuilder};
pub use fitter::{NodeFit, NodeFitter};
pub use logger::{TrainingLogger, Verbosity};
pub use pruner::{PruneSummary, Pruner};
pub use split::{
    ChildFit, GradientSplit, GradientSplitSelector, SearchResult, SearchStrategy, SplitCriterion,
    SplitOutcome, SplitSearch,
};
