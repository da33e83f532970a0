//! Errors returned by [`PolyTree`](super::PolyTree) operations.

use super::ConfigError;
use crate::poly::PolyError;

/// Errors that abort `fit`, `predict`, `apply`, `prune` or a traversal query.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// The operation needs a fitted tree.
    #[error("tree is not fitted; call fit() first")]
    NotFitted,

    /// `fit` was called without any rows.
    #[error("cannot fit a tree to an empty dataset")]
    EmptyDataset,

    /// `fit` was called with data that has no feature columns.
    #[error("training data must have at least one feature column")]
    NoFeatures,

    /// X and y disagree on the number of rows.
    #[error("X has {x_rows} rows but y has {y_len} values")]
    RowMismatch { x_rows: usize, y_len: usize },

    /// Input has a different number of features than the fitted tree.
    #[error("expected {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    /// Only 1-D (single sample) and 2-D (batch) inputs are accepted.
    #[error("expected a 1-D or 2-D array, got {0} dimensions")]
    UnsupportedInputDims(usize),

    /// A configured split dimension is not a column of the training data.
    #[error("split dimension {dim} out of range for {n_features} features")]
    InvalidSplitDimension { dim: usize, n_features: usize },

    /// A dedicated rayon pool could not be created.
    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("polynomial fit failed: {0}")]
    Poly(#[from] PolyError),
}
