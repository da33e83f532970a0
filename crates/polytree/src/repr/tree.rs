//! A fitted tree and the state derived while building it.

use super::TreeNode;

/// Output of one `fit` call.
///
/// Owns the root node; everything else is configuration resolved against the
/// training data (cardinality, effective leaf size and smoothing strength,
/// split dimensions).
#[derive(Debug, Clone)]
pub struct FittedTree {
    pub(crate) root: TreeNode,
    pub(crate) n_features: usize,
    pub(crate) cardinality: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) smoothing: f64,
    pub(crate) actual_max_depth: usize,
    pub(crate) split_dims: Vec<usize>,
}

impl FittedTree {
    #[inline]
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Number of input features seen during `fit`.
    #[inline]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of basis terms per node polynomial.
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    #[inline]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    /// Smoothing strength used by prediction (`k × min_samples_leaf`).
    #[inline]
    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Deepest depth at which a split was accepted during `fit`.
    #[inline]
    pub fn actual_max_depth(&self) -> usize {
        self.actual_max_depth
    }

    #[inline]
    pub fn split_dims(&self) -> &[usize] {
        &self.split_dims
    }

    pub fn n_nodes(&self) -> usize {
        self.root.iter().count()
    }

    pub fn n_leaves(&self) -> usize {
        self.root.iter().filter(|n| n.is_leaf()).count()
    }

    /// Depth of the deepest remaining leaf (changes after pruning).
    pub fn depth(&self) -> usize {
        self.root.max_depth()
    }
}
