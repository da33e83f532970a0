//! Tree node types.

use ndarray::{Array1, Array2, ArrayView1};

use crate::poly::PolySurrogate;

/// Training rows that reached a node.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
}

impl NodeData {
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Self {
        debug_assert_eq!(x.nrows(), y.len());
        Self { x, y }
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.y.len()
    }
}

/// Held-out statistics attached by pruning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PruneStats {
    /// Mean squared error of this node's own polynomial on the held-out rows.
    pub test_loss: f64,
    /// Child-size-weighted test loss of the two children, for nodes that
    /// still had children when they were evaluated.
    pub lower_loss: Option<f64>,
}

/// Split rule and the two owned subtrees of an internal node.
///
/// Rows with `x[feature] <= threshold` go left, all others go right.
#[derive(Debug, Clone)]
pub struct Branch {
    pub feature: usize,
    pub threshold: f64,
    pub left: Box<TreeNode>,
    pub right: Box<TreeNode>,
}

impl Branch {
    #[inline]
    pub fn goes_left(&self, value: f64) -> bool {
        value <= self.threshold
    }

    /// Child a sample is routed to.
    #[inline]
    pub fn child_for(&self, sample: ArrayView1<'_, f64>) -> &TreeNode {
        if self.goes_left(sample[self.feature]) {
            &self.left
        } else {
            &self.right
        }
    }
}

/// A node of a polynomial regression tree.
///
/// Every node, internal or leaf, owns the polynomial fitted to the training
/// rows that reached it. A node is a leaf exactly when it has no [`Branch`].
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub(crate) index: usize,
    pub(crate) depth: usize,
    pub(crate) loss: f64,
    pub(crate) poly: PolySurrogate,
    pub(crate) n_samples: usize,
    pub(crate) data: Option<NodeData>,
    pub(crate) branch: Option<Branch>,
    pub(crate) flag: bool,
    pub(crate) prune: Option<PruneStats>,
}

impl TreeNode {
    pub(crate) fn new(index: usize, depth: usize, loss: f64, poly: PolySurrogate, data: NodeData) -> Self {
        Self {
            index,
            depth,
            loss,
            poly,
            n_samples: data.n_rows(),
            data: Some(data),
            branch: None,
            flag: false,
            prune: None,
        }
    }

    /// Unique index, assigned in creation order.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Training MSE of this node's own polynomial.
    #[inline]
    pub fn loss(&self) -> f64 {
        self.loss
    }

    #[inline]
    pub fn poly(&self) -> &PolySurrogate {
        &self.poly
    }

    /// Training rows that reached this node (zeroed by pruning when no
    /// held-out rows reach it).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Retained training rows, if any.
    #[inline]
    pub fn data(&self) -> Option<&NodeData> {
        self.data.as_ref()
    }

    #[inline]
    pub fn branch(&self) -> Option<&Branch> {
        self.branch.as_ref()
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.branch.is_none()
    }

    #[inline]
    pub fn j_feature(&self) -> Option<usize> {
        self.branch.as_ref().map(|b| b.feature)
    }

    #[inline]
    pub fn threshold(&self) -> Option<f64> {
        self.branch.as_ref().map(|b| b.threshold)
    }

    #[inline]
    pub fn left(&self) -> Option<&TreeNode> {
        self.branch.as_ref().map(|b| b.left.as_ref())
    }

    #[inline]
    pub fn right(&self) -> Option<&TreeNode> {
        self.branch.as_ref().map(|b| b.right.as_ref())
    }

    /// Whether this node lies on the most recently flagged path.
    #[inline]
    pub fn flag(&self) -> bool {
        self.flag
    }

    #[inline]
    pub fn prune_stats(&self) -> Option<&PruneStats> {
        self.prune.as_ref()
    }

    #[inline]
    pub fn test_loss(&self) -> Option<f64> {
        self.prune.map(|p| p.test_loss)
    }

    #[inline]
    pub fn lower_loss(&self) -> Option<f64> {
        self.prune.and_then(|p| p.lower_loss)
    }

    /// Pre-order iterator over this subtree, left before right.
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter { stack: vec![self] }
    }

    /// Deepest leaf depth in this subtree.
    pub fn max_depth(&self) -> usize {
        self.iter().map(|n| n.depth).max().unwrap_or(self.depth)
    }
}

/// Pre-order traversal (node, left subtree, right subtree).
pub struct NodeIter<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Some(branch) = &node.branch {
            self.stack.push(&branch.right);
            self.stack.push(&branch.left);
        }
        Some(node)
    }
}
