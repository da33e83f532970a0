//! Recursive tree assembly.
//!
//! The builder resolves tree-wide settings against the training data once
//! (basis cardinality, effective `min_samples_leaf`, split dimensions,
//! smoothing strength), then grows the tree depth first: fit the root,
//! search a split, attach both already-fitted children, recurse left then
//! right.

use ndarray::{ArrayView1, ArrayView2};

use super::fitter::NodeFitter;
use super::logger::TrainingLogger;
use super::split::SplitSearch;
use crate::model::{ModelError, PolyTreeConfig};
use crate::repr::{Branch, FittedTree, NodeData, TreeNode};

// =============================================================================
// NodeIndexer
// =============================================================================

/// Node index counter scoped to one `fit` call.
///
/// The counter advances once for every polynomial fit and once for every
/// node allocation, so indices are unique and increase in creation order
/// but are not contiguous.
#[derive(Debug, Clone, Default)]
pub struct NodeIndexer {
    next: usize,
}

impl NodeIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for `n` polynomial fits.
    #[inline]
    pub fn record_fits(&mut self, n: usize) {
        self.next += n;
    }

    /// Take the next index for a new node.
    #[inline]
    pub fn allocate(&mut self) -> usize {
        let index = self.next;
        self.next += 1;
        index
    }

    /// Current counter value.
    #[inline]
    pub fn peek(&self) -> usize {
        self.next
    }
}

/// Mutable state threaded through one build.
#[derive(Debug, Default)]
struct BuildContext {
    indexer: NodeIndexer,
    actual_max_depth: usize,
}

// =============================================================================
// TreeBuilder
// =============================================================================

/// Grows a [`FittedTree`] from a validated configuration.
#[derive(Debug)]
pub struct TreeBuilder<'a> {
    config: &'a PolyTreeConfig,
    fitter: NodeFitter,
    n_features: usize,
    min_samples_leaf: usize,
    split_dims: Vec<usize>,
    logger: TrainingLogger,
}

impl<'a> TreeBuilder<'a> {
    /// Resolve tree-wide settings for data with `n_features` columns.
    ///
    /// `min_samples_leaf` defaults to `ceil(1.25 × cardinality)`, which also
    /// replaces an explicit value equal to the cardinality. An explicit value
    /// below the cardinality is kept, with a warning.
    ///
    /// # Errors
    ///
    /// - [`ModelError::InvalidSplitDimension`] if a configured split dimension
    ///   is not a column of the data
    /// - [`ModelError::Poly`] if the basis cannot be built for `n_features`
    pub fn new(config: &'a PolyTreeConfig, n_features: usize) -> Result<Self, ModelError> {
        let fitter = NodeFitter::new(config.basis, config.order, n_features)?;
        let cardinality = fitter.cardinality();
        let logger = TrainingLogger::new(config.verbosity);

        let auto_leaf = (cardinality * 5).div_ceil(4);
        let min_samples_leaf = match config.min_samples_leaf {
            None => auto_leaf,
            Some(m) if m == cardinality => auto_leaf,
            Some(m) => {
                if cardinality > m {
                    logger.warn_cardinality(cardinality, m);
                }
                m
            }
        };

        let split_dims = match &config.split_dims {
            None => (0..n_features).collect(),
            Some(dims) => {
                if let Some(&dim) = dims.iter().find(|&&d| d >= n_features) {
                    return Err(ModelError::InvalidSplitDimension { dim, n_features });
                }
                dims.clone()
            }
        };

        Ok(Self {
            config,
            fitter,
            n_features,
            min_samples_leaf,
            split_dims,
            logger,
        })
    }

    #[inline]
    pub fn cardinality(&self) -> usize {
        self.fitter.cardinality()
    }

    #[inline]
    pub fn min_samples_leaf(&self) -> usize {
        self.min_samples_leaf
    }

    #[inline]
    pub fn split_dims(&self) -> &[usize] {
        &self.split_dims
    }

    fn search(&self) -> SplitSearch<'_> {
        SplitSearch {
            fitter: &self.fitter,
            criterion: self.config.criterion,
            strategy: self.config.search,
            samples: self.config.samples,
            min_samples_leaf: self.min_samples_leaf,
            split_dims: &self.split_dims,
            parallelism: self.config.parallelism,
        }
    }

    /// Grow the tree on `(x, y)`.
    ///
    /// Any polynomial fit failure aborts the whole build.
    pub fn build(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<FittedTree, ModelError> {
        self.logger
            .start_fit(x.nrows(), x.ncols(), self.cardinality(), self.min_samples_leaf);

        let mut ctx = BuildContext::default();
        let root_fit = self.fitter.fit(x, y)?;
        ctx.indexer.record_fits(1);
        let mut root = TreeNode::new(
            ctx.indexer.allocate(),
            0,
            root_fit.loss,
            root_fit.poly,
            NodeData::new(x.to_owned(), y.to_owned()),
        );

        self.grow(&mut root, &mut ctx)?;

        let tree = FittedTree {
            root,
            n_features: self.n_features,
            cardinality: self.cardinality(),
            min_samples_leaf: self.min_samples_leaf,
            smoothing: self.config.k * self.min_samples_leaf as f64,
            actual_max_depth: ctx.actual_max_depth,
            split_dims: self.split_dims.clone(),
        };
        self.logger
            .finish_fit(tree.n_nodes(), tree.n_leaves(), tree.actual_max_depth);
        Ok(tree)
    }

    fn grow(&self, node: &mut TreeNode, ctx: &mut BuildContext) -> Result<(), ModelError> {
        let Some(data) = node.data.as_ref() else {
            return Ok(());
        };
        let (n_rows, n_cols) = data.x.dim();

        if node.depth >= self.config.max_depth {
            self.logger.node_outcome(n_rows, n_cols, false, 0);
            return Ok(());
        }

        let result = self.search().find_split(data, node.loss)?;
        ctx.indexer.record_fits(result.polys_fit);
        self.logger
            .node_outcome(n_rows, n_cols, result.split.is_some(), result.polys_fit);

        let Some(split) = result.split else {
            return Ok(());
        };

        ctx.actual_max_depth = ctx.actual_max_depth.max(node.depth);
        let depth = node.depth + 1;
        let left = TreeNode::new(
            ctx.indexer.allocate(),
            depth,
            split.left.fit.loss,
            split.left.fit.poly,
            split.left.data,
        );
        let right = TreeNode::new(
            ctx.indexer.allocate(),
            depth,
            split.right.fit.loss,
            split.right.fit.poly,
            split.right.data,
        );

        if !self.config.all_data {
            node.data = None;
        }
        let branch = node.branch.insert(Branch {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(left),
            right: Box::new(right),
        });

        self.grow(&mut branch.left, ctx)?;
        self.grow(&mut branch.right, ctx)
    }
}
