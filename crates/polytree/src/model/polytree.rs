//! PolyTree model implementation.
//!
//! High-level wrapper around [`FittedTree`] with fitting, smoothed
//! prediction, pruning and traversal queries. The configuration is kept
//! separately so the same model can be refit on new data.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ndarray::{Array1, ArrayView1, ArrayView2, ArrayViewD};

use super::{ConfigError, ModelError, PolyTreeConfig};
use crate::data::{as_samples, check_features, check_xy};
use crate::export::{dot, ExportError};
use crate::inference::traversal::{clear_flags, leaf_indices, leaf_polys, paths_to, splits};
use crate::inference::{apply, find_node, flag_path, NodeQuery, PathStep, Predictor};
use crate::poly::PolySurrogate;
use crate::repr::{FittedTree, TreeNode};
use crate::training::{PruneSummary, Pruner, TrainingLogger, TreeBuilder};
use crate::utils::run_with_threads;

/// Polynomial regression tree.
///
/// Every node holds a polynomial surrogate fitted to the rows that reach it;
/// predictions blend the leaf polynomial with its ancestors.
#[derive(Debug, Clone)]
pub struct PolyTree {
    config: PolyTreeConfig,
    state: Option<FittedTree>,
}

impl PolyTree {
    /// Create an unfitted tree.
    ///
    /// The config is validated again, so deserialized configs are checked too.
    pub fn new(config: PolyTreeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, state: None })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &PolyTreeConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// The fitted tree, if any.
    pub fn tree(&self) -> Option<&FittedTree> {
        self.state.as_ref()
    }

    fn fitted(&self) -> Result<&FittedTree, ModelError> {
        self.state.as_ref().ok_or(ModelError::NotFitted)
    }

    fn fitted_mut(&mut self) -> Result<&mut FittedTree, ModelError> {
        self.state.as_mut().ok_or(ModelError::NotFitted)
    }

    pub fn root(&self) -> Result<&TreeNode, ModelError> {
        Ok(self.fitted()?.root())
    }

    /// Number of basis terms of every node polynomial.
    pub fn cardinality(&self) -> Result<usize, ModelError> {
        Ok(self.fitted()?.cardinality())
    }

    /// `min_samples_leaf` in effect for the last fit (configured or derived).
    pub fn min_samples_leaf(&self) -> Result<usize, ModelError> {
        Ok(self.fitted()?.min_samples_leaf())
    }

    /// Deepest depth at which a split was accepted during the last fit.
    pub fn actual_max_depth(&self) -> Result<usize, ModelError> {
        Ok(self.fitted()?.actual_max_depth())
    }

    /// Effective smoothing constant, `k × min_samples_leaf`.
    pub fn smoothing(&self) -> Result<f64, ModelError> {
        Ok(self.fitted()?.smoothing())
    }

    pub fn n_nodes(&self) -> Result<usize, ModelError> {
        Ok(self.fitted()?.n_nodes())
    }

    pub fn n_leaves(&self) -> Result<usize, ModelError> {
        Ok(self.fitted()?.n_leaves())
    }

    // =========================================================================
    // Fitting
    // =========================================================================

    /// Grow a tree on `(x, y)`, replacing any previous fit.
    ///
    /// A failed fit leaves the model unfitted.
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), ModelError> {
        self.state = None;
        check_xy(x, y)?;
        if x.nrows() == 0 {
            return Err(ModelError::EmptyDataset);
        }
        if x.ncols() == 0 {
            return Err(ModelError::NoFeatures);
        }

        let builder = TreeBuilder::new(&self.config, x.ncols())?;
        self.state = Some(builder.build(x, y)?);
        Ok(())
    }

    /// Fit on a dedicated thread pool.
    ///
    /// `n_threads`: 0 = auto, 1 = sequential, >1 = exact count. Overrides
    /// the configured parallelism for this fit only; the tree is the same
    /// either way.
    pub fn fit_with_threads(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        n_threads: usize,
    ) -> Result<(), ModelError> {
        self.state = None;
        let config = self.config.clone();
        let state = run_with_threads(n_threads, |parallelism| {
            let mut model = Self {
                config: PolyTreeConfig { parallelism, ..config },
                state: None,
            };
            model.fit(x, y).map(|()| model.state)
        })
        .map_err(|e| ModelError::ThreadPool(e.to_string()))??;
        self.state = state;
        Ok(())
    }

    /// Prune against held-out data.
    ///
    /// `tolerance_percent` is the relative improvement (in percent of a
    /// node's held-out loss) its children must achieve to survive.
    pub fn prune(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        tolerance_percent: f64,
    ) -> Result<PruneSummary, ModelError> {
        let logger = TrainingLogger::new(self.config.verbosity);
        let tree = self.fitted_mut()?;
        check_xy(x, y)?;
        check_features(x, tree.n_features())?;

        let pruner = Pruner::new(tolerance_percent, logger);
        Ok(pruner.prune(&mut tree.root, x, y)?)
    }

    // =========================================================================
    // Prediction
    // =========================================================================

    /// Smoothed prediction for every row of `x`.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let tree = self.fitted()?;
        check_features(x, tree.n_features())?;
        Ok(Predictor::new(tree).predict(x)?)
    }

    /// Leaf index reached by each sample.
    ///
    /// Accepts a single sample (1-D) or a batch (2-D).
    pub fn apply(&self, x: ArrayViewD<'_, f64>) -> Result<Vec<usize>, ModelError> {
        let tree = self.fitted()?;
        let x = as_samples(x)?;
        check_features(x, tree.n_features())?;
        Ok(apply(tree.root(), x))
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Distinct `(threshold, feature)` pairs, left subtree before right.
    pub fn get_splits(&self) -> Result<Vec<(f64, usize)>, ModelError> {
        Ok(splits(self.fitted()?.root()))
    }

    /// Leaf polynomials, left to right.
    pub fn get_polys(&self) -> Result<Vec<&PolySurrogate>, ModelError> {
        Ok(leaf_polys(self.fitted()?.root()))
    }

    /// Root-to-leaf paths keyed by leaf index.
    ///
    /// With `None` every leaf is returned; otherwise only the leaves reached
    /// by the rows of `x`.
    pub fn get_paths(
        &self,
        x: Option<ArrayView2<'_, f64>>,
    ) -> Result<BTreeMap<usize, Vec<PathStep>>, ModelError> {
        let tree = self.fitted()?;
        let leaves: BTreeSet<usize> = match x {
            None => leaf_indices(tree.root()),
            Some(x) => {
                check_features(x, tree.n_features())?;
                apply(tree.root(), x).into_iter().collect()
            }
        };
        Ok(paths_to(tree.root(), &leaves))
    }

    /// Look a node up by index or by the leaf a sample reaches.
    ///
    /// ```
    /// # use ndarray::{Array1, Array2};
    /// # use polytree::model::{PolyTree, PolyTreeConfig};
    /// # let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64 / 39.0);
    /// # let y: Array1<f64> = x.column(0).mapv(|v| (v - 0.5).abs());
    /// # let mut tree = PolyTree::new(PolyTreeConfig::default()).unwrap();
    /// # tree.fit(x.view(), y.view()).unwrap();
    /// let root = tree.get_node(1usize).unwrap().unwrap();
    /// assert_eq!(root.depth(), 0);
    ///
    /// let leaf = tree.get_node(&[0.2]).unwrap().unwrap();
    /// assert!(leaf.is_leaf());
    /// ```
    pub fn get_node<'q>(&self, query: impl Into<NodeQuery<'q>>) -> Result<Option<&TreeNode>, ModelError> {
        let tree = self.fitted()?;
        let query = query.into();
        if let NodeQuery::Sample(sample) = query {
            if sample.len() != tree.n_features() {
                return Err(ModelError::FeatureMismatch {
                    expected: tree.n_features(),
                    got: sample.len(),
                });
            }
        }
        Ok(find_node(tree.root(), query))
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Graphviz DOT source of the tree.
    ///
    /// With a `sample`, the nodes and edges on its path are highlighted.
    /// Feature names default to `x_0 .. x_{d-1}`.
    pub fn to_graphviz(
        &mut self,
        sample: Option<&[f64]>,
        feature_names: Option<&[String]>,
    ) -> Result<String, ExportError> {
        let tree = self.fitted_mut()?;
        let n_dims = tree.root().poly().dimensions();
        let names = match feature_names {
            Some(names) if names.len() != n_dims => {
                return Err(ExportError::FeatureNames {
                    expected: n_dims,
                    got: names.len(),
                });
            }
            Some(names) => names.to_vec(),
            None => dot::default_feature_names(n_dims),
        };

        match sample {
            Some(sample) => {
                if sample.len() != tree.n_features() {
                    return Err(ModelError::FeatureMismatch {
                        expected: tree.n_features(),
                        got: sample.len(),
                    }
                    .into());
                }
                flag_path(&mut tree.root, ArrayView1::from(sample));
            }
            None => clear_flags(&mut tree.root),
        }
        Ok(dot::render(tree.root(), &names))
    }

    /// Write [`to_graphviz`](Self::to_graphviz) output to `path`.
    pub fn write_graphviz(
        &mut self,
        path: impl AsRef<Path>,
        sample: Option<&[f64]>,
        feature_names: Option<&[String]>,
    ) -> Result<(), ExportError> {
        let text = self.to_graphviz(sample, feature_names)?;
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
