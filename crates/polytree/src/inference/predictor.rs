//! Smoothed prediction.
//!
//! Rows are routed through the tree in batches. Every node on a row's path
//! evaluates its own polynomial for that row, so each row ends up with one
//! `(prediction, n_samples)` pair per depth. The final value starts from the
//! leaf prediction and is pulled towards each ancestor below the root in turn:
//!
//! ```text
//! s ← (s · n_a + pred_a · k) / (k + n_a)
//! ```
//!
//! Ancestors with many training rows barely move `s`; a large `k` pulls it
//! towards the coarser models higher up. The root model never takes part, so
//! a tree of depth 1 predicts with its leaf polynomials unchanged.

use ndarray::{Array1, ArrayView2, Axis};

use crate::data::partition_indices;
use crate::poly::PolyError;
use crate::repr::{FittedTree, TreeNode};

/// One visited node on a row's path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPrediction {
    pub prediction: f64,
    pub n_samples: usize,
}

/// Blend a root-to-leaf sequence of node predictions.
///
/// Walks from the leaf up to depth 1, leaving the root out; stops as soon as
/// a node with no training rows is met.
pub fn smooth(path: &[PathPrediction], k: f64) -> f64 {
    let Some((leaf, above)) = path.split_last() else {
        return f64::NAN;
    };
    let mut smoothed = leaf.prediction;
    if leaf.n_samples == 0 {
        return smoothed;
    }
    let ancestors = above.get(1..).unwrap_or_default();
    for node in ancestors.iter().rev() {
        if node.n_samples == 0 {
            break;
        }
        let n = node.n_samples as f64;
        smoothed = (smoothed * n + node.prediction * k) / (k + n);
    }
    smoothed
}

/// Batch predictor over a fitted tree.
#[derive(Debug, Clone, Copy)]
pub struct Predictor<'a> {
    tree: &'a FittedTree,
}

impl<'a> Predictor<'a> {
    pub fn new(tree: &'a FittedTree) -> Self {
        Self { tree }
    }

    /// Per-row predictions of every node on the path, root first.
    pub fn path_predictions(&self, x: ArrayView2<'_, f64>) -> Result<Vec<Vec<PathPrediction>>, PolyError> {
        let depth = self.tree.depth();
        let mut paths: Vec<Vec<PathPrediction>> =
            (0..x.nrows()).map(|_| Vec::with_capacity(depth + 1)).collect();
        let rows: Vec<usize> = (0..x.nrows()).collect();
        route(self.tree.root(), x, &rows, &mut paths)?;
        Ok(paths)
    }

    /// Smoothed prediction for every row of `x`.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, PolyError> {
        let k = self.tree.smoothing();
        let paths = self.path_predictions(x)?;
        Ok(paths.iter().map(|path| smooth(path, k)).collect())
    }

    /// Unsmoothed leaf prediction for every row of `x`.
    pub fn predict_leaf(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, PolyError> {
        let paths = self.path_predictions(x)?;
        Ok(paths
            .iter()
            .map(|path| path.last().map_or(f64::NAN, |p| p.prediction))
            .collect())
    }
}

/// Evaluate `node` on `rows` and recurse into the children with the rows that
/// go each way.
fn route(
    node: &TreeNode,
    x: ArrayView2<'_, f64>,
    rows: &[usize],
    paths: &mut [Vec<PathPrediction>],
) -> Result<(), PolyError> {
    if rows.is_empty() {
        return Ok(());
    }

    let values = node.poly().evaluate(x.select(Axis(0), rows).view())?;
    for (&row, &prediction) in rows.iter().zip(values.iter()) {
        paths[row].push(PathPrediction {
            prediction,
            n_samples: node.n_samples(),
        });
    }

    if let Some(branch) = node.branch() {
        let (left, right) = partition_indices(x, rows, branch.feature, branch.threshold);
        route(&branch.left, x, &left, paths)?;
        route(&branch.right, x, &right, paths)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn step(prediction: f64, n_samples: usize) -> PathPrediction {
        PathPrediction {
            prediction,
            n_samples,
        }
    }

    #[test]
    fn single_node_path_returns_its_prediction() {
        assert_eq!(smooth(&[step(2.5, 10)], 1.0), 2.5);
    }


    #[test]
    fn leaf_is_pulled_towards_ancestors() {
        // root 7.0 (n=200) is skipped; parent 0.0 (n=100), leaf 1.0 (n=10), k=100:
        // s = (1.0 * 100 + 0.0 * 100) / (100 + 100) = 0.5
        let path = [step(7.0, 200), step(0.0, 100), step(1.0, 10)];
        assert_abs_diff_eq!(smooth(&path, 100.0), 0.5, epsilon = 1e-12);
        // Small k keeps the leaf almost unchanged.
        assert!(smooth(&path, 1e-6) > 0.999);
    }

    #[test]
    fn root_is_left_out_of_the_blend() {
        let path = [step(0.0, 100), step(1.0, 10)];
        assert_eq!(smooth(&path, 100.0), 1.0);
        assert_eq!(smooth(&path, 1e6), 1.0);
    }

    #[test]
    fn blending_walks_every_ancestor_below_the_root() {
        // leaf 4 (n=5), k=10, root 100 (n=40) skipped
        // after parent 2 (n=10):      (4*10 + 2*10) / 20 = 3
        // after grandparent 0 (n=20): (3*20 + 0*10) / 30 = 2
        let path = [step(100.0, 40), step(0.0, 20), step(2.0, 10), step(4.0, 5)];
        assert_abs_diff_eq!(smooth(&path, 10.0), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_sample_nodes_stop_the_walk() {
        let path = [step(9.0, 40), step(0.0, 20), step(2.0, 0), step(4.0, 5)];
        assert_eq!(smooth(&path, 10.0), 4.0);
        let path = [step(9.0, 40), step(0.0, 20), step(4.0, 0)];
        assert_eq!(smooth(&path, 10.0), 4.0);
    }

    #[test]
    fn depth_one_tree_predicts_its_leaf_polynomials() {
        use crate::model::PolyTreeConfig;
        use crate::training::TreeBuilder;
        use ndarray::Array2;

        // V shape, so the root splits once
        let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64 / 39.0);
        let y = x.column(0).mapv(|v| (v - 0.5).abs());
        let config = PolyTreeConfig::builder().max_depth(1).k(1.0).build().unwrap();
        let tree = TreeBuilder::new(&config, 1)
            .unwrap()
            .build(x.view(), y.view())
            .unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.smoothing(), 3.0);

        let predictor = Predictor::new(&tree);
        assert_eq!(
            predictor.predict(x.view()).unwrap(),
            predictor.predict_leaf(x.view()).unwrap()
        );
    }
}
