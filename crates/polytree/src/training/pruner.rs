//! Post-fit pruning against held-out data.

use ndarray::{ArrayView1, ArrayView2};

use super::logger::TrainingLogger;
use crate::data::take_rows;
use crate::poly::PolyError;
use crate::repr::{PruneStats, TreeNode};
use crate::utils::mean_squared_error;

/// Outcome of one pruning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    /// Internal nodes turned into leaves.
    pub collapsed: usize,
    /// Nodes removed from the tree, counting whole subtrees.
    pub removed: usize,
}

/// Bottom-up pruner.
///
/// Every node is scored on the held-out rows that reach it. A node whose
/// children do not beat its own held-out loss by more than `tolerance`
/// (a fraction of that loss) loses both children.
#[derive(Debug, Clone)]
pub struct Pruner {
    tolerance: f64,
    logger: TrainingLogger,
}

impl Pruner {
    /// Create a pruner from a tolerance given in percent.
    pub fn new(tolerance_percent: f64, logger: TrainingLogger) -> Self {
        Self {
            tolerance: tolerance_percent / 100.0,
            logger,
        }
    }

    /// Tolerance as a fraction.
    #[inline]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Prune the subtree under `root` in place.
    ///
    /// Starts at `root` itself, so a root that does not improve on its own
    /// held-out loss becomes a leaf.
    pub fn prune(
        &self,
        root: &mut TreeNode,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<PruneSummary, PolyError> {
        let mut summary = PruneSummary::default();
        let rows: Vec<usize> = (0..x.nrows()).collect();
        self.prune_node(root, x, y, &rows, &mut summary)?;
        self.logger
            .finish_prune(summary.collapsed, root.iter().count());
        Ok(summary)
    }

    fn prune_node(
        &self,
        node: &mut TreeNode,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        rows: &[usize],
        summary: &mut PruneSummary,
    ) -> Result<(), PolyError> {
        if rows.is_empty() {
            mark_unreached(node);
            return Ok(());
        }

        let subset = take_rows(x, y, rows);
        let predicted = node.poly.evaluate(subset.x.view())?;
        let test_loss = mean_squared_error(subset.y.iter(), predicted.iter());
        node.prune = Some(PruneStats {
            test_loss,
            lower_loss: None,
        });

        let Some(branch) = node.branch.as_mut() else {
            return Ok(());
        };

        let column = x.column(branch.feature);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&r| branch.goes_left(column[r]));
        self.prune_node(&mut branch.left, x, y, &left_rows, summary)?;
        self.prune_node(&mut branch.right, x, y, &right_rows, summary)?;

        let lower_loss = weighted_child_loss(&branch.left, &branch.right);
        node.prune = Some(PruneStats {
            test_loss,
            lower_loss: Some(lower_loss),
        });

        if lower_loss + self.tolerance * test_loss > test_loss {
            self.logger.collapse(node.index, lower_loss, test_loss);
            summary.collapsed += 1;
            summary.removed += node.iter().count() - 1;
            node.branch = None;
        }
        Ok(())
    }
}

/// Child test losses weighted by the children's sample counts; `0` if both are empty.
fn weighted_child_loss(left: &TreeNode, right: &TreeNode) -> f64 {
    let n_left = left.n_samples as f64;
    let n_right = right.n_samples as f64;
    if n_left + n_right == 0.0 {
        return 0.0;
    }
    let loss = |node: &TreeNode| node.test_loss().unwrap_or(0.0);
    (loss(left) * n_left + loss(right) * n_right) / (n_left + n_right)
}

/// Zero the held-out statistics of a subtree no held-out row reaches.
fn mark_unreached(node: &mut TreeNode) {
    node.prune = Some(PruneStats {
        test_loss: 0.0,
        lower_loss: None,
    });
    node.n_samples = 0;
    if let Some(branch) = node.branch.as_mut() {
        mark_unreached(&mut branch.left);
        mark_unreached(&mut branch.right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PolyTreeConfig;
    use crate::repr::FittedTree;
    use crate::training::{TreeBuilder, Verbosity};
    use ndarray::{Array1, Array2};

    fn silent(tolerance_percent: f64) -> Pruner {
        Pruner::new(tolerance_percent, TrainingLogger::new(Verbosity::Silent))
    }

    fn v_shape(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 1), |(i, _)| i as f64 / (n - 1) as f64);
        let y = x.column(0).mapv(|v| (v - 0.5).abs());
        (x, y)
    }

    fn fit(max_depth: usize) -> FittedTree {
        let (x, y) = v_shape(80);
        let config = PolyTreeConfig::builder().max_depth(max_depth).build().unwrap();
        TreeBuilder::new(&config, 1).unwrap().build(x.view(), y.view()).unwrap()
    }

    #[test]
    fn useful_split_survives_pruning() {
        let mut tree = fit(1);
        let (x, y) = v_shape(41);
        let summary = silent(0.0).prune(&mut tree.root, x.view(), y.view()).unwrap();
        assert_eq!(summary.collapsed, 0);
        assert!(!tree.root().is_leaf());
        let root = tree.root();
        assert!(root.lower_loss().unwrap() < root.test_loss().unwrap());
    }

    #[test]
    fn holdout_matching_the_root_collapses_it() {
        let mut tree = fit(2);
        let x = Array2::from_shape_fn((30, 1), |(i, _)| i as f64 / 29.0);
        // The root polynomial is exact on this held-out set.
        let y = tree.root().poly().evaluate(x.view()).unwrap();
        let before = tree.n_nodes();
        let summary = silent(0.0).prune(&mut tree.root, x.view(), y.view()).unwrap();
        assert!(tree.root().is_leaf());
        assert!(summary.collapsed >= 1);
        assert_eq!(summary.removed, before - 1);
        assert_eq!(tree.root().test_loss(), Some(0.0));
    }

    #[test]
    fn unreached_subtrees_get_zero_statistics() {
        let mut tree = fit(2);
        // Every held-out row sits on the far left.
        let x = Array2::from_shape_fn((5, 1), |(i, _)| 0.01 * i as f64);
        let y = x.column(0).mapv(|v| (v - 0.5).abs());
        silent(0.0).prune(&mut tree.root, x.view(), y.view()).unwrap();

        let root = tree.root();
        if let Some(right) = root.right() {
            assert_eq!(right.n_samples(), 0);
            assert_eq!(right.test_loss(), Some(0.0));
            assert!(right.iter().all(|n| n.n_samples() == 0));
        }
    }

    #[test]
    fn empty_children_give_zero_lower_loss() {
        let mut left = fit(0).root;
        let mut right = left.clone();
        mark_unreached(&mut left);
        mark_unreached(&mut right);
        assert_eq!(weighted_child_loss(&left, &right), 0.0);
    }

    #[test]
    fn tolerance_is_a_fraction() {
        assert!((silent(25.0).tolerance() - 0.25).abs() < 1e-12);
    }
}
