//! Structural invariants of fitted trees.

use std::collections::{BTreeMap, HashSet};

use ndarray::{array, Array1, Array2, Axis};
use polytree::repr::TreeNode;
use polytree::testing::{random_features, targets_from};
use polytree::{PolyTree, PolyTreeConfig, SearchStrategy, SplitCriterion};
use rstest::rstest;

fn wavy_data(rows: usize, seed: u64) -> (Array2<f64>, Array1<f64>) {
    let x = random_features(rows, 2, seed, 0.0, 1.0);
    let y = targets_from(&x, |r| (6.0 * r[0]).sin() + 0.5 * (r[1] - 0.3).abs());
    (x, y)
}

fn fit(config: PolyTreeConfig, x: &Array2<f64>, y: &Array1<f64>) -> PolyTree {
    let mut tree = PolyTree::new(config).unwrap();
    tree.fit(x.view(), y.view()).unwrap();
    tree
}

fn internal_nodes(root: &TreeNode) -> impl Iterator<Item = &TreeNode> {
    root.iter().filter(|n| !n.is_leaf())
}

#[rstest]
#[case(SplitCriterion::ModelAware)]
#[case(SplitCriterion::ModelAgnostic)]
#[case(SplitCriterion::LossGradient)]
fn children_partition_their_parent(#[case] criterion: SplitCriterion) {
    let (x, y) = wavy_data(150, 3);
    let config = PolyTreeConfig::builder()
        .criterion(criterion)
        .max_depth(3)
        .all_data(true)
        .build()
        .unwrap();
    let tree = fit(config, &x, &y);
    let root = tree.root().unwrap();
    assert!(tree.n_nodes().unwrap() > 1, "{criterion} did not split");

    for node in internal_nodes(root) {
        let parent = node.data().unwrap();
        let (left, right) = (node.left().unwrap(), node.right().unwrap());
        let feature = node.j_feature().unwrap();
        let threshold = node.threshold().unwrap();

        let (ld, rd) = (left.data().unwrap(), right.data().unwrap());
        assert_eq!(ld.n_rows() + rd.n_rows(), parent.n_rows());
        assert_eq!(left.n_samples() + right.n_samples(), node.n_samples());
        assert!(ld.x.column(feature).iter().all(|&v| v <= threshold));
        assert!(rd.x.column(feature).iter().all(|&v| v > threshold));
    }
}

#[test]
fn apply_reproduces_leaf_rows() {
    let (x, y) = wavy_data(120, 8);
    let config = PolyTreeConfig::builder().max_depth(3).build().unwrap();
    let tree = fit(config, &x, &y);

    let leaves = tree.apply(x.view().into_dyn()).unwrap();
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (row, leaf) in leaves.into_iter().enumerate() {
        groups.entry(leaf).or_default().push(row);
    }

    let root = tree.root().unwrap();
    assert_eq!(groups.len(), tree.n_leaves().unwrap());
    for (leaf, rows) in groups {
        let node = tree.get_node(leaf).unwrap().unwrap();
        assert!(node.is_leaf());
        let data = node.data().expect("leaves keep their rows");
        assert_eq!(data.x, x.select(Axis(0), &rows));
        assert_eq!(data.y, y.select(Axis(0), &rows));
    }
    // Internal nodes drop their rows unless all_data is set.
    assert!(internal_nodes(root).all(|n| n.data().is_none()));
}

#[test]
fn model_aware_splits_reduce_training_loss() {
    let (x, y) = wavy_data(160, 11);
    let config = PolyTreeConfig::builder().max_depth(4).build().unwrap();
    let tree = fit(config, &x, &y);

    for node in internal_nodes(tree.root().unwrap()) {
        let (left, right) = (node.left().unwrap(), node.right().unwrap());
        let (nl, nr) = (left.n_samples() as f64, right.n_samples() as f64);
        let weighted = (nl * left.loss() + nr * right.loss()) / (nl + nr);
        assert!(weighted < node.loss(), "node {}", node.index());
    }
}

#[test]
fn children_respect_min_samples_leaf() {
    let (x, y) = wavy_data(100, 2);
    let config = PolyTreeConfig::builder()
        .max_depth(6)
        .min_samples_leaf(12)
        .build()
        .unwrap();
    let tree = fit(config, &x, &y);
    assert_eq!(tree.min_samples_leaf().unwrap(), 12);
    let root = tree.root().unwrap();
    assert!(root.iter().skip(1).all(|n| n.n_samples() >= 12));
}

#[test]
fn indices_are_unique_and_creation_ordered() {
    let (x, y) = wavy_data(120, 4);
    let config = PolyTreeConfig::builder().max_depth(3).build().unwrap();
    let tree = fit(config, &x, &y);
    let root = tree.root().unwrap();
    assert_eq!(root.index(), 1);

    let mut seen = HashSet::new();
    for node in root.iter() {
        assert!(seen.insert(node.index()), "duplicate index {}", node.index());
    }
    for node in internal_nodes(root) {
        let (left, right) = (node.left().unwrap(), node.right().unwrap());
        assert!(node.index() < left.index());
        assert!(left.index() < right.index());
    }
}

#[test]
fn depth_bookkeeping() {
    let (x, y) = wavy_data(150, 6);
    let config = PolyTreeConfig::builder().max_depth(3).build().unwrap();
    let tree = fit(config, &x, &y);
    let root = tree.root().unwrap();

    assert!(root.max_depth() <= 3);
    assert!(root.iter().all(|n| n.depth() <= 3));
    assert_eq!(tree.actual_max_depth().unwrap() + 1, root.max_depth());
    for node in internal_nodes(root) {
        assert_eq!(node.left().unwrap().depth(), node.depth() + 1);
    }
}

#[test]
fn predict_is_idempotent() {
    let (x, y) = wavy_data(100, 9);
    let config = PolyTreeConfig::builder().max_depth(3).build().unwrap();
    let tree = fit(config, &x, &y);
    let first = tree.predict(x.view()).unwrap();
    let second = tree.predict(x.view()).unwrap();
    assert_eq!(first, second);
    assert!(first.iter().all(|v| v.is_finite()));
}

#[test]
fn huge_min_samples_leaf_keeps_only_the_root() {
    let (x, y) = wavy_data(80, 1);
    let config = PolyTreeConfig::builder()
        .max_depth(5)
        .min_samples_leaf(1000)
        .build()
        .unwrap();
    let tree = fit(config, &x, &y);
    assert_eq!(tree.n_nodes().unwrap(), 1);
    assert!(tree.root().unwrap().is_leaf());
    assert!(tree.get_splits().unwrap().is_empty());
}

#[rstest]
#[case(SplitCriterion::ModelAware)]
#[case(SplitCriterion::LossGradient)]
fn zero_max_depth_keeps_only_the_root(#[case] criterion: SplitCriterion) {
    let (x, y) = wavy_data(80, 5);
    let config = PolyTreeConfig::builder()
        .criterion(criterion)
        .max_depth(0)
        .build()
        .unwrap();
    let tree = fit(config, &x, &y);
    let root = tree.root().unwrap();
    assert!(root.is_leaf());
    assert_eq!(tree.actual_max_depth().unwrap(), 0);

    // A lone root has nothing to blend with.
    let expected = root.poly().evaluate(x.view()).unwrap();
    assert_eq!(tree.predict(x.view()).unwrap(), expected);
}

#[test]
fn apply_shapes() {
    let (x, y) = wavy_data(80, 7);
    let config = PolyTreeConfig::builder().max_depth(2).build().unwrap();
    let tree = fit(config, &x, &y);

    let single = array![0.25, 0.75];
    assert_eq!(tree.apply(single.view().into_dyn()).unwrap().len(), 1);

    let batch = x.slice(ndarray::s![..5, ..]);
    let leaves = tree.apply(batch.into_dyn()).unwrap();
    assert_eq!(leaves.len(), 5);
    assert_eq!(leaves[0], tree.apply(x.row(0).into_dyn()).unwrap()[0]);
}

#[test]
fn grid_search_stays_on_the_grid() {
    let (x, y) = wavy_data(120, 12);
    let config = PolyTreeConfig::builder()
        .search(SearchStrategy::Grid)
        .samples(7)
        .max_depth(1)
        .all_data(true)
        .build()
        .unwrap();
    let tree = fit(config, &x, &y);
    let root = tree.root().unwrap();
    let Some(feature) = root.j_feature() else {
        return;
    };
    let column = x.column(feature);
    let lo = column.fold(f64::INFINITY, |a, &b| a.min(b));
    let hi = column.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let step = (hi - lo) / 6.0;
    let threshold = root.threshold().unwrap();
    let position = (threshold - lo) / step;
    assert!((position - position.round()).abs() < 1e-9, "threshold {threshold} off grid");
}

#[test]
fn split_dims_restrict_every_criterion() {
    let (x, y) = wavy_data(150, 13);
    for criterion in [
        SplitCriterion::ModelAware,
        SplitCriterion::ModelAgnostic,
        SplitCriterion::LossGradient,
    ] {
        let config = PolyTreeConfig::builder()
            .criterion(criterion)
            .split_dims(vec![1])
            .max_depth(3)
            .build()
            .unwrap();
        let tree = fit(config, &x, &y);
        assert!(tree
            .get_splits()
            .unwrap()
            .iter()
            .all(|&(_, feature)| feature == 1));
    }
}
