//! Read-only tree walks: leaf lookup, paths, splits and leaf polynomials.

use std::collections::{BTreeMap, BTreeSet};

use ndarray::{ArrayView1, ArrayView2};

use crate::poly::PolySurrogate;
use crate::repr::TreeNode;

/// How to look a node up with [`find_node`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeQuery<'a> {
    /// The node carrying this index.
    Index(usize),
    /// The leaf this sample is routed to.
    Sample(&'a [f64]),
}

impl From<usize> for NodeQuery<'_> {
    fn from(index: usize) -> Self {
        NodeQuery::Index(index)
    }
}

impl<'a> From<&'a [f64]> for NodeQuery<'a> {
    fn from(sample: &'a [f64]) -> Self {
        NodeQuery::Sample(sample)
    }
}

impl<'a, const N: usize> From<&'a [f64; N]> for NodeQuery<'a> {
    fn from(sample: &'a [f64; N]) -> Self {
        NodeQuery::Sample(sample.as_slice())
    }
}

/// One step of a root-to-leaf path.
///
/// `feature` and `threshold` describe the split taken at this node and are
/// `None` for the final (leaf) step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathStep {
    pub node: usize,
    pub feature: Option<usize>,
    pub threshold: Option<f64>,
}

/// Leaf reached by `sample`.
pub fn leaf_for<'t>(root: &'t TreeNode, sample: ArrayView1<'_, f64>) -> &'t TreeNode {
    let mut node = root;
    while let Some(branch) = node.branch() {
        node = branch.child_for(sample);
    }
    node
}

/// Leaf index for every row of `x`.
pub fn apply(root: &TreeNode, x: ArrayView2<'_, f64>) -> Vec<usize> {
    x.rows()
        .into_iter()
        .map(|row| leaf_for(root, row).index())
        .collect()
}

/// Node with the given index, searching the right subtree before the left.
pub fn find_by_index(node: &TreeNode, index: usize) -> Option<&TreeNode> {
    if node.index() == index {
        return Some(node);
    }
    let branch = node.branch()?;
    find_by_index(&branch.right, index).or_else(|| find_by_index(&branch.left, index))
}

/// Resolve a [`NodeQuery`].
pub fn find_node<'t>(root: &'t TreeNode, query: NodeQuery<'_>) -> Option<&'t TreeNode> {
    match query {
        NodeQuery::Index(index) => find_by_index(root, index),
        NodeQuery::Sample(sample) => Some(leaf_for(root, ArrayView1::from(sample))),
    }
}

/// Root-to-leaf paths for the given leaf indices, keyed by leaf index.
///
/// Indices that are not leaves of the tree are ignored.
pub fn paths_to(root: &TreeNode, leaves: &BTreeSet<usize>) -> BTreeMap<usize, Vec<PathStep>> {
    let mut out = BTreeMap::new();
    let mut prefix = Vec::new();
    collect_paths(root, leaves, &mut prefix, &mut out);
    out
}

fn collect_paths(
    node: &TreeNode,
    leaves: &BTreeSet<usize>,
    prefix: &mut Vec<PathStep>,
    out: &mut BTreeMap<usize, Vec<PathStep>>,
) {
    prefix.push(PathStep {
        node: node.index(),
        feature: node.j_feature(),
        threshold: node.threshold(),
    });
    match node.branch() {
        None => {
            if leaves.contains(&node.index()) {
                out.insert(node.index(), prefix.clone());
            }
        }
        Some(branch) => {
            collect_paths(&branch.left, leaves, prefix, out);
            collect_paths(&branch.right, leaves, prefix, out);
        }
    }
    prefix.pop();
}

/// Indices of every leaf, left to right.
pub fn leaf_indices(root: &TreeNode) -> BTreeSet<usize> {
    root.iter().filter(|n| n.is_leaf()).map(|n| n.index()).collect()
}

/// Distinct `(threshold, feature)` pairs in pre-order, left before right.
pub fn splits(root: &TreeNode) -> Vec<(f64, usize)> {
    let mut out: Vec<(f64, usize)> = Vec::new();
    for branch in root.iter().filter_map(|n| n.branch()) {
        let pair = (branch.threshold, branch.feature);
        if !out.contains(&pair) {
            out.push(pair);
        }
    }
    out
}

/// Polynomials of every leaf, left to right.
pub fn leaf_polys(root: &TreeNode) -> Vec<&PolySurrogate> {
    root.iter().filter(|n| n.is_leaf()).map(|n| n.poly()).collect()
}

/// Flag exactly the nodes on the path of `sample`, clearing all other flags.
pub fn flag_path(root: &mut TreeNode, sample: ArrayView1<'_, f64>) {
    clear_flags(root);
    let mut node = root;
    loop {
        node.flag = true;
        let Some(branch) = node.branch.as_mut() else {
            break;
        };
        node = if branch.goes_left(sample[branch.feature]) {
            branch.left.as_mut()
        } else {
            branch.right.as_mut()
        };
    }
}

/// Reset every node's flag.
pub fn clear_flags(node: &mut TreeNode) {
    node.flag = false;
    if let Some(branch) = node.branch.as_mut() {
        clear_flags(&mut branch.left);
        clear_flags(&mut branch.right);
    }
}
