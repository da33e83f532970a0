//! Graphviz DOT rendering.
//!
//! One record per node showing its index, split rule, training sample count
//! and loss. After pruning the loss shown is the held-out `test_loss` (plus
//! `lower_loss` where it was computed). Nodes and edges on the flagged path
//! are drawn bold, with orange edges.

use std::fmt::Write as _;

use crate::repr::TreeNode;

const LEAF_FILL: &str = "#E4fEE4";
const SPLIT_FILL: &str = "#EBFAFF";
const PATH_EDGE: &str = "orange";

/// Default feature names `x_0 .. x_{n-1}`.
pub fn default_feature_names(n_features: usize) -> Vec<String> {
    (0..n_features).map(|i| format!("x_{i}")).collect()
}

/// Text of a node's record label, with DOT `\n` line breaks.
pub fn node_label(node: &TreeNode, feature_names: &[String]) -> String {
    let split = match node.branch() {
        Some(branch) => {
            let name = feature_names
                .get(branch.feature)
                .map(String::as_str)
                .unwrap_or("?");
            format!("{} <= {:.3}\\n", name, branch.threshold)
        }
        None => String::new(),
    };

    let mut label = format!(
        "node {} \\n {} n_samples = {}\\n loss = {:.6}",
        node.index(),
        split,
        node.n_samples(),
        node.test_loss().unwrap_or(node.loss()),
    );
    if let Some(lower) = node.lower_loss() {
        let _ = write!(label, "\\n lower_loss = {lower:.6}");
    }
    label
}

/// Render the subtree under `root` as a DOT digraph.
pub fn render(root: &TreeNode, feature_names: &[String]) -> String {
    let mut out = String::from("digraph g {\n\tnode [height=.1 shape=record]\n");
    render_node(root, None, feature_names, &mut out);
    out.push_str("}\n");
    out
}

fn render_node(node: &TreeNode, parent: Option<usize>, feature_names: &[String], out: &mut String) {
    let (fill, mut style) = if node.is_leaf() {
        (LEAF_FILL, vec!["rounded"])
    } else {
        (SPLIT_FILL, vec!["filled"])
    };
    if node.flag() {
        style.push("bold");
    }

    let _ = writeln!(
        out,
        "\tnode{} [label=\"{}\" shape=rectangle color=black style=\"{}\" fillcolor=\"{}\" fontcolor=black]",
        node.index(),
        node_label(node, feature_names),
        style.join(", "),
        fill,
    );

    if let Some(parent) = parent {
        let (color, edge_style) = if node.flag() {
            (PATH_EDGE, "bold")
        } else {
            ("black", "solid")
        };
        let _ = writeln!(
            out,
            "\tnode{} -> node{} [label=\"\" color={} style={}]",
            parent,
            node.index(),
            color,
            edge_style,
        );
    }

    if let Some(branch) = node.branch() {
        render_node(&branch.left, Some(node.index()), feature_names, out);
        render_node(&branch.right, Some(node.index()), feature_names, out);
    }
}
