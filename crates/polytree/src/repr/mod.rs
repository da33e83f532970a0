//! In-memory tree representation.
//!
//! - [`TreeNode`]: owned recursive node with its polynomial surrogate
//! - [`Branch`]: split rule plus the two owned children of an internal node
//! - [`FittedTree`]: root node and the state derived during `fit`

mod node;
mod tree;

pub use node::{Branch, NodeData, NodeIter, PruneStats, TreeNode};
pub use tree::FittedTree;
