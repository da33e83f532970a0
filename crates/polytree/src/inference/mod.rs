//! Inference over a fitted tree.
//!
//! - [`predictor`]: batch routing and smoothing of leaves towards their ancestors ([`Predictor`])
//! - [`traversal`]: leaf lookup, node queries, paths, splits and flagging

pub mod predictor;
pub mod traversal;

pub use predictor::{smooth, PathPrediction, Predictor};
pub use traversal::{apply, find_node, flag_path, leaf_for, NodeQuery, PathStep};
