//! Tree export.
//!
//! Only Graphviz DOT text is supported; rendering it is left to external
//! tools (`dot -Tsvg tree.dot`).

pub mod dot;

use crate::model::ModelError;

/// Errors raised while exporting a tree.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Feature names must cover every input feature.
    #[error("expected {expected} feature names, got {got}")]
    FeatureNames { expected: usize, got: usize },

    #[error("failed to write DOT output: {0}")]
    Io(#[from] std::io::Error),
}
