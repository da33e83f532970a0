//! Verbosity-gated training diagnostics over the `log` facade.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::ConfigError;

/// How much the tree builder and pruner report.
///
/// Messages are emitted through the `log` crate, so a logger (e.g.
/// `env_logger`) must also be installed for them to appear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    #[default]
    Silent,
    Warning,
    Info,
    Debug,
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verbosity::Silent => "silent",
            Verbosity::Warning => "warning",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        })
    }
}

impl FromStr for Verbosity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "silent" => Ok(Verbosity::Silent),
            "warning" => Ok(Verbosity::Warning),
            "info" => Ok(Verbosity::Info),
            "debug" => Ok(Verbosity::Debug),
            other => Err(ConfigError::UnknownOption {
                option: "verbosity",
                value: other.to_string(),
            }),
        }
    }
}

/// Structured messages for one `fit` or `prune` call.
#[derive(Debug, Clone)]
pub struct TrainingLogger {
    verbosity: Verbosity,
}

impl TrainingLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    #[inline]
    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    pub fn warn_cardinality(&self, cardinality: usize, min_samples_leaf: usize) {
        if self.verbosity >= Verbosity::Warning {
            log::warn!(
                "basis cardinality ({}) greater than the minimum samples per leaf ({}); \
                 this may cause reduced performance",
                cardinality,
                min_samples_leaf
            );
        }
    }

    pub fn start_fit(&self, n_rows: usize, n_features: usize, cardinality: usize, min_samples_leaf: usize) {
        if self.verbosity >= Verbosity::Info {
            log::info!(
                "fitting tree on {} rows x {} features (cardinality {}, min_samples_leaf {})",
                n_rows,
                n_features,
                cardinality,
                min_samples_leaf
            );
        }
    }

    pub fn finish_fit(&self, n_nodes: usize, n_leaves: usize, depth: usize) {
        if self.verbosity >= Verbosity::Info {
            log::info!(
                "tree fitted: {} nodes, {} leaves, deepest split at depth {}",
                n_nodes,
                n_leaves,
                depth
            );
        }
    }

    pub fn node_outcome(&self, n_rows: usize, n_features: usize, did_split: bool, polys_fit: usize) {
        if self.verbosity >= Verbosity::Debug {
            if did_split {
                log::debug!(
                    "node ({} x {}) split after {} polynomials fitted",
                    n_rows,
                    n_features,
                    polys_fit
                );
            } else {
                log::debug!(
                    "node ({} x {}) kept as leaf after {} polynomials fitted",
                    n_rows,
                    n_features,
                    polys_fit
                );
            }
        }
    }

    pub fn collapse(&self, index: usize, lower_loss: f64, test_loss: f64) {
        if self.verbosity >= Verbosity::Debug {
            log::debug!(
                "prune node {}: lower_loss {:.6} vs test_loss {:.6}",
                index,
                lower_loss,
                test_loss
            );
        }
    }

    pub fn finish_prune(&self, collapsed: usize, n_nodes: usize) {
        if self.verbosity >= Verbosity::Info {
            log::info!("pruning collapsed {} nodes, {} remain", collapsed, n_nodes);
        }
    }
}
