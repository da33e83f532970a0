//! Tree configuration with builder pattern.
//!
//! [`PolyTreeConfig`] is fixed at construction and validated once. The
//! builder is generated with `bon`; `build()` runs validation.
//!
//! # Example
//!
//! ```
//! use polytree::model::PolyTreeConfig;
//! use polytree::poly::BasisKind;
//! use polytree::training::SplitCriterion;
//!
//! let config = PolyTreeConfig::builder()
//!     .criterion(SplitCriterion::LossGradient)
//!     .max_depth(4)
//!     .order(2)
//!     .basis(BasisKind::TensorGrid)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_depth, 4);
//! ```

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::poly::BasisKind;
use crate::training::{SearchStrategy, SplitCriterion, Verbosity};
use crate::utils::Parallelism;

// =============================================================================
// ConfigError
// =============================================================================

/// Errors that can occur during configuration validation or option parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Polynomial order must be at least 1.
    #[error("order must be a positive integer, got {0}")]
    InvalidOrder(usize),

    /// Grid sample count must be at least 1.
    #[error("samples must be a positive integer, got {0}")]
    InvalidSamples(usize),

    /// Smoothing constant must be finite and positive.
    #[error("k must be a positive number, got {0}")]
    InvalidSmoothing(f64),

    /// An explicit `min_samples_leaf` must be at least 1.
    #[error("min_samples_leaf must be at least 1, got {0}")]
    InvalidMinSamplesLeaf(usize),

    /// An explicit split-dimension list must name at least one dimension.
    #[error("split_dims must not be empty")]
    EmptySplitDims,

    /// A named option did not match any known value.
    #[error("unknown {option} '{value}'")]
    UnknownOption { option: &'static str, value: String },
}

// =============================================================================
// PolyTreeConfig
// =============================================================================

/// Configuration of a polynomial regression tree.
///
/// # Structure
///
/// - **Splitting**: `criterion`, `search`, `samples`, `split_dims`
/// - **Tree size**: `max_depth`, `min_samples_leaf`
/// - **Surrogates**: `order`, `basis`
/// - **Prediction**: `k` (smoothing towards ancestors)
/// - **Resources**: `all_data`, `parallelism`, `verbosity`
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(
    derive(Clone, Debug),
    finish_fn(vis = "", name = __build_internal)
)]
#[serde(default)]
pub struct PolyTreeConfig {
    /// How candidate splits are scored. Default: `model_aware`.
    #[builder(default)]
    pub criterion: SplitCriterion,

    /// Nodes at this depth never split. Default: 5.
    #[builder(default = 5)]
    pub max_depth: usize,

    /// Minimum rows in each child of an accepted split.
    ///
    /// `None` derives `ceil(1.25 × cardinality)` at fit time.
    pub min_samples_leaf: Option<usize>,

    /// Maximum polynomial order per dimension. Default: 1.
    #[builder(default = 1)]
    pub order: usize,

    /// Index set of the node polynomials. Default: `total-order`.
    #[builder(default)]
    pub basis: BasisKind,

    /// Threshold candidates per feature. Default: `exhaustive`.
    #[builder(default)]
    pub search: SearchStrategy,

    /// Number of evenly spaced thresholds for `grid` search. Default: 50.
    #[builder(default = 50)]
    pub samples: usize,

    /// Smoothing strength, scaled by `min_samples_leaf` at fit time. Default: 0.05.
    #[builder(default = 0.05)]
    pub k: f64,

    /// Dimensions that may be split on. `None` allows all of them.
    pub split_dims: Option<Vec<usize>>,

    /// Keep training rows at internal nodes too (leaves always keep them).
    #[builder(default)]
    pub all_data: bool,

    /// Verbosity level. Default: `Silent`.
    #[builder(default)]
    pub verbosity: Verbosity,

    /// Allow per-feature split search on the rayon pool. Default: `Sequential`.
    #[builder(default)]
    pub parallelism: Parallelism,
}

/// Custom finishing function that validates the config.
impl<S: poly_tree_config_builder::IsComplete> PolyTreeConfigBuilder<S> {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `order`, `samples` or `k` is not positive,
    /// `min_samples_leaf` is zero, or `split_dims` is empty.
    pub fn build(self) -> Result<PolyTreeConfig, ConfigError> {
        let config = self.__build_internal();
        config.validate()?;
        Ok(config)
    }
}

impl PolyTreeConfig {
    /// Validate the configuration.
    ///
    /// Called by the builder and again by [`PolyTree::new`](super::PolyTree::new),
    /// so deserialized configs are checked too.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order == 0 {
            return Err(ConfigError::InvalidOrder(self.order));
        }
        if self.samples == 0 {
            return Err(ConfigError::InvalidSamples(self.samples));
        }
        if !(self.k.is_finite() && self.k > 0.0) {
            return Err(ConfigError::InvalidSmoothing(self.k));
        }
        if let Some(0) = self.min_samples_leaf {
            return Err(ConfigError::InvalidMinSamplesLeaf(0));
        }
        if matches!(&self.split_dims, Some(dims) if dims.is_empty()) {
            return Err(ConfigError::EmptySplitDims);
        }
        Ok(())
    }
}

impl Default for PolyTreeConfig {
    fn default() -> Self {
        Self::builder().__build_internal()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PolyTreeConfig::builder().build().unwrap();
        assert_eq!(config.criterion, SplitCriterion::ModelAware);
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.min_samples_leaf, None);
        assert_eq!(config.order, 1);
        assert_eq!(config.basis, BasisKind::TotalOrder);
        assert_eq!(config.search, SearchStrategy::Exhaustive);
        assert_eq!(config.samples, 50);
        assert!((config.k - 0.05).abs() < 1e-12);
        assert!(!config.all_data);
        assert_eq!(config, PolyTreeConfig::default());
    }

    #[test]
    fn test_invalid_order_zero() {
        let result = PolyTreeConfig::builder().order(0).build();
        assert_eq!(result, Err(ConfigError::InvalidOrder(0)));
    }

    #[test]
    fn test_invalid_samples_zero() {
        let result = PolyTreeConfig::builder().samples(0).build();
        assert_eq!(result, Err(ConfigError::InvalidSamples(0)));
    }

    #[test]
    fn test_invalid_smoothing() {
        assert!(matches!(
            PolyTreeConfig::builder().k(0.0).build(),
            Err(ConfigError::InvalidSmoothing(_))
        ));
        assert!(matches!(
            PolyTreeConfig::builder().k(-1.0).build(),
            Err(ConfigError::InvalidSmoothing(_))
        ));
        assert!(matches!(
            PolyTreeConfig::builder().k(f64::NAN).build(),
            Err(ConfigError::InvalidSmoothing(_))
        ));
    }

    #[test]
    fn test_invalid_min_samples_leaf() {
        let result = PolyTreeConfig::builder().min_samples_leaf(0).build();
        assert_eq!(result, Err(ConfigError::InvalidMinSamplesLeaf(0)));
    }

    #[test]
    fn test_empty_split_dims() {
        let result = PolyTreeConfig::builder().split_dims(vec![]).build();
        assert_eq!(result, Err(ConfigError::EmptySplitDims));
    }

    #[test]
    fn test_max_depth_zero_is_valid() {
        let config = PolyTreeConfig::builder().max_depth(0).build().unwrap();
        assert_eq!(config.max_depth, 0);
    }

    #[test]
    fn test_deserialize_with_option_names() {
        let json = r#"{
            "criterion": "loss_gradient",
            "basis": "hyperbolic-basis",
            "search": "grid",
            "samples": 25,
            "max_depth": 3,
            "split_dims": [1]
        }"#;
        let config: PolyTreeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.criterion, SplitCriterion::LossGradient);
        assert_eq!(config.basis, BasisKind::Hyperbolic);
        assert_eq!(config.search, SearchStrategy::Grid);
        assert_eq!(config.samples, 25);
        assert_eq!(config.max_depth, 3);
        assert_eq!(config.split_dims, Some(vec![1]));
        // Unspecified fields fall back to defaults.
        assert_eq!(config.order, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialized_config_can_be_invalid() {
        let config: PolyTreeConfig = serde_json::from_str(r#"{"order": 0}"#).unwrap();
        assert_eq!(config.validate(), Err(ConfigError::InvalidOrder(0)));
    }

    #[test]
    fn test_unknown_criterion_is_rejected() {
        let result = serde_json::from_str::<PolyTreeConfig>(r#"{"criterion": "gini"}"#);
        assert!(result.is_err());
    }
}
