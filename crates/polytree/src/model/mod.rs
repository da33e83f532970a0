//! High-level model wrapper.
//!
//! - [`PolyTree`]: fit / predict / apply / prune plus traversal helpers
//! - [`PolyTreeConfig`]: validated configuration, built with `PolyTreeConfig::builder()`
//! - [`ModelError`] / [`ConfigError`]: errors of the public API
//!
//! # Example
//!
//! ```
//! use ndarray::{Array1, Array2};
//! use polytree::model::{PolyTree, PolyTreeConfig};
//!
//! let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64 / 39.0);
//! let y: Array1<f64> = x.column(0).mapv(|v| if v <= 0.5 { v } else { 1.0 - v });
//!
//! let config = PolyTreeConfig::builder().max_depth(2).build().unwrap();
//! let mut tree = PolyTree::new(config).unwrap();
//! tree.fit(x.view(), y.view()).unwrap();
//!
//! let y_hat = tree.predict(x.view()).unwrap();
//! assert_eq!(y_hat.len(), 40);
//! ```

mod config;
mod error;
mod polytree;

pub use config::{ConfigError, PolyTreeConfig};
pub use error::ModelError;
pub use polytree::PolyTree;
