//! Polynomial surrogate models.
//!
//! A surrogate is a least-squares fit of an orthonormal polynomial expansion
//! over a box of uniform parameters:
//!
//! - [`UniformParameter`]: bounded input domain for one dimension
//! - [`BasisKind`] / [`Basis`]: which multivariate terms take part in the fit
//! - [`PolySurrogate`]: fitted coefficients with evaluation and basis gradients
//!
//! Every tree node owns one [`PolySurrogate`].

mod basis;
mod parameter;
mod surrogate;

pub use basis::{Basis, BasisKind, HYPERBOLIC_Q};
pub use parameter::UniformParameter;
pub use surrogate::PolySurrogate;

/// Errors raised while building or fitting a polynomial surrogate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolyError {
    /// No samples were supplied to the fit.
    #[error("cannot fit a polynomial to an empty sample")]
    EmptySample,

    /// Sample columns do not match the number of parameters.
    #[error("expected {expected} input dimensions, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Number of outputs does not match the number of sample rows.
    #[error("sample has {rows} rows but {outputs} outputs")]
    OutputMismatch { rows: usize, outputs: usize },

    /// The univariate basis only supports a single input dimension.
    #[error("univariate basis requires exactly 1 dimension, got {0}")]
    UnivariateDimension(usize),

    /// A parameter domain must have `lower < upper` with finite bounds.
    #[error("invalid parameter bounds [{lower}, {upper}]")]
    InvalidBounds { lower: f64, upper: f64 },

    /// The least-squares solve failed.
    #[error("least-squares solve failed: {0}")]
    Solve(&'static str),

    /// The solve produced NaN or infinite coefficients.
    #[error("least-squares fit produced non-finite coefficients")]
    NonFiniteCoefficients,
}
