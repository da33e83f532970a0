//! Local polynomial fitting for a single node.

use ndarray::{ArrayView1, ArrayView2};

use crate::poly::{Basis, BasisKind, PolyError, PolySurrogate, UniformParameter};
use crate::utils::mean_squared_error;

/// Columns whose squared range falls below this are padded.
const DEGENERATE_SPAN_SQ: f64 = 0.01;

/// Padding applied to both ends of a degenerate column.
const SPAN_PADDING: f64 = 0.01;

/// A polynomial fitted to the rows of one node, with its training MSE.
#[derive(Debug, Clone)]
pub struct NodeFit {
    pub loss: f64,
    pub poly: PolySurrogate,
}

/// Fits node surrogates with a fixed basis.
///
/// The basis is built once per tree; only the parameter domains change
/// between nodes.
#[derive(Debug, Clone)]
pub struct NodeFitter {
    basis: Basis,
}

impl NodeFitter {
    /// Create a fitter for `n_dims` inputs.
    ///
    /// # Errors
    ///
    /// Propagates [`PolyError`] from [`Basis::new`] (e.g. a univariate basis
    /// on multi-dimensional data).
    pub fn new(kind: BasisKind, order: usize, n_dims: usize) -> Result<Self, PolyError> {
        Ok(Self {
            basis: Basis::new(kind, order, n_dims)?,
        })
    }

    #[inline]
    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    /// Number of terms in every node polynomial.
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.basis.cardinality()
    }

    /// Fit a surrogate to `(x, y)` and compute its mean squared error.
    ///
    /// Each column becomes a uniform parameter over its observed `[min, max]`.
    /// If `(max − min)² < 0.01` the domain is widened by `0.01` on each side.
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<NodeFit, PolyError> {
        if x.nrows() == 0 {
            return Err(PolyError::EmptySample);
        }

        let parameters = x
            .columns()
            .into_iter()
            .map(|column| {
                let (lo, hi) = column
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
                if (lo - hi) * (lo - hi) < DEGENERATE_SPAN_SQ {
                    UniformParameter::new(lo - SPAN_PADDING, hi + SPAN_PADDING)
                } else {
                    UniformParameter::new(lo, hi)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        let poly = PolySurrogate::fit(parameters, self.basis.clone(), x, y)?;
        let fitted = poly.evaluate(x)?;
        let loss = mean_squared_error(y.iter(), fitted.iter());
        Ok(NodeFit { loss, poly })
    }
}
