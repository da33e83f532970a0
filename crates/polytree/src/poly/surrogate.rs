//! Least-squares polynomial surrogate.

use nalgebra::{DMatrix, DVector, SVD};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::{Basis, PolyError, UniformParameter};

/// A fitted polynomial expansion `f(x) = Σ c_i ψ_i(x)`.
///
/// `ψ_i` is the product of per-dimension orthonormal Legendre polynomials
/// selected by the `i`-th multi-index of the [`Basis`].
#[derive(Debug, Clone)]
pub struct PolySurrogate {
    parameters: Vec<UniformParameter>,
    basis: Basis,
    coefficients: Array1<f64>,
}

impl PolySurrogate {
    /// Fit coefficients to `(x, y)` by least squares.
    ///
    /// Uses the SVD of the design matrix, discarding singular values below
    /// `ε·max(n, p)·σ_max`, so rank-deficient samples still get the
    /// minimum-norm solution.
    ///
    /// # Errors
    ///
    /// - [`PolyError::EmptySample`] if `x` has no rows
    /// - [`PolyError::DimensionMismatch`] / [`PolyError::OutputMismatch`] on shape errors
    /// - [`PolyError::Solve`] / [`PolyError::NonFiniteCoefficients`] if the solve fails
    pub fn fit(
        parameters: Vec<UniformParameter>,
        basis: Basis,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<Self, PolyError> {
        if x.nrows() == 0 {
            return Err(PolyError::EmptySample);
        }
        if x.nrows() != y.len() {
            return Err(PolyError::OutputMismatch {
                rows: x.nrows(),
                outputs: y.len(),
            });
        }
        if basis.n_dims() != parameters.len() {
            return Err(PolyError::DimensionMismatch {
                expected: parameters.len(),
                got: basis.n_dims(),
            });
        }

        let mut surrogate = Self {
            parameters,
            basis,
            coefficients: Array1::zeros(0),
        };
        let design = surrogate.gradient_basis(x)?;
        surrogate.coefficients = solve_least_squares(&design, y)?;
        Ok(surrogate)
    }

    /// Evaluate the surrogate at every row of `x`.
    pub fn evaluate(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, PolyError> {
        Ok(self.gradient_basis(x)?.dot(&self.coefficients))
    }

    /// Gradient of the model output with respect to its coefficients.
    ///
    /// For a linear-in-coefficients model this is the design matrix: row `n`
    /// holds `ψ_i(x_n)` for every term `i`. Column 0 is the constant term.
    pub fn gradient_basis(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, PolyError> {
        let n_dims = self.parameters.len();
        if x.ncols() != n_dims {
            return Err(PolyError::DimensionMismatch {
                expected: n_dims,
                got: x.ncols(),
            });
        }

        let order = self.basis.order();
        let indices = self.basis.indices();
        let mut design = Array2::zeros((x.nrows(), indices.len()));
        let mut per_dim: Vec<Vec<f64>> = vec![Vec::with_capacity(order + 1); n_dims];

        for (row, mut out) in x.outer_iter().zip(design.outer_iter_mut()) {
            for (k, param) in self.parameters.iter().enumerate() {
                param.orthonormal_values(row[k], order, &mut per_dim[k]);
            }
            for (term, alpha) in indices.iter().enumerate() {
                out[term] = alpha
                    .iter()
                    .enumerate()
                    .map(|(k, &a)| per_dim[k][a])
                    .product::<f64>();
            }
        }
        Ok(design)
    }

    /// Number of input dimensions.
    #[inline]
    pub fn dimensions(&self) -> usize {
        self.parameters.len()
    }

    /// Number of basis terms.
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.basis.cardinality()
    }

    #[inline]
    pub fn coefficients(&self) -> ArrayView1<'_, f64> {
        self.coefficients.view()
    }

    #[inline]
    pub fn parameters(&self) -> &[UniformParameter] {
        &self.parameters
    }

    #[inline]
    pub fn basis(&self) -> &Basis {
        &self.basis
    }
}

fn solve_least_squares(
    design: &Array2<f64>,
    y: ArrayView1<'_, f64>,
) -> Result<Array1<f64>, PolyError> {
    let (n, p) = design.dim();
    let matrix = DMatrix::from_fn(n, p, |i, j| design[[i, j]]);
    let b = DVector::from_iterator(n, y.iter().copied());

    let decomp = SVD::new(matrix, true, true);
    let sigma_max = decomp.singular_values.max();
    let epsilon = f64::EPSILON * n.max(p) as f64 * sigma_max;

    let solution = decomp.solve(&b, epsilon).map_err(PolyError::Solve)?;
    if solution.iter().any(|c| !c.is_finite()) {
        return Err(PolyError::NonFiniteCoefficients);
    }
    Ok(solution.iter().copied().collect())
}
