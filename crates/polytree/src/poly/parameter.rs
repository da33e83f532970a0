//! Uniform parameter domains and their orthonormal Legendre polynomials.

use super::PolyError;

/// A bounded continuous input with a uniform distribution on `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformParameter {
    lower: f64,
    upper: f64,
}

impl UniformParameter {
    /// Create a parameter on `[lower, upper]`.
    ///
    /// # Errors
    ///
    /// [`PolyError::InvalidBounds`] unless both bounds are finite and `lower < upper`.
    pub fn new(lower: f64, upper: f64) -> Result<Self, PolyError> {
        if !(lower.is_finite() && upper.is_finite() && lower < upper) {
            return Err(PolyError::InvalidBounds { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Map `x` from `[lower, upper]` onto `[-1, 1]`.
    ///
    /// Values outside the domain map outside `[-1, 1]`; the polynomials
    /// extrapolate there.
    #[inline]
    pub fn standardize(&self, x: f64) -> f64 {
        2.0 * (x - self.lower) / (self.upper - self.lower) - 1.0
    }

    /// Write `φ_0(x) ..= φ_order(x)` into `out`.
    ///
    /// `φ_n = √(2n+1)·P_n` are the Legendre polynomials normalised to unit
    /// variance under the uniform measure.
    pub fn orthonormal_values(&self, x: f64, order: usize, out: &mut Vec<f64>) {
        let t = self.standardize(x);
        out.clear();
        out.reserve(order + 1);

        // Three-term recurrence on the unnormalised polynomials.
        let mut p_prev = 1.0;
        out.push(1.0);
        if order == 0 {
            return;
        }
        let mut p_curr = t;
        out.push(3f64.sqrt() * t);
        for n in 1..order {
            let nf = n as f64;
            let p_next = ((2.0 * nf + 1.0) * t * p_curr - nf * p_prev) / (nf + 1.0);
            p_prev = p_curr;
            p_curr = p_next;
            out.push((2.0 * (nf + 1.0) + 1.0).sqrt() * p_curr);
        }
    }
}
