//! Split selection from per-sample loss gradients.
//!
//! Instead of refitting candidate children, a single polynomial is fitted to
//! the node and each boundary between distinct feature values is scored by
//! how far the residual-weighted basis gradients of the two sides are from
//! zero:
//!
//! ```text
//! gain = ‖G_L‖² / N_L + ‖G_R‖² / N_R
//! ```
//!
//! where `G_L`, `G_R` are the summed gradients `r_n · ψ(x_n)` of each side.
//! Before scoring, the non-intercept components of `G_L` and `G_R` are
//! renormalised with the mean and standard deviation of the corresponding
//! basis columns on that side.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis};

use crate::poly::{PolyError, PolySurrogate};

/// Floor on the per-side standard deviation of a basis column.
const SIGMA_FLOOR: f64 = 0.001;

// =============================================================================
// GradientSplit
// =============================================================================

/// Best split found by the [`GradientSplitSelector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientSplit {
    pub feature: usize,
    /// Midpoint between the two feature values straddling the boundary.
    pub threshold: f64,
    pub gain: f64,
}

// =============================================================================
// SideMoments
// =============================================================================

/// Per-candidate mean and standard deviation of the non-intercept basis
/// columns, for the left and right side of every candidate boundary.
///
/// Each array is `n_candidates × (cardinality − 1)`.
#[derive(Debug, Clone)]
pub(crate) struct SideMoments {
    pub mu_left: Array2<f64>,
    pub mu_right: Array2<f64>,
    pub sigma_left: Array2<f64>,
    pub sigma_right: Array2<f64>,
}

/// Mean and standard deviation of `columns` on each side of every boundary.
///
/// `order` is the row permutation sorting the node by the split feature and
/// `boundaries` hold the left-side row counts. Columns are shifted by their
/// overall mean before the running sums are taken so that the variance does
/// not suffer from cancellation; the shift is added back to the means.
pub(crate) fn side_moments(
    columns: ArrayView2<'_, f64>,
    order: &[usize],
    boundaries: &[usize],
) -> SideMoments {
    let (n, p) = columns.dim();
    let n_candidates = boundaries.len();
    let mean = columns
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(p));

    // Running sums of the shifted values and their squares, in sorted order.
    let mut cum = Array2::<f64>::zeros((n, p));
    let mut cum_sq = Array2::<f64>::zeros((n, p));
    let mut acc = Array1::<f64>::zeros(p);
    let mut acc_sq = Array1::<f64>::zeros(p);
    for (pos, &row) in order.iter().enumerate() {
        for j in 0..p {
            let shifted = columns[[row, j]] - mean[j];
            acc[j] += shifted;
            acc_sq[j] += shifted * shifted;
        }
        cum.row_mut(pos).assign(&acc);
        cum_sq.row_mut(pos).assign(&acc_sq);
    }

    let mut moments = SideMoments {
        mu_left: Array2::zeros((n_candidates, p)),
        mu_right: Array2::zeros((n_candidates, p)),
        sigma_left: Array2::zeros((n_candidates, p)),
        sigma_right: Array2::zeros((n_candidates, p)),
    };

    let floor_sq = SIGMA_FLOOR * SIGMA_FLOOR;
    for (k, &split) in boundaries.iter().enumerate() {
        let n_left = split as f64;
        let n_right = (n - split) as f64;
        for j in 0..p {
            let sum_left = cum[[split - 1, j]];
            let sum_right = acc[j] - sum_left;
            let sq_left = cum_sq[[split - 1, j]];
            let sq_right = acc_sq[j] - sq_left;

            let mu_l = sum_left / n_left;
            let mu_r = sum_right / n_right;
            let var_l = (sq_left / (n_left - 1.0) - mu_l * mu_l).max(floor_sq);
            let var_r = (sq_right / (n_right - 1.0) - mu_r * mu_r).max(floor_sq);

            moments.mu_left[[k, j]] = mu_l + mean[j];
            moments.mu_right[[k, j]] = mu_r + mean[j];
            moments.sigma_left[[k, j]] = var_l.sqrt();
            moments.sigma_right[[k, j]] = var_r.sqrt();
        }
    }
    moments
}

/// Rescale the non-intercept components of a summed gradient.
///
/// `g[j] ← g[j] / σ_j − (μ_j / σ_j) · g[0]` for `j ≥ 1`; `g[0]` is unchanged.
pub(crate) fn renormalise(
    mut gradient: ArrayViewMut1<'_, f64>,
    mu: ArrayView1<'_, f64>,
    sigma: ArrayView1<'_, f64>,
) {
    let intercept = gradient[0];
    for (j, g) in gradient.iter_mut().skip(1).enumerate() {
        *g = *g / sigma[j] - (mu[j] / sigma[j]) * intercept;
    }
}

// =============================================================================
// GradientSplitSelector
// =============================================================================

/// Scores boundaries along each allowed dimension from one parent fit.
#[derive(Debug, Clone, Copy)]
pub struct GradientSplitSelector<'a> {
    min_samples_leaf: usize,
    split_dims: &'a [usize],
}

impl<'a> GradientSplitSelector<'a> {
    pub fn new(min_samples_leaf: usize, split_dims: &'a [usize]) -> Self {
        Self {
            min_samples_leaf,
            split_dims,
        }
    }

    /// Find the boundary with the largest gain, or `None` when no dimension
    /// has at least two admissible boundaries.
    ///
    /// Within a dimension the first maximum wins; across dimensions a later
    /// dimension must be strictly better.
    pub fn select(
        &self,
        poly: &PolySurrogate,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<Option<GradientSplit>, PolyError> {
        let n = x.nrows();
        let design = poly.gradient_basis(x)?;
        let residual = &y - &design.dot(&poly.coefficients());
        let gradients = &design * &residual.view().insert_axis(Axis(1));
        let total = gradients.sum_axis(Axis(0));
        let n_terms = total.len();

        let mut best: Option<GradientSplit> = None;
        for &feature in self.split_dims {
            let column = x.column(feature);
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| column[a].total_cmp(&column[b]));
            let sorted: Vec<f64> = order.iter().map(|&r| column[r]).collect();

            // First position of every distinct value, except the first one.
            let boundaries: Vec<usize> = (1..n)
                .filter(|&s| sorted[s] != sorted[s - 1])
                .filter(|&s| s.min(n - s) >= self.min_samples_leaf)
                .collect();
            if boundaries.len() <= 1 {
                continue;
            }

            let mut cum = Array2::<f64>::zeros((n, n_terms));
            let mut acc = Array1::<f64>::zeros(n_terms);
            for (pos, &row) in order.iter().enumerate() {
                acc += &gradients.row(row);
                cum.row_mut(pos).assign(&acc);
            }

            let moments = (n_terms > 1)
                .then(|| side_moments(design.slice(s![.., 1..]), &order, &boundaries));

            let mut feature_best: Option<(usize, f64)> = None;
            for (k, &split) in boundaries.iter().enumerate() {
                let mut left = cum.row(split - 1).to_owned();
                let mut right = &total - &left;
                if let Some(m) = &moments {
                    renormalise(left.view_mut(), m.mu_left.row(k), m.sigma_left.row(k));
                    renormalise(right.view_mut(), m.mu_right.row(k), m.sigma_right.row(k));
                }
                let gain = left.dot(&left) / split as f64 + right.dot(&right) / (n - split) as f64;
                if feature_best.map_or(true, |(_, g)| gain > g) {
                    feature_best = Some((split, gain));
                }
            }

            if let Some((split, gain)) = feature_best {
                if best.map_or(true, |b| gain > b.gain) {
                    best = Some(GradientSplit {
                        feature,
                        threshold: 0.5 * (sorted[split - 1] + sorted[split]),
                        gain,
                    });
                }
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::NodeFitter;
    use crate::poly::BasisKind;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn grid(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n * n, 2), |(r, j)| {
            let v = if j == 0 { r / n } else { r % n };
            v as f64 / (n - 1) as f64
        })
    }

    #[test]
    fn side_moments_match_direct_computation() {
        let columns = array![[1.0], [4.0], [2.0], [8.0], [5.0]];
        let order = vec![0, 2, 1, 4, 3]; // 1, 2, 4, 5, 8
        let moments = side_moments(columns.view(), &order, &[2, 3]);

        // Left of boundary 2: {1, 2} -> mean 1.5.
        assert_abs_diff_eq!(moments.mu_left[[0, 0]], 1.5, epsilon = 1e-12);
        // Right of boundary 2: {4, 5, 8} -> mean 17/3.
        assert_abs_diff_eq!(moments.mu_right[[0, 0]], 17.0 / 3.0, epsilon = 1e-12);
        // Left of boundary 3: {1, 2, 4}.
        assert_abs_diff_eq!(moments.mu_left[[1, 0]], 7.0 / 3.0, epsilon = 1e-12);
        assert!(moments.sigma_left.iter().all(|&s| s >= SIGMA_FLOOR));
    }

    #[test]
    fn sigma_is_floored_for_constant_columns() {
        let columns = array![[3.0], [3.0], [3.0], [3.0]];
        let order = vec![0, 1, 2, 3];
        let moments = side_moments(columns.view(), &order, &[2]);
        assert_abs_diff_eq!(moments.sigma_left[[0, 0]], SIGMA_FLOOR, epsilon = 1e-15);
        assert_abs_diff_eq!(moments.sigma_right[[0, 0]], SIGMA_FLOOR, epsilon = 1e-15);
        assert_abs_diff_eq!(moments.mu_left[[0, 0]], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn renormalise_leaves_intercept_untouched() {
        let mut g = array![2.0, 4.0, 6.0];
        renormalise(g.view_mut(), array![1.0, 0.5].view(), array![2.0, 0.5].view());
        assert_eq!(g[0], 2.0);
        // 4/2 - (1/2)*2 = 1
        assert_abs_diff_eq!(g[1], 1.0, epsilon = 1e-12);
        // 6/0.5 - (0.5/0.5)*2 = 10
        assert_abs_diff_eq!(g[2], 10.0, epsilon = 1e-12);
    }

    #[test]
    fn picks_the_curved_dimension() {
        let x = grid(10);
        let y: Array1<f64> = x.rows().into_iter().map(|r| (r[1] - 0.5).abs()).collect();
        let fitter = NodeFitter::new(BasisKind::TotalOrder, 1, 2).unwrap();
        let fit = fitter.fit(x.view(), y.view()).unwrap();

        let dims = [0, 1];
        let split = GradientSplitSelector::new(4, &dims)
            .select(&fit.poly, x.view(), y.view())
            .unwrap()
            .unwrap();
        assert_eq!(split.feature, 1);
        assert!(split.threshold > 0.0 && split.threshold < 1.0);
    }

    #[test]
    fn threshold_is_a_midpoint_between_distinct_values() {
        let x = grid(6);
        let y: Array1<f64> = x.rows().into_iter().map(|r| r[0] * r[0]).collect();
        let fitter = NodeFitter::new(BasisKind::TotalOrder, 1, 2).unwrap();
        let fit = fitter.fit(x.view(), y.view()).unwrap();

        let dims = [0];
        let split = GradientSplitSelector::new(4, &dims)
            .select(&fit.poly, x.view(), y.view())
            .unwrap()
            .unwrap();
        assert_eq!(split.feature, 0);
        // Grid step is 0.2, so midpoints sit at 0.1 + 0.2k.
        let k = (split.threshold - 0.1) / 0.2;
        assert_abs_diff_eq!(k, k.round(), epsilon = 1e-9);
    }

    #[test]
    fn no_split_when_min_samples_leaf_too_large() {
        let x = grid(4);
        let y: Array1<f64> = x.rows().into_iter().map(|r| r[0] * r[1]).collect();
        let fitter = NodeFitter::new(BasisKind::TotalOrder, 1, 2).unwrap();
        let fit = fitter.fit(x.view(), y.view()).unwrap();
        let dims = [0, 1];
        let split = GradientSplitSelector::new(9, &dims)
            .select(&fit.poly, x.view(), y.view())
            .unwrap();
        assert!(split.is_none());
    }

    #[test]
    fn a_single_admissible_boundary_is_not_enough() {
        // Two distinct values give a single boundary.
        let x = array![[0.0], [0.0], [1.0], [1.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let fitter = NodeFitter::new(BasisKind::Univariate, 1, 1).unwrap();
        let fit = fitter.fit(x.view(), y.view()).unwrap();
        let dims = [0];
        let split = GradientSplitSelector::new(1, &dims)
            .select(&fit.poly, x.view(), y.view())
            .unwrap();
        assert!(split.is_none());
    }
}
