//! Input validation and row partitioning.
//!
//! Samples are row-major `ndarray` matrices (`n_rows × n_features`) with one
//! target per row.

use ndarray::{ArrayView1, ArrayView2, ArrayViewD, Axis, Ix1, Ix2};

use crate::model::ModelError;
use crate::repr::NodeData;

/// Check that `x` and `y` describe the same rows.
pub fn check_xy(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), ModelError> {
    if x.nrows() != y.len() {
        return Err(ModelError::RowMismatch {
            x_rows: x.nrows(),
            y_len: y.len(),
        });
    }
    Ok(())
}

/// Check that `x` has the number of columns the tree was fitted with.
pub fn check_features(x: ArrayView2<'_, f64>, expected: usize) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::FeatureMismatch {
            expected,
            got: x.ncols(),
        });
    }
    Ok(())
}

/// View a 1-D sample or a 2-D batch as a batch.
///
/// A 1-D input of length `d` becomes a `1 × d` matrix.
pub fn as_samples<'a>(x: ArrayViewD<'a, f64>) -> Result<ArrayView2<'a, f64>, ModelError> {
    match x.ndim() {
        1 => x
            .into_dimensionality::<Ix1>()
            .map(|row| row.insert_axis(Axis(0)))
            .map_err(|_| ModelError::UnsupportedInputDims(1)),
        2 => x
            .into_dimensionality::<Ix2>()
            .map_err(|_| ModelError::UnsupportedInputDims(2)),
        n => Err(ModelError::UnsupportedInputDims(n)),
    }
}

/// Row indices going left (`x[feature] <= threshold`) and right.
pub fn partition_indices(
    x: ArrayView2<'_, f64>,
    rows: &[usize],
    feature: usize,
    threshold: f64,
) -> (Vec<usize>, Vec<usize>) {
    let column = x.column(feature);
    rows.iter().copied().partition(|&r| column[r] <= threshold)
}

/// Number of rows with `x[feature] <= threshold`.
#[inline]
pub fn count_left(x: ArrayView2<'_, f64>, feature: usize, threshold: f64) -> usize {
    x.column(feature).iter().filter(|&&v| v <= threshold).count()
}

/// Gather the given rows into an owned [`NodeData`].
pub fn take_rows(x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>, rows: &[usize]) -> NodeData {
    NodeData::new(x.select(Axis(0), rows), y.select(Axis(0), rows))
}

/// Split `(x, y)` into the rows going left and right of `threshold`.
///
/// Row order within each side follows the input.
pub fn split_rows(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    feature: usize,
    threshold: f64,
) -> (NodeData, NodeData) {
    let all: Vec<usize> = (0..x.nrows()).collect();
    let (left, right) = partition_indices(x, &all, feature, threshold);
    (take_rows(x, y, &left), take_rows(x, y, &right))
}
