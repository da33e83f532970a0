//! Deterministic synthetic data for tests and benchmarks.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;

/// Uniform features in `[min, max]`, `rows × cols`.
pub fn random_features(rows: usize, cols: usize, seed: u64, min: f64, max: f64) -> Array2<f64> {
    assert!(max >= min);
    let mut rng = StdRng::seed_from_u64(seed);
    let width = max - min;
    Array2::from_shape_simple_fn((rows, cols), || min + rng.r#gen::<f64>() * width)
}

/// Regular `n × n` grid over the unit square, first feature varying slowest.
pub fn unit_grid(n: usize) -> Array2<f64> {
    assert!(n >= 2);
    Array2::from_shape_fn((n * n, 2), |(r, j)| {
        let v = if j == 0 { r / n } else { r % n };
        v as f64 / (n - 1) as f64
    })
}

/// Apply `f` to every row of `x`.
pub fn targets_from<F>(x: &Array2<f64>, f: F) -> Array1<f64>
where
    F: Fn(&[f64]) -> f64,
{
    x.axis_iter(Axis(0))
        .map(|row| f(&row.to_vec()))
        .collect()
}

/// `y = Σ w_j x_j + bias + noise`, noise uniform in `[-noise, noise]`.
pub fn linear_targets(x: &Array2<f64>, weights: &[f64], bias: f64, noise: f64, seed: u64) -> Array1<f64> {
    assert_eq!(weights.len(), x.ncols());
    let mut rng = StdRng::seed_from_u64(seed);
    x.axis_iter(Axis(0))
        .map(|row| {
            let mut y = bias + row.iter().zip(weights).map(|(v, w)| v * w).sum::<f64>();
            if noise > 0.0 {
                y += (rng.r#gen::<f64>() * 2.0 - 1.0) * noise;
            }
            y
        })
        .collect()
}

/// Deterministic train/validation split of row indices.
///
/// Returns `(train_idx, valid_idx)`.
pub fn split_indices(rows: usize, valid_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    assert!((0.0..1.0).contains(&valid_fraction));
    let mut idx: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    idx.shuffle(&mut rng);

    let valid_len = ((rows as f64) * valid_fraction).round() as usize;
    let (valid, train) = idx.split_at(valid_len.min(rows));
    (train.to_vec(), valid.to_vec())
}
