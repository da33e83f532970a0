//! Common utilities used across the crate.
//!
//! This module provides small statistical helpers and the parallelism switch
//! used by split search.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

// =============================================================================
// Statistical Utilities
// =============================================================================

/// Population standard deviation (`ddof = 0`) of a slice.
///
/// Returns `0.0` for an empty slice.
#[inline]
pub fn population_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (ss / n as f64).sqrt()
}

/// Mean squared error between targets and predictions.
///
/// Returns `0.0` when there are no samples.
#[inline]
pub fn mean_squared_error<'a>(
    targets: impl IntoIterator<Item = &'a f64>,
    predictions: impl IntoIterator<Item = &'a f64>,
) -> f64 {
    let mut n = 0usize;
    let mut sum = 0.0;
    for (t, p) in targets.into_iter().zip(predictions) {
        sum += (t - p) * (t - p);
        n += 1;
    }
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// When `Parallel`, split search may evaluate candidate features on the rayon
/// pool. Results are always reduced in feature order, so the fitted tree does
/// not depend on this setting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parallelism {
    #[default]
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if rayon pool has multiple threads, sequential otherwise)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map over items, collecting results in input order.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use all available cores)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
///
/// # Errors
///
/// Returns the rayon error if a dedicated pool cannot be created.
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T, rayon::ThreadPoolBuildError> {
    match Parallelism::from_threads(n_threads) {
        Parallelism::Sequential => Ok(f(Parallelism::Sequential)),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()?;
            Ok(pool.install(|| f(Parallelism::Parallel)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_std_matches_hand_computation() {
        // mean 2.5, squared deviations 2.25 + 0.25 + 0.25 + 2.25 = 5, /4 = 1.25
        let std = population_std(&[1.0, 2.0, 3.0, 4.0]);
        assert!((std - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn population_std_empty_and_constant() {
        assert_eq!(population_std(&[]), 0.0);
        assert_eq!(population_std(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn mse_of_perfect_prediction_is_zero() {
        let y = [1.0, 2.0, 3.0];
        assert_eq!(mean_squared_error(&y, &y), 0.0);
        assert!((mean_squared_error(&[0.0, 0.0], &[1.0, 3.0]) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_parallelism_from_threads() {
        assert!(!Parallelism::from_threads(1).is_parallel());
        assert!(Parallelism::from_threads(4).is_parallel());
    }

    #[test]
    fn maybe_par_map_preserves_order() {
        let items: Vec<usize> = (0..64).collect();
        let seq = Parallelism::Sequential.maybe_par_map(items.clone(), |i| i * 2);
        let par = Parallelism::Parallel.maybe_par_map(items, |i| i * 2);
        assert_eq!(seq, par);
    }

    #[test]
    fn run_with_threads_sequential() {
        let result = run_with_threads(1, |p| p.is_parallel()).unwrap();
        assert!(!result);
    }
}
