//! Multivariate index sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PolyError;
use crate::model::ConfigError;

/// Shape parameter of the hyperbolic cross index set.
pub const HYPERBOLIC_Q: f64 = 0.5;

/// Rule selecting which multivariate polynomial terms take part in a fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasisKind {
    /// `0..=order` in a single dimension.
    #[serde(rename = "univariate")]
    Univariate,
    /// Multi-indices with total degree `Σα ≤ order`.
    #[default]
    #[serde(rename = "total-order")]
    TotalOrder,
    /// Full tensor product, `α_k ≤ order` in every dimension.
    #[serde(rename = "tensor-grid")]
    TensorGrid,
    /// Smolyak-style union with exponential level growth.
    #[serde(rename = "sparse-grid")]
    SparseGrid,
    /// Hyperbolic cross `(Σ α_k^q)^(1/q) ≤ order` with `q = 0.5`.
    #[serde(rename = "hyperbolic-basis")]
    Hyperbolic,
}

impl BasisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BasisKind::Univariate => "univariate",
            BasisKind::TotalOrder => "total-order",
            BasisKind::TensorGrid => "tensor-grid",
            BasisKind::SparseGrid => "sparse-grid",
            BasisKind::Hyperbolic => "hyperbolic-basis",
        }
    }
}

impl fmt::Display for BasisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BasisKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "univariate" => Ok(BasisKind::Univariate),
            "total-order" => Ok(BasisKind::TotalOrder),
            "tensor-grid" => Ok(BasisKind::TensorGrid),
            "sparse-grid" => Ok(BasisKind::SparseGrid),
            "hyperbolic-basis" => Ok(BasisKind::Hyperbolic),
            other => Err(ConfigError::UnknownOption {
                option: "basis",
                value: other.to_string(),
            }),
        }
    }
}

/// Smallest level `l` with `2^l − 1 >= i`.
#[inline]
fn sparse_level(i: usize) -> u32 {
    usize::BITS - i.leading_zeros()
}

/// A concrete index set: one multi-index per basis term.
///
/// Terms are sorted by total degree, so the constant term is always first.
#[derive(Debug, Clone, PartialEq)]
pub struct Basis {
    kind: BasisKind,
    order: usize,
    indices: Vec<Vec<usize>>,
}

impl Basis {
    /// Build the index set of `kind` for `n_dims` inputs of maximum order `order`.
    ///
    /// # Errors
    ///
    /// [`PolyError::UnivariateDimension`] for a univariate basis over more
    /// than one dimension.
    pub fn new(kind: BasisKind, order: usize, n_dims: usize) -> Result<Self, PolyError> {
        if kind == BasisKind::Univariate && n_dims != 1 {
            return Err(PolyError::UnivariateDimension(n_dims));
        }

        let keep = |alpha: &[usize]| -> bool {
            match kind {
                BasisKind::Univariate | BasisKind::TensorGrid => true,
                BasisKind::TotalOrder => alpha.iter().sum::<usize>() <= order,
                BasisKind::SparseGrid => {
                    alpha.iter().map(|&a| sparse_level(a) as usize).sum::<usize>() <= order
                }
                BasisKind::Hyperbolic => {
                    let s: f64 = alpha.iter().map(|&a| (a as f64).powf(HYPERBOLIC_Q)).sum();
                    s.powf(1.0 / HYPERBOLIC_Q) <= order as f64 + 1e-9
                }
            }
        };

        // Walk the full tensor grid like an odometer and filter.
        let mut indices = Vec::new();
        let mut alpha = vec![0usize; n_dims];
        loop {
            if keep(&alpha) {
                indices.push(alpha.clone());
            }
            let mut k = 0;
            while k < n_dims {
                if alpha[k] < order {
                    alpha[k] += 1;
                    break;
                }
                alpha[k] = 0;
                k += 1;
            }
            if k == n_dims {
                break;
            }
        }

        indices.sort_by(|a, b| {
            let da: usize = a.iter().sum();
            let db: usize = b.iter().sum();
            da.cmp(&db).then_with(|| b.cmp(a))
        });

        Ok(Self {
            kind,
            order,
            indices,
        })
    }

    #[inline]
    pub fn kind(&self) -> BasisKind {
        self.kind
    }

    /// Maximum per-dimension order.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn n_dims(&self) -> usize {
        self.indices.first().map_or(0, Vec::len)
    }

    /// Number of basis terms.
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.indices.len()
    }

    /// Multi-indices, one per term.
    #[inline]
    pub fn indices(&self) -> &[Vec<usize>] {
        &self.indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(BasisKind::Univariate, 3, 1, 4)]
    #[case(BasisKind::TotalOrder, 1, 2, 3)]
    #[case(BasisKind::TotalOrder, 2, 2, 6)]
    #[case(BasisKind::TotalOrder, 3, 2, 10)]
    #[case(BasisKind::TotalOrder, 2, 3, 10)]
    #[case(BasisKind::TensorGrid, 2, 2, 9)]
    #[case(BasisKind::TensorGrid, 1, 3, 8)]
    #[case(BasisKind::Hyperbolic, 2, 2, 5)]
    #[case(BasisKind::SparseGrid, 1, 2, 3)]
    #[case(BasisKind::SparseGrid, 3, 2, 12)]
    fn cardinality(
        #[case] kind: BasisKind,
        #[case] order: usize,
        #[case] n_dims: usize,
        #[case] expected: usize,
    ) {
        let basis = Basis::new(kind, order, n_dims).unwrap();
        assert_eq!(basis.cardinality(), expected);
        assert_eq!(basis.n_dims(), n_dims);
    }

    #[test]
    fn constant_term_comes_first() {
        for kind in [
            BasisKind::TotalOrder,
            BasisKind::TensorGrid,
            BasisKind::SparseGrid,
            BasisKind::Hyperbolic,
        ] {
            let basis = Basis::new(kind, 2, 3).unwrap();
            assert!(basis.indices()[0].iter().all(|&a| a == 0), "{kind}");
        }
    }

    #[test]
    fn univariate_rejects_multiple_dimensions() {
        assert_eq!(
            Basis::new(BasisKind::Univariate, 2, 2),
            Err(PolyError::UnivariateDimension(2))
        );
    }

    #[test]
    fn sparse_level_is_bit_length() {
        assert_eq!(sparse_level(0), 0);
        assert_eq!(sparse_level(1), 1);
        assert_eq!(sparse_level(3), 2);
        assert_eq!(sparse_level(4), 3);
    }

    #[test]
    fn names_round_trip() {
        for kind in [
            BasisKind::Univariate,
            BasisKind::TotalOrder,
            BasisKind::TensorGrid,
            BasisKind::SparseGrid,
            BasisKind::Hyperbolic,
        ] {
            assert_eq!(kind.as_str().parse::<BasisKind>().unwrap(), kind);
        }
        assert!(matches!(
            "chebyshev".parse::<BasisKind>(),
            Err(ConfigError::UnknownOption { option: "basis", .. })
        ));
    }
}
