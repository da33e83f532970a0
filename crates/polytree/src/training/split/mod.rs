//! Split search for a single node.
//!
//! Three criteria decide which `(feature, threshold)` pair a node is split on:
//!
//! - [`SplitCriterion::ModelAware`]: fit both children for every candidate and
//!   keep the lowest weighted child loss, which must beat the parent's loss
//! - [`SplitCriterion::ModelAgnostic`]: score each candidate by
//!   `std(y) - weighted child std` and keep the lowest, then fit the two
//!   children once
//! - [`SplitCriterion::LossGradient`]: delegate to the
//!   [`GradientSplitSelector`], then fit the two children once
//!
//! Candidates are scanned per feature in ascending threshold order; a later
//! candidate only replaces the best one if it is strictly better.

mod gradient;

use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

pub use gradient::{GradientSplit, GradientSplitSelector};

use super::fitter::{NodeFit, NodeFitter};
use crate::data::{count_left, split_rows};
use crate::model::ConfigError;
use crate::poly::PolyError;
use crate::repr::NodeData;
use crate::utils::{population_std, Parallelism};

// =============================================================================
// Criterion and search strategy
// =============================================================================

/// How candidate splits are scored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitCriterion {
    #[default]
    ModelAware,
    ModelAgnostic,
    LossGradient,
}

impl SplitCriterion {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitCriterion::ModelAware => "model_aware",
            SplitCriterion::ModelAgnostic => "model_agnostic",
            SplitCriterion::LossGradient => "loss_gradient",
        }
    }
}

impl fmt::Display for SplitCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitCriterion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model_aware" => Ok(SplitCriterion::ModelAware),
            "model_agnostic" => Ok(SplitCriterion::ModelAgnostic),
            "loss_gradient" => Ok(SplitCriterion::LossGradient),
            other => Err(ConfigError::UnknownOption {
                option: "splitting criterion",
                value: other.to_string(),
            }),
        }
    }
}

/// Which thresholds are tried along a feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Every distinct value of the column.
    #[default]
    Exhaustive,
    /// `min(samples, n_rows)` evenly spaced points over `[min, max]`.
    Grid,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStrategy::Exhaustive => "exhaustive",
            SearchStrategy::Grid => "grid",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exhaustive" => Ok(SearchStrategy::Exhaustive),
            "grid" => Ok(SearchStrategy::Grid),
            other => Err(ConfigError::UnknownOption {
                option: "search",
                value: other.to_string(),
            }),
        }
    }
}

/// `num` evenly spaced points from `lo` to `hi` inclusive (`[lo]` for one point).
fn linspace(lo: f64, hi: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (num - 1) as f64;
            (0..num)
                .map(|i| if i + 1 == num { hi } else { lo + step * i as f64 })
                .collect()
        }
    }
}

// =============================================================================
// Search results
// =============================================================================

/// One child of an accepted split: its rows and the polynomial fitted to them.
#[derive(Debug, Clone)]
pub struct ChildFit {
    pub data: NodeData,
    pub fit: NodeFit,
}

/// An accepted split with both children already fitted.
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub feature: usize,
    pub threshold: f64,
    /// Child-size-weighted training loss of the two children.
    pub loss: f64,
    pub left: ChildFit,
    pub right: ChildFit,
}

/// Result of searching one node.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub split: Option<SplitOutcome>,
    /// Polynomials fitted while searching, including the accepted children.
    pub polys_fit: usize,
}

/// Best candidate of one feature.
#[derive(Debug)]
struct FeatureBest {
    score: f64,
    threshold: f64,
    /// Children fitted during the scan (model-aware only).
    children: Option<(ChildFit, ChildFit)>,
}

#[derive(Debug, Default)]
struct FeatureScan {
    best: Option<FeatureBest>,
    polys_fit: usize,
}

// =============================================================================
// SplitSearch
// =============================================================================

/// Split search parameters resolved for one tree.
#[derive(Debug, Clone, Copy)]
pub struct SplitSearch<'a> {
    pub fitter: &'a NodeFitter,
    pub criterion: SplitCriterion,
    pub strategy: SearchStrategy,
    pub samples: usize,
    pub min_samples_leaf: usize,
    pub split_dims: &'a [usize],
    pub parallelism: Parallelism,
}

impl SplitSearch<'_> {
    /// Find the best split of a node whose own fit has loss `node_loss`.
    ///
    /// Depth gating is the caller's job; this always searches.
    pub fn find_split(&self, data: &NodeData, node_loss: f64) -> Result<SearchResult, PolyError> {
        match self.criterion {
            SplitCriterion::ModelAware | SplitCriterion::ModelAgnostic => {
                self.threshold_search(data, node_loss)
            }
            SplitCriterion::LossGradient => self.gradient_search(data),
        }
    }

    /// Candidate thresholds along `feature`, sorted and deduplicated.
    pub fn thresholds(&self, column: ArrayView1<'_, f64>) -> Vec<f64> {
        let mut candidates: Vec<f64> = match self.strategy {
            SearchStrategy::Exhaustive => column.to_vec(),
            SearchStrategy::Grid => {
                let (lo, hi) = column
                    .iter()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
                linspace(lo, hi, self.samples.min(column.len()))
            }
        };
        candidates.sort_by(f64::total_cmp);
        candidates.dedup();
        candidates
    }

    fn threshold_search(&self, data: &NodeData, node_loss: f64) -> Result<SearchResult, PolyError> {
        let initial = match self.criterion {
            SplitCriterion::ModelAware => node_loss,
            _ => f64::INFINITY,
        };

        let scans = self
            .parallelism
            .maybe_par_map(self.split_dims.to_vec(), |feature| {
                self.scan_feature(data, feature, initial)
            });

        // Reduce in feature order; strict `<` keeps the earliest feature on ties.
        let mut polys_fit = 0;
        let mut best: Option<(usize, FeatureBest)> = None;
        for (feature, scan) in self.split_dims.iter().copied().zip(scans) {
            let scan = scan?;
            polys_fit += scan.polys_fit;
            if let Some(candidate) = scan.best {
                let improves = best.as_ref().map_or(true, |(_, b)| candidate.score < b.score);
                if improves {
                    best = Some((feature, candidate));
                }
            }
        }

        let Some((feature, best)) = best else {
            return Ok(SearchResult { split: None, polys_fit });
        };

        let (left, right) = match best.children {
            Some(children) => children,
            None => {
                polys_fit += 2;
                self.fit_children(data, feature, best.threshold)?
            }
        };
        Ok(SearchResult {
            split: Some(self.outcome(feature, best.threshold, left, right)),
            polys_fit,
        })
    }

    /// Scan the thresholds of one feature, starting from `initial`.
    fn scan_feature(&self, data: &NodeData, feature: usize, initial: f64) -> Result<FeatureScan, PolyError> {
        let x = data.x.view();
        let y = data.y.view();
        let n = data.n_rows();
        let parent_std = population_std(&y.to_vec());

        let mut scan = FeatureScan::default();
        let mut best_score = initial;
        for threshold in self.thresholds(x.column(feature)) {
            let n_left = count_left(x, feature, threshold);
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            match self.criterion {
                SplitCriterion::ModelAware => {
                    let (left, right) = self.fit_children(data, feature, threshold)?;
                    scan.polys_fit += 2;
                    let score = weighted_loss(&left, &right);
                    if score < best_score {
                        best_score = score;
                        scan.best = Some(FeatureBest {
                            score,
                            threshold,
                            children: Some((left, right)),
                        });
                    }
                }
                _ => {
                    let score = std_score(x, y, feature, threshold, parent_std);
                    if score < best_score {
                        best_score = score;
                        scan.best = Some(FeatureBest {
                            score,
                            threshold,
                            children: None,
                        });
                    }
                }
            }
        }
        Ok(scan)
    }

    fn gradient_search(&self, data: &NodeData) -> Result<SearchResult, PolyError> {
        let x = data.x.view();
        let y = data.y.view();
        let parent = self.fitter.fit(x, y)?;
        let mut polys_fit = 1;

        let selected = GradientSplitSelector::new(self.min_samples_leaf, self.split_dims)
            .select(&parent.poly, x, y)?;
        let Some(selected) = selected else {
            return Ok(SearchResult { split: None, polys_fit });
        };

        let (left, right) = self.fit_children(data, selected.feature, selected.threshold)?;
        polys_fit += 2;
        Ok(SearchResult {
            split: Some(self.outcome(selected.feature, selected.threshold, left, right)),
            polys_fit,
        })
    }

    fn fit_children(
        &self,
        data: &NodeData,
        feature: usize,
        threshold: f64,
    ) -> Result<(ChildFit, ChildFit), PolyError> {
        let (left, right) = split_rows(data.x.view(), data.y.view(), feature, threshold);
        let left_fit = self.fitter.fit(left.x.view(), left.y.view())?;
        let right_fit = self.fitter.fit(right.x.view(), right.y.view())?;
        Ok((
            ChildFit { data: left, fit: left_fit },
            ChildFit { data: right, fit: right_fit },
        ))
    }

    fn outcome(&self, feature: usize, threshold: f64, left: ChildFit, right: ChildFit) -> SplitOutcome {
        SplitOutcome {
            feature,
            threshold,
            loss: weighted_loss(&left, &right),
            left,
            right,
        }
    }
}

/// `(N_L · loss_L + N_R · loss_R) / N`.
fn weighted_loss(left: &ChildFit, right: &ChildFit) -> f64 {
    let n_left = left.data.n_rows() as f64;
    let n_right = right.data.n_rows() as f64;
    (n_left * left.fit.loss + n_right * right.fit.loss) / (n_left + n_right)
}

/// Parent standard deviation minus the size-weighted child standard
/// deviations; lower is better.
fn std_score(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    feature: usize,
    threshold: f64,
    parent_std: f64,
) -> f64 {
    let column = x.column(feature);
    let (left, right): (Vec<f64>, Vec<f64>) = column
        .iter()
        .zip(y.iter())
        .fold((Vec::new(), Vec::new()), |(mut l, mut r), (&v, &t)| {
            if v <= threshold {
                l.push(t);
            } else {
                r.push(t);
            }
            (l, r)
        });
    let n = y.len() as f64;
    let weighted = (left.len() as f64 * population_std(&left)
        + right.len() as f64 * population_std(&right))
        / n;
    parent_std - weighted
}
