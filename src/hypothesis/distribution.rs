// Two-sample Kolmogorov-Smirnov test
//
// D is the largest gap between the two empirical CDFs, evaluated at every
// distinct observed value. The gap is computed in integer arithmetic
// (|i*n2 - j*n1| / (n1*n2)) so D is exact and symmetric in its arguments.
//
// The asymptotic p-value is the Kolmogorov tail Q(lambda) with
// lambda = D * sqrt(n1*n2 / (n1+n2)).

use super::{check_sizes, HypothesisTest, TestKind, TestResult, TestStatistics};
use crate::config::DistributionThresholds;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Below this lambda the Jacobi-transformed series converges faster
const SMALL_LAMBDA: f64 = 1.18;
const SERIES_EPS: f64 = 1e-16;
const MAX_TERMS: usize = 100;

/// Coarse size of the distribution change, from D
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionDifference {
    Small,
    Medium,
    Large,
}

impl DistributionDifference {
    pub fn classify(d: f64, thresholds: &DistributionThresholds) -> Self {
        if d < thresholds.small {
            DistributionDifference::Small
        } else if d < thresholds.medium {
            DistributionDifference::Medium
        } else {
            DistributionDifference::Large
        }
    }
}

impl fmt::Display for DistributionDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistributionDifference::Small => write!(f, "small"),
            DistributionDifference::Medium => write!(f, "medium"),
            DistributionDifference::Large => write!(f, "large"),
        }
    }
}

/// Kolmogorov distribution tail `Q(lambda) = P(K > lambda)`, clamped to [0, 1]
///
/// # Example
/// ```
/// use kpi_compare::hypothesis::kolmogorov_tail;
///
/// assert_eq!(kolmogorov_tail(0.0), 1.0);
/// assert!((kolmogorov_tail(1.3581) - 0.05).abs() < 1e-3);
/// ```
pub fn kolmogorov_tail(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let p = if lambda < SMALL_LAMBDA {
        1.0 - kolmogorov_cdf_small(lambda)
    } else {
        kolmogorov_tail_series(lambda)
    };
    p.clamp(0.0, 1.0)
}

// K(l) = sqrt(2 pi)/l * sum_k exp(-(2k-1)^2 pi^2 / (8 l^2))
fn kolmogorov_cdf_small(lambda: f64) -> f64 {
    let factor = -PI * PI / (8.0 * lambda * lambda);
    let mut sum = 0.0;
    for k in 1..=MAX_TERMS {
        let odd = (2 * k - 1) as f64;
        let term = (factor * odd * odd).exp();
        sum += term;
        if term < SERIES_EPS * sum {
            break;
        }
    }
    (2.0 * PI).sqrt() / lambda * sum
}

// Q(l) = 2 * sum_k (-1)^(k-1) exp(-2 k^2 l^2)
fn kolmogorov_tail_series(lambda: f64) -> f64 {
    let factor = -2.0 * lambda * lambda;
    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=MAX_TERMS {
        let kf = k as f64;
        let term = (factor * kf * kf).exp();
        sum += sign * term;
        if term < SERIES_EPS {
            break;
        }
        sign = -sign;
    }
    2.0 * sum
}

/// Sorted copy with -0.0 folded into 0.0 so signed zeros tie
fn sorted_values(sample: &[f64]) -> Vec<f64> {
    let mut values: Vec<f64> = sample
        .iter()
        .map(|&v| if v == 0.0 { 0.0 } else { v })
        .collect();
    values.sort_by(f64::total_cmp);
    values
}

/// Largest ECDF gap between two samples
pub fn ks_statistic(sample1: &[f64], sample2: &[f64]) -> f64 {
    let s1 = sorted_values(sample1);
    let s2 = sorted_values(sample2);

    let (n1, n2) = (s1.len(), s2.len());
    if n1 == 0 || n2 == 0 {
        return 0.0;
    }

    let (mut i, mut j) = (0usize, 0usize);
    let mut max_gap: u128 = 0;

    while i < n1 && j < n2 {
        let x = if s1[i].total_cmp(&s2[j]).is_le() {
            s1[i]
        } else {
            s2[j]
        };
        while i < n1 && s1[i].total_cmp(&x).is_le() {
            i += 1;
        }
        while j < n2 && s2[j].total_cmp(&x).is_le() {
            j += 1;
        }
        let gap = (i as u128 * n2 as u128).abs_diff(j as u128 * n1 as u128);
        max_gap = max_gap.max(gap);
    }

    max_gap as f64 / (n1 as f64 * n2 as f64)
}

/// Two-sample Kolmogorov-Smirnov test
#[derive(Debug, Clone, Copy)]
pub struct DistributionTest {
    alpha: f64,
    thresholds: DistributionThresholds,
}

impl DistributionTest {
    pub fn new(alpha: f64, thresholds: DistributionThresholds) -> Self {
        Self { alpha, thresholds }
    }
}

impl Default for DistributionTest {
    fn default() -> Self {
        Self::new(0.05, DistributionThresholds::default())
    }
}

impl HypothesisTest for DistributionTest {
    fn kind(&self) -> TestKind {
        TestKind::Distribution
    }

    fn run(&self, sample1: &[f64], sample2: &[f64]) -> Result<TestResult> {
        check_sizes(TestKind::Distribution, sample1, sample2)?;

        let n1 = sample1.len() as f64;
        let n2 = sample2.len() as f64;

        let d = ks_statistic(sample1, sample2);
        let lambda = d * (n1 * n2 / (n1 + n2)).sqrt();
        let p_value = kolmogorov_tail(lambda);
        let difference = DistributionDifference::classify(d, &self.thresholds);
        let significant = p_value < self.alpha;

        let interpretation = if significant {
            format!(
                "Period distributions differ significantly ({} difference, D={:.3}, p={:.4} < {})",
                difference, d, p_value, self.alpha
            )
        } else {
            format!(
                "Period distributions are consistent ({} difference, D={:.3}, p={:.4})",
                difference, d, p_value
            )
        };

        Ok(TestResult {
            test: TestKind::Distribution,
            statistics: TestStatistics::Distribution {
                d,
                lambda,
                difference,
            },
            p_value,
            significant,
            alpha: self.alpha,
            interpretation,
        })
    }
}
