// Two-sample non-parametric hypothesis tests
//
// Each test is a separate type implementing `HypothesisTest`; the
// aggregator runs them as a list.
//
// - RankSumTest: Mann-Whitney U with midrank tie correction (location shift)
// - DistributionTest: two-sample Kolmogorov-Smirnov (any distribution change)

mod distribution;
mod rank_sum;

pub use distribution::{kolmogorov_tail, ks_statistic, DistributionDifference, DistributionTest};
pub use rank_sum::{midranks, RankSumTest};

use crate::config::DistributionThresholds;
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum observations per group for either test
pub const MIN_OBSERVATIONS: usize = 2;

/// Which test produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    RankSum,
    Distribution,
}

impl TestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::RankSum => "rank-sum",
            TestKind::Distribution => "distribution",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::RankSum => write!(f, "Mann-Whitney U"),
            TestKind::Distribution => write!(f, "Kolmogorov-Smirnov"),
        }
    }
}

/// Test-specific statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestStatistics {
    RankSum {
        /// `min(U1, n1*n2 - U1)`
        u: f64,
        /// U1, the statistic for the first sample
        u1: f64,
        /// Rank sum of the first sample
        rank_sum1: f64,
        z: f64,
        /// `|z| / sqrt(n1 + n2)`
        effect_size: f64,
    },
    Distribution {
        /// Maximum absolute ECDF gap
        d: f64,
        /// `d * sqrt(n1*n2 / (n1+n2))`
        lambda: f64,
        difference: DistributionDifference,
    },
}

/// Outcome of one hypothesis test on one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test: TestKind,
    pub statistics: TestStatistics,
    pub p_value: f64,
    /// `p_value < alpha`
    pub significant: bool,
    pub alpha: f64,
    pub interpretation: String,
}

impl TestResult {
    /// Headline statistic: U for the rank-sum test, D for the distribution test
    pub fn statistic(&self) -> f64 {
        match self.statistics {
            TestStatistics::RankSum { u, .. } => u,
            TestStatistics::Distribution { d, .. } => d,
        }
    }
}

/// Common contract of the two-sample tests
pub trait HypothesisTest: Send + Sync {
    fn kind(&self) -> TestKind;

    /// Compare two raw samples; `InsufficientData` below two observations per group
    fn run(&self, sample1: &[f64], sample2: &[f64]) -> Result<TestResult>;
}

/// Default test battery, rank-sum first
pub fn default_tests(
    alpha: f64,
    thresholds: DistributionThresholds,
) -> Vec<Box<dyn HypothesisTest>> {
    vec![
        Box::new(RankSumTest::new(alpha)),
        Box::new(DistributionTest::new(alpha, thresholds)),
    ]
}

pub(crate) fn check_sizes(test: TestKind, sample1: &[f64], sample2: &[f64]) -> Result<()> {
    for (group, sample) in [("period1", sample1), ("period2", sample2)] {
        if sample.len() < MIN_OBSERVATIONS {
            return Err(EngineError::InsufficientData {
                test: test.as_str(),
                group,
                required: MIN_OBSERVATIONS,
                actual: sample.len(),
            });
        }
    }
    Ok(())
}

/// Two-sided standard normal tail `2 * (1 - Phi(|z|))`, computed as `erfc(|z|/sqrt 2)`
pub fn normal_two_sided_p(z: f64) -> f64 {
    statrs::function::erf::erfc(z.abs() / std::f64::consts::SQRT_2).clamp(0.0, 1.0)
}
