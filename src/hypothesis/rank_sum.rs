// Mann-Whitney U rank-sum test (two-sided, normal approximation)
//
// Ranks are midranks: tied values share the average of the ranks they
// occupy, so the rank total is always n(n+1)/2. The variance of U is
// reduced by the standard tie correction
//   sigma^2 = n1*n2/12 * ((n+1) - sum(t^3 - t) / (n(n-1)))
// No continuity correction is applied.

use super::{check_sizes, normal_two_sided_p, HypothesisTest, TestKind, TestResult, TestStatistics};
use crate::error::Result;

/// Midranks of `values` (1-based, input order) and the tie term `sum(t^3 - t)`
///
/// Values are tied only when exactly equal.
///
/// # Example
/// ```
/// use kpi_compare::hypothesis::midranks;
///
/// let (ranks, ties) = midranks(&[10.0, 20.0, 10.0, 30.0]);
/// assert_eq!(ranks, vec![1.5, 3.0, 1.5, 4.0]);
/// assert_eq!(ties, 6.0);
/// ```
pub fn midranks(values: &[f64]) -> (Vec<f64>, f64) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut i = 0;

    while i < order.len() {
        let value = values[order[i]];
        let mut j = i + 1;
        while j < order.len() && values[order[j]] == value {
            j += 1;
        }

        // positions i..j hold ranks (i+1)..=j
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for &idx in &order[i..j] {
            ranks[idx] = avg_rank;
        }

        let t = (j - i) as f64;
        if j - i > 1 {
            tie_term += t * t * t - t;
        }
        i = j;
    }

    (ranks, tie_term)
}

/// Two-sample Mann-Whitney U test
#[derive(Debug, Clone, Copy)]
pub struct RankSumTest {
    alpha: f64,
}

impl RankSumTest {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }
}

impl Default for RankSumTest {
    fn default() -> Self {
        Self::new(0.05)
    }
}

impl HypothesisTest for RankSumTest {
    fn kind(&self) -> TestKind {
        TestKind::RankSum
    }

    fn run(&self, sample1: &[f64], sample2: &[f64]) -> Result<TestResult> {
        check_sizes(TestKind::RankSum, sample1, sample2)?;

        let n1 = sample1.len() as f64;
        let n2 = sample2.len() as f64;
        let n = n1 + n2;

        let combined: Vec<f64> = sample1.iter().chain(sample2.iter()).copied().collect();
        let (ranks, tie_term) = midranks(&combined);

        let rank_sum1: f64 = ranks[..sample1.len()].iter().sum();
        let u1 = rank_sum1 - n1 * (n1 + 1.0) / 2.0;
        let u = u1.min(n1 * n2 - u1);

        let mu = n1 * n2 / 2.0;
        let variance = n1 * n2 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));

        // every observation tied: no evidence either way
        let z = if variance > 0.0 {
            (u - mu) / variance.sqrt()
        } else {
            0.0
        };

        let p_value = normal_two_sided_p(z);
        let effect_size = z.abs() / n.sqrt();
        let significant = p_value < self.alpha;

        let interpretation = if significant {
            format!(
                "Location shift between periods is significant (U={:.1}, z={:.3}, p={:.4} < {})",
                u, z, p_value, self.alpha
            )
        } else {
            format!(
                "No significant location shift between periods (U={:.1}, z={:.3}, p={:.4})",
                u, z, p_value
            )
        };

        Ok(TestResult {
            test: TestKind::RankSum,
            statistics: TestStatistics::RankSum {
                u,
                u1,
                rank_sum1,
                z,
                effect_size,
            },
            p_value,
            significant,
            alpha: self.alpha,
            interpretation,
        })
    }
}
