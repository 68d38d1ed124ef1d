//! False-positive rate of the significance tests under the null
//!
//! Both periods are drawn from the same N(100, 5) distribution, 20 values
//! each. Over many seeded trials the fraction of significant results at
//! alpha = 0.05 must stay close to alpha.

use kpi_compare::{
    diagnose, ComparisonConfig, Confidence, DistributionTest, HypothesisTest, MetricSample,
    RankSumTest,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

const TRIALS: u64 = 400;
const N: usize = 20;
const ALPHA: f64 = 0.05;

/// Box-Muller draws from N(mean, sd)
fn normal_sample(rng: &mut StdRng, mean: f64, sd: f64, n: usize) -> Vec<f64> {
    (0..n)
        .map(|_| {
            let u1: f64 = 1.0 - rng.gen::<f64>();
            let u2: f64 = rng.gen::<f64>();
            mean + sd * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
        })
        .collect()
}

fn rejection_rate(test: &dyn HypothesisTest) -> f64 {
    let mut rejections = 0;
    for seed in 0..TRIALS {
        let mut rng = StdRng::seed_from_u64(seed);
        let a = normal_sample(&mut rng, 100.0, 5.0, N);
        let b = normal_sample(&mut rng, 100.0, 5.0, N);
        if test.run(&a, &b).unwrap().significant {
            rejections += 1;
        }
    }
    rejections as f64 / TRIALS as f64
}

#[test]
fn test_rank_sum_false_positive_rate_near_alpha() {
    let rate = rejection_rate(&RankSumTest::new(ALPHA));
    assert!(rate > 0.01, "rank-sum rejection rate {} implausibly low", rate);
    assert!(rate < 0.10, "rank-sum rejection rate {} too high", rate);
}

#[test]
fn test_distribution_false_positive_rate_at_most_alpha() {
    // the asymptotic KS tail is conservative at n = 20
    let rate = rejection_rate(&DistributionTest::default());
    assert!(rate < 0.10, "KS rejection rate {} too high", rate);
}

#[test]
fn test_null_metrics_rarely_reach_high_confidence() {
    let config = ComparisonConfig {
        top_k: TRIALS as usize,
        ..Default::default()
    };
    let samples: Vec<MetricSample> = (0..TRIALS)
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(10_000 + seed);
            let a = normal_sample(&mut rng, 100.0, 5.0, N);
            let b = normal_sample(&mut rng, 100.0, 5.0, N);
            MetricSample::new(format!("NULL_{:03}", seed), a, b)
        })
        .collect();

    let entries = diagnose(&samples, &config).unwrap();
    assert_eq!(entries.len(), TRIALS as usize);

    let high = entries
        .iter()
        .filter(|e| e.confidence == Confidence::High)
        .count();
    let low = entries
        .iter()
        .filter(|e| e.confidence == Confidence::Low)
        .count();
    assert!((high as f64) < 0.10 * TRIALS as f64);
    assert!((low as f64) > 0.85 * TRIALS as f64);
}

#[test]
fn test_real_shift_is_detected() {
    let mut detected = 0;
    for seed in 0..100u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let a = normal_sample(&mut rng, 100.0, 5.0, N);
        let b = normal_sample(&mut rng, 110.0, 5.0, N);
        if RankSumTest::new(ALPHA).run(&a, &b).unwrap().significant {
            detected += 1;
        }
    }
    // two standard deviations of shift: power is well above 90%
    assert!(detected >= 85, "only {} of 100 shifts detected", detected);
}
