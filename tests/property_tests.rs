//! Property-based tests for the hypothesis tests, screening and ranking
//!
//! Properties covered:
//! 1. Rank-sum and KS symmetry in their arguments
//! 2. Midrank totals under ties
//! 3. Identical multisets give D = 0 and U = n1*n2/2
//! 4. Larger injected shifts never weaken |z| or D
//! 5. Size-1 samples fail with InsufficientData
//! 6. Screening is deterministic
//! 7. Trend partitions of the ranked table reproduce the full table

use kpi_compare::hypothesis::{midranks, TestStatistics};
use kpi_compare::{
    rank, screen, ComparisonConfig, DistributionTest, EngineError, HypothesisTest, MetricSample,
    RankQuery, RankSumTest, TrendFilter,
};
use proptest::prelude::*;

fn rank_sum_z(a: &[f64], b: &[f64]) -> f64 {
    match RankSumTest::default().run(a, b).unwrap().statistics {
        TestStatistics::RankSum { z, .. } => z,
        _ => unreachable!(),
    }
}

fn sample_vec(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1000.0f64..1000.0, 2..max_len)
}

// Integer-valued samples force plenty of ties
fn tied_vec(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((0i32..6).prop_map(f64::from), 2..max_len)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_rank_sum_symmetric(a in tied_vec(30), b in tied_vec(30)) {
        let ab = RankSumTest::default().run(&a, &b).unwrap();
        let ba = RankSumTest::default().run(&b, &a).unwrap();
        prop_assert!((ab.p_value - ba.p_value).abs() < 1e-12);
        prop_assert!((rank_sum_z(&a, &b).abs() - rank_sum_z(&b, &a).abs()).abs() < 1e-9);
        prop_assert_eq!(ab.statistic(), ba.statistic());
    }

    #[test]
    fn prop_ks_symmetric(a in sample_vec(40), b in tied_vec(40)) {
        let ab = DistributionTest::default().run(&a, &b).unwrap();
        let ba = DistributionTest::default().run(&b, &a).unwrap();
        prop_assert_eq!(ab.statistic(), ba.statistic());
        prop_assert_eq!(ab.p_value, ba.p_value);
    }

    #[test]
    fn prop_midranks_sum_exact(values in prop::collection::vec((0i32..8).prop_map(f64::from), 1..80)) {
        let (ranks, _) = midranks(&values);
        let n = values.len() as f64;
        prop_assert_eq!(ranks.iter().sum::<f64>(), n * (n + 1.0) / 2.0);
    }

    #[test]
    fn prop_p_values_in_unit_interval(a in sample_vec(25), b in sample_vec(25)) {
        for test in [&RankSumTest::default() as &dyn HypothesisTest, &DistributionTest::default()] {
            let result = test.run(&a, &b).unwrap();
            prop_assert!((0.0..=1.0).contains(&result.p_value));
            prop_assert_eq!(result.significant, result.p_value < result.alpha);
        }
    }

    #[test]
    fn prop_identical_multisets(a in tied_vec(30), seed in any::<u64>()) {
        // same multiset, rotated
        let mut b = a.clone();
        let shift = (seed as usize) % b.len();
        b.rotate_left(shift);

        let ks = DistributionTest::default().run(&a, &b).unwrap();
        prop_assert_eq!(ks.statistic(), 0.0);

        let rs = RankSumTest::default().run(&a, &b).unwrap();
        let n = a.len() as f64;
        prop_assert_eq!(rs.statistic(), n * n / 2.0);
        prop_assert!(rank_sum_z(&a, &b).abs() < 1e-12);
    }

    #[test]
    fn prop_larger_shift_is_no_weaker(
        base in prop::collection::vec(0.0f64..100.0, 5..30),
        small in 0.0f64..20.0,
        extra in 0.0f64..20.0,
    ) {
        let near: Vec<f64> = base.iter().map(|v| v + small).collect();
        let far: Vec<f64> = base.iter().map(|v| v + small + extra).collect();

        prop_assert!(rank_sum_z(&base, &far).abs() + 1e-9 >= rank_sum_z(&base, &near).abs());

        let d_near = DistributionTest::default().run(&base, &near).unwrap().statistic();
        let d_far = DistributionTest::default().run(&base, &far).unwrap().statistic();
        prop_assert!(d_far >= d_near);
    }

    #[test]
    fn prop_size_one_is_insufficient(x in -1e6f64..1e6, b in sample_vec(10)) {
        for test in [&RankSumTest::default() as &dyn HypothesisTest, &DistributionTest::default()] {
            let first = test.run(&[x], &b);
            let second = test.run(&b, &[x]);
            let is_insufficient = |r: &Result<_, EngineError>| {
                matches!(r, Err(EngineError::InsufficientData { actual: 1, .. }))
            };
            prop_assert!(is_insufficient(&first));
            prop_assert!(is_insufficient(&second));
        }
    }
}

fn metric_strategy() -> impl Strategy<Value = MetricSample> {
    (
        "[A-Z]{2,6}",
        prop::collection::vec(1.0f64..100.0, 0..8),
        prop::collection::vec(1.0f64..100.0, 0..8),
        0.0f64..10.0,
    )
        .prop_map(|(name, p1, p2, weight)| MetricSample::new(name, p1, p2).with_weight(weight))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_screening_idempotent(samples in prop::collection::vec(metric_strategy(), 0..25)) {
        let config = ComparisonConfig::default();
        let first = screen(&samples, &config).unwrap();
        let second = screen(&samples, &config).unwrap();
        prop_assert_eq!(first.alarm, second.alarm);
        prop_assert_eq!(first.abnormal, second.abnormal);
        prop_assert!((0.0..=1.0).contains(&first.alarm.abnormal_score));
    }

    #[test]
    fn prop_trend_partition_round_trip(samples in prop::collection::vec(metric_strategy(), 0..25)) {
        let config = ComparisonConfig::default();
        let page = |trend| rank(&samples, &config, &RankQuery::all().with_trend(trend)).unwrap();

        let full = page(TrendFilter::All).records;
        let up = page(TrendFilter::Up).records;
        let down = page(TrendFilter::Down).records;
        let stable = page(TrendFilter::Stable).records;

        prop_assert_eq!(up.len() + down.len() + stable.len(), full.len());
        prop_assert!(up.iter().all(|r| !down.contains(r)));

        // merging the partitions back in table order gives the full table
        let mut merged: Vec<_> = up.into_iter().chain(down).chain(stable).collect();
        merged.sort_by_key(|r| full.iter().position(|f| f == r));
        prop_assert_eq!(merged, full);
    }

    #[test]
    fn prop_paging_is_a_slice(
        samples in prop::collection::vec(metric_strategy(), 0..30),
        page_size in 1usize..8,
    ) {
        let config = ComparisonConfig::default();
        let full = rank(&samples, &config, &RankQuery::all()).unwrap();

        let mut paged = Vec::new();
        let mut index = 0;
        loop {
            let page = rank(&samples, &config, &RankQuery::default().with_page(index, page_size))
                .unwrap();
            prop_assert_eq!(page.total_matches, full.total_matches);
            if page.records.is_empty() {
                prop_assert_eq!(index, page.total_pages);
                break;
            }
            paged.extend(page.records);
            index += 1;
        }
        prop_assert_eq!(paged, full.records);
    }
}
