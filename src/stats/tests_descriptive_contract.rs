// =========================================================================
// FALSIFY-DS: descriptive statistics contract
//
// References:
//   - Hyndman & Fan (1996) "Sample Quantiles in Statistical Packages"
// =========================================================================

use super::*;
use proptest::prelude::*;

/// FALSIFY-DS-001: Median of sorted data is correct
#[test]
fn falsify_ds_001_median_correct() {
    let data = [1.0, 2.0, 3.0, 4.0, 5.0];
    let median = DescriptiveStats::new(&data).quantile(0.5).expect("valid quantile");
    assert!(
        (median - 3.0).abs() < 1e-12,
        "FALSIFIED DS-001: median={median}, expected 3.0"
    );
}

/// FALSIFY-DS-002: Extreme quantiles return min and max of unsorted data
#[test]
fn falsify_ds_002_extreme_quantiles() {
    let data = [5.0, 1.0, 3.0, 2.0, 4.0];
    let stats = DescriptiveStats::new(&data);
    assert_eq!(stats.quantile(0.0).expect("valid quantile"), 1.0);
    assert_eq!(stats.quantile(1.0).expect("valid quantile"), 5.0);
}

/// FALSIFY-DS-003: R-7 interpolates between order statistics
#[test]
fn falsify_ds_003_r7_interpolation() {
    // h = 3 * 0.25 = 0.75 -> 10 + 0.75 * (20 - 10)
    let data = [10.0, 20.0, 30.0, 40.0];
    let q1 = DescriptiveStats::new(&data).quantile(0.25).expect("valid quantile");
    assert!((q1 - 17.5).abs() < 1e-12, "FALSIFIED DS-003: q1={q1}");
}

/// FALSIFY-DS-004: quantile rejects empty data and out-of-range q
#[test]
fn falsify_ds_004_quantile_errors() {
    assert!(DescriptiveStats::new(&[]).quantile(0.5).is_err());
    assert!(DescriptiveStats::new(&[1.0]).quantile(1.5).is_err());
    assert!(DescriptiveStats::new(&[1.0]).quantile(-0.1).is_err());
}

/// FALSIFY-DS-005: population std divides by n
#[test]
fn falsify_ds_005_population_std() {
    let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
    let stats = DescriptiveStats::new(&data);
    assert!((stats.mean() - 5.0).abs() < 1e-12);
    assert!((stats.std() - 2.0).abs() < 1e-12);
    assert_eq!(population_std(&[3.0]), 0.0);
    assert_eq!(population_std(&[]), 0.0);
}

#[test]
fn test_average_ranks_ties() {
    assert_eq!(
        average_ranks(&[10.0, 20.0, 20.0, 30.0]),
        vec![1.0, 2.5, 2.5, 4.0]
    );
    assert_eq!(average_ranks(&[3.0, 1.0, 2.0]), vec![3.0, 1.0, 2.0]);
    assert_eq!(average_ranks(&[7.0, 7.0, 7.0]), vec![2.0, 2.0, 2.0]);
    assert!(average_ranks(&[]).is_empty());
}

#[test]
fn test_quantiles_single_sort_matches_individual() {
    let data = [9.0, 1.0, 4.0, 6.0, 2.0, 8.0];
    let stats = DescriptiveStats::new(&data);
    let batch = stats.quantiles(&[0.25, 0.5, 0.75]).expect("valid quantiles");
    for (q, v) in [0.25, 0.5, 0.75].iter().zip(&batch) {
        assert_eq!(stats.quantile(*q).expect("valid quantile"), *v);
    }
}

#[test]
fn test_round_to() {
    assert_eq!(round_to(1.23456, 2), 1.23);
    assert_eq!(round_to(-0.125, 2), -0.13);
    assert_eq!(round_to(0.99996, 4), 1.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// FALSIFY-DS-006: quantiles are monotone in q and bounded by min/max
    #[test]
    fn falsify_ds_006_quantiles_monotone(
        data in proptest::collection::vec(-1e6f64..1e6, 1..40),
    ) {
        let stats = DescriptiveStats::new(&data);
        let qs = stats.quantiles(&[0.0, 0.25, 0.5, 0.75, 1.0]).expect("valid quantiles");
        for pair in qs.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(qs[0], min);
        prop_assert_eq!(qs[4], max);
    }

    /// FALSIFY-DS-007: ranks sum to n(n+1)/2 regardless of ties
    #[test]
    fn falsify_ds_007_rank_sum(
        data in proptest::collection::vec(0i32..5, 1..30),
    ) {
        let values: Vec<f64> = data.iter().map(|&v| f64::from(v)).collect();
        let n = values.len() as f64;
        let total: f64 = average_ranks(&values).iter().sum();
        prop_assert!((total - n * (n + 1.0) / 2.0).abs() < 1e-9);
    }
}
