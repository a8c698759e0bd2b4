use super::*;
use approx::assert_abs_diff_eq;
use proptest::prelude::*;

#[test]
fn test_pearson_perfect_positive_and_negative() {
    let x = [1.0, 2.0, 3.0, 4.0];
    assert_abs_diff_eq!(
        pearson(&x, &[2.0, 4.0, 6.0, 8.0]).expect("equal lengths"),
        1.0,
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(
        pearson(&x, &[8.0, 6.0, 4.0, 2.0]).expect("equal lengths"),
        -1.0,
        epsilon = 1e-12
    );
}

#[test]
fn test_pearson_constant_column_is_nan() {
    let r = pearson(&[1.0, 2.0, 3.0], &[5.0, 5.0, 5.0]).expect("equal lengths");
    assert!(r.is_nan());
}

#[test]
fn test_constant_fractional_column_is_nan() {
    let ramp: Vec<f64> = (0..11).map(f64::from).collect();
    assert!(pearson(&[12_345.678; 11], &ramp).expect("equal lengths").is_nan());

    let ramp: Vec<f64> = (0..205).map(f64::from).collect();
    let curb = vec![2_548.3; 205];
    for method in CorrelationMethod::ALL {
        let r = method.coefficient(&curb, &ramp).expect("equal lengths");
        assert!(r.is_nan(), "{method} gave {r}");
    }
}

#[test]
fn test_tiny_scale_column_still_correlates() {
    let ramp: Vec<f64> = (0..11).map(f64::from).collect();
    let tiny: Vec<f64> = ramp.iter().map(|v| v * 1e-14).collect();
    assert_abs_diff_eq!(pearson(&tiny, &ramp).expect("equal lengths"), 1.0, epsilon = 1e-9);
}

#[test]
fn test_pearson_dimension_mismatch() {
    let err = pearson(&[1.0, 2.0, 3.0], &[1.0, 2.0]).expect_err("length mismatch");
    assert!(matches!(err, AppraiserError::DimensionMismatch { .. }));
    assert!(pearson(&[], &[]).is_err());
}

#[test]
fn test_spearman_monotone_is_one() {
    let x = [1.0, 2.0, 3.0, 4.0, 5.0];
    let y = [1.0, 8.0, 27.0, 64.0, 1000.0];
    assert_abs_diff_eq!(spearman(&x, &y).expect("equal lengths"), 1.0, epsilon = 1e-12);
}

#[test]
fn test_spearman_with_ties() {
    // ranks x: [1, 2.5, 2.5, 4], y: [1, 2, 3, 4]
    let rho = spearman(&[1.0, 2.0, 2.0, 3.0], &[10.0, 20.0, 30.0, 40.0]).expect("equal lengths");
    let expected = pearson(&[1.0, 2.5, 2.5, 4.0], &[1.0, 2.0, 3.0, 4.0]).expect("equal lengths");
    assert_abs_diff_eq!(rho, expected, epsilon = 1e-12);
}

#[test]
fn test_kendall_known_value() {
    // 5 concordant, 1 discordant of 6 pairs, no ties -> 4/6
    let tau = kendall_tau_b(&[1.0, 2.0, 3.0, 4.0], &[1.0, 3.0, 2.0, 4.0]).expect("equal lengths");
    assert_abs_diff_eq!(tau, 4.0 / 6.0, epsilon = 1e-12);
}

#[test]
fn test_kendall_tau_b_with_ties() {
    // x ties on one pair: n0=6, n1=1, n2=0; nc=5, nd=0
    let tau = kendall_tau_b(&[1.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 4.0]).expect("equal lengths");
    assert_abs_diff_eq!(tau, 5.0 / (5.0f64 * 6.0).sqrt(), epsilon = 1e-12);
}

#[test]
fn test_kendall_constant_is_nan() {
    assert!(kendall_tau_b(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0])
        .expect("equal lengths")
        .is_nan());
    assert!(kendall_tau_b(&[1.0], &[1.0]).expect("one pair").is_nan());
}

#[test]
fn test_method_coefficient_dispatch() {
    let x = [1.0, 2.0, 3.0];
    let y = [3.0, 2.0, 1.0];
    for method in CorrelationMethod::ALL {
        assert_abs_diff_eq!(
            method.coefficient(&x, &y).expect("equal lengths"),
            -1.0,
            epsilon = 1e-12
        );
    }
    assert_eq!(CorrelationMethod::Kendall.to_string(), "kendall");
}

#[test]
fn test_correlation_matrix_labels_and_diagonal() {
    let hp = [100.0, 150.0, 200.0, 120.0];
    let price = [10_000.0, 15_500.0, 21_000.0, 12_000.0];
    let mpg = [35.0, 28.0, 22.0, 31.0];
    let cols: Vec<(&str, &[f64])> = vec![
        ("horsepower", &hp[..]),
        ("price", &price[..]),
        ("mpg", &mpg[..]),
    ];

    let m = correlation_matrix(&cols, CorrelationMethod::Pearson).expect("valid columns");
    assert_eq!(m.len(), 3);
    assert_eq!(m.names(), &["horsepower", "price", "mpg"]);
    for i in 0..3 {
        assert_eq!(m.get(i, i), 1.0);
    }
    assert!(m.is_symmetric(0.0));
    assert!(m.value("horsepower", "price").expect("both present") > 0.9);
    assert!(m.value("mpg", "price").expect("both present") < -0.9);
    assert!(m.value("missing", "price").is_none());
}

#[test]
fn test_correlation_matrix_zero_variance_column_reports_nan() {
    let a = [1.0, 2.0, 3.0];
    let flat = [4.0, 4.0, 4.0];
    let cols: Vec<(&str, &[f64])> = vec![("a", &a[..]), ("flat", &flat[..])];

    for method in CorrelationMethod::ALL {
        let m = correlation_matrix(&cols, method).expect("constant column is not an error");
        assert_eq!(m.get(1, 1), 1.0);
        assert!(m.get(0, 1).is_nan());
        assert!(m.get(1, 0).is_nan());
        assert!(m.is_symmetric(1e-12));
    }
}

#[test]
fn test_correlation_matrix_rejects_bad_input() {
    assert!(correlation_matrix(&[], CorrelationMethod::Pearson).is_err());

    let a = [1.0, 2.0];
    let b = [1.0];
    let cols: Vec<(&str, &[f64])> = vec![("a", &a[..]), ("b", &b[..])];
    let err = correlation_matrix(&cols, CorrelationMethod::Spearman).expect_err("ragged columns");
    assert!(matches!(err, AppraiserError::DimensionMismatch { .. }));
}

#[test]
fn test_correlation_matrix_serializes_nan_as_null() {
    let a = [1.0, 2.0, 3.0];
    let flat = [0.0, 0.0, 0.0];
    let cols: Vec<(&str, &[f64])> = vec![("a", &a[..]), ("flat", &flat[..])];
    let m = correlation_matrix(&cols, CorrelationMethod::Pearson).expect("valid columns");
    let json = serde_json::to_string(&m).expect("serializable");
    assert!(json.contains("\"pearson\""));
    assert!(json.contains("null"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_matrices_symmetric_bounded_unit_diagonal(
        rows in proptest::collection::vec((-1e3f64..1e3, -1e3f64..1e3, -1e3f64..1e3), 2..25),
    ) {
        let a: Vec<f64> = rows.iter().map(|r| r.0).collect();
        let b: Vec<f64> = rows.iter().map(|r| r.1).collect();
        let c: Vec<f64> = rows.iter().map(|r| r.2).collect();
        let cols: Vec<(&str, &[f64])> = vec![("a", &a[..]), ("b", &b[..]), ("c", &c[..])];

        for method in CorrelationMethod::ALL {
            let m = correlation_matrix(&cols, method).expect("valid columns");
            prop_assert!(m.is_symmetric(1e-12));
            for i in 0..3 {
                prop_assert_eq!(m.get(i, i), 1.0);
                for j in 0..3 {
                    let v = m.get(i, j);
                    prop_assert!(v.is_nan() || (-1.0..=1.0).contains(&v));
                }
            }
        }
    }
}
