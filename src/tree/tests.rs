use super::*;

fn regression_data() -> (Matrix<f64>, Vector<f64>) {
    let x = Matrix::from_vec(
        8,
        2,
        vec![
            1.0, 0.0, // 2
            0.0, 1.0, // 3
            1.0, 1.0, // 5
            2.0, 0.0, // 4
            0.0, 2.0, // 6
            2.0, 1.0, // 7
            1.0, 2.0, // 8
            3.0, 1.0, // 9
        ],
    )
    .expect("regression data matrix");
    let y = Vector::from_slice(&[2.0, 3.0, 5.0, 4.0, 6.0, 7.0, 8.0, 9.0]);
    (x, y)
}

// ====================================================================
// DecisionTreeRegressor
// ====================================================================

#[test]
fn test_tree_predict_before_fit_is_not_trained() {
    let tree = DecisionTreeRegressor::new();
    let (x, _) = regression_data();
    assert!(matches!(tree.predict(&x), Err(AppraiserError::NotTrained)));
    assert!(tree.depth().is_none());
}

#[test]
fn test_tree_unbounded_depth_memorizes_training_data() {
    let (x, y) = regression_data();
    let mut tree = DecisionTreeRegressor::new();
    tree.fit(&x, &y).expect("fit should succeed");
    let preds = tree.predict(&x).expect("fitted");
    for (p, t) in preds.as_slice().iter().zip(y.as_slice()) {
        assert!((p - t).abs() < 1e-9, "pred {p} vs true {t}");
    }
}

#[test]
fn test_tree_max_depth_zero_predicts_mean() {
    let (x, y) = regression_data();
    let mut tree = DecisionTreeRegressor::new().with_max_depth(0);
    tree.fit(&x, &y).expect("fit should succeed");
    assert_eq!(tree.depth(), Some(0));
    let preds = tree.predict(&x).expect("fitted");
    assert!(preds.as_slice().iter().all(|p| (p - 5.5).abs() < 1e-12));
}

#[test]
fn test_tree_respects_max_depth() {
    let (x, y) = regression_data();
    let mut tree = DecisionTreeRegressor::new().with_max_depth(2);
    tree.fit(&x, &y).expect("fit should succeed");
    assert!(tree.depth().expect("fitted") <= 2);
}

#[test]
fn test_tree_min_samples_leaf_blocks_tiny_leaves() {
    let (x, y) = regression_data();
    let mut tree = DecisionTreeRegressor::new().with_min_samples_leaf(4);
    tree.fit(&x, &y).expect("fit should succeed");
    // 8 samples with >= 4 per leaf allows a single split at most
    assert!(tree.depth().expect("fitted") <= 1);
}

#[test]
fn test_tree_constant_target_is_single_leaf() {
    let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).expect("4x1");
    let y = Vector::from_slice(&[7.0; 4]);
    let mut tree = DecisionTreeRegressor::new();
    tree.fit(&x, &y).expect("fit should succeed");
    assert_eq!(tree.depth(), Some(0));
}

#[test]
fn test_tree_fit_rejects_mismatch_and_empty() {
    let (x, _) = regression_data();
    let mut tree = DecisionTreeRegressor::new();
    assert!(tree.fit(&x, &Vector::from_slice(&[1.0])).is_err());

    let empty = Matrix::from_vec(0, 2, vec![]).expect("0x2");
    let err = tree
        .fit(&empty, &Vector::from_vec(vec![]))
        .expect_err("zero samples");
    assert!(matches!(err, AppraiserError::EmptyInput { .. }));
}

#[test]
fn test_tree_predict_rejects_wrong_width() {
    let (x, y) = regression_data();
    let mut tree = DecisionTreeRegressor::new();
    tree.fit(&x, &y).expect("fit should succeed");
    let narrow = Matrix::from_vec(1, 1, vec![1.0]).expect("1x1");
    assert!(matches!(
        tree.predict(&narrow),
        Err(AppraiserError::DimensionMismatch { .. })
    ));
}

// ====================================================================
// RandomForestRegressor
// ====================================================================

#[test]
fn test_forest_new_clamps_estimators() {
    assert_eq!(RandomForestRegressor::new(0).n_estimators(), 1);
    assert_eq!(RandomForestRegressor::default().n_estimators(), 100);
}

#[test]
fn test_forest_predict_before_fit_is_not_trained() {
    let (x, _) = regression_data();
    let rf = RandomForestRegressor::new(5);
    assert!(!rf.is_fitted());
    assert!(matches!(rf.predict(&x), Err(AppraiserError::NotTrained)));
    assert!(rf.feature_importances().is_none());
}

#[test]
fn test_forest_fit_creates_correct_number_of_trees() {
    let (x, y) = regression_data();
    let mut rf = RandomForestRegressor::new(5)
        .with_max_depth(4)
        .with_random_state(42);
    rf.fit(&x, &y).expect("fit should succeed");
    assert_eq!(rf.trees.len(), 5);
    assert!(rf.is_fitted());
}

#[test]
fn test_forest_predictions_stay_within_target_range() {
    let (x, y) = regression_data();
    let mut rf = RandomForestRegressor::new(25).with_random_state(3);
    rf.fit(&x, &y).expect("fit should succeed");

    let probe = Matrix::from_vec(3, 2, vec![-100.0, -100.0, 100.0, 100.0, 1.5, 0.5])
        .expect("3x2");
    let preds = rf.predict(&probe).expect("fitted");
    for p in preds.as_slice() {
        assert!((2.0..=9.0).contains(p), "prediction {p} escaped target range");
    }
}

#[test]
fn test_forest_same_seed_is_reproducible() {
    let (x, y) = regression_data();
    let mut rf1 = RandomForestRegressor::new(20).with_random_state(42);
    let mut rf2 = RandomForestRegressor::new(20).with_random_state(42);
    rf1.fit(&x, &y).expect("fit should succeed");
    rf2.fit(&x, &y).expect("fit should succeed");
    assert_eq!(
        rf1.predict(&x).expect("fitted"),
        rf2.predict(&x).expect("fitted")
    );
}

#[test]
fn test_forest_fits_training_data_well() {
    let (x, y) = regression_data();
    let mut rf = RandomForestRegressor::new(50).with_random_state(11);
    rf.fit(&x, &y).expect("fit should succeed");
    assert!(rf.score(&x, &y).expect("fitted") > 0.6);
}

#[test]
fn test_forest_handles_duplicated_columns() {
    // Two identical indicator columns plus a copy of a numeric column.
    let x = Matrix::from_vec(
        6,
        4,
        vec![
            1.0, 1.0, 10.0, 10.0, //
            1.0, 1.0, 12.0, 12.0, //
            0.0, 0.0, 11.0, 11.0, //
            0.0, 0.0, 30.0, 30.0, //
            1.0, 1.0, 14.0, 14.0, //
            0.0, 0.0, 13.0, 13.0, //
        ],
    )
    .expect("6x4");
    let y = Vector::from_slice(&[100.0, 120.0, 110.0, 300.0, 140.0, 130.0]);
    let mut rf = RandomForestRegressor::new(30).with_random_state(5);
    rf.fit(&x, &y).expect("fit should succeed");
    let preds = rf.predict(&x).expect("fitted");
    assert!(preds
        .as_slice()
        .iter()
        .all(|p| p.is_finite() && (100.0..=300.0).contains(p)));
}

#[test]
fn test_forest_single_sample() {
    let x = Matrix::from_vec(1, 2, vec![1.0, 2.0]).expect("1x2");
    let y = Vector::from_slice(&[42.0]);
    let mut rf = RandomForestRegressor::new(10).with_random_state(0);
    rf.fit(&x, &y).expect("one sample fits");
    assert_eq!(rf.predict(&x).expect("fitted").as_slice(), &[42.0]);
}

#[test]
fn test_forest_feature_importances_favor_informative_feature() {
    // y depends only on the first column
    let mut data = Vec::new();
    let mut targets = Vec::new();
    for i in 0..20 {
        data.push(i as f64);
        data.push(((i * 7) % 5) as f64);
        targets.push(i as f64 * 3.0);
    }
    let x = Matrix::from_vec(20, 2, data).expect("20x2");
    let y = Vector::from_vec(targets);
    let mut rf = RandomForestRegressor::new(20).with_random_state(9);
    rf.fit(&x, &y).expect("fit should succeed");

    let importances = rf.feature_importances().expect("fitted");
    assert_eq!(importances.len(), 2);
    assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert!(importances[0] > importances[1]);
}

#[test]
fn test_bootstrap_sample_seeded() {
    let a = bootstrap_sample(50, Some(1));
    let b = bootstrap_sample(50, Some(1));
    assert_eq!(a, b);
    assert_eq!(a.len(), 50);
    assert!(a.iter().all(|&i| i < 50));
}

#[test]
fn test_best_split_for_feature_finds_step() {
    let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).expect("4x1");
    let y = [0.0, 0.0, 10.0, 10.0];
    let idx = [0, 1, 2, 3];
    let (threshold, gain) =
        best_split_for_feature(&x, &y, &idx, 0, 5.0, 100.0, 1).expect("split exists");
    assert!((threshold - 2.5).abs() < 1e-12);
    assert!((gain - 100.0).abs() < 1e-9);
}
