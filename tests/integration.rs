//! Integration tests for the appraiser engine.
//!
//! These exercise the public API end to end: training, labeling, single
//! record prediction, and the correlation queries, all with the default
//! vehicle schema.

use appraiser::analysis::ConsistencyBand;
use appraiser::prelude::*;
use appraiser::stats::round_to;
use std::sync::Arc;
use std::thread;

fn vehicle(brand: &str, body: &str, hp: f64, price: f64) -> Record {
    Record::new()
        .with("brand", brand)
        .with("fuel_type", "gas")
        .with("body_style", body)
        .with("drivetrain", "fwd")
        .with("aspiration", "std")
        .with("horsepower", hp)
        .with("engine_size", 0.9 * hp + 20.0)
        .with("highway_mpg", 50.0 - hp / 8.0)
        .with("curb_weight", 1_900.0 + 6.0 * hp)
        .with("price", price)
}

fn engine(trees: usize) -> Appraiser {
    Appraiser::new(EngineConfig::default().with_n_estimators(trees)).expect("valid config")
}

/// 30 plausible listings plus one with a wildly inflated price (row 30).
fn market() -> Dataset {
    let mut rows: Vec<Record> = (0..30)
        .map(|i| {
            let hp = 68.0 + 5.0 * i as f64;
            let brand = ["toyota", "honda", "mazda", "bmw", "volvo"][i % 5];
            let body = ["sedan", "hatchback", "wagon"][i % 3];
            let noise = [0.0, 350.0, -420.0, 610.0, -280.0, 150.0][i % 6];
            vehicle(brand, body, hp, 3_000.0 + 120.0 * hp + noise)
        })
        .collect();
    rows.push(vehicle("mazda", "sedan", 140.0, 95_000.0));
    Dataset::from_records(&rows).expect("consistent records")
}

#[test]
fn test_five_vehicle_scenario() {
    // near-identical specs so the forest can split, but should not isolate row 3
    let rows: Vec<Record> = [10_000.0, 12_000.0, 11_000.0, 50_000.0, 10_500.0]
        .iter()
        .enumerate()
        .map(|(i, &price)| vehicle("toyota", "sedan", 90.0 + i as f64, price))
        .collect();
    let ds = Dataset::from_records(&rows).expect("consistent records");

    let appraiser = Appraiser::new(EngineConfig::default()).expect("default config");
    let scored = appraiser.train_and_score(&ds).expect("trainable");
    let report = scored.report();

    for (i, row) in report.rows().iter().enumerate() {
        if i == 3 {
            assert_eq!(row.label, PriceLabel::Overpriced);
            assert!(row.z_score > Z_THRESHOLD);
        } else {
            assert_eq!(row.label, PriceLabel::Normal, "row {i}");
        }
    }
    assert_eq!(report.normal().n_rows(), 4);
    assert_eq!(appraiser.state(), ModelState::Trained);
}

#[test]
fn test_genuine_variance_flags_some_but_not_all() {
    let ds = market();
    let appraiser = engine(40);
    let scored = appraiser.train_and_score(&ds).expect("trainable");
    let report = scored.report();

    let normal = report.count(PriceLabel::Normal);
    assert!(normal > 0 && normal < ds.n_rows());
    assert_eq!(report.rows()[30].label, PriceLabel::Overpriced);
    assert!(report.rows_with(PriceLabel::Overpriced).any(|r| r.index == 30));
}

#[test]
fn test_retraining_same_data_is_idempotent() {
    let ds = market();
    let appraiser = engine(40);

    let first = appraiser.train_and_score(&ds).expect("trainable");
    let second = appraiser.train_and_score(&ds).expect("trainable");

    let labels = |r: &appraiser::outlier::OutlierReport| {
        r.rows().iter().map(|row| row.label).collect::<Vec<_>>()
    };
    assert_eq!(labels(first.report()), labels(second.report()));
    assert_eq!(
        first.clean_r_squared().expect("normal rows"),
        second.clean_r_squared().expect("normal rows")
    );
    assert_eq!(
        appraiser.clean_r_squared().expect("trained"),
        second.clean_r_squared().expect("normal rows")
    );
}

#[test]
fn test_single_row_dataset_trains() {
    let ds = Dataset::from_records(&[vehicle("audi", "sedan", 110.0, 17_450.0)])
        .expect("one record");
    let appraiser = engine(10);
    let scored = appraiser.train_and_score(&ds).expect("one row trains");

    assert_eq!(scored.report().residual_std(), 1.0);
    assert_eq!(scored.report().rows()[0].label, PriceLabel::Normal);

    let p = appraiser
        .predict_single(&vehicle("audi", "sedan", 110.0, 0.0))
        .expect("all fields");
    assert_eq!(p, Prediction::Estimate(17_450.0));
}

#[test]
fn test_empty_dataset_is_rejected() {
    let appraiser = engine(10);
    let empty = market().select_rows(&[]);
    assert!(matches!(
        appraiser.train_and_score(&empty),
        Err(AppraiserError::EmptyInput { .. })
    ));
    assert_eq!(appraiser.state(), ModelState::Untrained);
}

#[test]
fn test_schema_field_absent_is_configuration_error() {
    let rows = vec![Record::new()
        .with("brand", "audi")
        .with("horsepower", 100.0)
        .with("price", 9_000.0)];
    let ds = Dataset::from_records(&rows).expect("one record");
    assert!(matches!(
        engine(10).train_and_score(&ds),
        Err(AppraiserError::Configuration { .. })
    ));
}

#[test]
fn test_seen_and_unseen_categories_predict() {
    let ds = market();
    let appraiser = engine(30);
    appraiser.train_and_score(&ds).expect("trainable");

    let options = appraiser.category_options().expect("trained");
    for (feature, values) in &options {
        let mut sorted = values.clone();
        sorted.sort();
        assert_eq!(&sorted, values, "{feature} options unsorted");

        for value in values {
            let record = vehicle("toyota", "sedan", 120.0, 0.0).with(feature.as_str(), value.as_str());
            let p = appraiser.predict_single(&record).expect("all fields");
            assert!(p.is_available(), "{feature}={value} gave no estimate");
        }
    }

    let exotic = vehicle("tesla", "roadster", 120.0, 0.0).with("fuel_type", "electric");
    let p = appraiser.predict_single(&exotic).expect("unseen values allowed");
    assert!(p.value().is_some_and(|v| v.is_finite() && v > 0.0));
}

#[test]
fn test_missing_field_is_validation_error() {
    let appraiser = engine(10);
    appraiser.train_and_score(&market()).expect("trainable");

    let mut record = Record::new();
    for (name, value) in vehicle("honda", "wagon", 100.0, 0.0).iter() {
        if name != "engine_size" {
            record.insert(name, value.clone());
        }
    }
    match appraiser.predict_single(&record) {
        Err(AppraiserError::Validation { field, .. }) => assert_eq!(field, "engine_size"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_listing_verdict_uses_margin() {
    let appraiser = engine(30);
    appraiser.train_and_score(&market()).expect("trainable");
    let record = vehicle("honda", "wagon", 100.0, 0.0);

    let fair = appraiser
        .predict_single(&record)
        .expect("all fields")
        .value()
        .expect("estimate");
    let margin = appraiser.config().listing_margin;

    let verdict = |listed: f64| {
        appraiser
            .assess_listing(&record, listed)
            .expect("valid")
            .expect("estimate")
            .verdict
    };
    assert_eq!(verdict(fair - margin - 1.0), ListingVerdict::Opportunity);
    assert_eq!(verdict(fair), ListingVerdict::Fair);
    assert_eq!(verdict(fair + margin + 1.0), ListingVerdict::Overpriced);
}

#[test]
fn test_failed_retrain_keeps_previous_model() {
    let appraiser = engine(20);
    appraiser.train_and_score(&market()).expect("trainable");
    let before = appraiser.current().expect("trained");
    let probe = vehicle("bmw", "sedan", 150.0, 0.0);
    let estimate = appraiser.predict_single(&probe).expect("all fields");

    let ds = market();
    let columns: Vec<(String, Column)> = ds
        .iter_columns()
        .map(|(name, col)| {
            let col = if name == "price" {
                Column::Numeric(Vector::from_vec(vec![f64::NAN; ds.n_rows()]))
            } else {
                col.clone()
            };
            (name.to_string(), col)
        })
        .collect();
    let nan_target = Dataset::new(columns).expect("equal lengths");
    assert!(matches!(
        appraiser.train_and_score(&nan_target),
        Err(AppraiserError::Training { .. })
    ));

    let after = appraiser.current().expect("still trained");
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(appraiser.predict_single(&probe).expect("all fields"), estimate);
}

#[test]
fn test_predictions_during_retraining_see_whole_models() {
    let ds = market();
    let appraiser = engine(20);
    appraiser.train_and_score(&ds).expect("trainable");
    let probe = vehicle("volvo", "wagon", 133.0, 0.0);
    let expected = appraiser.predict_single(&probe).expect("all fields");

    thread::scope(|s| {
        s.spawn(|| {
            for _ in 0..3 {
                appraiser.train_and_score(&ds).expect("trainable");
            }
        });
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..10 {
                    // a seeded retrain on the same data rebuilds the same model
                    assert_eq!(appraiser.predict_single(&probe).expect("all fields"), expected);
                }
            });
        }
    });
}

#[test]
fn test_correlation_matrices_symmetric_with_unit_diagonal() {
    let ds = market();
    let matrices = engine(10).correlation_matrices(&ds).expect("numeric columns");
    for m in [&matrices.pearson, &matrices.spearman, &matrices.kendall] {
        assert_eq!(m.len(), 5);
        assert!(m.is_symmetric(1e-12));
        for i in 0..m.len() {
            assert_eq!(m.get(i, i), 1.0);
            for j in 0..m.len() {
                assert!((-1.0..=1.0).contains(&m.get(i, j)));
            }
        }
    }
}

#[test]
fn test_consistency_matches_formula() {
    let ds = market();
    let appraiser = engine(10);
    let matrices = appraiser.correlation_matrices(&ds).expect("numeric columns");
    let report = appraiser.consistency_report(&ds).expect("numeric columns");

    let (p, s) = (&matrices.pearson, &matrices.spearman);
    let n = p.len();
    let column_means: Vec<f64> = (0..n)
        .map(|j| (0..n).map(|i| (p.get(i, j) - s.get(i, j)).abs()).sum::<f64>() / n as f64)
        .collect();
    let mean = column_means.iter().sum::<f64>() / n as f64;

    assert_eq!(report.consistency_pct, round_to((1.0 - mean) * 100.0, 2));
    assert_eq!(report.band, ConsistencyBand::from_percentage(report.consistency_pct));
    // the inflated listing pulls Pearson away from Spearman
    assert!(report.consistency_pct < 100.0);
}

#[test]
fn test_cramers_v_extremes() {
    let rows: Vec<Record> = (0..24)
        .map(|i| {
            let price = 5_000.0 + 1_000.0 * f64::from(i);
            let brand = ["dacia", "skoda", "audi", "porsche"][(i / 6) as usize];
            let body = ["sedan", "wagon", "hatchback"][(i % 3) as usize];
            vehicle(brand, body, 100.0, price)
        })
        .collect();
    let ds = Dataset::from_records(&rows).expect("consistent records");

    let scores = engine(10).categorical_association(&ds).expect("price present");
    let score = |name: &str| {
        scores
            .iter()
            .find(|s| s.feature == name)
            .map(|s| s.score)
            .expect("scored")
    };
    assert!(score("brand") > 0.95);
    assert!(score("body_style") < 0.1);
    // single-category columns score zero
    assert_eq!(score("fuel_type"), 0.0);
    assert_eq!(score("drivetrain"), 0.0);
}

#[test]
fn test_top_influencers_default_k() {
    let influencers = engine(10).top_influencers(&market()).expect("price present");
    assert!(influencers.positive.len() <= 3);
    assert!(influencers.negative.len() <= 3);
    assert!(influencers
        .positive
        .iter()
        .chain(&influencers.negative)
        .all(|(name, _)| name != "price"));
    assert!(influencers.negative.iter().any(|(name, _)| name == "highway_mpg"));
}

#[test]
fn test_yaml_config_drives_engine() {
    let yaml = "\
target: price
schema:
  numeric: [horsepower]
  categorical: [brand]
forest:
  n_estimators: 15
  random_state: 7
listing_margin: 500.0
";
    let config = EngineConfig::from_yaml_str(yaml).expect("valid yaml");
    let appraiser = Appraiser::new(config).expect("valid config");
    appraiser.train_and_score(&market()).expect("trainable");
    assert_eq!(appraiser.config().listing_margin, 500.0);
    assert_eq!(appraiser.category_options().expect("trained").len(), 1);
}
