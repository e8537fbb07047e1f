use crate::alerts::{AlertEvaluator, AlertStatus};
use crate::align::{align, align_strict, AlignedTable};
use crate::config::{AnalysisConfig, ModelKind};
use crate::errors::BasisHedgeError;
use crate::features::{FeatureDataset, FeatureRegistry};
use crate::hedge::HedgeSimulator;
use crate::metrics::MetricsEngine;
use crate::pipeline::PredictivePipeline;
use crate::tests::mock_data::{daily_series, day, price_path};

#[test]
fn concrete_three_day_scenario() {
    let spot_values = [10.0, 11.0, 9.0];
    let futures_values = [12.0, 12.0, 13.0];
    let aligned = align(
        &daily_series("spot", &spot_values),
        &daily_series("futures", &futures_values),
    );
    let table = HedgeSimulator.apply(MetricsEngine::new(2).compute(&aligned));

    assert_eq!(table.basis, vec![-2.0, -1.0, -4.0]);

    let pnl = table.hedged_pnl.clone().unwrap();
    assert_eq!(pnl[0], 0.0);
    for t in 1..pnl.len() {
        let expected = (futures_values[t] - futures_values[t - 1]) - (spot_values[t] - spot_values[t - 1]);
        assert_eq!(pnl[t] - pnl[t - 1], expected);
    }
    assert_eq!(pnl, vec![0.0, -1.0, 2.0]);
}

#[test]
fn empty_input_scenario() {
    let spot = daily_series("spot", &[10.0, 11.0]);
    let futures = crate::data::TimeSeries::from_pairs("futures", vec![(day(30), 12.0), (day(31), 13.0)]).unwrap();

    let aligned = align(&spot, &futures);
    assert!(aligned.is_empty());

    let derived = MetricsEngine::default().compute(&aligned);
    assert!(derived.is_empty());
    assert!(derived.volatility.is_empty());
    let hedged = HedgeSimulator.apply(derived);
    assert_eq!(hedged.hedged_pnl.as_deref(), Some(&[][..]));

    let err = AlertEvaluator::default().evaluate(&hedged.basis).unwrap_err();
    assert!(matches!(err, BasisHedgeError::EmptySeries(_)));

    assert!(matches!(
        align_strict(&spot, &futures),
        Err(BasisHedgeError::MisalignedInput(_))
    ));
}

#[test]
fn basis_is_exact_difference_on_every_row() {
    let spot = price_path(60, 70.0, 0.0);
    let futures = price_path(60, 71.3, 2.0);
    let aligned = align(&daily_series("s", &spot), &daily_series("f", &futures));
    let derived = MetricsEngine::default().compute(&aligned);
    for t in 0..derived.len() {
        assert_eq!(derived.basis[t], derived.spot[t] - derived.futures[t]);
    }
}

#[test]
fn rolling_columns_have_exact_missing_prefix() {
    let window = 30;
    let long = AlignedTable::from_columns(
        (0..45).map(day).collect(),
        price_path(45, 50.0, 0.0),
        price_path(45, 51.0, 3.0),
    )
    .unwrap();
    let derived = MetricsEngine::new(window).compute(&long);
    for t in 0..derived.len() {
        let defined = t + 1 >= window;
        assert_eq!(derived.volatility[t].is_some(), defined, "volatility row {}", t);
        assert_eq!(derived.correlation[t].is_some(), defined, "correlation row {}", t);
    }

    let short = AlignedTable::from_columns(
        (0..10).map(day).collect(),
        price_path(10, 50.0, 0.0),
        price_path(10, 51.0, 3.0),
    )
    .unwrap();
    let derived = MetricsEngine::new(window).compute(&short);
    assert!(derived.volatility.iter().all(Option::is_none));
    assert!(derived.correlation.iter().all(Option::is_none));
}

#[test]
fn alert_threshold_cases() {
    let evaluator = AlertEvaluator::new(2.0);

    let high = evaluator.evaluate(&[0.3, 1.1, 2.5]).unwrap();
    assert_eq!(high.status, AlertStatus::ExceedsThreshold);
    assert_eq!(high.value, 2.5);

    let low = evaluator.evaluate(&[3.0, 1.0]).unwrap();
    assert_eq!(low.status, AlertStatus::WithinRange);
    assert_eq!(low.value, 1.0);
}

#[test]
fn hundred_samples_split_eighty_twenty_in_date_order() {
    // 101 rows give 100 samples once the final row loses its target
    let n = 101;
    let mut aligned = AlignedTable::from_columns(
        (0..n as u64).map(day).collect(),
        price_path(n, 60.0, 0.0),
        price_path(n, 61.0, 1.0),
    )
    .unwrap();
    aligned.max_temp = Some(price_path(n, 15.0, 5.0));
    let derived = MetricsEngine::default().compute(&aligned);
    let dataset = FeatureDataset::build(&derived, &FeatureRegistry::basis_model_features());
    assert_eq!(dataset.len(), 100);

    let config = AnalysisConfig {
        model: ModelKind::Linear,
        ..AnalysisConfig::default()
    };
    let outcome = PredictivePipeline::new(config).fit_and_score(&dataset).unwrap();

    assert_eq!(outcome.train_len, 80);
    assert_eq!(outcome.test_len(), 20);
    let last_train = dataset.dates(0..80).into_iter().max().unwrap();
    assert!(outcome.test_dates.iter().all(|d| *d > last_train));
    assert!(outcome.test_dates.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn forest_predictions_are_reproducible_for_a_seed() {
    let n = 80;
    let mut aligned = AlignedTable::from_columns(
        (0..n as u64).map(day).collect(),
        price_path(n, 60.0, 0.0),
        price_path(n, 61.0, 1.0),
    )
    .unwrap();
    aligned.max_temp = Some(price_path(n, 15.0, 5.0));
    let derived = MetricsEngine::default().compute(&aligned);
    let dataset = FeatureDataset::build(&derived, &FeatureRegistry::basis_model_features());

    let config = AnalysisConfig {
        forest: crate::config::ForestConfig {
            n_trees: 10,
            ..Default::default()
        },
        ..AnalysisConfig::default()
    };
    let first = PredictivePipeline::new(config.clone()).fit_and_score(&dataset).unwrap();
    let second = PredictivePipeline::new(config).fit_and_score(&dataset).unwrap();
    assert_eq!(first.predicted, second.predicted);
    assert_eq!(first.mse, second.mse);
}

#[test]
fn too_few_samples_is_insufficient_data() {
    let aligned = AlignedTable::from_columns(
        vec![day(0), day(1)],
        vec![10.0, 11.0],
        vec![12.0, 12.5],
    )
    .unwrap();
    let derived = MetricsEngine::default().compute(&aligned);
    let weather = daily_series("MaxTemp", &[20.0, 21.0]);
    let err = PredictivePipeline::new(AnalysisConfig::default())
        .run(&derived, &weather)
        .unwrap_err();
    assert!(matches!(err, BasisHedgeError::InsufficientData { actual: 1, .. }));
}
