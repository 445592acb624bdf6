//! End-to-end training, persistence and scoring

use fraud_detection_pipeline::config::TrainingConfig;
use fraud_detection_pipeline::models::loader;
use fraud_detection_pipeline::synthetic::{self, SyntheticConfig};
use fraud_detection_pipeline::training::{self, cross_validate};
use fraud_detection_pipeline::{dataset, scoring, FraudError, FraudModel, Table, Value};
use tempfile::tempdir;

/// `n` rows with `positives` fraud rows spread evenly; fraud has larger amounts.
fn labelled_table(n: usize, positives: usize) -> Table {
    let step = n / positives.max(1);
    let rows = (0..n)
        .map(|i| {
            let fraud = positives > 0 && i % step == 0 && i / step < positives;
            let amount = if fraud { 400.0 + (i % 50) as f64 } else { (i % 120) as f64 };
            let category = match i % 3 {
                0 => "Low",
                1 => "Medium",
                _ => "High",
            };
            vec![
                Value::Number(i as f64),
                Value::Number(amount),
                category.into(),
                Value::Number(if fraud { 1.0 } else { 0.0 }),
            ]
        })
        .collect();
    Table::from_rows(
        vec![
            "Time".into(),
            "Amount".into(),
            "AmountCategory".into(),
            "Class".into(),
        ],
        rows,
    )
    .unwrap()
}

fn trained_model(table: &Table) -> FraudModel {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.bin");
    training::train_cv(table, "Class", &TrainingConfig::default(), &path).unwrap();
    FraudModel::load(&path).unwrap()
}

#[test]
fn test_two_positives_cannot_be_stratified() {
    let table = labelled_table(100, 2);
    assert_eq!(
        table.labels("Class").unwrap().iter().filter(|&&y| y == 1).count(),
        2
    );

    let dir = tempdir().unwrap();
    let path = dir.path().join("model.bin");
    let err = training::train_cv(&table, "Class", &TrainingConfig::default(), &path).unwrap_err();

    assert!(matches!(
        err,
        FraudError::InsufficientClassRepresentation {
            class: 1,
            count: 2,
            folds: 5
        }
    ));
    assert!(!path.exists());
}

#[test]
fn test_synthetic_dataset_trains_and_evaluates() {
    let table = synthetic::generate_transactions(&SyntheticConfig::default()).unwrap();
    let dir = tempdir().unwrap();
    let path = dir.path().join("artifacts/model.bin");

    let outcome = training::train_cv(&table, "Class", &TrainingConfig::default(), &path).unwrap();
    let mean = outcome.report.mean;
    for metric in [mean.pr_auc, mean.roc_auc, mean.f1] {
        assert!((0.0..=1.0).contains(&metric), "metric = {}", metric);
    }

    let schema = outcome.pipeline.schema();
    assert_eq!(schema.categorical(), ["AmountCategory"]);
    assert!(!schema.numeric().iter().any(|c| c == "Class"));

    let evaluation = training::evaluate(&table, "Class", &path).unwrap();
    assert!((0.0..=1.0).contains(&evaluation.roc_auc));
    assert!((0.0..=1.0).contains(&evaluation.pr_auc));
    assert_eq!(evaluation.report.weighted_avg.support, 5000);
}

#[test]
fn test_persisted_pipeline_scores_identically() {
    let table = labelled_table(200, 40);
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.bin");

    let outcome = training::train_cv(&table, "Class", &TrainingConfig::default(), &path).unwrap();
    let reloaded = loader::load(&path).unwrap();

    let before = outcome.pipeline.predict_proba(&table).unwrap();
    let after = reloaded.predict_proba(&table).unwrap();
    let before_bits: Vec<u64> = before.iter().map(|p| p.to_bits()).collect();
    let after_bits: Vec<u64> = after.iter().map(|p| p.to_bits()).collect();
    assert_eq!(before_bits, after_bits);
}

#[test]
fn test_cross_validation_is_deterministic() {
    let table = labelled_table(200, 40);
    let first = cross_validate(&table, "Class", &TrainingConfig::default()).unwrap();
    let second = cross_validate(&table, "Class", &TrainingConfig::default()).unwrap();

    assert_eq!(first.fold_indices, second.fold_indices);
    assert_eq!(first.folds, second.folds);
    assert_eq!(first.mean, second.mean);
}

#[test]
fn test_unseen_category_scores_without_error() {
    let model = trained_model(&labelled_table(200, 40));
    let upload = Table::from_rows(
        vec!["Time".into(), "Amount".into(), "AmountCategory".into()],
        vec![
            vec![Value::Number(1.0), Value::Number(20.0), "Unheard".into()],
            vec![Value::Number(2.0), Value::Number(450.0), "Low".into()],
        ],
    )
    .unwrap();

    let probabilities = model.predict_proba(&upload).unwrap();
    assert_eq!(probabilities.len(), 2);
    assert!(probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
}

#[test]
fn test_identical_rows_get_identical_predictions() {
    let model = trained_model(&labelled_table(200, 40));
    let row = vec![Value::Number(5.0), Value::Number(75.0), "Medium".into()];
    let upload = Table::from_rows(
        vec!["Time".into(), "Amount".into(), "AmountCategory".into()],
        vec![row; 20],
    )
    .unwrap();

    let prediction = model.predict_flag(&upload, 0.5).unwrap();
    assert_eq!(prediction.len(), 20);
    assert!(prediction.probabilities.iter().all(|p| p.to_bits() == prediction.probabilities[0].to_bits()));
    assert!(prediction.flags.iter().all(|&f| f == prediction.flags[0]));
}

#[test]
fn test_threshold_extremes() {
    let table = labelled_table(200, 40);
    let model = trained_model(&table);

    let all = model.predict_flag(&table, 0.0).unwrap();
    assert!(all.flags.iter().all(|&f| f == 1));

    let none = model.predict_flag(&table, 1.0).unwrap();
    for (&flag, &p) in none.flags.iter().zip(&none.probabilities) {
        assert_eq!(flag, u8::from(p == 1.0));
    }

    // Out-of-range thresholds are accepted as-is.
    assert!(model.predict_flag(&table, -0.5).unwrap().flags.iter().all(|&f| f == 1));
    assert_eq!(model.predict_flag(&table, 1.5).unwrap().flagged(), 0);
}

#[test]
fn test_score_whitespace_upload_and_write() {
    let model = trained_model(&labelled_table(200, 40));
    let dir = tempdir().unwrap();
    let upload = dir.path().join("upload.txt");
    std::fs::write(
        &upload,
        "Time Amount AmountCategory\n1 12.5 Low\n2 480 High\n",
    )
    .unwrap();

    let table = scoring::read_upload(&upload).unwrap();
    let scored = scoring::score_table(&model, table, 0.5).unwrap();
    let output = dir.path().join("out/predictions.csv");
    dataset::save_csv(&scored, &output).unwrap();

    let written = dataset::load_dataset(&output).unwrap();
    assert_eq!(
        written.columns(),
        ["Time", "Amount", "AmountCategory", scoring::PROBA_COLUMN, scoring::FLAG_COLUMN]
    );
    assert_eq!(written.len(), 2);
}

#[test]
fn test_scoring_without_artifact_is_not_found() {
    let dir = tempdir().unwrap();
    match FraudModel::load(dir.path().join("model.bin")) {
        Err(err) => assert!(err.is_not_found()),
        Ok(_) => panic!("expected a missing artifact"),
    }
}
