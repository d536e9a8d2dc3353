//! Integration tests for the dataset training pipeline

use mushroom_lab::evaluation::{Diagnostic, DiagnosticChart};
use mushroom_lab::pipeline::{
    DatasetTrainingPipeline, EvaluationReport, EvaluationRequest, PipelineConfig,
    PipelineWarning, PREDICTION_COLUMN,
};
use mushroom_lab::training::{Gamma, KernelType, ModelFamily, ModelParams, ScoreSource};
use mushroom_lab::utils::DataLoader;
use mushroom_lab::LabError;
use polars::prelude::*;
use std::io::Write;

/// 20 rows, 10 edible and 10 poisonous, with two informative columns
fn mushrooms(target: &str) -> DataFrame {
    df!(
        "odor" => &["a", "p", "l", "f", "n", "p", "a", "f", "l", "y",
                    "n", "c", "a", "p", "l", "s", "n", "f", "a", "m"],
        "gill-color" => &["k", "n", "b", "w", "k", "n", "b", "w", "k", "n",
                          "b", "w", "k", "n", "b", "w", "p", "h", "u", "g"],
        target => &["e", "p", "e", "p", "e", "p", "e", "p", "e", "p",
                    "e", "p", "e", "p", "e", "p", "e", "p", "e", "p"]
    )
    .unwrap()
}

fn pipeline() -> DatasetTrainingPipeline {
    DatasetTrainingPipeline::new(PipelineConfig::default().with_random_seed(0).with_min_rows(10))
}

fn prediction_values(df: &DataFrame) -> Vec<String> {
    df.column(PREDICTION_COLUMN)
        .unwrap()
        .as_materialized_series()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect()
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn test_every_family_round_trips() {
    let df = mushrooms("class");

    for family in ModelFamily::ALL {
        let request = EvaluationRequest::new(ModelParams::default_for(family));
        let report = pipeline().run(&df, &request).unwrap();

        assert_eq!(report.family, family);
        assert_eq!(report.target, "class");
        assert_eq!(report.train_size, 14);
        assert_eq!(report.test_size, 6);
        for value in [
            report.metrics.accuracy,
            report.metrics.precision,
            report.metrics.recall,
            report.metrics.f1_score,
        ] {
            assert!((0.0..=1.0).contains(&value), "{}: {}", family, value);
        }

        assert_eq!(report.predictions.len(), df.height());
        assert_eq!(report.annotated.height(), df.height());
        assert_eq!(report.annotated.width(), df.width() + 1);
        let values = prediction_values(&report.annotated);
        assert!(values.iter().all(|v| v == "Edible" || v == "Poisonous"), "{}", family);
        assert_eq!(report.counts.total(), df.height());
    }
}

#[test]
fn test_runs_are_reproducible() {
    let df = mushrooms("class");
    let request = EvaluationRequest::new(ModelParams::default_for(ModelFamily::RandomForest));

    let first = pipeline().run(&df, &request).unwrap();
    let second = pipeline().run(&df, &request).unwrap();
    assert_eq!(first.metrics, second.metrics);
    assert_eq!(first.predictions, second.predictions);
    assert_ne!(first.run_id, second.run_id);
}

// ============================================================================
// Target resolution
// ============================================================================

#[test]
fn test_target_fallback_warns_exactly_once() {
    let df = mushrooms("edible?");
    let request = EvaluationRequest::new(ModelParams::GaussianNaiveBayes);
    let report = pipeline().run(&df, &request).unwrap();

    assert_eq!(report.target, "edible?");
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(
        report.warnings[0],
        PipelineWarning::TargetFallback {
            column: "edible?".to_string()
        }
    );
}

#[test]
fn test_recognized_target_has_no_warning() {
    let df = mushrooms("type");
    let report = pipeline()
        .run(&df, &EvaluationRequest::new(ModelParams::GaussianNaiveBayes))
        .unwrap();
    assert_eq!(report.target, "type");
    assert!(report.warnings.is_empty());
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_diagnostics_are_opt_in() {
    let df = mushrooms("class");
    let plain = pipeline()
        .run(&df, &EvaluationRequest::new(ModelParams::GaussianNaiveBayes))
        .unwrap();
    assert!(plain.diagnostics.is_empty());
    assert!(plain.notices.is_empty());
    assert!(plain.score_source.is_none());
}

/// Seed 1 holds out both labels from the 20-row table
fn mixed_split_pipeline() -> DatasetTrainingPipeline {
    DatasetTrainingPipeline::new(PipelineConfig::default().with_random_seed(1).with_min_rows(10))
}

fn check_charts(report: &EvaluationReport) {
    for chart in &report.diagnostics {
        match chart {
            DiagnosticChart::ConfusionMatrix(cm) => {
                assert_eq!(cm.labels, vec!["e", "p"]);
                assert_eq!(cm.total(), report.test_size);
            }
            DiagnosticChart::RocCurve(roc) => {
                assert_eq!((roc.fpr[0], roc.tpr[0]), (0.0, 0.0));
                assert_eq!(roc.fpr.last(), Some(&1.0));
                assert_eq!(roc.tpr.last(), Some(&1.0));
                assert!((0.0..=1.0).contains(&roc.auc));
            }
            DiagnosticChart::PrecisionRecallCurve(pr) => {
                assert_eq!(pr.precision.last(), Some(&1.0));
                assert_eq!(pr.recall.last(), Some(&0.0));
                assert_eq!(pr.precision.len(), pr.thresholds.len() + 1);
            }
            DiagnosticChart::RecallThreshold(c) | DiagnosticChart::F1Threshold(c) => {
                assert!(!c.thresholds.is_empty());
                assert_eq!(c.values.len(), c.thresholds.len());
            }
        }
    }
}

#[test]
fn test_every_family_draws_all_diagnostics() {
    let df = mushrooms("class");

    for family in ModelFamily::ALL {
        let request = EvaluationRequest::new(ModelParams::default_for(family))
            .with_diagnostics(Diagnostic::ALL);
        let report = mixed_split_pipeline().run(&df, &request).unwrap();

        assert!(report.notices.is_empty(), "{}: {:?}", family, report.notices);
        assert_eq!(report.diagnostics.len(), Diagnostic::ALL.len(), "{}", family);
        assert_eq!(report.score_source, Some(ScoreSource::Probability), "{}", family);
        check_charts(&report);
    }
}

#[test]
fn test_svm_without_probability_ranks_by_decision_function() {
    let df = mushrooms("class");
    let request = EvaluationRequest::new(ModelParams::Svm {
        c: 1.0,
        kernel: KernelType::Rbf,
        gamma: Gamma::Scale,
        probability: false,
    })
    .with_diagnostics(Diagnostic::ALL);
    let report = mixed_split_pipeline().run(&df, &request).unwrap();

    assert!(report.notices.is_empty(), "{:?}", report.notices);
    assert_eq!(report.diagnostics.len(), Diagnostic::ALL.len());
    assert_eq!(report.score_source, Some(ScoreSource::DecisionFunction));
    check_charts(&report);
}

#[test]
fn test_one_class_test_split_yields_notices() {
    // seed 0 holds out only edible rows
    let df = mushrooms("class");
    let request = EvaluationRequest::new(ModelParams::GaussianNaiveBayes)
        .with_diagnostics([Diagnostic::ConfusionMatrix, Diagnostic::RocCurve]);
    let report = pipeline().run(&df, &request).unwrap();

    assert_eq!(report.diagnostics.len(), 1);
    assert_eq!(report.notices.len(), 1);
    assert_eq!(report.notices[0].diagnostic, Diagnostic::RocCurve);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_out_of_range_parameters_rejected() {
    let df = mushrooms("class");
    let request = EvaluationRequest::new(ModelParams::RandomForest {
        n_estimators: 10,
        max_depth: 5,
        bootstrap: true,
    });
    let err = pipeline().run(&df, &request).unwrap_err();
    assert!(matches!(err, LabError::InvalidParameter { .. }));
}

#[test]
fn test_single_column_table_rejected() {
    let df = df!("class" => &["e", "p", "e", "p", "e", "p", "e", "p", "e", "p"]).unwrap();
    let err = pipeline().run(&df, &EvaluationRequest::default()).unwrap_err();
    assert!(matches!(err, LabError::InputValidation(_)));
}

#[test]
fn test_prediction_column_name_is_reserved() {
    let mut df = mushrooms("class");
    let original: Vec<&str> = vec!["keep"; df.height()];
    df.with_column(Series::new(PREDICTION_COLUMN.into(), original))
        .unwrap();

    let err = pipeline().run(&df, &EvaluationRequest::default()).unwrap_err();
    assert!(matches!(err, LabError::InputValidation(_)));
}

#[test]
fn test_compare_over_loaded_csv() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "odor,gill-color,class").unwrap();
    let df = mushrooms("class");
    let odor = df.column("odor").unwrap().as_materialized_series().str().unwrap().clone();
    let gill = df.column("gill-color").unwrap().as_materialized_series().str().unwrap().clone();
    let class = df.column("class").unwrap().as_materialized_series().str().unwrap().clone();
    for i in 0..df.height() {
        writeln!(
            file,
            "{},{},{}",
            odor.get(i).unwrap(),
            gill.get(i).unwrap(),
            class.get(i).unwrap()
        )
        .unwrap();
    }
    file.flush().unwrap();

    let loaded = DataLoader::new().load_csv(file.path()).unwrap();
    let results = pipeline().compare(&loaded).unwrap();

    assert_eq!(results.len(), ModelFamily::ALL.len());
    assert!(results[0].metrics.is_some());
}
