//! Dataset training pipeline
//!
//! Takes an uploaded table, picks the label column, encodes every column
//! with a codebook fitted once, fits one classifier on a seeded 70/30
//! split and scores it, then predicts the whole table and annotates it.

mod config;
mod report;

pub use config::{EvaluationRequest, PipelineConfig};
pub use report::{
    EvaluationReport, ModelComparison, PipelineWarning, VerdictCounts, PREDICTION_COLUMN,
};

use crate::edibility::Verdict;
use crate::error::{LabError, Result};
use crate::evaluation::{compute_diagnostics, ClassificationMetrics, DiagnosticInputs};
use crate::preprocessing::{
    resolve_target, CategoricalEncoder, EncodedDataset, TrainTestSplit,
};
use crate::training::{ModelFamily, ModelParams, TrainEngine, TrainingConfig};
use crate::utils::Timer;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::cmp::Ordering;
use tracing::{debug, info, info_span, warn};

/// Label code whose probability drives the threshold charts
const POSITIVE_CODE: f64 = 1.0;

/// Encoded table with its split, shared by `run` and `compare`
struct PreparedData {
    target: String,
    warnings: Vec<PipelineWarning>,
    encoder: CategoricalEncoder,
    encoded: EncodedDataset,
    split: TrainTestSplit,
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_test: Array2<f64>,
    y_test: Array1<f64>,
}

/// Fits and scores classifiers on uploaded tables
#[derive(Debug, Clone, Default)]
pub struct DatasetTrainingPipeline {
    config: PipelineConfig,
}

impl DatasetTrainingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Evaluate one model family on `df`.
    pub fn run(&self, df: &DataFrame, request: &EvaluationRequest) -> Result<EvaluationReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("evaluate", run_id = %run_id, family = %request.family());
        let _guard = span.enter();
        let timer = Timer::start();

        request.params.validate()?;
        if df.get_column_names_str().contains(&PREDICTION_COLUMN) {
            return Err(LabError::InputValidation(format!(
                "column '{}' is reserved for predictions; rename it before uploading",
                PREDICTION_COLUMN
            )));
        }
        let data = self.prepare(df)?;

        let engine = self.fit(&request.params, &data)?;
        let y_pred = engine.predict(&data.x_test)?;
        let metrics = ClassificationMetrics::compute(&data.y_test, &y_pred, data.encoder.n_classes())?;

        let scores = if request.diagnostics.iter().any(|d| d.needs_scores()) {
            engine.positive_scores(&data.x_test, POSITIVE_CODE)?
        } else {
            None
        };
        let outcome = compute_diagnostics(
            &request.diagnostics,
            &DiagnosticInputs {
                y_true: &data.y_test,
                y_pred: &y_pred,
                labels: data.encoder.label_codebook().categories(),
                positive_code: POSITIVE_CODE,
                scores: scores.as_ref().map(|s| &s.values),
            },
        )?;

        let full = engine.predict(&data.encoded.x)?;
        let predictions: Vec<Verdict> = full
            .iter()
            .map(|&code| data.encoder.verdict_for(code as usize))
            .collect();
        let counts = VerdictCounts::tally(&predictions);
        let annotated = annotate(df, &predictions)?;

        info!(
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1_score,
            edible = counts.edible,
            poisonous = counts.poisonous,
            charts = outcome.charts.len(),
            notices = outcome.notices.len(),
            elapsed_ms = timer.elapsed_ms(),
            "Evaluation complete"
        );

        Ok(EvaluationReport {
            run_id,
            family: request.family(),
            params: request.params.clone(),
            target: data.target,
            n_rows: df.height(),
            train_size: data.split.train_size(),
            test_size: data.split.test_size(),
            metrics,
            predictions,
            counts,
            diagnostics: outcome.charts,
            notices: outcome.notices,
            warnings: data.warnings,
            score_source: scores.map(|s| s.source),
            training_time_secs: engine.training_time_secs(),
            annotated,
        })
    }

    /// Fit every family with default parameters on the same split and rank
    /// them by test accuracy. Families that cannot be fitted sort last.
    pub fn compare(&self, df: &DataFrame) -> Result<Vec<ModelComparison>> {
        let span = info_span!("compare");
        let _guard = span.enter();

        let data = self.prepare(df)?;
        let mut results: Vec<ModelComparison> = ModelFamily::ALL
            .iter()
            .map(|&family| {
                let params = ModelParams::default_for(family);
                let scored = self.fit(&params, &data).and_then(|engine| {
                    let y_pred = engine.predict(&data.x_test)?;
                    let metrics =
                        ClassificationMetrics::compute(&data.y_test, &y_pred, data.encoder.n_classes())?;
                    Ok((metrics, engine.training_time_secs()))
                });

                match scored {
                    Ok((metrics, secs)) => ModelComparison {
                        family,
                        metrics: Some(metrics),
                        training_time_secs: secs,
                        error: None,
                    },
                    Err(e) => {
                        warn!(%family, error = %e, "Family skipped in comparison");
                        ModelComparison {
                            family,
                            metrics: None,
                            training_time_secs: 0.0,
                            error: Some(e.to_string()),
                        }
                    }
                }
            })
            .collect();

        results.sort_by(|a, b| match (&a.metrics, &b.metrics) {
            (Some(ma), Some(mb)) => mb.accuracy.total_cmp(&ma.accuracy),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });

        Ok(results)
    }

    fn fit(&self, params: &ModelParams, data: &PreparedData) -> Result<TrainEngine> {
        let config = TrainingConfig::new(params.clone()).with_random_seed(self.config.random_seed);
        let mut engine = TrainEngine::new(config);
        engine.fit(&data.x_train, &data.y_train)?;
        Ok(engine)
    }

    /// Validate the table, resolve the target, encode and split.
    fn prepare(&self, df: &DataFrame) -> Result<PreparedData> {
        self.config.validate()?;

        if df.width() < 2 {
            return Err(LabError::InputValidation(format!(
                "table needs at least 2 columns, found {}",
                df.width()
            )));
        }
        if df.height() < self.config.min_rows {
            return Err(LabError::InputValidation(format!(
                "table needs at least {} rows, found {}",
                self.config.min_rows,
                df.height()
            )));
        }

        let resolution = resolve_target(&df.get_column_names_str())?;
        let mut warnings = Vec::new();
        if resolution.fallback_used {
            let warning = PipelineWarning::TargetFallback {
                column: resolution.column.clone(),
            };
            warn!(column = %resolution.column, "{}", warning);
            warnings.push(warning);
        }

        let (encoder, encoded) = CategoricalEncoder::fit_transform(df, &resolution.column)?;
        if encoder.n_classes() < 2 {
            return Err(LabError::InputValidation(format!(
                "target column '{}' needs at least 2 classes, found {}",
                resolution.column,
                encoder.n_classes()
            )));
        }

        let split = TrainTestSplit::new(
            encoded.n_samples(),
            self.config.test_fraction,
            self.config.random_seed,
        )?;
        let (x_train, y_train) = split.train_data(&encoded.x, &encoded.y);
        let (x_test, y_test) = split.test_data(&encoded.x, &encoded.y);

        if y_train.iter().all(|&v| v == y_train[0]) {
            return Err(LabError::InputValidation(
                "training split contains a single class; upload more varied rows".to_string(),
            ));
        }

        debug!(
            target = %resolution.column,
            features = encoded.n_features(),
            classes = encoder.n_classes(),
            train = split.train_size(),
            test = split.test_size(),
            "Prepared dataset"
        );

        Ok(PreparedData {
            target: resolution.column,
            warnings,
            encoder,
            encoded,
            split,
            x_train,
            y_train,
            x_test,
            y_test,
        })
    }
}

/// Copy of `df` with one verdict label per row in [`PREDICTION_COLUMN`]
fn annotate(df: &DataFrame, predictions: &[Verdict]) -> Result<DataFrame> {
    let labels: Vec<&str> = predictions.iter().map(|v| v.as_str()).collect();
    let mut annotated = df.clone();
    annotated.with_column(Series::new(PREDICTION_COLUMN.into(), labels))?;
    Ok(annotated)
}
