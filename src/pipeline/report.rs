//! Evaluation results

use crate::edibility::Verdict;
use crate::error::Result;
use crate::evaluation::{ClassificationMetrics, DiagnosticChart, MetricNotice};
use crate::training::{ModelFamily, ModelParams, ScoreSource};
use polars::prelude::*;
use serde::Serialize;
use std::fmt;

/// Name of the column appended to the uploaded table
pub const PREDICTION_COLUMN: &str = "Prediction";

/// Non-fatal conditions raised while preparing a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    /// No recognized label column; the last column was used
    TargetFallback { column: String },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::TargetFallback { column } => write!(
                f,
                "no 'type' or 'class' column found, using last column '{}' as the target",
                column
            ),
        }
    }
}

/// Verdict tallies over the full table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerdictCounts {
    pub edible: usize,
    pub poisonous: usize,
}

impl VerdictCounts {
    pub fn tally<'a>(verdicts: impl IntoIterator<Item = &'a Verdict>) -> Self {
        verdicts
            .into_iter()
            .fold(Self::default(), |mut counts, verdict| {
                match verdict {
                    Verdict::Edible => counts.edible += 1,
                    Verdict::Poisonous => counts.poisonous += 1,
                }
                counts
            })
    }

    pub fn total(&self) -> usize {
        self.edible + self.poisonous
    }
}

/// Outcome of one [`DatasetTrainingPipeline::run`](super::DatasetTrainingPipeline::run)
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub run_id: String,
    pub family: ModelFamily,
    pub params: ModelParams,
    /// Label column the model was trained on
    pub target: String,
    pub n_rows: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub metrics: ClassificationMetrics,
    /// Per-row verdicts for the full table, in row order
    pub predictions: Vec<Verdict>,
    pub counts: VerdictCounts,
    pub diagnostics: Vec<DiagnosticChart>,
    pub notices: Vec<MetricNotice>,
    pub warnings: Vec<PipelineWarning>,
    /// Where ranking scores came from, when any diagnostic needed them
    pub score_source: Option<ScoreSource>,
    pub training_time_secs: f64,
    /// Uploaded table plus the [`PREDICTION_COLUMN`]
    #[serde(skip)]
    pub annotated: DataFrame,
}

impl EvaluationReport {
    /// Annotated table rendered as CSV
    pub fn annotated_csv(&self) -> Result<String> {
        let mut df = self.annotated.clone();
        let mut buf = Vec::new();
        CsvWriter::new(&mut buf).finish(&mut df)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// One row of a family comparison
#[derive(Debug, Clone, Serialize)]
pub struct ModelComparison {
    pub family: ModelFamily,
    /// Test-split metrics; `None` when the family could not be fitted
    pub metrics: Option<ClassificationMetrics>,
    pub training_time_secs: f64,
    pub error: Option<String>,
}
