//! Optional diagnostic charts for a fitted model's test split

use super::curves::{
    f1_threshold_curve, precision_recall_curve, recall_threshold_curve, roc_curve,
    PrecisionRecallCurve, RocCurve, ThresholdCurve,
};
use super::metrics::ConfusionMatrix;
use crate::error::{LabError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// A chart the caller can opt into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Diagnostic {
    ConfusionMatrix,
    RocCurve,
    PrecisionRecallCurve,
    RecallThreshold,
    F1Threshold,
}

impl Diagnostic {
    pub const ALL: [Diagnostic; 5] = [
        Diagnostic::ConfusionMatrix,
        Diagnostic::RocCurve,
        Diagnostic::PrecisionRecallCurve,
        Diagnostic::RecallThreshold,
        Diagnostic::F1Threshold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnostic::ConfusionMatrix => "confusion_matrix",
            Diagnostic::RocCurve => "roc_curve",
            Diagnostic::PrecisionRecallCurve => "precision_recall_curve",
            Diagnostic::RecallThreshold => "recall_threshold",
            Diagnostic::F1Threshold => "f1_threshold",
        }
    }

    /// Whether the chart ranks rows by a score
    pub fn needs_scores(&self) -> bool {
        !matches!(self, Diagnostic::ConfusionMatrix)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Diagnostic {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "confusion_matrix" | "confusion" | "cm" => Ok(Diagnostic::ConfusionMatrix),
            "roc_curve" | "roc" | "auc" => Ok(Diagnostic::RocCurve),
            "precision_recall_curve" | "precision_recall" | "pr" => {
                Ok(Diagnostic::PrecisionRecallCurve)
            }
            "recall_threshold" | "recall" => Ok(Diagnostic::RecallThreshold),
            "f1_threshold" | "f1" => Ok(Diagnostic::F1Threshold),
            other => Err(LabError::InvalidInput(format!("unknown diagnostic '{}'", other))),
        }
    }
}

/// A computed chart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticChart {
    ConfusionMatrix(ConfusionMatrix),
    RocCurve(RocCurve),
    PrecisionRecallCurve(PrecisionRecallCurve),
    RecallThreshold(ThresholdCurve),
    F1Threshold(ThresholdCurve),
}

impl DiagnosticChart {
    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            DiagnosticChart::ConfusionMatrix(_) => Diagnostic::ConfusionMatrix,
            DiagnosticChart::RocCurve(_) => Diagnostic::RocCurve,
            DiagnosticChart::PrecisionRecallCurve(_) => Diagnostic::PrecisionRecallCurve,
            DiagnosticChart::RecallThreshold(_) => Diagnostic::RecallThreshold,
            DiagnosticChart::F1Threshold(_) => Diagnostic::F1Threshold,
        }
    }
}

/// Why a requested chart was left out of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricNotice {
    pub diagnostic: Diagnostic,
    pub reason: String,
}

/// Everything the diagnostics step needs from one evaluated test split
pub struct DiagnosticInputs<'a> {
    pub y_true: &'a Array1<f64>,
    pub y_pred: &'a Array1<f64>,
    /// Names of label codes `0..n`
    pub labels: &'a [String],
    /// Code treated as the positive label for ranking charts
    pub positive_code: f64,
    /// Ranking score for `positive_code`, if the model has one
    pub scores: Option<&'a Array1<f64>>,
}

/// Charts that were produced and notices for the ones that were skipped
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticsOutcome {
    pub charts: Vec<DiagnosticChart>,
    pub notices: Vec<MetricNotice>,
}

/// Compute each requested chart once, in request order. Charts that
/// cannot be computed become notices instead of failing the run.
pub fn compute_diagnostics(
    requested: &[Diagnostic],
    inputs: &DiagnosticInputs<'_>,
) -> Result<DiagnosticsOutcome> {
    let mut outcome = DiagnosticsOutcome::default();
    let positive: Vec<bool> = inputs
        .y_true
        .iter()
        .map(|&y| y == inputs.positive_code)
        .collect();

    let mut seen = Vec::with_capacity(requested.len());
    for &diagnostic in requested {
        if seen.contains(&diagnostic) {
            continue;
        }
        seen.push(diagnostic);

        match compute_one(diagnostic, inputs, &positive) {
            Ok(chart) => outcome.charts.push(chart),
            Err(LabError::UnsupportedMetric { reason, .. }) => {
                warn!(%diagnostic, %reason, "Diagnostic omitted");
                outcome.notices.push(MetricNotice { diagnostic, reason });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(outcome)
}

fn compute_one(
    diagnostic: Diagnostic,
    inputs: &DiagnosticInputs<'_>,
    positive: &[bool],
) -> Result<DiagnosticChart> {
    let chart = match diagnostic {
        Diagnostic::ConfusionMatrix => DiagnosticChart::ConfusionMatrix(ConfusionMatrix::compute(
            inputs.y_true,
            inputs.y_pred,
            inputs.labels,
        )?),
        Diagnostic::RocCurve => {
            DiagnosticChart::RocCurve(roc_curve(positive, ranking_scores(diagnostic, inputs)?)?)
        }
        Diagnostic::PrecisionRecallCurve => DiagnosticChart::PrecisionRecallCurve(
            precision_recall_curve(positive, ranking_scores(diagnostic, inputs)?)?,
        ),
        Diagnostic::RecallThreshold => DiagnosticChart::RecallThreshold(recall_threshold_curve(
            positive,
            ranking_scores(diagnostic, inputs)?,
        )?),
        Diagnostic::F1Threshold => DiagnosticChart::F1Threshold(f1_threshold_curve(
            positive,
            ranking_scores(diagnostic, inputs)?,
        )?),
    };
    Ok(chart)
}

/// Scores for a threshold chart; only binary labels with a score qualify
fn ranking_scores<'a>(
    diagnostic: Diagnostic,
    inputs: &DiagnosticInputs<'a>,
) -> Result<&'a Array1<f64>> {
    if inputs.labels.len() != 2 {
        return Err(LabError::UnsupportedMetric {
            diagnostic: diagnostic.to_string(),
            reason: format!(
                "threshold charts need a binary label, found {} classes",
                inputs.labels.len()
            ),
        });
    }
    inputs.scores.ok_or_else(|| LabError::UnsupportedMetric {
        diagnostic: diagnostic.to_string(),
        reason: "model exposes neither probabilities nor decision scores".to_string(),
    })
}
