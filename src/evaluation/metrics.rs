//! Scalar classification metrics and the confusion matrix

use crate::error::{LabError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// How precision/recall/F1 were aggregated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Averaging {
    /// Two classes; scores of the label with code 1
    Binary,
    /// Unweighted mean over every class
    Macro,
}

/// Test-split metrics, rounded to two decimals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub averaging: Averaging,
    /// Number of samples scored
    pub n_samples: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl Counts {
    fn for_label(y_true: &Array1<f64>, y_pred: &Array1<f64>, label: f64) -> Self {
        let mut counts = Counts::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == label, p == label) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (true, false) => counts.fn_ += 1,
                (false, false) => {}
            }
        }
        counts
    }

    /// (precision, recall, f1); an empty denominator scores 0
    fn scores(&self) -> (f64, f64, f64) {
        let precision = ratio(self.tp, self.tp + self.fp);
        let recall = ratio(self.tp, self.tp + self.fn_);
        (precision, recall, f1(precision, recall))
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Harmonic mean of precision and recall, 0 when both are 0
pub fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

impl ClassificationMetrics {
    /// Compute metrics for label codes `0..n_classes`.
    ///
    /// With exactly two classes precision, recall and F1 describe code 1;
    /// otherwise they are macro-averaged over every code.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>, n_classes: usize) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(LabError::Shape {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(LabError::InputValidation(
                "cannot score an empty test split".to_string(),
            ));
        }

        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| t == p)
            .count();
        let accuracy = correct as f64 / y_true.len() as f64;

        let (averaging, (precision, recall, f1_score)) = if n_classes == 2 {
            (Averaging::Binary, Counts::for_label(y_true, y_pred, 1.0).scores())
        } else {
            let per_class: Vec<(f64, f64, f64)> = (0..n_classes)
                .map(|code| Counts::for_label(y_true, y_pred, code as f64).scores())
                .collect();
            let n = per_class.len().max(1) as f64;
            let sum = per_class
                .iter()
                .fold((0.0, 0.0, 0.0), |acc, s| (acc.0 + s.0, acc.1 + s.1, acc.2 + s.2));
            (Averaging::Macro, (sum.0 / n, sum.1 / n, sum.2 / n))
        };

        Ok(Self {
            accuracy: round2(accuracy),
            precision: round2(precision),
            recall: round2(recall),
            f1_score: round2(f1_score),
            averaging,
            n_samples: y_true.len(),
        })
    }
}

/// Counts of actual (rows) against predicted (columns) labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub labels: Vec<String>,
    pub matrix: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Build from label codes; `labels[code]` names each code.
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>, labels: &[String]) -> Result<Self> {
        let k = labels.len();
        let mut matrix = vec![vec![0usize; k]; k];

        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            let (ti, pi) = (t as usize, p as usize);
            if t < 0.0 || p < 0.0 || ti >= k || pi >= k {
                return Err(LabError::InvalidInput(format!(
                    "label code out of range: actual {}, predicted {} ({} labels)",
                    t, p, k
                )));
            }
            matrix[ti][pi] += 1;
        }

        Ok(Self {
            labels: labels.to_vec(),
            matrix,
        })
    }

    pub fn total(&self) -> usize {
        self.matrix.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.matrix.len()).map(|i| self.matrix[i][i]).sum()
    }
}
