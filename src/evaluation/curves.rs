//! Threshold-sweep curves over ranking scores
//!
//! Inputs are per-row scores for the positive label and a boolean mask of
//! which rows are actually positive. Thresholds are the distinct score
//! values; a row is predicted positive when `score >= threshold`.

use super::metrics::f1;
use crate::error::{LabError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Receiver operating characteristic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocCurve {
    /// False positive rate, non-decreasing from 0 to 1
    pub fpr: Vec<f64>,
    /// True positive rate, non-decreasing from 0 to 1
    pub tpr: Vec<f64>,
    /// Decreasing thresholds; the first one is above every score
    pub thresholds: Vec<f64>,
    pub auc: f64,
}

/// Precision and recall per threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrecisionRecallCurve {
    /// One more entry than `thresholds`; the last is 1
    pub precision: Vec<f64>,
    /// One more entry than `thresholds`; the last is 0
    pub recall: Vec<f64>,
    /// Increasing thresholds
    pub thresholds: Vec<f64>,
}

/// A single metric plotted against the decision threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdCurve {
    pub metric: String,
    pub thresholds: Vec<f64>,
    pub values: Vec<f64>,
}

/// Cumulative counts at each distinct threshold, highest threshold first
struct Sweep {
    thresholds: Vec<f64>,
    tps: Vec<usize>,
    fps: Vec<usize>,
    n_pos: usize,
    n_neg: usize,
}

fn sweep(diagnostic: &str, positive: &[bool], scores: &Array1<f64>) -> Result<Sweep> {
    if positive.len() != scores.len() {
        return Err(LabError::Shape {
            expected: format!("{} scores", positive.len()),
            actual: format!("{} scores", scores.len()),
        });
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(LabError::UnsupportedMetric {
            diagnostic: diagnostic.to_string(),
            reason: "scores contain non-finite values".to_string(),
        });
    }

    let n_pos = positive.iter().filter(|&&p| p).count();
    let n_neg = positive.len() - n_pos;

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut thresholds = Vec::new();
    let mut tps = Vec::new();
    let mut fps = Vec::new();
    let (mut tp, mut fp) = (0usize, 0usize);

    for (pos, &i) in order.iter().enumerate() {
        if positive[i] {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_run = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_run {
            thresholds.push(scores[i]);
            tps.push(tp);
            fps.push(fp);
        }
    }

    Ok(Sweep {
        thresholds,
        tps,
        fps,
        n_pos,
        n_neg,
    })
}

fn unsupported(diagnostic: &str, reason: &str) -> LabError {
    LabError::UnsupportedMetric {
        diagnostic: diagnostic.to_string(),
        reason: reason.to_string(),
    }
}

/// ROC curve and its area. Needs at least one positive and one negative.
pub fn roc_curve(positive: &[bool], scores: &Array1<f64>) -> Result<RocCurve> {
    let s = sweep("roc_curve", positive, scores)?;
    if s.n_pos == 0 {
        return Err(unsupported("roc_curve", "test split has no positive samples"));
    }
    if s.n_neg == 0 {
        return Err(unsupported("roc_curve", "test split has no negative samples"));
    }

    let top = s.thresholds.first().copied().unwrap_or(0.0) + 1.0;
    let mut thresholds = vec![top];
    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];

    for ((&t, &tp), &fp) in s.thresholds.iter().zip(&s.tps).zip(&s.fps) {
        thresholds.push(t);
        tpr.push(tp as f64 / s.n_pos as f64);
        fpr.push(fp as f64 / s.n_neg as f64);
    }

    let auc = auc(&fpr, &tpr)?;
    Ok(RocCurve {
        fpr,
        tpr,
        thresholds,
        auc,
    })
}

/// Area under a curve by the trapezoidal rule. `x` must be monotonic.
pub fn auc(x: &[f64], y: &[f64]) -> Result<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(LabError::InvalidInput(format!(
            "auc needs at least 2 points of equal length, got {} and {}",
            x.len(),
            y.len()
        )));
    }

    let increasing = x.windows(2).all(|w| w[1] >= w[0]);
    let decreasing = x.windows(2).all(|w| w[1] <= w[0]);
    if !increasing && !decreasing {
        return Err(LabError::InvalidInput(
            "auc x coordinates are not monotonic".to_string(),
        ));
    }

    let area: f64 = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xw, yw)| (xw[1] - xw[0]) * (yw[0] + yw[1]) / 2.0)
        .sum();
    Ok(area.abs())
}

/// Precision-recall pairs for thresholds down to the first one reaching
/// full recall. Needs at least one positive.
pub fn precision_recall_curve(positive: &[bool], scores: &Array1<f64>) -> Result<PrecisionRecallCurve> {
    pr_curve("precision_recall_curve", positive, scores)
}

fn pr_curve(diagnostic: &str, positive: &[bool], scores: &Array1<f64>) -> Result<PrecisionRecallCurve> {
    let s = sweep(diagnostic, positive, scores)?;
    if s.n_pos == 0 {
        return Err(unsupported(diagnostic, "test split has no positive samples"));
    }

    let last = s.tps.iter().position(|&tp| tp == s.n_pos).unwrap_or(s.tps.len() - 1);

    let mut precision: Vec<f64> = (0..=last)
        .rev()
        .map(|i| s.tps[i] as f64 / (s.tps[i] + s.fps[i]) as f64)
        .collect();
    let mut recall: Vec<f64> = (0..=last)
        .rev()
        .map(|i| s.tps[i] as f64 / s.n_pos as f64)
        .collect();
    let thresholds: Vec<f64> = (0..=last).rev().map(|i| s.thresholds[i]).collect();

    precision.push(1.0);
    recall.push(0.0);

    Ok(PrecisionRecallCurve {
        precision,
        recall,
        thresholds,
    })
}

/// Recall at each precision-recall threshold
pub fn recall_threshold_curve(positive: &[bool], scores: &Array1<f64>) -> Result<ThresholdCurve> {
    let pr = pr_curve("recall_threshold", positive, scores)?;
    let values = pr.recall[..pr.thresholds.len()].to_vec();
    Ok(ThresholdCurve {
        metric: "recall".to_string(),
        thresholds: pr.thresholds,
        values,
    })
}

/// F1 at each precision-recall threshold
pub fn f1_threshold_curve(positive: &[bool], scores: &Array1<f64>) -> Result<ThresholdCurve> {
    let pr = pr_curve("f1_threshold", positive, scores)?;
    let values = pr
        .precision
        .iter()
        .zip(&pr.recall)
        .take(pr.thresholds.len())
        .map(|(&p, &r)| f1(p, r))
        .collect();
    Ok(ThresholdCurve {
        metric: "f1".to_string(),
        thresholds: pr.thresholds,
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_roc_perfect_ranking() {
        let positive = [false, false, true, true];
        let scores = array![0.1, 0.2, 0.8, 0.9];
        let roc = roc_curve(&positive, &scores).unwrap();

        assert_eq!((roc.fpr[0], roc.tpr[0]), (0.0, 0.0));
        assert_eq!((*roc.fpr.last().unwrap(), *roc.tpr.last().unwrap()), (1.0, 1.0));
        assert!((roc.auc - 1.0).abs() < 1e-12);
        assert!(roc.thresholds[0] > 0.9);
    }

    #[test]
    fn test_roc_known_auc() {
        // sklearn.metrics.roc_auc_score([0, 0, 1, 1], [0.1, 0.4, 0.35, 0.8]) == 0.75
        let positive = [false, false, true, true];
        let scores = array![0.1, 0.4, 0.35, 0.8];
        let roc = roc_curve(&positive, &scores).unwrap();
        assert!((roc.auc - 0.75).abs() < 1e-12);
        assert!(roc.fpr.windows(2).all(|w| w[1] >= w[0]));
        assert!(roc.tpr.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_roc_tied_scores_collapse() {
        let positive = [false, true, false, true];
        let scores = array![0.5, 0.5, 0.5, 0.5];
        let roc = roc_curve(&positive, &scores).unwrap();
        assert_eq!(roc.fpr, vec![0.0, 1.0]);
        assert!((roc.auc - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_roc_single_class_is_unsupported() {
        let scores = array![0.2, 0.7];
        assert!(matches!(
            roc_curve(&[true, true], &scores),
            Err(LabError::UnsupportedMetric { .. })
        ));
        assert!(matches!(
            roc_curve(&[false, false], &scores),
            Err(LabError::UnsupportedMetric { .. })
        ));
    }

    #[test]
    fn test_precision_recall_curve() {
        // sklearn.metrics.precision_recall_curve([0, 0, 1, 1], [0.1, 0.4, 0.35, 0.8])
        let positive = [false, false, true, true];
        let scores = array![0.1, 0.4, 0.35, 0.8];
        let pr = precision_recall_curve(&positive, &scores).unwrap();

        assert_eq!(pr.thresholds, vec![0.35, 0.4, 0.8]);
        assert_eq!(pr.recall, vec![1.0, 0.5, 0.5, 0.0]);
        let expected = [2.0 / 3.0, 0.5, 1.0, 1.0];
        for (p, e) in pr.precision.iter().zip(expected) {
            assert!((p - e).abs() < 1e-12);
        }
    }

    #[test]
    fn test_threshold_curves_align_with_pr() {
        let positive = [false, false, true, true];
        let scores = array![0.1, 0.4, 0.35, 0.8];

        let recall = recall_threshold_curve(&positive, &scores).unwrap();
        assert_eq!(recall.values, vec![1.0, 0.5, 0.5]);

        let f1_curve = f1_threshold_curve(&positive, &scores).unwrap();
        assert_eq!(f1_curve.thresholds.len(), f1_curve.values.len());
        assert!((f1_curve.values[0] - 0.8).abs() < 1e-12);
        assert!((f1_curve.values[2] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_auc_rejects_non_monotonic() {
        assert!(auc(&[0.0, 1.0, 0.5], &[0.0, 1.0, 1.0]).is_err());
        assert!((auc(&[0.0, 1.0], &[1.0, 1.0]).unwrap() - 1.0).abs() < 1e-12);
    }
}
