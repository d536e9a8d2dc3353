//! Gaussian Naive Bayes classifier

use super::decision_tree::{argmax_classes, check_width, class_position, unique_classes};
use crate::error::{LabError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Gaussian Naive Bayes Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Per-class feature means, indexed like `classes`
    means: Vec<Vec<f64>>,
    /// Per-class feature variances (smoothed)
    variances: Vec<Vec<f64>>,
    priors: Vec<f64>,
    classes: Vec<f64>,
    /// Fraction of the largest feature variance added to every variance
    var_smoothing: f64,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            means: Vec::new(),
            variances: Vec::new(),
            priors: Vec::new(),
            classes: Vec::new(),
            var_smoothing: 1e-9,
        }
    }

    pub fn with_var_smoothing(mut self, smoothing: f64) -> Self {
        self.var_smoothing = smoothing;
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(LabError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(LabError::Training("cannot fit on zero samples".to_string()));
        }

        self.classes = unique_classes(y);
        let n_classes = self.classes.len();

        let max_var = x
            .var_axis(Axis(0), 0.0)
            .iter()
            .copied()
            .fold(0.0f64, f64::max);
        let epsilon = if max_var > 0.0 {
            self.var_smoothing * max_var
        } else {
            self.var_smoothing
        };

        // Single-pass Welford's algorithm per class
        let mut counts = vec![0usize; n_classes];
        let mut means = vec![vec![0.0; n_features]; n_classes];
        let mut m2 = vec![vec![0.0; n_features]; n_classes];

        for (row, &label) in x.rows().into_iter().zip(y.iter()) {
            let c = class_position(&self.classes, label)?;
            counts[c] += 1;
            let n = counts[c] as f64;
            for (j, &val) in row.iter().enumerate() {
                let delta = val - means[c][j];
                means[c][j] += delta / n;
                let delta2 = val - means[c][j];
                m2[c][j] += delta * delta2;
            }
        }

        self.variances = m2
            .iter()
            .zip(&counts)
            .map(|(m2_c, &n)| m2_c.iter().map(|&v| v / n as f64 + epsilon).collect())
            .collect();
        self.means = means;
        self.priors = counts
            .iter()
            .map(|&n| n as f64 / n_samples as f64)
            .collect();

        Ok(())
    }

    /// Normalized log posteriors (log-sum-exp)
    pub fn predict_log_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.classes.is_empty() {
            return Err(LabError::ModelNotFitted);
        }
        check_width(x, self.means[0].len())?;

        let mut log_probs = Array2::zeros((x.nrows(), self.classes.len()));
        for (i, row) in x.rows().into_iter().enumerate() {
            for c in 0..self.classes.len() {
                let log_likelihood: f64 = row
                    .iter()
                    .zip(&self.means[c])
                    .zip(&self.variances[c])
                    .map(|((&xi, &mean), &var)| {
                        -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln())
                    })
                    .sum();
                log_probs[[i, c]] = self.priors[c].ln() + log_likelihood;
            }
        }

        for mut row in log_probs.rows_mut() {
            let max_val = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let log_sum = row.iter().map(|&v| (v - max_val).exp()).sum::<f64>().ln();
            row.mapv_inplace(|v| v - max_val - log_sum);
        }

        Ok(log_probs)
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(self.predict_log_proba(x)?.mapv(f64::exp))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let log_probs = self.predict_log_proba(x)?;
        Ok(argmax_classes(&log_probs, &self.classes))
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn class_priors(&self) -> &[f64] {
        &self.priors
    }
}
