//! Linear model implementations

use super::decision_tree::{argmax_classes, check_width, unique_classes};
use crate::error::{LabError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// L2-regularized logistic regression, one-vs-rest for more than two classes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum gradient-descent iterations
    pub max_iter: usize,
    /// Convergence tolerance on the gradient norm
    pub tol: f64,
    /// One weight vector per fitted binary problem (standardized space)
    coefficients: Vec<Array1<f64>>,
    intercepts: Vec<f64>,
    feature_means: Option<Array1<f64>>,
    feature_scales: Option<Array1<f64>>,
    classes: Vec<f64>,
    n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tol: 1e-4,
            coefficients: Vec::new(),
            intercepts: Vec::new(),
            feature_means: None,
            feature_scales: None,
            classes: Vec::new(),
            n_iter: 0,
        }
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    fn standardize(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let means = self.feature_means.as_ref().ok_or(LabError::ModelNotFitted)?;
        let scales = self.feature_scales.as_ref().ok_or(LabError::ModelNotFitted)?;
        check_width(x, means.len())?;
        Ok((x - means) / scales)
    }

    /// Fit using full-batch gradient descent on standardized features.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(LabError::Shape {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.c <= 0.0 {
            return Err(LabError::InvalidParameter {
                name: "C".to_string(),
                value: self.c.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let classes = unique_classes(y);
        if classes.len() < 2 {
            return Err(LabError::InvalidInput(
                "logistic regression requires at least 2 distinct classes".to_string(),
            ));
        }

        let means = x.mean_axis(Axis(0)).ok_or_else(|| {
            LabError::Training("cannot fit logistic regression on zero samples".to_string())
        })?;
        let scales = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > 1e-12 { s } else { 1.0 });
        self.feature_means = Some(means);
        self.feature_scales = Some(scales);
        self.classes = classes;

        let xs = self.standardize(x)?;

        // Objective: mean log-loss + alpha/2 * ||w||^2 with alpha = 1/(C*n)
        let alpha = 1.0 / (self.c * n_samples as f64);
        let lr = (1.0 / (0.25 * n_features.max(1) as f64 + alpha)).min(1.0);

        let positives: Vec<f64> = if self.classes.len() == 2 {
            vec![self.classes[1]]
        } else {
            self.classes.clone()
        };

        self.coefficients.clear();
        self.intercepts.clear();
        self.n_iter = 0;

        for cls in positives {
            let target = y.mapv(|v| if v == cls { 1.0 } else { 0.0 });
            let mut weights = Array1::zeros(n_features);
            let mut bias = 0.0;
            let mut iters = 0;

            for _ in 0..self.max_iter {
                iters += 1;
                let linear = xs.dot(&weights) + bias;
                let errors = Self::sigmoid(&linear) - &target;

                let dw = (xs.t().dot(&errors) / n_samples as f64) + (alpha * &weights);
                let db = errors.mean().unwrap_or(0.0);

                let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
                if grad_norm < self.tol {
                    break;
                }

                weights = weights - lr * dw;
                bias -= lr * db;
            }

            self.n_iter = self.n_iter.max(iters);
            self.coefficients.push(weights);
            self.intercepts.push(bias);
        }

        Ok(self)
    }

    /// Raw linear scores, one column per fitted binary problem
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.coefficients.is_empty() {
            return Err(LabError::ModelNotFitted);
        }
        let xs = self.standardize(x)?;
        let mut out = Array2::zeros((x.nrows(), self.coefficients.len()));
        for (k, (w, b)) in self.coefficients.iter().zip(&self.intercepts).enumerate() {
            out.column_mut(k).assign(&(xs.dot(w) + *b));
        }
        Ok(out)
    }

    /// Class probabilities, one column per entry of [`Self::classes`].
    /// One-vs-rest scores are normalized to sum to one.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let scores = self.decision_function(x)?;
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));

        if self.classes.len() == 2 {
            let p = Self::sigmoid(&scores.column(0).to_owned());
            proba.column_mut(0).assign(&p.mapv(|v| 1.0 - v));
            proba.column_mut(1).assign(&p);
        } else {
            for k in 0..self.classes.len() {
                proba
                    .column_mut(k)
                    .assign(&Self::sigmoid(&scores.column(k).to_owned()));
            }
            for mut row in proba.rows_mut() {
                let total = row.sum();
                if total > 0.0 {
                    row /= total;
                }
            }
        }

        Ok(proba)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(argmax_classes(&proba, &self.classes))
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    /// Iterations used by the slowest binary problem
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let y_pred = self.predict(x)?;
        let correct = y_pred.iter().zip(y.iter()).filter(|(p, a)| p == a).count();
        Ok(correct as f64 / y.len().max(1) as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_logistic_regression_binary() {
        let x = array![
            [1.0, 2.0],
            [2.0, 1.0],
            [1.5, 1.5],
            [6.0, 7.0],
            [7.0, 6.0],
            [6.5, 6.5],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut model = LogisticRegression::new().with_max_iter(200);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.score(&x, &y).unwrap(), 1.0);
        let proba = model.predict_proba(&x).unwrap();
        assert!(proba[[5, 1]] > 0.5);
        assert!(proba[[0, 1]] < 0.5);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_logistic_regression_multiclass() {
        let x = array![[0.0], [0.5], [5.0], [5.5], [10.0], [10.5]];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];

        let mut model = LogisticRegression::new().with_c(10.0).with_max_iter(500);
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert_eq!(proba.ncols(), 3);
        let preds = model.predict(&x).unwrap();
        assert_eq!(preds[0], 0.0);
        assert_eq!(preds[5], 2.0);
    }

    #[test]
    fn test_constant_feature_is_harmless() {
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 1.0, 0.0, 1.0];
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();
        assert!(model.predict_proba(&x).unwrap().iter().all(|p| p.is_finite()));
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_invalid_c() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0, 1.0];
        let mut model = LogisticRegression::new().with_c(0.0);
        assert!(matches!(
            model.fit(&x, &y),
            Err(LabError::InvalidParameter { .. })
        ));
    }
}
