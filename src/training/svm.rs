//! Support Vector Machine classifier
//!
//! SMO (Sequential Minimal Optimization) on a precomputed kernel matrix,
//! one-vs-rest for more than two classes, optional Platt-scaled
//! probabilities.

use super::decision_tree::{argmax_classes, check_width, unique_classes};
use crate::calibration::{Calibrator, PlattScaling};
use crate::error::{LabError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Maximum number of samples for eager kernel matrix computation.
/// Beyond this, training returns an error to prevent OOM.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Kernel function type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelType {
    /// K(x, y) = x . y
    Linear,
    /// K(x, y) = exp(-gamma * ||x - y||^2)
    Rbf,
}

/// How the RBF width is derived from the training data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gamma {
    /// 1 / (n_features * var(X))
    Scale,
    /// 1 / n_features
    Auto,
}

/// SVM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMConfig {
    /// Regularization parameter (C)
    pub c: f64,
    pub kernel: KernelType,
    pub gamma: Gamma,
    /// Fit a Platt calibrator so probabilities are available
    pub probability: bool,
    pub tol: f64,
    /// Maximum number of full passes over the data
    pub max_iter: usize,
    pub random_state: Option<u64>,
}

impl Default for SVMConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: KernelType::Rbf,
            gamma: Gamma::Scale,
            probability: true,
            tol: 1e-3,
            max_iter: 1000,
            random_state: Some(42),
        }
    }
}

/// A single binary SVM (positive label vs the rest)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinarySVM {
    support_vectors: Array2<f64>,
    /// alpha_i * y_i per support vector
    dual_coef: Array1<f64>,
    bias: f64,
    calibrator: Option<PlattScaling>,
}

/// Support Vector Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SVMClassifier {
    config: SVMConfig,
    gamma: f64,
    classes: Vec<f64>,
    /// One machine for two classes (scores favour `classes[1]`), otherwise
    /// one per class
    machines: Vec<BinarySVM>,
    n_features: usize,
}

impl SVMClassifier {
    pub fn new(config: SVMConfig) -> Self {
        Self {
            config,
            gamma: 1.0,
            classes: Vec::new(),
            machines: Vec::new(),
            n_features: 0,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(LabError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        if x.nrows() > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(LabError::InvalidInput(format!(
                "Dataset has {} samples, exceeding the maximum {} for the SVM kernel matrix",
                x.nrows(),
                MAX_KERNEL_MATRIX_SAMPLES
            )));
        }

        let classes = unique_classes(y);
        if classes.len() < 2 {
            return Err(LabError::InvalidInput(
                "SVM requires at least 2 distinct classes".to_string(),
            ));
        }

        self.n_features = x.ncols();
        self.gamma = self.resolve_gamma(x);
        self.classes = classes;

        let kernel_matrix = self.compute_kernel_matrix(x);

        let positives: Vec<f64> = if self.classes.len() == 2 {
            vec![self.classes[1]]
        } else {
            self.classes.clone()
        };

        self.machines = positives
            .iter()
            .map(|&cls| {
                let y_binary = y.mapv(|v| if v == cls { 1.0 } else { -1.0 });
                self.train_binary(x, &y_binary, &kernel_matrix)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(())
    }

    fn resolve_gamma(&self, x: &Array2<f64>) -> f64 {
        let n_features = x.ncols().max(1) as f64;
        match self.config.gamma {
            Gamma::Auto => 1.0 / n_features,
            Gamma::Scale => {
                let n = x.len() as f64;
                let mean = x.sum() / n;
                let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                if var > 0.0 {
                    1.0 / (n_features * var)
                } else {
                    1.0
                }
            }
        }
    }

    fn train_binary(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        kernel_matrix: &Array2<f64>,
    ) -> Result<BinarySVM> {
        let (alphas, bias) = self.smo_train(y, kernel_matrix);

        let support: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();

        let mut machine = BinarySVM {
            support_vectors: x.select(Axis(0), &support),
            dual_coef: support.iter().map(|&i| alphas[i] * y[i]).collect(),
            bias,
            calibrator: None,
        };

        if self.config.probability {
            let scores: Array1<f64> = (0..x.nrows())
                .map(|i| {
                    support
                        .iter()
                        .map(|&s| alphas[s] * y[s] * kernel_matrix[[s, i]])
                        .sum::<f64>()
                        + bias
                })
                .collect();
            let labels = y.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 });
            let mut calibrator = PlattScaling::new();
            calibrator.fit(&scores, &labels)?;
            machine.calibrator = Some(calibrator);
        }

        Ok(machine)
    }

    /// SMO with an error cache; returns (alphas, bias).
    fn smo_train(&self, y: &Array1<f64>, k: &Array2<f64>) -> (Array1<f64>, f64) {
        let n = y.len();
        let c = self.config.c;
        let tol = self.config.tol;

        let mut alphas = Array1::<f64>::zeros(n);
        let mut bias = 0.0;
        // f(x_i) - y_i with all alphas at zero
        let mut errors: Array1<f64> = y.mapv(|v| -v);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state.unwrap_or(42));

        let max_passes = 5;
        let mut passes = 0;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.config.max_iter && n > 1 {
            let mut num_changed = 0;

            for i in 0..n {
                let e_i = errors[i];
                if !((y[i] * e_i < -tol && alphas[i] < c) || (y[i] * e_i > tol && alphas[i] > 0.0)) {
                    continue;
                }

                let j = loop {
                    let j = rng.gen_range(0..n);
                    if j != i {
                        break j;
                    }
                };
                let e_j = errors[j];

                let alpha_i_old = alphas[i];
                let alpha_j_old = alphas[j];

                let (l, h) = if y[i] != y[j] {
                    ((alpha_j_old - alpha_i_old).max(0.0), (c + alpha_j_old - alpha_i_old).min(c))
                } else {
                    ((alpha_i_old + alpha_j_old - c).max(0.0), (alpha_i_old + alpha_j_old).min(c))
                };
                if (l - h).abs() < 1e-10 {
                    continue;
                }

                let eta = 2.0 * k[[i, j]] - k[[i, i]] - k[[j, j]];
                if eta >= 0.0 {
                    continue;
                }

                let alpha_j = (alpha_j_old - y[j] * (e_i - e_j) / eta).clamp(l, h);
                if (alpha_j - alpha_j_old).abs() < 1e-5 {
                    continue;
                }
                let alpha_i = alpha_i_old + y[i] * y[j] * (alpha_j_old - alpha_j);

                let d_i = y[i] * (alpha_i - alpha_i_old);
                let d_j = y[j] * (alpha_j - alpha_j_old);

                let b1 = bias - e_i - d_i * k[[i, i]] - d_j * k[[i, j]];
                let b2 = bias - e_j - d_i * k[[i, j]] - d_j * k[[j, j]];
                let new_bias = if alpha_i > 0.0 && alpha_i < c {
                    b1
                } else if alpha_j > 0.0 && alpha_j < c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                let d_b = new_bias - bias;
                for m in 0..n {
                    errors[m] += d_i * k[[i, m]] + d_j * k[[j, m]] + d_b;
                }

                alphas[i] = alpha_i;
                alphas[j] = alpha_j;
                bias = new_bias;
                num_changed += 1;
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        (alphas, bias)
    }

    fn kernel(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self.config.kernel {
            KernelType::Linear => a.dot(&b),
            KernelType::Rbf => {
                let sq: f64 = a.iter().zip(b.iter()).map(|(p, q)| (p - q) * (p - q)).sum();
                (-self.gamma * sq).exp()
            }
        }
    }

    /// Gram matrix, rows computed in parallel
    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let rows: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| (0..n).map(|j| self.kernel(x.row(i), x.row(j))).collect())
            .collect();

        let mut k = Array2::zeros((n, n));
        for (i, row) in rows.into_iter().enumerate() {
            for (j, val) in row.into_iter().enumerate() {
                k[[i, j]] = val;
            }
        }
        k
    }

    fn machine_scores(&self, machine: &BinarySVM, x: &Array2<f64>) -> Array1<f64> {
        let scores: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                machine
                    .support_vectors
                    .rows()
                    .into_iter()
                    .zip(machine.dual_coef.iter())
                    .map(|(sv, &coef)| coef * self.kernel(sv, x.row(i)))
                    .sum::<f64>()
                    + machine.bias
            })
            .collect();
        Array1::from_vec(scores)
    }

    /// Raw decision values, one column per class. With two classes the
    /// columns are `[-f, f]` where `f > 0` favours `classes[1]`.
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.machines.is_empty() {
            return Err(LabError::ModelNotFitted);
        }
        check_width(x, self.n_features)?;

        let mut out = Array2::zeros((x.nrows(), self.classes.len()));
        if self.classes.len() == 2 {
            let f = self.machine_scores(&self.machines[0], x);
            out.column_mut(0).assign(&f.mapv(|v| -v));
            out.column_mut(1).assign(&f);
        } else {
            for (c, machine) in self.machines.iter().enumerate() {
                out.column_mut(c).assign(&self.machine_scores(machine, x));
            }
        }
        Ok(out)
    }

    /// Platt-scaled probabilities; only when `probability` was enabled at fit time.
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.config.probability {
            return Err(LabError::Training(
                "probability estimates are disabled for this SVM".to_string(),
            ));
        }
        let scores = self.decision_function(x)?;

        let mut proba = Array2::zeros(scores.raw_dim());
        if self.classes.len() == 2 {
            let p = self.calibrated(&self.machines[0], &scores.column(1).to_owned())?;
            proba.column_mut(0).assign(&p.mapv(|v| 1.0 - v));
            proba.column_mut(1).assign(&p);
        } else {
            for (c, machine) in self.machines.iter().enumerate() {
                let p = self.calibrated(machine, &scores.column(c).to_owned())?;
                proba.column_mut(c).assign(&p);
            }
            for mut row in proba.rows_mut() {
                let total = row.sum();
                if total > 0.0 {
                    row /= total;
                } else {
                    row.fill(1.0 / self.classes.len() as f64);
                }
            }
        }
        Ok(proba)
    }

    fn calibrated(&self, machine: &BinarySVM, scores: &Array1<f64>) -> Result<Array1<f64>> {
        machine
            .calibrator
            .as_ref()
            .ok_or(LabError::ModelNotFitted)?
            .calibrate(scores)
    }

    /// Class with the highest decision value
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let scores = self.decision_function(x)?;
        Ok(argmax_classes(&scores, &self.classes))
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn has_probability(&self) -> bool {
        self.config.probability
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn n_support_vectors(&self) -> usize {
        self.machines.iter().map(|m| m.support_vectors.nrows()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [4.0, 4.0],
            [4.0, 5.0],
            [5.0, 4.0],
            [5.0, 5.0],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_linear_svm_separates() {
        let (x, y) = separable();
        let mut svm = SVMClassifier::new(SVMConfig {
            kernel: KernelType::Linear,
            probability: false,
            ..Default::default()
        });
        svm.fit(&x, &y).unwrap();

        assert_eq!(svm.predict(&x).unwrap(), y);
        assert!(svm.n_support_vectors() > 0);
        assert!(svm.predict_proba(&x).is_err());

        let scores = svm.decision_function(&x).unwrap();
        assert!(scores[[7, 1]] > 0.0);
        assert!(scores[[0, 1]] < 0.0);
    }

    #[test]
    fn test_rbf_probabilities() {
        let (x, y) = separable();
        let mut svm = SVMClassifier::new(SVMConfig::default());
        svm.fit(&x, &y).unwrap();

        let proba = svm.predict_proba(&x).unwrap();
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
        assert!(proba[[7, 1]] > proba[[0, 1]]);
    }

    #[test]
    fn test_gamma_settings() {
        let x = array![[0.0, 2.0], [2.0, 0.0]];
        let y = array![0.0, 1.0];

        let mut auto = SVMClassifier::new(SVMConfig {
            gamma: Gamma::Auto,
            probability: false,
            ..Default::default()
        });
        auto.fit(&x, &y).unwrap();
        assert_eq!(auto.gamma(), 0.5);

        let mut scale = SVMClassifier::new(SVMConfig {
            probability: false,
            ..Default::default()
        });
        scale.fit(&x, &y).unwrap();
        // var of {0, 2, 2, 0} is 1
        assert!((scale.gamma() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_multiclass_ovr() {
        let x = array![[0.0], [0.2], [5.0], [5.2], [10.0], [10.2]];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
        let mut svm = SVMClassifier::new(SVMConfig {
            kernel: KernelType::Rbf,
            gamma: Gamma::Auto,
            c: 10.0,
            ..Default::default()
        });
        svm.fit(&x, &y).unwrap();

        assert_eq!(svm.decision_function(&x).unwrap().ncols(), 3);
        assert_eq!(svm.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[0.0], [1.0]];
        let y = array![1.0, 1.0];
        let mut svm = SVMClassifier::new(SVMConfig::default());
        assert!(svm.fit(&x, &y).is_err());
    }
}
