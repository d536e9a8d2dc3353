//! Classifier families and their hyperparameters

use super::svm::{Gamma, KernelType};
use crate::error::{LabError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported classifier families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    LogisticRegression,
    RandomForest,
    Svm,
    DecisionTree,
    Knn,
    GaussianNaiveBayes,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 6] = [
        ModelFamily::LogisticRegression,
        ModelFamily::RandomForest,
        ModelFamily::Svm,
        ModelFamily::DecisionTree,
        ModelFamily::Knn,
        ModelFamily::GaussianNaiveBayes,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelFamily::LogisticRegression => "Logistic Regression",
            ModelFamily::RandomForest => "Random Forest",
            ModelFamily::Svm => "Support Vector Machine",
            ModelFamily::DecisionTree => "Decision Tree",
            ModelFamily::Knn => "K-Nearest Neighbors",
            ModelFamily::GaussianNaiveBayes => "Gaussian Naive Bayes",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::LogisticRegression => "logistic_regression",
            ModelFamily::RandomForest => "random_forest",
            ModelFamily::Svm => "svm",
            ModelFamily::DecisionTree => "decision_tree",
            ModelFamily::Knn => "knn",
            ModelFamily::GaussianNaiveBayes => "gaussian_naive_bayes",
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ModelFamily {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "lr" | "logistic" | "logistic_regression" => Ok(ModelFamily::LogisticRegression),
            "rf" | "forest" | "random_forest" => Ok(ModelFamily::RandomForest),
            "svm" | "svc" | "support_vector_machine" => Ok(ModelFamily::Svm),
            "dt" | "tree" | "decision_tree" => Ok(ModelFamily::DecisionTree),
            "knn" | "k_nearest_neighbors" => Ok(ModelFamily::Knn),
            "nb" | "gnb" | "naive_bayes" | "gaussian_nb" | "gaussian_naive_bayes" => {
                Ok(ModelFamily::GaussianNaiveBayes)
            }
            other => Err(LabError::InvalidInput(format!(
                "unknown model family '{}' (expected one of: lr, rf, svm, dt, knn, gnb)",
                other
            ))),
        }
    }
}

fn default_c() -> f64 {
    1.0
}
fn default_lr_max_iter() -> usize {
    100
}
fn default_n_estimators() -> usize {
    100
}
fn default_forest_depth() -> usize {
    10
}
fn default_tree_depth() -> usize {
    5
}
fn default_true() -> bool {
    true
}
fn default_kernel() -> KernelType {
    KernelType::Rbf
}
fn default_gamma() -> Gamma {
    Gamma::Scale
}
fn default_neighbors() -> usize {
    5
}

/// Hyperparameters for one family. Deserializes from a tagged object such
/// as `{"family": "random_forest", "n_estimators": 200}`; omitted fields
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelParams {
    LogisticRegression {
        #[serde(default = "default_c")]
        c: f64,
        #[serde(default = "default_lr_max_iter")]
        max_iter: usize,
    },
    RandomForest {
        #[serde(default = "default_n_estimators")]
        n_estimators: usize,
        #[serde(default = "default_forest_depth")]
        max_depth: usize,
        #[serde(default = "default_true")]
        bootstrap: bool,
    },
    Svm {
        #[serde(default = "default_c")]
        c: f64,
        #[serde(default = "default_kernel")]
        kernel: KernelType,
        #[serde(default = "default_gamma")]
        gamma: Gamma,
        #[serde(default = "default_true")]
        probability: bool,
    },
    DecisionTree {
        #[serde(default = "default_tree_depth")]
        max_depth: usize,
    },
    Knn {
        #[serde(default = "default_neighbors")]
        n_neighbors: usize,
    },
    GaussianNaiveBayes,
}

impl ModelParams {
    /// Defaults for a family
    pub fn default_for(family: ModelFamily) -> Self {
        match family {
            ModelFamily::LogisticRegression => ModelParams::LogisticRegression {
                c: default_c(),
                max_iter: default_lr_max_iter(),
            },
            ModelFamily::RandomForest => ModelParams::RandomForest {
                n_estimators: default_n_estimators(),
                max_depth: default_forest_depth(),
                bootstrap: true,
            },
            ModelFamily::Svm => ModelParams::Svm {
                c: default_c(),
                kernel: default_kernel(),
                gamma: default_gamma(),
                probability: true,
            },
            ModelFamily::DecisionTree => ModelParams::DecisionTree {
                max_depth: default_tree_depth(),
            },
            ModelFamily::Knn => ModelParams::Knn {
                n_neighbors: default_neighbors(),
            },
            ModelFamily::GaussianNaiveBayes => ModelParams::GaussianNaiveBayes,
        }
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            ModelParams::LogisticRegression { .. } => ModelFamily::LogisticRegression,
            ModelParams::RandomForest { .. } => ModelFamily::RandomForest,
            ModelParams::Svm { .. } => ModelFamily::Svm,
            ModelParams::DecisionTree { .. } => ModelFamily::DecisionTree,
            ModelParams::Knn { .. } => ModelFamily::Knn,
            ModelParams::GaussianNaiveBayes => ModelFamily::GaussianNaiveBayes,
        }
    }

    /// Check every parameter against its allowed range.
    pub fn validate(&self) -> Result<()> {
        match *self {
            ModelParams::LogisticRegression { c, max_iter } => {
                check_float("C", c, 0.01, 10.0)?;
                check_int("max_iter", max_iter, 100, 500)
            }
            ModelParams::RandomForest {
                n_estimators,
                max_depth,
                ..
            } => {
                check_int("n_estimators", n_estimators, 100, 5000)?;
                check_int("max_depth", max_depth, 1, 20)
            }
            ModelParams::Svm { c, .. } => check_float("C", c, 0.1, 10.0),
            ModelParams::DecisionTree { max_depth } => check_int("max_depth", max_depth, 1, 20),
            ModelParams::Knn { n_neighbors } => check_int("n_neighbors", n_neighbors, 1, 20),
            ModelParams::GaussianNaiveBayes => Ok(()),
        }
    }
}

fn check_float(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(LabError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: format!("must be in [{}, {}]", min, max),
        })
    }
}

fn check_int(name: &str, value: usize, min: usize, max: usize) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(LabError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: format!("must be in [{}, {}]", min, max),
        })
    }
}

/// Training configuration for one fit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub params: ModelParams,
    /// Seed for every randomized family (forest bootstraps, SMO pair selection)
    pub random_seed: u64,
}

impl TrainingConfig {
    pub fn new(params: ModelParams) -> Self {
        Self {
            params,
            random_seed: 0,
        }
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn family(&self) -> ModelFamily {
        self.params.family()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parsing() {
        assert_eq!("LR".parse::<ModelFamily>().unwrap(), ModelFamily::LogisticRegression);
        assert_eq!("random-forest".parse::<ModelFamily>().unwrap(), ModelFamily::RandomForest);
        assert_eq!("gnb".parse::<ModelFamily>().unwrap(), ModelFamily::GaussianNaiveBayes);
        assert!("xgboost".parse::<ModelFamily>().is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        for family in ModelFamily::ALL {
            let params = ModelParams::default_for(family);
            assert_eq!(params.family(), family);
            params.validate().unwrap();
        }
    }

    #[test]
    fn test_range_validation() {
        let bad = [
            ModelParams::LogisticRegression { c: 0.001, max_iter: 100 },
            ModelParams::LogisticRegression { c: 1.0, max_iter: 501 },
            ModelParams::RandomForest { n_estimators: 99, max_depth: 5, bootstrap: true },
            ModelParams::RandomForest { n_estimators: 100, max_depth: 21, bootstrap: true },
            ModelParams::Svm { c: 0.05, kernel: KernelType::Rbf, gamma: Gamma::Scale, probability: true },
            ModelParams::DecisionTree { max_depth: 0 },
            ModelParams::Knn { n_neighbors: 21 },
        ];
        for params in bad {
            assert!(
                matches!(params.validate(), Err(LabError::InvalidParameter { .. })),
                "{:?} should be rejected",
                params
            );
        }

        ModelParams::LogisticRegression { c: 10.0, max_iter: 500 }.validate().unwrap();
        ModelParams::Knn { n_neighbors: 1 }.validate().unwrap();
    }

    #[test]
    fn test_params_json_defaults() {
        let params: ModelParams =
            serde_json::from_str(r#"{"family": "random_forest", "n_estimators": 200}"#).unwrap();
        assert_eq!(
            params,
            ModelParams::RandomForest { n_estimators: 200, max_depth: 10, bootstrap: true }
        );

        let params: ModelParams =
            serde_json::from_str(r#"{"family": "svm", "kernel": "linear", "gamma": "auto"}"#).unwrap();
        assert_eq!(
            params,
            ModelParams::Svm { c: 1.0, kernel: KernelType::Linear, gamma: Gamma::Auto, probability: true }
        );

        // gamma is a named heuristic, never a number
        assert!(serde_json::from_str::<ModelParams>(r#"{"family": "svm", "gamma": 0.5}"#).is_err());

        let params: ModelParams =
            serde_json::from_str(r#"{"family": "gaussian_naive_bayes"}"#).unwrap();
        assert_eq!(params.family(), ModelFamily::GaussianNaiveBayes);
    }
}
