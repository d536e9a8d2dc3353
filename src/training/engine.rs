//! Training engine implementation

use super::config::{ModelFamily, ModelParams, TrainingConfig};
use super::decision_tree::DecisionTree;
use super::knn::KNNClassifier;
use super::linear_models::LogisticRegression;
use super::naive_bayes::GaussianNaiveBayes;
use super::random_forest::{MaxFeatures, RandomForest};
use super::svm::{SVMClassifier, SVMConfig};
use crate::error::{LabError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Enum to hold trained model variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    Svm(SVMClassifier),
    DecisionTree(DecisionTree),
    Knn(KNNClassifier),
    GaussianNaiveBayes(GaussianNaiveBayes),
}

impl TrainedModel {
    pub fn family(&self) -> ModelFamily {
        match self {
            TrainedModel::LogisticRegression(_) => ModelFamily::LogisticRegression,
            TrainedModel::RandomForest(_) => ModelFamily::RandomForest,
            TrainedModel::Svm(_) => ModelFamily::Svm,
            TrainedModel::DecisionTree(_) => ModelFamily::DecisionTree,
            TrainedModel::Knn(_) => ModelFamily::Knn,
            TrainedModel::GaussianNaiveBayes(_) => ModelFamily::GaussianNaiveBayes,
        }
    }

    /// Labels seen at fit time, in probability-column order
    pub fn classes(&self) -> &[f64] {
        match self {
            TrainedModel::LogisticRegression(m) => m.classes(),
            TrainedModel::RandomForest(m) => m.classes(),
            TrainedModel::Svm(m) => m.classes(),
            TrainedModel::DecisionTree(m) => m.classes(),
            TrainedModel::Knn(m) => m.classes(),
            TrainedModel::GaussianNaiveBayes(m) => m.classes(),
        }
    }
}

/// Where a ranking score came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Probability,
    DecisionFunction,
}

/// Per-row score for one label; higher means more likely
#[derive(Debug, Clone)]
pub struct PositiveScores {
    pub values: Array1<f64>,
    pub source: ScoreSource,
}

/// Fits one classifier family and answers prediction queries for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainEngine {
    config: TrainingConfig,
    model: Option<TrainedModel>,
    training_time_secs: f64,
    n_samples: usize,
    n_features: usize,
}

impl TrainEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            model: None,
            training_time_secs: 0.0,
            n_samples: 0,
            n_features: 0,
        }
    }

    /// Validate hyperparameters and fit on `(x, y)`.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.config.params.validate()?;

        if x.nrows() != y.len() {
            return Err(LabError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let start = Instant::now();
        let model = self.train_model(x, y)?;
        self.training_time_secs = start.elapsed().as_secs_f64();
        self.n_samples = x.nrows();
        self.n_features = x.ncols();

        info!(
            family = %model.family(),
            n_samples = self.n_samples,
            n_features = self.n_features,
            secs = self.training_time_secs,
            "Model fitted"
        );

        self.model = Some(model);
        Ok(self)
    }

    fn train_model(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<TrainedModel> {
        let seed = self.config.random_seed;

        let model = match self.config.params {
            ModelParams::LogisticRegression { c, max_iter } => {
                let mut model = LogisticRegression::new().with_c(c).with_max_iter(max_iter);
                model.fit(x, y)?;
                debug!(n_iter = model.n_iter(), "Logistic regression converged");
                TrainedModel::LogisticRegression(model)
            }
            ModelParams::RandomForest {
                n_estimators,
                max_depth,
                bootstrap,
            } => {
                let mut model = RandomForest::new(n_estimators)
                    .with_max_depth(max_depth)
                    .with_bootstrap(bootstrap)
                    .with_max_features(MaxFeatures::Sqrt)
                    .with_random_state(seed);
                model.fit(x, y)?;
                TrainedModel::RandomForest(model)
            }
            ModelParams::Svm {
                c,
                kernel,
                gamma,
                probability,
            } => {
                let mut model = SVMClassifier::new(SVMConfig {
                    c,
                    kernel,
                    gamma,
                    probability,
                    random_state: Some(seed),
                    ..Default::default()
                });
                model.fit(x, y)?;
                debug!(
                    n_support_vectors = model.n_support_vectors(),
                    gamma = model.gamma(),
                    "SVM fitted"
                );
                TrainedModel::Svm(model)
            }
            ModelParams::DecisionTree { max_depth } => {
                let mut model = DecisionTree::new()
                    .with_max_depth(max_depth)
                    .with_random_state(seed);
                model.fit(x, y)?;
                debug!(depth = model.get_depth(), leaves = model.get_n_leaves(), "Tree grown");
                TrainedModel::DecisionTree(model)
            }
            ModelParams::Knn { n_neighbors } => {
                let mut model = KNNClassifier::with_k(n_neighbors);
                model.fit(x, y)?;
                TrainedModel::Knn(model)
            }
            ModelParams::GaussianNaiveBayes => {
                let mut model = GaussianNaiveBayes::new();
                model.fit(x, y)?;
                TrainedModel::GaussianNaiveBayes(model)
            }
        };

        Ok(model)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self.model.as_ref().ok_or(LabError::ModelNotFitted)?;

        match model {
            TrainedModel::LogisticRegression(m) => m.predict(x),
            TrainedModel::RandomForest(m) => m.predict(x),
            TrainedModel::Svm(m) => m.predict(x),
            TrainedModel::DecisionTree(m) => m.predict(x),
            TrainedModel::Knn(m) => m.predict(x),
            TrainedModel::GaussianNaiveBayes(m) => m.predict(x),
        }
    }

    /// Class probabilities, or `None` when the fitted model has no
    /// probability estimates (SVM fitted with `probability = false`).
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Option<Array2<f64>>> {
        let model = self.model.as_ref().ok_or(LabError::ModelNotFitted)?;

        let proba = match model {
            TrainedModel::LogisticRegression(m) => m.predict_proba(x)?,
            TrainedModel::RandomForest(m) => m.predict_proba(x)?,
            TrainedModel::Svm(m) if m.has_probability() => m.predict_proba(x)?,
            TrainedModel::Svm(_) => return Ok(None),
            TrainedModel::DecisionTree(m) => m.predict_proba(x)?,
            TrainedModel::Knn(m) => m.predict_proba(x)?,
            TrainedModel::GaussianNaiveBayes(m) => m.predict_proba(x)?,
        };

        Ok(Some(proba))
    }

    /// Ranking scores for `label`: its predicted probability when the model
    /// exposes probabilities, its decision value otherwise. `None` when
    /// neither is available or `label` was not seen at fit time.
    pub fn positive_scores(&self, x: &Array2<f64>, label: f64) -> Result<Option<PositiveScores>> {
        let model = self.model.as_ref().ok_or(LabError::ModelNotFitted)?;
        let Some(column) = model.classes().iter().position(|&c| c == label) else {
            return Ok(None);
        };

        if let Some(proba) = self.predict_proba(x)? {
            return Ok(Some(PositiveScores {
                values: proba.column(column).to_owned(),
                source: ScoreSource::Probability,
            }));
        }

        let scores = match model {
            TrainedModel::Svm(m) => Some(m.decision_function(x)?),
            _ => None,
        };

        Ok(scores.map(|s| PositiveScores {
            values: s.column(column).to_owned(),
            source: ScoreSource::DecisionFunction,
        }))
    }

    pub fn model(&self) -> Option<&TrainedModel> {
        self.model.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn training_time_secs(&self) -> f64 {
        self.training_time_secs
    }
}
