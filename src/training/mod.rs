//! Model training module
//!
//! Provides the classifier families used by the dataset pipeline:
//! - Logistic regression
//! - Decision trees and Random Forests
//! - Support Vector Machines
//! - K-Nearest Neighbors
//! - Gaussian Naive Bayes
//!
//! Every classifier takes categorical codes as `f64` features and `f64`
//! labels, and exposes `fit`, `predict`, `predict_proba` and `classes`.

mod config;
mod engine;
pub mod decision_tree;
pub mod knn;
pub mod linear_models;
pub mod naive_bayes;
pub mod random_forest;
pub mod svm;

pub use config::{ModelFamily, ModelParams, TrainingConfig};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{PositiveScores, ScoreSource, TrainEngine, TrainedModel};
pub use knn::{KNNClassifier, KNNConfig};
pub use linear_models::LogisticRegression;
pub use naive_bayes::GaussianNaiveBayes;
pub use random_forest::{MaxFeatures, RandomForest};
pub use svm::{Gamma, KernelType, SVMClassifier, SVMConfig};
