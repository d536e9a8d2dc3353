//! Mushroom Lab - mushroom edibility checks and classifier evaluation
//!
//! This crate provides two independent tools:
//! - A fixed, explainable decision list that labels one mushroom as edible
//!   or poisonous from six categorical attributes
//! - A dataset pipeline that encodes an uploaded categorical table, fits
//!   one of six classifier families on a seeded 70/30 split and reports
//!   metrics, diagnostics and per-row predictions
//!
//! # Modules
//!
//! ## Rule-based checker
//! - [`edibility`] - Attribute alphabets and the ordered decision list
//!
//! ## Dataset pipeline
//! - [`preprocessing`] - Target resolution, categorical encoding, train/test split
//! - [`training`] - Classifier families and the training engine
//! - [`calibration`] - Platt scaling for SVM probabilities
//! - [`evaluation`] - Metrics, confusion matrix, ROC and precision-recall curves
//! - [`pipeline`] - End-to-end evaluation and family comparison
//!
//! ## Services
//! - [`server`] - HTTP server with REST API
//! - [`cli`] - Command-line interface
//!
//! ## Utilities
//! - [`utils`] - Table loading and saving

// Core error handling
pub mod error;

// Rule-based checker
pub mod edibility;

// Dataset pipeline
pub mod preprocessing;
pub mod training;
pub mod calibration;
pub mod evaluation;
pub mod pipeline;

// Utilities
pub mod utils;

// Services
pub mod server;
pub mod cli;

pub use error::{LabError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{LabError, Result};

    // Rule-based checker
    pub use crate::edibility::{
        classify, classify_codes, decision_list, Classification, DecidedBy, MushroomFeatureSet,
        RuleId, Verdict,
    };

    // Preprocessing
    pub use crate::preprocessing::{resolve_target, CategoricalEncoder, TrainTestSplit};

    // Training
    pub use crate::training::{ModelFamily, ModelParams, TrainEngine, TrainingConfig};

    // Evaluation
    pub use crate::evaluation::{ClassificationMetrics, Diagnostic, DiagnosticChart, MetricNotice};

    // Pipeline
    pub use crate::pipeline::{
        DatasetTrainingPipeline, EvaluationReport, EvaluationRequest, ModelComparison,
        PipelineConfig, PipelineWarning, VerdictCounts,
    };

    // Data loading
    pub use crate::utils::{DataLoader, DataSaver};
}
