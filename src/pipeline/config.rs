//! Pipeline configuration and evaluation requests

use crate::error::{LabError, Result};
use crate::evaluation::Diagnostic;
use crate::preprocessing::DEFAULT_TEST_FRACTION;
use crate::training::{ModelFamily, ModelParams};
use serde::{Deserialize, Serialize};

/// Settings shared by every run in a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seed for the split shuffle and every randomized model
    pub random_seed: u64,
    /// Smallest table accepted for evaluation
    pub min_rows: usize,
    /// Share of rows held out for scoring
    pub test_fraction: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            random_seed: std::env::var("MUSHROOM_LAB_SEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            min_rows: std::env::var("MUSHROOM_LAB_MIN_ROWS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            test_fraction: DEFAULT_TEST_FRACTION,
        }
    }
}

impl PipelineConfig {
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_min_rows(mut self, min_rows: usize) -> Self {
        self.min_rows = min_rows;
        self
    }

    pub fn with_test_fraction(mut self, fraction: f64) -> Self {
        self.test_fraction = fraction;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(LabError::InvalidParameter {
                name: "test_fraction".to_string(),
                value: self.test_fraction.to_string(),
                reason: "must be in (0, 1)".to_string(),
            });
        }
        Ok(())
    }
}

/// One evaluation: which model to fit and which charts to draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub params: ModelParams,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Default for EvaluationRequest {
    fn default() -> Self {
        Self::new(ModelParams::default_for(ModelFamily::LogisticRegression))
    }
}

impl EvaluationRequest {
    pub fn new(params: ModelParams) -> Self {
        Self {
            params,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) -> Self {
        self.diagnostics = diagnostics.into_iter().collect();
        self
    }

    pub fn family(&self) -> ModelFamily {
        self.params.family()
    }
}
