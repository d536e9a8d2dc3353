//! Probability calibration
//!
//! Maps raw classifier scores to probabilities. Used by the SVM when
//! probability estimates are requested.

mod platt;

pub use platt::PlattScaling;

use crate::error::Result;
use ndarray::Array1;

/// Trait for score calibrators
pub trait Calibrator: Send + Sync {
    /// Fit on raw scores and binary (0/1) labels
    fn fit(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<()>;

    /// Map raw scores to probabilities of the positive label
    fn calibrate(&self, scores: &Array1<f64>) -> Result<Array1<f64>>;

    fn fit_calibrate(&mut self, scores: &Array1<f64>, labels: &Array1<f64>) -> Result<Array1<f64>> {
        self.fit(scores, labels)?;
        self.calibrate(scores)
    }
}
