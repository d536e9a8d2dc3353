//! Seeded train/test partition

use crate::error::{LabError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Fraction of rows held out for evaluation
pub const DEFAULT_TEST_FRACTION: f64 = 0.3;

/// Row indices of a deterministic train/test partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Shuffle `0..n_samples` with a seeded `ChaCha8Rng` and hold out
    /// `ceil(test_fraction * n_samples)` rows.
    pub fn new(n_samples: usize, test_fraction: f64, seed: u64) -> Result<Self> {
        if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
            return Err(LabError::InvalidParameter {
                name: "test_fraction".to_string(),
                value: test_fraction.to_string(),
                reason: "must be in (0, 1)".to_string(),
            });
        }

        let n_test = (test_fraction * n_samples as f64).ceil() as usize;
        if n_test == 0 || n_test >= n_samples {
            return Err(LabError::InputValidation(format!(
                "cannot split {} rows into non-empty train and test sets",
                n_samples
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let train = indices.split_off(n_test);
        Ok(Self {
            train,
            test: indices,
        })
    }

    pub fn train_size(&self) -> usize {
        self.train.len()
    }

    pub fn test_size(&self) -> usize {
        self.test.len()
    }

    pub fn train_data(&self, x: &Array2<f64>, y: &Array1<f64>) -> (Array2<f64>, Array1<f64>) {
        (x.select(Axis(0), &self.train), y.select(Axis(0), &self.train))
    }

    pub fn test_data(&self, x: &Array2<f64>, y: &Array1<f64>) -> (Array2<f64>, Array1<f64>) {
        (x.select(Axis(0), &self.test), y.select(Axis(0), &self.test))
    }
}
