//! Utility functions and types

pub mod data_loader;

pub use data_loader::{DataLoader, DataSaver};

use std::time::Instant;

/// Wall-clock timer for log fields
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
