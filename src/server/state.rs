//! Application state management

use crate::pipeline::{DatasetTrainingPipeline, PipelineConfig};
use crate::utils::DataLoader;

use super::ServerConfig;

/// Read-only state shared across handlers. Every request builds its own
/// encoder, split and model; nothing here changes after startup.
pub struct AppState {
    pub config: ServerConfig,
    pub pipeline: DatasetTrainingPipeline,
    pub loader: DataLoader,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, pipeline_config: PipelineConfig) -> Self {
        Self {
            config,
            pipeline: DatasetTrainingPipeline::new(pipeline_config),
            loader: DataLoader::new(),
            started_at: chrono::Utc::now(),
        }
    }

    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}
