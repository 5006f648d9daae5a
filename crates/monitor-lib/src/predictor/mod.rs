//! Predictive analytics
//!
//! The engine behind [`PredictionEngine`] is a placeholder: the simulated
//! implementation draws random forecasts. A real model can be swapped in
//! without touching the scheduler.

mod retrain;
mod simulated;

pub use retrain::{RetrainTracker, RETRAIN_INTERVAL};
pub use simulated::{SimulatedPredictor, SIMULATED_ACCURACY};

use crate::error::MonitorResult;
use crate::models::{MetricsSnapshot, ModelLoadedEvent, Prediction, RetrainResult};
use async_trait::async_trait;
use std::time::Duration;

/// Default forecast horizon (5 minutes)
pub const DEFAULT_PREDICTIVE_WINDOW: Duration = Duration::from_secs(300);

/// Default model location
pub const DEFAULT_MODEL_PATH: &str = "./models/anomaly-detection.h5";

/// Trait for prediction implementations
#[async_trait]
pub trait PredictionEngine: Send + Sync {
    /// Load the model. Called once before the first predict or retrain.
    async fn load(&self) -> MonitorResult<ModelLoadedEvent>;

    /// Forecast readings `window` ahead of the given snapshot
    async fn predict(&self, current: &MetricsSnapshot, window: Duration)
        -> MonitorResult<Prediction>;

    /// Refresh the model on new data. Safe to call while a previous
    /// retrain is still running.
    async fn retrain(&self) -> MonitorResult<RetrainResult>;
}
