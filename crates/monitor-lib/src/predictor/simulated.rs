//! Randomized prediction engine

use super::PredictionEngine;
use crate::error::MonitorResult;
use crate::models::{MetricsSnapshot, ModelLoadedEvent, Prediction, RetrainResult};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Accuracy reported by every simulated retrain
pub const SIMULATED_ACCURACY: f64 = 94.7;

/// Prediction engine that produces random forecasts
pub struct SimulatedPredictor {
    model_path: String,
    loaded: AtomicBool,
}

impl SimulatedPredictor {
    pub fn new(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            loaded: AtomicBool::new(false),
        }
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }
}

#[async_trait]
impl PredictionEngine for SimulatedPredictor {
    async fn load(&self) -> MonitorResult<ModelLoadedEvent> {
        if self.loaded.swap(true, Ordering::AcqRel) {
            debug!(model_path = %self.model_path, "Model already loaded");
        } else {
            info!(model_path = %self.model_path, "Model loaded");
        }

        Ok(ModelLoadedEvent {
            timestamp: Utc::now(),
            model_path: self.model_path.clone(),
        })
    }

    async fn predict(
        &self,
        _current: &MetricsSnapshot,
        window: Duration,
    ) -> MonitorResult<Prediction> {
        let mut rng = rand::thread_rng();

        Ok(Prediction {
            timestamp: Utc::now(),
            window_secs: window.as_secs(),
            cpu: rng.gen_range(0.0..100.0),
            memory: rng.gen_range(0.0..100.0),
            traffic: rng.gen_range(0.0..1000.0),
            confidence: rng.gen_range(70.0..=100.0),
        })
    }

    async fn retrain(&self) -> MonitorResult<RetrainResult> {
        Ok(RetrainResult {
            accuracy: SIMULATED_ACCURACY,
            timestamp: Utc::now(),
        })
    }
}
