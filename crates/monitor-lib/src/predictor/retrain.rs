//! Retraining state
//!
//! Owned by the retraining task alone; the health tick never reads it.

use crate::models::{RetrainEvent, RetrainResult};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Fixed retraining cadence (2 minutes)
pub const RETRAIN_INTERVAL: Duration = Duration::from_secs(120);

/// Version counter and last accuracy of the retrained model
#[derive(Debug, Default, Clone)]
pub struct RetrainTracker {
    model_version: u64,
    last_accuracy: Option<f64>,
    last_retrained_at: Option<DateTime<Utc>>,
}

impl RetrainTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished retrain and build the event for it
    pub fn record(&mut self, result: RetrainResult) -> RetrainEvent {
        self.model_version += 1;
        self.last_accuracy = Some(result.accuracy);
        self.last_retrained_at = Some(result.timestamp);

        RetrainEvent {
            timestamp: result.timestamp,
            accuracy: result.accuracy,
            model_version: self.model_version,
        }
    }

    pub fn model_version(&self) -> u64 {
        self.model_version
    }

    pub fn last_accuracy(&self) -> Option<f64> {
        self.last_accuracy
    }

    pub fn last_retrained_at(&self) -> Option<DateTime<Utc>> {
        self.last_retrained_at
    }
}
