//! Threshold alert evaluation
//!
//! Maps a set of percentage readings and a threshold to a [`SystemStatus`].
//! Only a reading strictly above the threshold raises a warning.

use crate::models::{MetricsSnapshot, Prediction, SystemStatus};

/// Default alert threshold percentage
pub const DEFAULT_ALERT_THRESHOLD: f64 = 80.0;

/// Stateless threshold evaluator
#[derive(Debug, Clone, Copy)]
pub struct AlertEvaluator {
    threshold: f64,
}

impl AlertEvaluator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// WARNING iff the highest reading is strictly above the threshold.
    /// An empty reading set is OPTIMAL.
    pub fn evaluate(readings: &[f64], threshold: f64) -> SystemStatus {
        let max = readings.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if max > threshold {
            SystemStatus::Warning
        } else {
            SystemStatus::Optimal
        }
    }

    /// Evaluate the current readings
    pub fn evaluate_snapshot(&self, snapshot: &MetricsSnapshot) -> SystemStatus {
        Self::evaluate(&snapshot.readings(), self.threshold)
    }

    /// Returns true if a forecast would breach the threshold
    pub fn is_predictive_breach(&self, prediction: &Prediction) -> bool {
        Self::evaluate(&prediction.readings(), self.threshold) == SystemStatus::Warning
    }
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_THRESHOLD)
    }
}
