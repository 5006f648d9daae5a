//! Error types for tick collaborators
//!
//! Every variant is tick-local: the scheduler converts it into a failed
//! report section and keeps running.

use std::time::Duration;

use thiserror::Error;

/// Result alias used by the collaborator traits
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Failures raised while producing one tick's report
#[derive(Error, Debug)]
pub enum MonitorError {
    /// A collaborator did not answer within its time budget
    #[error("{component} timed out after {}ms", after.as_millis())]
    Timeout {
        component: &'static str,
        after: Duration,
    },

    /// The metrics source could not produce a snapshot
    #[error("Sampling failed: {0}")]
    Sampling(String),

    /// The prediction engine could not produce a forecast
    #[error("Prediction failed: {0}")]
    Prediction(String),

    /// The fleet probe could not reach a provider
    #[error("Cloud probe failed: {0}")]
    Probe(String),

    /// The report sink rejected an event
    #[error("Sink error: {0}")]
    Sink(String),
}

impl MonitorError {
    pub fn timeout(component: &'static str, after: Duration) -> Self {
        MonitorError::Timeout { component, after }
    }
}
