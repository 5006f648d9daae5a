//! Metrics sampling
//!
//! This module provides sources for the CPU, memory and disk readings that
//! drive each health tick. The simulated source draws random values; the
//! system source reads the host through `sysinfo`.

mod simulated;
mod system;

pub use simulated::SimulatedMetricsSource;
pub use system::SystemMetricsSource;

use crate::error::{MonitorError, MonitorResult};
use crate::models::MetricsSnapshot;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

pub use async_trait::async_trait;

/// Trait for metrics sampling implementations
///
/// Implementations must return promptly; the scheduler bounds every call
/// with a timeout and treats expiry as a failed snapshot.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Take one snapshot of the current readings
    async fn sample(&self) -> MonitorResult<MetricsSnapshot>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Which metrics source to run with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricsSourceKind {
    #[default]
    Simulated,
    System,
}

impl FromStr for MetricsSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulated" | "random" => Ok(MetricsSourceKind::Simulated),
            "system" | "host" => Ok(MetricsSourceKind::System),
            other => Err(format!("unknown metrics source: {}", other)),
        }
    }
}

/// Create the metrics source for the given kind
pub fn create_source(kind: MetricsSourceKind) -> Arc<dyn MetricsSource> {
    match kind {
        MetricsSourceKind::Simulated => {
            tracing::info!("Using simulated metrics source");
            Arc::new(SimulatedMetricsSource::new())
        }
        MetricsSourceKind::System => {
            tracing::info!("Using host metrics source");
            Arc::new(SystemMetricsSource::new())
        }
    }
}

/// Run a blocking host read on the blocking pool.
///
/// Keeps the runtime thread free so the caller's timeout can still fire
/// while the read is in progress.
pub(crate) async fn run_blocking<T, F>(what: &'static str, read: F) -> MonitorResult<T>
where
    F: FnOnce() -> MonitorResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(read)
        .await
        .map_err(|e| MonitorError::Sampling(format!("{} read aborted: {}", what, e)))?
}

/// Clamp a reading into the percentage domain
pub(crate) fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
