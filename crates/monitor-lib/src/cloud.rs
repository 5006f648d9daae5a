//! Multi-cloud fleet status
//!
//! Produces one [`CloudProviderStatus`] per configured provider, in the
//! order the providers were configured.

use crate::error::MonitorResult;
use crate::models::{CloudHealth, CloudProviderStatus};
use async_trait::async_trait;
use rand::Rng;

/// Smallest instance count a simulated provider reports
pub const MIN_INSTANCES: u32 = 5;

/// Probability that a simulated provider reports as healthy
pub const HEALTHY_PROBABILITY: f64 = 0.9;

/// Trait for fleet probe implementations
#[async_trait]
pub trait CloudFleetProbe: Send + Sync {
    /// Probe every provider. The output preserves input order and an
    /// empty input yields an empty output.
    async fn probe(&self, providers: &[String]) -> MonitorResult<Vec<CloudProviderStatus>>;
}

/// Fleet probe that reports random instance counts, load and health
#[derive(Debug, Default, Clone)]
pub struct SimulatedFleetProbe;

impl SimulatedFleetProbe {
    pub fn new() -> Self {
        Self
    }

    fn status_for(provider: &str) -> CloudProviderStatus {
        let mut rng = rand::thread_rng();
        let health = if rng.gen_bool(HEALTHY_PROBABILITY) {
            CloudHealth::Healthy
        } else {
            CloudHealth::Degraded
        };

        CloudProviderStatus {
            provider: provider.to_string(),
            instances: rng.gen_range(MIN_INSTANCES..MIN_INSTANCES + 10),
            load_percent: rng.gen_range(0.0..100.0),
            health,
        }
    }
}

#[async_trait]
impl CloudFleetProbe for SimulatedFleetProbe {
    async fn probe(&self, providers: &[String]) -> MonitorResult<Vec<CloudProviderStatus>> {
        Ok(providers.iter().map(|p| Self::status_for(p)).collect())
    }
}
