//! Random stand-in for real sampling

use super::{async_trait, MetricsSource};
use crate::error::MonitorResult;
use crate::models::MetricsSnapshot;
use rand::Rng;

/// Draws every reading independently and uniformly from [0, 100)
#[derive(Debug, Default, Clone)]
pub struct SimulatedMetricsSource;

impl SimulatedMetricsSource {
    pub fn new() -> Self {
        Self
    }

    fn draw(&self) -> MetricsSnapshot {
        let mut rng = rand::thread_rng();
        MetricsSnapshot::new(
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.0..100.0),
        )
    }
}

#[async_trait]
impl MetricsSource for SimulatedMetricsSource {
    async fn sample(&self) -> MonitorResult<MetricsSnapshot> {
        Ok(self.draw())
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
