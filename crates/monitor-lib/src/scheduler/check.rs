//! One health tick
//!
//! Sample, evaluate, optionally forecast and probe the fleet, then assemble
//! a single [`HealthReport`]. Every collaborator call is time-bounded and
//! its failure only affects its own section.

use super::config::{AiFeatures, MonitorConfig};
use crate::alert::AlertEvaluator;
use crate::cloud::CloudFleetProbe;
use crate::collector::MetricsSource;
use crate::error::{MonitorError, MonitorResult};
use crate::models::{
    AiAnalysis, DebugFields, HealthReport, Prediction, Section, SystemStatus, VerboseFields,
};
use crate::predictor::PredictionEngine;
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Run a collaborator call within its time budget
pub(crate) async fn bounded<T, F>(
    component: &'static str,
    budget: Duration,
    call: F,
) -> MonitorResult<T>
where
    F: Future<Output = MonitorResult<T>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(MonitorError::timeout(component, budget)),
    }
}

/// The health tick pipeline and the collaborators it calls
pub struct HealthCheck {
    config: Arc<MonitorConfig>,
    evaluator: AlertEvaluator,
    source: Arc<dyn MetricsSource>,
    predictor: Arc<dyn PredictionEngine>,
    probe: Arc<dyn CloudFleetProbe>,
}

impl HealthCheck {
    pub fn new(
        config: Arc<MonitorConfig>,
        source: Arc<dyn MetricsSource>,
        predictor: Arc<dyn PredictionEngine>,
        probe: Arc<dyn CloudFleetProbe>,
    ) -> Self {
        Self {
            evaluator: AlertEvaluator::new(config.alert_threshold),
            config,
            source,
            predictor,
            probe,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.evaluator.threshold()
    }

    /// Produce one report. Never fails; failures become failed sections.
    pub async fn run(&self) -> HealthReport {
        let timestamp = Utc::now();
        let budget = self.config.collaborator_timeout;

        let metrics: Section<_> = bounded("metrics_source", budget, self.source.sample())
            .await
            .into();
        let status = metrics
            .as_available()
            .map(|snapshot| self.evaluator.evaluate_snapshot(snapshot));

        let mut report = HealthReport {
            timestamp,
            threshold: self.evaluator.threshold(),
            metrics,
            status,
            ai_analysis: None,
            prediction: None,
            predictive_alert: None,
            cloud: None,
            auto_scaling_triggered: None,
            debug: None,
            verbose: None,
        };

        if let AiFeatures::Enabled {
            predictive_window,
            cloud_providers,
            ..
        } = &self.config.ai
        {
            let predict = self.forecast(&report, *predictive_window, budget);
            let probe = bounded("cloud_probe", budget, self.probe.probe(cloud_providers));
            let (prediction, cloud) = tokio::join!(predict, probe);

            let prediction: Section<Prediction> = prediction.into();
            report.predictive_alert = prediction
                .as_available()
                .map(|p| self.evaluator.is_predictive_breach(p));
            report.prediction = Some(prediction);
            report.cloud = Some(cloud.into());
            report.ai_analysis = Some(AiAnalysis::default());
            report.auto_scaling_triggered = Some(status == Some(SystemStatus::Warning));
        }

        if self.config.debug_mode {
            report.debug = Some(DebugFields {
                hot_reload: true,
                debug_port: self.config.debug_port,
                source_maps: true,
            });
        }

        if self.config.verbose_logging {
            report.verbose = Some(VerboseFields {
                next_check_in_ms: self.config.interval.as_millis() as u64,
            });
        }

        debug!(
            status = ?report.status,
            degraded = report.is_degraded(),
            "Health check complete"
        );

        report
    }

    async fn forecast(
        &self,
        report: &HealthReport,
        window: Duration,
        budget: Duration,
    ) -> MonitorResult<Prediction> {
        let snapshot = report.snapshot().ok_or_else(|| {
            MonitorError::Prediction("no current snapshot to forecast from".to_string())
        })?;
        bounded("predictor", budget, self.predictor.predict(snapshot, window)).await
    }
}
