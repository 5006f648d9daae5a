//! Monitor lifecycle
//!
//! Owns the three recurring tasks: the health tick on the configured
//! interval, model retraining every 2 minutes when AI features are on, and
//! memory diagnostics every 30 seconds in debug mode. Each task keeps its
//! own cadence; a tick still running at its next deadline causes that
//! deadline to be dropped.

use super::check::{bounded, HealthCheck};
use super::config::MonitorConfig;
use crate::cloud::{CloudFleetProbe, SimulatedFleetProbe};
use crate::collector::{MetricsSource, SimulatedMetricsSource};
use crate::diagnostics::{MemoryProbe, MEMORY_DIAGNOSTIC_INTERVAL};
use crate::health::{components, HealthRegistry};
use crate::models::{HealthReport, ReportEvent, Section};
use crate::observability::{MonitorMetrics, StructuredLogger};
use crate::predictor::{PredictionEngine, RetrainTracker, SimulatedPredictor, RETRAIN_INTERVAL};
use crate::sink::{LogSink, ReportSink};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Hands events to the sink and keeps health and metrics in step
#[derive(Clone)]
struct Emitter {
    sink: Arc<dyn ReportSink>,
    health: HealthRegistry,
    metrics: MonitorMetrics,
}

impl Emitter {
    async fn emit(&self, event: ReportEvent) {
        let kind = event.kind();
        match self.sink.emit(event).await {
            Ok(()) => self.health.set_healthy(components::SINK).await,
            Err(e) => {
                warn!(event_kind = kind, error = %e, "Report sink rejected event");
                self.metrics.inc_sink_errors();
                self.health
                    .set_degraded(components::SINK, e.to_string())
                    .await;
            }
        }
    }
}

/// Body of a recurring task
#[async_trait]
trait Tick: Send + 'static {
    fn name(&self) -> &'static str;

    async fn tick(&mut self);
}

/// Consecutive failed samples after which the metrics source is unhealthy
const UNHEALTHY_AFTER_FAILURES: u32 = 3;

struct HealthTick {
    check: Arc<HealthCheck>,
    emitter: Emitter,
    consecutive_failures: u32,
}

#[async_trait]
impl Tick for HealthTick {
    fn name(&self) -> &'static str {
        "health"
    }

    async fn tick(&mut self) {
        let start = Instant::now();
        let check = self.check.clone();

        // A panicking collaborator must not take the task down with it
        let report = match tokio::spawn(async move { check.run().await }).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Health check aborted");
                aborted_report(self.check.threshold(), e.to_string())
            }
        };

        let health = &self.emitter.health;
        match &report.metrics {
            Section::Failed { reason } => {
                self.consecutive_failures += 1;
                if self.consecutive_failures >= UNHEALTHY_AFTER_FAILURES {
                    health
                        .set_unhealthy(
                            components::METRICS_SOURCE,
                            format!(
                                "{} consecutive failures, last: {}",
                                self.consecutive_failures, reason
                            ),
                        )
                        .await;
                } else {
                    health
                        .set_degraded(components::METRICS_SOURCE, reason.clone())
                        .await;
                }
            }
            Section::Available(_) => {
                self.consecutive_failures = 0;
                health.set_healthy(components::METRICS_SOURCE).await;
            }
        }
        if let Some(prediction) = &report.prediction {
            health.record_section(components::PREDICTOR, prediction).await;
        }
        if let Some(cloud) = &report.cloud {
            health.record_section(components::CLOUD_PROBE, cloud).await;
        }

        self.emitter
            .metrics
            .observe_health_report(&report, start.elapsed().as_secs_f64());
        self.emitter.emit(ReportEvent::HealthReport(report)).await;
    }
}

fn aborted_report(threshold: f64, reason: String) -> HealthReport {
    HealthReport {
        timestamp: Utc::now(),
        threshold,
        metrics: Section::failed(format!("health check aborted: {}", reason)),
        status: None,
        ai_analysis: None,
        prediction: None,
        predictive_alert: None,
        cloud: None,
        auto_scaling_triggered: None,
        debug: None,
        verbose: None,
    }
}

struct RetrainTick {
    predictor: Arc<dyn PredictionEngine>,
    tracker: RetrainTracker,
    budget: Duration,
    emitter: Emitter,
}

#[async_trait]
impl Tick for RetrainTick {
    fn name(&self) -> &'static str {
        "retrain"
    }

    async fn tick(&mut self) {
        info!("Retraining model on new data");

        match bounded("predictor", self.budget, self.predictor.retrain()).await {
            Ok(result) => {
                let event = self.tracker.record(result);
                self.emitter.metrics.observe_retrain(&event);
                self.emitter.emit(ReportEvent::Retrain(event)).await;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    model_version = self.tracker.model_version(),
                    "Retraining failed, keeping current model"
                );
                self.emitter
                    .health
                    .set_degraded(components::PREDICTOR, e.to_string())
                    .await;
            }
        }
    }
}

struct MemoryTick {
    probe: MemoryProbe,
    budget: Duration,
    emitter: Emitter,
}

#[async_trait]
impl Tick for MemoryTick {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn tick(&mut self) {
        match bounded("memory_probe", self.budget, self.probe.sample()).await {
            Ok(diagnostic) => {
                self.emitter.metrics.observe_memory(&diagnostic);
                self.emitter
                    .emit(ReportEvent::MemoryDiagnostic(diagnostic))
                    .await;
            }
            Err(e) => warn!(error = %e, "Memory diagnostic failed"),
        }
    }
}

/// How late a deadline may fire before the tick is dropped
const LATE_TICK_TOLERANCE: Duration = Duration::from_millis(100);

/// Deadlines that passed during an overrun. The interval skips straight to
/// the next deadline after `now`, so the late one and every later one up to
/// `now` are dropped together.
fn dropped_deadlines(lateness: Duration, period: Duration) -> u64 {
    if period.is_zero() {
        return 1;
    }
    1 + (lateness.as_nanos() / period.as_nanos()) as u64
}

/// Drive a tick on a fixed cadence until shutdown.
///
/// The first tick fires one period after `origin`. Deadlines that pass while
/// a tick is running are dropped, never queued. A running tick is never
/// interrupted; shutdown takes effect once it returns.
async fn run_periodic<T: Tick>(
    mut task: T,
    origin: Instant,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
    metrics: MonitorMetrics,
    logger: StructuredLogger,
) {
    let name = task.name();
    info!(task = name, period_ms = period.as_millis() as u64, "Starting recurring task");

    let mut ticker = interval_at(origin + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                info!(task = name, "Shutting down recurring task");
                break;
            }
            deadline = ticker.tick() => {
                // Late means the deadline passed while the previous tick ran
                let lateness = Instant::now().saturating_duration_since(deadline);
                if lateness > LATE_TICK_TOLERANCE {
                    let dropped = dropped_deadlines(lateness, period);
                    metrics.inc_skipped_ticks(name, dropped);
                    logger.log_tick_skipped(name, dropped);
                    continue;
                }
                task.tick().await;
            }
        }
    }
}

/// Running monitor; dropping the handle also stops the recurring tasks
pub struct MonitorHandle {
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl MonitorHandle {
    /// Names of the recurring tasks that were started
    pub fn task_names(&self) -> Vec<&'static str> {
        self.tasks.iter().map(|(name, _)| *name).collect()
    }

    /// Stop all recurring tasks. Ticks already running finish first.
    pub async fn stop(self) {
        // No receivers left means every task already exited
        let _ = self.shutdown_tx.send(());

        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                warn!(task = name, error = %e, "Recurring task ended abnormally");
            }
        }
        info!("Monitor stopped");
    }
}

/// Health monitor scheduler
pub struct MonitorScheduler {
    config: Arc<MonitorConfig>,
    check: Arc<HealthCheck>,
    predictor: Arc<dyn PredictionEngine>,
    emitter: Emitter,
    logger: StructuredLogger,
}

impl MonitorScheduler {
    pub fn builder(config: MonitorConfig) -> MonitorSchedulerBuilder {
        MonitorSchedulerBuilder::new(config)
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run one health tick now, then start the recurring tasks.
    ///
    /// Returns once the first health report has been emitted.
    pub async fn start(self) -> MonitorHandle {
        let origin = Instant::now();
        let config = self.config.clone();
        let health = self.emitter.health.clone();

        health.register(components::METRICS_SOURCE).await;
        health.register(components::SINK).await;
        if config.ai.is_enabled() {
            health.register(components::PREDICTOR).await;
            health.register(components::CLOUD_PROBE).await;
        }

        info!(
            mode = %config.mode(),
            interval_ms = config.interval.as_millis() as u64,
            alert_threshold = config.alert_threshold,
            "Starting monitor"
        );

        if config.ai.is_enabled() {
            match self.predictor.load().await {
                Ok(event) => self.emitter.emit(ReportEvent::ModelLoaded(event)).await,
                Err(e) => {
                    warn!(error = %e, "Model failed to load, forecasts may be unavailable");
                    health
                        .set_degraded(components::PREDICTOR, e.to_string())
                        .await;
                }
            }
        }

        let mut health_tick = HealthTick {
            check: self.check.clone(),
            emitter: self.emitter.clone(),
            consecutive_failures: 0,
        };
        health_tick.tick().await;

        let (shutdown_tx, _) = broadcast::channel(1);
        let mut tasks = Vec::new();

        tasks.push((
            "health",
            tokio::spawn(run_periodic(
                health_tick,
                origin,
                config.interval,
                shutdown_tx.subscribe(),
                self.emitter.metrics.clone(),
                self.logger.clone(),
            )),
        ));

        if config.ai.is_enabled() {
            let retrain = RetrainTick {
                predictor: self.predictor.clone(),
                tracker: RetrainTracker::new(),
                budget: config.collaborator_timeout,
                emitter: self.emitter.clone(),
            };
            tasks.push((
                "retrain",
                tokio::spawn(run_periodic(
                    retrain,
                    origin,
                    RETRAIN_INTERVAL,
                    shutdown_tx.subscribe(),
                    self.emitter.metrics.clone(),
                    self.logger.clone(),
                )),
            ));
        }

        if config.debug_mode {
            let memory = MemoryTick {
                probe: MemoryProbe::new(),
                budget: config.collaborator_timeout,
                emitter: self.emitter.clone(),
            };
            tasks.push((
                "memory",
                tokio::spawn(run_periodic(
                    memory,
                    origin,
                    MEMORY_DIAGNOSTIC_INTERVAL,
                    shutdown_tx.subscribe(),
                    self.emitter.metrics.clone(),
                    self.logger.clone(),
                )),
            ));
        }

        health.set_ready(true).await;
        debug!(tasks = tasks.len(), "Monitor running");

        MonitorHandle { shutdown_tx, tasks }
    }
}

/// Builder for the monitor scheduler. Collaborators default to the
/// simulated implementations and a log sink.
pub struct MonitorSchedulerBuilder {
    config: MonitorConfig,
    source: Option<Arc<dyn MetricsSource>>,
    predictor: Option<Arc<dyn PredictionEngine>>,
    probe: Option<Arc<dyn CloudFleetProbe>>,
    sink: Option<Arc<dyn ReportSink>>,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
}

impl MonitorSchedulerBuilder {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            source: None,
            predictor: None,
            probe: None,
            sink: None,
            health: None,
            logger: None,
        }
    }

    pub fn metrics_source(mut self, source: Arc<dyn MetricsSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn predictor(mut self, predictor: Arc<dyn PredictionEngine>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn cloud_probe(mut self, probe: Arc<dyn CloudFleetProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn health_registry(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> MonitorScheduler {
        let config = Arc::new(self.config.normalized());
        let logger = self
            .logger
            .unwrap_or_else(|| StructuredLogger::new("health-monitor"));

        let source = self
            .source
            .unwrap_or_else(|| Arc::new(SimulatedMetricsSource::new()));
        let predictor = self.predictor.unwrap_or_else(|| {
            let path = config
                .ai
                .model_path()
                .unwrap_or(crate::predictor::DEFAULT_MODEL_PATH);
            Arc::new(SimulatedPredictor::new(path))
        });
        let probe = self
            .probe
            .unwrap_or_else(|| Arc::new(SimulatedFleetProbe::new()));
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(LogSink::new(logger.clone())));

        let check = Arc::new(HealthCheck::new(
            config.clone(),
            source,
            predictor.clone(),
            probe,
        ));

        MonitorScheduler {
            config,
            check,
            predictor,
            emitter: Emitter {
                sink,
                health: self.health.unwrap_or_default(),
                metrics: MonitorMetrics::new(),
            },
            logger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_deadlines_counts_whole_overrun() {
        let period = Duration::from_secs(10);

        assert_eq!(dropped_deadlines(Duration::from_millis(150), period), 1);
        assert_eq!(dropped_deadlines(Duration::from_secs(9), period), 1);
        assert_eq!(dropped_deadlines(Duration::from_secs(10), period), 2);
        assert_eq!(dropped_deadlines(Duration::from_secs(25), period), 3);
    }

    #[test]
    fn test_zero_period_drops_one() {
        assert_eq!(dropped_deadlines(Duration::from_secs(5), Duration::ZERO), 1);
    }
}
