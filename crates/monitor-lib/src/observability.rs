//! Observability infrastructure for the health monitor
//!
//! Provides:
//! - Prometheus metrics (tick latency, skipped ticks, alerts, section failures, retraining)
//! - Structured JSON logging with tracing

use crate::diagnostics::format_mib;
use crate::models::{
    HealthReport, MemoryDiagnostic, ModelLoadedEvent, RetrainEvent, Section, SystemStatus,
};
use prometheus::{
    register_gauge, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, Encoder, Gauge, Histogram, IntCounter, IntCounterVec, IntGauge,
    TextEncoder,
};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Histogram buckets for tick latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<MonitorMetricsInner> = OnceLock::new();

struct MonitorMetricsInner {
    tick_latency_seconds: Histogram,
    health_ticks: IntCounter,
    skipped_ticks: IntCounterVec,
    warnings: IntCounter,
    predictive_alerts: IntCounter,
    section_failures: IntCounterVec,
    retrains: IntCounter,
    model_accuracy: Gauge,
    model_version: IntGauge,
    memory_rss_bytes: IntGauge,
    sink_errors: IntCounter,
}

impl MonitorMetricsInner {
    fn new() -> Self {
        Self {
            tick_latency_seconds: register_histogram!(
                "health_monitor_tick_latency_seconds",
                "Time spent producing one health report",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register tick_latency_seconds"),

            health_ticks: register_int_counter!(
                "health_monitor_health_ticks_total",
                "Total number of health reports produced"
            )
            .expect("Failed to register health_ticks"),

            skipped_ticks: register_int_counter_vec!(
                "health_monitor_skipped_ticks_total",
                "Ticks dropped because the previous tick of the same task was still running",
                &["task"]
            )
            .expect("Failed to register skipped_ticks"),

            warnings: register_int_counter!(
                "health_monitor_warnings_total",
                "Health reports whose status was WARNING"
            )
            .expect("Failed to register warnings"),

            predictive_alerts: register_int_counter!(
                "health_monitor_predictive_alerts_total",
                "Forecasts that would breach the alert threshold"
            )
            .expect("Failed to register predictive_alerts"),

            section_failures: register_int_counter_vec!(
                "health_monitor_section_failures_total",
                "Report sections replaced by a failure indicator",
                &["section"]
            )
            .expect("Failed to register section_failures"),

            retrains: register_int_counter!(
                "health_monitor_retrains_total",
                "Total number of model retraining runs"
            )
            .expect("Failed to register retrains"),

            model_accuracy: register_gauge!(
                "health_monitor_model_accuracy_percent",
                "Accuracy reported by the latest retraining run"
            )
            .expect("Failed to register model_accuracy"),

            model_version: register_int_gauge!(
                "health_monitor_model_version",
                "Number of retraining runs applied to the model"
            )
            .expect("Failed to register model_version"),

            memory_rss_bytes: register_int_gauge!(
                "health_monitor_memory_rss_bytes",
                "Resident memory of the monitor process at the last diagnostic"
            )
            .expect("Failed to register memory_rss_bytes"),

            sink_errors: register_int_counter!(
                "health_monitor_sink_errors_total",
                "Events the report sink failed to accept"
            )
            .expect("Failed to register sink_errors"),
        }
    }
}

/// Monitor metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct MonitorMetrics {
    _private: (),
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &MonitorMetricsInner {
        GLOBAL_METRICS.get_or_init(MonitorMetricsInner::new)
    }

    /// Record one finished health report
    pub fn observe_health_report(&self, report: &HealthReport, duration_secs: f64) {
        let inner = self.inner();
        inner.tick_latency_seconds.observe(duration_secs);
        inner.health_ticks.inc();

        if report.status == Some(SystemStatus::Warning) {
            inner.warnings.inc();
        }
        if report.predictive_alert == Some(true) {
            inner.predictive_alerts.inc();
        }
        if report.metrics.is_failed() {
            inner.section_failures.with_label_values(&["metrics"]).inc();
        }
        if report.prediction.as_ref().is_some_and(Section::is_failed) {
            inner.section_failures.with_label_values(&["prediction"]).inc();
        }
        if report.cloud.as_ref().is_some_and(Section::is_failed) {
            inner.section_failures.with_label_values(&["cloud"]).inc();
        }
    }

    /// Count ticks that were dropped
    pub fn inc_skipped_ticks(&self, task: &str, count: u64) {
        self.inner()
            .skipped_ticks
            .with_label_values(&[task])
            .inc_by(count);
    }

    /// Record a retraining run
    pub fn observe_retrain(&self, event: &RetrainEvent) {
        let inner = self.inner();
        inner.retrains.inc();
        inner.model_accuracy.set(event.accuracy);
        inner.model_version.set(event.model_version as i64);
    }

    /// Record a memory diagnostic
    pub fn observe_memory(&self, diagnostic: &MemoryDiagnostic) {
        self.inner()
            .memory_rss_bytes
            .set(diagnostic.rss_bytes.min(i64::MAX as u64) as i64);
    }

    /// Increment sink errors counter
    pub fn inc_sink_errors(&self) {
        self.inner().sink_errors.inc();
    }

    /// Encode every registered metric in the Prometheus text format
    pub fn render(&self) -> prometheus::Result<Vec<u8>> {
        // Registered into the default registry on first use
        self.inner();

        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        Ok(buffer)
    }
}

/// Structured logger for monitor events
///
/// Provides consistent JSON-formatted logging for health reports,
/// retraining, memory diagnostics and lifecycle events.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Log monitor startup
    pub fn log_startup(&self, version: &str, mode: &str, interval_ms: u64) {
        info!(
            event = "monitor_started",
            instance = %self.instance,
            monitor_version = %version,
            mode = %mode,
            interval_ms = interval_ms,
            "Health monitor started"
        );
    }

    /// Log monitor shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "monitor_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Health monitor shutting down"
        );
    }

    /// Log one health report with its sections
    pub fn log_health_report(&self, report: &HealthReport) {
        match report.snapshot() {
            Some(snapshot) => {
                let status = report
                    .status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "UNKNOWN".to_string());
                match report.status {
                    Some(SystemStatus::Warning) => warn!(
                        event = "health_report",
                        instance = %self.instance,
                        cpu = snapshot.cpu,
                        memory = snapshot.memory,
                        disk = snapshot.disk,
                        threshold = report.threshold,
                        status = %status,
                        auto_scaling_triggered = ?report.auto_scaling_triggered,
                        "System status WARNING: high resource usage"
                    ),
                    _ => info!(
                        event = "health_report",
                        instance = %self.instance,
                        cpu = snapshot.cpu,
                        memory = snapshot.memory,
                        disk = snapshot.disk,
                        threshold = report.threshold,
                        status = %status,
                        "System status OPTIMAL"
                    ),
                }
            }
            None => {
                if let Section::Failed { reason } = &report.metrics {
                    warn!(
                        event = "health_report",
                        instance = %self.instance,
                        degraded = true,
                        reason = %reason,
                        "Metrics unavailable, report degraded"
                    );
                }
            }
        }

        if let Some(section) = &report.prediction {
            match section {
                Section::Available(prediction) => info!(
                    event = "prediction",
                    instance = %self.instance,
                    window_secs = prediction.window_secs,
                    cpu = prediction.cpu,
                    memory = prediction.memory,
                    traffic = prediction.traffic,
                    confidence = prediction.confidence,
                    "Predicted metrics"
                ),
                Section::Failed { reason } => warn!(
                    event = "prediction",
                    instance = %self.instance,
                    reason = %reason,
                    "Prediction unavailable"
                ),
            }
        }

        if report.predictive_alert == Some(true) {
            warn!(
                event = "predictive_alert",
                instance = %self.instance,
                threshold = report.threshold,
                "High CPU expected, pre-scaling initiated"
            );
        }

        if let Some(section) = &report.cloud {
            match section {
                Section::Available(statuses) => {
                    for status in statuses {
                        info!(
                            event = "cloud_status",
                            instance = %self.instance,
                            provider = %status.provider.to_uppercase(),
                            instances = status.instances,
                            load_percent = status.load_percent,
                            health = %status.health,
                            "Cloud provider status"
                        );
                    }
                }
                Section::Failed { reason } => warn!(
                    event = "cloud_status",
                    instance = %self.instance,
                    reason = %reason,
                    "Cloud status unavailable"
                ),
            }
        }

        if let Some(debug_fields) = &report.debug {
            debug!(
                event = "debug_fields",
                instance = %self.instance,
                hot_reload = debug_fields.hot_reload,
                debug_port = debug_fields.debug_port,
                source_maps = debug_fields.source_maps,
                "Debug mode active"
            );
        }

        if let Some(verbose) = &report.verbose {
            debug!(
                event = "next_check",
                instance = %self.instance,
                next_check_in_ms = verbose.next_check_in_ms,
                "Next check scheduled"
            );
        }
    }

    /// Log a retraining run
    pub fn log_retrain(&self, event: &RetrainEvent) {
        info!(
            event = "model_retrained",
            instance = %self.instance,
            accuracy = event.accuracy,
            model_version = event.model_version,
            "Model retrained on new data"
        );
    }

    /// Log a model load
    pub fn log_model_loaded(&self, event: &ModelLoadedEvent) {
        info!(
            event = "model_loaded",
            instance = %self.instance,
            model_path = %event.model_path,
            "Prediction model loaded"
        );
    }

    /// Log a memory diagnostic
    pub fn log_memory(&self, diagnostic: &MemoryDiagnostic) {
        info!(
            event = "memory_usage",
            instance = %self.instance,
            rss = %format_mib(diagnostic.rss_bytes),
            heap_used = %format_mib(diagnostic.heap_used_bytes),
            "Memory usage"
        );
    }

    /// Log dropped ticks
    pub fn log_tick_skipped(&self, task: &str, count: u64) {
        warn!(
            event = "tick_skipped",
            instance = %self.instance,
            task = %task,
            skipped = count,
            "Previous tick still running, skipping"
        );
    }
}
