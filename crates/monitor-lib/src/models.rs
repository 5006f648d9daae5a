//! Core data models for the health monitor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Readings captured by one health tick, each a percentage in [0, 100]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

impl MetricsSnapshot {
    pub fn new(cpu: f64, memory: f64, disk: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            cpu,
            memory,
            disk,
        }
    }

    /// Readings that take part in threshold evaluation
    pub fn readings(&self) -> [f64; 3] {
        [self.cpu, self.memory, self.disk]
    }
}

/// Forward-looking estimate produced by a prediction engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub timestamp: DateTime<Utc>,
    /// How far ahead the estimate looks, in seconds
    pub window_secs: u64,
    /// Predicted CPU usage percentage
    pub cpu: f64,
    /// Predicted memory usage percentage
    pub memory: f64,
    /// Predicted traffic in requests per second
    pub traffic: f64,
    /// Confidence percentage in [70, 100]
    pub confidence: f64,
}

impl Prediction {
    /// Readings that can raise a predictive alert. Only forecast CPU
    /// drives pre-scaling; memory and traffic are reported but not alerted on.
    pub fn readings(&self) -> [f64; 1] {
        [self.cpu]
    }
}

/// Outcome of one model retraining run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainResult {
    /// Training accuracy percentage
    pub accuracy: f64,
    pub timestamp: DateTime<Utc>,
}

/// Health classification of a cloud provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudHealth {
    Healthy,
    Degraded,
}

impl std::fmt::Display for CloudHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudHealth::Healthy => write!(f, "HEALTHY"),
            CloudHealth::Degraded => write!(f, "DEGRADED"),
        }
    }
}

/// Status of one configured cloud provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudProviderStatus {
    pub provider: String,
    /// Running instance count, never below 5
    pub instances: u32,
    pub load_percent: f64,
    pub health: CloudHealth,
}

/// Overall status derived from the current readings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SystemStatus {
    Optimal,
    Warning,
}

impl std::fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemStatus::Optimal => write!(f, "OPTIMAL"),
            SystemStatus::Warning => write!(f, "WARNING"),
        }
    }
}

/// A report section that either carries data or an explicit failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum Section<T> {
    Available(T),
    Failed { reason: String },
}

impl<T> Section<T> {
    pub fn failed(reason: impl Into<String>) -> Self {
        Section::Failed {
            reason: reason.into(),
        }
    }

    pub fn as_available(&self) -> Option<&T> {
        match self {
            Section::Available(value) => Some(value),
            Section::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Section::Failed { .. })
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Section<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Section::Available(value),
            Err(e) => Section::failed(e.to_string()),
        }
    }
}

/// Fields attached when debug mode is on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugFields {
    pub hot_reload: bool,
    pub debug_port: u16,
    pub source_maps: bool,
}

/// Fields attached when verbose logging is on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerboseFields {
    pub next_check_in_ms: u64,
}

/// Static analysis summary attached when AI features are on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub pattern_recognition_active: bool,
    pub anomalies_detected: u32,
    pub optimization_suggestions: u32,
}

impl Default for AiAnalysis {
    fn default() -> Self {
        Self {
            pattern_recognition_active: true,
            anomalies_detected: 0,
            optimization_suggestions: 12,
        }
    }
}

/// Assembled output of one health tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub threshold: f64,
    pub metrics: Section<MetricsSnapshot>,
    /// None when the snapshot could not be taken
    pub status: Option<SystemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Section<Prediction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictive_alert: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud: Option<Section<Vec<CloudProviderStatus>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scaling_triggered: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<VerboseFields>,
}

impl HealthReport {
    /// Returns true if any section carries a failure indicator
    pub fn is_degraded(&self) -> bool {
        self.metrics.is_failed()
            || self.prediction.as_ref().is_some_and(Section::is_failed)
            || self.cloud.as_ref().is_some_and(Section::is_failed)
    }

    pub fn snapshot(&self) -> Option<&MetricsSnapshot> {
        self.metrics.as_available()
    }
}

/// Emitted by each retraining tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrainEvent {
    pub timestamp: DateTime<Utc>,
    pub accuracy: f64,
    pub model_version: u64,
}

/// Emitted by each memory diagnostics tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryDiagnostic {
    pub timestamp: DateTime<Utc>,
    /// Resident set size of the monitor process
    pub rss_bytes: u64,
    /// Virtual memory of the monitor process
    pub heap_used_bytes: u64,
}

/// Emitted once when the prediction model is loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelLoadedEvent {
    pub timestamp: DateTime<Utc>,
    pub model_path: String,
}

/// Everything the monitor hands to a report sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ReportEvent {
    HealthReport(HealthReport),
    Retrain(RetrainEvent),
    MemoryDiagnostic(MemoryDiagnostic),
    ModelLoaded(ModelLoadedEvent),
}

impl ReportEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ReportEvent::HealthReport(_) => "health_report",
            ReportEvent::Retrain(_) => "retrain",
            ReportEvent::MemoryDiagnostic(_) => "memory_diagnostic",
            ReportEvent::ModelLoaded(_) => "model_loaded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_section_serializes_reason() {
        let section: Section<MetricsSnapshot> = Section::failed("collector unreachable");
        let json = serde_json::to_value(&section).unwrap();

        assert_eq!(json["state"], "failed");
        assert_eq!(json["data"]["reason"], "collector unreachable");
    }

    #[test]
    fn test_cloud_section_serializes_list() {
        let section = Section::Available(vec![CloudProviderStatus {
            provider: "aws".to_string(),
            instances: 7,
            load_percent: 42.0,
            health: CloudHealth::Healthy,
        }]);
        let json = serde_json::to_value(&section).unwrap();

        assert_eq!(json["state"], "available");
        assert_eq!(json["data"][0]["health"], "HEALTHY");
    }

    #[test]
    fn test_report_event_tagged() {
        let event = ReportEvent::Retrain(RetrainEvent {
            timestamp: Utc::now(),
            accuracy: 94.7,
            model_version: 2,
        });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "retrain");
        assert_eq!(json["model_version"], 2);
        assert_eq!(event.kind(), "retrain");
    }

    #[test]
    fn test_optional_report_fields_omitted() {
        let report = HealthReport {
            timestamp: Utc::now(),
            threshold: 80.0,
            metrics: Section::Available(MetricsSnapshot::new(10.0, 20.0, 30.0)),
            status: Some(SystemStatus::Optimal),
            ai_analysis: None,
            prediction: None,
            predictive_alert: None,
            cloud: None,
            auto_scaling_triggered: None,
            debug: None,
            verbose: None,
        };
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "OPTIMAL");
        assert!(json.get("prediction").is_none());
        assert!(json.get("cloud").is_none());
        assert!(json.get("debug").is_none());
        assert!(!report.is_degraded());
    }

    #[test]
    fn test_failed_prediction_marks_degraded() {
        let report = HealthReport {
            timestamp: Utc::now(),
            threshold: 80.0,
            metrics: Section::Available(MetricsSnapshot::new(10.0, 20.0, 30.0)),
            status: Some(SystemStatus::Optimal),
            ai_analysis: Some(AiAnalysis::default()),
            prediction: Some(Section::failed("engine timed out")),
            predictive_alert: None,
            cloud: Some(Section::Available(vec![])),
            auto_scaling_triggered: Some(false),
            debug: None,
            verbose: None,
        };

        assert!(report.is_degraded());
    }

    #[test]
    fn test_section_from_result() {
        let ok: Section<u32> = Ok::<_, std::fmt::Error>(3).into();
        assert_eq!(ok.as_available(), Some(&3));

        let err: Section<u32> = Err::<u32, _>(std::fmt::Error).into();
        assert!(err.is_failed());
    }
}
