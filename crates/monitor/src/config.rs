//! Monitor configuration loading

use anyhow::Result;
use monitor_lib::{
    collector::MetricsSourceKind,
    predictor::{DEFAULT_MODEL_PATH, DEFAULT_PREDICTIVE_WINDOW},
    scheduler::{DEFAULT_COLLABORATOR_TIMEOUT, DEFAULT_DEBUG_PORT, DEFAULT_INTERVAL},
    AiFeatures, MonitorConfig,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

/// Environment variable naming an optional configuration file
const CONFIG_FILE_ENV: &str = "MONITOR_CONFIG_FILE";

/// Flat configuration as read from the environment and config file
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Instance name attached to every log line
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Health check interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,

    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default)]
    pub verbose_logging: bool,

    #[serde(default)]
    pub ai_enabled: bool,

    /// Forecast horizon in seconds, only read when AI is enabled
    #[serde(default)]
    pub predictive_window_secs: Option<u64>,

    /// Only read when AI is enabled
    #[serde(default)]
    pub ml_model_path: Option<String>,

    /// Only read when AI is enabled
    #[serde(default)]
    pub cloud_providers: Vec<String>,

    #[serde(default = "default_debug_port")]
    pub debug_port: u16,

    /// Time budget for each collaborator call in milliseconds
    #[serde(default = "default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,

    /// "simulated" or "system"
    #[serde(default = "default_metrics_source")]
    pub metrics_source: String,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "health-monitor".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL.as_millis() as u64
}

fn default_alert_threshold() -> f64 {
    80.0
}

fn default_debug_port() -> u16 {
    DEFAULT_DEBUG_PORT
}

fn default_collaborator_timeout_ms() -> u64 {
    DEFAULT_COLLABORATOR_TIMEOUT.as_millis() as u64
}

fn default_metrics_source() -> String {
    "simulated".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            interval_ms: default_interval_ms(),
            alert_threshold: default_alert_threshold(),
            debug_mode: false,
            verbose_logging: false,
            ai_enabled: false,
            predictive_window_secs: None,
            ml_model_path: None,
            cloud_providers: Vec::new(),
            debug_port: default_debug_port(),
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
            metrics_source: default_metrics_source(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from the optional config file and the environment.
    /// Environment variables use the `MONITOR_` prefix and override the file.
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(config::File::with_name(&path).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("MONITOR")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cloud_providers"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Which metrics source to sample from; unknown names fall back to simulated
    pub fn metrics_source_kind(&self) -> MetricsSourceKind {
        self.metrics_source.parse().unwrap_or_else(|e| {
            warn!(error = %e, "Unknown metrics source, using simulated");
            MetricsSourceKind::Simulated
        })
    }

    /// Build the typed monitor configuration.
    /// AI settings are dropped entirely when AI is disabled.
    pub fn to_monitor_config(&self) -> MonitorConfig {
        let ai = if self.ai_enabled {
            AiFeatures::Enabled {
                predictive_window: self
                    .predictive_window_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_PREDICTIVE_WINDOW),
                model_path: self
                    .ml_model_path
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
                cloud_providers: self
                    .cloud_providers
                    .iter()
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect(),
            }
        } else {
            AiFeatures::Disabled
        };

        MonitorConfig {
            interval: Duration::from_millis(self.interval_ms),
            alert_threshold: self.alert_threshold,
            debug_mode: self.debug_mode,
            verbose_logging: self.verbose_logging,
            debug_port: self.debug_port,
            collaborator_timeout: Duration::from_millis(self.collaborator_timeout_ms),
            ai,
        }
        .normalized()
    }
}
