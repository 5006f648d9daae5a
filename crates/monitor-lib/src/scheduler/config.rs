//! Monitor configuration
//!
//! Built once at startup and shared read-only with every task.

use crate::alert::DEFAULT_ALERT_THRESHOLD;
use crate::predictor::{DEFAULT_MODEL_PATH, DEFAULT_PREDICTIVE_WINDOW};
use std::time::Duration;
use tracing::warn;

/// Default health tick period (1 minute)
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Default time budget for one collaborator call
pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(5);

/// Default debugger port reported in debug mode
pub const DEFAULT_DEBUG_PORT: u16 = 9229;

/// Predictive analytics and fleet reporting settings
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AiFeatures {
    #[default]
    Disabled,
    Enabled {
        /// How far ahead forecasts look
        predictive_window: Duration,
        /// Model identifier reported when the engine loads
        model_path: String,
        /// Providers probed on every health tick, in order
        cloud_providers: Vec<String>,
    },
}

impl AiFeatures {
    /// Enabled with the default window and model path and no providers
    pub fn enabled() -> Self {
        AiFeatures::Enabled {
            predictive_window: DEFAULT_PREDICTIVE_WINDOW,
            model_path: DEFAULT_MODEL_PATH.to_string(),
            cloud_providers: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, AiFeatures::Enabled { .. })
    }

    pub fn model_path(&self) -> Option<&str> {
        match self {
            AiFeatures::Enabled { model_path, .. } => Some(model_path),
            AiFeatures::Disabled => None,
        }
    }
}

/// Operating mode announced at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorMode {
    Production,
    Development,
    AiExperimental,
}

impl std::fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorMode::Production => write!(f, "Production"),
            MonitorMode::Development => write!(f, "Development"),
            MonitorMode::AiExperimental => write!(f, "AI-Experimental"),
        }
    }
}

/// Immutable monitor configuration
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Health tick period
    pub interval: Duration,
    /// Percentage above which a reading raises a warning
    pub alert_threshold: f64,
    pub debug_mode: bool,
    pub verbose_logging: bool,
    /// Port reported in the debug fields
    pub debug_port: u16,
    /// Time budget for each sample, predict and probe call
    pub collaborator_timeout: Duration,
    pub ai: AiFeatures,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            alert_threshold: DEFAULT_ALERT_THRESHOLD,
            debug_mode: false,
            verbose_logging: false,
            debug_port: DEFAULT_DEBUG_PORT,
            collaborator_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
            ai: AiFeatures::Disabled,
        }
    }
}

impl MonitorConfig {
    /// AI wins over debug mode
    pub fn mode(&self) -> MonitorMode {
        if self.ai.is_enabled() {
            MonitorMode::AiExperimental
        } else if self.debug_mode {
            MonitorMode::Development
        } else {
            MonitorMode::Production
        }
    }

    /// Replace values that cannot drive a scheduler with their defaults.
    /// Nothing here fails; each replacement is logged.
    pub fn normalized(mut self) -> Self {
        if self.interval.is_zero() {
            warn!(
                default_ms = DEFAULT_INTERVAL.as_millis() as u64,
                "Zero interval configured, using default"
            );
            self.interval = DEFAULT_INTERVAL;
        }

        if !self.alert_threshold.is_finite() {
            warn!(
                default = DEFAULT_ALERT_THRESHOLD,
                "Non-finite alert threshold configured, using default"
            );
            self.alert_threshold = DEFAULT_ALERT_THRESHOLD;
        } else if !(0.0..=100.0).contains(&self.alert_threshold) {
            let clamped = self.alert_threshold.clamp(0.0, 100.0);
            warn!(
                configured = self.alert_threshold,
                clamped = clamped,
                "Alert threshold outside 0-100, clamping"
            );
            self.alert_threshold = clamped;
        }

        if self.collaborator_timeout.is_zero() {
            self.collaborator_timeout = DEFAULT_COLLABORATOR_TIMEOUT;
        }

        if let AiFeatures::Enabled {
            predictive_window, ..
        } = &mut self.ai
        {
            if predictive_window.is_zero() {
                *predictive_window = DEFAULT_PREDICTIVE_WINDOW;
            }
        }

        self
    }
}
