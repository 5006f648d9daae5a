//! Monitor scheduling
//!
//! Composes the health tick pipeline with the retraining and memory
//! diagnostics tasks under one start/stop lifecycle.

mod check;
mod config;
mod monitor;

pub use check::HealthCheck;
pub use config::{
    AiFeatures, MonitorConfig, MonitorMode, DEFAULT_COLLABORATOR_TIMEOUT, DEFAULT_DEBUG_PORT,
    DEFAULT_INTERVAL,
};
pub use monitor::{MonitorHandle, MonitorScheduler, MonitorSchedulerBuilder};
