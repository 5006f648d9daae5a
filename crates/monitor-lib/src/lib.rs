//! Health monitoring library
//!
//! This crate provides the core functionality for:
//! - Sampling CPU, memory and disk readings
//! - Threshold alert evaluation
//! - Simulated predictive analytics and model retraining
//! - Simulated multi-cloud fleet status
//! - Scheduling of the health, retraining and memory diagnostics ticks
//! - Health checks and observability

pub mod alert;
pub mod cloud;
pub mod collector;
pub mod diagnostics;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod scheduler;
pub mod sink;

pub use error::{MonitorError, MonitorResult};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{MonitorMetrics, StructuredLogger};
pub use scheduler::{AiFeatures, MonitorConfig, MonitorHandle, MonitorMode, MonitorScheduler};
