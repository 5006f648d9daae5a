//! Health Monitor - periodic system health reporting
//!
//! Samples CPU, memory and disk on a fixed interval, raises threshold alerts
//! and, when AI features are enabled, adds forecasts and cloud fleet status.

use anyhow::Result;
use monitor_lib::{
    collector::create_source,
    health::HealthRegistry,
    observability::{MonitorMetrics, StructuredLogger},
    sink::{FanoutSink, LatestReport, LogSink},
    MonitorScheduler,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const MONITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration is read first so verbose logging can pick the filter
    let (config, load_error) = match config::AgentConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (config::AgentConfig::default(), Some(e)),
    };

    let default_filter = if config.verbose_logging { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(fmt::layer().json())
        .init();

    if let Some(e) = load_error {
        warn!(error = %e, "Invalid configuration, using defaults");
    }

    info!("Starting health-monitor");

    let monitor_config = config.to_monitor_config();
    let logger = StructuredLogger::new(&config.instance_name);
    logger.log_startup(
        MONITOR_VERSION,
        &monitor_config.mode().to_string(),
        monitor_config.interval.as_millis() as u64,
    );

    let health_registry = HealthRegistry::new();
    let metrics = MonitorMetrics::new();
    let latest = LatestReport::new();

    let sink = FanoutSink::new()
        .with(Arc::new(LogSink::new(logger.clone())))
        .with(Arc::new(latest.clone()));

    let scheduler = MonitorScheduler::builder(monitor_config)
        .metrics_source(create_source(config.metrics_source_kind()))
        .sink(Arc::new(sink))
        .health_registry(health_registry.clone())
        .logger(logger.clone())
        .build();

    // Probes answer not-ready until the scheduler has started
    let app_state = Arc::new(api::AppState::new(health_registry, metrics, latest));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    let handle = scheduler.start().await;
    info!(tasks = ?handle.task_names(), "Monitor running");

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    handle.stop().await;
    api_handle.abort();
    info!("Shutting down");

    Ok(())
}
