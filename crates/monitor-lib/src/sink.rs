//! Report sinks
//!
//! A sink receives every event the monitor produces. Delivery never blocks a
//! tick: sinks either complete immediately or report an error, which the
//! scheduler logs and counts.

use crate::error::{MonitorError, MonitorResult};
use crate::models::{HealthReport, ReportEvent};
use crate::observability::StructuredLogger;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Trait for report delivery implementations
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn emit(&self, event: ReportEvent) -> MonitorResult<()>;
}

/// Writes every event as a structured log line
#[derive(Clone)]
pub struct LogSink {
    logger: StructuredLogger,
}

impl LogSink {
    pub fn new(logger: StructuredLogger) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl ReportSink for LogSink {
    async fn emit(&self, event: ReportEvent) -> MonitorResult<()> {
        match &event {
            ReportEvent::HealthReport(report) => self.logger.log_health_report(report),
            ReportEvent::Retrain(retrain) => self.logger.log_retrain(retrain),
            ReportEvent::MemoryDiagnostic(diagnostic) => self.logger.log_memory(diagnostic),
            ReportEvent::ModelLoaded(loaded) => self.logger.log_model_loaded(loaded),
        }
        Ok(())
    }
}

/// Forwards events to an mpsc channel without waiting for capacity
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<ReportEvent>,
}

impl ChannelSink {
    pub fn new(buffer_size: usize) -> (Self, mpsc::Receiver<ReportEvent>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ReportSink for ChannelSink {
    async fn emit(&self, event: ReportEvent) -> MonitorResult<()> {
        self.tx
            .try_send(event)
            .map_err(|e| MonitorError::Sink(format!("channel rejected event: {}", e)))
    }
}

/// Keeps the most recent health report for the HTTP endpoint
#[derive(Clone, Default)]
pub struct LatestReport {
    latest: Arc<RwLock<Option<HealthReport>>>,
}

impl LatestReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<HealthReport> {
        self.latest.read().await.clone()
    }
}

#[async_trait]
impl ReportSink for LatestReport {
    async fn emit(&self, event: ReportEvent) -> MonitorResult<()> {
        if let ReportEvent::HealthReport(report) = event {
            *self.latest.write().await = Some(report);
        }
        Ok(())
    }
}

/// Delivers every event to each inner sink in order
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ReportSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl ReportSink for FanoutSink {
    /// All sinks are attempted; the first error is returned
    async fn emit(&self, event: ReportEvent) -> MonitorResult<()> {
        let mut first_error = None;

        for sink in &self.sinks {
            if let Err(e) = sink.emit(event.clone()).await {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
