//! Scheduler cadence scenarios
//!
//! These tests run on a paused tokio clock, so two minutes of monitoring
//! complete instantly and tick counts are exact.

use monitor_lib::{
    alert::AlertEvaluator,
    collector::MetricsSource,
    health::{components, ComponentStatus, HealthRegistry},
    models::{MetricsSnapshot, ReportEvent, Section, SystemStatus},
    sink::ChannelSink,
    AiFeatures, MonitorConfig, MonitorError, MonitorResult, MonitorScheduler,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, Default)]
struct EventCounts {
    health: usize,
    retrain: usize,
    memory: usize,
    model_loaded: usize,
}

fn drain(rx: &mut mpsc::Receiver<ReportEvent>) -> Vec<ReportEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn count(events: &[ReportEvent]) -> EventCounts {
    let mut counts = EventCounts::default();
    for event in events {
        match event {
            ReportEvent::HealthReport(_) => counts.health += 1,
            ReportEvent::Retrain(_) => counts.retrain += 1,
            ReportEvent::MemoryDiagnostic(_) => counts.memory += 1,
            ReportEvent::ModelLoaded(_) => counts.model_loaded += 1,
        }
    }
    counts
}

fn ai_config(providers: &[&str], window_secs: u64) -> MonitorConfig {
    MonitorConfig {
        ai: AiFeatures::Enabled {
            predictive_window: Duration::from_secs(window_secs),
            model_path: "./models/anomaly-detection.h5".to_string(),
            cloud_providers: providers.iter().map(|s| s.to_string()).collect(),
        },
        ..Default::default()
    }
}

/// Fails every other sample
struct FlakySource {
    calls: AtomicUsize,
}

#[async_trait]
impl MetricsSource for FlakySource {
    async fn sample(&self) -> MonitorResult<MetricsSnapshot> {
        if self.calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
            Err(MonitorError::Sampling("collector unreachable".to_string()))
        } else {
            Ok(MetricsSnapshot::new(10.0, 20.0, 30.0))
        }
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

/// Panics on the first sample only
struct PanicOnceSource {
    calls: AtomicUsize,
}

#[async_trait]
impl MetricsSource for PanicOnceSource {
    async fn sample(&self) -> MonitorResult<MetricsSnapshot> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("sensor driver crashed");
        }
        Ok(MetricsSnapshot::new(10.0, 20.0, 30.0))
    }

    fn name(&self) -> &'static str {
        "panic-once"
    }
}

/// Never produces a snapshot
struct DeadSource;

#[async_trait]
impl MetricsSource for DeadSource {
    async fn sample(&self) -> MonitorResult<MetricsSnapshot> {
        Err(MonitorError::Sampling("device removed".to_string()))
    }

    fn name(&self) -> &'static str {
        "dead"
    }
}

/// Takes longer than the tick interval
struct SlowSource {
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl MetricsSource for SlowSource {
    async fn sample(&self) -> MonitorResult<MetricsSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(MetricsSnapshot::new(1.0, 1.0, 1.0))
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

#[tokio::test(start_paused = true)]
async fn test_first_report_emitted_before_start_returns() {
    let (sink, mut rx) = ChannelSink::new(64);
    let handle = MonitorScheduler::builder(MonitorConfig::default())
        .sink(Arc::new(sink))
        .build()
        .start()
        .await;

    let events = drain(&mut rx);
    assert_eq!(count(&events).health, 1);

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_production_scenario() {
    let (sink, mut rx) = ChannelSink::new(256);
    let handle = MonitorScheduler::builder(MonitorConfig::default())
        .sink(Arc::new(sink))
        .build()
        .start()
        .await;
    assert_eq!(handle.task_names(), vec!["health"]);

    // Ticks at 0s, 60s, 120s and 180s
    tokio::time::sleep(Duration::from_secs(200)).await;
    handle.stop().await;

    let events = drain(&mut rx);
    let counts = count(&events);
    assert_eq!(counts.health, 4);
    assert_eq!(counts.retrain, 0);
    assert_eq!(counts.memory, 0);
    assert_eq!(counts.model_loaded, 0);

    for event in events {
        let ReportEvent::HealthReport(report) = event else {
            panic!("unexpected event");
        };
        let snapshot = report.snapshot().unwrap();
        for reading in snapshot.readings() {
            assert!((0.0..=100.0).contains(&reading));
        }
        assert_eq!(
            report.status,
            Some(AlertEvaluator::evaluate(&snapshot.readings(), 80.0))
        );
        assert!(report.prediction.is_none());
        assert!(report.cloud.is_none());
        assert!(report.debug.is_none());
        assert!(report.verbose.is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn test_ai_scenario() {
    let (sink, mut rx) = ChannelSink::new(256);
    let handle = MonitorScheduler::builder(ai_config(&["aws", "gcp"], 120))
        .sink(Arc::new(sink))
        .build()
        .start()
        .await;

    // The model is announced before the first report
    let startup = drain(&mut rx);
    assert!(matches!(startup[0], ReportEvent::ModelLoaded(ref e)
        if e.model_path == "./models/anomaly-detection.h5"));
    assert!(matches!(startup[1], ReportEvent::HealthReport(_)));

    tokio::time::sleep(Duration::from_secs(125)).await;
    let events = drain(&mut rx);
    let counts = count(&events);
    assert_eq!(counts.health, 2);
    assert_eq!(counts.retrain, 1);

    // Second retrain lands at 240s
    tokio::time::sleep(Duration::from_secs(120)).await;
    handle.stop().await;
    let later = drain(&mut rx);
    assert_eq!(count(&later).retrain, 1);

    let mut versions = Vec::new();
    for event in events.iter().chain(later.iter()) {
        match event {
            ReportEvent::HealthReport(report) => {
                let prediction = report.prediction.as_ref().unwrap().as_available().unwrap();
                assert!((70.0..=100.0).contains(&prediction.confidence));
                assert_eq!(prediction.window_secs, 120);
                assert!(report.predictive_alert.is_some());

                let cloud = report.cloud.as_ref().unwrap().as_available().unwrap();
                let names: Vec<&str> = cloud.iter().map(|s| s.provider.as_str()).collect();
                assert_eq!(names, vec!["aws", "gcp"]);
            }
            ReportEvent::Retrain(retrain) => versions.push(retrain.model_version),
            _ => {}
        }
    }
    assert_eq!(versions, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn test_retrain_cadence_independent_of_interval() {
    let config = MonitorConfig {
        interval: Duration::from_millis(5_000),
        ..ai_config(&[], 300)
    };
    let (sink, mut rx) = ChannelSink::new(1024);
    let handle = MonitorScheduler::builder(config)
        .sink(Arc::new(sink))
        .build()
        .start()
        .await;

    tokio::time::sleep(Duration::from_secs(119)).await;
    assert_eq!(count(&drain(&mut rx)).retrain, 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    handle.stop().await;
    assert_eq!(count(&drain(&mut rx)).retrain, 1);
}

#[tokio::test(start_paused = true)]
async fn test_debug_scenario() {
    let config = MonitorConfig {
        interval: Duration::from_secs(600),
        debug_mode: true,
        ..Default::default()
    };
    let (sink, mut rx) = ChannelSink::new(256);
    let handle = MonitorScheduler::builder(config)
        .sink(Arc::new(sink))
        .build()
        .start()
        .await;
    assert_eq!(handle.task_names(), vec!["health", "memory"]);

    // Diagnostics at 30s, 60s and 90s
    tokio::time::sleep(Duration::from_secs(95)).await;
    handle.stop().await;

    let events = drain(&mut rx);
    let counts = count(&events);
    assert_eq!(counts.memory, 3);
    assert_eq!(counts.health, 1);
    assert_eq!(counts.retrain, 0);

    for event in events {
        if let ReportEvent::HealthReport(report) = event {
            assert!(report.debug.is_some());
            assert!(report.prediction.is_none());
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_ai_disabled_never_predicts_even_in_debug() {
    let config = MonitorConfig {
        interval: Duration::from_secs(10),
        debug_mode: true,
        verbose_logging: true,
        ..Default::default()
    };
    let (sink, mut rx) = ChannelSink::new(1024);
    let handle = MonitorScheduler::builder(config)
        .sink(Arc::new(sink))
        .build()
        .start()
        .await;

    tokio::time::sleep(Duration::from_secs(300)).await;
    handle.stop().await;

    let events = drain(&mut rx);
    let counts = count(&events);
    assert_eq!(counts.retrain, 0);
    assert_eq!(counts.model_loaded, 0);
    for event in events {
        if let ReportEvent::HealthReport(report) = event {
            assert!(report.prediction.is_none());
            assert!(report.cloud.is_none());
            assert_eq!(report.verbose.unwrap().next_check_in_ms, 10_000);
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_tick_does_not_stop_scheduler() {
    let config = MonitorConfig {
        interval: Duration::from_secs(10),
        ..Default::default()
    };
    let health = HealthRegistry::new();
    let (sink, mut rx) = ChannelSink::new(64);
    let handle = MonitorScheduler::builder(config)
        .metrics_source(Arc::new(FlakySource {
            calls: AtomicUsize::new(0),
        }))
        .health_registry(health.clone())
        .sink(Arc::new(sink))
        .build()
        .start()
        .await;

    // The first sample fails
    assert_eq!(
        health.health().await.components[components::METRICS_SOURCE].status,
        ComponentStatus::Degraded
    );
    assert!(health.readiness().await.ready);

    tokio::time::sleep(Duration::from_secs(35)).await;
    handle.stop().await;

    let reports: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            ReportEvent::HealthReport(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(reports.len(), 4);

    for (i, report) in reports.iter().enumerate() {
        if i % 2 == 0 {
            assert!(report.is_degraded());
            assert!(report.status.is_none());
            assert!(matches!(report.metrics, Section::Failed { .. }));
        } else {
            assert_eq!(report.status, Some(SystemStatus::Optimal));
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_panicking_source_degrades_tick() {
    let config = MonitorConfig {
        interval: Duration::from_secs(10),
        ..Default::default()
    };
    let (sink, mut rx) = ChannelSink::new(64);
    let handle = MonitorScheduler::builder(config)
        .metrics_source(Arc::new(PanicOnceSource {
            calls: AtomicUsize::new(0),
        }))
        .sink(Arc::new(sink))
        .build()
        .start()
        .await;

    tokio::time::sleep(Duration::from_secs(25)).await;
    handle.stop().await;

    let reports: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter_map(|e| match e {
            ReportEvent::HealthReport(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(reports.len(), 3);

    assert!(reports[0].is_degraded());
    assert!(reports[0].status.is_none());
    assert!(matches!(
        &reports[0].metrics,
        Section::Failed { reason } if reason.contains("aborted")
    ));
    for report in &reports[1..] {
        assert_eq!(report.status, Some(SystemStatus::Optimal));
    }
}

#[tokio::test(start_paused = true)]
async fn test_persistent_sampling_failure_marks_source_unhealthy() {
    let config = MonitorConfig {
        interval: Duration::from_secs(10),
        ..Default::default()
    };
    let health = HealthRegistry::new();
    let (sink, _rx) = ChannelSink::new(64);
    let handle = MonitorScheduler::builder(config)
        .metrics_source(Arc::new(DeadSource))
        .health_registry(health.clone())
        .sink(Arc::new(sink))
        .build()
        .start()
        .await;

    // One failure degrades but keeps the monitor ready
    assert!(health.readiness().await.ready);

    // Failures at 0s, 10s and 20s
    tokio::time::sleep(Duration::from_secs(25)).await;

    let component = &health.health().await.components[components::METRICS_SOURCE];
    assert_eq!(component.status, ComponentStatus::Unhealthy);
    assert!(component
        .message
        .as_deref()
        .is_some_and(|m| m.contains("device removed")));

    let readiness = health.readiness().await;
    assert!(!readiness.ready);
    assert_eq!(readiness.reason.as_deref(), Some("Component unhealthy"));

    handle.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_ticks_are_dropped() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = MonitorConfig {
        interval: Duration::from_secs(10),
        collaborator_timeout: Duration::from_secs(60),
        ..Default::default()
    };
    let (sink, mut rx) = ChannelSink::new(64);
    let handle = MonitorScheduler::builder(config)
        .metrics_source(Arc::new(SlowSource {
            delay: Duration::from_secs(15),
            calls: calls.clone(),
        }))
        .sink(Arc::new(sink))
        .build()
        .start()
        .await;

    // Startup tick runs 0-15s, so the 10s deadline is dropped and the next
    // tick starts at 20s, finishing at 35s. The 30s deadline is dropped too.
    tokio::time::sleep(Duration::from_secs(39)).await;
    handle.stop().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(count(&drain(&mut rx)).health, 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_waits_for_tick_in_progress() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = MonitorConfig {
        interval: Duration::from_secs(10),
        collaborator_timeout: Duration::from_secs(60),
        ..Default::default()
    };
    let (sink, mut rx) = ChannelSink::new(64);
    let source = Arc::new(SlowSource {
        delay: Duration::from_secs(5),
        calls: calls.clone(),
    });
    let handle = MonitorScheduler::builder(config)
        .metrics_source(source)
        .sink(Arc::new(sink))
        .build()
        .start()
        .await;
    assert_eq!(count(&drain(&mut rx)).health, 1);

    // Second tick starts at 10s and is mid-sample at 12s
    tokio::time::sleep(Duration::from_secs(7)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    handle.stop().await;
    assert_eq!(count(&drain(&mut rx)).health, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
