//! Host readings via sysinfo
//!
//! sysinfo refreshes are blocking syscalls, so every read runs on the
//! blocking pool through [`run_blocking`].

use super::{async_trait, clamp_percent, run_blocking, MetricsSource};
use crate::error::{MonitorError, MonitorResult};
use crate::models::MetricsSnapshot;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::{Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::debug;

struct HostState {
    system: System,
    cpu_refreshed_at: Instant,
}

struct HostReader {
    state: Mutex<HostState>,
    disks: Mutex<Disks>,
}

impl HostReader {
    fn read(&self) -> MonitorResult<MetricsSnapshot> {
        let (cpu, memory) = {
            let mut state = self
                .state
                .lock()
                .map_err(|e| MonitorError::Sampling(format!("Lock poisoned: {}", e)))?;

            // CPU usage is a delta between refreshes and is meaningless
            // until the minimum interval has passed since the previous one
            let since_last = state.cpu_refreshed_at.elapsed();
            if since_last < MINIMUM_CPU_UPDATE_INTERVAL {
                std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL - since_last);
            }
            state.system.refresh_cpu();
            state.cpu_refreshed_at = Instant::now();
            state.system.refresh_memory();

            let total = state.system.total_memory();
            if total == 0 {
                return Err(MonitorError::Sampling(
                    "host reported zero total memory".to_string(),
                ));
            }

            let cpu = state.system.global_cpu_info().cpu_usage() as f64;
            let memory = state.system.used_memory() as f64 / total as f64 * 100.0;
            (cpu, memory)
        };

        let disk = {
            let mut disks = self
                .disks
                .lock()
                .map_err(|e| MonitorError::Sampling(format!("Lock poisoned: {}", e)))?;
            disks.refresh();

            let (total, available) = disks.list().iter().fold((0u64, 0u64), |acc, d| {
                (acc.0 + d.total_space(), acc.1 + d.available_space())
            });

            if total == 0 {
                debug!("No disks reported, disk usage recorded as 0");
                0.0
            } else {
                total.saturating_sub(available) as f64 / total as f64 * 100.0
            }
        };

        Ok(MetricsSnapshot::new(
            clamp_percent(cpu),
            clamp_percent(memory),
            clamp_percent(disk),
        ))
    }
}

/// Reads global CPU, memory and disk usage of the host.
///
/// The first sample waits until sysinfo's minimum CPU update interval has
/// passed since construction, so its CPU reading is a real delta.
pub struct SystemMetricsSource {
    reader: Arc<HostReader>,
}

impl SystemMetricsSource {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();

        Self {
            reader: Arc::new(HostReader {
                state: Mutex::new(HostState {
                    system,
                    cpu_refreshed_at: Instant::now(),
                }),
                disks: Mutex::new(Disks::new_with_refreshed_list()),
            }),
        }
    }
}

impl Default for SystemMetricsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsSource for SystemMetricsSource {
    async fn sample(&self) -> MonitorResult<MetricsSnapshot> {
        let reader = self.reader.clone();
        run_blocking("host metrics", move || reader.read()).await
    }

    fn name(&self) -> &'static str {
        "system"
    }
}
