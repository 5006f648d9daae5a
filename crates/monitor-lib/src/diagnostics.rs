//! Process memory diagnostics for debug mode

use crate::collector::run_blocking;
use crate::error::{MonitorError, MonitorResult};
use crate::models::MemoryDiagnostic;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysinfo::{Pid, System};

/// Fixed memory diagnostics cadence (30 seconds)
pub const MEMORY_DIAGNOSTIC_INTERVAL: Duration = Duration::from_secs(30);

/// Reads resident and virtual memory of the monitor process
#[derive(Clone)]
pub struct MemoryProbe {
    system: Arc<Mutex<System>>,
    pid: Pid,
}

impl MemoryProbe {
    pub fn new() -> Self {
        Self {
            system: Arc::new(Mutex::new(System::new())),
            pid: Pid::from_u32(std::process::id()),
        }
    }

    /// Take one memory reading off the runtime thread.
    /// A process that cannot be read reports zeros.
    pub async fn sample(&self) -> MonitorResult<MemoryDiagnostic> {
        let system = self.system.clone();
        let pid = self.pid;

        run_blocking("process memory", move || {
            let mut system = system
                .lock()
                .map_err(|e| MonitorError::Sampling(format!("Lock poisoned: {}", e)))?;
            system.refresh_process(pid);

            let (rss_bytes, heap_used_bytes) = system
                .process(pid)
                .map(|process| (process.memory(), process.virtual_memory()))
                .unwrap_or((0, 0));

            Ok(MemoryDiagnostic {
                timestamp: Utc::now(),
                rss_bytes,
                heap_used_bytes,
            })
        })
        .await
    }
}

impl Default for MemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a byte count as mebibytes with two decimals
pub fn format_mib(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0)
}
