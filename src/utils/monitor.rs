use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub phase: String,
    pub elapsed: Duration,
    pub memory_usage_mb: Option<u64>,
    pub cpu_usage: Option<f32>,
}

/// Per-phase timing and process resource sampling for a harvest run.
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    start_time: Instant,
    last_mark: Mutex<Instant>,
    peak_memory_mb: Mutex<u64>,
    phases: Mutex<Vec<PhaseStats>>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let mut system = System::new_with_specifics(RefreshKind::everything());
        let pid = sysinfo::get_current_pid().ok();
        if enabled {
            system.refresh_all();
        }

        let now = Instant::now();
        Self {
            system: Mutex::new(system),
            pid,
            start_time: now,
            last_mark: Mutex::new(now),
            peak_memory_mb: Mutex::new(0),
            phases: Mutex::new(Vec::new()),
            enabled,
        }
    }

    fn sample(&self) -> (Option<u64>, Option<f32>) {
        let (Some(pid), Ok(mut system)) = (self.pid, self.system.lock()) else {
            return (None, None);
        };
        system.refresh_all();
        match system.process(pid) {
            Some(process) => (Some(process.memory() / 1024 / 1024), Some(process.cpu_usage())),
            None => (None, None),
        }
    }

    /// Closes the phase that started at the previous mark and logs it.
    pub fn log_stats(&self, phase: &str) {
        if !self.enabled {
            return;
        }

        let elapsed = match self.last_mark.lock() {
            Ok(mut mark) => {
                let elapsed = mark.elapsed();
                *mark = Instant::now();
                elapsed
            }
            Err(_) => return,
        };

        let (memory_usage_mb, cpu_usage) = self.sample();
        if let (Some(mb), Ok(mut peak)) = (memory_usage_mb, self.peak_memory_mb.lock()) {
            *peak = (*peak).max(mb);
        }

        tracing::info!(
            phase,
            elapsed_ms = elapsed.as_millis() as u64,
            memory_mb = memory_usage_mb,
            cpu = cpu_usage,
            "📊 phase finished"
        );

        if let Ok(mut phases) = self.phases.lock() {
            phases.push(PhaseStats {
                phase: phase.to_string(),
                elapsed,
                memory_usage_mb,
                cpu_usage,
            });
        }
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let peak = self.peak_memory_mb.lock().map(|p| *p).unwrap_or(0);
        tracing::info!(
            total_ms = self.start_time.elapsed().as_millis() as u64,
            peak_memory_mb = peak,
            "📊 harvest finished"
        );
    }

    pub fn phases(&self) -> Vec<PhaseStats> {
        self.phases.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// Without the cli feature only timings are kept.
#[cfg(not(feature = "cli"))]
pub struct SystemMonitor {
    start_time: Instant,
}

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self) {
        tracing::debug!(total_ms = self.start_time.elapsed().as_millis() as u64, "harvest finished");
    }

    pub fn phases(&self) -> Vec<PhaseStats> {
        Vec::new()
    }

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_records_nothing() {
        let monitor = SystemMonitor::new(false);
        monitor.log_stats("extract");
        assert!(monitor.phases().is_empty());
        assert!(!monitor.is_enabled());
    }

    #[test]
    fn test_enabled_monitor_records_phases_in_order() {
        let monitor = SystemMonitor::new(true);
        monitor.log_stats("extract");
        monitor.log_stats("transform");
        let phases: Vec<String> = monitor.phases().into_iter().map(|p| p.phase).collect();
        assert_eq!(phases, vec!["extract", "transform"]);
    }
}
