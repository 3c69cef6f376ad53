use std::sync::Mutex;
use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use sysinfo::{Pid, System};

#[derive(Debug, Clone)]
pub struct RunStats {
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub phase_time: Duration,
    pub elapsed_time: Duration,
}

/// 記錄每個階段的耗時與記憶體用量
pub struct RunMonitor {
    enabled: bool,
    start_time: Instant,
    phase_start: Mutex<Instant>,
    #[cfg(feature = "cli")]
    probe: Option<MemoryProbe>,
    peak_memory: Mutex<u64>,
}

#[cfg(feature = "cli")]
struct MemoryProbe {
    system: Mutex<System>,
    pid: Pid,
}

#[cfg(feature = "cli")]
impl MemoryProbe {
    fn new() -> Option<Self> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut system = System::new();
        system.refresh_all();
        Some(Self {
            system: Mutex::new(system),
            pid,
        })
    }

    fn memory_mb(&self) -> Option<u64> {
        let mut system = self.system.lock().ok()?;
        system.refresh_all();
        let process = system.process(self.pid)?;
        Some(process.memory() / 1024 / 1024)
    }
}

impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        Self {
            enabled,
            start_time: now,
            phase_start: Mutex::new(now),
            #[cfg(feature = "cli")]
            probe: if enabled { MemoryProbe::new() } else { None },
            peak_memory: Mutex::new(0),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[cfg(feature = "cli")]
    fn current_memory_mb(&self) -> u64 {
        self.probe
            .as_ref()
            .and_then(MemoryProbe::memory_mb)
            .unwrap_or(0)
    }

    #[cfg(not(feature = "cli"))]
    fn current_memory_mb(&self) -> u64 {
        0
    }

    /// Closes the current phase and starts timing the next one.
    pub fn finish_phase(&self) -> Option<RunStats> {
        if !self.enabled {
            return None;
        }

        let now = Instant::now();
        let phase_time = {
            let mut start = self.phase_start.lock().ok()?;
            let elapsed = now.duration_since(*start);
            *start = now;
            elapsed
        };

        let memory_mb = self.current_memory_mb();
        let peak_memory_mb = {
            let mut peak = self.peak_memory.lock().ok()?;
            if memory_mb > *peak {
                *peak = memory_mb;
            }
            *peak
        };

        Some(RunStats {
            memory_usage_mb: memory_mb,
            peak_memory_mb,
            phase_time,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.finish_phase() {
            tracing::info!(
                "📊 {} - Memory: {}MB, Peak: {}MB, Phase: {:?}, Total: {:?}",
                phase,
                stats.memory_usage_mb,
                stats.peak_memory_mb,
                stats.phase_time,
                stats.elapsed_time
            );
        }
    }

    pub fn log_final_stats(&self) {
        if !self.enabled {
            return;
        }
        let peak = self.peak_memory.lock().map(|p| *p).unwrap_or(0);
        tracing::info!(
            "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
            self.start_time.elapsed(),
            peak
        );
    }
}

impl Default for RunMonitor {
    fn default() -> Self {
        Self::disabled()
    }
}
