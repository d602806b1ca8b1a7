//! Resource Usage Monitoring
//!
//! Samples CPU and memory usage of the running analysis subprocess so the
//! job log ends with a usage summary the operator can compare against the
//! pre-flight request.

use std::time::{Duration, Instant};

use sysinfo::{Pid, ProcessRefreshKind, System};

/// A single usage sample of the observed process.
#[derive(Debug, Clone)]
pub struct ResourceSample {
    /// When this sample was taken
    pub timestamp: Instant,
    /// CPU usage percentage (0-100 per core)
    pub cpu_usage: f32,
    /// Resident memory in megabytes
    pub memory_mb: u64,
}

/// Tracks resource usage of a child process by pid.
///
/// The first call to [`sample`](ResourceMonitor::sample) only warms up the
/// CPU counters; real samples start with the second call and are rate
/// limited so a tight wait loop cannot flood the sample buffer.
#[derive(Debug)]
pub struct ResourceMonitor {
    system: System,
    process_id: Pid,
    samples: Vec<ResourceSample>,
    warmup_done: bool,
    last_sample: Option<Instant>,
    min_interval: Duration,
}

impl ResourceMonitor {
    /// Creates a monitor for the child process with the given pid.
    pub fn for_child(pid: u32) -> Self {
        Self {
            system: System::new(),
            process_id: Pid::from_u32(pid),
            samples: Vec::new(),
            warmup_done: false,
            last_sample: None,
            min_interval: Duration::from_millis(250),
        }
    }

    /// Takes a usage sample if the rate limit allows one.
    ///
    /// Sampling a process that has already exited records nothing, so the
    /// caller can keep sampling until the wait loop observes the exit.
    pub fn sample(&mut self) {
        let now = Instant::now();
        let refresh_kind = ProcessRefreshKind::new().with_cpu().with_memory();

        if !self.warmup_done {
            self.system.refresh_processes_specifics(refresh_kind);
            self.warmup_done = true;
            self.last_sample = Some(now);
            return;
        }

        if let Some(last) = self.last_sample {
            if now.duration_since(last) < self.min_interval {
                return;
            }
        }

        self.system.refresh_processes_specifics(refresh_kind);
        self.last_sample = Some(now);

        if let Some(process) = self.system.process(self.process_id) {
            self.samples.push(ResourceSample {
                timestamp: now,
                cpu_usage: process.cpu_usage(),
                memory_mb: process.memory() / (1024 * 1024),
            });
        }
    }

    /// Peak resident memory observed, in megabytes.
    pub fn peak_memory_mb(&self) -> u64 {
        self.samples.iter().map(|s| s.memory_mb).max().unwrap_or(0)
    }

    /// Mean CPU usage across all samples.
    pub fn average_cpu(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().map(|s| s.cpu_usage).sum::<f32>() / self.samples.len() as f32
    }

    /// All recorded samples.
    pub fn samples(&self) -> &[ResourceSample] {
        &self.samples
    }

    /// A human-readable usage summary for the job log.
    pub fn summary(&self) -> String {
        if self.samples.is_empty() {
            return "No resource data collected for the analysis process".to_string();
        }

        format!(
            "Analysis resource usage:\n  Average CPU: {:.1}%\n  Peak memory: {} MB\n  Samples: {}",
            self.average_cpu(),
            self.peak_memory_mb(),
            self.samples.len()
        )
    }
}
