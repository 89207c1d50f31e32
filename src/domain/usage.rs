//! Per-container CPU and memory usage arithmetic.

use serde::Serialize;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Raw counters from a one-shot runtime stats sample.
///
/// The runtime reports two consecutive CPU samples (`pre*` is the earlier
/// one) so a percentage can be computed from the deltas.
#[derive(Debug, Clone, Default)]
pub struct StatsSample {
    pub cpu_total: u64,
    pub precpu_total: u64,
    pub system_cpu: u64,
    pub presystem_cpu: u64,
    pub online_cpus: u64,
    pub memory_usage: u64,
    pub memory_limit: u64,
}

/// Computed usage snapshot for one container.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ResourceUsage {
    pub cpu_percent: f64,
    pub memory_mib: f64,
    pub memory_percent: f64,
}

impl ResourceUsage {
    /// Compute percentages from raw counters.
    ///
    /// A zero system-CPU delta yields 0% CPU; a zero memory limit yields
    /// 0% memory. Both occur on freshly started containers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // counters are far below 2^52
    pub fn from_sample(sample: &StatsSample) -> Self {
        let cpu_delta = sample.cpu_total.saturating_sub(sample.precpu_total) as f64;
        let system_delta = sample.system_cpu.saturating_sub(sample.presystem_cpu) as f64;
        let cpus = sample.online_cpus.max(1) as f64;

        let cpu_percent = if system_delta > 0.0 {
            (cpu_delta / system_delta) * cpus * 100.0
        } else {
            0.0
        };

        let memory_percent = if sample.memory_limit > 0 {
            (sample.memory_usage as f64 / sample.memory_limit as f64) * 100.0
        } else {
            0.0
        };

        Self {
            cpu_percent,
            memory_mib: sample.memory_usage as f64 / BYTES_PER_MIB,
            memory_percent,
        }
    }
}
