// Domain models: samples per metric kind, host identity, summary

mod network;
mod storage;
mod summary;
mod system;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use network::NetworkSample;
pub use storage::{DiskSample, PartitionUsage};
pub use summary::{MetricStats, MonitorSummary, RuntimeStats};
pub use system::{CpuSample, HostInfo, MemorySample};

pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Metric kinds; each one gets its own sampler, sampling loop and history buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Cpu,
    Memory,
    Network,
    Disk,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Cpu,
        MetricKind::Memory,
        MetricKind::Network,
        MetricKind::Disk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Memory => "memory",
            MetricKind::Network => "network",
            MetricKind::Disk => "disk",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped reading. Timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Sample {
    Cpu(CpuSample),
    Memory(MemorySample),
    Network(NetworkSample),
    Disk(DiskSample),
}

impl Sample {
    pub fn kind(&self) -> MetricKind {
        match self {
            Sample::Cpu(_) => MetricKind::Cpu,
            Sample::Memory(_) => MetricKind::Memory,
            Sample::Network(_) => MetricKind::Network,
            Sample::Disk(_) => MetricKind::Disk,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Sample::Cpu(s) => s.timestamp,
            Sample::Memory(s) => s.timestamp,
            Sample::Network(s) => s.timestamp,
            Sample::Disk(s) => s.timestamp,
        }
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        match self {
            Sample::Cpu(s) => s.timestamp = timestamp,
            Sample::Memory(s) => s.timestamp = timestamp,
            Sample::Network(s) => s.timestamp = timestamp,
            Sample::Disk(s) => s.timestamp = timestamp,
        }
    }

    /// Values that feed min/max/average in the summary.
    /// Network contributes combined throughput; disk contributes one value per partition.
    pub fn summary_values(&self) -> Vec<f64> {
        match self {
            Sample::Cpu(s) => vec![s.usage_percent],
            Sample::Memory(s) => vec![s.usage_percent],
            Sample::Network(s) => vec![s.upload_bytes_per_sec + s.download_bytes_per_sec],
            Sample::Disk(s) => s.partitions.iter().map(|p| p.usage_percent).collect(),
        }
    }
}
