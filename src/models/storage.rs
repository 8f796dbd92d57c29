// Disk / partition models

use serde::{Deserialize, Serialize};

use super::BYTES_PER_GB;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionUsage {
    pub device: String,
    pub mount_point: String,
    pub usage_percent: f64,
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

impl PartitionUsage {
    pub fn total_gb(&self) -> f64 {
        self.total as f64 / BYTES_PER_GB
    }

    pub fn used_gb(&self) -> f64 {
        self.used as f64 / BYTES_PER_GB
    }

    pub fn free_gb(&self) -> f64 {
        self.free as f64 / BYTES_PER_GB
    }
}

/// One sweep over the mounted partitions. Unreadable partitions are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskSample {
    pub timestamp: u64,
    pub partitions: Vec<PartitionUsage>,
}
