// CPU, memory and host identity models

use serde::{Deserialize, Serialize};

use super::BYTES_PER_GB;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuSample {
    pub timestamp: u64,
    /// Average over the measurement window.
    pub usage_percent: f64,
    pub per_core_percent: Vec<f64>,
    pub logical_cores: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorySample {
    pub timestamp: u64,
    pub usage_percent: f64,
    pub total: u64,
    pub used: u64,
    pub available: u64,
}

impl MemorySample {
    pub fn total_gb(&self) -> f64 {
        self.total as f64 / BYTES_PER_GB
    }

    pub fn used_gb(&self) -> f64 {
        self.used as f64 / BYTES_PER_GB
    }

    pub fn available_gb(&self) -> f64 {
        self.available as f64 / BYTES_PER_GB
    }
}

/// Static host identity; fetched once at startup and logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub os_name: String,
    pub os_version: String,
    pub os_distribution: String,
    pub host_name: String,
    pub processor_name: String,
    pub logical_cores: u32,
    pub physical_cores: u32,
    pub memory_total: u64,
    /// Unix seconds.
    pub boot_time: u64,
}
