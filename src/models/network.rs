// Network throughput model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSample {
    pub timestamp: u64,
    pub upload_bytes_per_sec: f64,
    pub download_bytes_per_sec: f64,
    /// Cumulative counters summed over all interfaces.
    pub total_sent: u64,
    pub total_recv: u64,
    /// Interfaces holding at least one non-loopback IPv4 address.
    pub active_interfaces: Vec<String>,
}
