// Metric samplers via sysinfo: one per metric kind, each owning its own sysinfo handle.
// Blocking sysinfo calls run on the blocking pool.

mod cpu;
mod disk;
mod linux;
mod memory;
mod network;

use std::time::Duration;

use futures_util::future::BoxFuture;
use sysinfo::System;
use tracing::instrument;

use crate::error::CollectionError;
use crate::models::{HostInfo, MetricKind, Sample};

pub use cpu::CpuSampler;
pub use disk::DiskSampler;
pub use memory::MemorySampler;
pub use network::NetworkSampler;

/// How a sampler paces its loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleTiming {
    /// The loop waits one interval, then samples.
    Interval,
    /// The sample call itself measures over the interval; the loop must not wait again.
    MeasurementWindow,
}

/// Point-in-time reading of one metric kind.
pub trait MetricSampler: Send {
    fn kind(&self) -> MetricKind;

    fn timing(&self) -> SampleTiming {
        SampleTiming::Interval
    }

    /// `window` is the loop interval; only `MeasurementWindow` samplers consume it.
    fn sample(&mut self, window: Duration) -> BoxFuture<'_, Result<Sample, CollectionError>>;
}

/// CPU, memory, network and disk samplers backed by the host OS.
pub fn system_samplers() -> Vec<Box<dyn MetricSampler>> {
    vec![
        Box::new(CpuSampler::new()),
        Box::new(MemorySampler::new()),
        Box::new(NetworkSampler::new()),
        Box::new(DiskSampler::new()),
    ]
}

#[instrument(fields(repo = "sysinfo", operation = "host_info"))]
pub async fn host_info() -> Result<HostInfo, CollectionError> {
    run_blocking(|| {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();
        let processor_name = linux::read_cpu_model_linux()
            .or_else(|| {
                sys.cpus()
                    .first()
                    .map(|c| c.brand().trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| "Unknown".into());
        Ok(HostInfo {
            os_name: System::name().unwrap_or_else(|| std::env::consts::OS.into()),
            os_version: System::os_version().unwrap_or_default(),
            os_distribution: linux::read_os_distribution_linux().unwrap_or_default(),
            host_name: System::host_name().unwrap_or_default(),
            processor_name,
            logical_cores: sys.cpus().len() as u32,
            physical_cores: System::physical_core_count().unwrap_or(0) as u32,
            memory_total: sys.total_memory(),
            boot_time: System::boot_time(),
        })
    })
    .await
}

/// Runs a blocking sysinfo call on the blocking pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, CollectionError>
where
    F: FnOnce() -> Result<T, CollectionError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CollectionError::Join(e.to_string()))?
}

pub(crate) fn lock_poisoned<E: std::fmt::Display>(e: E) -> CollectionError {
    CollectionError::LockPoisoned(e.to_string())
}

/// Wall-clock Unix milliseconds (0 if the clock is before the epoch).
pub fn timestamp_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                operation = "get_timestamp",
                "system time error"
            );
            0
        })
}
