// CPU usage measured over a window: refresh, wait the window, refresh again.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use sysinfo::System;
use tracing::instrument;

use super::{MetricSampler, SampleTiming, lock_poisoned, run_blocking, timestamp_now};
use crate::error::CollectionError;
use crate::models::{CpuSample, MetricKind, Sample};

pub struct CpuSampler {
    sys: Arc<Mutex<System>>,
}

impl Default for CpuSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuSampler {
    pub fn new() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        Self {
            sys: Arc::new(Mutex::new(sys)),
        }
    }

    /// Blocks (asynchronously) for `window`, which is clamped up to the
    /// minimum interval sysinfo needs between two CPU refreshes.
    #[instrument(skip(self), fields(repo = "sysinfo", operation = "measure_cpu"))]
    pub async fn measure(&self, window: Duration) -> Result<CpuSample, CollectionError> {
        let sys = self.sys.clone();
        run_blocking(move || {
            sys.lock().map_err(lock_poisoned)?.refresh_cpu_all();
            Ok(())
        })
        .await?;

        tokio::time::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)).await;

        let sys = self.sys.clone();
        run_blocking(move || {
            let mut sys = sys.lock().map_err(lock_poisoned)?;
            sys.refresh_cpu_all();
            let per_core_percent: Vec<f64> =
                sys.cpus().iter().map(|c| c.cpu_usage() as f64).collect();
            if per_core_percent.is_empty() {
                return Err(CollectionError::Query {
                    operation: "refresh_cpu_all",
                    reason: "no CPUs reported".into(),
                });
            }
            Ok(CpuSample {
                timestamp: timestamp_now(),
                usage_percent: sys.global_cpu_usage() as f64,
                logical_cores: per_core_percent.len() as u32,
                per_core_percent,
            })
        })
        .await
    }
}

impl MetricSampler for CpuSampler {
    fn kind(&self) -> MetricKind {
        MetricKind::Cpu
    }

    fn timing(&self) -> SampleTiming {
        SampleTiming::MeasurementWindow
    }

    fn sample(&mut self, window: Duration) -> BoxFuture<'_, Result<Sample, CollectionError>> {
        Box::pin(async move { self.measure(window).await.map(Sample::Cpu) })
    }
}
