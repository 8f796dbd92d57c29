// Physical memory usage.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use sysinfo::System;
use tracing::instrument;

use super::{MetricSampler, lock_poisoned, run_blocking, timestamp_now};
use crate::error::CollectionError;
use crate::models::{MemorySample, MetricKind, Sample};

pub struct MemorySampler {
    sys: Arc<Mutex<System>>,
}

impl Default for MemorySampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySampler {
    pub fn new() -> Self {
        Self {
            sys: Arc::new(Mutex::new(System::new())),
        }
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "measure_memory"))]
    pub async fn measure(&self) -> Result<MemorySample, CollectionError> {
        let sys = self.sys.clone();
        run_blocking(move || {
            let mut sys = sys.lock().map_err(lock_poisoned)?;
            sys.refresh_memory();

            let total = sys.total_memory();
            if total == 0 {
                return Err(CollectionError::Query {
                    operation: "refresh_memory",
                    reason: "total memory reported as zero".into(),
                });
            }
            let available = sys.available_memory();
            let used = total.saturating_sub(available);

            Ok(MemorySample {
                timestamp: timestamp_now(),
                usage_percent: (used as f64 / total as f64) * 100.0,
                total,
                used,
                available,
            })
        })
        .await
    }
}

impl MetricSampler for MemorySampler {
    fn kind(&self) -> MetricKind {
        MetricKind::Memory
    }

    fn sample(&mut self, _window: Duration) -> BoxFuture<'_, Result<Sample, CollectionError>> {
        Box::pin(async move { self.measure().await.map(Sample::Memory) })
    }
}
