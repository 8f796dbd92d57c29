// Disk usage per mounted partition. Partitions that cannot be read are logged and skipped.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use sysinfo::Disks;
use tracing::instrument;

use super::{MetricSampler, lock_poisoned, run_blocking, timestamp_now};
use crate::error::{CollectionError, PartialCollectionError};
use crate::models::{DiskSample, MetricKind, PartitionUsage, Sample};

pub struct DiskSampler {
    disks: Arc<Mutex<Disks>>,
}

impl Default for DiskSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskSampler {
    pub fn new() -> Self {
        Self {
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
        }
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "measure_disks"))]
    pub async fn measure(&self) -> Result<DiskSample, CollectionError> {
        let disks = self.disks.clone();
        run_blocking(move || {
            let mut disks = disks.lock().map_err(lock_poisoned)?;
            disks.refresh(true);
            let partitions = disks
                .list()
                .iter()
                .filter_map(|d| {
                    let device = d.name().to_string_lossy().into_owned();
                    let mount_point = d.mount_point().to_string_lossy().into_owned();
                    match partition_usage(device, mount_point, d.total_space(), d.available_space())
                    {
                        Ok(p) => Some(p),
                        Err(e) => {
                            tracing::warn!(error = %e, operation = "partition_usage", "skipping partition");
                            None
                        }
                    }
                })
                .collect();
            Ok(DiskSample {
                timestamp: timestamp_now(),
                partitions,
            })
        })
        .await
    }
}

fn partition_usage(
    device: String,
    mount_point: String,
    total: u64,
    available: u64,
) -> Result<PartitionUsage, PartialCollectionError> {
    if total == 0 {
        return Err(PartialCollectionError::UnreadablePartition {
            device,
            mount_point,
        });
    }
    let used = total.saturating_sub(available);
    Ok(PartitionUsage {
        device,
        mount_point,
        usage_percent: (used as f64 / total as f64) * 100.0,
        total,
        used,
        free: available,
    })
}

impl MetricSampler for DiskSampler {
    fn kind(&self) -> MetricKind {
        MetricKind::Disk
    }

    fn sample(&mut self, _window: Duration) -> BoxFuture<'_, Result<Sample, CollectionError>> {
        Box::pin(async move { self.measure().await.map(Sample::Disk) })
    }
}
