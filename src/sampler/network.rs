// Network throughput from cumulative interface counters.
// Two-phase: the first call only seeds the counters and reports 0 B/s in both directions.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use sysinfo::Networks;
use tracing::instrument;

use super::{MetricSampler, lock_poisoned, run_blocking, timestamp_now};
use crate::error::CollectionError;
use crate::models::{MetricKind, NetworkSample, Sample};

#[derive(Debug, Clone, Copy)]
struct Counters {
    sent: u64,
    recv: u64,
    at: Instant,
}

pub struct NetworkSampler {
    networks: Arc<Mutex<Networks>>,
    last: Option<Counters>,
}

impl Default for NetworkSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkSampler {
    pub fn new() -> Self {
        Self {
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            last: None,
        }
    }

    #[instrument(skip(self), fields(repo = "sysinfo", operation = "measure_network"))]
    pub async fn measure(&mut self) -> Result<NetworkSample, CollectionError> {
        let networks = self.networks.clone();
        let (sent, recv, mut active_interfaces) = run_blocking(move || {
            let mut networks = networks.lock().map_err(lock_poisoned)?;
            networks.refresh(true);
            let mut sent: u64 = 0;
            let mut recv: u64 = 0;
            let mut active = Vec::new();
            for (name, data) in networks.list() {
                sent = sent.saturating_add(data.total_transmitted());
                recv = recv.saturating_add(data.total_received());
                if data
                    .ip_networks()
                    .iter()
                    .any(|n| n.addr.is_ipv4() && !n.addr.is_loopback())
                {
                    active.push(name.clone());
                }
            }
            Ok((sent, recv, active))
        })
        .await?;
        active_interfaces.sort();

        let current = Counters {
            sent,
            recv,
            at: Instant::now(),
        };
        let (upload_bytes_per_sec, download_bytes_per_sec) = rates(self.last, current);
        self.last = Some(current);

        Ok(NetworkSample {
            timestamp: timestamp_now(),
            upload_bytes_per_sec,
            download_bytes_per_sec,
            total_sent: sent,
            total_recv: recv,
            active_interfaces,
        })
    }
}

/// (upload, download) in bytes/sec. Zero without a previous reading, for a zero-length
/// interval, and for counters that went backwards (interface reset).
fn rates(previous: Option<Counters>, current: Counters) -> (f64, f64) {
    let Some(prev) = previous else {
        return (0.0, 0.0);
    };
    let dt = current.at.saturating_duration_since(prev.at).as_secs_f64();
    if dt <= 0.0 {
        return (0.0, 0.0);
    }
    (
        current.sent.saturating_sub(prev.sent) as f64 / dt,
        current.recv.saturating_sub(prev.recv) as f64 / dt,
    )
}

impl MetricSampler for NetworkSampler {
    fn kind(&self) -> MetricKind {
        MetricKind::Network
    }

    fn sample(&mut self, _window: Duration) -> BoxFuture<'_, Result<Sample, CollectionError>> {
        Box::pin(async move { self.measure().await.map(Sample::Network) })
    }
}
