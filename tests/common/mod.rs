// Shared test helpers: sample builders, scripted samplers, recording notifier
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use sysmonitor::config::AppConfig;
use sysmonitor::error::CollectionError;
use sysmonitor::models::*;
use sysmonitor::notifier::Notifier;
use sysmonitor::sampler::MetricSampler;

pub fn cpu_sample(timestamp: u64, usage_percent: f64) -> Sample {
    Sample::Cpu(CpuSample {
        timestamp,
        usage_percent,
        per_core_percent: vec![usage_percent, usage_percent],
        logical_cores: 2,
    })
}

pub fn memory_sample(timestamp: u64, usage_percent: f64) -> Sample {
    let total: u64 = 16 * 1024 * 1024 * 1024;
    let used = (total as f64 * usage_percent / 100.0) as u64;
    Sample::Memory(MemorySample {
        timestamp,
        usage_percent,
        total,
        used,
        available: total - used,
    })
}

pub fn network_sample(timestamp: u64, upload: f64, download: f64) -> Sample {
    Sample::Network(NetworkSample {
        timestamp,
        upload_bytes_per_sec: upload,
        download_bytes_per_sec: download,
        total_sent: 1_000,
        total_recv: 2_000,
        active_interfaces: vec!["eth0".into(), "wlan0".into()],
    })
}

pub fn partition(device: &str, mount_point: &str, usage_percent: f64) -> PartitionUsage {
    let total: u64 = 100 * 1024 * 1024 * 1024;
    let used = (total as f64 * usage_percent / 100.0) as u64;
    PartitionUsage {
        device: device.into(),
        mount_point: mount_point.into(),
        usage_percent,
        total,
        used,
        free: total - used,
    }
}

pub fn disk_sample(timestamp: u64, partitions: Vec<PartitionUsage>) -> Sample {
    Sample::Disk(DiskSample {
        timestamp,
        partitions,
    })
}

/// Config with export and sound off; tests switch on what they need.
pub fn quiet_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.export.enabled = false;
    config.alerts.sound_enabled = false;
    config
}

/// Behaviour of a scripted sampler call (1-based call number).
pub type Script = Box<dyn Fn(usize) -> Result<Sample, CollectionError> + Send>;

/// Sampler driven by a closure; counts its calls.
pub struct ScriptedSampler {
    kind: MetricKind,
    calls: Arc<AtomicUsize>,
    script: Script,
}

impl ScriptedSampler {
    pub fn new(kind: MetricKind, script: Script) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                kind,
                calls: calls.clone(),
                script,
            },
            calls,
        )
    }

    /// CPU sampler always reporting `usage_percent`.
    pub fn constant_cpu(usage_percent: f64) -> (Self, Arc<AtomicUsize>) {
        Self::new(
            MetricKind::Cpu,
            Box::new(move |n| Ok(cpu_sample(n as u64, usage_percent))),
        )
    }
}

impl MetricSampler for ScriptedSampler {
    fn kind(&self) -> MetricKind {
        self.kind
    }

    fn sample(&mut self, _window: Duration) -> BoxFuture<'_, Result<Sample, CollectionError>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let result = (self.script)(n);
        Box::pin(async move { result })
    }
}

/// Sampler whose sample call never completes.
pub struct HangingSampler;

impl MetricSampler for HangingSampler {
    fn kind(&self) -> MetricKind {
        MetricKind::Network
    }

    fn sample(&mut self, _window: Duration) -> BoxFuture<'_, Result<Sample, CollectionError>> {
        Box::pin(futures_util::future::pending())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub alerts: Mutex<Vec<(MetricKind, String)>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, metric: MetricKind, message: &str) {
        self.alerts
            .lock()
            .unwrap()
            .push((metric, message.to_string()));
    }
}

/// Memory sampler that parks its worker thread for `hold` on every call.
/// Needs a multi-thread runtime.
pub struct BlockingSampler {
    pub hold: Duration,
}

impl MetricSampler for BlockingSampler {
    fn kind(&self) -> MetricKind {
        MetricKind::Memory
    }

    fn sample(&mut self, _window: Duration) -> BoxFuture<'_, Result<Sample, CollectionError>> {
        let hold = self.hold;
        Box::pin(async move {
            tokio::task::block_in_place(|| std::thread::sleep(hold));
            Ok(memory_sample(0, 10.0))
        })
    }
}
