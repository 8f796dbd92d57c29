// Threshold alerting: per-(metric, threshold) cooldown gate and the checks derived from a sample.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::ThresholdConfig;
use crate::format::{format_bytes, format_speed};
use crate::models::{MetricKind, Sample};

/// Cooldown key. The threshold is part of the key, so changing a threshold
/// starts a fresh cooldown for that metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub metric: String,
    threshold_bits: u64,
}

impl AlertKey {
    pub fn new(metric: &str, threshold: f64) -> Self {
        Self {
            metric: metric.to_string(),
            threshold_bits: threshold.to_bits(),
        }
    }

    pub fn threshold(&self) -> f64 {
        f64::from_bits(self.threshold_bits)
    }
}

/// Decides whether a breach actually fires. Shared by all sampling loops.
#[derive(Debug)]
pub struct AlertGate {
    cooldown: Duration,
    last_fired: Mutex<HashMap<AlertKey, Instant>>,
    fired_total: AtomicU64,
}

impl AlertGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: Mutex::new(HashMap::new()),
            fired_total: AtomicU64::new(0),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// True when `value > threshold` and the (metric, threshold) key is outside its cooldown.
    /// Within the cooldown the answer is false whatever the value; a value at or below the
    /// threshold leaves the recorded state untouched.
    pub fn should_fire(&self, metric: &str, value: f64, threshold: f64, now: Instant) -> bool {
        let key = AlertKey::new(metric, threshold);
        let mut last_fired = self.last_fired.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(last) = last_fired.get(&key)
            && now.saturating_duration_since(*last) < self.cooldown
        {
            return false;
        }
        if value > threshold {
            last_fired.insert(key, now);
            self.fired_total.fetch_add(1, Ordering::Relaxed);
            return true;
        }
        false
    }

    pub fn alerts_fired(&self) -> u64 {
        self.fired_total.load(Ordering::Relaxed)
    }

    pub fn last_fired(&self, metric: &str, threshold: f64) -> Option<Instant> {
        let last_fired = self.last_fired.lock().unwrap_or_else(|e| e.into_inner());
        last_fired.get(&AlertKey::new(metric, threshold)).copied()
    }
}

/// One threshold comparison a sample asks the gate for.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertCheck {
    pub kind: MetricKind,
    /// Cooldown key name, e.g. `network_upload`.
    pub metric: &'static str,
    pub value: f64,
    pub threshold: f64,
    pub message: String,
}

/// Threshold checks relevant to a sample: one per scalar metric, two for network
/// (upload and download), one per disk partition.
pub fn alert_checks(sample: &Sample, thresholds: &ThresholdConfig) -> Vec<AlertCheck> {
    match sample {
        Sample::Cpu(s) => vec![AlertCheck {
            kind: MetricKind::Cpu,
            metric: "cpu",
            value: s.usage_percent,
            threshold: thresholds.cpu_percent,
            message: format!("CPU usage high: {:.1}%", s.usage_percent),
        }],
        Sample::Memory(s) => vec![AlertCheck {
            kind: MetricKind::Memory,
            metric: "memory",
            value: s.usage_percent,
            threshold: thresholds.memory_percent,
            message: format!(
                "Memory usage high: {:.1}% ({} / {})",
                s.usage_percent,
                format_bytes(s.used),
                format_bytes(s.total)
            ),
        }],
        Sample::Network(s) => vec![
            AlertCheck {
                kind: MetricKind::Network,
                metric: "network_upload",
                value: s.upload_bytes_per_sec,
                threshold: thresholds.network_bytes_per_sec,
                message: format!(
                    "Network upload unusually high: {}",
                    format_speed(s.upload_bytes_per_sec)
                ),
            },
            AlertCheck {
                kind: MetricKind::Network,
                metric: "network_download",
                value: s.download_bytes_per_sec,
                threshold: thresholds.network_bytes_per_sec,
                message: format!(
                    "Network download unusually high: {}",
                    format_speed(s.download_bytes_per_sec)
                ),
            },
        ],
        Sample::Disk(s) => s
            .partitions
            .iter()
            .map(|p| AlertCheck {
                kind: MetricKind::Disk,
                metric: "disk",
                value: p.usage_percent,
                threshold: thresholds.disk_percent,
                message: format!(
                    "Disk usage high: {} ({}) - {:.1}%",
                    p.device, p.mount_point, p.usage_percent
                ),
            })
            .collect(),
    }
}
