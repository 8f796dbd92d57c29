// Runtime statistics and per-metric aggregates (computed on demand, never persisted)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::MetricKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStats {
    /// Unix ms of the most recent start; None before the first start.
    pub started_at: Option<u64>,
    pub uptime_secs: Option<u64>,
    pub running: bool,
    /// Samples currently retained per metric.
    pub sample_counts: BTreeMap<MetricKind, usize>,
    pub alerts_fired: u64,
}

/// min/max/avg over the retained samples. All three are None when nothing is buffered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStats {
    pub count: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

impl MetricStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        Self {
            count: values.len(),
            min: Some(min),
            max: Some(max),
            avg: Some(avg),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSummary {
    pub runtime: RuntimeStats,
    pub metrics: BTreeMap<MetricKind, MetricStats>,
}
