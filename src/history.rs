// Bounded per-metric sample history (FIFO eviction) and the set of buffers owned by the supervisor.

use std::collections::VecDeque;
use std::sync::RwLock;

use crate::models::{MetricKind, Sample};

pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Fixed-capacity ring of the most recent samples, oldest first.
/// One writer (the owning sampling loop), any number of snapshot readers.
#[derive(Debug)]
pub struct HistoryBuffer {
    samples: RwLock<VecDeque<Sample>>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    /// A capacity of zero is bumped to one. Storage grows on demand up to `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: RwLock::new(VecDeque::new()),
            capacity,
        }
    }

    pub fn append(&self, sample: Sample) {
        let mut samples = self.samples.write().unwrap_or_else(|e| e.into_inner());
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
    }

    /// Owned copy in arrival order.
    pub fn snapshot(&self) -> Vec<Sample> {
        let samples = self.samples.read().unwrap_or_else(|e| e.into_inner());
        samples.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// One buffer per metric kind.
#[derive(Debug)]
pub struct Histories {
    cpu: HistoryBuffer,
    memory: HistoryBuffer,
    network: HistoryBuffer,
    disk: HistoryBuffer,
}

impl Default for Histories {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl Histories {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cpu: HistoryBuffer::with_capacity(capacity),
            memory: HistoryBuffer::with_capacity(capacity),
            network: HistoryBuffer::with_capacity(capacity),
            disk: HistoryBuffer::with_capacity(capacity),
        }
    }

    pub fn get(&self, kind: MetricKind) -> &HistoryBuffer {
        match kind {
            MetricKind::Cpu => &self.cpu,
            MetricKind::Memory => &self.memory,
            MetricKind::Network => &self.network,
            MetricKind::Disk => &self.disk,
        }
    }

    /// Routes the sample to the buffer of its kind.
    pub fn append(&self, sample: Sample) {
        self.get(sample.kind()).append(sample);
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricKind, &HistoryBuffer)> {
        MetricKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}
