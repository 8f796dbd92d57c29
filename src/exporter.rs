// CSV export of buffered samples: one new file per non-empty metric per export cycle.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use tracing::{debug, info, warn};

use crate::error::ExportError;
use crate::history::Histories;
use crate::models::{MetricKind, Sample};

#[derive(Debug, Clone)]
pub struct Exporter {
    directory: PathBuf,
}

impl Exporter {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Writes every non-empty buffer to its own file and returns the paths written.
    /// A missing directory is created; failing to create it is the only error returned.
    /// A file that cannot be written is logged and skipped.
    pub fn export(&self, histories: &Histories) -> Result<Vec<PathBuf>, ExportError> {
        self.export_at(histories, Local::now())
    }

    /// Same as [`Exporter::export`] with an explicit clock for file naming.
    pub fn export_at(
        &self,
        histories: &Histories,
        now: DateTime<Local>,
    ) -> Result<Vec<PathBuf>, ExportError> {
        std::fs::create_dir_all(&self.directory).map_err(|source| ExportError::CreateDir {
            path: self.directory.clone(),
            source,
        })?;

        let stamp = now.format("%Y%m%d_%H%M%S").to_string();
        let mut written = Vec::new();
        for (kind, buffer) in histories.iter() {
            let samples = buffer.snapshot();
            if samples.is_empty() {
                debug!(metric = %kind, "export: no samples, skipping");
                continue;
            }
            match self.write_metric(kind, &samples, &stamp) {
                Ok(path) => {
                    debug!(metric = %kind, rows = samples.len(), path = %path.display(), "exported");
                    written.push(path);
                }
                Err(e) => {
                    warn!(error = %e, metric = %kind, operation = "export", "export failed");
                }
            }
        }
        if !written.is_empty() {
            info!(
                directory = %self.directory.display(),
                files = written.len(),
                "monitoring data exported"
            );
        }
        Ok(written)
    }

    fn write_metric(
        &self,
        kind: MetricKind,
        samples: &[Sample],
        stamp: &str,
    ) -> Result<PathBuf, ExportError> {
        let (path, file) = self.create_unique(kind, stamp)?;
        let mut wtr = csv::Writer::from_writer(file);
        let write_err = |source| ExportError::Write {
            path: path.clone(),
            source,
        };

        wtr.write_record(header(kind)).map_err(write_err)?;
        for sample in samples {
            for row in rows(sample) {
                wtr.write_record(&row).map_err(write_err)?;
            }
        }
        wtr.flush().map_err(|source| ExportError::Flush {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Never reuses an existing name: `cpu_data_<stamp>.csv`, then `_1`, `_2`, ...
    fn create_unique(&self, kind: MetricKind, stamp: &str) -> Result<(PathBuf, File), ExportError> {
        let base = format!("{}_data_{}", kind, stamp);
        let mut n: u32 = 0;
        loop {
            let name = if n == 0 {
                format!("{}.csv", base)
            } else {
                format!("{}_{}.csv", base, n)
            };
            let path = self.directory.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
                Err(source) => return Err(ExportError::CreateFile { path, source }),
            }
        }
    }
}

fn header(kind: MetricKind) -> &'static [&'static str] {
    match kind {
        MetricKind::Cpu => &["timestamp", "cpu_percent", "core_count", "per_core_percent"],
        MetricKind::Memory => &[
            "timestamp",
            "memory_percent",
            "used_gb",
            "total_gb",
            "available_gb",
        ],
        MetricKind::Network => &[
            "timestamp",
            "upload_bytes_per_sec",
            "download_bytes_per_sec",
            "total_sent",
            "total_recv",
            "active_interfaces",
        ],
        MetricKind::Disk => &[
            "timestamp",
            "device",
            "mount_point",
            "disk_percent",
            "used_gb",
            "free_gb",
            "total_gb",
        ],
    }
}

fn rows(sample: &Sample) -> Vec<Vec<String>> {
    let ts = format_timestamp(sample.timestamp());
    match sample {
        Sample::Cpu(s) => vec![vec![
            ts,
            s.usage_percent.to_string(),
            s.logical_cores.to_string(),
            s.per_core_percent
                .iter()
                .map(|p| format!("{:.1}", p))
                .collect::<Vec<_>>()
                .join(";"),
        ]],
        Sample::Memory(s) => vec![vec![
            ts,
            s.usage_percent.to_string(),
            format!("{:.3}", s.used_gb()),
            format!("{:.3}", s.total_gb()),
            format!("{:.3}", s.available_gb()),
        ]],
        Sample::Network(s) => vec![vec![
            ts,
            format!("{:.2}", s.upload_bytes_per_sec),
            format!("{:.2}", s.download_bytes_per_sec),
            s.total_sent.to_string(),
            s.total_recv.to_string(),
            s.active_interfaces.join(";"),
        ]],
        // One row per partition; an empty sweep produces no rows.
        Sample::Disk(s) => s
            .partitions
            .iter()
            .map(|p| {
                vec![
                    ts.clone(),
                    p.device.clone(),
                    p.mount_point.clone(),
                    p.usage_percent.to_string(),
                    format!("{:.3}", p.used_gb()),
                    format!("{:.3}", p.free_gb()),
                    format!("{:.3}", p.total_gb()),
                ]
            })
            .collect(),
    }
}

fn format_timestamp(ms: u64) -> String {
    Local
        .timestamp_millis_opt(ms as i64)
        .single()
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, false))
        .unwrap_or_else(|| ms.to_string())
}
