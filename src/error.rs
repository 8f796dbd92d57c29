// Error taxonomy for the monitoring core.
// Only LifecycleError reaches callers; the rest are logged by the loops.

use std::path::PathBuf;

use thiserror::Error;

/// A single sample attempt failed. The loop logs it and moves on to its next iteration.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("sysinfo lock poisoned: {0}")]
    LockPoisoned(String),
    #[error("sysinfo task join: {0}")]
    Join(String),
    #[error("{operation} failed: {reason}")]
    Query {
        operation: &'static str,
        reason: String,
    },
}

/// One sub-item of a sample (e.g. a disk partition) could not be read; the rest are kept.
#[derive(Debug, Error)]
pub enum PartialCollectionError {
    #[error("partition {device} at {mount_point} reports zero capacity")]
    UnreadablePartition { device: String, mount_point: String },
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("create export directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("create export file {}: {source}", .path.display())]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("write export file {}: {source}", .path.display())]
    Write { path: PathBuf, source: csv::Error },
    #[error("flush export file {}: {source}", .path.display())]
    Flush {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("export task join: {0}")]
    Join(String),
}

/// Misuse of the supervisor state machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("monitor is already running")]
    AlreadyRunning,
    #[error("monitor is not running")]
    NotRunning,
    #[error("monitor is stopping")]
    Stopping,
    #[error("sampling interval must be greater than zero")]
    InvalidInterval,
}
