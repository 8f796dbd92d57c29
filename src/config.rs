use serde::Deserialize;

use crate::history::DEFAULT_HISTORY_CAPACITY;

/// Immutable monitor configuration; loaded once and handed to each component.
/// Every section is optional and falls back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub monitoring: MonitoringConfig,
    pub thresholds: ThresholdConfig,
    pub export: ExportConfig,
    pub alerts: AlertConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub sample_interval_ms: u64,
    /// Samples kept per metric before the oldest is evicted.
    pub history_capacity: usize,
    /// Shared deadline for joining the loops on stop.
    pub stop_timeout_secs: u64,
    /// How often the binary logs runtime stats at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 1000,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            stop_timeout_secs: 5,
            stats_log_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    /// Applies to upload and download separately.
    pub network_bytes_per_sec: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            cpu_percent: 80.0,
            memory_percent: 80.0,
            disk_percent: 90.0,
            network_bytes_per_sec: 100.0 * 1024.0 * 1024.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub directory: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            directory: "exports".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub sound_enabled: bool,
    pub cooldown_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            cooldown_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.monitoring.sample_interval_ms > 0,
            "monitoring.sample_interval_ms must be > 0, got {}",
            self.monitoring.sample_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.history_capacity > 0,
            "monitoring.history_capacity must be > 0, got {}",
            self.monitoring.history_capacity
        );
        anyhow::ensure!(
            self.monitoring.stop_timeout_secs > 0,
            "monitoring.stop_timeout_secs must be > 0, got {}",
            self.monitoring.stop_timeout_secs
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        for (name, value) in [
            ("thresholds.cpu_percent", self.thresholds.cpu_percent),
            ("thresholds.memory_percent", self.thresholds.memory_percent),
            ("thresholds.disk_percent", self.thresholds.disk_percent),
        ] {
            anyhow::ensure!(
                (0.0..=100.0).contains(&value),
                "{} must be between 0 and 100, got {}",
                name,
                value
            );
        }
        anyhow::ensure!(
            self.thresholds.network_bytes_per_sec >= 0.0,
            "thresholds.network_bytes_per_sec must be >= 0, got {}",
            self.thresholds.network_bytes_per_sec
        );
        if self.export.enabled {
            anyhow::ensure!(
                self.export.interval_secs > 0,
                "export.interval_secs must be > 0, got {}",
                self.export.interval_secs
            );
            anyhow::ensure!(
                !self.export.directory.is_empty(),
                "export.directory must be non-empty"
            );
        }
        anyhow::ensure!(
            !self.logging.level.is_empty(),
            "logging.level must be non-empty"
        );
        Ok(())
    }
}
