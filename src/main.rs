use anyhow::Result;
use std::time::Duration;
use sysmonitor::config::AppConfig;
use sysmonitor::format::format_bytes;
use sysmonitor::sampler;
use sysmonitor::supervisor::MonitorSupervisor;
use tokio::time::{MissedTickBehavior, interval_at};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = AppConfig::load();
    let default_level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".into());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = loaded?;
    tracing::info!(
        "{} {} starting",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    match sampler::host_info().await {
        Ok(host) => tracing::info!(
            os = %host.os_name,
            os_version = %host.os_version,
            distribution = %host.os_distribution,
            host = %host.host_name,
            cpu = %host.processor_name,
            logical_cores = host.logical_cores,
            memory_total = %format_bytes(host.memory_total),
            boot_time = host.boot_time,
            "host info"
        ),
        Err(e) => tracing::warn!(error = %e, operation = "host_info", "host info unavailable"),
    }

    let supervisor = MonitorSupervisor::with_system_samplers(&app_config);
    supervisor.start(Duration::from_millis(
        app_config.monitoring.sample_interval_ms,
    ))?;

    let stats_every = Duration::from_secs(app_config.monitoring.stats_log_interval_secs);
    let mut stats_tick = interval_at(tokio::time::Instant::now() + stats_every, stats_every);
    stats_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = stats_tick.tick() => {
                let summary = supervisor.summary();
                tracing::info!(
                    uptime_secs = summary.runtime.uptime_secs.unwrap_or_default(),
                    samples = ?summary.runtime.sample_counts,
                    alerts_fired = summary.runtime.alerts_fired,
                    "monitor stats"
                );
            }
            _ = &mut shutdown => {
                tracing::info!("Received shutdown signal");
                break;
            }
        }
    }

    let report = supervisor.stop().await?;
    for path in &report.exported {
        tracing::info!(path = %path.display(), "final export written");
    }
    println!("{}", serde_json::to_string_pretty(&supervisor.summary())?);
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = match tokio::signal::unix::signal(
            tokio::signal::unix::SignalKind::terminate(),
        ) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
