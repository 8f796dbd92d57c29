// Monitor lifecycle (Idle -> Running -> Stopping -> Idle).
// One sampling task per metric plus one export task, all watching a shared running flag.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, interval_at};
use tracing::{Instrument, debug, info, warn};

use crate::alert::{AlertGate, alert_checks};
use crate::config::{AppConfig, ThresholdConfig};
use crate::error::{ExportError, LifecycleError};
use crate::exporter::Exporter;
use crate::history::Histories;
use crate::models::{MetricKind, MetricStats, MonitorSummary, RuntimeStats};
use crate::notifier::{AlertNotifier, Notifier};
use crate::sampler::{MetricSampler, SampleTiming, system_samplers, timestamp_now};

type SharedSampler = Arc<tokio::sync::Mutex<Box<dyn MetricSampler>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    Idle,
    Running,
    Stopping,
}

/// Outcome of a stop: loops that missed the deadline and files written by the final export.
#[derive(Debug, Default)]
pub struct StopReport {
    pub abandoned: Vec<String>,
    pub exported: Vec<PathBuf>,
}

struct RunHandle {
    running: watch::Sender<bool>,
    tasks: Vec<(String, JoinHandle<()>)>,
}

struct Inner {
    state: MonitorState,
    run: Option<RunHandle>,
    started_at: Option<u64>,
    started: Option<Instant>,
    stopped: Option<Instant>,
}

pub struct MonitorSupervisor {
    thresholds: ThresholdConfig,
    stop_timeout: Duration,
    export_interval: Duration,
    histories: Arc<Histories>,
    gate: Arc<AlertGate>,
    notifier: Arc<dyn Notifier>,
    exporter: Option<Arc<Exporter>>,
    samplers: Vec<(MetricKind, SharedSampler)>,
    inner: Arc<Mutex<Inner>>,
}

impl MonitorSupervisor {
    /// At most one sampler per metric kind is kept; each buffer has a single writer.
    pub fn new(
        config: &AppConfig,
        samplers: Vec<Box<dyn MetricSampler>>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let mut seen = HashSet::new();
        let samplers = samplers
            .into_iter()
            .filter_map(|s| {
                let kind = s.kind();
                if seen.insert(kind) {
                    Some((kind, Arc::new(tokio::sync::Mutex::new(s))))
                } else {
                    warn!(metric = %kind, "duplicate sampler ignored");
                    None
                }
            })
            .collect();
        let exporter = config
            .export
            .enabled
            .then(|| Arc::new(Exporter::new(&config.export.directory)));

        Self {
            thresholds: config.thresholds.clone(),
            stop_timeout: Duration::from_secs(config.monitoring.stop_timeout_secs),
            export_interval: Duration::from_secs(config.export.interval_secs),
            histories: Arc::new(Histories::with_capacity(config.monitoring.history_capacity)),
            gate: Arc::new(AlertGate::new(Duration::from_secs(
                config.alerts.cooldown_secs,
            ))),
            notifier,
            exporter,
            samplers,
            inner: Arc::new(Mutex::new(Inner {
                state: MonitorState::Idle,
                run: None,
                started_at: None,
                started: None,
                stopped: None,
            })),
        }
    }

    /// Supervisor over the host's CPU, memory, network and disk with the log/sound notifier.
    pub fn with_system_samplers(config: &AppConfig) -> Self {
        let notifier = Arc::new(AlertNotifier::new(config.alerts.sound_enabled));
        Self::new(config, system_samplers(), notifier)
    }

    /// Spawns the sampling and export loops. Only valid from Idle; a second start while
    /// running is `AlreadyRunning`. Must be called from within a Tokio runtime.
    pub fn start(&self, sample_interval: Duration) -> Result<(), LifecycleError> {
        if sample_interval.is_zero() {
            return Err(LifecycleError::InvalidInterval);
        }
        let mut inner = self.lock_inner();
        match inner.state {
            MonitorState::Idle => {}
            MonitorState::Running => return Err(LifecycleError::AlreadyRunning),
            MonitorState::Stopping => return Err(LifecycleError::Stopping),
        }

        let (running_tx, running_rx) = watch::channel(true);
        let mut tasks = Vec::with_capacity(self.samplers.len() + 1);
        for (kind, sampler) in &self.samplers {
            let ctx = LoopContext {
                kind: *kind,
                sampler: sampler.clone(),
                interval: sample_interval,
                thresholds: self.thresholds.clone(),
                histories: self.histories.clone(),
                gate: self.gate.clone(),
                notifier: self.notifier.clone(),
            };
            let span = tracing::debug_span!("sampling_loop", metric = %kind);
            let handle = tokio::spawn(run_sampling_loop(ctx, running_rx.clone()).instrument(span));
            tasks.push((format!("{}-monitor", kind), handle));
        }
        if let Some(exporter) = &self.exporter {
            let span = tracing::debug_span!("export_loop");
            let handle = tokio::spawn(
                run_export_loop(
                    exporter.clone(),
                    self.histories.clone(),
                    self.export_interval,
                    running_rx,
                )
                .instrument(span),
            );
            tasks.push(("data-export".to_string(), handle));
        }

        info!(
            sample_interval_ms = sample_interval.as_millis() as u64,
            loops = tasks.len(),
            "monitoring started"
        );
        inner.state = MonitorState::Running;
        inner.run = Some(RunHandle {
            running: running_tx,
            tasks,
        });
        inner.started_at = Some(timestamp_now());
        inner.started = Some(Instant::now());
        inner.stopped = None;
        Ok(())
    }

    /// Clears the running flag, joins every loop under one shared deadline, then runs a
    /// final export. Loops still running at the deadline are detached and listed in the report.
    ///
    /// The shutdown runs on its own task, so dropping this future does not leave the
    /// supervisor stuck in `Stopping`; the state returns to Idle once that task finishes.
    pub async fn stop(&self) -> Result<StopReport, LifecycleError> {
        let run = {
            let mut inner = self.lock_inner();
            match inner.state {
                MonitorState::Running => {}
                MonitorState::Idle => return Err(LifecycleError::NotRunning),
                MonitorState::Stopping => return Err(LifecycleError::Stopping),
            }
            inner.state = MonitorState::Stopping;
            inner.run.take()
        };

        let shutdown = Shutdown {
            run,
            stop_timeout: self.stop_timeout,
            exporter: self.exporter.clone(),
            histories: self.histories.clone(),
            inner: self.inner.clone(),
        };
        let span = tracing::debug_span!("shutdown");
        match tokio::spawn(shutdown.run().instrument(span)).await {
            Ok(report) => Ok(report),
            Err(e) => {
                warn!(error = %e, operation = "stop", "shutdown task ended abnormally");
                Ok(StopReport::default())
            }
        }
    }

    /// Runtime stats plus min/max/avg per metric from current buffer snapshots.
    /// Safe to call at any time, including while sampling.
    pub fn summary(&self) -> MonitorSummary {
        let (started_at, uptime_secs, running) = {
            let inner = self.lock_inner();
            let uptime = inner.started.map(|start| {
                inner
                    .stopped
                    .unwrap_or_else(Instant::now)
                    .saturating_duration_since(start)
                    .as_secs()
            });
            (
                inner.started_at,
                uptime,
                inner.state == MonitorState::Running,
            )
        };

        let mut sample_counts = BTreeMap::new();
        let mut metrics = BTreeMap::new();
        for (kind, buffer) in self.histories.iter() {
            let samples = buffer.snapshot();
            let values: Vec<f64> = samples.iter().flat_map(|s| s.summary_values()).collect();
            sample_counts.insert(kind, samples.len());
            metrics.insert(kind, MetricStats::from_values(&values));
        }

        MonitorSummary {
            runtime: RuntimeStats {
                started_at,
                uptime_secs,
                running,
                sample_counts,
                alerts_fired: self.gate.alerts_fired(),
            },
            metrics,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.lock_inner().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == MonitorState::Running
    }

    pub fn histories(&self) -> &Arc<Histories> {
        &self.histories
    }

    pub fn alert_gate(&self) -> &Arc<AlertGate> {
        &self.gate
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

/// Everything the second half of a stop needs, detached from the caller's future.
struct Shutdown {
    run: Option<RunHandle>,
    stop_timeout: Duration,
    exporter: Option<Arc<Exporter>>,
    histories: Arc<Histories>,
    inner: Arc<Mutex<Inner>>,
}

impl Shutdown {
    async fn run(self) -> StopReport {
        // Returns the supervisor to Idle even if this task panics.
        let _idle = IdleOnDrop(self.inner.clone());

        let mut report = StopReport::default();
        if let Some(run) = self.run {
            run.running.send_replace(false);
            let deadline = tokio::time::Instant::now() + self.stop_timeout;
            for (name, handle) in run.tasks {
                match tokio::time::timeout_at(deadline, handle).await {
                    Ok(Ok(())) => debug!(task = %name, "loop exited"),
                    Ok(Err(e)) => warn!(error = %e, task = %name, "loop ended abnormally"),
                    Err(_) => {
                        warn!(
                            task = %name,
                            timeout_secs = self.stop_timeout.as_secs(),
                            "loop did not exit before the stop timeout; abandoning it"
                        );
                        report.abandoned.push(name);
                    }
                }
            }
        }

        if let Some(exporter) = self.exporter {
            match export_blocking(exporter, self.histories).await {
                Ok(paths) => report.exported = paths,
                Err(e) => warn!(error = %e, operation = "final_export", "final export failed"),
            }
        }

        let runtime_secs = lock(&self.inner)
            .started
            .map(|s| s.elapsed().as_secs())
            .unwrap_or_default();
        info!(
            runtime_secs,
            abandoned = report.abandoned.len(),
            exported = report.exported.len(),
            "monitoring stopped"
        );
        report
    }
}

struct IdleOnDrop(Arc<Mutex<Inner>>);

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        let mut inner = lock(&self.0);
        inner.state = MonitorState::Idle;
        inner.stopped = Some(Instant::now());
    }
}

struct LoopContext {
    kind: MetricKind,
    sampler: SharedSampler,
    interval: Duration,
    thresholds: ThresholdConfig,
    histories: Arc<Histories>,
    gate: Arc<AlertGate>,
    notifier: Arc<dyn Notifier>,
}

/// Resolves once the running flag is false or the supervisor dropped the flag.
async fn stopped(running: &mut watch::Receiver<bool>) {
    let _ = running.wait_for(|r| !*r).await;
}

async fn run_sampling_loop(ctx: LoopContext, mut running: watch::Receiver<bool>) {
    // A loop abandoned by an earlier stop may still hold the sampler.
    let mut sampler = tokio::select! {
        guard = ctx.sampler.clone().lock_owned() => guard,
        _ = stopped(&mut running) => return,
    };
    let timing = sampler.timing();
    let mut tick = interval(ctx.interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_timestamp: u64 = 0;
    debug!(?timing, "sampling loop started");

    while *running.borrow() {
        if timing == SampleTiming::Interval {
            tokio::select! {
                _ = tick.tick() => {}
                _ = stopped(&mut running) => break,
            }
        }

        let result = tokio::select! {
            r = sampler.sample(ctx.interval) => r,
            _ = stopped(&mut running) => break,
        };
        let mut sample = match result {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, metric = %ctx.kind, operation = "sample", "collection failed");
                // Measurement-window samplers may fail before waiting; keep the period.
                if timing == SampleTiming::MeasurementWindow {
                    tokio::select! {
                        _ = tokio::time::sleep(ctx.interval) => {}
                        _ = stopped(&mut running) => break,
                    }
                }
                continue;
            }
        };
        if sample.kind() != ctx.kind {
            warn!(metric = %ctx.kind, got = %sample.kind(), "sampler returned a different metric kind");
            continue;
        }

        let timestamp = sample.timestamp().max(last_timestamp);
        sample.set_timestamp(timestamp);
        last_timestamp = timestamp;

        let checks = alert_checks(&sample, &ctx.thresholds);
        ctx.histories.append(sample);

        let now = Instant::now();
        for check in checks {
            if ctx
                .gate
                .should_fire(check.metric, check.value, check.threshold, now)
            {
                ctx.notifier.notify(check.kind, &check.message);
            }
        }
    }
    debug!("sampling loop stopped");
}

async fn run_export_loop(
    exporter: Arc<Exporter>,
    histories: Arc<Histories>,
    every: Duration,
    mut running: watch::Receiver<bool>,
) {
    let mut tick = interval_at(tokio::time::Instant::now() + every, every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                if let Err(e) = export_blocking(exporter.clone(), histories.clone()).await {
                    warn!(error = %e, operation = "export", "export cycle failed");
                }
            }
            _ = stopped(&mut running) => break,
        }
    }
    debug!("export loop stopped");
}

async fn export_blocking(
    exporter: Arc<Exporter>,
    histories: Arc<Histories>,
) -> Result<Vec<PathBuf>, ExportError> {
    tokio::task::spawn_blocking(move || exporter.export(&histories))
        .await
        .map_err(|e| ExportError::Join(e.to_string()))?
}
