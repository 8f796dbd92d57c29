// Supervisor lifecycle tests: start/stop state machine, alert delivery, shutdown, final export

mod common;

use common::*;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use sysmonitor::error::{CollectionError, LifecycleError};
use sysmonitor::models::{MetricKind, Sample};
use sysmonitor::sampler::MetricSampler;
use sysmonitor::supervisor::{MonitorState, MonitorSupervisor};
use tokio::time::sleep;

const INTERVAL: Duration = Duration::from_millis(20);

fn supervisor_with(
    samplers: Vec<Box<dyn MetricSampler>>,
) -> (MonitorSupervisor, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let supervisor = MonitorSupervisor::new(&quiet_config(), samplers, notifier.clone());
    (supervisor, notifier)
}

#[tokio::test]
async fn start_twice_is_an_error_and_stop_when_idle_is_an_error() {
    let (cpu, _) = ScriptedSampler::constant_cpu(10.0);
    let (supervisor, _) = supervisor_with(vec![Box::new(cpu)]);

    assert_eq!(supervisor.state(), MonitorState::Idle);
    assert_eq!(
        supervisor.stop().await.unwrap_err(),
        LifecycleError::NotRunning
    );

    supervisor.start(INTERVAL).unwrap();
    assert!(supervisor.is_running());
    assert_eq!(
        supervisor.start(INTERVAL).unwrap_err(),
        LifecycleError::AlreadyRunning
    );

    supervisor.stop().await.unwrap();
    assert_eq!(supervisor.state(), MonitorState::Idle);
    assert_eq!(
        supervisor.stop().await.unwrap_err(),
        LifecycleError::NotRunning
    );
}

#[tokio::test]
async fn zero_interval_is_rejected() {
    let (supervisor, _) = supervisor_with(vec![]);
    assert_eq!(
        supervisor.start(Duration::ZERO).unwrap_err(),
        LifecycleError::InvalidInterval
    );
    assert_eq!(supervisor.state(), MonitorState::Idle);
}

#[tokio::test]
async fn stop_right_after_start_leaves_stable_state() {
    let (cpu, _) = ScriptedSampler::constant_cpu(10.0);
    let (supervisor, _) = supervisor_with(vec![Box::new(cpu)]);

    supervisor.start(INTERVAL).unwrap();
    let report = supervisor.stop().await.unwrap();

    assert!(report.abandoned.is_empty());
    assert!(!supervisor.is_running());
    let summary = supervisor.summary();
    assert!(!summary.runtime.running);
    assert!(summary.runtime.started_at.is_some());
    for (_, buffer) in supervisor.histories().iter() {
        assert_eq!(buffer.snapshot().len(), buffer.len());
    }
}

#[tokio::test]
async fn sampling_fills_buffers_and_alerts_once_per_cooldown() {
    let (cpu, cpu_calls) = ScriptedSampler::constant_cpu(95.0);
    let (memory, _) = ScriptedSampler::new(
        MetricKind::Memory,
        Box::new(|n| Ok(memory_sample(n as u64, 30.0))),
    );
    let (supervisor, notifier) = supervisor_with(vec![Box::new(cpu), Box::new(memory)]);

    supervisor.start(INTERVAL).unwrap();
    sleep(Duration::from_millis(150)).await;
    supervisor.stop().await.unwrap();

    assert!(cpu_calls.load(Ordering::SeqCst) >= 2);
    assert!(supervisor.histories().get(MetricKind::Cpu).len() >= 2);
    assert!(!supervisor.histories().get(MetricKind::Memory).is_empty());
    assert!(supervisor.histories().get(MetricKind::Disk).is_empty());

    // 95% breaches the default 80% threshold; the 300 s cooldown allows one delivery.
    assert_eq!(notifier.count(), 1);
    let alerts = notifier.alerts.lock().unwrap();
    assert_eq!(alerts[0].0, MetricKind::Cpu);
    assert_eq!(alerts[0].1, "CPU usage high: 95.0%");
    drop(alerts);
    assert_eq!(supervisor.summary().runtime.alerts_fired, 1);
}

#[tokio::test]
async fn collection_failures_do_not_end_the_loop() {
    let (flaky, calls) = ScriptedSampler::new(
        MetricKind::Cpu,
        Box::new(|n| {
            if n % 2 == 1 {
                Err(CollectionError::Query {
                    operation: "test",
                    reason: "flaky".into(),
                })
            } else {
                Ok(cpu_sample(n as u64, 5.0))
            }
        }),
    );
    let (supervisor, notifier) = supervisor_with(vec![Box::new(flaky)]);

    supervisor.start(INTERVAL).unwrap();
    sleep(Duration::from_millis(150)).await;
    supervisor.stop().await.unwrap();

    assert!(calls.load(Ordering::SeqCst) >= 3);
    assert!(!supervisor.histories().get(MetricKind::Cpu).is_empty());
    assert_eq!(notifier.count(), 0);
}

#[tokio::test]
async fn timestamps_are_non_decreasing_within_a_loop() {
    let (backwards, _) = ScriptedSampler::new(
        MetricKind::Cpu,
        Box::new(|n| Ok(cpu_sample(1_000u64.saturating_sub(n as u64 * 100), 1.0))),
    );
    let (supervisor, _) = supervisor_with(vec![Box::new(backwards)]);

    supervisor.start(INTERVAL).unwrap();
    sleep(Duration::from_millis(120)).await;
    supervisor.stop().await.unwrap();

    let ts: Vec<u64> = supervisor
        .histories()
        .get(MetricKind::Cpu)
        .snapshot()
        .iter()
        .map(Sample::timestamp)
        .collect();
    assert!(ts.len() >= 2);
    assert!(ts.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn pending_sample_does_not_block_stop() {
    let (supervisor, _) = supervisor_with(vec![Box::new(HangingSampler)]);

    supervisor.start(INTERVAL).unwrap();
    sleep(Duration::from_millis(50)).await;
    let report = tokio::time::timeout(Duration::from_secs(2), supervisor.stop())
        .await
        .expect("stop should finish promptly")
        .unwrap();

    assert!(report.abandoned.is_empty());
    assert!(supervisor.histories().get(MetricKind::Network).is_empty());
}

#[tokio::test]
async fn history_survives_restart() {
    let (cpu, _) = ScriptedSampler::constant_cpu(10.0);
    let (supervisor, _) = supervisor_with(vec![Box::new(cpu)]);

    supervisor.start(INTERVAL).unwrap();
    sleep(Duration::from_millis(80)).await;
    supervisor.stop().await.unwrap();
    let after_first = supervisor.histories().get(MetricKind::Cpu).len();
    assert!(after_first > 0);

    supervisor.start(INTERVAL).unwrap();
    sleep(Duration::from_millis(80)).await;
    supervisor.stop().await.unwrap();
    assert!(supervisor.histories().get(MetricKind::Cpu).len() > after_first);
}

#[tokio::test]
async fn history_capacity_bounds_each_buffer() {
    let mut config = quiet_config();
    config.monitoring.history_capacity = 3;
    let (cpu, calls) = ScriptedSampler::constant_cpu(10.0);
    let supervisor = MonitorSupervisor::new(
        &config,
        vec![Box::new(cpu)],
        Arc::new(RecordingNotifier::default()),
    );

    supervisor.start(Duration::from_millis(5)).unwrap();
    sleep(Duration::from_millis(100)).await;
    supervisor.stop().await.unwrap();

    assert!(calls.load(Ordering::SeqCst) > 3);
    assert_eq!(supervisor.histories().get(MetricKind::Cpu).len(), 3);
}

#[tokio::test]
async fn stop_runs_final_export() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut config = quiet_config();
    config.export.enabled = true;
    config.export.interval_secs = 3600;
    config.export.directory = dir.path().to_string_lossy().into_owned();
    let (cpu, _) = ScriptedSampler::constant_cpu(10.0);
    let supervisor = MonitorSupervisor::new(
        &config,
        vec![Box::new(cpu)],
        Arc::new(RecordingNotifier::default()),
    );

    supervisor.start(INTERVAL).unwrap();
    sleep(Duration::from_millis(80)).await;
    let report = supervisor.stop().await.unwrap();

    assert_eq!(report.exported.len(), 1);
    assert!(report.exported[0].starts_with(dir.path()));
    assert!(report.exported[0].exists());
}

#[tokio::test]
async fn summary_reports_stats_and_absent_averages() {
    let (cpu, _) = ScriptedSampler::constant_cpu(40.0);
    let (supervisor, _) = supervisor_with(vec![Box::new(cpu)]);

    let before = supervisor.summary();
    assert!(before.runtime.started_at.is_none());
    assert!(before.runtime.uptime_secs.is_none());
    assert!(before.metrics.values().all(|m| m.avg.is_none()));

    supervisor.start(INTERVAL).unwrap();
    sleep(Duration::from_millis(80)).await;
    let during = supervisor.summary();
    supervisor.stop().await.unwrap();

    assert!(during.runtime.running);
    let cpu_stats = &during.metrics[&MetricKind::Cpu];
    assert_eq!(cpu_stats.avg, Some(40.0));
    assert_eq!(cpu_stats.min, Some(40.0));
    assert_eq!(cpu_stats.max, Some(40.0));
    assert_eq!(
        during.runtime.sample_counts[&MetricKind::Cpu],
        cpu_stats.count
    );
    assert!(during.metrics[&MetricKind::Memory].avg.is_none());
    assert_eq!(during.runtime.sample_counts[&MetricKind::Memory], 0);
}

#[tokio::test]
async fn duplicate_sampler_kinds_are_ignored() {
    let (first, first_calls) = ScriptedSampler::constant_cpu(10.0);
    let (second, second_calls) = ScriptedSampler::constant_cpu(20.0);
    let (supervisor, _) = supervisor_with(vec![Box::new(first), Box::new(second)]);

    supervisor.start(INTERVAL).unwrap();
    sleep(Duration::from_millis(60)).await;
    supervisor.stop().await.unwrap();

    assert!(first_calls.load(Ordering::SeqCst) > 0);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dropped_stop_still_returns_to_idle() {
    let (cpu, _) = ScriptedSampler::constant_cpu(10.0);
    let (supervisor, _) = supervisor_with(vec![Box::new(cpu)]);

    supervisor.start(INTERVAL).unwrap();
    sleep(Duration::from_millis(50)).await;

    // Poll stop once, then drop it.
    tokio::select! {
        biased;
        _ = supervisor.stop() => {}
        _ = std::future::ready(()) => {}
    }

    for _ in 0..100 {
        if supervisor.state() == MonitorState::Idle {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(supervisor.state(), MonitorState::Idle);

    supervisor.start(INTERVAL).unwrap();
    assert!(supervisor.is_running());
    supervisor.stop().await.unwrap();
    assert_eq!(supervisor.state(), MonitorState::Idle);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn loop_past_the_deadline_is_abandoned() {
    let mut config = quiet_config();
    config.monitoring.stop_timeout_secs = 1;
    let supervisor = MonitorSupervisor::new(
        &config,
        vec![Box::new(BlockingSampler {
            hold: Duration::from_secs(3),
        })],
        Arc::new(RecordingNotifier::default()),
    );

    supervisor.start(INTERVAL).unwrap();
    sleep(Duration::from_millis(100)).await;
    let report = tokio::time::timeout(Duration::from_secs(5), supervisor.stop())
        .await
        .expect("stop should return once the deadline passes")
        .unwrap();

    assert_eq!(report.abandoned, vec!["memory-monitor".to_string()]);
    assert_eq!(supervisor.state(), MonitorState::Idle);
}
