// Alert delivery collaborator: log line plus optional platform sound.

use std::io::Write;
use std::process::Command;

use crate::models::MetricKind;

/// Receives fired alerts. Called at most once per cooldown window per (metric, threshold).
pub trait Notifier: Send + Sync {
    fn notify(&self, metric: MetricKind, message: &str);
}

/// Logs every alert at WARN and, when enabled, plays a short system sound off the async threads.
#[derive(Debug, Clone)]
pub struct AlertNotifier {
    sound_enabled: bool,
}

impl AlertNotifier {
    pub fn new(sound_enabled: bool) -> Self {
        Self { sound_enabled }
    }
}

impl Notifier for AlertNotifier {
    fn notify(&self, metric: MetricKind, message: &str) {
        tracing::warn!(metric = %metric, "{}", message);
        if !self.sound_enabled {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(play_alert_sound);
            }
            Err(_) => play_alert_sound(),
        }
    }
}

fn play_alert_sound() {
    let result = if cfg!(target_os = "macos") {
        Command::new("afplay")
            .arg("/System/Library/Sounds/Ping.aiff")
            .output()
            .map(|_| ())
    } else if cfg!(target_os = "linux") {
        Command::new("beep").output().map(|_| ())
    } else {
        let mut stderr = std::io::stderr();
        stderr.write_all(b"\x07").and_then(|_| stderr.flush())
    };
    if let Err(e) = result {
        tracing::warn!(error = %e, operation = "play_alert_sound", "alert sound failed");
    }
}
