// Human-readable byte and throughput formatting for logs and alert messages.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;

/// Base-1024 size with two decimals, e.g. `1.50 GB`.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < KB {
            return format!("{:.2} {}", value, unit);
        }
        value /= KB;
    }
    format!("{:.2} PB", value)
}

/// Throughput; plain bytes are printed without decimals.
pub fn format_speed(bytes_per_sec: f64) -> String {
    if bytes_per_sec >= GB {
        format!("{:.2} GB/s", bytes_per_sec / GB)
    } else if bytes_per_sec >= MB {
        format!("{:.2} MB/s", bytes_per_sec / MB)
    } else if bytes_per_sec >= KB {
        format!("{:.2} KB/s", bytes_per_sec / KB)
    } else {
        format!("{:.0} B/s", bytes_per_sec)
    }
}
