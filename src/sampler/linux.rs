// Linux-specific host identity helpers: /proc/cpuinfo and /etc/os-release.

/// First "model name" from /proc/cpuinfo. Preferred over sysinfo, which may only report "cpu0".
pub(super) fn read_cpu_model_linux() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        return content
            .lines()
            .find(|line| line.starts_with("model name"))
            .and_then(|line| line.split_once(':'))
            .map(|(_, name)| name.trim())
            .filter(|name| !name.is_empty() && *name != "cpu0")
            .map(str::to_string);
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// Distribution name from /etc/os-release: PRETTY_NAME, else NAME.
pub(super) fn read_os_distribution_linux() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/etc/os-release").ok()?;
        return os_release_value(&content, "PRETTY_NAME")
            .or_else(|| os_release_value(&content, "NAME"));
    }
    #[cfg(not(target_os = "linux"))]
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn os_release_value(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.trim().trim_matches('"'))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
