//! Text formatting for line annotations.

/// `12.3MB`, or `1.5GB` from 1024 MB up.
pub fn format_memory(rss_bytes: u64) -> String {
    let mb = rss_bytes as f64 / (1024.0 * 1024.0);
    if mb >= 1024.0 {
        format!("{:.1}GB", mb / 1024.0)
    } else {
        format!("{:.1}MB", mb)
    }
}

/// `XhYm` from one hour up, else `Ym`; `?` when the start time is unknown.
pub fn format_uptime(start_time: Option<i64>, now: i64) -> String {
    let Some(start) = start_time else {
        return "?".to_string();
    };
    let elapsed = now.saturating_sub(start).max(0);
    let hours = elapsed / 3600;
    let minutes = (elapsed % 3600) / 60;
    if hours > 0 {
        format!("{}h{}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// First `width` characters, with `...` appended when anything was cut.
pub fn truncate_cmdline(cmdline: &str, width: usize) -> String {
    match cmdline.char_indices().nth(width) {
        Some((cut, _)) => format!("{}...", &cmdline[..cut]),
        None => cmdline.to_string(),
    }
}
