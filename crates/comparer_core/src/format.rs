use std::time::Duration;

const PLACEHOLDER: &str = "—";

/// Seconds with two decimals, e.g. `1.25s`.
pub fn format_time(elapsed: Option<Duration>) -> String {
    match elapsed {
        Some(elapsed) => format!("{:.2}s", elapsed.as_secs_f64()),
        None => PLACEHOLDER.to_string(),
    }
}

/// Mebibytes with two decimals, labelled `MB`.
pub fn format_size(bytes: Option<u64>) -> String {
    match bytes {
        Some(bytes) => format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0)),
        None => PLACEHOLDER.to_string(),
    }
}

/// `1 Method`, `2 Methods`.
pub fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
