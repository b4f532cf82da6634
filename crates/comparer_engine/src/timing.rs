use std::sync::Mutex;
use std::time::{Duration, Instant};

use comparer_core::LoadingMethod;
use comparer_logging::{cmp_info, cmp_warn};

const MIB: f64 = 1024.0 * 1024.0;

/// One network request, with offsets measured from the recorder's origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceTiming {
    pub name: String,
    pub start_time: Duration,
    pub duration: Duration,
    pub transfer_size: u64,
    pub encoded_body_size: u64,
    pub decoded_body_size: u64,
    pub request_start: Duration,
    pub response_start: Duration,
    pub response_end: Duration,
}

impl ResourceTiming {
    pub fn time_to_first_byte(&self) -> Duration {
        self.response_start.saturating_sub(self.request_start)
    }

    pub fn download_time(&self) -> Duration {
        self.response_end.saturating_sub(self.response_start)
    }

    fn end_time(&self) -> Duration {
        self.start_time + self.duration
    }
}

/// Where the harness reads recorded requests from.
pub trait ResourceTimingSource: Send + Sync {
    fn entries(&self) -> Vec<ResourceTiming>;
}

/// In-memory resource timing buffer shared by everything issuing requests.
#[derive(Debug)]
pub struct TimingRecorder {
    origin: Instant,
    entries: Mutex<Vec<ResourceTiming>>,
}

impl Default for TimingRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingRecorder {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Offset from the recorder's origin.
    pub fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    pub fn record(&self, entry: ResourceTiming) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl ResourceTimingSource for TimingRecorder {
    fn entries(&self) -> Vec<ResourceTiming> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

/// Aggregate of every request made for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSummary {
    pub requests: usize,
    pub total_transferred: u64,
    pub total_encoded: u64,
    /// From the first request start to the last response end.
    pub total_time: Duration,
    /// `None` when the requests took no measurable time.
    pub throughput_mib_per_sec: Option<f64>,
}

/// Last path segment of a URL, ignoring query and fragment.
pub fn file_name_of(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

pub fn matching_entries(entries: &[ResourceTiming], file_name: &str) -> Vec<ResourceTiming> {
    if file_name.is_empty() {
        return Vec::new();
    }
    entries
        .iter()
        .filter(|entry| entry.name.contains(file_name))
        .cloned()
        .collect()
}

pub fn summarize_network(entries: &[ResourceTiming]) -> Option<NetworkSummary> {
    let first_start = entries.iter().map(|entry| entry.start_time).min()?;
    let last_end = entries.iter().map(ResourceTiming::end_time).max()?;
    let total_transferred = entries.iter().map(|entry| entry.transfer_size).sum::<u64>();
    let total_encoded = entries.iter().map(|entry| entry.encoded_body_size).sum();
    let total_time = last_end.saturating_sub(first_start);
    let throughput_mib_per_sec = (!total_time.is_zero())
        .then(|| total_transferred as f64 / MIB / total_time.as_secs_f64());

    Some(NetworkSummary {
        requests: entries.len(),
        total_transferred,
        total_encoded,
        total_time,
        throughput_mib_per_sec,
    })
}

/// Diagnostic-only network analysis for one method's document.
pub fn log_network_summary(method: LoadingMethod, url: &str, source: &dyn ResourceTimingSource) {
    let file_name = file_name_of(url);
    let entries = matching_entries(&source.entries(), file_name);
    let Some(summary) = summarize_network(&entries) else {
        cmp_warn!("[{method}] No resource timing entries found for {file_name}");
        return;
    };

    cmp_info!("[{method}] ===== RESOURCE TIMING ANALYSIS FOR {file_name} =====");
    for (index, entry) in entries.iter().enumerate() {
        cmp_info!(
            "[{method}] Request #{}: start={:.2}ms duration={:.2}ms transfer={} bytes ({:.2} MB) encoded={} decoded={} ttfb={:.2}ms download={:.2}ms",
            index + 1,
            millis(entry.start_time),
            millis(entry.duration),
            entry.transfer_size,
            entry.transfer_size as f64 / MIB,
            entry.encoded_body_size,
            entry.decoded_body_size,
            millis(entry.time_to_first_byte()),
            millis(entry.download_time()),
        );
    }
    cmp_info!("[{method}] Total requests: {}", summary.requests);
    cmp_info!(
        "[{method}] Total bytes transferred: {} ({:.2} MB)",
        summary.total_transferred,
        summary.total_transferred as f64 / MIB
    );
    cmp_info!(
        "[{method}] Total encoded body size: {} ({:.2} MB)",
        summary.total_encoded,
        summary.total_encoded as f64 / MIB
    );
    cmp_info!(
        "[{method}] Total network time: {:.2} ms ({:.2}s)",
        millis(summary.total_time),
        summary.total_time.as_secs_f64()
    );
    match summary.throughput_mib_per_sec {
        Some(rate) => cmp_info!("[{method}] Average download speed: {rate:.2} MB/s"),
        None => cmp_info!("[{method}] Average download speed: n/a"),
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, start_ms: u64, duration_ms: u64, bytes: u64) -> ResourceTiming {
        let start = Duration::from_millis(start_ms);
        ResourceTiming {
            name: name.to_string(),
            start_time: start,
            duration: Duration::from_millis(duration_ms),
            transfer_size: bytes,
            encoded_body_size: bytes,
            decoded_body_size: bytes,
            request_start: start,
            response_start: start + Duration::from_millis(duration_ms / 2),
            response_end: start + Duration::from_millis(duration_ms),
        }
    }

    #[test]
    fn file_name_strips_path_and_query() {
        assert_eq!(file_name_of("https://host/docs/a.pdf?x=1"), "a.pdf");
        assert_eq!(file_name_of("a.pdf"), "a.pdf");
        assert_eq!(file_name_of("https://host/docs/"), "");
    }

    #[test]
    fn summary_spans_first_start_to_last_end() {
        let entries = vec![
            entry("https://h/doc.pdf", 100, 400, 512 * 1024),
            entry("https://h/doc.pdf", 200, 800, 512 * 1024),
        ];
        let summary = summarize_network(&entries).unwrap();
        assert_eq!(summary.requests, 2);
        assert_eq!(summary.total_transferred, 1024 * 1024);
        assert_eq!(summary.total_time, Duration::from_millis(900));
        let rate = summary.throughput_mib_per_sec.unwrap();
        assert!((rate - 1.0 / 0.9).abs() < 1e-9);
    }

    #[test]
    fn only_matching_entries_are_kept() {
        let entries = vec![
            entry("https://h/doc.pdf", 0, 10, 1),
            entry("https://h/other.pdf", 0, 10, 1),
            entry("https://h/doc.pdf?part=2", 0, 10, 1),
        ];
        assert_eq!(matching_entries(&entries, "doc.pdf").len(), 2);
        assert!(matching_entries(&entries, "").is_empty());
        assert_eq!(summarize_network(&[]), None);
    }

    #[test]
    fn zero_duration_has_no_throughput() {
        let summary = summarize_network(&[entry("a.pdf", 5, 0, 10)]).unwrap();
        assert_eq!(summary.throughput_mib_per_sec, None);
    }
}
