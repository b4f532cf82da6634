use std::time::{Duration, Instant};

use comparer_logging::cmp_debug;

/// Timing record for one loading method. Every field is unknown until measured.
///
/// Fields only ever get filled in during a load; the record is replaced, not
/// cleared, when a comparison restarts. Whenever both are known,
/// `time_to_fully_loaded >= time_to_first_render`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PerformanceMetrics {
    pub time_to_first_render: Option<Duration>,
    pub time_to_fully_loaded: Option<Duration>,
    pub time_to_interactive: Option<Duration>,
    pub file_size: Option<u64>,
    pub start_time: Option<Instant>,
}

/// Partial update for [`PerformanceMetrics`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsPatch {
    pub time_to_first_render: Option<Duration>,
    pub time_to_fully_loaded: Option<Duration>,
    pub time_to_interactive: Option<Duration>,
    pub file_size: Option<u64>,
    pub start_time: Option<Instant>,
}

impl MetricsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl PerformanceMetrics {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&mut self, patch: MetricsPatch) {
        if let Some(start) = patch.start_time {
            self.start_time = Some(start);
        }
        if let Some(elapsed) = patch.time_to_first_render {
            self.time_to_first_render = Some(elapsed);
        }
        if let Some(elapsed) = patch.time_to_interactive {
            self.time_to_interactive = Some(elapsed);
        }
        if let Some(elapsed) = patch.time_to_fully_loaded {
            self.time_to_fully_loaded = Some(elapsed);
        }
        if let Some(bytes) = patch.file_size {
            self.file_size = Some(bytes);
        }
        self.clamp_fully_loaded();
    }

    /// The viewer exposes no separate interactivity signal, so interactive
    /// time equals first render.
    pub fn record_first_render(&mut self, elapsed: Duration) {
        self.apply(MetricsPatch {
            time_to_first_render: Some(elapsed),
            time_to_interactive: Some(elapsed),
            ..MetricsPatch::default()
        });
    }

    pub fn record_fully_loaded(&mut self, elapsed: Duration) {
        self.apply(MetricsPatch {
            time_to_fully_loaded: Some(elapsed),
            ..MetricsPatch::default()
        });
    }

    fn clamp_fully_loaded(&mut self) {
        if let (Some(first), Some(full)) = (self.time_to_first_render, self.time_to_fully_loaded) {
            if full < first {
                cmp_debug!(
                    "Fully loaded at {:.3}s precedes first render at {:.3}s; clamping",
                    full.as_secs_f64(),
                    first.as_secs_f64()
                );
                self.time_to_fully_loaded = Some(first);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_render_sets_interactive() {
        let mut metrics = PerformanceMetrics::default();
        metrics.record_first_render(Duration::from_millis(420));
        assert_eq!(metrics.time_to_interactive, Some(Duration::from_millis(420)));
        assert_eq!(metrics.time_to_fully_loaded, None);
    }

    #[test]
    fn fully_loaded_never_precedes_first_render() {
        let mut metrics = PerformanceMetrics::default();
        metrics.record_fully_loaded(Duration::from_millis(100));
        metrics.record_first_render(Duration::from_millis(250));
        assert_eq!(metrics.time_to_fully_loaded, Some(Duration::from_millis(250)));

        metrics.record_fully_loaded(Duration::from_millis(50));
        assert_eq!(metrics.time_to_fully_loaded, Some(Duration::from_millis(250)));
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut metrics = PerformanceMetrics {
            file_size: Some(2048),
            ..PerformanceMetrics::default()
        };
        let before = metrics;
        metrics.apply(MetricsPatch::default());
        assert_eq!(metrics, before);
    }
}
