use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters accumulated across passes on one container.
#[derive(Debug, Default, Clone)]
pub struct PassMetrics {
    passes: u64,
    cancelled: u64,
    interrupted: u64,
    items_placed: u64,
    items_hidden: u64,
    slots_swept: u64,
}

impl PassMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completed(&mut self, placed: usize, hidden: usize, swept: usize) {
        self.passes = self.passes.saturating_add(1);
        self.items_placed = self.items_placed.saturating_add(placed as u64);
        self.items_hidden = self.items_hidden.saturating_add(hidden as u64);
        self.slots_swept = self.slots_swept.saturating_add(swept as u64);
    }

    pub fn record_cancelled(&mut self) {
        self.cancelled = self.cancelled.saturating_add(1);
    }

    pub fn record_interrupted(&mut self) {
        self.interrupted = self.interrupted.saturating_add(1);
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            passes: self.passes,
            cancelled: self.cancelled,
            interrupted: self.interrupted,
            items_placed: self.items_placed,
            items_hidden: self.items_hidden,
            slots_swept: self.slots_swept,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub passes: u64,
    pub cancelled: u64,
    pub interrupted: u64,
    pub items_placed: u64,
    pub items_hidden: u64,
    pub slots_swept: u64,
}

impl MetricSnapshot {
    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("passes".to_string(), json!(self.passes));
        map.insert("cancelled".to_string(), json!(self.cancelled));
        map.insert("interrupted".to_string(), json!(self.interrupted));
        map.insert("items_placed".to_string(), json!(self.items_placed));
        map.insert("items_hidden".to_string(), json!(self.items_hidden));
        map.insert("slots_swept".to_string(), json!(self.slots_swept));
        map
    }

    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(
            LogLevel::Info,
            target.to_string(),
            "pass_metrics".to_string(),
            self.as_fields(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_across_passes() {
        let mut metrics = PassMetrics::new();
        metrics.record_completed(3, 1, 0);
        metrics.record_completed(2, 0, 0);
        metrics.record_cancelled();
        metrics.record_interrupted();

        let snapshot = metrics.snapshot(Duration::from_millis(1500));
        assert_eq!(snapshot.uptime_ms, 1500);
        assert_eq!(snapshot.passes, 2);
        assert_eq!(snapshot.cancelled, 1);
        assert_eq!(snapshot.interrupted, 1);
        assert_eq!(snapshot.items_placed, 5);
        assert_eq!(snapshot.items_hidden, 1);
    }

    #[test]
    fn snapshot_converts_to_a_log_event() {
        let metrics = PassMetrics::new();
        let event = metrics
            .snapshot(Duration::from_secs(2))
            .to_log_event("cobble::runtime.metrics");
        assert_eq!(event.message, "pass_metrics");
        assert_eq!(event.target, "cobble::runtime.metrics");
        assert!(event.fields.contains_key("passes"));
    }
}
