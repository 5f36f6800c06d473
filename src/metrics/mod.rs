use crate::logging::{LogEvent, LogFields, LogLevel};
use serde_json::json;
use std::time::Duration;

/// Counters for one editing runtime.
#[derive(Debug, Default, Clone)]
pub struct EditorMetrics {
    events: u64,
    commits: u64,
    rejections: u64,
    cancels: u64,
    saves: u64,
    skipped_saves: u64,
    anomalies: u64,
}

impl EditorMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self) {
        self.events = self.events.saturating_add(1);
    }

    pub fn record_commit(&mut self) {
        self.commits = self.commits.saturating_add(1);
    }

    pub fn record_rejection(&mut self) {
        self.rejections = self.rejections.saturating_add(1);
    }

    pub fn record_cancel(&mut self) {
        self.cancels = self.cancels.saturating_add(1);
    }

    pub fn record_save(&mut self, written: bool) {
        if written {
            self.saves = self.saves.saturating_add(1);
        } else {
            self.skipped_saves = self.skipped_saves.saturating_add(1);
        }
    }

    pub fn record_anomalies(&mut self, count: usize) {
        if count > 0 {
            self.anomalies = self.anomalies.saturating_add(count as u64);
        }
    }

    pub fn snapshot(&self, uptime: Duration) -> MetricSnapshot {
        MetricSnapshot {
            uptime_ms: uptime.as_millis() as u64,
            events: self.events,
            commits: self.commits,
            rejections: self.rejections,
            cancels: self.cancels,
            saves: self.saves,
            skipped_saves: self.skipped_saves,
            anomalies: self.anomalies,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSnapshot {
    pub uptime_ms: u64,
    pub events: u64,
    pub commits: u64,
    pub rejections: u64,
    pub cancels: u64,
    pub saves: u64,
    pub skipped_saves: u64,
    pub anomalies: u64,
}

impl MetricSnapshot {
    pub fn to_log_event(&self, target: &str) -> LogEvent {
        LogEvent::with_fields(LogLevel::Info, target, "editor_metrics", self.as_fields())
    }

    pub fn as_fields(&self) -> LogFields {
        let mut map = LogFields::new();
        map.insert("uptime_ms".to_string(), json!(self.uptime_ms));
        map.insert("events".to_string(), json!(self.events));
        map.insert("commits".to_string(), json!(self.commits));
        map.insert("rejections".to_string(), json!(self.rejections));
        map.insert("cancels".to_string(), json!(self.cancels));
        map.insert("saves".to_string(), json!(self.saves));
        map.insert("skipped_saves".to_string(), json!(self.skipped_saves));
        map.insert("anomalies".to_string(), json!(self.anomalies));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_separates_written_and_skipped_saves() {
        let mut metrics = EditorMetrics::new();
        metrics.record_save(true);
        metrics.record_save(false);
        metrics.record_save(false);
        metrics.record_anomalies(0);

        let snap = metrics.snapshot(Duration::from_millis(1500));
        assert_eq!(snap.saves, 1);
        assert_eq!(snap.skipped_saves, 2);
        assert_eq!(snap.anomalies, 0);
        assert_eq!(snap.uptime_ms, 1500);
    }

    #[test]
    fn snapshot_log_event_carries_counters() {
        let mut metrics = EditorMetrics::new();
        metrics.record_commit();
        let event = metrics
            .snapshot(Duration::ZERO)
            .to_log_event(crate::logging::TARGET_METRICS);
        assert_eq!(event.message, "editor_metrics");
        assert_eq!(event.field("commits"), Some(&json!(1)));
    }
}
