//! In-memory capturing backend
//!
//! `CaptureHandler` records every value into each active `Capture` so tests
//! and simulations can assert exactly what reached the backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{
    BatchCloseError, BatchHandler, CounterIface, GaugeIface, HistogramIface, MetricUnit,
    MetricsHandler, SharedHandler, Tag, TimerIface,
};
use crate::log::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Timer,
    Histogram,
}

/// Value recorded through one instrument call
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedValue {
    Counter(i64),
    Gauge(f64),
    Timer(Duration),
    Histogram(i64),
}

impl CapturedValue {
    pub fn metric_type(&self) -> MetricType {
        match self {
            CapturedValue::Counter(_) => MetricType::Counter,
            CapturedValue::Gauge(_) => MetricType::Gauge,
            CapturedValue::Timer(_) => MetricType::Timer,
            CapturedValue::Histogram(_) => MetricType::Histogram,
        }
    }
}

/// Recorded metric for testing/simulation
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRecording {
    pub value: CapturedValue,
    pub tags: Vec<Tag>,
    /// Only set for histograms
    pub unit: Option<MetricUnit>,
}

impl CapturedRecording {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .rev()
            .find(|t| t.key == key)
            .map(|t| t.value.as_str())
    }
}

/// Recordings gathered between `start_capture` and `stop_capture`
#[derive(Debug, Default)]
pub struct Capture {
    recordings: Mutex<HashMap<String, Vec<CapturedRecording>>>,
}

impl Capture {
    /// Copy of everything recorded so far, keyed by metric name
    pub fn snapshot(&self) -> HashMap<String, Vec<CapturedRecording>> {
        self.recordings.lock().clone()
    }

    /// Get recordings by name
    pub fn get_by_name(&self, name: &str) -> Vec<CapturedRecording> {
        self.recordings
            .lock()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `name` was recorded as the given kind
    pub fn assert_metric(&self, name: &str, metric_type: MetricType) -> bool {
        self.recordings
            .lock()
            .get(name)
            .is_some_and(|recs| recs.iter().any(|r| r.value.metric_type() == metric_type))
    }

    /// Total number of recordings across all names
    pub fn len(&self) -> usize {
        self.recordings.lock().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.recordings.lock().clear();
    }

    fn push(&self, name: &str, recording: CapturedRecording) {
        self.recordings
            .lock()
            .entry(name.to_string())
            .or_default()
            .push(recording);
    }
}

#[derive(Default)]
struct CaptureState {
    captures: Mutex<Vec<Arc<Capture>>>,
    stopped: AtomicBool,
}

impl CaptureState {
    fn record(&self, name: &str, value: CapturedValue, tags: Vec<Tag>, unit: Option<MetricUnit>) {
        let captures = self.captures.lock();
        for capture in captures.iter() {
            capture.push(
                name,
                CapturedRecording {
                    value: value.clone(),
                    tags: tags.clone(),
                    unit,
                },
            );
        }
    }
}

/// Metrics backend that records everything into active captures
#[derive(Clone)]
pub struct CaptureHandler {
    state: Arc<CaptureState>,
    tags: Vec<Tag>,
    batching: bool,
}

impl Default for CaptureHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureHandler {
    pub fn new() -> Self {
        CaptureHandler {
            state: Arc::new(CaptureState::default()),
            tags: Vec::new(),
            batching: true,
        }
    }

    /// Capture handler whose `start_batch` always returns `None`
    pub fn without_batching() -> Self {
        CaptureHandler {
            batching: false,
            ..Self::new()
        }
    }

    /// Begin recording into a new capture
    pub fn start_capture(&self) -> Arc<Capture> {
        let capture = Arc::new(Capture::default());
        self.state.captures.lock().push(Arc::clone(&capture));
        capture
    }

    /// Stop recording into `capture`. Already recorded values are kept.
    pub fn stop_capture(&self, capture: &Arc<Capture>) {
        self.state
            .captures
            .lock()
            .retain(|c| !Arc::ptr_eq(c, capture));
    }

    /// Whether `stop` has been called on this handler or any derived one
    pub fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::SeqCst)
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    fn instrument(&self, name: &str, unit: Option<MetricUnit>) -> Arc<CaptureInstrument> {
        Arc::new(CaptureInstrument {
            state: Arc::clone(&self.state),
            name: name.to_string(),
            tags: self.tags.clone(),
            unit,
        })
    }
}

impl MetricsHandler for CaptureHandler {
    fn counter(&self, name: &str) -> Arc<dyn CounterIface> {
        self.instrument(name, None)
    }

    fn gauge(&self, name: &str) -> Arc<dyn GaugeIface> {
        self.instrument(name, None)
    }

    fn timer(&self, name: &str) -> Arc<dyn TimerIface> {
        self.instrument(name, None)
    }

    fn histogram(&self, name: &str, unit: MetricUnit) -> Arc<dyn HistogramIface> {
        self.instrument(name, Some(unit))
    }

    fn with_tags(&self, tags: &[Tag]) -> SharedHandler {
        let mut merged = self.tags.clone();
        for tag in tags {
            match merged.iter_mut().find(|t| t.key == tag.key) {
                Some(existing) => existing.value = tag.value.clone(),
                None => merged.push(tag.clone()),
            }
        }
        Arc::new(CaptureHandler {
            state: Arc::clone(&self.state),
            tags: merged,
            batching: self.batching,
        })
    }

    fn stop(&self, logger: &Logger) {
        self.state.stopped.store(true, Ordering::SeqCst);
        logger.info("capture handler stopped");
    }

    fn start_batch(&self, _name: &str) -> Option<Box<dyn BatchHandler>> {
        if !self.batching {
            return None;
        }
        Some(Box::new(self.clone()))
    }
}

impl BatchHandler for CaptureHandler {
    fn close(self: Box<Self>) -> Result<(), BatchCloseError> {
        Ok(())
    }
}

struct CaptureInstrument {
    state: Arc<CaptureState>,
    name: String,
    tags: Vec<Tag>,
    unit: Option<MetricUnit>,
}

impl CaptureInstrument {
    fn emit(&self, value: CapturedValue, tags: &[Tag]) {
        let all_tags = self.tags.iter().chain(tags.iter()).cloned().collect();
        self.state.record(&self.name, value, all_tags, self.unit);
    }
}

impl CounterIface for CaptureInstrument {
    fn record(&self, delta: i64, tags: &[Tag]) {
        self.emit(CapturedValue::Counter(delta), tags)
    }
}

impl GaugeIface for CaptureInstrument {
    fn record(&self, value: f64, tags: &[Tag]) {
        self.emit(CapturedValue::Gauge(value), tags)
    }
}

impl TimerIface for CaptureInstrument {
    fn record(&self, duration: Duration, tags: &[Tag]) {
        self.emit(CapturedValue::Timer(duration), tags)
    }
}

impl HistogramIface for CaptureInstrument {
    fn record(&self, value: i64, tags: &[Tag]) {
        self.emit(CapturedValue::Histogram(value), tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_records_all_kinds() {
        let handler = CaptureHandler::new();
        let capture = handler.start_capture();

        handler.counter("test.counter").record(3, &[Tag::new("tag", "value")]);
        handler.gauge("test.gauge").record(100.0, &[]);
        handler.timer("test.timer").record(Duration::from_millis(5), &[]);
        handler.histogram("test.histogram", MetricUnit::Bytes).record(42, &[]);

        assert_eq!(capture.len(), 4);
        assert!(capture.assert_metric("test.counter", MetricType::Counter));
        assert!(capture.assert_metric("test.gauge", MetricType::Gauge));
        assert!(capture.assert_metric("test.timer", MetricType::Timer));
        assert!(capture.assert_metric("test.histogram", MetricType::Histogram));
        assert!(!capture.assert_metric("test.counter", MetricType::Gauge));

        let counter = &capture.get_by_name("test.counter")[0];
        assert_eq!(counter.value, CapturedValue::Counter(3));
        assert_eq!(counter.tag("tag"), Some("value"));
        assert_eq!(counter.unit, None);

        let histogram = &capture.get_by_name("test.histogram")[0];
        assert_eq!(histogram.unit, Some(MetricUnit::Bytes));
    }

    #[test]
    fn test_stop_capture_keeps_recorded() {
        let handler = CaptureHandler::new();
        let capture = handler.start_capture();

        handler.counter("before").record(1, &[]);
        handler.stop_capture(&capture);
        handler.counter("after").record(1, &[]);

        let snapshot = capture.snapshot();
        assert!(snapshot.contains_key("before"));
        assert!(!snapshot.contains_key("after"));
    }

    #[test]
    fn test_multiple_captures() {
        let handler = CaptureHandler::new();
        let first = handler.start_capture();
        handler.counter("one").record(1, &[]);
        let second = handler.start_capture();
        handler.counter("two").record(1, &[]);

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);
        assert!(second.get_by_name("one").is_empty());
    }

    #[test]
    fn test_with_tags_accumulates_and_overrides() {
        let handler = CaptureHandler::new();
        let capture = handler.start_capture();

        let scoped = handler
            .with_tags(&[Tag::new("service", "history"), Tag::new("shard", "1")])
            .with_tags(&[Tag::new("shard", "2")]);
        scoped.counter("c").record(1, &[Tag::new("op", "read")]);

        let rec = &capture.get_by_name("c")[0];
        assert_eq!(
            rec.tags,
            vec![
                Tag::new("service", "history"),
                Tag::new("shard", "2"),
                Tag::new("op", "read"),
            ]
        );
    }

    #[test]
    fn test_batching_toggle() {
        assert!(CaptureHandler::new().start_batch("b").is_some());
        assert!(CaptureHandler::without_batching().start_batch("b").is_none());
        assert!(CaptureHandler::without_batching()
            .with_tags(&[])
            .start_batch("b")
            .is_none());
    }

    #[test]
    fn test_stop_marks_stopped() {
        let handler = CaptureHandler::new();
        assert!(!handler.is_stopped());
        handler.with_tags(&[Tag::new("a", "b")]).stop(&Logger::noop());
        assert!(handler.is_stopped());
    }

    #[test]
    fn test_clear() {
        let handler = CaptureHandler::new();
        let capture = handler.start_capture();
        handler.counter("c").record(1, &[]);
        assert!(!capture.is_empty());
        capture.clear();
        assert!(capture.is_empty());
    }
}
