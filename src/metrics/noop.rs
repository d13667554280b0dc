//! No-op instruments
//!
//! Zero-sized sinks handed out for metrics that should not reach a backend.
//! Each kind has one process-wide instance so the discard path never allocates.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;

use super::{
    BatchCloseError, BatchHandler, CounterIface, GaugeIface, HistogramIface, MetricUnit,
    MetricsHandler, SharedHandler, Tag, TimerIface,
};
use crate::log::Logger;

static NOOP_COUNTER: Lazy<Arc<dyn CounterIface>> = Lazy::new(|| Arc::new(NoopCounter));
static NOOP_GAUGE: Lazy<Arc<dyn GaugeIface>> = Lazy::new(|| Arc::new(NoopGauge));
static NOOP_TIMER: Lazy<Arc<dyn TimerIface>> = Lazy::new(|| Arc::new(NoopTimer));
static NOOP_HISTOGRAM: Lazy<Arc<dyn HistogramIface>> = Lazy::new(|| Arc::new(NoopHistogram));

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCounter;

impl NoopCounter {
    /// Shared instance
    #[inline]
    pub fn shared() -> Arc<dyn CounterIface> {
        Arc::clone(&NOOP_COUNTER)
    }
}

impl CounterIface for NoopCounter {
    #[inline(always)]
    fn record(&self, _delta: i64, _tags: &[Tag]) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGauge;

impl NoopGauge {
    /// Shared instance
    #[inline]
    pub fn shared() -> Arc<dyn GaugeIface> {
        Arc::clone(&NOOP_GAUGE)
    }
}

impl GaugeIface for NoopGauge {
    #[inline(always)]
    fn record(&self, _value: f64, _tags: &[Tag]) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTimer;

impl NoopTimer {
    /// Shared instance
    #[inline]
    pub fn shared() -> Arc<dyn TimerIface> {
        Arc::clone(&NOOP_TIMER)
    }
}

impl TimerIface for NoopTimer {
    #[inline(always)]
    fn record(&self, _duration: Duration, _tags: &[Tag]) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHistogram;

impl NoopHistogram {
    /// Shared instance
    #[inline]
    pub fn shared() -> Arc<dyn HistogramIface> {
        Arc::clone(&NOOP_HISTOGRAM)
    }
}

impl HistogramIface for NoopHistogram {
    #[inline(always)]
    fn record(&self, _value: i64, _tags: &[Tag]) {}
}

/// Handler that hands out no-op instruments for every name
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetricsHandler;

impl NoopMetricsHandler {
    pub fn shared() -> SharedHandler {
        Arc::new(NoopMetricsHandler)
    }
}

impl MetricsHandler for NoopMetricsHandler {
    #[inline]
    fn counter(&self, _name: &str) -> Arc<dyn CounterIface> {
        NoopCounter::shared()
    }

    #[inline]
    fn gauge(&self, _name: &str) -> Arc<dyn GaugeIface> {
        NoopGauge::shared()
    }

    #[inline]
    fn timer(&self, _name: &str) -> Arc<dyn TimerIface> {
        NoopTimer::shared()
    }

    #[inline]
    fn histogram(&self, _name: &str, _unit: MetricUnit) -> Arc<dyn HistogramIface> {
        NoopHistogram::shared()
    }

    fn with_tags(&self, _tags: &[Tag]) -> SharedHandler {
        NoopMetricsHandler::shared()
    }

    fn stop(&self, _logger: &Logger) {}

    fn start_batch(&self, _name: &str) -> Option<Box<dyn BatchHandler>> {
        Some(Box::new(NoopMetricsHandler))
    }
}

impl BatchHandler for NoopMetricsHandler {
    fn close(self: Box<Self>) -> Result<(), BatchCloseError> {
        Ok(())
    }
}
