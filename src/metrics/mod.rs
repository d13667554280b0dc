//! Metrics Handler Abstractions
//!
//! Defines the capability every metrics backend implements:
//! - Instrument accessors (counter, gauge, timer, histogram) bound to a name
//! - Tag scoping via `with_tags`
//! - Batched emission sessions via `start_batch`
//!
//! Backends, the allowlist filter and the no-op sinks all implement the same
//! traits, so any of them can stand in wherever a `SharedHandler` is expected.

pub mod allowlist;
pub mod capture;
pub mod config;
pub mod filtered_handler;
pub mod noop;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::log::Logger;

pub use allowlist::Allowlist;
pub use capture::{Capture, CaptureHandler, CapturedRecording, CapturedValue, MetricType};
pub use config::{ConfigError, MetricsFilterConfig};
pub use filtered_handler::{new_filtered_metrics_handler, FilteredBatchHandler, FilteredMetricsHandler};
pub use noop::{NoopCounter, NoopGauge, NoopHistogram, NoopMetricsHandler, NoopTimer};

/// Key/value pair attached to a recorded value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Tag {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.value)
    }
}

/// Unit attached to a histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MetricUnit {
    #[default]
    Dimensionless,
    Milliseconds,
    Bytes,
}

impl MetricUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricUnit::Dimensionless => "1",
            MetricUnit::Milliseconds => "ms",
            MetricUnit::Bytes => "By",
        }
    }
}

impl fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic counter instrument
pub trait CounterIface: Send + Sync {
    fn record(&self, delta: i64, tags: &[Tag]);
}

/// Point-in-time gauge instrument
pub trait GaugeIface: Send + Sync {
    fn record(&self, value: f64, tags: &[Tag]);
}

/// Duration instrument
pub trait TimerIface: Send + Sync {
    fn record(&self, duration: Duration, tags: &[Tag]);
}

/// Distribution instrument
pub trait HistogramIface: Send + Sync {
    fn record(&self, value: i64, tags: &[Tag]);
}

/// Error surfaced by a backend when a batch fails to flush on close.
///
/// Boxed so the backend's own error passes through unchanged and can still be
/// downcast by the caller.
pub type BatchCloseError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Trait for obtaining named metric instruments
pub trait MetricsHandler: Send + Sync {
    /// Counter instrument for `name`
    fn counter(&self, name: &str) -> Arc<dyn CounterIface>;

    /// Gauge instrument for `name`
    fn gauge(&self, name: &str) -> Arc<dyn GaugeIface>;

    /// Timer instrument for `name`
    fn timer(&self, name: &str) -> Arc<dyn TimerIface>;

    /// Histogram instrument for `name` measured in `unit`
    fn histogram(&self, name: &str, unit: MetricUnit) -> Arc<dyn HistogramIface>;

    /// Derive a handler whose instruments carry `tags` in addition to ours
    fn with_tags(&self, tags: &[Tag]) -> SharedHandler;

    /// Flush and shut down the backend
    fn stop(&self, logger: &Logger);

    /// Open a batch session, or `None` when the backend does not batch
    fn start_batch(&self, name: &str) -> Option<Box<dyn BatchHandler>>;
}

/// A scoped emission session. Must be closed once by whoever started it.
pub trait BatchHandler: MetricsHandler {
    fn close(self: Box<Self>) -> Result<(), BatchCloseError>;
}

/// Arc wrapper for trait object usage
pub type SharedHandler = Arc<dyn MetricsHandler>;

impl<H: MetricsHandler + ?Sized> MetricsHandler for Arc<H> {
    #[inline]
    fn counter(&self, name: &str) -> Arc<dyn CounterIface> {
        (**self).counter(name)
    }

    #[inline]
    fn gauge(&self, name: &str) -> Arc<dyn GaugeIface> {
        (**self).gauge(name)
    }

    #[inline]
    fn timer(&self, name: &str) -> Arc<dyn TimerIface> {
        (**self).timer(name)
    }

    #[inline]
    fn histogram(&self, name: &str, unit: MetricUnit) -> Arc<dyn HistogramIface> {
        (**self).histogram(name, unit)
    }

    fn with_tags(&self, tags: &[Tag]) -> SharedHandler {
        (**self).with_tags(tags)
    }

    fn stop(&self, logger: &Logger) {
        (**self).stop(logger)
    }

    fn start_batch(&self, name: &str) -> Option<Box<dyn BatchHandler>> {
        (**self).start_batch(name)
    }
}

impl<H: MetricsHandler + ?Sized> MetricsHandler for Box<H> {
    #[inline]
    fn counter(&self, name: &str) -> Arc<dyn CounterIface> {
        (**self).counter(name)
    }

    #[inline]
    fn gauge(&self, name: &str) -> Arc<dyn GaugeIface> {
        (**self).gauge(name)
    }

    #[inline]
    fn timer(&self, name: &str) -> Arc<dyn TimerIface> {
        (**self).timer(name)
    }

    #[inline]
    fn histogram(&self, name: &str, unit: MetricUnit) -> Arc<dyn HistogramIface> {
        (**self).histogram(name, unit)
    }

    fn with_tags(&self, tags: &[Tag]) -> SharedHandler {
        (**self).with_tags(tags)
    }

    fn stop(&self, logger: &Logger) {
        (**self).stop(logger)
    }

    fn start_batch(&self, name: &str) -> Option<Box<dyn BatchHandler>> {
        (**self).start_batch(name)
    }
}
