//! Allowlist Filtering Handler
//!
//! Wraps another `MetricsHandler` and only lets allowlisted metric names
//! through. Instruments for any other name are the shared no-op sinks, so
//! call sites never need to know whether a metric is filtered.
//!
//! # Usage
//!
//! ```rust
//! use metrics_filter::log::Logger;
//! use metrics_filter::metrics::{new_filtered_metrics_handler, Allowlist, CaptureHandler, MetricsHandler};
//! use std::sync::Arc;
//!
//! let backend = Arc::new(CaptureHandler::new());
//! let capture = backend.start_capture();
//!
//! let handler = new_filtered_metrics_handler(
//!     backend.clone(),
//!     Allowlist::new(["requests"]),
//!     Logger::noop(),
//! );
//!
//! handler.counter("requests").record(1, &[]);
//! handler.counter("debug_only").record(1, &[]);
//!
//! let snapshot = capture.snapshot();
//! assert!(snapshot.contains_key("requests"));
//! assert!(!snapshot.contains_key("debug_only"));
//! ```

use std::sync::Arc;

use super::noop::{NoopCounter, NoopGauge, NoopHistogram, NoopTimer};
use super::{
    Allowlist, BatchCloseError, BatchHandler, CounterIface, GaugeIface, HistogramIface,
    MetricUnit, MetricsHandler, SharedHandler, Tag, TimerIface,
};
use crate::log::Logger;

/// Build a filtering handler over `delegate`.
///
/// An empty or absent `allowed_metrics` lets every metric through.
pub fn new_filtered_metrics_handler(
    delegate: SharedHandler,
    allowed_metrics: impl Into<Allowlist>,
    logger: Logger,
) -> SharedHandler {
    Arc::new(FilteredMetricsHandler::new(delegate, allowed_metrics, logger))
}

/// Handler that forwards allowlisted metrics to `delegate` and discards the rest
#[derive(Clone)]
pub struct FilteredMetricsHandler<D = SharedHandler> {
    delegate: D,
    allowed_metrics: Allowlist,
    logger: Logger,
}

impl<D: MetricsHandler> FilteredMetricsHandler<D> {
    pub fn new(delegate: D, allowed_metrics: impl Into<Allowlist>, logger: Logger) -> Self {
        let allowed_metrics = allowed_metrics.into();
        if allowed_metrics.is_filtering() {
            logger.debug(&format!(
                "metrics filter installed with {} allowed metric(s)",
                allowed_metrics.len()
            ));
        } else {
            logger.debug("metrics filter installed with no allowlist, all metrics pass");
        }
        Self::derived(delegate, allowed_metrics, logger)
    }

    /// Same allowlist and logger, different delegate. No construction logging.
    fn derived(delegate: D, allowed_metrics: Allowlist, logger: Logger) -> Self {
        FilteredMetricsHandler {
            delegate,
            allowed_metrics,
            logger,
        }
    }

    pub fn allowed_metrics(&self) -> &Allowlist {
        &self.allowed_metrics
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    /// Filter over `delegate.with_tags(tags)` sharing our allowlist
    pub(crate) fn tagged(&self, tags: &[Tag]) -> FilteredMetricsHandler<SharedHandler> {
        FilteredMetricsHandler::derived(
            self.delegate.with_tags(tags),
            self.allowed_metrics.clone(),
            self.logger.clone(),
        )
    }

    /// Filter over the delegate's batch sharing our allowlist
    pub(crate) fn batch(&self, name: &str) -> Option<FilteredBatchHandler> {
        let delegate_batch = self.delegate.start_batch(name)?;

        Some(FilteredBatchHandler {
            inner: FilteredMetricsHandler::derived(
                delegate_batch,
                self.allowed_metrics.clone(),
                self.logger.clone(),
            ),
        })
    }

    #[inline]
    fn is_allowed(&self, name: &str) -> bool {
        let allowed = self.allowed_metrics.is_allowed(name);
        if !allowed {
            self.logger.metric_filtered(name);
        }
        allowed
    }
}

impl<D: MetricsHandler> MetricsHandler for FilteredMetricsHandler<D> {
    fn counter(&self, name: &str) -> Arc<dyn CounterIface> {
        if !self.is_allowed(name) {
            return NoopCounter::shared();
        }
        self.delegate.counter(name)
    }

    fn gauge(&self, name: &str) -> Arc<dyn GaugeIface> {
        if !self.is_allowed(name) {
            return NoopGauge::shared();
        }
        self.delegate.gauge(name)
    }

    fn timer(&self, name: &str) -> Arc<dyn TimerIface> {
        if !self.is_allowed(name) {
            return NoopTimer::shared();
        }
        self.delegate.timer(name)
    }

    fn histogram(&self, name: &str, unit: MetricUnit) -> Arc<dyn HistogramIface> {
        if !self.is_allowed(name) {
            return NoopHistogram::shared();
        }
        self.delegate.histogram(name, unit)
    }

    fn with_tags(&self, tags: &[Tag]) -> SharedHandler {
        Arc::new(self.tagged(tags))
    }

    fn stop(&self, logger: &Logger) {
        self.delegate.stop(logger);
        self.logger.info("filtered metrics handler stopped");
    }

    fn start_batch(&self, name: &str) -> Option<Box<dyn BatchHandler>> {
        let batch = self.batch(name)?;
        Some(Box::new(batch))
    }
}

/// Batch session that applies the parent's allowlist to the delegate's batch
pub struct FilteredBatchHandler {
    inner: FilteredMetricsHandler<Box<dyn BatchHandler>>,
}

impl FilteredBatchHandler {
    pub fn allowed_metrics(&self) -> &Allowlist {
        self.inner.allowed_metrics()
    }
}

impl MetricsHandler for FilteredBatchHandler {
    #[inline]
    fn counter(&self, name: &str) -> Arc<dyn CounterIface> {
        self.inner.counter(name)
    }

    #[inline]
    fn gauge(&self, name: &str) -> Arc<dyn GaugeIface> {
        self.inner.gauge(name)
    }

    #[inline]
    fn timer(&self, name: &str) -> Arc<dyn TimerIface> {
        self.inner.timer(name)
    }

    #[inline]
    fn histogram(&self, name: &str, unit: MetricUnit) -> Arc<dyn HistogramIface> {
        self.inner.histogram(name, unit)
    }

    fn with_tags(&self, tags: &[Tag]) -> SharedHandler {
        self.inner.with_tags(tags)
    }

    fn stop(&self, logger: &Logger) {
        self.inner.stop(logger)
    }

    fn start_batch(&self, name: &str) -> Option<Box<dyn BatchHandler>> {
        self.inner.start_batch(name)
    }
}

impl BatchHandler for FilteredBatchHandler {
    /// Close the delegate batch, returning its error as-is
    fn close(self: Box<Self>) -> Result<(), BatchCloseError> {
        self.inner.delegate.close()
    }
}
