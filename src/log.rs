//! Diagnostics Logging
//!
//! `Logger` is the handle passed to metrics handlers for lifecycle
//! diagnostics. It either parents events under a `tracing` span or drops them.

use tracing::Span;

/// Cloneable diagnostics handle backed by `tracing`
#[derive(Clone, Debug, Default)]
pub struct Logger {
    span: Option<Span>,
}

impl Logger {
    /// Logger whose events are parented to `span`
    pub fn new(span: Span) -> Self {
        Logger { span: Some(span) }
    }

    /// Logger under a fresh `metrics` span for the given component
    pub fn for_component(component: &str) -> Self {
        Logger::new(tracing::info_span!("metrics", component = %component))
    }

    /// Logger that discards everything
    pub fn noop() -> Self {
        Logger { span: None }
    }

    pub fn is_noop(&self) -> bool {
        self.span.is_none()
    }

    /// Trace event for a metric dropped by the allowlist
    #[inline]
    pub fn metric_filtered(&self, metric: &str) {
        if let Some(ref span) = self.span {
            tracing::trace!(parent: span, metric = %metric, "metric filtered out");
        }
    }

    #[inline]
    pub fn debug(&self, message: &str) {
        if let Some(ref span) = self.span {
            tracing::debug!(parent: span, "{}", message);
        }
    }

    #[inline]
    pub fn info(&self, message: &str) {
        if let Some(ref span) = self.span {
            tracing::info!(parent: span, "{}", message);
        }
    }
}

/// Install a global fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Returns an error rather than panicking if a subscriber is already set.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| e.to_string().into())
}
