pub mod log;
pub mod metrics;

pub use log::Logger;
pub use metrics::{
    new_filtered_metrics_handler, Allowlist, BatchHandler, FilteredMetricsHandler,
    MetricsFilterConfig, MetricsHandler, SharedHandler,
};
