//! Observability: runtime counters and the sink they flow through.
//!
//! Engine code never touches `metrics` state directly; every counter update
//! is a `MetricsEvent` handed to `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
