//! Observability: execution counters and the sink they flow through.
//!
//! Query execution never touches `metrics` directly; it emits
//! `MetricsEvent`s through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{ClassCounters, ClassSummary, EventOps, EventPerf, EventReport, EventState};
pub use sink::{
    ExecKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink,
};
