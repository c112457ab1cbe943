//! Metrics sink boundary.
//!
//! Query execution MUST NOT depend on `obs::metrics` directly.
//! All instrumentation flows through `MetricsEvent` and `MetricsSink`.
use crate::obs::metrics;
use std::{cell::RefCell, time::Instant};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn MetricsSink>> = const { RefCell::new(None) };
}

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExecKind {
    List,
    Unique,
    Result,
    Delete,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MetricsEvent {
    ExecStart {
        kind: ExecKind,
        class_path: &'static str,
    },
    ExecFinish {
        kind: ExecKind,
        class_path: &'static str,
        rows: u64,
        micros: u64,
    },
    RowsScanned {
        class_path: &'static str,
        rows_scanned: u64,
    },
    ParameterBound {
        class_path: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default sink writing into the thread-local counters.
/// Used whenever no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::ExecStart { kind, class_path } => {
                metrics::with_state_mut(|m| {
                    let entry = m.classes.entry(class_path.to_string()).or_default();
                    match kind {
                        ExecKind::List => {
                            m.ops.list_calls = m.ops.list_calls.saturating_add(1);
                            entry.list_calls = entry.list_calls.saturating_add(1);
                        }
                        ExecKind::Unique => {
                            m.ops.unique_calls = m.ops.unique_calls.saturating_add(1);
                            entry.unique_calls = entry.unique_calls.saturating_add(1);
                        }
                        ExecKind::Result => {
                            m.ops.result_calls = m.ops.result_calls.saturating_add(1);
                            entry.result_calls = entry.result_calls.saturating_add(1);
                        }
                        ExecKind::Delete => {
                            m.ops.delete_calls = m.ops.delete_calls.saturating_add(1);
                            entry.delete_calls = entry.delete_calls.saturating_add(1);
                        }
                    }
                });
            }

            MetricsEvent::ExecFinish {
                kind,
                class_path,
                rows,
                micros,
            } => {
                metrics::with_state_mut(|m| {
                    metrics::add_micros(
                        &mut m.perf.exec_micros_total,
                        &mut m.perf.exec_micros_max,
                        micros,
                    );

                    let entry = m.classes.entry(class_path.to_string()).or_default();
                    if kind == ExecKind::Delete {
                        m.ops.rows_deleted = m.ops.rows_deleted.saturating_add(rows);
                        entry.rows_deleted = entry.rows_deleted.saturating_add(rows);
                    } else {
                        m.ops.rows_returned = m.ops.rows_returned.saturating_add(rows);
                        entry.rows_returned = entry.rows_returned.saturating_add(rows);
                    }
                });
            }

            MetricsEvent::RowsScanned {
                class_path,
                rows_scanned,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows_scanned);
                    let entry = m.classes.entry(class_path.to_string()).or_default();
                    entry.rows_scanned = entry.rows_scanned.saturating_add(rows_scanned);
                });
            }

            MetricsEvent::ParameterBound { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.parameters_bound = m.ops.parameters_bound.saturating_add(1);
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());
    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` came from a live `&dyn MetricsSink` in `with_metrics_sink`, which
        //   restores the previous slot on every exit, unwinding included.
        // - `record` is synchronous and never keeps `ptr` past this call.
        // - Only a shared reference is materialized, matching the original borrow.
        unsafe { (*ptr).record(event) };
    } else {
        GLOBAL_METRICS_SINK.record(event);
    }
}

/// Snapshot the current counters.
///
/// `window_start_ms` filters by window start (`EventState::window_start_ms`),
/// not by per-event timestamps.
#[must_use]
pub fn metrics_report(window_start_ms: Option<i64>) -> metrics::EventReport {
    metrics::report_window_start(window_start_ms)
}

/// Reset all counters and timing totals.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override for this thread.
pub fn with_metrics_sink<T>(sink: &dyn MetricsSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn MetricsSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - The erased pointer is installed only for this dynamic scope and
    //   `Guard` restores the previous slot on all exits, including panic.
    // - `record` dereferences it synchronously and never persists it.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn MetricsSink, *const dyn MetricsSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink_ptr));
    let _guard = Guard(prev);

    f()
}

/// Span
/// RAII guard emitting start/finish events for one query execution.
/// Finish accounting also happens on early return and unwind.

pub(crate) struct Span {
    kind: ExecKind,
    class_path: &'static str,
    start: Instant,
    rows: u64,
}

impl Span {
    #[must_use]
    pub(crate) fn new(kind: ExecKind, class_path: &'static str) -> Self {
        record(MetricsEvent::ExecStart { kind, class_path });

        Self {
            kind,
            class_path,
            start: Instant::now(),
            rows: 0,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        let micros = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);

        record(MetricsEvent::ExecFinish {
            kind: self.kind,
            class_path: self.class_path,
            rows: self.rows,
            micros,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink<'a> {
        calls: &'a AtomicUsize,
    }

    impl MetricsSink for CountingSink<'_> {
        fn record(&self, _: MetricsEvent) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn scanned(rows: u64) -> MetricsEvent {
        MetricsEvent::RowsScanned {
            class_path: "obs.tests.Entity",
            rows_scanned: rows,
        }
    }

    #[test]
    fn nested_overrides_route_and_restore() {
        SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = None);

        let outer_calls = AtomicUsize::new(0);
        let inner_calls = AtomicUsize::new(0);
        let outer = CountingSink {
            calls: &outer_calls,
        };
        let inner = CountingSink {
            calls: &inner_calls,
        };

        with_metrics_sink(&outer, || {
            record(scanned(1));
            with_metrics_sink(&inner, || record(scanned(1)));
            record(scanned(1));
        });

        assert_eq!(outer_calls.load(Ordering::SeqCst), 2);
        assert_eq!(inner_calls.load(Ordering::SeqCst), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn override_is_restored_on_panic() {
        SINK_OVERRIDE.with(|cell| *cell.borrow_mut() = None);

        let calls = AtomicUsize::new(0);
        let sink = CountingSink { calls: &calls };

        let panicked = catch_unwind(AssertUnwindSafe(|| {
            with_metrics_sink(&sink, || {
                record(scanned(1));
                panic!("intentional panic for guard test");
            });
        }))
        .is_err();

        assert!(panicked);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        SINK_OVERRIDE.with(|cell| assert!(cell.borrow().is_none()));
    }

    #[test]
    fn span_records_start_and_finish() {
        metrics_reset_all();
        {
            let mut span = Span::new(ExecKind::List, "obs.tests.Entity");
            span.set_rows(3);
        }
        record(scanned(7));

        let report = metrics_report(None);
        let counters = report.counters.expect("counters should be present");
        assert_eq!(counters.ops.list_calls, 1);
        assert_eq!(counters.ops.rows_returned, 3);
        assert_eq!(counters.ops.rows_scanned, 7);

        let class = &report.class_counters[0];
        assert_eq!(class.path, "obs.tests.Entity");
        assert!((class.avg_rows_per_call - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn report_after_window_start_is_empty() {
        metrics_reset_all();
        let start = metrics::with_state(|m| m.window_start_ms);
        record(scanned(1));

        assert!(metrics_report(Some(start + 1)).counters.is_none());
        assert!(metrics_report(Some(start - 1)).counters.is_some());
    }
}
