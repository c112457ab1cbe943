use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters and simple timing totals for query execution.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub perf: EventPerf,
    pub classes: BTreeMap<String, ClassCounters>,
    pub window_start_ms: i64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            perf: EventPerf::default(),
            classes: BTreeMap::new(),
            window_start_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // entrypoints
    pub list_calls: u64,
    pub unique_calls: u64,
    pub result_calls: u64,
    pub delete_calls: u64,

    // rows touched
    pub rows_returned: u64,
    pub rows_scanned: u64,
    pub rows_deleted: u64,

    pub parameters_bound: u64,
}

///
/// ClassCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ClassCounters {
    pub list_calls: u64,
    pub unique_calls: u64,
    pub result_calls: u64,
    pub delete_calls: u64,
    pub rows_returned: u64,
    pub rows_scanned: u64,
    pub rows_deleted: u64,
}

///
/// EventPerf
/// Wall-clock totals in microseconds.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventPerf {
    pub exec_micros_total: u128,
    pub exec_micros_max: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all counters and restart the window.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Accumulate a duration and track the max.
pub(crate) fn add_micros(total: &mut u128, max: &mut u64, delta: u64) {
    *total = total.saturating_add(u128::from(delta));
    if delta > *max {
        *max = delta;
    }
}

///
/// EventReport
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Counters since `window_start_ms`; absent when the requested window
    /// starts after the current one.
    pub counters: Option<EventState>,
    pub class_counters: Vec<ClassSummary>,
}

///
/// ClassSummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ClassSummary {
    pub path: String,
    pub calls: u64,
    pub rows_returned: u64,
    pub rows_scanned: u64,
    pub rows_deleted: u64,
    pub avg_rows_per_call: f64,
    pub avg_rows_scanned_per_call: f64,
}

/// Build a report, or an empty one if `window_start_ms` is after the
/// current window start.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub(crate) fn report_window_start(window_start_ms: Option<i64>) -> EventReport {
    let snap = with_state(Clone::clone);
    if window_start_ms.is_some_and(|start| start > snap.window_start_ms) {
        return EventReport::default();
    }

    let mut class_counters: Vec<ClassSummary> = snap
        .classes
        .iter()
        .map(|(path, c)| {
            let calls = c.list_calls + c.unique_calls + c.result_calls + c.delete_calls;
            let avg = |n: u64| {
                if calls > 0 {
                    n as f64 / calls as f64
                } else {
                    0.0
                }
            };

            ClassSummary {
                path: path.clone(),
                calls,
                rows_returned: c.rows_returned,
                rows_scanned: c.rows_scanned,
                rows_deleted: c.rows_deleted,
                avg_rows_per_call: avg(c.rows_returned),
                avg_rows_scanned_per_call: avg(c.rows_scanned),
            }
        })
        .collect();

    // busiest classes first
    class_counters.sort_by(|a, b| {
        b.rows_scanned
            .cmp(&a.rows_scanned)
            .then_with(|| a.path.cmp(&b.path))
    });

    EventReport {
        counters: Some(snap),
        class_counters,
    }
}
