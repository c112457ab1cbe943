//! In-memory query execution.
//!
//! Pipeline: validate, read candidates, filter (binding variables), group
//! and apply `having` for grouped projections, order, project, drop
//! duplicates, then cut the result window.

mod error;
mod eval;
mod functions;


use crate::{
    expr::{Expr, NullOrdering, OrderDirection, OrderExpression},
    obs::sink::{ExecKind, MetricsEvent, Span, record},
    pm::{Datastore, FetchPlan},
    query::{QueryError, QueryState, RangeSpec, Rendered, check_range, is_grouped, validate},
    value::{Value, canonical_cmp, compare_values},
};
use eval::{EvalContext, Scope, same_row, truth};
use std::{cmp::Ordering, collections::BTreeMap};

// re-exports
pub use error::EvalError;

// One ordered, projected unit of output: its order keys and its row.
type Unit = (Vec<Value>, Vec<Value>);

///
/// Executor
///
/// Runs one execution of a query against a datastore. Holds no state
/// between executions.
///

pub(crate) struct Executor<'a> {
    ctx: EvalContext<'a>,
    datastore: &'a dyn Datastore,
    state: &'a QueryState,
    max_fetch_depth: i32,
    debug: bool,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(
        datastore: &'a dyn Datastore,
        state: &'a QueryState,
        fetch_plan: &'a FetchPlan,
        debug: bool,
    ) -> Self {
        Self {
            ctx: EvalContext::new(
                datastore,
                &state.bindings,
                fetch_plan,
                &state.extensions,
                state.ignore_cache,
            ),
            datastore,
            state,
            max_fetch_depth: fetch_plan.max_fetch_depth(),
            debug,
        }
    }

    fn debug_log(&self, s: impl AsRef<str>) {
        if self.debug {
            log::debug!("[jdoql] {}", s.as_ref());
        }
    }

    /// Result rows; `result` of `None` projects each candidate as a
    /// one-column row.
    pub(crate) fn rows(
        &self,
        kind: ExecKind,
        distinct: bool,
        result: Option<&[Expr]>,
    ) -> Result<Vec<Vec<Value>>, QueryError> {
        let mut span = Span::new(kind, self.state.class.path);
        let rows = self.collect(distinct, result)?;
        span.set_rows(u64::try_from(rows.len()).unwrap_or(u64::MAX));

        Ok(rows)
    }

    /// Delete every candidate the query selects; returns the number removed.
    pub(crate) fn delete(&self) -> Result<u64, QueryError> {
        let mut span = Span::new(ExecKind::Delete, self.state.class.path);
        let rows = self.collect(false, None)?;

        // the datastore deletes per concrete class
        let mut by_class: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for row in rows {
            if let Some(Value::Object(object)) = row.into_iter().next() {
                by_class.entry(object.class).or_default().push(object.id);
            }
        }

        let mut deleted = 0u64;
        for (class, ids) in &by_class {
            deleted = deleted.saturating_add(self.datastore.delete(class, ids)?);
        }
        self.debug_log(format!("Deleted {deleted} object(s) from {}", self.state.class.path));
        span.set_rows(deleted);

        Ok(deleted)
    }

    fn collect(
        &self,
        distinct: bool,
        result: Option<&[Expr]>,
    ) -> Result<Vec<Vec<Value>>, QueryError> {
        let state = self.state;
        validate(state, result)?;

        let grouped = result.is_some() && is_grouped(state, result);
        if self.debug {
            self.debug_log(format!(
                "Executing query: {}{}",
                Rendered {
                    state,
                    result,
                    distinct,
                },
                if grouped { " (grouped)" } else { "" }
            ));
        }

        let candidates = self.candidates()?;
        let scanned = candidates.len();
        let matched = self.filter(candidates)?;
        self.debug_log(format!("Filter kept {} of {scanned} candidate(s)", matched.len()));

        let mut units = if grouped {
            self.grouped_units(matched, result.unwrap_or_default())?
        } else {
            self.row_units(matched, result)?
        };

        if !state.order_by.is_empty() {
            units.sort_by(|a, b| compare_keys(&a.0, &b.0, &state.order_by));
        }

        let mut rows: Vec<Vec<Value>> = units.into_iter().map(|(_, row)| row).collect();
        if distinct {
            let mut unique: Vec<Vec<Value>> = Vec::with_capacity(rows.len());
            for row in rows {
                if !unique.iter().any(|kept| same_row(kept, &row)) {
                    unique.push(row);
                }
            }
            rows = unique;
        }

        let rows = self.window(rows)?;

        Ok(rows
            .into_iter()
            .map(|row| row.into_iter().map(|value| self.detach(value)).collect())
            .collect())
    }

    // ------------------------------------------------------------------
    // Stages
    // ------------------------------------------------------------------

    fn candidates(&self) -> Result<Vec<Value>, QueryError> {
        let state = self.state;
        let Some(explicit) = &state.candidates else {
            return Ok(self
                .ctx
                .extent(state.class, state.include_subclasses)?
                .to_vec());
        };

        let admitted: Vec<Value> = explicit
            .iter()
            .filter(|object| {
                if state.include_subclasses {
                    object.is_instance_of(state.class.path)
                } else {
                    object.class == state.class.path
                }
            })
            .cloned()
            .map(Value::from)
            .collect();
        record(MetricsEvent::RowsScanned {
            class_path: state.class.path,
            rows_scanned: u64::try_from(explicit.len()).unwrap_or(u64::MAX),
        });

        Ok(admitted)
    }

    fn filter(&self, candidates: Vec<Value>) -> Result<Vec<Value>, QueryError> {
        let Some(filter) = &self.state.filter else {
            return Ok(candidates);
        };

        let mut kept = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if self.ctx.matches(filter, &Scope::row(&candidate))? {
                kept.push(candidate);
            }
        }

        Ok(kept)
    }

    fn row_units(
        &self,
        rows: Vec<Value>,
        result: Option<&[Expr]>,
    ) -> Result<Vec<Unit>, QueryError> {
        let mut units = Vec::with_capacity(rows.len());
        for row in rows {
            let scope = Scope::row(&row);
            let keys = self.order_keys(&scope)?;
            let projected = match result {
                Some(exprs) => exprs
                    .iter()
                    .map(|expr| self.ctx.eval(expr, &scope))
                    .collect::<Result<Vec<_>, _>>()?,
                None => vec![row.clone()],
            };
            units.push((keys, projected));
        }

        Ok(units)
    }

    fn grouped_units(&self, rows: Vec<Value>, result: &[Expr]) -> Result<Vec<Unit>, QueryError> {
        let state = self.state;
        let outer = Scope::default();

        // aggregates without grouping fold every row into one group
        let groups = if state.group_by.is_empty() {
            vec![rows]
        } else {
            self.ctx.group_rows(rows, &state.group_by, None, &outer)?
        };
        self.debug_log(format!("Grouped into {} group(s)", groups.len()));

        let mut units = Vec::with_capacity(groups.len());
        for group in &groups {
            let scope = outer.grouped(None, group);
            if let Some(having) = &state.having
                && truth(&self.ctx.eval(having, &scope)?) != Some(true)
            {
                continue;
            }

            let keys = self.order_keys(&scope)?;
            let projected = result
                .iter()
                .map(|expr| self.ctx.eval(expr, &scope))
                .collect::<Result<Vec<_>, _>>()?;
            units.push((keys, projected));
        }

        Ok(units)
    }

    fn order_keys(&self, scope: &Scope<'_>) -> Result<Vec<Value>, QueryError> {
        self.state
            .order_by
            .iter()
            .map(|order| self.ctx.eval(order.expression(), scope).map_err(QueryError::from))
            .collect()
    }

    fn window(&self, rows: Vec<Vec<Value>>) -> Result<Vec<Vec<Value>>, QueryError> {
        let (from, to) = match &self.state.range {
            None => return Ok(rows),
            Some(RangeSpec::Literal { from, to }) => (*from, *to),
            Some(RangeSpec::Expression { from, to } | RangeSpec::Parameters { from, to }) => {
                (self.bound(from)?, self.bound(to)?)
            }
        };
        check_range(from, to)?;
        self.debug_log(format!("Range [{from}, {to})"));

        let skip = usize::try_from(from).unwrap_or(usize::MAX);
        let take = usize::try_from(to - from).unwrap_or(usize::MAX);

        Ok(rows.into_iter().skip(skip).take(take).collect())
    }

    fn bound(&self, expr: &Expr) -> Result<i64, QueryError> {
        let value = self.ctx.eval(expr, &Scope::default())?;
        value
            .as_int()
            .ok_or_else(|| EvalError::mismatch("range", &value).into())
    }

    // Result objects are cut at the fetch depth.
    fn detach(&self, value: Value) -> Value {
        match value {
            Value::Object(object) => {
                Value::Object(Box::new(object.limit_depth(self.max_fetch_depth)))
            }
            other => other,
        }
    }
}

// ----------------------------------------------------------------------
// Ordering
// ----------------------------------------------------------------------

fn compare_keys(left: &[Value], right: &[Value], order_by: &[OrderExpression]) -> Ordering {
    for ((a, b), order) in left.iter().zip(right).zip(order_by) {
        let ord = compare_key(a, b, order);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}

fn compare_key(a: &Value, b: &Value, order: &OrderExpression) -> Ordering {
    let descending = order.direction() == OrderDirection::Descending;

    let ord = match (a.is_null(), b.is_null(), order.nulls()) {
        (true, true, _) => return Ordering::Equal,
        (true, false, NullOrdering::First) | (false, true, NullOrdering::Last) => {
            return Ordering::Less;
        }
        (true, false, NullOrdering::Last) | (false, true, NullOrdering::First) => {
            return Ordering::Greater;
        }
        // by default null sorts lowest
        (true, false, NullOrdering::Default) => Ordering::Less,
        (false, true, NullOrdering::Default) => Ordering::Greater,
        (false, false, _) => compare_values(a, b).unwrap_or_else(|| canonical_cmp(a, b)),
    };

    if descending { ord.reverse() } else { ord }
}
