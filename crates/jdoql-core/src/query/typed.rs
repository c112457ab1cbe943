use crate::{
    executor::{EvalError, Executor},
    expr::{
        AnyExpression, BooleanExpression, CharacterExpression, CollectionExpression,
        DateExpression, DateTimeExpression, Expr, Expression, IfThenElseExpression, IntoOperand,
        ListExpression, MapExpression, NumericExpression, OrderExpression, PersistableExpression,
        QueryType, StringExpression, TimeExpression,
    },
    obs::sink::{ExecKind, MetricsEvent, record},
    pm::{FetchPlan, PersistenceManager},
    query::{
        Declaration, QueryError, QueryResult, QueryState, RangeSpec, TypedSubquery, ValidateError,
    },
    traits::{Persistable, QueryClass},
    value::{FromRow, Value},
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet},
    fmt,
    marker::PhantomData,
};

///
/// TypedQuery
///
/// Mutable query builder bound to the candidate type `T`.
///
/// Builder calls mutate the query in place and never fail: misuse (an
/// undeclared parameter, a redeclared name, a wrongly typed binding) is
/// recorded and returned by every execution until `clear_parameters`.
/// Executions read the current state and may be repeated.
///

pub struct TypedQuery<'pm, T> {
    pm: &'pm PersistenceManager,
    state: QueryState,
    fetch_plan: FetchPlan,
    debug: bool,
    next_result: Cell<u64>,
    open: RefCell<BTreeSet<u64>>,
    _marker: PhantomData<fn() -> T>,
}

impl<'pm, T: Persistable> TypedQuery<'pm, T> {
    pub(crate) fn new(pm: &'pm PersistenceManager) -> Self {
        let config = &pm.config().query;

        Self {
            pm,
            state: QueryState::new(T::MODEL, config.include_subclasses, config.ignore_cache),
            fetch_plan: pm.fetch_plan().clone(),
            debug: config.debug,
            next_result: Cell::new(1),
            open: RefCell::new(BTreeSet::new()),
            _marker: PhantomData,
        }
    }

    /// Accumulated builder state.
    #[must_use]
    pub const fn state(&self) -> &QueryState {
        &self.state
    }

    // ------------------------------------------------------------------
    // Candidate, parameters, variables
    // ------------------------------------------------------------------

    /// The candidate of this query (`this`).
    #[must_use]
    pub fn candidate(&self) -> PersistableExpression<T> {
        PersistableExpression::from_expr(Expr::This)
    }

    /// The candidate through its query class.
    #[must_use]
    pub fn candidate_class<Q: QueryClass<Candidate = T>>(&self) -> Q {
        Q::candidate()
    }

    /// Declare (or re-fetch) a parameter of type `X`.
    pub fn parameter<X: QueryType>(&mut self, name: &str) -> X::Expr {
        let domain = <X::Expr as Expression>::DOMAIN;
        match self.state.parameter(name).map(|existing| existing.domain) {
            Some(declared) if declared != domain => {
                self.state.record(ValidateError::ParameterRedeclared {
                    name: name.to_string(),
                    declared,
                    requested: domain,
                });
            }
            Some(_) => {}
            None => self.state.parameters.push(Declaration {
                name: name.to_string(),
                domain,
                type_name: X::type_name(),
                class: X::class_model(),
            }),
        }

        X::Expr::from_expr(Expr::Parameter {
            name: name.to_string(),
            domain,
        })
    }

    pub fn string_parameter(&mut self, name: &str) -> StringExpression {
        self.parameter::<String>(name)
    }

    pub fn character_parameter(&mut self, name: &str) -> CharacterExpression {
        self.parameter::<char>(name)
    }

    pub fn numeric_parameter<N>(&mut self, name: &str) -> NumericExpression<N>
    where
        N: QueryType<Expr = NumericExpression<N>>,
    {
        self.parameter::<N>(name)
    }

    pub fn date_parameter(&mut self, name: &str) -> DateExpression {
        self.parameter::<NaiveDate>(name)
    }

    pub fn time_parameter(&mut self, name: &str) -> TimeExpression {
        self.parameter::<NaiveTime>(name)
    }

    pub fn datetime_parameter(&mut self, name: &str) -> DateTimeExpression {
        self.parameter::<NaiveDateTime>(name)
    }

    pub fn collection_parameter<E: QueryType>(&mut self, name: &str) -> CollectionExpression<E> {
        self.parameter::<BTreeSet<E>>(name)
    }

    pub fn map_parameter<K: QueryType, V: QueryType>(
        &mut self,
        name: &str,
    ) -> MapExpression<K, V> {
        self.parameter::<BTreeMap<K, V>>(name)
    }

    pub fn list_parameter<E: QueryType>(&mut self, name: &str) -> ListExpression<E> {
        self.parameter::<Vec<E>>(name)
    }

    /// Declare (or re-fetch) a variable of type `X`. Variables may only be
    /// used in the filter, where each one is bound by a `contains` test or,
    /// for persistable types, ranges over the class extent.
    pub fn variable<X: QueryType>(&mut self, name: &str) -> X::Expr {
        let domain = <X::Expr as Expression>::DOMAIN;
        match self.state.variable(name).map(|existing| existing.domain) {
            Some(declared) if declared != domain => {
                self.state.record(ValidateError::VariableRedeclared {
                    name: name.to_string(),
                    declared,
                    requested: domain,
                });
            }
            Some(_) => {}
            None => self.state.variables.push(Declaration {
                name: name.to_string(),
                domain,
                type_name: X::type_name(),
                class: X::class_model(),
            }),
        }

        X::Expr::from_expr(Expr::Variable {
            name: name.to_string(),
            domain,
            class: X::class_model(),
        })
    }

    // ------------------------------------------------------------------
    // Candidates
    // ------------------------------------------------------------------

    pub const fn set_ignore_cache(&mut self, ignore: bool) -> &mut Self {
        self.state.ignore_cache = ignore;
        self
    }

    #[must_use]
    pub const fn ignore_cache(&self) -> bool {
        self.state.ignore_cache
    }

    /// Query these instances instead of the class extent.
    pub fn set_candidates<'c>(
        &mut self,
        candidates: impl IntoIterator<Item = &'c T>,
    ) -> &mut Self {
        self.state.candidates = Some(candidates.into_iter().map(T::to_object).collect());
        self
    }

    /// Go back to querying the class extent.
    pub fn clear_candidates(&mut self) -> &mut Self {
        self.state.candidates = None;
        self
    }

    pub const fn exclude_subclasses(&mut self) -> &mut Self {
        self.state.include_subclasses = false;
        self
    }

    pub const fn include_subclasses(&mut self) -> &mut Self {
        self.state.include_subclasses = true;
        self
    }

    // ------------------------------------------------------------------
    // Clauses
    // ------------------------------------------------------------------

    pub fn filter(&mut self, expr: impl IntoOperand<BooleanExpression>) -> &mut Self {
        self.state.filter = Some(expr.into_operand());
        self
    }

    /// Replace the grouping expressions.
    pub fn group_by(&mut self, exprs: &[&dyn AnyExpression]) -> &mut Self {
        self.state.group_by = exprs.iter().map(|expr| expr.to_expr()).collect();
        self
    }

    pub fn having(&mut self, expr: impl IntoOperand<BooleanExpression>) -> &mut Self {
        self.state.having = Some(expr.into_operand());
        self
    }

    /// Replace the ordering.
    pub fn order_by(&mut self, orders: impl IntoIterator<Item = OrderExpression>) -> &mut Self {
        self.state.order_by = orders.into_iter().collect();
        self
    }

    /// Result window `[from, to)`.
    pub fn range(&mut self, from: i64, to: i64) -> &mut Self {
        self.state.range = Some(RangeSpec::Literal { from, to });
        self
    }

    /// Result window bounded by numeric expressions.
    pub fn range_expr(&mut self, from: &impl Expression, to: &impl Expression) -> &mut Self {
        self.state.range = Some(RangeSpec::Expression {
            from: from.as_expr().clone(),
            to: to.as_expr().clone(),
        });
        self
    }

    /// Result window bounded by two parameters.
    pub fn range_params(&mut self, from: &impl Expression, to: &impl Expression) -> &mut Self {
        for bound in [from.as_expr(), to.as_expr()] {
            if !matches!(bound, Expr::Parameter { .. }) {
                self.state.record(ValidateError::RangeNotParameter {
                    expr: bound.to_string(),
                });
            }
        }
        self.state.range = Some(RangeSpec::Parameters {
            from: from.as_expr().clone(),
            to: to.as_expr().clone(),
        });
        self
    }

    /// Subquery over this query's candidate type.
    #[must_use]
    pub fn subquery(&self, alias: &str) -> TypedSubquery<T> {
        TypedSubquery::new(alias)
    }

    /// Subquery over candidates of `S`.
    #[must_use]
    pub fn subquery_for<S: Persistable>(&self, alias: &str) -> TypedSubquery<S> {
        TypedSubquery::new(alias)
    }

    /// Conditional expression starting with one branch.
    #[must_use]
    pub fn if_then<X: QueryType>(
        &self,
        condition: impl IntoOperand<BooleanExpression>,
        value: impl IntoOperand<X::Expr>,
    ) -> IfThenElseExpression<X> {
        IfThenElseExpression::new().if_then(condition, value)
    }

    /// `IF (condition) then ELSE otherwise`
    #[must_use]
    pub fn if_then_else<X: QueryType>(
        &self,
        condition: impl IntoOperand<BooleanExpression>,
        then: impl IntoOperand<X::Expr>,
        otherwise: impl IntoOperand<X::Expr>,
    ) -> IfThenElseExpression<X> {
        IfThenElseExpression::new()
            .if_then(condition, then)
            .else_end(otherwise)
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    /// Bind the parameter `param`; anything other than a declared
    /// parameter is recorded as `UnknownParameter`.
    pub fn set_parameter(
        &mut self,
        param: &impl Expression,
        value: impl Into<Value>,
    ) -> &mut Self {
        match param.as_expr() {
            Expr::Parameter { name, .. } => {
                let name = name.clone();
                self.set_named_parameter(&name, value)
            }
            other => {
                self.state.record(QueryError::UnknownParameter {
                    name: other.to_string(),
                });
                self
            }
        }
    }

    pub fn set_named_parameter(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        let Some(expected) = self.state.parameter(name).map(|declared| declared.domain) else {
            self.state.record(QueryError::UnknownParameter {
                name: name.to_string(),
            });
            return self;
        };

        if !expected.accepts(&value) {
            self.state.record(QueryError::ParameterType {
                name: name.to_string(),
                expected,
                found: value.kind_label(),
            });
            return self;
        }

        record(MetricsEvent::ParameterBound {
            class_path: T::MODEL.path,
        });
        self.state.bindings.insert(name.to_string(), value);
        self
    }

    /// Drop every bound value and any recorded builder error; declarations
    /// and clauses stay.
    pub fn clear_parameters(&mut self) -> &mut Self {
        self.state.bindings.clear();
        self.state.error = None;
        self
    }

    // ------------------------------------------------------------------
    // Extensions
    // ------------------------------------------------------------------

    pub fn add_extension(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.state.extensions.insert(key.into(), value.into());
        self
    }

    /// `None` clears every extension; `Some` merges key-wise.
    pub fn set_extensions(&mut self, extensions: Option<BTreeMap<String, Value>>) -> &mut Self {
        match extensions {
            Some(extensions) => self.state.extensions.extend(extensions),
            None => self.state.extensions.clear(),
        }
        self
    }

    #[must_use]
    pub const fn extensions(&self) -> &BTreeMap<String, Value> {
        &self.state.extensions
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    fn executor(&self) -> Executor<'_> {
        Executor::new(self.pm.datastore(), &self.state, &self.fetch_plan, self.debug)
    }

    fn issue<R>(&self, rows: Vec<R>) -> QueryResult<R> {
        let id = self.next_result.get();
        self.next_result.set(id + 1);
        self.open.borrow_mut().insert(id);

        QueryResult::new(id, rows)
    }

    fn candidates(&self, kind: ExecKind) -> Result<Vec<T>, QueryError> {
        self.executor()
            .rows(kind, false, None)?
            .into_iter()
            .map(|row| match row.into_iter().next() {
                Some(Value::Object(object)) => T::from_object(&object).map_err(QueryError::from),
                other => Err(EvalError::mismatch("candidate", &other.unwrap_or_default()).into()),
            })
            .collect()
    }

    fn projected(
        &self,
        kind: ExecKind,
        distinct: bool,
        exprs: &[&dyn AnyExpression],
    ) -> Result<Vec<Vec<Value>>, QueryError> {
        let exprs: Vec<Expr> = exprs.iter().map(|expr| expr.to_expr()).collect();

        self.executor().rows(kind, distinct, Some(&exprs))
    }

    /// Every candidate satisfying the filter, ordered and windowed.
    pub fn execute_list(&self) -> Result<QueryResult<T>, QueryError> {
        let rows = self.candidates(ExecKind::List)?;

        Ok(self.issue(rows))
    }

    /// The single matching candidate; more than one is `NotUnique`.
    pub fn execute_unique(&self) -> Result<Option<T>, QueryError> {
        unique(self.candidates(ExecKind::Unique)?)
    }

    /// Project `exprs` and convert every row into `R`.
    pub fn execute_result_list_as<R: FromRow>(
        &self,
        distinct: bool,
        exprs: &[&dyn AnyExpression],
    ) -> Result<QueryResult<R>, QueryError> {
        let rows = self
            .projected(ExecKind::Result, distinct, exprs)?
            .into_iter()
            .map(R::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.issue(rows))
    }

    pub fn execute_result_unique_as<R: FromRow>(
        &self,
        distinct: bool,
        exprs: &[&dyn AnyExpression],
    ) -> Result<Option<R>, QueryError> {
        let row = unique(self.projected(ExecKind::Result, distinct, exprs)?)?;

        row.map(R::from_row).transpose().map_err(QueryError::from)
    }

    /// Project a single expression; each row is its value.
    pub fn execute_result_list_single(
        &self,
        distinct: bool,
        expr: &dyn AnyExpression,
    ) -> Result<QueryResult<Value>, QueryError> {
        let rows = self
            .projected(ExecKind::Result, distinct, &[expr])?
            .into_iter()
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect();

        Ok(self.issue(rows))
    }

    pub fn execute_result_unique_single(
        &self,
        distinct: bool,
        expr: &dyn AnyExpression,
    ) -> Result<Option<Value>, QueryError> {
        let row = unique(self.projected(ExecKind::Result, distinct, &[expr])?)?;

        Ok(row.map(|row| row.into_iter().next().unwrap_or_default()))
    }

    /// Project `exprs`; each row is one value per expression.
    pub fn execute_result_list(
        &self,
        distinct: bool,
        exprs: &[&dyn AnyExpression],
    ) -> Result<QueryResult<Vec<Value>>, QueryError> {
        let rows = self.projected(ExecKind::Result, distinct, exprs)?;

        Ok(self.issue(rows))
    }

    pub fn execute_result_unique(
        &self,
        distinct: bool,
        exprs: &[&dyn AnyExpression],
    ) -> Result<Option<Vec<Value>>, QueryError> {
        unique(self.projected(ExecKind::Result, distinct, exprs)?)
    }

    /// Delete every candidate the query selects; returns how many were
    /// removed.
    pub fn delete_persistent_all(&self) -> Result<u64, QueryError> {
        self.executor().delete()
    }

    // ------------------------------------------------------------------
    // Context and result handles
    // ------------------------------------------------------------------

    #[must_use]
    pub const fn persistence_manager(&self) -> &'pm PersistenceManager {
        self.pm
    }

    /// This query's own fetch plan, copied from the manager at creation.
    #[must_use]
    pub const fn fetch_plan(&self) -> &FetchPlan {
        &self.fetch_plan
    }

    pub const fn fetch_plan_mut(&mut self) -> &mut FetchPlan {
        &mut self.fetch_plan
    }

    /// Release one result handle; unknown or closed handles are ignored.
    pub fn close<R>(&self, result: &QueryResult<R>) {
        self.open.borrow_mut().remove(&result.id());
    }

    pub fn close_all(&self) {
        self.open.borrow_mut().clear();
    }

    /// Number of results issued and not yet closed.
    #[must_use]
    pub fn open_results(&self) -> usize {
        self.open.borrow().len()
    }
}

fn unique<R>(rows: Vec<R>) -> Result<Option<R>, QueryError> {
    match rows.len() {
        0 | 1 => Ok(rows.into_iter().next()),
        n => Err(QueryError::NotUnique { rows: n }),
    }
}

impl<T> fmt::Display for TypedQuery<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.state, f)
    }
}

impl<T> fmt::Debug for TypedQuery<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedQuery")
            .field("state", &self.state)
            .field("fetch_plan", &self.fetch_plan)
            .field("open_results", &self.open.borrow().len())
            .finish_non_exhaustive()
    }
}
