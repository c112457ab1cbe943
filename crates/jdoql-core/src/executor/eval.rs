use crate::{
    executor::{EvalError, functions},
    expr::{AggregateFunc, BinaryOp, Expr, Function, SubqueryExpr, UnaryOp},
    model::ClassModel,
    obs::sink::{MetricsEvent, record},
    pm::{Datastore, ExtentRequest, FetchPlan},
    value::{Value, canonical_cmp, compare_values, values_eq},
};
use std::{
    cell::RefCell,
    cmp::Ordering,
    collections::BTreeMap,
    rc::Rc,
};

///
/// Scope
///
/// Names visible to one evaluation: the outer candidate (`this`), subquery
/// aliases and bound variables, and the members of the current group when
/// aggregates are being folded.
///

#[derive(Clone, Debug, Default)]
pub(crate) struct Scope<'s> {
    this: Option<&'s Value>,
    bindings: Vec<(&'s str, &'s Value)>,
    group: Option<Group<'s>>,
}

///
/// Group
/// Rows folded by aggregates; `alias` names the member binding (`None`
/// binds members as `this`).
///

#[derive(Clone, Copy, Debug)]
pub(crate) struct Group<'s> {
    members: &'s [Value],
    alias: Option<&'s str>,
}

impl<'s> Scope<'s> {
    pub(crate) const fn row(this: &'s Value) -> Self {
        Self {
            this: Some(this),
            bindings: Vec::new(),
            group: None,
        }
    }

    fn lookup(&self, name: &str) -> Option<&'s Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(bound, _)| *bound == name)
            .map(|(_, value)| *value)
    }

    fn is_bound(&self, name: &str) -> bool {
        self.bindings.iter().any(|(bound, _)| *bound == name)
    }

    /// Child scope with one more binding.
    pub(crate) fn bind<'c>(&self, name: &'c str, value: &'c Value) -> Scope<'c>
    where
        's: 'c,
    {
        let mut bindings: Vec<(&'c str, &'c Value)> = self.bindings.clone();
        bindings.push((name, value));

        Scope {
            this: self.this,
            bindings,
            group: self.group,
        }
    }

    /// Scope for evaluating one group member, outside any group.
    pub(crate) fn member<'c>(&self, alias: Option<&'c str>, value: &'c Value) -> Scope<'c>
    where
        's: 'c,
    {
        let mut scope = match alias {
            Some(alias) => self.bind(alias, value),
            None => Scope {
                this: Some(value),
                bindings: self.bindings.clone(),
                group: None,
            },
        };
        scope.group = None;

        scope
    }

    /// Scope for evaluating a whole group; non-aggregate expressions see the
    /// first member.
    pub(crate) fn grouped<'c>(&self, alias: Option<&'c str>, members: &'c [Value]) -> Scope<'c>
    where
        's: 'c,
    {
        let mut scope: Scope<'c> = match (alias, members.first()) {
            (Some(alias), Some(first)) => self.bind(alias, first),
            (Some(_), None) => self.clone(),
            (None, first) => Scope {
                this: first,
                bindings: self.bindings.clone(),
                group: None,
            },
        };
        scope.group = Some(Group { members, alias });

        scope
    }
}

///
/// EvalContext
///
/// Evaluates expressions for one execution. Extents read for subqueries and
/// variables are cached for the lifetime of the context.
///

pub(crate) struct EvalContext<'a> {
    datastore: &'a dyn Datastore,
    params: &'a BTreeMap<String, Value>,
    fetch_plan: &'a FetchPlan,
    extensions: &'a BTreeMap<String, Value>,
    ignore_cache: bool,
    extents: RefCell<BTreeMap<(&'static str, bool), Rc<Vec<Value>>>>,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(
        datastore: &'a dyn Datastore,
        params: &'a BTreeMap<String, Value>,
        fetch_plan: &'a FetchPlan,
        extensions: &'a BTreeMap<String, Value>,
        ignore_cache: bool,
    ) -> Self {
        Self {
            datastore,
            params,
            fetch_plan,
            extensions,
            ignore_cache,
            extents: RefCell::new(BTreeMap::new()),
        }
    }

    /// Objects of `class` as values, read once per execution.
    pub(crate) fn extent(
        &self,
        class: &'static ClassModel,
        include_subclasses: bool,
    ) -> Result<Rc<Vec<Value>>, EvalError> {
        let key = (class.path, include_subclasses);
        if let Some(cached) = self.extents.borrow().get(&key) {
            return Ok(Rc::clone(cached));
        }

        let request = ExtentRequest {
            class,
            include_subclasses,
            ignore_cache: self.ignore_cache,
            fetch_plan: self.fetch_plan,
            extensions: self.extensions,
        };
        let objects = self.datastore.extent(&request)?;
        record(MetricsEvent::RowsScanned {
            class_path: class.path,
            rows_scanned: u64::try_from(objects.len()).unwrap_or(u64::MAX),
        });

        let values: Rc<Vec<Value>> = Rc::new(objects.into_iter().map(Value::from).collect());
        self.extents.borrow_mut().insert(key, Rc::clone(&values));

        Ok(values)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    pub(crate) fn eval(&self, expr: &Expr, scope: &Scope<'_>) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::This | Expr::Alias(_) | Expr::Variable { .. } => {
                self.resolve(expr, scope).map(Clone::clone)
            }
            Expr::Parameter { name, .. } => {
                self.params
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::UnboundParameter { name: name.clone() })
            }
            Expr::Field { target, name, .. } => {
                if matches!(**target, Expr::This | Expr::Alias(_) | Expr::Variable { .. }) {
                    field_of(self.resolve(target, scope)?, name)
                } else {
                    field_of(&self.eval(target, scope)?, name)
                }
            }
            Expr::Unary { op, operand } => unary(*op, self.eval(operand, scope)?),
            Expr::Binary { op, left, right } => self.binary(*op, left, right, scope),
            Expr::Call { func, args, .. } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg, scope))
                    .collect::<Result<Vec<_>, _>>()?;
                functions::call(*func, args)
            }
            Expr::Aggregate {
                func,
                distinct,
                operand,
            } => self.aggregate(*func, *distinct, operand, scope),
            Expr::Conditional {
                branches,
                otherwise,
                ..
            } => {
                for (condition, value) in branches {
                    if truth(&self.eval(condition, scope)?) == Some(true) {
                        return self.eval(value, scope);
                    }
                }
                otherwise
                    .as_ref()
                    .map_or(Ok(Value::Null), |value| self.eval(value, scope))
            }
            Expr::InstanceOf { operand, class } => {
                let value = self.eval(operand, scope)?;
                let is_instance = value
                    .as_object()
                    .is_some_and(|object| object.is_instance_of(class.path));
                Ok(Value::Bool(is_instance))
            }
            Expr::Cast { operand, class } => match self.eval(operand, scope)? {
                Value::Object(object) if object.is_instance_of(class.path) => {
                    Ok(Value::Object(object))
                }
                _ => Ok(Value::Null),
            },
            Expr::Subquery(sub) => self.subquery(sub, scope),
        }
    }

    // Borrow a candidate, alias or variable without cloning it.
    fn resolve<'s>(&self, expr: &Expr, scope: &Scope<'s>) -> Result<&'s Value, EvalError> {
        match expr {
            Expr::This => Ok(scope.this.unwrap_or(&NULL)),
            Expr::Alias(alias) => scope.lookup(alias).ok_or_else(|| EvalError::UnknownAlias {
                alias: alias.clone(),
            }),
            Expr::Variable { name, .. } => {
                scope
                    .lookup(name)
                    .ok_or_else(|| EvalError::UnboundVariable { name: name.clone() })
            }
            other => Err(EvalError::unsupported(other.to_string())),
        }
    }

    fn binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        scope: &Scope<'_>,
    ) -> Result<Value, EvalError> {
        // three-valued logic; null stands for "unknown"
        match op {
            BinaryOp::And => {
                let left = truth(&self.eval(left, scope)?);
                if left == Some(false) {
                    return Ok(Value::Bool(false));
                }
                let right = truth(&self.eval(right, scope)?);
                Ok(match (left, right) {
                    (_, Some(false)) => Value::Bool(false),
                    (Some(true), Some(true)) => Value::Bool(true),
                    _ => Value::Null,
                })
            }
            BinaryOp::Or => {
                let left = truth(&self.eval(left, scope)?);
                if left == Some(true) {
                    return Ok(Value::Bool(true));
                }
                let right = truth(&self.eval(right, scope)?);
                Ok(match (left, right) {
                    (_, Some(true)) => Value::Bool(true),
                    (Some(false), Some(false)) => Value::Bool(false),
                    _ => Value::Null,
                })
            }
            _ => apply_binary(op, &self.eval(left, scope)?, &self.eval(right, scope)?),
        }
    }

    // ------------------------------------------------------------------
    // Filters and variables
    // ------------------------------------------------------------------

    /// Whether some binding of the filter's unbound variables makes it true.
    pub(crate) fn matches(&self, filter: &Expr, scope: &Scope<'_>) -> Result<bool, EvalError> {
        let unbound: Vec<&str> = filter
            .variable_names()
            .into_iter()
            .filter(|name| !scope.is_bound(name))
            .collect();

        self.bind_and_test(filter, scope, &unbound)
    }

    fn bind_and_test(
        &self,
        filter: &Expr,
        scope: &Scope<'_>,
        unbound: &[&str],
    ) -> Result<bool, EvalError> {
        let Some((&name, rest)) = unbound.split_first() else {
            return Ok(truth(&self.eval(filter, scope)?) == Some(true));
        };

        let domain = self.variable_domain(filter, name, unbound, scope)?;
        for value in domain.iter() {
            if self.bind_and_test(filter, &scope.bind(name, value), rest)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    // Values a variable ranges over: the first `x.contains(var)` whose
    // container is already evaluable, else the extent of its class.
    fn variable_domain(
        &self,
        filter: &Expr,
        name: &str,
        unbound: &[&str],
        scope: &Scope<'_>,
    ) -> Result<Rc<Vec<Value>>, EvalError> {
        let mut container: Option<(Function, &Expr)> = None;
        let mut class: Option<&'static ClassModel> = None;
        filter.visit(&mut |node| match node {
            Expr::Call { func, args, .. }
                if container.is_none()
                    && matches!(
                        func,
                        Function::Contains | Function::ContainsKey | Function::ContainsValue
                    ) =>
            {
                if let [target, Expr::Variable { name: var, .. }] = args.as_slice()
                    && var == name
                    && !unbound.iter().any(|u| target.references_variable(u))
                {
                    container = Some((*func, target));
                }
            }
            Expr::Variable {
                name: var,
                class: Some(declared),
                ..
            } if var == name => class = Some(*declared),
            _ => {}
        });

        if let Some((func, target)) = container {
            let values = match (func, self.eval(target, scope)?) {
                (Function::ContainsKey, Value::Map(entries)) => {
                    entries.into_iter().map(|(key, _)| key).collect()
                }
                (Function::ContainsValue, Value::Map(entries)) => {
                    entries.into_iter().map(|(_, value)| value).collect()
                }
                (Function::Contains, Value::List(items)) => items,
                (_, Value::Null) => Vec::new(),
                (func, other) => return Err(EvalError::mismatch(func.name(), &other)),
            };
            return Ok(Rc::new(values));
        }

        match class {
            Some(class) => self.extent(class, true),
            None => Err(EvalError::UnconstrainedVariable {
                name: name.to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Grouping and aggregates
    // ------------------------------------------------------------------

    /// Partition `rows` by the values of `keys`, in first-appearance order.
    pub(crate) fn group_rows(
        &self,
        rows: Vec<Value>,
        keys: &[Expr],
        alias: Option<&str>,
        outer: &Scope<'_>,
    ) -> Result<Vec<Vec<Value>>, EvalError> {
        let mut groups: Vec<(Vec<Value>, Vec<Value>)> = Vec::new();
        for row in rows {
            let key = {
                let scope = outer.member(alias, &row);
                keys.iter()
                    .map(|key| self.eval(key, &scope))
                    .collect::<Result<Vec<_>, _>>()?
            };

            match groups.iter_mut().find(|(existing, _)| same_row(existing, &key)) {
                Some((_, members)) => members.push(row),
                None => groups.push((key, vec![row])),
            }
        }

        Ok(groups.into_iter().map(|(_, members)| members).collect())
    }

    fn aggregate(
        &self,
        func: AggregateFunc,
        distinct: bool,
        operand: &Expr,
        scope: &Scope<'_>,
    ) -> Result<Value, EvalError> {
        let Some(group) = scope.group else {
            return Err(EvalError::AggregateOutsideGroup { func: func.name() });
        };

        let mut values = Vec::with_capacity(group.members.len());
        for member in group.members {
            let value = self.eval(operand, &scope.member(group.alias, member))?;
            if !value.is_null() {
                values.push(value);
            }
        }
        if distinct {
            values.sort_by(canonical_cmp);
            values.dedup_by(|a, b| canonical_cmp(a, b) == Ordering::Equal);
        }

        fold_aggregate(func, values)
    }

    // ------------------------------------------------------------------
    // Subqueries
    // ------------------------------------------------------------------

    fn subquery(&self, sub: &SubqueryExpr, scope: &Scope<'_>) -> Result<Value, EvalError> {
        let alias = sub.alias.as_str();
        let extent = self.extent(sub.class, sub.include_subclasses)?;

        let mut members = Vec::new();
        for member in extent.iter() {
            let keep = match &sub.filter {
                Some(filter) => self.matches(filter, &scope.bind(alias, member))?,
                None => true,
            };
            if keep {
                members.push(member.clone());
            }
        }

        let grouped =
            !sub.group_by.is_empty() || sub.having.is_some() || sub.result.contains_aggregate();
        let mut values = Vec::new();
        if grouped {
            let groups = if sub.group_by.is_empty() {
                vec![members]
            } else {
                self.group_rows(members, &sub.group_by, Some(alias), scope)?
            };
            for group in &groups {
                let group_scope = scope.grouped(Some(alias), group);
                if let Some(having) = &sub.having
                    && truth(&self.eval(having, &group_scope)?) != Some(true)
                {
                    continue;
                }
                values.push(self.eval(&sub.result, &group_scope)?);
            }
        } else {
            for member in &members {
                values.push(self.eval(&sub.result, &scope.bind(alias, member))?);
            }
        }

        if !sub.unique {
            return Ok(Value::List(values));
        }
        match values.len() {
            0 => Ok(Value::Null),
            1 => Ok(values.swap_remove(0)),
            rows => Err(EvalError::SubqueryNotUnique {
                alias: sub.alias.clone(),
                rows,
            }),
        }
    }
}

// ----------------------------------------------------------------------
// Value operations
// ----------------------------------------------------------------------

static NULL: Value = Value::Null;

/// `Some(b)` for booleans; every other value is "unknown".
pub(crate) const fn truth(value: &Value) -> Option<bool> {
    value.as_bool()
}

/// Row equality used by grouping and distinct.
pub(crate) fn same_row(left: &[Value], right: &[Value]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(a, b)| canonical_cmp(a, b) == Ordering::Equal)
}

fn field_of(target: &Value, name: &str) -> Result<Value, EvalError> {
    match target {
        Value::Object(object) => Ok(object.field(name).cloned().unwrap_or_default()),
        Value::Null => Ok(Value::Null),
        other => Err(EvalError::mismatch(format!(".{name}"), other)),
    }
}

fn unary(op: UnaryOp, value: Value) -> Result<Value, EvalError> {
    match (op, value) {
        (_, Value::Null) => Ok(Value::Null),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or(EvalError::Overflow { op: "-" }),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Complement, Value::Int(i)) => Ok(Value::Int(!i)),
        (op, other) => Err(EvalError::mismatch(op.symbol(), &other)),
    }
}

pub(crate) fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let compared = |test: fn(Ordering) -> bool| {
        compare_values(left, right).map_or(Value::Null, |ord| Value::Bool(test(ord)))
    };

    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_eq(left, right))),
        BinaryOp::Ne => Ok(Value::Bool(!values_eq(left, right))),
        BinaryOp::Lt => Ok(compared(Ordering::is_lt)),
        BinaryOp::Lte => Ok(compared(Ordering::is_le)),
        BinaryOp::Gt => Ok(compared(Ordering::is_gt)),
        BinaryOp::Gte => Ok(compared(Ordering::is_ge)),
        _ if left.is_null() || right.is_null() => Ok(Value::Null),
        BinaryOp::And | BinaryOp::Or | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            bitwise(op, left, right)
        }
        BinaryOp::Add if is_textual(left) || is_textual(right) => {
            Ok(Value::Text(format!("{}{}", plain(left), plain(right))))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, left, right)
        }
    }
}

fn bitwise(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
            BinaryOp::And | BinaryOp::BitAnd => a & b,
            BinaryOp::Or | BinaryOp::BitOr => a | b,
            _ => a ^ b,
        })),
        (Value::Int(a), Value::Int(b)) => match op {
            BinaryOp::BitAnd => Ok(Value::Int(a & b)),
            BinaryOp::BitOr => Ok(Value::Int(a | b)),
            BinaryOp::BitXor => Ok(Value::Int(a ^ b)),
            _ => Err(EvalError::mismatch(op.symbol(), left)),
        },
        (Value::Bool(_) | Value::Int(_), other) | (other, _) => {
            Err(EvalError::mismatch(op.symbol(), other))
        }
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let (a, b) = (*a, *b);
        if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
            return Err(EvalError::DivisionByZero);
        }
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            BinaryOp::Div => a.checked_div(b),
            _ => a.checked_rem(b),
        };

        return result
            .map(Value::Int)
            .ok_or(EvalError::Overflow { op: op.symbol() });
    }

    let Some(a) = left.as_f64() else {
        return Err(EvalError::mismatch(op.symbol(), left));
    };
    let Some(b) = right.as_f64() else {
        return Err(EvalError::mismatch(op.symbol(), right));
    };

    Ok(Value::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        _ => a % b,
    }))
}

const fn is_textual(value: &Value) -> bool {
    matches!(value, Value::Text(_))
}

// Concatenation operand without literal quoting.
fn plain(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        Value::Char(c) => c.to_string(),
        other => other.to_string(),
    }
}

fn fold_aggregate(func: AggregateFunc, values: Vec<Value>) -> Result<Value, EvalError> {
    match func {
        AggregateFunc::Count => Ok(Value::Int(i64::try_from(values.len()).unwrap_or(i64::MAX))),
        AggregateFunc::Sum | AggregateFunc::Avg => {
            let count = values.len();
            let mut total: Option<Value> = None;
            for value in values {
                total = Some(match total {
                    None => match value {
                        Value::Int(_) | Value::Float(_) => value,
                        other => return Err(EvalError::mismatch(func.name(), &other)),
                    },
                    Some(acc) => arithmetic(BinaryOp::Add, &acc, &value)?,
                });
            }

            match (func, total) {
                (_, None) => Ok(Value::Null),
                (AggregateFunc::Avg, Some(total)) => {
                    let total = total.as_f64().unwrap_or_default();
                    Ok(Value::Float(total / f64::from(u32::try_from(count).unwrap_or(u32::MAX))))
                }
                (_, Some(total)) => Ok(total),
            }
        }
        AggregateFunc::Min | AggregateFunc::Max => {
            let mut best: Option<Value> = None;
            for value in values {
                let replace = match &best {
                    None => true,
                    Some(current) => {
                        let ord = compare_values(&value, current)
                            .ok_or_else(|| EvalError::mismatch(func.name(), &value))?;
                        if func == AggregateFunc::Min {
                            ord.is_lt()
                        } else {
                            ord.is_gt()
                        }
                    }
                };
                if replace {
                    best = Some(value);
                }
            }

            Ok(best.unwrap_or_default())
        }
    }
}
