use crate::{
    expr::{Expr, OrderExpression},
    model::ClassModel,
    query::QueryError,
    value::{ObjectValue, Value, ValueDomain},
};
use std::collections::BTreeMap;

///
/// Declaration
/// A declared parameter or variable.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub domain: ValueDomain,
    /// Type name rendered in `PARAMETERS` / `VARIABLES`.
    pub type_name: &'static str,
    pub class: Option<&'static ClassModel>,
}

///
/// RangeSpec
///
/// Result window, lower bound inclusive and upper bound exclusive.
/// Setting a range replaces any earlier one whatever its form.
///

#[derive(Clone, Debug, PartialEq)]
pub enum RangeSpec {
    Literal { from: i64, to: i64 },
    Expression { from: Expr, to: Expr },
    Parameters { from: Expr, to: Expr },
}

impl RangeSpec {
    pub(crate) fn exprs(&self) -> Option<[&Expr; 2]> {
        match self {
            Self::Literal { .. } => None,
            Self::Expression { from, to } | Self::Parameters { from, to } => Some([from, to]),
        }
    }
}

///
/// QueryState
///
/// Everything a `TypedQuery` accumulates between construction and
/// execution. Executions read it and never write it.
///

#[derive(Clone, Debug)]
pub struct QueryState {
    pub class: &'static ClassModel,
    pub candidates: Option<Vec<ObjectValue>>,
    pub include_subclasses: bool,
    pub ignore_cache: bool,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderExpression>,
    pub range: Option<RangeSpec>,
    pub parameters: Vec<Declaration>,
    pub bindings: BTreeMap<String, Value>,
    pub variables: Vec<Declaration>,
    pub extensions: BTreeMap<String, Value>,
    /// First builder misuse, reported by every execution until cleared.
    pub error: Option<QueryError>,
}

impl QueryState {
    #[must_use]
    pub const fn new(
        class: &'static ClassModel,
        include_subclasses: bool,
        ignore_cache: bool,
    ) -> Self {
        Self {
            class,
            candidates: None,
            include_subclasses,
            ignore_cache,
            filter: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            range: None,
            parameters: Vec::new(),
            bindings: BTreeMap::new(),
            variables: Vec::new(),
            extensions: BTreeMap::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Declaration> {
        self.parameters.iter().find(|decl| decl.name == name)
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Declaration> {
        self.variables.iter().find(|decl| decl.name == name)
    }

    /// Keep the first recorded error.
    pub(crate) fn record(&mut self, err: impl Into<QueryError>) {
        if self.error.is_none() {
            self.error = Some(err.into());
        }
    }

    /// Every clause expression, in rendering order.
    pub(crate) fn clause_exprs(&self) -> impl Iterator<Item = &Expr> {
        self.filter
            .iter()
            .chain(self.group_by.iter())
            .chain(self.having.iter())
            .chain(self.order_by.iter().map(OrderExpression::expression))
            .chain(self.range.iter().filter_map(RangeSpec::exprs).flatten())
    }
}
