use crate::{
    expr::{
        AnyExpression, BooleanExpression, CharacterExpression, CollectionExpression,
        DateExpression, DateTimeExpression, Expr, Expression, IntoOperand, NumericExpression,
        PersistableExpression, QueryType, StringExpression, SubqueryExpr, TimeExpression,
    },
    traits::{Persistable, QueryClass},
    value::ValueDomain,
};
use std::marker::PhantomData;

///
/// TypedSubquery
///
/// Nested query over candidates of `S`, scoped to an alias. Inside its
/// clauses the alias names the subquery candidate and `this` still names
/// the enclosing query's candidate.
///
/// A result producer freezes the subquery as it stands; later builder calls
/// do not affect expressions produced earlier.
///

pub struct TypedSubquery<S> {
    alias: String,
    include_subclasses: bool,
    filter: Option<Expr>,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    _marker: PhantomData<fn() -> S>,
}

impl<S: Persistable> TypedSubquery<S> {
    pub(crate) fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            include_subclasses: true,
            filter: None,
            group_by: Vec::new(),
            having: None,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The subquery candidate.
    #[must_use]
    pub fn candidate(&self) -> PersistableExpression<S> {
        PersistableExpression::from_expr(Expr::Alias(self.alias.clone()))
    }

    /// The subquery candidate through its query class.
    #[must_use]
    pub fn candidate_class<Q: QueryClass<Candidate = S>>(&self) -> Q {
        Q::from_persistable(self.candidate())
    }

    pub const fn exclude_subclasses(&mut self) -> &mut Self {
        self.include_subclasses = false;
        self
    }

    pub const fn include_subclasses(&mut self) -> &mut Self {
        self.include_subclasses = true;
        self
    }

    pub fn filter(&mut self, expr: impl IntoOperand<BooleanExpression>) -> &mut Self {
        self.filter = Some(expr.into_operand());
        self
    }

    pub fn group_by(&mut self, exprs: &[&dyn AnyExpression]) -> &mut Self {
        self.group_by = exprs.iter().map(|expr| expr.to_expr()).collect();
        self
    }

    pub fn having(&mut self, expr: impl IntoOperand<BooleanExpression>) -> &mut Self {
        self.having = Some(expr.into_operand());
        self
    }

    // ------------------------------------------------------------------
    // Result producers
    // ------------------------------------------------------------------

    /// Single-valued result, typed like `expr`.
    #[must_use]
    pub fn select_unique<E: Expression>(&self, expr: &E) -> E {
        E::from_expr(self.freeze(expr.as_expr().clone(), true, E::DOMAIN))
    }

    #[must_use]
    pub fn select_unique_numeric<N>(&self, expr: &NumericExpression<N>) -> NumericExpression<N> {
        self.select_unique(expr)
    }

    #[must_use]
    pub fn select_unique_string(&self, expr: &StringExpression) -> StringExpression {
        self.select_unique(expr)
    }

    #[must_use]
    pub fn select_unique_date(&self, expr: &DateExpression) -> DateExpression {
        self.select_unique(expr)
    }

    #[must_use]
    pub fn select_unique_time(&self, expr: &TimeExpression) -> TimeExpression {
        self.select_unique(expr)
    }

    #[must_use]
    pub fn select_unique_datetime(&self, expr: &DateTimeExpression) -> DateTimeExpression {
        self.select_unique(expr)
    }

    #[must_use]
    pub fn select_unique_character(&self, expr: &CharacterExpression) -> CharacterExpression {
        self.select_unique(expr)
    }

    #[must_use]
    pub fn select_unique_boolean(&self, expr: &BooleanExpression) -> BooleanExpression {
        self.select_unique(expr)
    }

    /// Collection of `expr` over every selected row, for `contains`,
    /// `size` and `is_empty` in the enclosing query.
    #[must_use]
    pub fn select<X: QueryType>(&self, expr: &X::Expr) -> CollectionExpression<X> {
        CollectionExpression::from_expr(self.freeze(
            expr.as_expr().clone(),
            false,
            ValueDomain::Collection,
        ))
    }

    fn freeze(&self, result: Expr, unique: bool, domain: ValueDomain) -> Expr {
        Expr::Subquery(Box::new(SubqueryExpr {
            class: S::MODEL,
            alias: self.alias.clone(),
            include_subclasses: self.include_subclasses,
            filter: self.filter.clone(),
            group_by: self.group_by.clone(),
            having: self.having.clone(),
            result,
            unique,
            domain,
        }))
    }
}
