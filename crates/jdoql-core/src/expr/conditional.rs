use crate::expr::{
    BooleanExpression, ComparableExpression, Expr, Expression, IntoOperand, QueryType,
};
use std::{fmt, marker::PhantomData};

///
/// IfThenElseExpression
///
/// Conditional value built from ordered `if_then` branches and one optional
/// `else_end` fallback. Branches are tried in the order they were added and
/// the first whose condition holds supplies the value; with no match the
/// fallback is used, or null when there is none.
///

pub struct IfThenElseExpression<X> {
    expr: Expr,
    _marker: PhantomData<fn() -> X>,
}

impl<X: QueryType> IfThenElseExpression<X> {
    /// Empty conditional with no branches and no fallback.
    #[must_use]
    pub fn new() -> Self {
        Self::from_expr(Expr::Conditional {
            branches: Vec::new(),
            otherwise: None,
            domain: Self::DOMAIN,
        })
    }

    /// Append a branch.
    #[must_use]
    pub fn if_then(
        mut self,
        condition: impl IntoOperand<BooleanExpression>,
        value: impl IntoOperand<X::Expr>,
    ) -> Self {
        let branch = (condition.into_operand(), value.into_operand());
        match &mut self.expr {
            Expr::Conditional { branches, .. } => branches.push(branch),
            other => {
                // A non-conditional node (e.g. an aggregate over this
                // expression) becomes the fallback of a fresh conditional.
                let previous = std::mem::replace(other, Expr::This);
                *other = Expr::Conditional {
                    branches: vec![branch],
                    otherwise: Some(Box::new(previous)),
                    domain: Self::DOMAIN,
                };
            }
        }

        self
    }

    /// Set the fallback, replacing any earlier one.
    #[must_use]
    pub fn else_end(mut self, value: impl IntoOperand<X::Expr>) -> Self {
        let value = Box::new(value.into_operand());
        match &mut self.expr {
            Expr::Conditional { otherwise, .. } => *otherwise = Some(value),
            other => {
                *other = Expr::Conditional {
                    branches: Vec::new(),
                    otherwise: Some(value),
                    domain: Self::DOMAIN,
                };
            }
        }

        self
    }

    /// Number of `if_then` branches.
    #[must_use]
    pub fn branch_count(&self) -> usize {
        match &self.expr {
            Expr::Conditional { branches, .. } => branches.len(),
            _ => 0,
        }
    }

    /// The conditional as an expression of the value type.
    #[must_use]
    pub fn value(&self) -> X::Expr {
        X::Expr::from_expr(self.expr.clone())
    }
}

impl<X: QueryType> Default for IfThenElseExpression<X> {
    fn default() -> Self {
        Self::new()
    }
}

impl<X> Clone for IfThenElseExpression<X> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
            _marker: PhantomData,
        }
    }
}

impl<X> fmt::Debug for IfThenElseExpression<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IfThenElseExpression")
            .field(&self.expr)
            .finish()
    }
}

impl<X> fmt::Display for IfThenElseExpression<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.expr, f)
    }
}

impl<X: QueryType> Expression for IfThenElseExpression<X> {
    const DOMAIN: crate::value::ValueDomain = <X::Expr as Expression>::DOMAIN;

    fn from_expr(expr: Expr) -> Self {
        Self {
            expr,
            _marker: PhantomData,
        }
    }

    fn as_expr(&self) -> &Expr {
        &self.expr
    }

    fn into_expr(self) -> Expr {
        self.expr
    }
}

impl<X: QueryType> ComparableExpression for IfThenElseExpression<X> {}
