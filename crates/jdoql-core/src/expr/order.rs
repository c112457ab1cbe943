use crate::expr::Expr;
use std::fmt;

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum OrderDirection {
    #[default]
    Ascending,
    Descending,
}

///
/// NullOrdering
/// Placement of null keys; `Default` treats null as the lowest value.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NullOrdering {
    #[default]
    Default,
    First,
    Last,
}

///
/// OrderExpression
/// One ordering directive, usable only in `order_by`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct OrderExpression {
    expr: Expr,
    direction: OrderDirection,
    nulls: NullOrdering,
}

impl OrderExpression {
    #[must_use]
    pub const fn new(expr: Expr, direction: OrderDirection) -> Self {
        Self {
            expr,
            direction,
            nulls: NullOrdering::Default,
        }
    }

    #[must_use]
    pub const fn ascending(expr: Expr) -> Self {
        Self::new(expr, OrderDirection::Ascending)
    }

    #[must_use]
    pub const fn descending(expr: Expr) -> Self {
        Self::new(expr, OrderDirection::Descending)
    }

    #[must_use]
    pub const fn direction(&self) -> OrderDirection {
        self.direction
    }

    /// The expression being ordered on.
    #[must_use]
    pub const fn expression(&self) -> &Expr {
        &self.expr
    }

    #[must_use]
    pub const fn nulls(&self) -> NullOrdering {
        self.nulls
    }

    #[must_use]
    pub const fn nulls_first(mut self) -> Self {
        self.nulls = NullOrdering::First;
        self
    }

    #[must_use]
    pub const fn nulls_last(mut self) -> Self {
        self.nulls = NullOrdering::Last;
        self
    }
}

impl fmt::Display for OrderExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.direction {
            OrderDirection::Ascending => "ASC",
            OrderDirection::Descending => "DESC",
        };
        write!(f, "{} {direction}", self.expr)?;

        match self.nulls {
            NullOrdering::Default => Ok(()),
            NullOrdering::First => f.write_str(" NULLS FIRST"),
            NullOrdering::Last => f.write_str(" NULLS LAST"),
        }
    }
}
