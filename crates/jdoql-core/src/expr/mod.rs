//! Expression algebra.
//!
//! Every typed facade (`NumericExpression<N>`, `StringExpression`, ...) wraps
//! one untyped `Expr` node. Capabilities shared across domains are narrow
//! traits (`Expression`, `ComparableExpression`, `DateParts`, `TimeParts`,
//! `SizedExpression`); domain-specific operations are inherent methods.

mod ast;
mod conditional;
mod container;
mod function;
mod object;
mod order;
pub(crate) mod render;
mod scalar;
pub(crate) mod typed;

#[cfg(test)]
mod tests;

// re-exports
pub use ast::{AggregateFunc, BinaryOp, Expr, SubqueryExpr, UnaryOp};
pub use conditional::IfThenElseExpression;
pub use container::{CollectionExpression, ListExpression, MapExpression, SizedExpression};
pub use function::{CallStyle, Function, GeometrySource};
pub use object::{ObjectExpression, PersistableExpression};
pub use order::{NullOrdering, OrderDirection, OrderExpression};
pub use scalar::{
    BooleanExpression, CharacterExpression, ComparableExpression, DateExpression, DateParts,
    DateTimeExpression, NumericExpression, StringExpression, TimeExpression, TimeParts,
};
pub use typed::{AnyExpression, Expression, IntoOperand, QueryType, literal};
