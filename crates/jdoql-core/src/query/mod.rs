//! Typed query builder.
//!
//! A `TypedQuery<T>` accumulates clauses in a `QueryState`; every execution
//! validates and evaluates that state afresh without changing it.

mod error;
mod render;
mod result;
mod state;
mod subquery;
mod typed;
mod validate;


// re-exports
pub use error::{QueryError, ValidateError};
pub(crate) use render::Rendered;
pub use result::QueryResult;
pub use state::{Declaration, QueryState, RangeSpec};
pub use subquery::TypedSubquery;
pub use typed::TypedQuery;
pub(crate) use validate::{check_range, is_grouped, validate};
