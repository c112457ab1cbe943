//! ## Crate layout
//! - `core`: runtime values, class metadata, expressions, queries, the
//!   persistence manager and the in-memory executor.
//! - `geospatial`: spatial constructors and operations (`Spatial.*`).
//! - `callback`: pre-attach lifecycle callback ordering.
//!
//! The `prelude` module is the surface application code needs to declare
//! persistable classes and build typed queries.

pub use jdoql_core as core;

pub use jdoql_core::{callback, config, error, geospatial, obs, pm, query, value};

#[cfg(test)]
mod tests;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//
// Macros
//

pub use jdoql_core::query_class;

///
/// Prelude
/// Core vocabulary plus the error and configuration types applications
/// handle directly.
///

pub mod prelude {
    pub use crate::{
        core::{config::JdoqlConfig, error::InternalError, prelude::*, query::QueryError},
        query_class,
    };
}
