//! Core of JDOQL Typed: runtime values, class metadata, the typed expression
//! algebra, the query builder, the persistence manager with its datastore
//! seam, the reference in-memory executor, the geospatial extension and
//! lifecycle-callback ordering.

// public exports are one module level down
pub mod callback;
pub mod config;
pub mod error;
pub mod executor;
pub mod expr;
pub mod geospatial;
pub mod model;
pub mod obs;
pub mod pm;
pub mod query;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Vocabulary needed to declare persistable classes and build queries.
/// Errors, datastores and executors stay in their modules.
///

pub mod prelude {
    pub use crate::{
        expr::{
            AnyExpression, BooleanExpression, CharacterExpression, CollectionExpression,
            ComparableExpression, DateExpression, DateParts, DateTimeExpression, Expression,
            IfThenElseExpression, ListExpression, MapExpression, NumericExpression,
            ObjectExpression, OrderExpression, PersistableExpression, SizedExpression,
            StringExpression, TimeExpression, TimeParts,
        },
        geospatial::{GeospatialHelper, SpatialExpression},
        model::{ClassModel, FieldModel},
        pm::PersistenceManager,
        query::{QueryResult, TypedQuery, TypedSubquery},
        traits::{Persistable, QueryClass},
        value::{ObjectValue, Value, ValueDomain},
    };
}
