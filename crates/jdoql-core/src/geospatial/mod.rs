//! Geospatial extension.
//!
//! Geometry-typed expressions, their spatial operations and the
//! `GeospatialHelper` constructors. Everything here renders to JDOQL
//! `Spatial.*` calls; the reference evaluator only understands the accessors
//! that can be answered from the encoding itself (SRID, type, text, binary,
//! emptiness) and reports the rest as unsupported.

mod expression;
mod function;
mod helper;


// re-exports
pub use expression::{
    GeometryCollectionExpression, GeometryExpression, LineStringExpression,
    MultiLineStringExpression, MultiPointExpression, MultiPolygonExpression, PointExpression,
    PolygonExpression, SpatialExpression,
};
pub use function::SpatialFunction;
pub use helper::GeospatialHelper;
