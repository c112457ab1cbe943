use crate::{
    expr::{
        BooleanExpression, ComparableExpression, Expr, Expression, Function, IntoOperand,
        NumericExpression, ObjectExpression, QueryType, StringExpression,
        typed::{static_call, typed_expression},
    },
    geospatial::SpatialFunction,
    value::{GeometryValue, Value, ValueDomain},
};

///
/// SpatialExpression
///
/// Operations available on every geometry-typed expression.
/// All of them render as `Spatial.<op>(this, ...)`.
///

pub trait SpatialExpression: Expression {
    /// View this expression as a plain geometry.
    #[must_use]
    fn as_geometry(&self) -> GeometryExpression {
        GeometryExpression::from_expr(self.as_expr().clone())
    }

    //
    // accessors
    //

    #[must_use]
    fn envelope(&self) -> GeometryExpression {
        spatial(SpatialFunction::Envelope, self, [])
    }

    #[must_use]
    fn dimension(&self) -> NumericExpression<i32> {
        spatial(SpatialFunction::Dimension, self, [])
    }

    #[must_use]
    fn boundary(&self) -> GeometryExpression {
        spatial(SpatialFunction::Boundary, self, [])
    }

    #[must_use]
    fn srid(&self) -> NumericExpression<i32> {
        spatial(SpatialFunction::Srid, self, [])
    }

    #[must_use]
    fn is_simple(&self) -> BooleanExpression {
        spatial(SpatialFunction::IsSimple, self, [])
    }

    #[must_use]
    fn is_empty(&self) -> BooleanExpression {
        spatial(SpatialFunction::IsEmpty, self, [])
    }

    /// Well-known text.
    #[must_use]
    fn to_text(&self) -> StringExpression {
        spatial(SpatialFunction::AsText, self, [])
    }

    /// Well-known binary.
    #[must_use]
    fn to_binary(&self) -> ObjectExpression<Vec<u8>> {
        spatial(SpatialFunction::AsBinary, self, [])
    }

    #[must_use]
    fn geometry_type(&self) -> StringExpression {
        spatial(SpatialFunction::GeometryType, self, [])
    }

    //
    // relations
    //

    #[must_use]
    fn contains(&self, other: &impl SpatialExpression) -> BooleanExpression {
        spatial(SpatialFunction::Contains, self, [other.as_expr().clone()])
    }

    #[must_use]
    fn overlaps(&self, other: &impl SpatialExpression) -> BooleanExpression {
        spatial(SpatialFunction::Overlaps, self, [other.as_expr().clone()])
    }

    #[must_use]
    fn touches(&self, other: &impl SpatialExpression) -> BooleanExpression {
        spatial(SpatialFunction::Touches, self, [other.as_expr().clone()])
    }

    #[must_use]
    fn crosses(&self, other: &impl SpatialExpression) -> BooleanExpression {
        spatial(SpatialFunction::Crosses, self, [other.as_expr().clone()])
    }

    #[must_use]
    fn within(&self, other: &impl SpatialExpression) -> BooleanExpression {
        spatial(SpatialFunction::Within, self, [other.as_expr().clone()])
    }

    #[must_use]
    fn intersects(&self, other: &impl SpatialExpression) -> BooleanExpression {
        spatial(SpatialFunction::Intersects, self, [other.as_expr().clone()])
    }

    /// Topological equality (`Spatial.equals`), distinct from `==`.
    #[must_use]
    fn spatial_equals(&self, other: &impl SpatialExpression) -> BooleanExpression {
        spatial(SpatialFunction::Equals, self, [other.as_expr().clone()])
    }

    #[must_use]
    fn disjoint(&self, other: &impl SpatialExpression) -> BooleanExpression {
        spatial(SpatialFunction::Disjoint, self, [other.as_expr().clone()])
    }

    /// DE-9IM relation test against an intersection pattern.
    #[must_use]
    fn relate(
        &self,
        other: &impl SpatialExpression,
        pattern: impl IntoOperand<StringExpression>,
    ) -> BooleanExpression {
        spatial(
            SpatialFunction::Relate,
            self,
            [other.as_expr().clone(), pattern.into_operand()],
        )
    }

    //
    // measures and derived geometries
    //

    #[must_use]
    fn distance(&self, other: &impl SpatialExpression) -> NumericExpression<f64> {
        spatial(SpatialFunction::Distance, self, [other.as_expr().clone()])
    }

    #[must_use]
    fn intersection(&self, other: &impl SpatialExpression) -> GeometryExpression {
        spatial(SpatialFunction::Intersection, self, [other.as_expr().clone()])
    }

    #[must_use]
    fn buffer(&self, distance: impl IntoOperand<NumericExpression<f64>>) -> GeometryExpression {
        spatial(SpatialFunction::Buffer, self, [distance.into_operand()])
    }

    #[must_use]
    fn convex_hull(&self) -> GeometryExpression {
        spatial(SpatialFunction::ConvexHull, self, [])
    }

    #[must_use]
    fn sym_difference(&self, other: &impl SpatialExpression) -> GeometryExpression {
        spatial(SpatialFunction::SymDifference, self, [other.as_expr().clone()])
    }

    #[must_use]
    fn difference(&self, other: &impl SpatialExpression) -> GeometryExpression {
        spatial(SpatialFunction::Difference, self, [other.as_expr().clone()])
    }

    #[must_use]
    fn union(&self, other: &impl SpatialExpression) -> GeometryExpression {
        spatial(SpatialFunction::Union, self, [other.as_expr().clone()])
    }

    #[must_use]
    fn length(&self) -> NumericExpression<f64> {
        spatial(SpatialFunction::Length, self, [])
    }

    #[must_use]
    fn num_points(&self) -> NumericExpression<i32> {
        spatial(SpatialFunction::NumPoints, self, [])
    }

    #[must_use]
    fn centroid(&self) -> GeometryExpression {
        spatial(SpatialFunction::Centroid, self, [])
    }

    #[must_use]
    fn area(&self) -> NumericExpression<f64> {
        spatial(SpatialFunction::Area, self, [])
    }

    #[must_use]
    fn point_on_surface(&self) -> GeometryExpression {
        spatial(SpatialFunction::PointOnSurface, self, [])
    }

    #[must_use]
    fn num_geometries(&self) -> NumericExpression<i32> {
        spatial(SpatialFunction::NumGeometries, self, [])
    }

    /// 1-based member of a geometry collection.
    #[must_use]
    fn geometry_n(&self, position: impl IntoOperand<NumericExpression<i32>>) -> GeometryExpression {
        spatial(SpatialFunction::GeometryN, self, [position.into_operand()])
    }
}

fn spatial<R: Expression, const N: usize>(
    func: SpatialFunction,
    target: &(impl Expression + ?Sized),
    args: [Expr; N],
) -> R {
    let args = std::iter::once(target.as_expr().clone()).chain(args).collect();

    static_call(Function::Spatial(func), args)
}

// ----------------------------------------------------------------------
// Facades
// ----------------------------------------------------------------------

typed_expression! {
    GeometryExpression => ValueDomain::Geometry
}

typed_expression! {
    PointExpression => ValueDomain::Geometry
}

typed_expression! {
    LineStringExpression => ValueDomain::Geometry
}

typed_expression! {
    PolygonExpression => ValueDomain::Geometry
}

typed_expression! {
    /// Marker facade; collections add no operations of their own.
    GeometryCollectionExpression => ValueDomain::Geometry
}

typed_expression! {
    MultiPointExpression => ValueDomain::Geometry
}

typed_expression! {
    MultiLineStringExpression => ValueDomain::Geometry
}

typed_expression! {
    MultiPolygonExpression => ValueDomain::Geometry
}

macro_rules! spatial_facets {
    ($($name:ident),+ $(,)?) => {
        $(
            impl SpatialExpression for $name {}
            impl ComparableExpression for $name {}
        )+
    };
}

spatial_facets!(
    GeometryExpression,
    PointExpression,
    LineStringExpression,
    PolygonExpression,
    GeometryCollectionExpression,
    MultiPointExpression,
    MultiLineStringExpression,
    MultiPolygonExpression,
);

impl LineStringExpression {
    #[must_use]
    pub fn is_ring(&self) -> BooleanExpression {
        spatial(SpatialFunction::IsRing, self, [])
    }

    #[must_use]
    pub fn start_point(&self) -> GeometryExpression {
        spatial(SpatialFunction::StartPoint, self, [])
    }

    /// 1-based point of the line.
    #[must_use]
    pub fn point_n(&self, position: impl IntoOperand<NumericExpression<i32>>) -> GeometryExpression {
        spatial(SpatialFunction::PointN, self, [position.into_operand()])
    }

    #[must_use]
    pub fn end_point(&self) -> GeometryExpression {
        spatial(SpatialFunction::EndPoint, self, [])
    }

    #[must_use]
    pub fn is_closed(&self) -> BooleanExpression {
        spatial(SpatialFunction::IsClosed, self, [])
    }
}

impl PolygonExpression {
    #[must_use]
    pub fn exterior_ring(&self) -> GeometryExpression {
        spatial(SpatialFunction::ExteriorRing, self, [])
    }

    #[must_use]
    pub fn num_interior_rings(&self) -> NumericExpression<i32> {
        spatial(SpatialFunction::NumInteriorRings, self, [])
    }

    #[must_use]
    pub fn interior_ring_n(
        &self,
        position: impl IntoOperand<NumericExpression<i32>>,
    ) -> GeometryExpression {
        spatial(SpatialFunction::InteriorRingN, self, [position.into_operand()])
    }
}

// ----------------------------------------------------------------------
// Literals and query types
// ----------------------------------------------------------------------

impl IntoOperand<GeometryExpression> for GeometryValue {
    fn into_operand(self) -> Expr {
        Expr::Literal(Value::Geometry(self))
    }
}

impl IntoOperand<ObjectExpression<Vec<u8>>> for Vec<u8> {
    fn into_operand(self) -> Expr {
        Expr::Literal(Value::Blob(self))
    }
}

impl IntoOperand<ObjectExpression<Vec<u8>>> for &[u8] {
    fn into_operand(self) -> Expr {
        Expr::Literal(Value::Blob(self.to_vec()))
    }
}

impl QueryType for GeometryValue {
    type Expr = GeometryExpression;

    fn type_name() -> &'static str {
        "Geometry"
    }
}
