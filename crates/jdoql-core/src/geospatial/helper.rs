use crate::{
    expr::{
        Expr, Expression, Function, GeometrySource, IntoOperand, NumericExpression,
        ObjectExpression, StringExpression,
    },
    geospatial::{
        GeometryCollectionExpression, GeometryExpression, LineStringExpression,
        MultiLineStringExpression, MultiPointExpression, MultiPolygonExpression, PointExpression,
        PolygonExpression,
    },
    value::{GeometryKind, Value},
};

///
/// GeospatialHelper
///
/// Stateless factory for geometry expressions built from well-known text
/// or well-known binary plus an optional SRID. Each constructor exists in a
/// literal form and an `_expr` form taking expressions (parameters, fields).
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GeospatialHelper;

fn construct<R: Expression>(
    kind: GeometryKind,
    source: GeometrySource,
    data: Expr,
    srid: Expr,
) -> R {
    R::from_expr(Expr::call(
        Function::GeometryFrom { kind, source },
        vec![data, srid],
        R::DOMAIN,
    ))
}

fn srid_literal(srid: impl Into<Option<i32>>) -> Expr {
    Expr::Literal(Value::from(srid.into()))
}

macro_rules! geometry_constructors {
    ($(
        $kind:ident => $out:ident {
            $text:ident, $text_expr:ident, $wkb:ident, $wkb_expr:ident $(,)?
        }
    ),+ $(,)?) => {
        impl GeospatialHelper {
            $(
                #[must_use]
                pub fn $text(&self, wkt: &str, srid: impl Into<Option<i32>>) -> $out {
                    construct(
                        GeometryKind::$kind,
                        GeometrySource::Text,
                        Expr::literal(wkt),
                        srid_literal(srid),
                    )
                }

                #[must_use]
                pub fn $text_expr(
                    &self,
                    wkt: impl IntoOperand<StringExpression>,
                    srid: impl IntoOperand<NumericExpression<i32>>,
                ) -> $out {
                    construct(
                        GeometryKind::$kind,
                        GeometrySource::Text,
                        wkt.into_operand(),
                        srid.into_operand(),
                    )
                }

                #[must_use]
                pub fn $wkb(&self, wkb: &[u8], srid: impl Into<Option<i32>>) -> $out {
                    construct(
                        GeometryKind::$kind,
                        GeometrySource::Wkb,
                        Expr::Literal(Value::Blob(wkb.to_vec())),
                        srid_literal(srid),
                    )
                }

                #[must_use]
                pub fn $wkb_expr(
                    &self,
                    wkb: impl IntoOperand<ObjectExpression<Vec<u8>>>,
                    srid: impl IntoOperand<NumericExpression<i32>>,
                ) -> $out {
                    construct(
                        GeometryKind::$kind,
                        GeometrySource::Wkb,
                        wkb.into_operand(),
                        srid.into_operand(),
                    )
                }
            )+
        }
    };
}

geometry_constructors!(
    Geometry => GeometryExpression {
        geometry_from_text, geometry_from_text_expr, geometry_from_wkb, geometry_from_wkb_expr,
    },
    GeometryCollection => GeometryCollectionExpression {
        geometry_coll_from_text,
        geometry_coll_from_text_expr,
        geometry_coll_from_wkb,
        geometry_coll_from_wkb_expr,
    },
    Point => PointExpression {
        point_from_text, point_from_text_expr, point_from_wkb, point_from_wkb_expr,
    },
    LineString => LineStringExpression {
        line_string_from_text,
        line_string_from_text_expr,
        line_string_from_wkb,
        line_string_from_wkb_expr,
    },
    Polygon => PolygonExpression {
        polygon_from_text, polygon_from_text_expr, polygon_from_wkb, polygon_from_wkb_expr,
    },
    MultiPoint => MultiPointExpression {
        multi_point_from_text,
        multi_point_from_text_expr,
        multi_point_from_wkb,
        multi_point_from_wkb_expr,
    },
    MultiLineString => MultiLineStringExpression {
        multi_line_string_from_text,
        multi_line_string_from_text_expr,
        multi_line_string_from_wkb,
        multi_line_string_from_wkb_expr,
    },
    MultiPolygon => MultiPolygonExpression {
        multi_polygon_from_text,
        multi_polygon_from_text_expr,
        multi_polygon_from_wkb,
        multi_polygon_from_wkb_expr,
    },
);
