///
/// SpatialFunction
/// Operations rendered as `Spatial.<name>(geometry, args...)`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpatialFunction {
    // accessors
    Envelope,
    Dimension,
    Boundary,
    Srid,
    IsSimple,
    IsEmpty,
    AsText,
    AsBinary,
    GeometryType,

    // relations
    Contains,
    Overlaps,
    Touches,
    Crosses,
    Within,
    Intersects,
    Equals,
    Disjoint,
    Relate,

    // measures and derived geometries
    Distance,
    Intersection,
    Buffer,
    ConvexHull,
    SymDifference,
    Difference,
    Union,
    Length,
    NumPoints,
    Centroid,
    Area,
    PointOnSurface,
    NumGeometries,
    GeometryN,

    // line strings
    IsRing,
    StartPoint,
    PointN,
    EndPoint,
    IsClosed,

    // polygons
    ExteriorRing,
    NumInteriorRings,
    InteriorRingN,
}

impl SpatialFunction {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Envelope => "envelope",
            Self::Dimension => "dimension",
            Self::Boundary => "boundary",
            Self::Srid => "srid",
            Self::IsSimple => "isSimple",
            Self::IsEmpty => "isEmpty",
            Self::AsText => "asText",
            Self::AsBinary => "asBinary",
            Self::GeometryType => "geometryType",
            Self::Contains => "contains",
            Self::Overlaps => "overlaps",
            Self::Touches => "touches",
            Self::Crosses => "crosses",
            Self::Within => "within",
            Self::Intersects => "intersects",
            Self::Equals => "equals",
            Self::Disjoint => "disjoint",
            Self::Relate => "relate",
            Self::Distance => "distance",
            Self::Intersection => "intersection",
            Self::Buffer => "buffer",
            Self::ConvexHull => "convexHull",
            Self::SymDifference => "symDifference",
            Self::Difference => "difference",
            Self::Union => "union",
            Self::Length => "length",
            Self::NumPoints => "numPoints",
            Self::Centroid => "centroid",
            Self::Area => "area",
            Self::PointOnSurface => "pointOnSurface",
            Self::NumGeometries => "numGeometries",
            Self::GeometryN => "geometryN",
            Self::IsRing => "isRing",
            Self::StartPoint => "startPoint",
            Self::PointN => "pointN",
            Self::EndPoint => "endPoint",
            Self::IsClosed => "isClosed",
            Self::ExteriorRing => "exteriorRing",
            Self::NumInteriorRings => "numInteriorRing",
            Self::InteriorRingN => "interiorRingN",
        }
    }
}
