use serde::{Deserialize, Serialize};
use std::fmt;

///
/// GeometryKind
///
/// Instantiable geometry subtypes of the simple-features model, plus the
/// abstract `Geometry` used when a value is constructed without a declared
/// subtype.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum GeometryKind {
    Geometry,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryKind {
    /// Name returned by `getGeometryType()`.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::Geometry => "Geometry",
            Self::Point => "Point",
            Self::LineString => "LineString",
            Self::Polygon => "Polygon",
            Self::MultiPoint => "MultiPoint",
            Self::MultiLineString => "MultiLineString",
            Self::MultiPolygon => "MultiPolygon",
            Self::GeometryCollection => "GeometryCollection",
        }
    }

    /// Tag used in WKT and in the `Spatial.*FromText` function names.
    #[must_use]
    pub const fn wkt_tag(self) -> &'static str {
        match self {
            Self::Geometry => "GEOMETRY",
            Self::Point => "POINT",
            Self::LineString => "LINESTRING",
            Self::Polygon => "POLYGON",
            Self::MultiPoint => "MULTIPOINT",
            Self::MultiLineString => "MULTILINESTRING",
            Self::MultiPolygon => "MULTIPOLYGON",
            Self::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }

    /// Function-name stem used by `Spatial.<stem>FromText` / `FromWKB`.
    #[must_use]
    pub const fn function_stem(self) -> &'static str {
        match self {
            Self::Geometry => "geom",
            Self::Point => "point",
            Self::LineString => "line",
            Self::Polygon => "poly",
            Self::MultiPoint => "mPoint",
            Self::MultiLineString => "mLine",
            Self::MultiPolygon => "mPoly",
            Self::GeometryCollection => "geomColl",
        }
    }

    /// Parse the leading type tag of a WKT string (`POINT (1 2)`, `SRID=4326;POINT(1 2)`).
    #[must_use]
    pub fn from_wkt(text: &str) -> Option<Self> {
        let body = text
            .trim()
            .split_once(';')
            .filter(|(prefix, _)| prefix.trim().to_ascii_uppercase().starts_with("SRID="))
            .map_or(text.trim(), |(_, rest)| rest.trim());
        let tag: String = body
            .chars()
            .take_while(char::is_ascii_alphabetic)
            .collect::<String>()
            .to_ascii_uppercase();

        Self::from_tag(&tag)
    }

    fn from_tag(tag: &str) -> Option<Self> {
        // Dimension suffixes (POINTZ, POINTM, POINTZM) fold onto the base tag.
        let base = tag
            .strip_suffix("ZM")
            .or_else(|| tag.strip_suffix('Z'))
            .or_else(|| tag.strip_suffix('M'))
            .filter(|base| Self::from_exact_tag(base).is_some())
            .unwrap_or(tag);

        Self::from_exact_tag(base)
    }

    fn from_exact_tag(tag: &str) -> Option<Self> {
        Some(match tag {
            "POINT" => Self::Point,
            "LINESTRING" => Self::LineString,
            "POLYGON" => Self::Polygon,
            "MULTIPOINT" => Self::MultiPoint,
            "MULTILINESTRING" => Self::MultiLineString,
            "MULTIPOLYGON" => Self::MultiPolygon,
            "GEOMETRYCOLLECTION" => Self::GeometryCollection,
            _ => return None,
        })
    }

    /// Read the geometry type code from a (E)WKB header.
    #[must_use]
    pub fn from_wkb(bytes: &[u8]) -> Option<Self> {
        let (&order, rest) = bytes.split_first()?;
        let raw: [u8; 4] = rest.get(..4)?.try_into().ok()?;
        let code = match order {
            0 => u32::from_be_bytes(raw),
            1 => u32::from_le_bytes(raw),
            _ => return None,
        };

        // EWKB flag bits (Z, M, SRID) and ISO dimension offsets are ignored.
        Self::from_wkb_code((code & 0x0FFF_FFFF) % 1000)
    }

    const fn from_wkb_code(code: u32) -> Option<Self> {
        Some(match code {
            1 => Self::Point,
            2 => Self::LineString,
            3 => Self::Polygon,
            4 => Self::MultiPoint,
            5 => Self::MultiLineString,
            6 => Self::MultiPolygon,
            7 => Self::GeometryCollection,
            _ => return None,
        })
    }

    /// Whether a value of kind `actual` satisfies this declared kind.
    #[must_use]
    pub fn admits(self, actual: Self) -> bool {
        self == Self::Geometry || self == actual
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

///
/// GeometryRepr
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GeometryRepr {
    Wkt(String),
    Wkb(Vec<u8>),
}

///
/// GeometryValue
///
/// A geometry literal as handed to the datastore: its well-known encoding and
/// an optional spatial reference id.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GeometryValue {
    pub repr: GeometryRepr,
    pub srid: Option<i32>,
}

impl GeometryValue {
    #[must_use]
    pub fn from_text(wkt: impl Into<String>, srid: Option<i32>) -> Self {
        Self {
            repr: GeometryRepr::Wkt(wkt.into()),
            srid,
        }
    }

    #[must_use]
    pub fn from_wkb(wkb: impl Into<Vec<u8>>, srid: Option<i32>) -> Self {
        Self {
            repr: GeometryRepr::Wkb(wkb.into()),
            srid,
        }
    }

    /// Parsed subtype, when the encoding header is recognizable.
    #[must_use]
    pub fn kind(&self) -> Option<GeometryKind> {
        match &self.repr {
            GeometryRepr::Wkt(text) => GeometryKind::from_wkt(text),
            GeometryRepr::Wkb(bytes) => GeometryKind::from_wkb(bytes),
        }
    }

    /// `EMPTY` geometries; only decidable for WKT.
    #[must_use]
    pub fn is_empty(&self) -> Option<bool> {
        match &self.repr {
            GeometryRepr::Wkt(text) => Some(text.trim().to_ascii_uppercase().ends_with("EMPTY")),
            GeometryRepr::Wkb(_) => None,
        }
    }
}

impl fmt::Display for GeometryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let srid = self.srid.map_or_else(|| "null".to_string(), |s| s.to_string());
        match &self.repr {
            GeometryRepr::Wkt(text) => {
                write!(f, "Spatial.geomFromText('{}', {srid})", text.replace('\'', "\\'"))
            }
            GeometryRepr::Wkb(bytes) => {
                f.write_str("Spatial.geomFromWKB(0x")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                write!(f, ", {srid})")
            }
        }
    }
}
