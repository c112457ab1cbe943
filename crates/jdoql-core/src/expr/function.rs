use crate::{geospatial::SpatialFunction, value::GeometryKind};

///
/// CallStyle
/// How a function call is written in JDOQL.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallStyle {
    /// `target.name(args)`; the target is the first argument.
    Method,
    /// `Owner.name(args)`.
    Static(&'static str),
}

///
/// GeometrySource
/// Encoding accepted by a `Spatial.*From*` constructor.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GeometrySource {
    Text,
    Wkb,
}

///
/// Function
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Function {
    // string
    CharAt,
    StartsWith,
    EndsWith,
    EqualsIgnoreCase,
    IndexOf,
    Length,
    Substring,
    ToLowerCase,
    ToUpperCase,
    Trim,
    Matches,

    // collections and maps
    Contains,
    IsEmpty,
    Size,
    Get,
    ContainsKey,
    ContainsValue,
    ContainsEntry,

    // temporal parts
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,

    // Math.*
    Abs,
    Sqrt,
    Acos,
    Asin,
    Atan,
    Cos,
    Sin,
    Tan,
    Exp,
    Log,
    Ceil,
    Floor,

    // JDOHelper.*
    ObjectId,
    Version,

    // Spatial.*
    Spatial(SpatialFunction),
    GeometryFrom {
        kind: GeometryKind,
        source: GeometrySource,
    },
}

impl Function {
    #[must_use]
    pub const fn style(self) -> CallStyle {
        match self {
            Self::Abs
            | Self::Sqrt
            | Self::Acos
            | Self::Asin
            | Self::Atan
            | Self::Cos
            | Self::Sin
            | Self::Tan
            | Self::Exp
            | Self::Log
            | Self::Ceil
            | Self::Floor => CallStyle::Static("Math"),
            Self::ObjectId | Self::Version => CallStyle::Static("JDOHelper"),
            Self::Spatial(_) | Self::GeometryFrom { .. } => CallStyle::Static("Spatial"),
            _ => CallStyle::Method,
        }
    }

    /// Function name as rendered in JDOQL (without owner or target).
    #[must_use]
    pub fn name(self) -> String {
        let name = match self {
            Self::CharAt => "charAt",
            Self::StartsWith => "startsWith",
            Self::EndsWith => "endsWith",
            Self::EqualsIgnoreCase => "equalsIgnoreCase",
            Self::IndexOf => "indexOf",
            Self::Length => "length",
            Self::Substring => "substring",
            Self::ToLowerCase => "toLowerCase",
            Self::ToUpperCase => "toUpperCase",
            Self::Trim => "trim",
            Self::Matches => "matches",
            Self::Contains => "contains",
            Self::IsEmpty => "isEmpty",
            Self::Size => "size",
            Self::Get => "get",
            Self::ContainsKey => "containsKey",
            Self::ContainsValue => "containsValue",
            Self::ContainsEntry => "containsEntry",
            Self::Year => "getYear",
            Self::Month => "getMonth",
            Self::Day => "getDay",
            Self::Hour => "getHour",
            Self::Minute => "getMinute",
            Self::Second => "getSecond",
            Self::Abs => "abs",
            Self::Sqrt => "sqrt",
            Self::Acos => "acos",
            Self::Asin => "asin",
            Self::Atan => "atan",
            Self::Cos => "cos",
            Self::Sin => "sin",
            Self::Tan => "tan",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Ceil => "ceil",
            Self::Floor => "floor",
            Self::ObjectId => "getObjectId",
            Self::Version => "getVersion",
            Self::Spatial(func) => func.name(),
            Self::GeometryFrom { kind, source } => {
                let suffix = match source {
                    GeometrySource::Text => "FromText",
                    GeometrySource::Wkb => "FromWKB",
                };
                return format!("{}{suffix}", kind.function_stem());
            }
        };

        name.to_string()
    }
}
