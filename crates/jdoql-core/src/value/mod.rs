mod compare;
mod convert;
mod geometry;


use crate::model::ClassModel;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

// re-exports
pub use compare::{canonical_cmp, compare_values, values_eq};
pub use convert::{FromRow, FromValue, ValueConversionError};
pub use geometry::{GeometryKind, GeometryRepr, GeometryValue};

///
/// ValueDomain
///
/// Capability tag carried by every expression node and declared parameter.
/// Decides which facet an expression exposes and which values a parameter
/// accepts.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ValueDomain {
    Boolean,
    Numeric,
    String,
    Character,
    Date,
    Time,
    DateTime,
    Collection,
    List,
    Map,
    Persistable,
    Object,
    Geometry,
}

impl ValueDomain {
    /// Whether a runtime value may stand in for this domain.
    /// `Null` is accepted everywhere.
    #[must_use]
    pub const fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null)
            | (Self::Object, _)
            | (Self::Boolean, Value::Bool(_))
            | (Self::Numeric, Value::Int(_) | Value::Float(_))
            | (Self::String, Value::Text(_))
            | (Self::Character, Value::Char(_))
            | (Self::Date, Value::Date(_))
            | (Self::Time, Value::Time(_))
            | (Self::DateTime, Value::DateTime(_))
            | (Self::Collection | Self::List, Value::List(_))
            | (Self::Map, Value::Map(_))
            | (Self::Persistable, Value::Object(_))
            | (Self::Geometry, Value::Geometry(_)) => true,
            _ => false,
        }
    }

    /// Whether values of this domain have a natural ordering.
    #[must_use]
    pub const fn is_orderable(self) -> bool {
        matches!(
            self,
            Self::Numeric
                | Self::String
                | Self::Character
                | Self::Date
                | Self::Time
                | Self::DateTime
                | Self::Boolean
                | Self::Object
        )
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Numeric => "numeric",
            Self::String => "string",
            Self::Character => "character",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Collection => "collection",
            Self::List => "list",
            Self::Map => "map",
            Self::Persistable => "persistable",
            Self::Object => "object",
            Self::Geometry => "geometry",
        }
    }
}

impl fmt::Display for ValueDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

///
/// Value
///
/// Runtime value flowing through parameters, literals, object fields and
/// query results.
///
/// Null   → absent/None; equal only to itself, never ordered.
/// Object → snapshot of a persistent instance (identity + fields).
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Char(char),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Blob(Vec<u8>),
    /// Ordered list of values; also the runtime form of collections.
    List(Vec<Self>),
    /// Map entries in insertion order; keys are unique under `values_eq`.
    Map(Vec<(Self, Self)>),
    Object(Box<ObjectValue>),
    Geometry(GeometryValue),
}

impl Value {
    /// Build a map value, replacing earlier entries that share a key.
    #[must_use]
    pub fn map<K, V, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Self>,
        V: Into<Self>,
    {
        let mut out: Vec<(Self, Self)> = Vec::new();
        for (key, value) in entries {
            let key = key.into();
            let value = value.into();
            match out.iter_mut().find(|(existing, _)| values_eq(existing, &key)) {
                Some(slot) => slot.1 = value,
                None => out.push((key, value)),
            }
        }

        Self::Map(out)
    }

    /// Build a list value.
    #[must_use]
    pub fn list<T, I>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Self>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Domain of this value, or `None` for null.
    #[must_use]
    pub const fn domain(&self) -> Option<ValueDomain> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => ValueDomain::Boolean,
            Self::Int(_) | Self::Float(_) => ValueDomain::Numeric,
            Self::Text(_) => ValueDomain::String,
            Self::Char(_) => ValueDomain::Character,
            Self::Date(_) => ValueDomain::Date,
            Self::Time(_) => ValueDomain::Time,
            Self::DateTime(_) => ValueDomain::DateTime,
            Self::Blob(_) => ValueDomain::Object,
            Self::List(_) => ValueDomain::Collection,
            Self::Map(_) => ValueDomain::Map,
            Self::Object(_) => ValueDomain::Persistable,
            Self::Geometry(_) => ValueDomain::Geometry,
        })
    }

    /// Short variant label used in diagnostics.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Char(_) => "char",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::Blob(_) => "blob",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
            Self::Geometry(_) => "geometry",
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view with int → float widening.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Lookup a map entry by key.
    #[must_use]
    pub fn map_get(&self, key: &Self) -> Option<&Self> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .find(|(k, _)| values_eq(k, key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

// ----------------------------------------------------------------------
// Conversions into Value
// ----------------------------------------------------------------------

macro_rules! value_from {
    ($variant:ident: $($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )+
    };
}

value_from!(Int: i8, i16, i32, i64, u8, u16, u32);
value_from!(Float: f32, f64);
value_from!(Bool: bool);
value_from!(Char: char);
value_from!(Text: String, &str, &String);
value_from!(Date: NaiveDate);
value_from!(Time: NaiveTime);
value_from!(DateTime: NaiveDateTime);
value_from!(Geometry: GeometryValue);

impl From<ObjectValue> for Value {
    fn from(value: ObjectValue) -> Self {
        Self::Object(Box::new(value))
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

// ----------------------------------------------------------------------
// Literal rendering
// ----------------------------------------------------------------------

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Self::Text(s) => write_quoted(f, s),
            Self::Char(c) => write_quoted(f, c.encode_utf8(&mut [0; 4])),
            Self::Date(d) => write!(f, "{{d '{}'}}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{{t '{}'}}", t.format("%H:%M:%S")),
            Self::DateTime(dt) => write!(f, "{{ts '{}'}}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::Blob(bytes) => {
                f.write_str("0x")?;
                for b in bytes {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            Self::List(items) => {
                f.write_str("{")?;
                write_joined(f, items.iter())?;
                f.write_str("}")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                f.write_str("}")
            }
            Self::Object(obj) => write!(f, "{}[{}]", obj.class, obj.id),
            Self::Geometry(geom) => write!(f, "{geom}"),
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in text.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            _ => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}

fn write_joined<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
) -> fmt::Result {
    for (i, item) in items.enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

///
/// ObjectValue
///
/// Snapshot of one persistent instance. `lineage` lists the concrete class
/// path followed by every ancestor path, so `instanceof` and subclass
/// filtering never need the static model at runtime.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ObjectValue {
    pub class: String,
    pub lineage: Vec<String>,
    pub id: Value,
    pub version: Option<i64>,
    pub fields: BTreeMap<String, Value>,
    /// Set when fields were not loaded because of fetch-depth limits.
    #[serde(default)]
    pub hollow: bool,
}

impl ObjectValue {
    /// Create an empty snapshot for an instance of `model`.
    #[must_use]
    pub fn new(model: &ClassModel, id: impl Into<Value>) -> Self {
        Self {
            class: model.path.to_string(),
            lineage: model.lineage().map(|m| m.path.to_string()).collect(),
            id: id.into(),
            version: None,
            fields: BTreeMap::new(),
            hollow: false,
        }
    }

    /// Builder-style field setter.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    #[must_use]
    pub const fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Read and convert a field, reporting a conversion error on mismatch.
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T, crate::error::InternalError> {
        let value = self.fields.get(name).unwrap_or(&Value::Null);

        T::from_value(value)
            .map_err(|err| crate::error::InternalError::object_conversion(&self.class, err))
    }

    /// Whether this instance is of class `path` or one of its subclasses.
    #[must_use]
    pub fn is_instance_of(&self, path: &str) -> bool {
        self.lineage.iter().any(|p| p == path)
    }

    /// Same identity: same class and equal ids.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.class == other.class && values_eq(&self.id, &other.id)
    }

    /// Copy with related objects beyond `depth` hops reduced to identity only.
    /// A negative depth means unlimited.
    #[must_use]
    pub fn limit_depth(&self, depth: i32) -> Self {
        if depth < 0 {
            return self.clone();
        }

        let mut out = self.clone();
        for value in out.fields.values_mut() {
            *value = limit_value_depth(value, depth);
        }
        out
    }

    fn hollowed(&self) -> Self {
        Self {
            class: self.class.clone(),
            lineage: self.lineage.clone(),
            id: self.id.clone(),
            version: self.version,
            fields: BTreeMap::new(),
            hollow: true,
        }
    }
}

fn limit_value_depth(value: &Value, remaining: i32) -> Value {
    match value {
        Value::Object(obj) if remaining <= 0 => Value::Object(Box::new(obj.hollowed())),
        Value::Object(obj) => Value::Object(Box::new(obj.limit_depth(remaining - 1))),
        Value::List(items) => Value::List(
            items
                .iter()
                .map(|item| limit_value_depth(item, remaining))
                .collect(),
        ),
        Value::Map(entries) => Value::Map(
            entries
                .iter()
                .map(|(k, v)| {
                    (
                        limit_value_depth(k, remaining),
                        limit_value_depth(v, remaining),
                    )
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
