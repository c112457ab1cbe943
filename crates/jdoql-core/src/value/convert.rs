use crate::value::{GeometryValue, ObjectValue, Value};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error as ThisError;

///
/// ValueConversionError
/// Raised when a runtime value cannot be read as the requested Rust type.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValueConversionError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("integer {value} does not fit in {target}")]
    OutOfRange { value: i64, target: &'static str },

    #[error("expected a row of {expected} column(s), found {found}")]
    Arity { expected: usize, found: usize },
}

impl ValueConversionError {
    const fn mismatch(expected: &'static str, found: &Value) -> Self {
        Self::Mismatch {
            expected,
            found: found.kind_label(),
        }
    }
}

///
/// FromValue
/// Read a Rust value out of a runtime `Value`.
///

pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, ValueConversionError>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ValueConversionError> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ValueConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ValueConversionError> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            other => Err(ValueConversionError::mismatch("list", other)),
        }
    }
}

macro_rules! from_value_int {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, ValueConversionError> {
                    match value {
                        Value::Int(i) => <$ty>::try_from(*i).map_err(|_| {
                            ValueConversionError::OutOfRange {
                                value: *i,
                                target: stringify!($ty),
                            }
                        }),
                        other => Err(ValueConversionError::mismatch("int", other)),
                    }
                }
            }
        )+
    };
}

from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ValueConversionError> {
        value
            .as_f64()
            .ok_or_else(|| ValueConversionError::mismatch("number", value))
    }
}

macro_rules! from_value_variant {
    ($ty:ty, $variant:ident, $label:literal) => {
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self, ValueConversionError> {
                match value {
                    Value::$variant(inner) => Ok(inner.clone()),
                    other => Err(ValueConversionError::mismatch($label, other)),
                }
            }
        }
    };
}

from_value_variant!(bool, Bool, "bool");
from_value_variant!(String, Text, "text");
from_value_variant!(char, Char, "char");
from_value_variant!(NaiveDate, Date, "date");
from_value_variant!(NaiveTime, Time, "time");
from_value_variant!(NaiveDateTime, DateTime, "datetime");
from_value_variant!(GeometryValue, Geometry, "geometry");

impl FromValue for ObjectValue {
    fn from_value(value: &Value) -> Result<Self, ValueConversionError> {
        match value {
            Value::Object(obj) => Ok((**obj).clone()),
            other => Err(ValueConversionError::mismatch("object", other)),
        }
    }
}

///
/// FromRow
///
/// Result-class contract: build one result from the projected columns of a
/// row. Implemented for tuples of `FromValue` types and for `Vec<Value>`;
/// application result classes implement it directly.
///

pub trait FromRow: Sized {
    fn from_row(row: Vec<Value>) -> Result<Self, ValueConversionError>;
}

impl FromRow for Vec<Value> {
    fn from_row(row: Vec<Value>) -> Result<Self, ValueConversionError> {
        Ok(row)
    }
}

macro_rules! from_row_tuple {
    ($len:literal => $($name:ident : $idx:tt),+) => {
        impl<$($name: FromValue),+> FromRow for ($($name,)+) {
            fn from_row(row: Vec<Value>) -> Result<Self, ValueConversionError> {
                if row.len() != $len {
                    return Err(ValueConversionError::Arity {
                        expected: $len,
                        found: row.len(),
                    });
                }

                Ok(($($name::from_value(&row[$idx])?,)+))
            }
        }
    };
}

from_row_tuple!(1 => A: 0);
from_row_tuple!(2 => A: 0, B: 1);
from_row_tuple!(3 => A: 0, B: 1, C: 2);
from_row_tuple!(4 => A: 0, B: 1, C: 2, D: 3);
from_row_tuple!(5 => A: 0, B: 1, C: 2, D: 3, E: 4);
