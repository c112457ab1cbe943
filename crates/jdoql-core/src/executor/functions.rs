//! Built-in JDOQL methods over runtime values.

use crate::{
    executor::EvalError,
    expr::{Function, GeometrySource},
    geospatial::SpatialFunction,
    value::{GeometryKind, GeometryRepr, GeometryValue, Value, values_eq},
};
use chrono::{Datelike, Timelike};

/// Apply `func` to already evaluated arguments; method-style calls carry
/// their target as the first argument.
pub(crate) fn call(func: Function, args: Vec<Value>) -> Result<Value, EvalError> {
    let mut args = args.into_iter();
    let target = args.next().unwrap_or_default();
    let rest: Vec<Value> = args.collect();

    match func {
        Function::IsEmpty => is_empty(&target),
        _ if target.is_null() => Ok(Value::Null),

        Function::CharAt
        | Function::StartsWith
        | Function::EndsWith
        | Function::EqualsIgnoreCase
        | Function::IndexOf
        | Function::Length
        | Function::Substring
        | Function::ToLowerCase
        | Function::ToUpperCase
        | Function::Trim
        | Function::Matches => string(func, &target, &rest),

        Function::Contains
        | Function::Size
        | Function::Get
        | Function::ContainsKey
        | Function::ContainsValue
        | Function::ContainsEntry => container(func, &target, &rest),

        Function::Year
        | Function::Month
        | Function::Day
        | Function::Hour
        | Function::Minute
        | Function::Second => temporal(func, &target),

        Function::Abs
        | Function::Sqrt
        | Function::Acos
        | Function::Asin
        | Function::Atan
        | Function::Cos
        | Function::Sin
        | Function::Tan
        | Function::Exp
        | Function::Log
        | Function::Ceil
        | Function::Floor => math(func, &target),

        Function::ObjectId => match &target {
            Value::Object(object) => Ok(object.id.clone()),
            other => Err(EvalError::mismatch(func.name(), other)),
        },
        Function::Version => match &target {
            Value::Object(object) => Ok(object.version.map_or(Value::Null, Value::Int)),
            other => Err(EvalError::mismatch(func.name(), other)),
        },

        Function::Spatial(spatial) => geometry_accessor(spatial, &target),
        Function::GeometryFrom { kind, source } => {
            geometry_from(kind, source, target, rest.first().unwrap_or(&Value::Null))
        }
    }
}

fn arg(func: Function, args: &[Value], index: usize) -> Result<&Value, EvalError> {
    args.get(index).ok_or_else(|| EvalError::unsupported(format!("{}/{index}", func.name())))
}

// ----------------------------------------------------------------------
// Strings
// ----------------------------------------------------------------------

fn string(func: Function, target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let Some(text) = target.as_text() else {
        return Err(EvalError::mismatch(func.name(), target));
    };
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }

    let value = match func {
        Function::Length => Value::Int(char_count(text)),
        Function::ToLowerCase => Value::Text(text.to_lowercase()),
        Function::ToUpperCase => Value::Text(text.to_uppercase()),
        Function::Trim => Value::Text(text.trim().to_string()),
        Function::StartsWith => Value::Bool(text.starts_with(&needle(func, args)?)),
        Function::EndsWith => Value::Bool(text.ends_with(&needle(func, args)?)),
        Function::EqualsIgnoreCase => {
            Value::Bool(text.to_lowercase() == needle(func, args)?.to_lowercase())
        }
        Function::Matches => Value::Bool(matches_pattern(text, &needle(func, args)?)),
        Function::CharAt => {
            let index = int_arg(func, args, 0)?;
            usize::try_from(index)
                .ok()
                .and_then(|index| text.chars().nth(index))
                .map_or(Value::Null, Value::Char)
        }
        Function::IndexOf => {
            let needle = needle(func, args)?;
            let from = match args.get(1) {
                Some(_) => usize::try_from(int_arg(func, args, 1)?.max(0)).unwrap_or(usize::MAX),
                None => 0,
            };
            Value::Int(index_of(text, &needle, from))
        }
        Function::Substring => {
            let chars: Vec<char> = text.chars().collect();
            let begin = usize::try_from(int_arg(func, args, 0)?).ok();
            let end = match args.get(1) {
                Some(_) => usize::try_from(int_arg(func, args, 1)?).ok(),
                None => Some(chars.len()),
            };
            match (begin, end) {
                (Some(begin), Some(end)) if begin <= end && end <= chars.len() => {
                    Value::Text(chars[begin..end].iter().collect())
                }
                _ => Value::Null,
            }
        }
        other => return Err(EvalError::unsupported(other.name())),
    };

    Ok(value)
}

fn needle(func: Function, args: &[Value]) -> Result<String, EvalError> {
    match arg(func, args, 0)? {
        Value::Text(text) => Ok(text.clone()),
        Value::Char(c) => Ok(c.to_string()),
        other => Err(EvalError::mismatch(func.name(), other)),
    }
}

fn int_arg(func: Function, args: &[Value], index: usize) -> Result<i64, EvalError> {
    let value = arg(func, args, index)?;
    value
        .as_int()
        .ok_or_else(|| EvalError::mismatch(func.name(), value))
}

fn char_count(text: &str) -> i64 {
    i64::try_from(text.chars().count()).unwrap_or(i64::MAX)
}

// Character index of `needle` at or after character `from`, or -1.
fn index_of(text: &str, needle: &str, from: usize) -> i64 {
    let Some((start, _)) = text.char_indices().nth(from).or_else(|| {
        (from == text.chars().count()).then_some((text.len(), ' '))
    }) else {
        return -1;
    };

    text[start..]
        .find(needle)
        .map_or(-1, |offset| char_count(&text[..start + offset]))
}

/// JDOQL `matches()`: `.` is any character, `.*` any run, a backslash
/// escapes the next character, and a leading `(?i)` folds case.
pub(crate) fn matches_pattern(text: &str, pattern: &str) -> bool {
    let (fold, pattern) = pattern
        .strip_prefix("(?i)")
        .map_or((false, pattern), |rest| (true, rest));
    let normalize = |s: &str| -> Vec<char> {
        if fold {
            s.to_lowercase().chars().collect()
        } else {
            s.chars().collect()
        }
    };

    let tokens = tokenize(&normalize(pattern));
    let text = normalize(text);

    // reachable[j]: the first i tokens can match the first j characters
    let mut reachable = vec![false; text.len() + 1];
    reachable[0] = true;
    for token in &tokens {
        let mut next = vec![false; text.len() + 1];
        for j in 0..=text.len() {
            if !reachable[j] {
                continue;
            }
            match token {
                Token::AnyRun => {
                    for slot in &mut next[j..] {
                        *slot = true;
                    }
                    break;
                }
                Token::Any if j < text.len() => next[j + 1] = true,
                Token::Char(c) if j < text.len() && text[j] == *c => next[j + 1] = true,
                _ => {}
            }
        }
        reachable = next;
    }

    reachable[text.len()]
}

enum Token {
    Char(char),
    Any,
    AnyRun,
}

fn tokenize(pattern: &[char]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut i = 0;
    while i < pattern.len() {
        match pattern[i] {
            '\\' if i + 1 < pattern.len() => {
                tokens.push(Token::Char(pattern[i + 1]));
                i += 2;
            }
            '.' if pattern.get(i + 1) == Some(&'*') => {
                tokens.push(Token::AnyRun);
                i += 2;
            }
            '.' => {
                tokens.push(Token::Any);
                i += 1;
            }
            c => {
                tokens.push(Token::Char(c));
                i += 1;
            }
        }
    }

    tokens
}

// ----------------------------------------------------------------------
// Containers
// ----------------------------------------------------------------------

fn is_empty(target: &Value) -> Result<Value, EvalError> {
    match target {
        Value::Null => Ok(Value::Bool(true)),
        Value::List(items) => Ok(Value::Bool(items.is_empty())),
        Value::Map(entries) => Ok(Value::Bool(entries.is_empty())),
        Value::Text(text) => Ok(Value::Bool(text.is_empty())),
        Value::Geometry(geometry) => geometry
            .is_empty()
            .map(Value::Bool)
            .ok_or_else(|| EvalError::unsupported("Spatial.isEmpty(WKB)")),
        other => Err(EvalError::mismatch("isEmpty", other)),
    }
}

fn container(func: Function, target: &Value, args: &[Value]) -> Result<Value, EvalError> {
    let value = match (func, target) {
        (Function::Size, Value::List(items)) => len(items.len()),
        (Function::Size, Value::Map(entries)) => len(entries.len()),
        (Function::Contains, Value::List(items)) => {
            let needle = arg(func, args, 0)?;
            Value::Bool(items.iter().any(|item| values_eq(item, needle)))
        }
        (Function::Get, Value::List(items)) => {
            let index = int_arg(func, args, 0)?;
            usize::try_from(index)
                .ok()
                .and_then(|index| items.get(index))
                .cloned()
                .unwrap_or_default()
        }
        (Function::Get, Value::Map(_)) => {
            target.map_get(arg(func, args, 0)?).cloned().unwrap_or_default()
        }
        (Function::ContainsKey, Value::Map(entries)) => {
            let key = arg(func, args, 0)?;
            Value::Bool(entries.iter().any(|(k, _)| values_eq(k, key)))
        }
        (Function::ContainsValue, Value::Map(entries)) => {
            let value = arg(func, args, 0)?;
            Value::Bool(entries.iter().any(|(_, v)| values_eq(v, value)))
        }
        (Function::ContainsEntry, Value::Map(entries)) => {
            let key = arg(func, args, 0)?;
            let value = arg(func, args, 1)?;
            Value::Bool(
                entries
                    .iter()
                    .any(|(k, v)| values_eq(k, key) && values_eq(v, value)),
            )
        }
        (func, other) => return Err(EvalError::mismatch(func.name(), other)),
    };

    Ok(value)
}

fn len(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

// ----------------------------------------------------------------------
// Temporal
// ----------------------------------------------------------------------

fn temporal(func: Function, target: &Value) -> Result<Value, EvalError> {
    let part = match (func, target) {
        (Function::Year, Value::Date(d)) => i64::from(d.year()),
        (Function::Year, Value::DateTime(dt)) => i64::from(dt.year()),
        (Function::Month, Value::Date(d)) => i64::from(d.month()),
        (Function::Month, Value::DateTime(dt)) => i64::from(dt.month()),
        (Function::Day, Value::Date(d)) => i64::from(d.day()),
        (Function::Day, Value::DateTime(dt)) => i64::from(dt.day()),
        (Function::Hour, Value::Time(t)) => i64::from(t.hour()),
        (Function::Hour, Value::DateTime(dt)) => i64::from(dt.hour()),
        (Function::Minute, Value::Time(t)) => i64::from(t.minute()),
        (Function::Minute, Value::DateTime(dt)) => i64::from(dt.minute()),
        (Function::Second, Value::Time(t)) => i64::from(t.second()),
        (Function::Second, Value::DateTime(dt)) => i64::from(dt.second()),
        (func, other) => return Err(EvalError::mismatch(func.name(), other)),
    };

    Ok(Value::Int(part))
}

// ----------------------------------------------------------------------
// Math
// ----------------------------------------------------------------------

fn math(func: Function, target: &Value) -> Result<Value, EvalError> {
    if let Value::Int(i) = target {
        match func {
            Function::Abs => {
                return i
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or(EvalError::Overflow { op: "Math.abs" });
            }
            Function::Ceil | Function::Floor => return Ok(Value::Int(*i)),
            _ => {}
        }
    }

    let Some(x) = target.as_f64() else {
        return Err(EvalError::mismatch(func.name(), target));
    };
    let y = match func {
        Function::Abs => x.abs(),
        Function::Sqrt => x.sqrt(),
        Function::Acos => x.acos(),
        Function::Asin => x.asin(),
        Function::Atan => x.atan(),
        Function::Cos => x.cos(),
        Function::Sin => x.sin(),
        Function::Tan => x.tan(),
        Function::Exp => x.exp(),
        Function::Log => x.ln(),
        Function::Ceil => x.ceil(),
        Function::Floor => x.floor(),
        other => return Err(EvalError::unsupported(other.name())),
    };

    Ok(Value::Float(y))
}

// ----------------------------------------------------------------------
// Geometry
// ----------------------------------------------------------------------

// Only accessors answerable from the encoding header are evaluated in
// memory; topology and measurement belong to a spatial datastore.
fn geometry_accessor(func: SpatialFunction, target: &Value) -> Result<Value, EvalError> {
    let Value::Geometry(geometry) = target else {
        return Err(EvalError::mismatch(format!("Spatial.{}", func.name()), target));
    };

    match func {
        SpatialFunction::Srid => Ok(geometry.srid.map_or(Value::Null, |s| Value::Int(s.into()))),
        SpatialFunction::AsText => match &geometry.repr {
            GeometryRepr::Wkt(text) => Ok(Value::Text(text.clone())),
            GeometryRepr::Wkb(_) => Err(EvalError::unsupported("Spatial.asText(WKB)")),
        },
        SpatialFunction::AsBinary => match &geometry.repr {
            GeometryRepr::Wkb(bytes) => Ok(Value::Blob(bytes.clone())),
            GeometryRepr::Wkt(_) => Err(EvalError::unsupported("Spatial.asBinary(WKT)")),
        },
        SpatialFunction::GeometryType => Ok(geometry
            .kind()
            .map_or(Value::Null, |kind| Value::Text(kind.type_name().to_string()))),
        SpatialFunction::IsEmpty => is_empty(target),
        other => Err(EvalError::unsupported(format!("Spatial.{}", other.name()))),
    }
}

// A constructor whose data does not parse as the declared kind yields null.
fn geometry_from(
    kind: GeometryKind,
    source: GeometrySource,
    data: Value,
    srid: &Value,
) -> Result<Value, EvalError> {
    let srid = match srid {
        Value::Null => None,
        Value::Int(s) => Some(i32::try_from(*s).map_err(|_| EvalError::Overflow { op: "srid" })?),
        other => return Err(EvalError::mismatch("srid", other)),
    };

    let geometry = match (source, data) {
        (GeometrySource::Text, Value::Text(text)) => GeometryValue::from_text(text, srid),
        (GeometrySource::Wkb, Value::Blob(bytes)) => GeometryValue::from_wkb(bytes, srid),
        (_, other) => {
            return Err(EvalError::mismatch(
                Function::GeometryFrom { kind, source }.name(),
                &other,
            ));
        }
    };

    Ok(match geometry.kind() {
        Some(actual) if kind.admits(actual) => Value::Geometry(geometry),
        _ => Value::Null,
    })
}
