use crate::value::{GeometryRepr, Value};
use std::cmp::Ordering;

/// Query equality (`==`).
///
/// - null equals only null
/// - ints and floats compare numerically
/// - persistent objects compare by identity (class + id)
/// - lists and maps compare element-wise under the same rules
#[must_use]
pub fn values_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            compare_numeric(left, right) == Some(Ordering::Equal)
        }
        (Value::Object(a), Value::Object(b)) => a.same_identity(b),
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_eq(x, y))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter().all(|(k, v)| {
                    b.iter()
                        .find(|(k2, _)| values_eq(k, k2))
                        .is_some_and(|(_, v2)| values_eq(v, v2))
                })
        }
        _ => left == right,
    }
}

/// Query ordering (`<`, `<=`, `>`, `>=`).
///
/// Returns `None` when the pair has no defined ordering: null on either
/// side, mismatched domains, or unordered domains (lists, maps, geometry).
#[must_use]
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            compare_numeric(left, right)
        }
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Char(a), Value::Char(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        (Value::Object(a), Value::Object(b)) if a.class == b.class => {
            compare_values(&a.id, &b.id)
        }
        _ => None,
    }
}

fn compare_numeric(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return Some(a.cmp(b));
    }

    left.as_f64()?.partial_cmp(&right.as_f64()?)
}

/// Total canonical comparator used for sorting, grouping and distinct.
///
/// Ordering rules:
/// 1. Canonical variant rank (null first)
/// 2. Variant-specific comparison for same-ranked values
///
/// Ints and floats share a rank so mixed numeric columns sort numerically.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = canonical_rank(left).cmp(&canonical_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }

    canonical_cmp_same_rank(left, right)
}

const fn canonical_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Float(_) => 2,
        Value::Char(_) => 3,
        Value::Text(_) => 4,
        Value::Date(_) => 5,
        Value::Time(_) => 6,
        Value::DateTime(_) => 7,
        Value::Blob(_) => 8,
        Value::List(_) => 9,
        Value::Map(_) => 10,
        Value::Object(_) => 11,
        Value::Geometry(_) => 12,
    }
}

fn canonical_cmp_same_rank(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            compare_numeric(left, right).unwrap_or_else(|| {
                // NaN sorts after every number and equal to itself.
                let l = left.as_f64().is_some_and(f64::is_nan);
                let r = right.as_f64().is_some_and(f64::is_nan);
                l.cmp(&r)
            })
        }
        (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
        (Value::List(a), Value::List(b)) => cmp_slices(a, b),
        (Value::Map(a), Value::Map(b)) => {
            for ((ka, va), (kb, vb)) in a.iter().zip(b) {
                let cmp = canonical_cmp(ka, kb).then_with(|| canonical_cmp(va, vb));
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            a.len().cmp(&b.len())
        }
        (Value::Object(a), Value::Object(b)) => a
            .class
            .cmp(&b.class)
            .then_with(|| canonical_cmp(&a.id, &b.id)),
        (Value::Geometry(a), Value::Geometry(b)) => {
            let repr = match (&a.repr, &b.repr) {
                (GeometryRepr::Wkt(x), GeometryRepr::Wkt(y)) => x.cmp(y),
                (GeometryRepr::Wkb(x), GeometryRepr::Wkb(y)) => x.cmp(y),
                (GeometryRepr::Wkt(_), GeometryRepr::Wkb(_)) => Ordering::Less,
                (GeometryRepr::Wkb(_), GeometryRepr::Wkt(_)) => Ordering::Greater,
            };
            repr.then_with(|| a.srid.cmp(&b.srid))
        }
        _ => compare_values(left, right).unwrap_or(Ordering::Equal),
    }
}

fn cmp_slices(left: &[Value], right: &[Value]) -> Ordering {
    for (l, r) in left.iter().zip(right) {
        let cmp = canonical_cmp(l, r);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    left.len().cmp(&right.len())
}
