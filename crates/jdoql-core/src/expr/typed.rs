use crate::{
    expr::{
        AggregateFunc, BinaryOp, BooleanExpression, CharacterExpression, CollectionExpression,
        DateExpression, DateTimeExpression, Expr, Function, ListExpression, MapExpression,
        NumericExpression, ObjectExpression, PersistableExpression, StringExpression,
        TimeExpression,
    },
    traits::Persistable,
    value::{Value, ValueDomain},
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt,
};

///
/// Expression
///
/// Capability shared by every typed expression facade.
/// Operations never mutate `self`; each returns a new expression.
///

pub trait Expression: Clone + fmt::Debug + fmt::Display {
    /// Domain of the values this expression produces.
    const DOMAIN: ValueDomain;

    /// Wrap an untyped node. The caller guarantees the node's domain.
    fn from_expr(expr: Expr) -> Self;

    fn as_expr(&self) -> &Expr;

    fn into_expr(self) -> Expr;

    /// `this == other`
    #[must_use]
    fn eq(&self, other: impl IntoOperand<Self>) -> BooleanExpression {
        binary(BinaryOp::Eq, self, other.into_operand())
    }

    /// `this != other`
    #[must_use]
    fn ne(&self, other: impl IntoOperand<Self>) -> BooleanExpression {
        binary(BinaryOp::Ne, self, other.into_operand())
    }

    #[must_use]
    fn is_null(&self) -> BooleanExpression {
        binary(BinaryOp::Eq, self, Expr::Literal(Value::Null))
    }

    #[must_use]
    fn is_not_null(&self) -> BooleanExpression {
        binary(BinaryOp::Ne, self, Expr::Literal(Value::Null))
    }

    #[must_use]
    fn count(&self) -> NumericExpression<i64> {
        aggregate(AggregateFunc::Count, false, self)
    }

    #[must_use]
    fn count_distinct(&self) -> NumericExpression<i64> {
        aggregate(AggregateFunc::Count, true, self)
    }

    /// `this instanceof S`
    #[must_use]
    fn instance_of<S: Persistable>(&self) -> BooleanExpression {
        BooleanExpression::from_expr(Expr::InstanceOf {
            operand: Box::new(self.as_expr().clone()),
            class: S::MODEL,
        })
    }

    /// `(S) this`
    #[must_use]
    fn cast<S: Persistable>(&self) -> PersistableExpression<S> {
        PersistableExpression::from_expr(Expr::Cast {
            operand: Box::new(self.as_expr().clone()),
            class: S::MODEL,
        })
    }
}

///
/// IntoOperand
///
/// Anything usable where an expression of type `E` is expected: the
/// expression itself, a reference to it, or a literal of the matching domain.
///

pub trait IntoOperand<E> {
    fn into_operand(self) -> Expr;
}

impl<E: Expression> IntoOperand<E> for E {
    fn into_operand(self) -> Expr {
        self.into_expr()
    }
}

impl<E: Expression> IntoOperand<E> for &E {
    fn into_operand(self) -> Expr {
        self.as_expr().clone()
    }
}

impl<E: Expression> IntoOperand<E> for Value {
    fn into_operand(self) -> Expr {
        Expr::Literal(self)
    }
}

macro_rules! literal_operand {
    ($target:ty: $($ty:ty),+ $(,)?) => {
        $(
            impl IntoOperand<$target> for $ty {
                fn into_operand(self) -> Expr {
                    Expr::Literal(Value::from(self))
                }
            }
        )+
    };
}

literal_operand!(BooleanExpression: bool);
literal_operand!(StringExpression: &str, String, &String);
literal_operand!(CharacterExpression: char);
literal_operand!(DateExpression: NaiveDate);
literal_operand!(TimeExpression: NaiveTime);
literal_operand!(DateTimeExpression: NaiveDateTime);

macro_rules! numeric_literal_operand {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl<N> IntoOperand<NumericExpression<N>> for $ty {
                fn into_operand(self) -> Expr {
                    Expr::Literal(Value::from(self))
                }
            }
        )+
    };
}

numeric_literal_operand!(i8, i16, i32, i64, u8, u16, u32, f32, f64);

///
/// AnyExpression
///
/// Object-safe view of an expression of any domain, for heterogeneous
/// lists such as grouping and result clauses.
///

pub trait AnyExpression {
    fn to_expr(&self) -> Expr;
}

impl<E: Expression> AnyExpression for E {
    fn to_expr(&self) -> Expr {
        self.as_expr().clone()
    }
}

///
/// QueryType
///
/// Maps a Rust value type onto the expression facade used to query it.
///

pub trait QueryType: 'static {
    type Expr: Expression;

    /// Type name used in `PARAMETERS` and `VARIABLES` declarations.
    fn type_name() -> &'static str;

    /// Class model for persistable types.
    #[must_use]
    fn class_model() -> Option<&'static crate::model::ClassModel> {
        None
    }
}

macro_rules! query_type {
    ($expr:ty: $($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl QueryType for $ty {
                type Expr = $expr;

                fn type_name() -> &'static str {
                    $name
                }
            }
        )+
    };
}

query_type!(BooleanExpression: bool => "boolean");
query_type!(StringExpression: String => "String");
query_type!(CharacterExpression: char => "char");
query_type!(DateExpression: NaiveDate => "Date");
query_type!(TimeExpression: NaiveTime => "Time");
query_type!(DateTimeExpression: NaiveDateTime => "Timestamp");
query_type!(ObjectExpression<Value>: Value => "Object");

macro_rules! numeric_query_type {
    ($($ty:ty => $name:literal),+ $(,)?) => {
        $(
            impl QueryType for $ty {
                type Expr = NumericExpression<$ty>;

                fn type_name() -> &'static str {
                    $name
                }
            }
        )+
    };
}

numeric_query_type!(
    i8 => "byte",
    i16 => "short",
    i32 => "int",
    i64 => "long",
    u8 => "byte",
    u16 => "short",
    u32 => "int",
    u64 => "long",
    f32 => "float",
    f64 => "double",
);

impl<E: QueryType> QueryType for Vec<E> {
    type Expr = ListExpression<E>;

    fn type_name() -> &'static str {
        "List"
    }
}

impl<E: QueryType> QueryType for BTreeSet<E> {
    type Expr = CollectionExpression<E>;

    fn type_name() -> &'static str {
        "Collection"
    }
}

impl<E: QueryType> QueryType for HashSet<E> {
    type Expr = CollectionExpression<E>;

    fn type_name() -> &'static str {
        "Collection"
    }
}

impl<K: QueryType, V: QueryType> QueryType for BTreeMap<K, V> {
    type Expr = MapExpression<K, V>;

    fn type_name() -> &'static str {
        "Map"
    }
}

impl<K: QueryType, V: QueryType> QueryType for HashMap<K, V> {
    type Expr = MapExpression<K, V>;

    fn type_name() -> &'static str {
        "Map"
    }
}

impl<T: Persistable> QueryType for T {
    type Expr = PersistableExpression<T>;

    fn type_name() -> &'static str {
        T::MODEL.path
    }

    fn class_model() -> Option<&'static crate::model::ClassModel> {
        Some(T::MODEL)
    }
}

///
/// Typed facade generator
///
/// Each facade is a thin wrapper around `Expr` with a phantom type tag;
/// `Clone`/`Debug`/`Display` are written by hand so generic tags need no
/// bounds.
///

macro_rules! typed_expression {
    (
        $(#[$meta:meta])*
        $name:ident $(<$($gen:ident),+>)? => $domain:expr
    ) => {
        $(#[$meta])*
        pub struct $name $(<$($gen),+>)? {
            expr: $crate::expr::Expr,
            _marker: ::std::marker::PhantomData<fn() -> ($($($gen,)+)?)>,
        }

        impl $(<$($gen),+>)? Clone for $name $(<$($gen),+>)? {
            fn clone(&self) -> Self {
                Self {
                    expr: self.expr.clone(),
                    _marker: ::std::marker::PhantomData,
                }
            }
        }

        impl $(<$($gen),+>)? ::std::fmt::Debug for $name $(<$($gen),+>)? {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.expr).finish()
            }
        }

        impl $(<$($gen),+>)? ::std::fmt::Display for $name $(<$($gen),+>)? {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.expr, f)
            }
        }

        impl $(<$($gen),+>)? $crate::expr::Expression for $name $(<$($gen),+>)? {
            const DOMAIN: $crate::value::ValueDomain = $domain;

            fn from_expr(expr: $crate::expr::Expr) -> Self {
                Self {
                    expr,
                    _marker: ::std::marker::PhantomData,
                }
            }

            fn as_expr(&self) -> &$crate::expr::Expr {
                &self.expr
            }

            fn into_expr(self) -> $crate::expr::Expr {
                self.expr
            }
        }
    };
}

pub(crate) use typed_expression;

// ----------------------------------------------------------------------
// Node helpers shared by the facades
// ----------------------------------------------------------------------

/// Literal of any domain, typed as `E`.
#[must_use]
pub fn literal<E: Expression>(value: impl Into<Value>) -> E {
    E::from_expr(Expr::Literal(value.into()))
}

pub(crate) fn binary<R: Expression>(op: BinaryOp, left: &impl Expression, right: Expr) -> R {
    R::from_expr(Expr::binary(op, left.as_expr().clone(), right))
}

pub(crate) fn aggregate<R: Expression>(
    func: AggregateFunc,
    distinct: bool,
    operand: &impl Expression,
) -> R {
    R::from_expr(Expr::aggregate(func, distinct, operand.as_expr().clone()))
}

/// Method-style call with `target` as the receiver.
pub(crate) fn method<R: Expression>(
    func: Function,
    target: &impl Expression,
    args: impl IntoIterator<Item = Expr>,
) -> R {
    let args = std::iter::once(target.as_expr().clone()).chain(args).collect();

    R::from_expr(Expr::call(func, args, R::DOMAIN))
}

/// Static call (`Math.*`, `JDOHelper.*`, `Spatial.*`).
pub(crate) fn static_call<R: Expression>(func: Function, args: Vec<Expr>) -> R {
    R::from_expr(Expr::call(func, args, R::DOMAIN))
}
