//! Contracts implemented by application types.

use crate::{
    error::InternalError,
    expr::{Expr, Expression, PersistableExpression},
    model::ClassModel,
    value::{ObjectValue, Value},
};

/// Name prefix of query classes (`QProduct` for `Product`).
pub const QUERY_CLASS_PREFIX: &str = "Q";

///
/// Persistable
///
/// A class whose instances live in a datastore extent.
/// Instances of subclasses are stored under their own class path; queries
/// that include subclasses read them back through the candidate's
/// `from_object`, so a base class must accept its subclasses' snapshots.
///

pub trait Persistable: Sized + 'static {
    const MODEL: &'static ClassModel;

    /// Datastore identity of this instance.
    fn object_id(&self) -> Value;

    fn to_object(&self) -> ObjectValue;

    fn from_object(object: &ObjectValue) -> Result<Self, InternalError>;
}

///
/// QueryClass
///
/// Typed field accessors over a candidate expression, normally generated by
/// `query_class!`.
///

pub trait QueryClass: Sized {
    type Candidate: Persistable;

    fn from_persistable(expr: PersistableExpression<Self::Candidate>) -> Self;

    fn persistable(&self) -> &PersistableExpression<Self::Candidate>;

    /// Query class bound to the candidate of the enclosing query (`this`).
    #[must_use]
    fn candidate() -> Self {
        Self::from_persistable(PersistableExpression::from_expr(Expr::This))
    }
}

/// Declare a query class with one typed accessor per persistent field.
///
/// ```ignore
/// query_class! {
///     pub struct QProduct for Product {
///         name: String,
///         price: f64,
///     }
/// }
/// ```
#[macro_export]
macro_rules! query_class {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident for $candidate:ty {
            $( $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis struct $name {
            this: $crate::expr::PersistableExpression<$candidate>,
        }

        impl $name {
            $(
                #[must_use]
                pub fn $field(&self) -> <$fty as $crate::expr::QueryType>::Expr {
                    self.this.field::<$fty>(stringify!($field))
                }
            )*
        }

        impl $crate::traits::QueryClass for $name {
            type Candidate = $candidate;

            fn from_persistable(expr: $crate::expr::PersistableExpression<$candidate>) -> Self {
                Self { this: expr }
            }

            fn persistable(&self) -> &$crate::expr::PersistableExpression<$candidate> {
                &self.this
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::expr::PersistableExpression<$candidate>;

            fn deref(&self) -> &Self::Target {
                &self.this
            }
        }
    };
}
