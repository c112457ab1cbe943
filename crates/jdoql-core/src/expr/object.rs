use crate::{
    expr::{
        Expr, Expression, Function, NumericExpression, QueryType,
        typed::{static_call, typed_expression},
    },
    value::{Value, ValueDomain},
};

typed_expression! {
    /// Expression whose values are persistent instances of `T`.
    PersistableExpression<T> => ValueDomain::Persistable
}

typed_expression! {
    /// Opaque object-valued expression: identities, blobs, untyped values.
    ObjectExpression<T> => ValueDomain::Object
}

impl<T> PersistableExpression<T> {
    /// `JDOHelper.getObjectId(this)`
    #[must_use]
    pub fn object_id(&self) -> ObjectExpression<Value> {
        static_call(Function::ObjectId, vec![self.expr.clone()])
    }

    /// `JDOHelper.getVersion(this)`
    #[must_use]
    pub fn version(&self) -> NumericExpression<i64> {
        static_call(Function::Version, vec![self.expr.clone()])
    }

    /// Navigate to a field of type `X`.
    #[must_use]
    pub fn field<X: QueryType>(&self, name: &str) -> X::Expr {
        X::Expr::from_expr(Expr::field(
            self.expr.clone(),
            name,
            <X::Expr as Expression>::DOMAIN,
        ))
    }
}
