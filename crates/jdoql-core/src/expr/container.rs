use crate::{
    expr::{
        BooleanExpression, Expression, Function, IntoOperand, NumericExpression, QueryType,
        typed::{method, typed_expression},
    },
    value::ValueDomain,
};

///
/// SizedExpression
/// Collections, lists and maps.
///

pub trait SizedExpression: Expression {
    #[must_use]
    fn is_empty(&self) -> BooleanExpression {
        method(Function::IsEmpty, self, [])
    }

    #[must_use]
    fn size(&self) -> NumericExpression<i32> {
        method(Function::Size, self, [])
    }
}

typed_expression! {
    /// Unordered collection of `E`.
    CollectionExpression<E> => ValueDomain::Collection
}

typed_expression! {
    ListExpression<E> => ValueDomain::List
}

typed_expression! {
    MapExpression<K, V> => ValueDomain::Map
}

impl<E: QueryType> CollectionExpression<E> {
    /// Membership test; with a variable operand this also binds the variable.
    #[must_use]
    pub fn contains(&self, element: impl IntoOperand<E::Expr>) -> BooleanExpression {
        method(Function::Contains, self, [element.into_operand()])
    }
}

impl<E: QueryType> ListExpression<E> {
    #[must_use]
    pub fn contains(&self, element: impl IntoOperand<E::Expr>) -> BooleanExpression {
        method(Function::Contains, self, [element.into_operand()])
    }

    /// Element at a zero-based position; null when out of bounds.
    #[must_use]
    pub fn get(&self, position: impl IntoOperand<NumericExpression<i32>>) -> E::Expr {
        method(Function::Get, self, [position.into_operand()])
    }
}

impl<K: QueryType, V: QueryType> MapExpression<K, V> {
    #[must_use]
    pub fn contains_key(&self, key: impl IntoOperand<K::Expr>) -> BooleanExpression {
        method(Function::ContainsKey, self, [key.into_operand()])
    }

    #[must_use]
    pub fn contains_value(&self, value: impl IntoOperand<V::Expr>) -> BooleanExpression {
        method(Function::ContainsValue, self, [value.into_operand()])
    }

    #[must_use]
    pub fn contains_entry(
        &self,
        key: impl IntoOperand<K::Expr>,
        value: impl IntoOperand<V::Expr>,
    ) -> BooleanExpression {
        method(
            Function::ContainsEntry,
            self,
            [key.into_operand(), value.into_operand()],
        )
    }

    /// Value mapped to `key`, or null.
    #[must_use]
    pub fn get(&self, key: impl IntoOperand<K::Expr>) -> V::Expr {
        method(Function::Get, self, [key.into_operand()])
    }
}

impl<E> SizedExpression for CollectionExpression<E> {}
impl<E> SizedExpression for ListExpression<E> {}
impl<K, V> SizedExpression for MapExpression<K, V> {}
