use crate::{
    expr::{
        AggregateFunc, BinaryOp, Expr, Expression, Function, IntoOperand, OrderExpression,
        UnaryOp,
        typed::{aggregate, binary, method, static_call, typed_expression},
    },
    value::ValueDomain,
};
use std::ops;

// ----------------------------------------------------------------------
// Shared facets
// ----------------------------------------------------------------------

///
/// ComparableExpression
/// Expressions whose values have a natural ordering.
///

pub trait ComparableExpression: Expression {
    #[must_use]
    fn lt(&self, other: impl IntoOperand<Self>) -> BooleanExpression {
        binary(BinaryOp::Lt, self, other.into_operand())
    }

    #[must_use]
    fn lteq(&self, other: impl IntoOperand<Self>) -> BooleanExpression {
        binary(BinaryOp::Lte, self, other.into_operand())
    }

    #[must_use]
    fn gt(&self, other: impl IntoOperand<Self>) -> BooleanExpression {
        binary(BinaryOp::Gt, self, other.into_operand())
    }

    #[must_use]
    fn gteq(&self, other: impl IntoOperand<Self>) -> BooleanExpression {
        binary(BinaryOp::Gte, self, other.into_operand())
    }

    /// Aggregate minimum.
    #[must_use]
    fn min(&self) -> Self {
        aggregate(AggregateFunc::Min, false, self)
    }

    /// Aggregate maximum.
    #[must_use]
    fn max(&self) -> Self {
        aggregate(AggregateFunc::Max, false, self)
    }

    #[must_use]
    fn asc(&self) -> OrderExpression {
        OrderExpression::ascending(self.as_expr().clone())
    }

    #[must_use]
    fn desc(&self) -> OrderExpression {
        OrderExpression::descending(self.as_expr().clone())
    }
}

///
/// DateParts
///

pub trait DateParts: Expression {
    #[must_use]
    fn year(&self) -> NumericExpression<i32> {
        method(Function::Year, self, [])
    }

    /// Month of year, 1-based.
    #[must_use]
    fn month(&self) -> NumericExpression<i32> {
        method(Function::Month, self, [])
    }

    /// Day of month.
    #[must_use]
    fn day(&self) -> NumericExpression<i32> {
        method(Function::Day, self, [])
    }
}

///
/// TimeParts
///

pub trait TimeParts: Expression {
    #[must_use]
    fn hour(&self) -> NumericExpression<i32> {
        method(Function::Hour, self, [])
    }

    #[must_use]
    fn minute(&self) -> NumericExpression<i32> {
        method(Function::Minute, self, [])
    }

    #[must_use]
    fn second(&self) -> NumericExpression<i32> {
        method(Function::Second, self, [])
    }
}

// ----------------------------------------------------------------------
// Boolean
// ----------------------------------------------------------------------

typed_expression! {
    /// Boolean-valued expression: filters, `having` clauses, branch conditions.
    BooleanExpression => ValueDomain::Boolean
}

impl BooleanExpression {
    #[must_use]
    pub fn and(&self, other: impl IntoOperand<Self>) -> Self {
        binary(BinaryOp::And, self, other.into_operand())
    }

    #[must_use]
    pub fn or(&self, other: impl IntoOperand<Self>) -> Self {
        binary(BinaryOp::Or, self, other.into_operand())
    }

    #[must_use]
    pub fn not(&self) -> Self {
        Self::from_expr(Expr::unary(UnaryOp::Not, self.expr.clone()))
    }
}

impl ComparableExpression for BooleanExpression {}

impl ops::BitAnd for BooleanExpression {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self::from_expr(Expr::binary(BinaryOp::And, self.expr, rhs.expr))
    }
}

impl ops::BitOr for BooleanExpression {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self::from_expr(Expr::binary(BinaryOp::Or, self.expr, rhs.expr))
    }
}

// ----------------------------------------------------------------------
// Numeric
// ----------------------------------------------------------------------

typed_expression! {
    /// Numeric expression; `N` is the Rust type of the underlying values.
    NumericExpression<N> => ValueDomain::Numeric
}

impl<N> NumericExpression<N> {
    #[must_use]
    pub fn add(&self, other: impl IntoOperand<Self>) -> Self {
        binary(BinaryOp::Add, self, other.into_operand())
    }

    #[must_use]
    pub fn sub(&self, other: impl IntoOperand<Self>) -> Self {
        binary(BinaryOp::Sub, self, other.into_operand())
    }

    #[must_use]
    pub fn mul(&self, other: impl IntoOperand<Self>) -> Self {
        binary(BinaryOp::Mul, self, other.into_operand())
    }

    #[must_use]
    pub fn div(&self, other: impl IntoOperand<Self>) -> Self {
        binary(BinaryOp::Div, self, other.into_operand())
    }

    #[must_use]
    pub fn rem(&self, other: impl IntoOperand<Self>) -> Self {
        binary(BinaryOp::Rem, self, other.into_operand())
    }

    #[must_use]
    pub fn neg(&self) -> Self {
        Self::from_expr(Expr::unary(UnaryOp::Neg, self.expr.clone()))
    }

    /// Bitwise complement.
    #[must_use]
    pub fn com(&self) -> Self {
        Self::from_expr(Expr::unary(UnaryOp::Complement, self.expr.clone()))
    }

    #[must_use]
    pub fn bit_and(&self, other: impl IntoOperand<Self>) -> Self {
        binary(BinaryOp::BitAnd, self, other.into_operand())
    }

    #[must_use]
    pub fn bit_or(&self, other: impl IntoOperand<Self>) -> Self {
        binary(BinaryOp::BitOr, self, other.into_operand())
    }

    #[must_use]
    pub fn bit_xor(&self, other: impl IntoOperand<Self>) -> Self {
        binary(BinaryOp::BitXor, self, other.into_operand())
    }

    //
    // aggregates
    //

    #[must_use]
    pub fn avg(&self) -> NumericExpression<f64> {
        aggregate(AggregateFunc::Avg, false, self)
    }

    #[must_use]
    pub fn avg_distinct(&self) -> NumericExpression<f64> {
        aggregate(AggregateFunc::Avg, true, self)
    }

    #[must_use]
    pub fn sum(&self) -> Self {
        aggregate(AggregateFunc::Sum, false, self)
    }

    #[must_use]
    pub fn sum_distinct(&self) -> Self {
        aggregate(AggregateFunc::Sum, true, self)
    }

    //
    // Math.*
    //

    #[must_use]
    pub fn abs(&self) -> Self {
        self.math(Function::Abs)
    }

    #[must_use]
    pub fn sqrt(&self) -> NumericExpression<f64> {
        self.math(Function::Sqrt)
    }

    #[must_use]
    pub fn acos(&self) -> NumericExpression<f64> {
        self.math(Function::Acos)
    }

    #[must_use]
    pub fn asin(&self) -> NumericExpression<f64> {
        self.math(Function::Asin)
    }

    #[must_use]
    pub fn atan(&self) -> NumericExpression<f64> {
        self.math(Function::Atan)
    }

    #[must_use]
    pub fn cos(&self) -> NumericExpression<f64> {
        self.math(Function::Cos)
    }

    #[must_use]
    pub fn sin(&self) -> NumericExpression<f64> {
        self.math(Function::Sin)
    }

    #[must_use]
    pub fn tan(&self) -> NumericExpression<f64> {
        self.math(Function::Tan)
    }

    #[must_use]
    pub fn exp(&self) -> NumericExpression<f64> {
        self.math(Function::Exp)
    }

    /// Natural logarithm.
    #[must_use]
    pub fn log(&self) -> NumericExpression<f64> {
        self.math(Function::Log)
    }

    #[must_use]
    pub fn ceil(&self) -> Self {
        self.math(Function::Ceil)
    }

    #[must_use]
    pub fn floor(&self) -> Self {
        self.math(Function::Floor)
    }

    fn math<R: Expression>(&self, func: Function) -> R {
        static_call(func, vec![self.expr.clone()])
    }
}

impl<N> ComparableExpression for NumericExpression<N> {}

// ----------------------------------------------------------------------
// String
// ----------------------------------------------------------------------

typed_expression! {
    StringExpression => ValueDomain::String
}

impl StringExpression {
    /// `this + other`
    #[must_use]
    pub fn concat(&self, other: impl IntoOperand<Self>) -> Self {
        binary(BinaryOp::Add, self, other.into_operand())
    }

    #[must_use]
    pub fn char_at(&self, position: impl IntoOperand<NumericExpression<i32>>) -> CharacterExpression {
        method(Function::CharAt, self, [position.into_operand()])
    }

    #[must_use]
    pub fn starts_with(&self, prefix: impl IntoOperand<Self>) -> BooleanExpression {
        method(Function::StartsWith, self, [prefix.into_operand()])
    }

    #[must_use]
    pub fn ends_with(&self, suffix: impl IntoOperand<Self>) -> BooleanExpression {
        method(Function::EndsWith, self, [suffix.into_operand()])
    }

    #[must_use]
    pub fn equals_ignore_case(&self, other: impl IntoOperand<Self>) -> BooleanExpression {
        method(Function::EqualsIgnoreCase, self, [other.into_operand()])
    }

    /// Position of the first occurrence, or -1.
    #[must_use]
    pub fn index_of(&self, needle: impl IntoOperand<Self>) -> NumericExpression<i32> {
        method(Function::IndexOf, self, [needle.into_operand()])
    }

    #[must_use]
    pub fn index_of_from(
        &self,
        needle: impl IntoOperand<Self>,
        from: impl IntoOperand<NumericExpression<i32>>,
    ) -> NumericExpression<i32> {
        method(
            Function::IndexOf,
            self,
            [needle.into_operand(), from.into_operand()],
        )
    }

    #[must_use]
    pub fn length(&self) -> NumericExpression<i32> {
        method(Function::Length, self, [])
    }

    #[must_use]
    pub fn substring(&self, begin: impl IntoOperand<NumericExpression<i32>>) -> Self {
        method(Function::Substring, self, [begin.into_operand()])
    }

    /// Characters in `[begin, end)`.
    #[must_use]
    pub fn substring_range(
        &self,
        begin: impl IntoOperand<NumericExpression<i32>>,
        end: impl IntoOperand<NumericExpression<i32>>,
    ) -> Self {
        method(
            Function::Substring,
            self,
            [begin.into_operand(), end.into_operand()],
        )
    }

    #[must_use]
    pub fn to_lower_case(&self) -> Self {
        method(Function::ToLowerCase, self, [])
    }

    #[must_use]
    pub fn to_upper_case(&self) -> Self {
        method(Function::ToUpperCase, self, [])
    }

    #[must_use]
    pub fn trim(&self) -> Self {
        method(Function::Trim, self, [])
    }

    /// JDOQL pattern match: `.` any character, `.*` any run, `(?i)` prefix
    /// for case-insensitive matching.
    #[must_use]
    pub fn matches(&self, pattern: impl IntoOperand<Self>) -> BooleanExpression {
        method(Function::Matches, self, [pattern.into_operand()])
    }
}

impl ComparableExpression for StringExpression {}

// ----------------------------------------------------------------------
// Character
// ----------------------------------------------------------------------

typed_expression! {
    CharacterExpression => ValueDomain::Character
}

impl CharacterExpression {
    #[must_use]
    pub fn to_lower_case(&self) -> Self {
        method(Function::ToLowerCase, self, [])
    }

    #[must_use]
    pub fn to_upper_case(&self) -> Self {
        method(Function::ToUpperCase, self, [])
    }
}

impl ComparableExpression for CharacterExpression {}

// ----------------------------------------------------------------------
// Temporal
// ----------------------------------------------------------------------

typed_expression! {
    DateExpression => ValueDomain::Date
}

typed_expression! {
    TimeExpression => ValueDomain::Time
}

typed_expression! {
    DateTimeExpression => ValueDomain::DateTime
}

impl ComparableExpression for DateExpression {}
impl ComparableExpression for TimeExpression {}
impl ComparableExpression for DateTimeExpression {}

impl DateParts for DateExpression {}
impl DateParts for DateTimeExpression {}

impl TimeParts for TimeExpression {}
impl TimeParts for DateTimeExpression {}
