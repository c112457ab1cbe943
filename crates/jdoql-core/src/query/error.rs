use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    executor::EvalError,
    value::{ValueConversionError, ValueDomain},
};
use thiserror::Error as ThisError;

///
/// QueryError
///
/// Everything an execution can report. Builder calls never fail directly;
/// misuse is recorded on the query and surfaces here on the next execution.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum QueryError {
    #[error("{0}")]
    Validate(#[from] ValidateError),

    #[error("'{name}' is not a declared parameter of this query")]
    UnknownParameter { name: String },

    #[error("parameter '{name}' has no bound value")]
    UnboundParameter { name: String },

    #[error("parameter '{name}' expects a {expected} value, found {found}")]
    ParameterType {
        name: String,
        expected: ValueDomain,
        found: &'static str,
    },

    #[error("unique result expected, query produced {rows} rows")]
    NotUnique { rows: usize },

    #[error("invalid range [{from}, {to})")]
    InvalidRange { from: i64, to: i64 },

    #[error("{0}")]
    Eval(EvalError),

    #[error("cannot convert result row: {0}")]
    Result(#[from] ValueConversionError),

    #[error("{0}")]
    Execute(#[from] InternalError),
}

impl From<EvalError> for QueryError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::UnboundParameter { name } => Self::UnboundParameter { name },
            other => Self::Eval(other),
        }
    }
}

impl From<QueryError> for InternalError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Execute(err) => err,
            QueryError::Eval(err) => err.into(),
            QueryError::NotUnique { .. } => {
                Self::new(ErrorClass::Conflict, ErrorOrigin::Query, err.to_string())
            }
            QueryError::Result(_) => Self::new(
                ErrorClass::InvariantViolation,
                ErrorOrigin::Executor,
                err.to_string(),
            ),
            other => Self::query_unsupported(other.to_string()),
        }
    }
}

///
/// ValidateError
/// Structural problems found before any object is read.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ValidateError {
    #[error("filter must be boolean, found {domain}")]
    FilterNotBoolean { domain: ValueDomain },

    #[error("having must be boolean, found {domain}")]
    HavingNotBoolean { domain: ValueDomain },

    #[error("having requires a group-by clause")]
    HavingWithoutGrouping,

    #[error("cannot order by '{expr}': {domain} values are not ordered")]
    NotOrderable { expr: String, domain: ValueDomain },

    #[error("aggregate '{expr}' is not allowed in the filter")]
    AggregateInFilter { expr: String },

    #[error("'{class}' has no field '{field}'")]
    UnknownField { class: &'static str, field: String },

    #[error("field '{class}.{field}' is {declared}, used as {used}")]
    FieldDomain {
        class: &'static str,
        field: String,
        declared: ValueDomain,
        used: ValueDomain,
    },

    #[error("parameter '{name}' is already declared as {declared}, redeclared as {requested}")]
    ParameterRedeclared {
        name: String,
        declared: ValueDomain,
        requested: ValueDomain,
    },

    #[error("variable '{name}' is already declared as {declared}, redeclared as {requested}")]
    VariableRedeclared {
        name: String,
        declared: ValueDomain,
        requested: ValueDomain,
    },

    #[error("variable '{name}' may only be used in the filter")]
    VariableOutsideFilter { name: String },

    #[error("range bound '{expr}' is not a parameter")]
    RangeNotParameter { expr: String },

    #[error("range bound '{expr}' is not numeric")]
    RangeNotNumeric { expr: String },

    #[error("grouped results may only project group-by expressions or aggregates, found '{expr}'")]
    UngroupedResult { expr: String },
}
