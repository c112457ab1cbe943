use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use thiserror::Error as ThisError;

///
/// EvalError
///
/// Failures raised while evaluating an expression against stored objects.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EvalError {
    #[error("'{function}' is not supported by the in-memory evaluator")]
    Unsupported { function: String },

    #[error("'{op}' cannot be applied to {found}")]
    TypeMismatch { op: String, found: &'static str },

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow in '{op}'")]
    Overflow { op: &'static str },

    #[error("parameter '{name}' has no bound value")]
    UnboundParameter { name: String },

    #[error("variable '{name}' is not constrained by a contains() clause and has no candidate class")]
    UnconstrainedVariable { name: String },

    #[error("variable '{name}' is referenced before it is bound")]
    UnboundVariable { name: String },

    #[error("alias '{alias}' is not in scope")]
    UnknownAlias { alias: String },

    #[error("unique subquery '{alias}' produced {rows} values")]
    SubqueryNotUnique { alias: String, rows: usize },

    #[error("aggregate '{func}' used outside a grouped evaluation")]
    AggregateOutsideGroup { func: &'static str },

    #[error("{0}")]
    Internal(#[from] InternalError),
}

impl EvalError {
    pub(crate) fn mismatch(op: impl Into<String>, found: &crate::value::Value) -> Self {
        Self::TypeMismatch {
            op: op.into(),
            found: found.kind_label(),
        }
    }

    pub(crate) fn unsupported(function: impl Into<String>) -> Self {
        Self::Unsupported {
            function: function.into(),
        }
    }

    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::Unsupported { .. } => ErrorClass::Unsupported,
            _ => ErrorClass::InvariantViolation,
        }
    }
}

impl From<EvalError> for InternalError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::Internal(err) => err,
            other => Self::new(other.class(), ErrorOrigin::Expression, other.to_string()),
        }
    }
}
