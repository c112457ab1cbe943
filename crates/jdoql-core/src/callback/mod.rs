//! Lifecycle callback metadata and dispatch ordering.

mod registry;

#[cfg(test)]
mod tests;

use crate::error::{ErrorClass, ErrorOrigin, InternalError};
use std::fmt;
use thiserror::Error as ThisError;

// re-exports
pub use registry::{CallbackEntry, CallbackKind, CallbackRegistry};

///
/// CallbackOrder
///
/// Relative precedence of an annotated callback method; lower runs first.
/// `UNDEFINED` (the default) runs after every method with a defined order.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CallbackOrder(pub i32);

impl CallbackOrder {
    pub const UNDEFINED: Self = Self(i32::MAX);

    #[must_use]
    pub const fn is_defined(self) -> bool {
        self.0 != i32::MAX
    }
}

impl Default for CallbackOrder {
    fn default() -> Self {
        Self::UNDEFINED
    }
}

impl fmt::Display for CallbackOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_defined() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("undefined")
        }
    }
}

///
/// PreAttach
/// Marks a method to run before an instance is attached.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PreAttach {
    pub order: CallbackOrder,
}

impl PreAttach {
    #[must_use]
    pub const fn new(order: i32) -> Self {
        Self {
            order: CallbackOrder(order),
        }
    }
}

///
/// AttachCallback
///
/// Interface form of the pre-attach callback. Its implementation always
/// runs before annotated methods.
///

pub trait AttachCallback {
    /// Registration name of the interface method.
    const METHOD: &'static str = "pre_attach";

    fn pre_attach(&mut self);
}

///
/// CallbackError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum CallbackError {
    #[error("callback '{method}' is declared on '{declaring}', which is not '{class}' or one of its superclasses")]
    ForeignDeclaringClass {
        method: &'static str,
        declaring: &'static str,
        class: &'static str,
    },

    #[error("callback '{method}' is already registered for '{declaring}'")]
    Duplicate {
        method: &'static str,
        declaring: &'static str,
    },
}

impl From<CallbackError> for InternalError {
    fn from(err: CallbackError) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Callback,
            err.to_string(),
        )
    }
}
