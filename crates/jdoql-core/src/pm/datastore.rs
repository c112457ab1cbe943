use crate::{
    error::{ErrorClass, ErrorOrigin, InternalError},
    model::ClassModel,
    pm::FetchPlan,
    value::{ObjectValue, Value, values_eq},
};
use std::{cell::RefCell, collections::BTreeMap};
use thiserror::Error as ThisError;

///
/// DatastoreError
///

#[derive(Debug, ThisError)]
pub enum DatastoreError {
    #[error("object '{class}[{id}]' has a null identity")]
    NullIdentity { class: String, id: Value },

    #[error("stale version for '{class}[{id}]': stored {stored}, given {given}")]
    StaleVersion {
        class: String,
        id: Value,
        stored: i64,
        given: i64,
    },
}

impl DatastoreError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::NullIdentity { .. } => ErrorClass::InvariantViolation,
            Self::StaleVersion { .. } => ErrorClass::Conflict,
        }
    }
}

impl From<DatastoreError> for InternalError {
    fn from(err: DatastoreError) -> Self {
        Self::new(err.class(), ErrorOrigin::Datastore, err.to_string())
    }
}

///
/// ExtentRequest
///
/// Everything a datastore may consult when producing a candidate extent.
/// Extensions are passed through untouched; a datastore ignores keys it does
/// not recognize.
///

#[derive(Clone, Copy, Debug)]
pub struct ExtentRequest<'a> {
    pub class: &'static ClassModel,
    pub include_subclasses: bool,
    pub ignore_cache: bool,
    pub fetch_plan: &'a FetchPlan,
    pub extensions: &'a BTreeMap<String, Value>,
}

impl ExtentRequest<'_> {
    /// Whether a stored object belongs to the requested extent.
    #[must_use]
    pub fn admits(&self, object: &ObjectValue) -> bool {
        if self.include_subclasses {
            object.is_instance_of(self.class.path)
        } else {
            object.class == self.class.path
        }
    }
}

///
/// Datastore
///
/// Storage seam behind a persistence manager.
///

pub trait Datastore {
    /// Snapshot of every stored object in the requested extent.
    fn extent(&self, request: &ExtentRequest<'_>) -> Result<Vec<ObjectValue>, InternalError>;

    /// Insert or replace an object, keyed by class and id.
    fn put(&self, object: ObjectValue) -> Result<(), InternalError>;

    /// Delete objects of exactly `class` by id; returns the number removed.
    fn delete(&self, class: &str, ids: &[Value]) -> Result<u64, InternalError>;
}

///
/// MemoryDatastore
///
/// Reference datastore keeping objects per concrete class in insertion
/// order. A new object keeps its version (1 when unset); every replacement
/// increments the stored version.
///

#[derive(Debug, Default)]
pub struct MemoryDatastore {
    classes: RefCell<BTreeMap<String, Vec<ObjectValue>>>,
}

impl MemoryDatastore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across every class.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.borrow().values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Datastore for MemoryDatastore {
    fn extent(&self, request: &ExtentRequest<'_>) -> Result<Vec<ObjectValue>, InternalError> {
        let classes = self.classes.borrow();
        let rows = classes
            .values()
            .flatten()
            .filter(|object| request.admits(object))
            .cloned()
            .collect();

        Ok(rows)
    }

    fn put(&self, mut object: ObjectValue) -> Result<(), InternalError> {
        if object.id.is_null() {
            return Err(DatastoreError::NullIdentity {
                class: object.class,
                id: object.id,
            }
            .into());
        }

        let mut classes = self.classes.borrow_mut();
        let rows = classes.entry(object.class.clone()).or_default();

        match rows.iter_mut().find(|row| values_eq(&row.id, &object.id)) {
            Some(stored) => {
                let current = stored.version.unwrap_or(0);
                if let Some(given) = object.version
                    && given < current
                {
                    return Err(DatastoreError::StaleVersion {
                        class: object.class,
                        id: object.id,
                        stored: current,
                        given,
                    }
                    .into());
                }
                object.version = Some(current.saturating_add(1));
                *stored = object;
            }
            None => {
                object.version = Some(object.version.unwrap_or(1));
                rows.push(object);
            }
        }

        Ok(())
    }

    fn delete(&self, class: &str, ids: &[Value]) -> Result<u64, InternalError> {
        let mut classes = self.classes.borrow_mut();
        let Some(rows) = classes.get_mut(class) else {
            return Ok(0);
        };

        let before = rows.len();
        rows.retain(|row| !ids.iter().any(|id| values_eq(&row.id, id)));
        let removed = before - rows.len();

        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }
}
