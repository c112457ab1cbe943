//! Persistence manager: the factory for queries and the owner of the
//! datastore, configuration, fetch plan and lifecycle callbacks.

mod datastore;
mod fetch;

#[cfg(test)]
mod tests;

use crate::{
    callback::CallbackRegistry,
    config::JdoqlConfig,
    error::InternalError,
    query::TypedQuery,
    traits::Persistable,
    value::{Value, values_eq},
};
use std::{any::Any, collections::BTreeMap, fmt};

// re-exports
pub use datastore::{Datastore, DatastoreError, ExtentRequest, MemoryDatastore};
pub use fetch::FetchPlan;

///
/// PersistenceManager
///
/// Creates queries over one datastore. Queries borrow the manager and copy
/// its fetch plan and query defaults when they are created.
///

pub struct PersistenceManager {
    datastore: Box<dyn Datastore>,
    config: JdoqlConfig,
    fetch_plan: FetchPlan,
    callbacks: BTreeMap<&'static str, Box<dyn Any>>,
}

impl PersistenceManager {
    #[must_use]
    pub fn new(datastore: impl Datastore + 'static) -> Self {
        Self::with_config(datastore, JdoqlConfig::default())
    }

    #[must_use]
    pub fn with_config(datastore: impl Datastore + 'static, config: JdoqlConfig) -> Self {
        Self {
            datastore: Box::new(datastore),
            fetch_plan: FetchPlan::from_config(&config.fetch),
            config,
            callbacks: BTreeMap::new(),
        }
    }

    /// Manager over an empty `MemoryDatastore`.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryDatastore::new())
    }

    /// New query over candidates of `T`.
    #[must_use]
    pub fn new_query<T: Persistable>(&self) -> TypedQuery<'_, T> {
        TypedQuery::new(self)
    }

    #[must_use]
    pub fn datastore(&self) -> &dyn Datastore {
        self.datastore.as_ref()
    }

    #[must_use]
    pub const fn config(&self) -> &JdoqlConfig {
        &self.config
    }

    /// Plan copied into every query created after this point.
    #[must_use]
    pub const fn fetch_plan(&self) -> &FetchPlan {
        &self.fetch_plan
    }

    pub const fn fetch_plan_mut(&mut self) -> &mut FetchPlan {
        &mut self.fetch_plan
    }

    // ------------------------------------------------------------------
    // Objects
    // ------------------------------------------------------------------

    /// Store `object` without running callbacks.
    pub fn make_persistent<T: Persistable>(&self, object: &T) -> Result<(), InternalError> {
        self.datastore.put(object.to_object())
    }

    pub fn make_persistent_all<'a, T: Persistable>(
        &self,
        objects: impl IntoIterator<Item = &'a T>,
    ) -> Result<(), InternalError> {
        for object in objects {
            self.make_persistent(object)?;
        }

        Ok(())
    }

    /// Run `T`'s pre-attach callbacks on `object`, then store it.
    pub fn attach<T: Persistable>(&self, object: &mut T) -> Result<(), InternalError> {
        if let Some(registry) = self.callbacks::<T>() {
            let dispatched = registry.dispatch(object);
            if self.config.query.debug {
                log::debug!("[jdoql] {dispatched} pre-attach callback(s) on {}", T::MODEL.path);
            }
        }

        self.datastore.put(object.to_object())
    }

    /// Stored instance of exactly `T` with the given id.
    pub fn object_by_id<T: Persistable>(
        &self,
        id: impl Into<Value>,
    ) -> Result<Option<T>, InternalError> {
        let id = id.into();
        let extensions = BTreeMap::new();
        let request = ExtentRequest {
            class: T::MODEL,
            include_subclasses: false,
            ignore_cache: false,
            fetch_plan: &self.fetch_plan,
            extensions: &extensions,
        };

        self.datastore
            .extent(&request)?
            .iter()
            .find(|object| values_eq(&object.id, &id))
            .map(T::from_object)
            .transpose()
    }

    // ------------------------------------------------------------------
    // Callbacks
    // ------------------------------------------------------------------

    /// Install the callback registry for `T`, replacing any earlier one.
    pub fn register_callbacks<T: Persistable>(&mut self, registry: CallbackRegistry<T>) {
        self.callbacks.insert(T::MODEL.path, Box::new(registry));
    }

    #[must_use]
    pub fn callbacks<T: Persistable>(&self) -> Option<&CallbackRegistry<T>> {
        self.callbacks
            .get(T::MODEL.path)
            .and_then(|registry| registry.downcast_ref::<CallbackRegistry<T>>())
    }
}

impl fmt::Debug for PersistenceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistenceManager")
            .field("config", &self.config)
            .field("fetch_plan", &self.fetch_plan)
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
