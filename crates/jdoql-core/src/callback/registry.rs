use crate::{
    callback::{AttachCallback, CallbackError, PreAttach},
    model::ClassModel,
    traits::Persistable,
};
use std::{cmp::Reverse, fmt};

///
/// CallbackKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallbackKind {
    /// Implementation of `AttachCallback`; always dispatched first.
    Interface,
    Annotated(PreAttach),
}

///
/// CallbackEntry
///

pub struct CallbackEntry<T> {
    pub name: &'static str,
    pub declaring: &'static ClassModel,
    pub kind: CallbackKind,
    index: usize,
    call: fn(&mut T),
}

impl<T> CallbackEntry<T> {
    // Interface methods, then (order asc, declaring depth desc, declaration order).
    fn dispatch_key(&self) -> (bool, i32, Reverse<usize>, usize) {
        match self.kind {
            CallbackKind::Interface => (false, i32::MIN, Reverse(0), self.index),
            CallbackKind::Annotated(meta) => (
                true,
                meta.order.0,
                Reverse(self.declaring.depth()),
                self.index,
            ),
        }
    }
}

impl<T> Clone for CallbackEntry<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            declaring: self.declaring,
            kind: self.kind,
            index: self.index,
            call: self.call,
        }
    }
}

impl<T> fmt::Debug for CallbackEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackEntry")
            .field("name", &self.name)
            .field("declaring", &self.declaring.path)
            .field("kind", &self.kind)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

///
/// CallbackRegistry
///
/// Pre-attach callbacks of one persistable class, including methods
/// inherited from its superclasses.
///

pub struct CallbackRegistry<T> {
    entries: Vec<CallbackEntry<T>>,
    next_index: usize,
}

impl<T: Persistable> CallbackRegistry<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_index: 0,
        }
    }

    /// Register `T`'s `AttachCallback` implementation.
    ///
    /// An annotated registration of the same method is dropped: the
    /// interface method ignores its annotation.
    pub fn register_interface(&mut self) -> &mut Self
    where
        T: AttachCallback,
    {
        if self.has_interface() {
            return self;
        }

        self.entries.retain(|entry| entry.name != T::METHOD);
        self.push(
            T::METHOD,
            T::MODEL,
            CallbackKind::Interface,
            <T as AttachCallback>::pre_attach,
        );

        self
    }

    /// Register an annotated method declared on `declaring`, which must be
    /// `T`'s class or one of its superclasses.
    pub fn annotated(
        &mut self,
        declaring: &'static ClassModel,
        meta: PreAttach,
        name: &'static str,
        call: fn(&mut T),
    ) -> Result<&mut Self, CallbackError> {
        if !T::MODEL.is_subclass_of(declaring) {
            return Err(CallbackError::ForeignDeclaringClass {
                method: name,
                declaring: declaring.path,
                class: T::MODEL.path,
            });
        }

        let interface_method = self
            .entries
            .iter()
            .any(|entry| entry.kind == CallbackKind::Interface && entry.name == name);
        if interface_method {
            return Ok(self);
        }

        let duplicate = self
            .entries
            .iter()
            .any(|entry| entry.name == name && entry.declaring == declaring);
        if duplicate {
            return Err(CallbackError::Duplicate {
                method: name,
                declaring: declaring.path,
            });
        }

        self.push(name, declaring, CallbackKind::Annotated(meta), call);

        Ok(self)
    }

    /// Entries in dispatch order.
    #[must_use]
    pub fn ordered(&self) -> Vec<&CallbackEntry<T>> {
        let mut ordered: Vec<_> = self.entries.iter().collect();
        ordered.sort_by_key(|entry| entry.dispatch_key());

        ordered
    }

    /// Run every callback against `target` in dispatch order.
    pub fn dispatch(&self, target: &mut T) -> usize {
        let ordered = self.ordered();
        for entry in &ordered {
            (entry.call)(target);
        }

        ordered.len()
    }

    #[must_use]
    pub fn has_interface(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.kind == CallbackKind::Interface)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(
        &mut self,
        name: &'static str,
        declaring: &'static ClassModel,
        kind: CallbackKind,
        call: fn(&mut T),
    ) {
        self.entries.push(CallbackEntry {
            name,
            declaring,
            kind,
            index: self.next_index,
            call,
        });
        self.next_index += 1;
    }
}

impl<T: Persistable> Default for CallbackRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CallbackRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}
