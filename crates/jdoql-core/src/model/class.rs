use crate::model::FieldModel;
use std::fmt;

///
/// ClassModel
/// Static, hand- or macro-written model of one persistable class.
///

pub struct ClassModel {
    /// Fully-qualified class path, also the extent key in the datastore.
    pub path: &'static str,
    pub superclass: Option<&'static Self>,
    /// Fields declared on this class only; inherited fields live on ancestors.
    pub fields: &'static [FieldModel],
}

impl ClassModel {
    /// Iterate this class followed by every ancestor, nearest first.
    #[must_use]
    pub const fn lineage(&self) -> Lineage<'_> {
        Lineage { next: Some(self) }
    }

    /// Number of ancestors above this class.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.lineage().count() - 1
    }

    /// Inclusive subclass check: a class is a subclass of itself.
    #[must_use]
    pub fn is_subclass_of(&self, other: &Self) -> bool {
        self.lineage().any(|m| m.path == other.path)
    }

    /// Resolve a field on this class or any ancestor.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.lineage()
            .flat_map(|m| m.fields.iter())
            .find(|f| f.name == name)
    }

    /// Last path segment, used for default aliases and diagnostics.
    #[must_use]
    pub fn simple_name(&self) -> &'static str {
        let path = self.path;
        path.rsplit(['.', ':']).next().unwrap_or(path)
    }
}

impl fmt::Debug for ClassModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassModel")
            .field("path", &self.path)
            .field("superclass", &self.superclass.map(|s| s.path))
            .field("fields", &self.fields)
            .finish()
    }
}

impl PartialEq for ClassModel {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ClassModel {}

///
/// Lineage
///

#[derive(Clone)]
pub struct Lineage<'a> {
    next: Option<&'a ClassModel>,
}

impl<'a> Iterator for Lineage<'a> {
    type Item = &'a ClassModel;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.superclass;
        Some(current)
    }
}
