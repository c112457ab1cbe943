use crate::value::ValueDomain;
use std::fmt;

///
/// FieldModel
/// Runtime field metadata used by validation and rendering.
///

pub struct FieldModel {
    /// Field name as used in filters and object snapshots.
    pub name: &'static str,
    pub domain: ValueDomain,
    /// Target class for persistable-valued fields.
    pub class: Option<&'static super::ClassModel>,
}

impl FieldModel {
    #[must_use]
    pub const fn new(name: &'static str, domain: ValueDomain) -> Self {
        Self {
            name,
            domain,
            class: None,
        }
    }

    /// Field that references another persistable class.
    #[must_use]
    pub const fn relation(name: &'static str, class: &'static super::ClassModel) -> Self {
        Self {
            name,
            domain: ValueDomain::Persistable,
            class: Some(class),
        }
    }
}

impl fmt::Debug for FieldModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Relations print the target path only; class graphs may be cyclic.
        f.debug_struct("FieldModel")
            .field("name", &self.name)
            .field("domain", &self.domain)
            .field("class", &self.class.map(|c| c.path))
            .finish()
    }
}
