use super::*;
use crate::value::ValueDomain;

static BASE: ClassModel = ClassModel {
    path: "shop.Product",
    superclass: None,
    fields: &[
        FieldModel::new("name", ValueDomain::String),
        FieldModel::new("price", ValueDomain::Numeric),
    ],
};

static BOOK: ClassModel = ClassModel {
    path: "shop.Book",
    superclass: Some(&BASE),
    fields: &[FieldModel::new("isbn", ValueDomain::String)],
};

static EBOOK: ClassModel = ClassModel {
    path: "shop.EBook",
    superclass: Some(&BOOK),
    fields: &[],
};

#[test]
fn lineage_starts_at_self_and_walks_up() {
    let paths: Vec<_> = EBOOK.lineage().map(|m| m.path).collect();
    assert_eq!(paths, ["shop.EBook", "shop.Book", "shop.Product"]);
    assert_eq!(EBOOK.depth(), 2);
    assert_eq!(BASE.depth(), 0);
}

#[test]
fn subclass_check_is_inclusive() {
    assert!(BOOK.is_subclass_of(&BOOK));
    assert!(EBOOK.is_subclass_of(&BASE));
    assert!(!BASE.is_subclass_of(&BOOK));
}

#[test]
fn field_lookup_reaches_inherited_fields() {
    assert_eq!(
        EBOOK.field("price").map(|f| f.domain),
        Some(ValueDomain::Numeric)
    );
    assert!(EBOOK.field("isbn").is_some());
    assert!(BASE.field("isbn").is_none());
}

#[test]
fn simple_name_is_last_segment() {
    assert_eq!(EBOOK.simple_name(), "EBook");
}
