use super::*;
use crate::test_fixtures::{BOOK, Book, PRODUCT, Product, books, products};

impl AttachCallback for Product {
    fn pre_attach(&mut self) {
        self.tags.push("interface".to_string());
    }
}

fn mark(tags: &mut Vec<String>, tag: &str) {
    tags.push(tag.to_string());
}

fn first(p: &mut Product) {
    mark(&mut p.tags, "first");
}

fn second(p: &mut Product) {
    mark(&mut p.tags, "second");
}

fn late(p: &mut Product) {
    mark(&mut p.tags, "late");
}

fn base_hook(b: &mut Book) {
    mark(&mut b.product.tags, "base");
}

fn book_hook(b: &mut Book) {
    mark(&mut b.product.tags, "book");
}

fn lamp() -> Product {
    products().remove(4)
}

fn dispatched(registry: &CallbackRegistry<Product>) -> Vec<String> {
    let mut target = lamp();
    registry.dispatch(&mut target);

    target.tags
}

fn ordered_names<T: crate::traits::Persistable>(registry: &CallbackRegistry<T>) -> Vec<&'static str> {
    registry.ordered().iter().map(|entry| entry.name).collect()
}

//
// ordering
//

#[test]
fn interface_method_runs_before_annotated_methods() {
    let mut registry = CallbackRegistry::<Product>::new();
    registry
        .annotated(&PRODUCT, PreAttach::new(1), "first", first)
        .unwrap();
    registry.register_interface();

    assert_eq!(ordered_names(&registry), ["pre_attach", "first"]);
    assert_eq!(dispatched(&registry), ["interface", "first"]);
}

#[test]
fn equal_orders_keep_declaration_order() {
    let mut registry = CallbackRegistry::<Product>::new();
    registry
        .annotated(&PRODUCT, PreAttach::new(5), "second", second)
        .unwrap()
        .annotated(&PRODUCT, PreAttach::new(5), "first", first)
        .unwrap();

    assert_eq!(dispatched(&registry), ["second", "first"]);
    // repeated dispatch is stable
    assert_eq!(dispatched(&registry), ["second", "first"]);
}

#[test]
fn lower_order_runs_first_and_undefined_runs_last() {
    let mut registry = CallbackRegistry::<Product>::new();
    registry
        .annotated(&PRODUCT, PreAttach::default(), "late", late)
        .unwrap()
        .annotated(&PRODUCT, PreAttach::new(10), "second", second)
        .unwrap()
        .annotated(&PRODUCT, PreAttach::new(-2), "first", first)
        .unwrap();

    assert_eq!(dispatched(&registry), ["first", "second", "late"]);
}

#[test]
fn subclass_method_runs_before_superclass_method_of_equal_order() {
    let mut registry = CallbackRegistry::<Book>::new();
    registry
        .annotated(&PRODUCT, PreAttach::new(3), "base_hook", base_hook)
        .unwrap()
        .annotated(&BOOK, PreAttach::new(3), "book_hook", book_hook)
        .unwrap();

    assert_eq!(ordered_names(&registry), ["book_hook", "base_hook"]);

    let mut book = books().remove(1);
    book.product.tags.clear();
    assert_eq!(registry.dispatch(&mut book), 2);
    assert_eq!(book.product.tags, ["book", "base"]);
}

#[test]
fn order_outranks_class_depth() {
    let mut registry = CallbackRegistry::<Book>::new();
    registry
        .annotated(&BOOK, PreAttach::new(4), "book_hook", book_hook)
        .unwrap()
        .annotated(&PRODUCT, PreAttach::new(3), "base_hook", base_hook)
        .unwrap();

    assert_eq!(ordered_names(&registry), ["base_hook", "book_hook"]);
}

//
// registration
//

#[test]
fn annotation_on_the_interface_method_is_ignored() {
    let mut registry = CallbackRegistry::<Product>::new();
    registry
        .annotated(&PRODUCT, PreAttach::new(9), "pre_attach", late)
        .unwrap();
    registry.register_interface();
    registry
        .annotated(&PRODUCT, PreAttach::new(1), "pre_attach", late)
        .unwrap();

    assert_eq!(registry.len(), 1);
    assert!(registry.has_interface());
    assert_eq!(dispatched(&registry), ["interface"]);
}

#[test]
fn interface_registers_once() {
    let mut registry = CallbackRegistry::<Product>::new();
    registry.register_interface().register_interface();

    assert_eq!(registry.len(), 1);
}

#[test]
fn declaring_class_must_be_in_the_lineage() {
    let mut registry = CallbackRegistry::<Product>::new();
    let err = registry
        .annotated(&BOOK, PreAttach::new(1), "first", first)
        .unwrap_err();

    assert_eq!(
        err,
        CallbackError::ForeignDeclaringClass {
            method: "first",
            declaring: "shop.Book",
            class: "shop.Product",
        }
    );
    assert!(registry.is_empty());
}

#[test]
fn duplicate_registration_is_rejected() {
    let mut registry = CallbackRegistry::<Product>::new();
    registry
        .annotated(&PRODUCT, PreAttach::new(1), "first", first)
        .unwrap();
    let err = registry
        .annotated(&PRODUCT, PreAttach::new(2), "first", second)
        .unwrap_err();

    assert_eq!(
        err,
        CallbackError::Duplicate {
            method: "first",
            declaring: "shop.Product",
        }
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn undefined_order_is_the_default() {
    assert_eq!(PreAttach::default().order, CallbackOrder::UNDEFINED);
    assert!(!CallbackOrder::UNDEFINED.is_defined());
    assert_eq!(CallbackOrder::UNDEFINED.to_string(), "undefined");
    assert_eq!(CallbackOrder(7).to_string(), "7");
}
