use super::*;
use crate::{
    callback::{CallbackRegistry, PreAttach},
    config::{ConfigError, JdoqlConfig},
    error::{ErrorClass, ErrorOrigin},
    test_fixtures::{BOOK, Book, PRODUCT, Product, catalog, products},
    value::ObjectValue,
};

fn stamp(p: &mut Product) {
    p.tags.push("attached".to_string());
}

fn stored(pm: &PersistenceManager, class: &'static crate::model::ClassModel) -> Vec<ObjectValue> {
    let extensions = BTreeMap::new();
    let request = ExtentRequest {
        class,
        include_subclasses: false,
        ignore_cache: false,
        fetch_plan: pm.fetch_plan(),
        extensions: &extensions,
    };

    pm.datastore().extent(&request).unwrap()
}

//
// objects
//

#[test]
fn object_by_id_reads_back_the_stored_instance() {
    let pm = catalog();

    let desk = pm.object_by_id::<Product>(3).unwrap().unwrap();
    assert_eq!(desk, products().remove(2));
    assert!(pm.object_by_id::<Product>(99).unwrap().is_none());
}

#[test]
fn object_by_id_matches_the_exact_class_only() {
    let pm = catalog();

    assert!(pm.object_by_id::<Product>(10).unwrap().is_none());
    let book = pm.object_by_id::<Book>(10).unwrap().unwrap();
    assert_eq!(book.author, "McNamara");
}

#[test]
fn attach_runs_registered_callbacks_before_storing() {
    let mut pm = PersistenceManager::in_memory();
    let mut registry = CallbackRegistry::<Product>::new();
    registry
        .annotated(&PRODUCT, PreAttach::new(1), "stamp", stamp)
        .unwrap();
    pm.register_callbacks(registry);

    let mut lamp = products().remove(4);
    pm.attach(&mut lamp).unwrap();
    assert_eq!(lamp.tags, ["attached"]);

    let stored = pm.object_by_id::<Product>(5).unwrap().unwrap();
    assert_eq!(stored.tags, ["attached"]);
}

#[test]
fn attach_without_callbacks_only_stores() {
    let pm = PersistenceManager::in_memory();
    let mut desk = products().remove(2);

    pm.attach(&mut desk).unwrap();
    assert_eq!(desk.tags, ["office", "furniture"]);
    assert_eq!(pm.object_by_id::<Product>(3).unwrap(), Some(desk));
}

#[test]
fn callbacks_are_looked_up_per_class() {
    let mut pm = PersistenceManager::in_memory();
    pm.register_callbacks(CallbackRegistry::<Product>::new());

    assert!(pm.callbacks::<Product>().is_some());
    assert!(pm.callbacks::<Book>().is_none());
}

//
// datastore
//

#[test]
fn replacing_an_object_increments_its_version() {
    let pm = catalog();
    let laptop = products().remove(0);

    assert_eq!(stored(&pm, &PRODUCT)[0].version, Some(1));
    pm.make_persistent(&laptop).unwrap();
    pm.make_persistent(&laptop).unwrap();
    assert_eq!(stored(&pm, &PRODUCT)[0].version, Some(3));
}

#[test]
fn stale_versions_are_rejected() {
    let pm = catalog();
    let laptop = products().remove(0);
    pm.make_persistent(&laptop).unwrap();

    let err = pm
        .datastore()
        .put(laptop.to_object().with_version(1))
        .unwrap_err();
    assert_eq!(err.class, ErrorClass::Conflict);
    assert_eq!(err.origin, ErrorOrigin::Datastore);

    // the current version is accepted
    pm.datastore()
        .put(laptop.to_object().with_version(2))
        .unwrap();
    assert_eq!(stored(&pm, &PRODUCT)[0].version, Some(3));
}

#[test]
fn null_identity_is_an_invariant_violation() {
    let pm = PersistenceManager::in_memory();
    let err = pm
        .datastore()
        .put(ObjectValue::new(&BOOK, Value::Null))
        .unwrap_err();

    assert_eq!(err.class, ErrorClass::InvariantViolation);
}

#[test]
fn memory_datastore_deletes_by_exact_class() {
    let store = MemoryDatastore::new();
    for product in products() {
        store.put(product.to_object()).unwrap();
    }
    assert_eq!(store.len(), 5);

    assert_eq!(store.delete("shop.Book", &[Value::Int(1)]).unwrap(), 0);
    assert_eq!(
        store
            .delete("shop.Product", &[Value::Int(1), Value::Int(2), Value::Int(42)])
            .unwrap(),
        2
    );
    assert_eq!(store.len(), 3);
}

//
// fetch plan
//

#[test]
fn queries_copy_the_manager_fetch_plan() {
    let mut pm = catalog();
    pm.fetch_plan_mut().add_group("detail");

    let mut query = pm.new_query::<Product>();
    assert!(query.fetch_plan().has_group("detail"));

    query.fetch_plan_mut().add_group("extra").remove_group("detail");
    assert!(!query.fetch_plan().has_group("detail"));
    assert!(pm.fetch_plan().has_group("detail"));
    assert!(!pm.fetch_plan().has_group("extra"));
}

#[test]
fn fetch_plan_groups_are_a_set() {
    let mut plan = FetchPlan::default();
    assert_eq!(plan.groups(), [FetchPlan::DEFAULT_GROUP]);

    plan.add_group(FetchPlan::ALL_GROUP).add_group(FetchPlan::ALL_GROUP);
    assert_eq!(plan.groups(), ["default", "all"]);

    plan.set_groups(["a", "b", "a"]);
    assert_eq!(plan.groups(), ["a", "b"]);

    plan.clear_groups();
    assert!(plan.groups().is_empty());
}

#[test]
fn fetch_depth_zero_is_rejected() {
    let mut plan = FetchPlan::default();

    assert!(matches!(
        plan.set_max_fetch_depth(0),
        Err(ConfigError::Invalid { .. })
    ));
    assert!(plan.set_max_fetch_depth(-2).is_err());
    assert_eq!(plan.max_fetch_depth(), 1);

    plan.set_max_fetch_depth(FetchPlan::UNLIMITED_DEPTH).unwrap();
    assert_eq!(plan.max_fetch_depth(), -1);
}

#[test]
fn fetch_size_accepts_greedy_and_optimal() {
    let mut plan = FetchPlan::default();

    plan.set_fetch_size(FetchPlan::FETCH_SIZE_GREEDY).unwrap();
    assert_eq!(plan.fetch_size(), -1);
    plan.set_fetch_size(FetchPlan::FETCH_SIZE_OPTIMAL).unwrap();
    assert_eq!(plan.fetch_size(), 0);
    assert!(plan.set_fetch_size(-3).is_err());
}

//
// configuration
//

#[test]
fn config_defaults_reach_new_queries() {
    let config = JdoqlConfig::from_toml_str(
        r#"
        [query]
        include_subclasses = false
        ignore_cache = true

        [fetch]
        max_fetch_depth = 3
        groups = ["default", "detail"]
        "#,
    )
    .unwrap();
    let pm = PersistenceManager::with_config(MemoryDatastore::new(), config);
    pm.make_persistent_all(&products()).unwrap();

    let query = pm.new_query::<Product>();
    assert!(!query.state().include_subclasses);
    assert!(query.ignore_cache());
    assert_eq!(query.fetch_plan().max_fetch_depth(), 3);
    assert!(query.fetch_plan().has_group("detail"));
    assert_eq!(query.execute_list().unwrap().len(), 5);
}
