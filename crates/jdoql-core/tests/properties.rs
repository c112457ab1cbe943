mod common;

use common::{QVehicle, TRUCK, Truck, VEHICLE, Vehicle, fleet, plates, trucks};
use jdoql_core::{
    callback::{CallbackRegistry, PreAttach},
    expr::{AnyExpression, ComparableExpression, Expression},
    query::QueryError,
    value::Value,
};
use std::collections::BTreeMap;

//
// parameters
//

#[test]
fn cleared_parameters_are_unbound_on_the_next_execution() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    let kind = query.string_parameter("kind");
    query.filter(v.kind().eq(&kind)).set_parameter(&kind, "car");
    assert_eq!(plates(&query.execute_list().unwrap()), ["CD-2001", "CD-2002"]);

    query.clear_parameters();
    assert_eq!(
        query.execute_list().unwrap_err(),
        QueryError::UnboundParameter {
            name: "kind".to_string(),
        }
    );
}

//
// if-then-else
//

#[test]
fn first_matching_branch_wins() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    let band = query
        .if_then::<String>(v.mileage().gt(50_000.0), "high")
        .if_then(v.mileage().gt(10_000.0), "medium")
        .else_end("low")
        .else_end("new")
        .value();
    query.exclude_subclasses().order_by([v.plate().asc()]);

    let bands = query.execute_result_list_single(false, &band).unwrap();
    assert_eq!(
        bands.into_rows(),
        ["medium", "medium", "high", "new", "high"].map(Value::from)
    );
}

//
// range
//

#[test]
fn range_selects_a_half_open_window() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    query.order_by([v.plate().asc()]);

    let all = query.execute_list().unwrap();
    assert_eq!(all.len(), 7);

    query.range(5, 10);
    assert_eq!(plates(&query.execute_list().unwrap()), ["TR-9001", "TR-9002"]);

    query.range(2, 4);
    assert_eq!(plates(&query.execute_list().unwrap()), ["CD-2001", "CD-2002"]);

    query.range(0, 0);
    assert!(query.execute_list().unwrap().is_empty());

    query.range(4, 2);
    assert_eq!(
        query.execute_list().unwrap_err(),
        QueryError::InvalidRange { from: 4, to: 2 }
    );
}

//
// unique results
//

#[test]
fn unique_result_cardinality() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    let (plate, kind) = (v.plate(), v.kind());
    let exprs: [&dyn AnyExpression; 2] = [&plate, &kind];

    query.filter(v.kind().eq("car"));
    assert_eq!(
        query.execute_result_unique(false, &exprs).unwrap_err(),
        QueryError::NotUnique { rows: 2 }
    );

    query.filter(v.kind().eq("bus"));
    assert_eq!(query.execute_result_unique(false, &exprs).unwrap(), None);

    query.filter(v.plate().eq("EF-3001"));
    assert_eq!(
        query.execute_result_unique(false, &exprs).unwrap(),
        Some(vec![Value::from("EF-3001"), Value::from("van")])
    );
}

//
// extensions
//

#[test]
fn cleared_extensions_hold_only_later_additions() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    query
        .add_extension("datanucleus.query.flushBeforeExecution", true)
        .add_extension("timeout", 30);

    query.set_extensions(None).add_extension("k", "v");
    assert_eq!(
        query.extensions(),
        &BTreeMap::from([("k".to_string(), Value::from("v"))])
    );
}

//
// callbacks
//

fn mark(truck: &mut Truck, tag: &str) {
    truck.vehicle.tags.push(tag.to_string());
}

fn audit(truck: &mut Truck) {
    mark(truck, "audit");
}

fn weigh(truck: &mut Truck) {
    mark(truck, "weigh");
}

fn inspect(truck: &mut Truck) {
    mark(truck, "inspect");
}

fn service(truck: &mut Truck) {
    mark(truck, "service");
}

#[test]
fn callbacks_of_equal_order_run_in_a_stable_order() {
    let mut registry = CallbackRegistry::<Truck>::new();
    registry
        .annotated(&TRUCK, PreAttach::new(5), "weigh", weigh)
        .unwrap()
        .annotated(&TRUCK, PreAttach::new(5), "audit", audit)
        .unwrap();

    for _ in 0..3 {
        let mut truck = trucks().remove(0);
        truck.vehicle.tags.clear();
        registry.dispatch(&mut truck);
        assert_eq!(truck.vehicle.tags, ["weigh", "audit"]);
    }
}

#[test]
fn subclass_callback_runs_before_superclass_callback_of_equal_order() {
    let mut pm = fleet();
    let mut registry = CallbackRegistry::<Truck>::new();
    registry
        .annotated(&VEHICLE, PreAttach::new(3), "service", service)
        .unwrap()
        .annotated(&TRUCK, PreAttach::new(3), "inspect", inspect)
        .unwrap();
    pm.register_callbacks(registry);

    let mut truck = trucks().remove(1);
    truck.vehicle.tags.clear();
    pm.attach(&mut truck).unwrap();
    assert_eq!(truck.vehicle.tags, ["inspect", "service"]);

    let stored = pm.object_by_id::<Truck>(11).unwrap().unwrap();
    assert_eq!(stored.vehicle.tags, ["inspect", "service"]);
}
