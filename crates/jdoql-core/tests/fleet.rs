mod common;

use common::{
    Depot, QDepot, QTruck, QVehicle, Truck, Vehicle, fleet, plates, stock, vehicles,
};
use jdoql_core::{
    config::{ConfigError, JdoqlConfig},
    expr::{ComparableExpression, Expression},
    geospatial::{GeospatialHelper, SpatialExpression},
    obs::{ExecKind, MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink},
    pm::{MemoryDatastore, PersistenceManager},
    query::QueryError,
    traits::QueryClass,
    value::Value,
};
use serde_json::json;
use std::cell::RefCell;

//
// navigation
//

#[test]
fn filters_follow_relations() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    let depot = QDepot::from_persistable(v.depot());
    query
        .filter(depot.city().eq("Oslo"))
        .order_by([v.plate().asc()]);

    assert_eq!(
        plates(&query.execute_list().unwrap()),
        ["AB-1001", "AB-1002", "TR-9001", "TR-9002"]
    );
}

#[test]
fn results_carry_their_related_objects() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    query.exclude_subclasses();

    assert_eq!(query.execute_list().unwrap().into_rows(), vehicles());
}

#[test]
fn subclass_extents_and_casts() {
    let pm = fleet();

    let mut trucks = pm.new_query::<Truck>();
    let t = trucks.candidate_class::<QTruck>();
    trucks.filter(t.axles().gt(3));
    let heavy = trucks.execute_list().unwrap();
    assert_eq!(heavy.len(), 1);
    assert_eq!(heavy[0].vehicle.plate, "TR-9002");

    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    query
        .filter(v.instance_of::<Truck>())
        .order_by([v.plate().asc()]);
    assert_eq!(plates(&query.execute_list().unwrap()), ["TR-9001", "TR-9002"]);

    // a failed cast is null, so non-trucks never match
    query.filter(v.cast::<Truck>().field::<i64>("axles").gt(3));
    assert_eq!(plates(&query.execute_list().unwrap()), ["TR-9002"]);
}

//
// grouping
//

#[test]
fn grouped_projection_matches_the_snapshot() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    let city = QDepot::from_persistable(v.depot()).city();
    query.group_by(&[&city]).order_by([city.asc()]);

    let rows = query
        .execute_result_list(false, &[&city, &v.count(), &v.mileage().max()])
        .unwrap();
    assert_eq!(
        serde_json::to_value(rows.into_rows()).unwrap(),
        json!([
            ["Null", { "Int": 1 }, { "Float": 5000.0 }],
            [{ "Text": "Bergen" }, { "Int": 2 }, { "Float": 88000.0 }],
            [{ "Text": "Oslo" }, { "Int": 4 }, { "Float": 150000.0 }],
        ])
    );
}

#[test]
fn having_filters_groups() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    query
        .group_by(&[&v.kind()])
        .having(v.kind().count().gt(2));

    let rows = query
        .execute_result_list_as::<(String, i64)>(false, &[&v.kind(), &v.capacity().sum()])
        .unwrap();
    assert_eq!(rows.into_rows(), [("van".to_string(), 2800)]);
}

//
// variables and subqueries
//

#[test]
fn contains_binds_a_variable() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    let tag = query.variable::<String>("t");
    query
        .filter(v.tags().contains(&tag).and(tag.starts_with("elec")))
        .order_by([v.plate().asc()]);

    assert_eq!(plates(&query.execute_list().unwrap()), ["CD-2002", "EF-3001"]);
}

#[test]
fn class_variable_ranges_over_an_extent() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    let d = QDepot::from_persistable(query.variable::<Depot>("d"));
    query
        .filter(v.depot().eq(d.persistable()).and(d.name().eq("West")))
        .order_by([v.plate().asc()]);

    assert!(query.to_string().contains("VARIABLES fleet.Depot d"));
    assert_eq!(plates(&query.execute_list().unwrap()), ["CD-2001", "EF-3001"]);
}

#[test]
fn correlated_subquery_compares_within_a_kind() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    let mut sub = query.subquery("s");
    let s = sub.candidate_class::<QVehicle>();
    sub.filter(s.kind().eq(&v.kind()));
    let kind_average = sub.select_unique_numeric(&s.mileage().avg());
    query
        .filter(v.mileage().gt(&kind_average))
        .order_by([v.plate().asc()]);

    assert_eq!(
        plates(&query.execute_list().unwrap()),
        ["AB-1001", "CD-2001", "EF-3001", "TR-9001"]
    );
}

//
// deletion
//

#[test]
fn delete_removes_only_selected_objects() {
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    query.filter(v.kind().eq("van").and(v.mileage().lt(50_000.0)));

    assert_eq!(query.delete_persistent_all().unwrap(), 2);
    assert!(query.execute_list().unwrap().is_empty());
    assert_eq!(pm.new_query::<Vehicle>().execute_list().unwrap().len(), 5);
    assert_eq!(pm.new_query::<Depot>().execute_list().unwrap().len(), 3);
}

//
// geospatial fields
//

#[test]
fn geometry_fields_answer_header_accessors() {
    let pm = fleet();
    let mut query = pm.new_query::<Depot>();
    let d = query.candidate_class::<QDepot>();
    query
        .filter(d.location().srid().eq(4326))
        .order_by([d.name().asc()]);

    let rows = query
        .execute_result_list(false, &[&d.name(), &d.location().geometry_type()])
        .unwrap();
    assert_eq!(
        rows.into_rows(),
        [
            vec![Value::from("North"), Value::from("Point")],
            vec![Value::from("West"), Value::from("Point")],
        ]
    );
}

#[test]
fn topological_filters_report_unsupported() {
    let pm = fleet();
    let mut query = pm.new_query::<Depot>();
    let d = query.candidate_class::<QDepot>();
    let area = GeospatialHelper.polygon_from_text("POLYGON((0 50, 20 50, 20 70, 0 50))", 4326);
    query.filter(d.location().within(&area));

    assert!(matches!(query.execute_list(), Err(QueryError::Eval(_))));
}

//
// configuration
//

#[test]
fn configuration_file_sets_query_defaults() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/jdoql.toml");
    let config = JdoqlConfig::from_path(path).unwrap();
    let pm = PersistenceManager::with_config(MemoryDatastore::new(), config);
    stock(&pm);

    let query = pm.new_query::<Vehicle>();
    assert_eq!(query.fetch_plan().max_fetch_depth(), 2);
    assert_eq!(query.fetch_plan().fetch_size(), 50);
    assert!(query.fetch_plan().has_group("fleet"));
    // trucks are excluded by default
    assert_eq!(query.execute_list().unwrap().len(), 5);
}

#[test]
fn invalid_configuration_is_rejected() {
    assert!(matches!(
        JdoqlConfig::from_toml_str("[fetch]\nmax_fetch_depth = 0\n"),
        Err(ConfigError::Invalid { key: "fetch.max_fetch_depth", .. })
    ));
    assert!(matches!(
        JdoqlConfig::from_toml_str("[query]\ncache = true\n"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        JdoqlConfig::from_path("missing/jdoql.toml"),
        Err(ConfigError::Io { .. })
    ));
}

//
// metrics
//

#[derive(Default)]
struct CapturingSink {
    events: RefCell<Vec<MetricsEvent>>,
}

impl MetricsSink for CapturingSink {
    fn record(&self, event: MetricsEvent) {
        self.events.borrow_mut().push(event);
    }
}

#[test]
fn executions_emit_metrics_events() {
    let pm = fleet();
    let sink = CapturingSink::default();

    let rows = with_metrics_sink(&sink, || pm.new_query::<Vehicle>().execute_list().unwrap());
    assert_eq!(rows.len(), 7);

    let events = sink.events.into_inner();
    assert_eq!(
        events.first(),
        Some(&MetricsEvent::ExecStart {
            kind: ExecKind::List,
            class_path: "fleet.Vehicle",
        })
    );
    assert!(events.contains(&MetricsEvent::RowsScanned {
        class_path: "fleet.Vehicle",
        rows_scanned: 7,
    }));
    assert!(matches!(
        events.last(),
        Some(MetricsEvent::ExecFinish {
            kind: ExecKind::List,
            rows: 7,
            ..
        })
    ));
}

#[test]
fn global_counters_summarize_per_class() {
    metrics_reset_all();
    let pm = fleet();
    let mut query = pm.new_query::<Vehicle>();
    let v = query.candidate_class::<QVehicle>();
    let kind = query.string_parameter("kind");
    query.filter(v.kind().eq(&kind)).set_parameter(&kind, "van");
    query.execute_list().unwrap();
    query.execute_unique().unwrap_err();

    let report = metrics_report(None);
    let counters = report.counters.unwrap();
    assert_eq!(counters.ops.list_calls, 1);
    assert_eq!(counters.ops.unique_calls, 1);
    // the unique call still counts the rows it rejected
    assert_eq!(counters.ops.rows_returned, 6);
    assert_eq!(counters.ops.parameters_bound, 1);

    let vehicle = &report.class_counters[0];
    assert_eq!(vehicle.path, "fleet.Vehicle");
    assert_eq!(vehicle.calls, 2);
    assert_eq!(vehicle.rows_scanned, 14);
}
