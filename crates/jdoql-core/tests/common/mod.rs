//! Fleet catalog shared by the integration tests: depots with a location,
//! vehicles stationed at a depot, and trucks as a vehicle subclass. Rows are
//! loaded from `fixtures/fleet.json`.

#![allow(dead_code)]

use chrono::NaiveDate;
use jdoql_core::{
    error::InternalError,
    model::{ClassModel, FieldModel},
    pm::PersistenceManager,
    traits::Persistable,
    value::{GeometryValue, ObjectValue, Value, ValueDomain},
};
use serde::Deserialize;

pub static DEPOT: ClassModel = ClassModel {
    path: "fleet.Depot",
    superclass: None,
    fields: &[
        FieldModel::new("name", ValueDomain::String),
        FieldModel::new("city", ValueDomain::String),
        FieldModel::new("location", ValueDomain::Geometry),
    ],
};

pub static VEHICLE: ClassModel = ClassModel {
    path: "fleet.Vehicle",
    superclass: None,
    fields: &[
        FieldModel::new("plate", ValueDomain::String),
        FieldModel::new("kind", ValueDomain::String),
        FieldModel::new("capacity", ValueDomain::Numeric),
        FieldModel::new("mileage", ValueDomain::Numeric),
        FieldModel::new("commissioned", ValueDomain::Date),
        FieldModel::new("tags", ValueDomain::List),
        FieldModel::relation("depot", &DEPOT),
    ],
};

pub static TRUCK: ClassModel = ClassModel {
    path: "fleet.Truck",
    superclass: Some(&VEHICLE),
    fields: &[FieldModel::new("axles", ValueDomain::Numeric)],
};

// ----------------------------------------------------------------------
// Classes
// ----------------------------------------------------------------------

///
/// Depot
///

#[derive(Clone, Debug, PartialEq)]
pub struct Depot {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub location: GeometryValue,
}

impl Persistable for Depot {
    const MODEL: &'static ClassModel = &DEPOT;

    fn object_id(&self) -> Value {
        Value::Int(self.id)
    }

    fn to_object(&self) -> ObjectValue {
        ObjectValue::new(&DEPOT, self.id)
            .with("name", &self.name)
            .with("city", &self.city)
            .with("location", self.location.clone())
    }

    fn from_object(object: &ObjectValue) -> Result<Self, InternalError> {
        Ok(Self {
            id: object.id.as_int().unwrap_or_default(),
            name: object.get("name")?,
            city: object.get("city")?,
            location: object.get("location")?,
        })
    }
}

///
/// Vehicle
///

#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub id: i64,
    pub plate: String,
    pub kind: String,
    pub capacity: i64,
    pub mileage: f64,
    pub commissioned: NaiveDate,
    pub tags: Vec<String>,
    pub depot: Option<Depot>,
}

impl Vehicle {
    fn write_fields(&self, object: ObjectValue) -> ObjectValue {
        object
            .with("plate", &self.plate)
            .with("kind", &self.kind)
            .with("capacity", self.capacity)
            .with("mileage", self.mileage)
            .with("commissioned", self.commissioned)
            .with("tags", self.tags.clone())
            .with("depot", self.depot.as_ref().map(Depot::to_object))
    }
}

impl Persistable for Vehicle {
    const MODEL: &'static ClassModel = &VEHICLE;

    fn object_id(&self) -> Value {
        Value::Int(self.id)
    }

    fn to_object(&self) -> ObjectValue {
        self.write_fields(ObjectValue::new(&VEHICLE, self.id))
    }

    fn from_object(object: &ObjectValue) -> Result<Self, InternalError> {
        let depot = match object.field("depot") {
            Some(Value::Object(depot)) => Some(Depot::from_object(depot)?),
            _ => None,
        };

        Ok(Self {
            id: object.id.as_int().unwrap_or_default(),
            plate: object.get("plate")?,
            kind: object.get("kind")?,
            capacity: object.get("capacity")?,
            mileage: object.get("mileage")?,
            commissioned: object.get("commissioned")?,
            tags: object.get("tags")?,
            depot,
        })
    }
}

///
/// Truck
///

#[derive(Clone, Debug, PartialEq)]
pub struct Truck {
    pub vehicle: Vehicle,
    pub axles: i64,
}

impl Persistable for Truck {
    const MODEL: &'static ClassModel = &TRUCK;

    fn object_id(&self) -> Value {
        Value::Int(self.vehicle.id)
    }

    fn to_object(&self) -> ObjectValue {
        self.vehicle
            .write_fields(ObjectValue::new(&TRUCK, self.vehicle.id))
            .with("axles", self.axles)
    }

    fn from_object(object: &ObjectValue) -> Result<Self, InternalError> {
        Ok(Self {
            vehicle: Vehicle::from_object(object)?,
            axles: object.get("axles")?,
        })
    }
}

jdoql_core::query_class! {
    pub struct QDepot for Depot {
        name: String,
        city: String,
        location: GeometryValue,
    }
}

jdoql_core::query_class! {
    pub struct QVehicle for Vehicle {
        plate: String,
        kind: String,
        capacity: i64,
        mileage: f64,
        commissioned: NaiveDate,
        tags: Vec<String>,
        depot: Depot,
    }
}

jdoql_core::query_class! {
    pub struct QTruck for Truck {
        plate: String,
        capacity: i64,
        axles: i64,
    }
}

// ----------------------------------------------------------------------
// Fixture loading
// ----------------------------------------------------------------------

const FLEET_JSON: &str = include_str!("../fixtures/fleet.json");

#[derive(Debug, Deserialize)]
struct FleetFixture {
    depots: Vec<DepotRecord>,
    vehicles: Vec<VehicleRecord>,
    trucks: Vec<TruckRecord>,
}

#[derive(Debug, Deserialize)]
struct DepotRecord {
    id: i64,
    name: String,
    city: String,
    wkt: String,
    srid: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct VehicleRecord {
    id: i64,
    plate: String,
    kind: String,
    capacity: i64,
    mileage: f64,
    commissioned: NaiveDate,
    tags: Vec<String>,
    depot: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TruckRecord {
    #[serde(flatten)]
    vehicle: VehicleRecord,
    axles: i64,
}

fn fixture() -> FleetFixture {
    serde_json::from_str(FLEET_JSON).expect("fleet fixture parses")
}

pub fn depots() -> Vec<Depot> {
    fixture()
        .depots
        .into_iter()
        .map(|r| Depot {
            id: r.id,
            name: r.name,
            city: r.city,
            location: GeometryValue::from_text(r.wkt, r.srid),
        })
        .collect()
}

fn vehicle(record: VehicleRecord, depots: &[Depot]) -> Vehicle {
    let depot = record
        .depot
        .map(|id| depots.iter().find(|d| d.id == id).cloned().expect("known depot"));

    Vehicle {
        id: record.id,
        plate: record.plate,
        kind: record.kind,
        capacity: record.capacity,
        mileage: record.mileage,
        commissioned: record.commissioned,
        tags: record.tags,
        depot,
    }
}

pub fn vehicles() -> Vec<Vehicle> {
    let depots = depots();

    fixture()
        .vehicles
        .into_iter()
        .map(|r| vehicle(r, &depots))
        .collect()
}

pub fn trucks() -> Vec<Truck> {
    let depots = depots();

    fixture()
        .trucks
        .into_iter()
        .map(|r| Truck {
            vehicle: vehicle(r.vehicle, &depots),
            axles: r.axles,
        })
        .collect()
}

/// Manager over every depot, vehicle and truck in the fixture.
pub fn fleet() -> PersistenceManager {
    let pm = PersistenceManager::in_memory();
    stock(&pm);

    pm
}

/// Store the whole fixture through `pm`.
pub fn stock(pm: &PersistenceManager) {
    pm.make_persistent_all(&depots()).expect("store depots");
    pm.make_persistent_all(&vehicles()).expect("store vehicles");
    pm.make_persistent_all(&trucks()).expect("store trucks");
}

pub fn plates(rows: &[Vehicle]) -> Vec<&str> {
    rows.iter().map(|v| v.plate.as_str()).collect()
}
