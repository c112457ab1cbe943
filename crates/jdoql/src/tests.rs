use crate::prelude::*;
use chrono::NaiveDate;

static NOTE: ClassModel = ClassModel {
    path: "app.Note",
    superclass: None,
    fields: &[
        FieldModel::new("title", ValueDomain::String),
        FieldModel::new("written", ValueDomain::Date),
    ],
};

#[derive(Clone, Debug, PartialEq)]
struct Note {
    id: i64,
    title: String,
    written: NaiveDate,
}

impl Persistable for Note {
    const MODEL: &'static ClassModel = &NOTE;

    fn object_id(&self) -> Value {
        Value::Int(self.id)
    }

    fn to_object(&self) -> ObjectValue {
        ObjectValue::new(&NOTE, self.id)
            .with("title", &self.title)
            .with("written", self.written)
    }

    fn from_object(object: &ObjectValue) -> Result<Self, InternalError> {
        Ok(Self {
            id: object.id.as_int().unwrap_or_default(),
            title: object.get("title")?,
            written: object.get("written")?,
        })
    }
}

query_class! {
    struct QNote for Note {
        title: String,
        written: NaiveDate,
    }
}

fn note(id: i64, title: &str, year: i32) -> Note {
    Note {
        id,
        title: title.to_string(),
        written: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
    }
}

#[test]
fn prelude_covers_a_full_query() {
    let pm = PersistenceManager::in_memory();
    pm.make_persistent_all(&[note(1, "draft", 2020), note(2, "final", 2024)])
        .unwrap();

    let mut query = pm.new_query::<Note>();
    let n = query.candidate_class::<QNote>();
    let since = query.parameter::<i32>("since");
    query
        .filter(n.written().year().gteq(&since))
        .order_by([n.title().asc()])
        .set_parameter(&since, 2021);

    assert_eq!(
        query.to_string(),
        "SELECT FROM app.Note WHERE this.written.getYear() >= :since ORDER BY this.title ASC"
    );

    let found: Result<Vec<Note>, QueryError> =
        query.execute_list().map(QueryResult::into_rows);
    assert_eq!(found.unwrap(), [note(2, "final", 2024)]);
}

#[test]
fn version_is_the_package_version() {
    assert_eq!(crate::VERSION, env!("CARGO_PKG_VERSION"));
    assert!(!JdoqlConfig::default().fetch.groups.is_empty());
}
