//! Shop catalog used by unit tests: a `Product` base class, a `Book`
//! subclass and a `Category` relation, with their query classes.

use crate::{
    error::InternalError,
    model::{ClassModel, FieldModel},
    pm::PersistenceManager,
    traits::Persistable,
    value::{ObjectValue, Value, ValueDomain},
};
use chrono::NaiveDate;

pub static CATEGORY: ClassModel = ClassModel {
    path: "shop.Category",
    superclass: None,
    fields: &[
        FieldModel::new("name", ValueDomain::String),
        FieldModel::new("ranking", ValueDomain::Numeric),
    ],
};

pub static PRODUCT: ClassModel = ClassModel {
    path: "shop.Product",
    superclass: None,
    fields: &[
        FieldModel::new("name", ValueDomain::String),
        FieldModel::new("price", ValueDomain::Numeric),
        FieldModel::new("stock", ValueDomain::Numeric),
        FieldModel::new("released", ValueDomain::Date),
        FieldModel::new("tags", ValueDomain::List),
        FieldModel::relation("category", &CATEGORY),
    ],
};

pub static BOOK: ClassModel = ClassModel {
    path: "shop.Book",
    superclass: Some(&PRODUCT),
    fields: &[
        FieldModel::new("isbn", ValueDomain::String),
        FieldModel::new("author", ValueDomain::String),
    ],
};

///
/// Category
///

#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub ranking: i64,
}

impl Persistable for Category {
    const MODEL: &'static ClassModel = &CATEGORY;

    fn object_id(&self) -> Value {
        Value::Int(self.id)
    }

    fn to_object(&self) -> ObjectValue {
        ObjectValue::new(&CATEGORY, self.id)
            .with("name", &self.name)
            .with("ranking", self.ranking)
    }

    fn from_object(object: &ObjectValue) -> Result<Self, InternalError> {
        Ok(Self {
            id: object.id.as_int().unwrap_or_default(),
            name: object.get("name")?,
            ranking: object.get("ranking")?,
        })
    }
}

///
/// Product
///

#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub stock: i64,
    pub released: NaiveDate,
    pub tags: Vec<String>,
    pub category: Option<Category>,
}

impl Product {
    fn write_fields(&self, object: ObjectValue) -> ObjectValue {
        object
            .with("name", &self.name)
            .with("price", self.price)
            .with("stock", self.stock)
            .with("released", self.released)
            .with("tags", self.tags.clone())
            .with("category", self.category.as_ref().map(Category::to_object))
    }
}

impl Persistable for Product {
    const MODEL: &'static ClassModel = &PRODUCT;

    fn object_id(&self) -> Value {
        Value::Int(self.id)
    }

    fn to_object(&self) -> ObjectValue {
        self.write_fields(ObjectValue::new(&PRODUCT, self.id))
    }

    // Book snapshots are read back through their product fields.
    fn from_object(object: &ObjectValue) -> Result<Self, InternalError> {
        let category = match object.field("category") {
            Some(Value::Object(category)) => Some(Category::from_object(category)?),
            _ => None,
        };

        Ok(Self {
            id: object.id.as_int().unwrap_or_default(),
            name: object.get("name")?,
            price: object.get("price")?,
            stock: object.get("stock")?,
            released: object.get("released")?,
            tags: object.get("tags")?,
            category,
        })
    }
}

///
/// Book
///

#[derive(Clone, Debug, PartialEq)]
pub struct Book {
    pub product: Product,
    pub isbn: String,
    pub author: String,
}

impl Persistable for Book {
    const MODEL: &'static ClassModel = &BOOK;

    fn object_id(&self) -> Value {
        Value::Int(self.product.id)
    }

    fn to_object(&self) -> ObjectValue {
        self.product
            .write_fields(ObjectValue::new(&BOOK, self.product.id))
            .with("isbn", &self.isbn)
            .with("author", &self.author)
    }

    fn from_object(object: &ObjectValue) -> Result<Self, InternalError> {
        Ok(Self {
            product: Product::from_object(object)?,
            isbn: object.get("isbn")?,
            author: object.get("author")?,
        })
    }
}

crate::query_class! {
    pub struct QCategory for Category {
        name: String,
        ranking: i64,
    }
}

crate::query_class! {
    pub struct QProduct for Product {
        name: String,
        price: f64,
        stock: i64,
        released: NaiveDate,
        tags: Vec<String>,
        category: Category,
    }
}

crate::query_class! {
    pub struct QBook for Book {
        name: String,
        price: f64,
        stock: i64,
        isbn: String,
        author: String,
    }
}

// ----------------------------------------------------------------------
// Catalog
// ----------------------------------------------------------------------

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid fixture date")
}

pub fn electronics() -> Category {
    Category {
        id: 100,
        name: "Electronics".to_string(),
        ranking: 1,
    }
}

pub fn furniture() -> Category {
    Category {
        id: 200,
        name: "Furniture".to_string(),
        ranking: 2,
    }
}

pub fn product(
    id: i64,
    name: &str,
    price: f64,
    stock: i64,
    released: NaiveDate,
    tags: &[&str],
    category: Option<Category>,
) -> Product {
    Product {
        id,
        name: name.to_string(),
        price,
        stock,
        released,
        tags: tags.iter().map(ToString::to_string).collect(),
        category,
    }
}

pub fn products() -> Vec<Product> {
    vec![
        product(1, "Laptop", 1200.0, 5, date(2021, 3, 1), &["tech", "office"], Some(electronics())),
        product(2, "Phone", 800.0, 0, date(2022, 6, 15), &["tech"], Some(electronics())),
        product(3, "Desk", 300.0, 12, date(2020, 1, 10), &["office", "furniture"], Some(furniture())),
        product(4, "Chair", 150.0, 30, date(2020, 1, 10), &["furniture"], Some(furniture())),
        product(5, "Lamp", 45.5, 7, date(2019, 11, 20), &[], None),
    ]
}

pub fn books() -> Vec<Book> {
    vec![
        Book {
            product: product(10, "Rust in Action", 39.0, 3, date(2021, 8, 1), &["tech", "books"], None),
            isbn: "978-1617294556".to_string(),
            author: "McNamara".to_string(),
        },
        Book {
            product: product(11, "Dune", 9.99, 50, date(1965, 8, 1), &["books"], None),
            isbn: "978-0441013593".to_string(),
            author: "Herbert".to_string(),
        },
    ]
}

/// In-memory manager holding five products and two books.
pub fn catalog() -> PersistenceManager {
    let pm = PersistenceManager::in_memory();
    pm.make_persistent_all(&products()).expect("store products");
    pm.make_persistent_all(&books()).expect("store books");

    pm
}
