//! Host records.
//!
//! [`AttributeHost`] is everything the cast coordinator needs from a record
//! type: its cast registry, raw storage for native values and its own
//! default handling of plain columns. [`Record`] is a small implementation
//! of it that keeps columns in order and can be loaded from a `rusqlite` row.

use std::fmt;

use rusqlite::Row;
use rusqlite::types::{Value, ValueRef};
use serde_json::Value as Json;

use crate::cast::{CastRegistry, ScalarCast};
use crate::error::Result;
use crate::valueobject::{DynValueObject, ValueObject, json_to_native, native_to_json};

// ------------- Attribute -------------
/// An attribute as seen by application code.
#[derive(Debug, Clone)]
pub enum Attribute {
    Plain(Json),
    Object(Box<dyn DynValueObject>),
}

impl Attribute {
    pub fn object<T: ValueObject>(value: T) -> Self {
        Attribute::Object(Box::new(value))
    }
    pub fn is_object(&self) -> bool {
        matches!(self, Attribute::Object(_))
    }
    pub fn as_plain(&self) -> Option<&Json> {
        match self {
            Attribute::Plain(value) => Some(value),
            Attribute::Object(_) => None,
        }
    }
    pub fn as_object<T: ValueObject>(&self) -> Option<&T> {
        match self {
            Attribute::Object(object) => object.downcast_ref::<T>(),
            Attribute::Plain(_) => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Attribute::Plain(value) => write!(f, "{}", value),
            Attribute::Object(object) => write!(f, "{}", object),
        }
    }
}

impl From<Json> for Attribute {
    fn from(value: Json) -> Self {
        Attribute::Plain(value)
    }
}
impl From<i64> for Attribute {
    fn from(value: i64) -> Self {
        Attribute::Plain(Json::from(value))
    }
}
impl From<f64> for Attribute {
    fn from(value: f64) -> Self {
        Attribute::Plain(Json::from(value))
    }
}
impl From<bool> for Attribute {
    fn from(value: bool) -> Self {
        Attribute::Plain(Json::from(value))
    }
}
impl From<&str> for Attribute {
    fn from(value: &str) -> Self {
        Attribute::Plain(Json::from(value))
    }
}
impl From<String> for Attribute {
    fn from(value: String) -> Self {
        Attribute::Plain(Json::from(value))
    }
}

// ------------- Host -------------
pub trait AttributeHost {
    fn casts(&self) -> &CastRegistry;
    /// Column names in serialization order.
    fn columns(&self) -> Vec<String>;
    fn raw_attribute(&self, column: &str) -> Option<&Value>;
    /// Store a native value without any casting.
    fn set_raw_attribute(&mut self, column: &str, value: Value);
    /// Default read handling for columns that are not value objects.
    fn cast_attribute(&self, column: &str, raw: ValueRef<'_>) -> Result<Attribute>;
    /// Default write handling for columns that are not value objects.
    fn set_attribute(&mut self, column: &str, value: Attribute) -> Result<()>;
}

// ------------- Record -------------
#[derive(Debug, Clone)]
pub struct Record {
    casts: CastRegistry,
    attributes: Vec<(String, Value)>,
}

impl Record {
    pub fn new(casts: CastRegistry) -> Self {
        Self {
            casts,
            attributes: Vec::new(),
        }
    }
    pub fn from_row(row: &Row<'_>, casts: CastRegistry) -> Result<Self> {
        let mut record = Record::new(casts);
        let names: Vec<String> = row
            .as_ref()
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        for (index, name) in names.into_iter().enumerate() {
            let value = Value::from(row.get_ref(index)?);
            record.attributes.push((name, value));
        }
        Ok(record)
    }
    /// Columns and their native values, ready to be bound as parameters.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }
    pub fn len(&self) -> usize {
        self.attributes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl AttributeHost for Record {
    fn casts(&self) -> &CastRegistry {
        &self.casts
    }
    fn columns(&self) -> Vec<String> {
        self.attributes.iter().map(|(column, _)| column.clone()).collect()
    }
    fn raw_attribute(&self, column: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
    fn set_raw_attribute(&mut self, column: &str, value: Value) {
        match self.attributes.iter_mut().find(|(name, _)| name == column) {
            Some((_, slot)) => *slot = value,
            None => self.attributes.push((column.to_string(), value)),
        }
    }
    fn cast_attribute(&self, column: &str, raw: ValueRef<'_>) -> Result<Attribute> {
        let cast = self.casts.scalar_cast(column).unwrap_or(ScalarCast::Raw);
        Ok(Attribute::Plain(cast_scalar(cast, raw)))
    }
    fn set_attribute(&mut self, column: &str, value: Attribute) -> Result<()> {
        let native = match value {
            Attribute::Plain(Json::Null) => Value::Null,
            Attribute::Plain(plain) => match self.casts.scalar_cast(column) {
                Some(ScalarCast::Json) => Value::Text(plain.to_string()),
                _ => json_to_native(&plain),
            },
            Attribute::Object(object) => object.native(),
        };
        self.set_raw_attribute(column, native);
        Ok(())
    }
}

// Null stays null whatever the cast. Text that does not convert becomes null.
fn cast_scalar(cast: ScalarCast, raw: ValueRef<'_>) -> Json {
    match (cast, raw) {
        (_, ValueRef::Null) => Json::Null,
        (ScalarCast::Integer, ValueRef::Integer(i)) => Json::from(i),
        (ScalarCast::Integer, ValueRef::Real(f)) => Json::from(f as i64),
        (ScalarCast::Integer, ValueRef::Text(t)) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(Json::from)
            .unwrap_or(Json::Null),
        (ScalarCast::Real, ValueRef::Integer(i)) => Json::from(i as f64),
        (ScalarCast::Real, ValueRef::Text(t)) => std::str::from_utf8(t)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .map(|f| native_to_json(ValueRef::Real(f)))
            .unwrap_or(Json::Null),
        (ScalarCast::Boolean, ValueRef::Integer(i)) => Json::Bool(i != 0),
        (ScalarCast::Boolean, ValueRef::Real(f)) => Json::Bool(f != 0.0),
        (ScalarCast::Boolean, ValueRef::Text(t)) => Json::Bool(!matches!(t, b"" | b"0" | b"false")),
        (ScalarCast::Text, ValueRef::Integer(i)) => Json::String(i.to_string()),
        (ScalarCast::Text, ValueRef::Real(f)) => Json::String(f.to_string()),
        (ScalarCast::Json, ValueRef::Text(t)) | (ScalarCast::Json, ValueRef::Blob(t)) => {
            serde_json::from_slice(t).unwrap_or(Json::Null)
        }
        (_, other) => native_to_json(other),
    }
}
