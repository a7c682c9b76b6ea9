//! The value object contract.
//!
//! A [`ValueObject`] is an immutable domain type that can be built from the
//! native value a storage layer hands out (a `rusqlite` [`ValueRef`]) and be
//! reduced back to one. Equality is structural, through the canonical string
//! rendering every value object provides via [`fmt::Display`].
//!
//! The typed trait has associated constants, so it cannot be used as a trait
//! object. [`DynValueObject`] is its object-safe twin, implemented for every
//! value object, and is what the cast coordinator moves around.

use std::any::Any;
use std::fmt;

// used for the native representation
use rusqlite::types::{Value, ValueRef};
use serde::Deserialize;
// used for structured serialization
use serde_json::{Number, Value as Json};

use crate::error::Result;

/// What to do with native input that cannot be understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Degrade to an empty (all defaults) instance.
    #[default]
    Tolerant,
    /// Fail with a parse error.
    Reject,
}

pub trait ValueObject: fmt::Display + fmt::Debug + Clone + Send + Sync + 'static {
    // static stuff which needs to be implemented downstream
    const VALUE_TYPE: &'static str;
    fn decode(value: ValueRef<'_>, policy: DecodePolicy) -> Result<Self>;
    /// Reduce to the storage form. `Value::Null` when there is nothing but defaults.
    fn native_value(&self) -> Value;
    // pre-made implementations
    fn from_native(value: ValueRef<'_>) -> Result<Self> {
        Self::decode(value, DecodePolicy::default())
    }
    fn same_value_as(&self, other: &dyn DynValueObject) -> bool {
        self.to_string() == other.display_string()
    }
    /// Associative form used when a whole record is serialized. Types without
    /// one are serialized through their native value.
    fn structured(&self) -> Option<Json> {
        None
    }
}

/// Object-safe view of a [`ValueObject`].
pub trait DynValueObject: fmt::Debug + Send + Sync {
    fn value_type(&self) -> &'static str;
    fn native(&self) -> Value;
    fn display_string(&self) -> String;
    fn same_as(&self, other: &dyn DynValueObject) -> bool;
    fn structured_form(&self) -> Option<Json>;
    fn as_any(&self) -> &dyn Any;
    fn clone_box(&self) -> Box<dyn DynValueObject>;
}

impl<T: ValueObject> DynValueObject for T {
    fn value_type(&self) -> &'static str {
        T::VALUE_TYPE
    }
    fn native(&self) -> Value {
        self.native_value()
    }
    fn display_string(&self) -> String {
        self.to_string()
    }
    fn same_as(&self, other: &dyn DynValueObject) -> bool {
        self.same_value_as(other)
    }
    fn structured_form(&self) -> Option<Json> {
        self.structured()
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn clone_box(&self) -> Box<dyn DynValueObject> {
        Box::new(self.clone())
    }
}

impl<'a> dyn DynValueObject + 'a {
    pub fn is<T: ValueObject>(&self) -> bool {
        self.as_any().is::<T>()
    }
    pub fn downcast_ref<T: ValueObject>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl Clone for Box<dyn DynValueObject> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

impl<'a> fmt::Display for dyn DynValueObject + 'a {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.display_string())
    }
}

// ------------- Native values -------------
/// Map a native value onto JSON for serialization of plain columns.
/// Blobs become arrays of bytes, non-finite reals become null.
pub fn native_to_json(value: ValueRef<'_>) -> Json {
    match value {
        ValueRef::Null => Json::Null,
        ValueRef::Integer(i) => Json::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Json::Number).unwrap_or(Json::Null),
        ValueRef::Text(t) => Json::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Json::Array(b.iter().map(|byte| Json::from(*byte)).collect()),
    }
}

/// Map JSON back to a native value. Booleans are stored as integers, and
/// arrays and objects as their JSON text.
pub fn json_to_native(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Integer(i64::from(*b)),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
        },
        Json::String(s) => Value::Text(s.clone()),
        structured => Value::Text(structured.to_string()),
    }
}
