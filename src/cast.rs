use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Iter;
use std::fmt;
use std::hash::BuildHasherDefault;

use rusqlite::types::ValueRef;
use seahash::SeaHasher;

use crate::error::Result;
use crate::valueobject::{DecodePolicy, DynValueObject, ValueObject};

pub type CastHasher = BuildHasherDefault<SeaHasher>;

pub type Decoder = fn(ValueRef<'_>, DecodePolicy) -> Result<Box<dyn DynValueObject>>;

// ------------- Scalar casts -------------
// These are handled by the host itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarCast {
    Integer,
    Real,
    Boolean,
    Text,
    Json,
    Raw,
}

// ------------- Object casts -------------
/// Identifies a value object type and knows how to build one from a native value.
#[derive(Clone, Copy)]
pub struct ObjectCast {
    value_type: &'static str,
    type_id: TypeId,
    decoder: Decoder,
}

fn decode_boxed<T: ValueObject>(
    value: ValueRef<'_>,
    policy: DecodePolicy,
) -> Result<Box<dyn DynValueObject>> {
    Ok(Box::new(T::decode(value, policy)?))
}

impl ObjectCast {
    pub fn of<T: ValueObject>() -> Self {
        Self {
            value_type: T::VALUE_TYPE,
            type_id: TypeId::of::<T>(),
            decoder: decode_boxed::<T>,
        }
    }
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
    pub fn decode(&self, value: ValueRef<'_>, policy: DecodePolicy) -> Result<Box<dyn DynValueObject>> {
        (self.decoder)(value, policy)
    }
    /// True only for the exact type, not for other types sharing the name.
    pub fn is_instance(&self, candidate: &dyn DynValueObject) -> bool {
        candidate.as_any().type_id() == self.type_id
    }
}

impl PartialEq for ObjectCast {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}
impl Eq for ObjectCast {}

impl fmt::Debug for ObjectCast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ObjectCast({})", self.value_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cast {
    Scalar(ScalarCast),
    Object(ObjectCast),
}

// ------------- Registry -------------
/// Column name to cast, declared once per host type.
#[derive(Debug, Clone, Default)]
pub struct CastRegistry {
    casts: HashMap<String, Cast, CastHasher>,
}

impl CastRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with(mut self, column: impl Into<String>, cast: Cast) -> Self {
        self.casts.insert(column.into(), cast);
        self
    }
    pub fn scalar(self, column: impl Into<String>, cast: ScalarCast) -> Self {
        self.with(column, Cast::Scalar(cast))
    }
    pub fn object<T: ValueObject>(self, column: impl Into<String>) -> Self {
        self.with(column, Cast::Object(ObjectCast::of::<T>()))
    }
    pub fn get(&self, column: &str) -> Option<&Cast> {
        self.casts.get(column)
    }
    pub fn object_cast(&self, column: &str) -> Option<&ObjectCast> {
        match self.casts.get(column) {
            Some(Cast::Object(cast)) => Some(cast),
            _ => None,
        }
    }
    pub fn scalar_cast(&self, column: &str) -> Option<ScalarCast> {
        match self.casts.get(column) {
            Some(Cast::Scalar(cast)) => Some(*cast),
            _ => None,
        }
    }
    pub fn len(&self) -> usize {
        self.casts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.casts.is_empty()
    }
    pub fn iter(&self) -> Iter<'_, String, Cast> {
        self.casts.iter()
    }
}
