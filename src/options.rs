//! Generic JSON-backed value object.
//!
//! [`JsonOptions`] holds a key/value bag that is stored as JSON text. Each
//! [`Schema`] declares a *blueprint*: the defaults and shape that every
//! instance is merged against. In memory the defaults are always present. The
//! native (stored) form only keeps what differs from the blueprint, so a value
//! that is all defaults is stored as null.
//!
//! Merging and diffing recurse into nested mappings but treat lists as opaque
//! units (see [`is_nested`]).
//!
//! Schemas may layer computed fields or validation on top of the raw mapping
//! through a [`FieldHooks`] table of named getters and setters.
//!
//! ```
//! use lazy_static::lazy_static;
//! use serde_json::json;
//! use valuecast::options::{blueprint, Fields, JsonOptions, Schema};
//! use valuecast::valueobject::ValueObject;
//!
//! struct Display;
//! impl Schema for Display {
//!     const VALUE_TYPE: &'static str = "DisplayOptions";
//!     fn blueprint() -> &'static Fields {
//!         lazy_static! {
//!             static ref BLUEPRINT: Fields = blueprint(json!({"theme": "light", "size": 12}));
//!         }
//!         &BLUEPRINT
//!     }
//! }
//!
//! let options = JsonOptions::<Display>::from_json(r#"{"size": 14}"#).unwrap();
//! assert_eq!(options.field("theme"), json!("light"));
//! assert_eq!(options.native_value(), rusqlite::types::Value::Text(r#"{"size":14}"#.into()));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use lazy_static::lazy_static;
use rusqlite::types::{Value, ValueRef};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value as Json};
use tracing::warn;

use crate::error::{CastError, Result};
use crate::valueobject::{DecodePolicy, ValueObject};

pub type Fields = Map<String, Json>;
pub type Getter = fn(&Fields) -> Json;
pub type Setter = fn(&mut Fields, Json) -> Result<()>;

// ------------- Hooks -------------
#[derive(Default)]
pub struct FieldHooks {
    getters: HashMap<&'static str, Getter>,
    setters: HashMap<&'static str, Setter>,
}

impl FieldHooks {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn getter(mut self, name: &'static str, getter: Getter) -> Self {
        self.getters.insert(name, getter);
        self
    }
    pub fn setter(mut self, name: &'static str, setter: Setter) -> Self {
        self.setters.insert(name, setter);
        self
    }
    pub fn get(&self, name: &str) -> Option<Getter> {
        self.getters.get(name).copied()
    }
    pub fn set(&self, name: &str) -> Option<Setter> {
        self.setters.get(name).copied()
    }
}

impl fmt::Debug for FieldHooks {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut getters: Vec<_> = self.getters.keys().collect();
        let mut setters: Vec<_> = self.setters.keys().collect();
        getters.sort();
        setters.sort();
        f.debug_struct("FieldHooks")
            .field("getters", &getters)
            .field("setters", &setters)
            .finish()
    }
}

lazy_static! {
    static ref NO_HOOKS: FieldHooks = FieldHooks::new();
    static ref NO_BLUEPRINT: Fields = Fields::new();
}

// ------------- Schema -------------
pub trait Schema: Send + Sync + 'static {
    const VALUE_TYPE: &'static str;
    /// Reject top-level keys that the blueprint does not declare.
    const STRICT: bool = false;
    fn blueprint() -> &'static Fields;
    fn hooks() -> &'static FieldHooks {
        &NO_HOOKS
    }
}

/// Schema without defaults, accepting any object.
#[derive(Debug)]
pub struct Freeform;

impl Schema for Freeform {
    const VALUE_TYPE: &'static str = "JsonOptions";
    fn blueprint() -> &'static Fields {
        &NO_BLUEPRINT
    }
}

pub type FreeformOptions = JsonOptions<Freeform>;

/// Turn a `json!` object literal into a blueprint. Anything but an object
/// yields an empty blueprint.
pub fn blueprint(value: Json) -> Fields {
    match value {
        Json::Object(fields) => fields,
        _ => Fields::new(),
    }
}

// ------------- JsonOptions -------------
pub struct JsonOptions<S: Schema> {
    value: Fields,
    schema: PhantomData<S>,
}

impl<S: Schema> JsonOptions<S> {
    /// Merge the blueprint into `value`. Unknown keys are kept even for strict
    /// schemas, use [`JsonOptions::try_new`] to have them rejected.
    pub fn new(value: Option<Fields>) -> Self {
        Self {
            value: merge_recursive(value.unwrap_or_default(), S::blueprint()),
            schema: PhantomData,
        }
    }
    pub fn try_new(value: Option<Fields>) -> Result<Self> {
        if let Some(fields) = &value {
            for key in fields.keys() {
                check_known::<S>(key)?;
            }
        }
        Ok(Self::new(value))
    }
    pub fn defaults() -> Self {
        Self::new(None)
    }
    /// Strict parse of JSON text, failing on anything but an object.
    pub fn from_json(text: &str) -> Result<Self> {
        Self::decode(ValueRef::Text(text.as_bytes()), DecodePolicy::Reject)
    }
    pub fn field(&self, name: &str) -> Json {
        match S::hooks().get(name) {
            Some(getter) => getter(&self.value),
            None => self.value.get(name).cloned().unwrap_or(Json::Null),
        }
    }
    pub fn set_field(&mut self, name: &str, value: Json) -> Result<()> {
        match S::hooks().set(name) {
            Some(setter) => setter(&mut self.value, value),
            None => {
                check_known::<S>(name)?;
                self.value.insert(name.to_string(), value);
                Ok(())
            }
        }
    }
    /// Raw membership, accessors are not consulted.
    pub fn has_field(&self, name: &str) -> bool {
        self.value.contains_key(name)
    }
    pub fn has_accessor(name: &str) -> bool {
        S::hooks().get(name).is_some()
    }
    pub fn has_mutator(name: &str) -> bool {
        S::hooks().set(name).is_some()
    }
    pub fn as_map(&self) -> &Fields {
        &self.value
    }
    pub fn to_map(&self) -> Fields {
        self.value.clone()
    }
    pub fn into_map(self) -> Fields {
        self.value
    }
    pub fn to_json(&self) -> String {
        self.to_string()
    }
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.value)?)
    }
}

fn check_known<S: Schema>(key: &str) -> Result<()> {
    if S::STRICT && !S::blueprint().contains_key(key) {
        return Err(CastError::UnknownField {
            value_type: S::VALUE_TYPE,
            field: key.to_string(),
        });
    }
    Ok(())
}

// Only objects are accepted at the top level, JSON null and blank text mean "unset".
fn parse_fields(bytes: &[u8]) -> std::result::Result<Option<Fields>, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    match serde_json::from_str::<Json>(text).map_err(|e| e.to_string())? {
        Json::Object(fields) => Ok(Some(fields)),
        Json::Null => Ok(None),
        other => Err(format!("expected a JSON object, found {}", kind_of(&other))),
    }
}

fn kind_of(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

impl<S: Schema> ValueObject for JsonOptions<S> {
    const VALUE_TYPE: &'static str = S::VALUE_TYPE;
    fn decode(value: ValueRef<'_>, policy: DecodePolicy) -> Result<Self> {
        let parsed = match value {
            ValueRef::Null => Ok(None),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => parse_fields(bytes),
            ValueRef::Integer(_) | ValueRef::Real(_) => {
                Err("expected JSON text, found a number".to_string())
            }
        };
        let fields = match (parsed, policy) {
            (Ok(fields), _) => fields,
            (Err(reason), DecodePolicy::Tolerant) => {
                warn!(value_type = S::VALUE_TYPE, %reason, "malformed native value, using defaults");
                None
            }
            (Err(message), DecodePolicy::Reject) => {
                return Err(CastError::Parse {
                    value_type: S::VALUE_TYPE,
                    message,
                });
            }
        };
        Self::try_new(fields)
    }
    fn native_value(&self) -> Value {
        let diffed = diff_recursive(&self.value, S::blueprint());
        if diffed.is_empty() {
            Value::Null
        } else {
            Value::Text(Json::Object(diffed).to_string())
        }
    }
    fn structured(&self) -> Option<Json> {
        Some(Json::Object(self.value.clone()))
    }
}

impl<S: Schema> Clone for JsonOptions<S> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            schema: PhantomData,
        }
    }
}

impl<S: Schema> fmt::Debug for JsonOptions<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("JsonOptions")
            .field("value_type", &S::VALUE_TYPE)
            .field("value", &self.value)
            .finish()
    }
}

impl<S: Schema> fmt::Display for JsonOptions<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = serde_json::to_string(&self.value).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

// Agrees with `same_value_as`: the canonical text, key order included.
impl<S: Schema> PartialEq for JsonOptions<S> {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl<S: Schema> Default for JsonOptions<S> {
    fn default() -> Self {
        Self::defaults()
    }
}

impl<S: Schema> Serialize for JsonOptions<S> {
    fn serialize<R: Serializer>(&self, serializer: R) -> std::result::Result<R::Ok, R::Error> {
        self.value.serialize(serializer)
    }
}

// ------------- Merging and diffing -------------
/// A mapping is nested, and so merged key by key, unless it is empty or its
/// keys are exactly `"0"`, `"1"`, ... in order. Arrays and scalars are opaque.
pub fn is_nested(value: &Json) -> bool {
    match value {
        Json::Object(fields) => fields
            .keys()
            .enumerate()
            .any(|(position, key)| *key != position.to_string()),
        _ => false,
    }
}

/// Add every blueprint entry missing from `value`, recursing where both sides
/// hold nested mappings. Existing keys keep their order, added keys follow in
/// blueprint order.
pub fn merge_recursive(mut value: Fields, blueprint: &Fields) -> Fields {
    for (key, default) in blueprint {
        match value.get_mut(key) {
            None => {
                value.insert(key.clone(), default.clone());
            }
            Some(current) if *current == *default => {}
            Some(current) => {
                if let (Json::Object(inner), Json::Object(defaults)) = (current, default) {
                    if is_nested(default) {
                        let merged = merge_recursive(std::mem::take(inner), defaults);
                        *inner = merged;
                    }
                }
            }
        }
    }
    value
}

/// The inverse of [`merge_recursive`]: drop every entry equal to the
/// blueprint, recursing into nested mappings that differ. A nested mapping
/// whose own diff is empty is dropped as well.
pub fn diff_recursive(value: &Fields, blueprint: &Fields) -> Fields {
    let mut diffed = Fields::new();
    for (key, current) in value {
        match blueprint.get(key) {
            Some(default) if default == current => {}
            Some(default) => {
                let kept = match (current, default) {
                    (Json::Object(inner), Json::Object(defaults)) if is_nested(default) => {
                        let inner = diff_recursive(inner, defaults);
                        // an empty diff reads back as the defaults
                        if inner.is_empty() {
                            continue;
                        }
                        Json::Object(inner)
                    }
                    _ => current.clone(),
                };
                diffed.insert(key.clone(), kept);
            }
            None => {
                diffed.insert(key.clone(), current.clone());
            }
        }
    }
    diffed
}
