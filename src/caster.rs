//! The attribute cast coordinator.
//!
//! [`Caster`] wraps a host record and sits between application code and the
//! host's attribute storage. Reads, writes and whole-record serialization go
//! through it. Columns the host registers as value objects are converted with
//! the [`ValueObject`](crate::valueobject::ValueObject) contract, and every other
//! column is left to the host.

use rusqlite::types::ValueRef;
use serde_json::{Map, Value as Json};
use tracing::{debug, trace, warn};

use crate::cast::ObjectCast;
use crate::error::{CastError, Result};
use crate::record::{Attribute, AttributeHost};
use crate::settings::Settings;
use crate::valueobject::{DecodePolicy, ValueObject, native_to_json};

#[derive(Debug)]
pub struct Caster<H: AttributeHost> {
    host: H,
    policy: DecodePolicy,
}

impl<H: AttributeHost> Caster<H> {
    pub fn new(host: H, settings: &Settings) -> Self {
        Self::with_policy(host, settings.decode_policy)
    }
    pub fn with_policy(host: H, policy: DecodePolicy) -> Self {
        Self { host, policy }
    }
    pub fn host(&self) -> &H {
        &self.host
    }
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
    pub fn into_inner(self) -> H {
        self.host
    }
    pub fn policy(&self) -> DecodePolicy {
        self.policy
    }

    /// The value object type registered for `column`, if any. Scalar casts
    /// in the same registry are not value objects and yield `None`.
    pub fn resolve_value_object_type(&self, column: &str) -> Option<&ObjectCast> {
        self.host.casts().object_cast(column)
    }

    pub fn on_read(&self, column: &str, raw: ValueRef<'_>) -> Result<Attribute> {
        match self.resolve_value_object_type(column) {
            Some(cast) => {
                trace!(column, value_type = cast.value_type(), "casting to value object");
                Ok(Attribute::Object(cast.decode(raw, self.policy)?))
            }
            None => self.host.cast_attribute(column, raw),
        }
    }

    /// Read the stored value of `column` and cast it. Missing columns read as null.
    pub fn get_attribute(&self, column: &str) -> Result<Attribute> {
        let raw = self
            .host
            .raw_attribute(column)
            .map(ValueRef::from)
            .unwrap_or(ValueRef::Null);
        self.on_read(column, raw)
    }

    /// Typed read of a value object column.
    pub fn get_object<T: ValueObject>(&self, column: &str) -> Result<T> {
        let attribute = self.get_attribute(column)?;
        attribute
            .as_object::<T>()
            .cloned()
            .ok_or_else(|| CastError::TypeMismatch {
                column: column.to_string(),
                expected: T::VALUE_TYPE,
            })
    }

    /// Value object columns only take instances of their exact registered
    /// type, which are stored in native form straight into the raw slot.
    pub fn on_write(&mut self, column: &str, value: Attribute) -> Result<()> {
        let Some(cast) = self.resolve_value_object_type(column).copied() else {
            return self.host.set_attribute(column, value);
        };
        match value {
            Attribute::Object(object) if cast.is_instance(&*object) => {
                let native = object.native();
                debug!(column, value_type = cast.value_type(), ?native, "storing value object");
                self.host.set_raw_attribute(column, native);
                Ok(())
            }
            _ => {
                warn!(column, expected = cast.value_type(), "rejected write to value object column");
                Err(CastError::TypeMismatch {
                    column: column.to_string(),
                    expected: cast.value_type(),
                })
            }
        }
    }

    pub fn set_attribute(&mut self, column: &str, value: impl Into<Attribute>) -> Result<()> {
        self.on_write(column, value.into())
    }

    pub fn set_object<T: ValueObject>(&mut self, column: &str, value: T) -> Result<()> {
        self.on_write(column, Attribute::object(value))
    }

    /// Replace value objects by their structured form, or by their native
    /// value when they have none. Plain entries and the order are untouched.
    pub fn on_serialize_all(&self, attributes: Vec<(String, Attribute)>) -> Map<String, Json> {
        attributes
            .into_iter()
            .map(|(column, attribute)| {
                let value = match attribute {
                    Attribute::Plain(value) => value,
                    Attribute::Object(object) => object
                        .structured_form()
                        .unwrap_or_else(|| native_to_json(ValueRef::from(&object.native()))),
                };
                (column, value)
            })
            .collect()
    }

    pub fn attributes_to_map(&self) -> Result<Map<String, Json>> {
        let mut attributes = Vec::new();
        for column in self.host.columns() {
            let attribute = self.get_attribute(&column)?;
            attributes.push((column, attribute));
        }
        Ok(self.on_serialize_all(attributes))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.attributes_to_map()?)?)
    }
}
