//! Valuecast – casting of stored columns to immutable value objects.
//!
//! A record keeps its columns in *native* form, the plain values a storage
//! engine hands out (see [`rusqlite::types::Value`]). Some columns are better
//! read as richer domain types:
//! * A [`valueobject::ValueObject`] is an immutable type that can be decoded
//!   from a native value and reduced back to one. Equality is structural.
//! * An [`options::JsonOptions`] is a ready-made value object wrapping a JSON
//!   key/value bag. Its [`options::Schema`] supplies a blueprint of defaults
//!   that is merged in on construction and diffed out again on storage.
//! * A [`cast::CastRegistry`] declares, per column, whether the column is a
//!   value object or one of the plain scalar casts the host handles itself.
//! * A [`caster::Caster`] wraps any [`record::AttributeHost`] and routes reads,
//!   writes and whole-record serialization through the value object contract.
//!
//! ## Modules
//! * [`valueobject`] – The value object contract and its object-safe twin.
//! * [`options`] – The JSON options value object, blueprints and recursive merge/diff.
//! * [`cast`] – Cast declarations and the per-host registry.
//! * [`record`] – The host contract plus a small in-memory [`record::Record`].
//! * [`caster`] – The read/write/serialize coordinator.
//! * [`settings`] – Runtime settings read through `config`.
//! * [`error`] – The crate error type.
//!
//! ## Storage Form
//! The native form of an options object is compact JSON text holding only what
//! differs from the blueprint. When nothing differs the native form is null,
//! so untouched columns stay empty in the database. Lists are never merged,
//! they replace the default as a whole.
//!
//! ## Quick Start
//! ```
//! use serde_json::json;
//! use rusqlite::types::Value;
//! use valuecast::cast::CastRegistry;
//! use valuecast::caster::Caster;
//! use valuecast::options::FreeformOptions;
//! use valuecast::record::{AttributeHost, Record};
//! use valuecast::settings::Settings;
//!
//! let casts = CastRegistry::new().object::<FreeformOptions>("options");
//! let mut record = Record::new(casts);
//! record.set_raw_attribute("options", Value::Text(r#"{"x":1}"#.into()));
//!
//! let mut caster = Caster::new(record, &Settings::default());
//! let mut options: FreeformOptions = caster.get_object("options").unwrap();
//! assert_eq!(options.field("x"), json!(1));
//!
//! options.set_field("y", json!(true)).unwrap();
//! caster.set_object("options", options).unwrap();
//! assert_eq!(caster.to_json().unwrap(), r#"{"options":{"x":1,"y":true}}"#);
//! ```
//!
//! ## Logging
//! The crate logs through `tracing`. Tolerant decoding of malformed input is
//! reported at `warn`, writes at `debug` and casts at `trace`. Install any
//! subscriber to see them.

pub mod cast;
pub mod caster;
pub mod error;
pub mod options;
pub mod record;
pub mod settings;
pub mod valueobject;

pub use error::{CastError, Result};
