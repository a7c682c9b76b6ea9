use lazy_static::lazy_static;
use rusqlite::types::{Value, ValueRef};
use serde_json::{Value as Json, json};
use valuecast::error::{CastError, Result};
use valuecast::options::{FieldHooks, Fields, JsonOptions, Schema, blueprint};
use valuecast::valueobject::{DecodePolicy, DynValueObject, ValueObject};

struct Notifications;

fn summary(fields: &Fields) -> Json {
    let digest = fields.get("digest").cloned().unwrap_or(Json::Null);
    let frequency = digest["frequency"].as_str().unwrap_or("never");
    let hour = digest["hour"].as_i64().unwrap_or(0);
    json!(format!("{} at {:02}:00", frequency, hour))
}

fn set_hour(fields: &mut Fields, value: Json) -> Result<()> {
    let hour = value
        .as_i64()
        .filter(|hour| (0..24).contains(hour))
        .ok_or_else(|| CastError::InvalidField {
            field: "hour".to_string(),
            message: format!("{} is not an hour of the day", value),
        })?;
    match fields.get_mut("digest") {
        Some(Json::Object(digest)) => {
            digest.insert("hour".to_string(), json!(hour));
        }
        _ => {
            fields.insert("digest".to_string(), json!({ "hour": hour }));
        }
    }
    Ok(())
}

impl Schema for Notifications {
    const VALUE_TYPE: &'static str = "NotificationOptions";
    fn blueprint() -> &'static Fields {
        lazy_static! {
            static ref BLUEPRINT: Fields = blueprint(json!({
                "email": true,
                "digest": { "frequency": "daily", "hour": 8 },
                "channels": ["mail"]
            }));
        }
        &BLUEPRINT
    }
    fn hooks() -> &'static FieldHooks {
        lazy_static! {
            static ref HOOKS: FieldHooks = FieldHooks::new()
                .getter("summary", summary)
                .setter("hour", set_hour);
        }
        &HOOKS
    }
}

type NotificationOptions = JsonOptions<Notifications>;

#[test]
fn untouched_options_are_stored_as_null() {
    let options = NotificationOptions::from_json(r#"{"email":true,"digest":{"hour":8}}"#).unwrap();
    assert_eq!(options.field("channels"), json!(["mail"]));
    assert_eq!(options.native_value(), Value::Null);
}

#[test]
fn changed_scalar_is_the_only_thing_stored() {
    let options = NotificationOptions::from_json(r#"{"email":false}"#).unwrap();
    assert_eq!(options.native_value(), Value::Text(r#"{"email":false}"#.into()));
}

#[test]
fn lists_replace_the_default() {
    let options = NotificationOptions::from_json(r#"{"channels":["sms"]}"#).unwrap();
    assert_eq!(options.field("channels"), json!(["sms"]));
    assert_eq!(options.native_value(), Value::Text(r#"{"channels":["sms"]}"#.into()));
}

#[test]
fn stored_form_is_stable() {
    let first = NotificationOptions::from_json(r#"{"digest":{"frequency":"weekly"},"extra":{"a":[1]}}"#).unwrap();
    let native = first.native_value();
    assert_eq!(native, Value::Text(r#"{"digest":{"frequency":"weekly"},"extra":{"a":[1]}}"#.into()));
    let second = NotificationOptions::from_native(ValueRef::from(&native)).unwrap();
    assert_eq!(second.native_value(), native);
    assert!(first.same_value_as(&second));
}

#[test]
fn getters_compute_fields() {
    let options = NotificationOptions::from_json(r#"{"digest":{"frequency":"weekly"}}"#).unwrap();
    assert!(NotificationOptions::has_accessor("summary"));
    assert!(!options.has_field("summary"));
    assert_eq!(options.field("summary"), json!("weekly at 08:00"));
}

#[test]
fn setters_validate_and_write_through() {
    let mut options = NotificationOptions::defaults();
    assert!(NotificationOptions::has_mutator("hour"));
    options.set_field("hour", json!(21)).unwrap();
    assert_eq!(options.field("digest"), json!({"frequency": "daily", "hour": 21}));
    assert_eq!(options.native_value(), Value::Text(r#"{"digest":{"hour":21}}"#.into()));

    let err = options.set_field("hour", json!(25)).unwrap_err();
    assert!(matches!(err, CastError::InvalidField { ref field, .. } if field == "hour"));
    assert_eq!(options.field("digest")["hour"], json!(21));
}

#[test]
fn equality_is_by_canonical_text() {
    let a = NotificationOptions::from_json(r#"{"email":false,"channels":[]}"#).unwrap();
    let b = NotificationOptions::from_json(r#"{"email":false,"channels":[]}"#).unwrap();
    let reordered = NotificationOptions::from_json(r#"{"channels":[],"email":false}"#).unwrap();
    let c = NotificationOptions::defaults();
    assert_eq!(a, b);
    assert!(a.same_value_as(&b));
    assert!(!a.same_value_as(&c));
    assert_ne!(a.to_string(), reordered.to_string());
    assert!(!a.same_value_as(&reordered));
    assert_ne!(a, reordered);
    let erased: Box<dyn DynValueObject> = Box::new(b);
    assert!(a.same_value_as(&*erased));
}

#[test]
fn malformed_storage_depends_on_policy() {
    let tolerant = NotificationOptions::decode(ValueRef::Text(b"\"just text\""), DecodePolicy::Tolerant).unwrap();
    assert_eq!(tolerant, NotificationOptions::defaults());
    let rejected = NotificationOptions::decode(ValueRef::Text(b"\"just text\""), DecodePolicy::Reject);
    assert!(matches!(rejected, Err(CastError::Parse { value_type: "NotificationOptions", .. })));
}

struct Labels;

fn shout_label(fields: &Fields) -> Json {
    let label = fields.get("label").and_then(Json::as_str).unwrap_or("");
    json!(label.to_uppercase())
}

fn tidy_label(fields: &mut Fields, value: Json) -> Result<()> {
    let label = value.as_str().map(str::trim).unwrap_or("");
    if label.is_empty() {
        return Err(CastError::InvalidField {
            field: "label".to_string(),
            message: "a label cannot be blank".to_string(),
        });
    }
    fields.insert("label".to_string(), json!(label.to_lowercase()));
    Ok(())
}

impl Schema for Labels {
    const VALUE_TYPE: &'static str = "LabelOptions";
    fn blueprint() -> &'static Fields {
        lazy_static! {
            static ref BLUEPRINT: Fields = blueprint(json!({ "label": "untitled", "size": 1 }));
        }
        &BLUEPRINT
    }
    fn hooks() -> &'static FieldHooks {
        lazy_static! {
            static ref HOOKS: FieldHooks = FieldHooks::new()
                .getter("label", shout_label)
                .setter("label", tidy_label);
        }
        &HOOKS
    }
}

#[test]
fn hooks_take_precedence_over_raw_keys() {
    let mut options = JsonOptions::<Labels>::from_json(r#"{"label":"Draft"}"#).unwrap();
    assert!(options.has_field("label"));
    assert_eq!(options.as_map()["label"], json!("Draft"));
    assert_eq!(options.field("label"), json!("DRAFT"));
    assert_eq!(options.field("size"), json!(1));

    options.set_field("label", json!("  Final Copy ")).unwrap();
    assert_eq!(options.as_map()["label"], json!("final copy"));
    assert_eq!(options.field("label"), json!("FINAL COPY"));
    assert_eq!(options.native_value(), Value::Text(r#"{"label":"final copy"}"#.into()));

    assert!(options.set_field("label", json!("   ")).is_err());
    assert_eq!(options.as_map()["label"], json!("final copy"));
}
