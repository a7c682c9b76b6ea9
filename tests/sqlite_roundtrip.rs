use lazy_static::lazy_static;
use rusqlite::types::Value;
use rusqlite::{Connection, params};
use serde_json::json;
use valuecast::cast::{CastRegistry, ScalarCast};
use valuecast::caster::Caster;
use valuecast::options::{Fields, JsonOptions, Schema, blueprint};
use valuecast::record::{AttributeHost, Record};
use valuecast::settings::Settings;

struct Preferences;

impl Schema for Preferences {
    const VALUE_TYPE: &'static str = "Preferences";
    fn blueprint() -> &'static Fields {
        lazy_static! {
            static ref BLUEPRINT: Fields = blueprint(json!({
                "locale": "en",
                "layout": { "sidebar": true, "density": "normal" }
            }));
        }
        &BLUEPRINT
    }
}

fn casts() -> CastRegistry {
    CastRegistry::new()
        .scalar("id", ScalarCast::Integer)
        .scalar("active", ScalarCast::Boolean)
        .object::<JsonOptions<Preferences>>("preferences")
}

fn database() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "create table users (id integer primary key, name text, active integer, preferences text);
         insert into users values (1, 'Ada', 1, null);
         insert into users values (2, 'Grace', 0, '{\"locale\":\"sv\"}');",
    )
    .unwrap();
    conn
}

fn load(conn: &Connection, id: i64) -> Caster<Record> {
    let record = conn
        .query_row(
            "select id, name, active, preferences from users where id = ?1",
            [id],
            |row| Ok(Record::from_row(row, casts())),
        )
        .unwrap()
        .unwrap();
    Caster::new(record, &Settings::default())
}

fn store(conn: &Connection, caster: &Caster<Record>) {
    let values: Vec<Value> = caster.host().values().map(|(_, value)| value.clone()).collect();
    conn.execute(
        "update users set id = ?1, name = ?2, active = ?3, preferences = ?4 where id = ?1",
        rusqlite::params_from_iter(values),
    )
    .unwrap();
}

fn stored_preferences(conn: &Connection, id: i64) -> Option<String> {
    conn.query_row("select preferences from users where id = ?1", params![id], |row| row.get(0))
        .unwrap()
}

#[test]
fn null_column_reads_as_defaults() {
    let conn = database();
    let caster = load(&conn, 1);
    let preferences: JsonOptions<Preferences> = caster.get_object("preferences").unwrap();
    assert_eq!(preferences.field("locale"), json!("en"));
    assert_eq!(preferences.field("layout"), json!({"sidebar": true, "density": "normal"}));
    assert_eq!(caster.get_attribute("active").unwrap().as_plain(), Some(&json!(true)));
}

#[test]
fn changes_are_written_back_minimally() {
    let conn = database();
    let mut caster = load(&conn, 1);
    let mut preferences: JsonOptions<Preferences> = caster.get_object("preferences").unwrap();
    preferences
        .set_field("layout", json!({"sidebar": false, "density": "normal"}))
        .unwrap();
    caster.set_object("preferences", preferences).unwrap();
    store(&conn, &caster);

    assert_eq!(
        stored_preferences(&conn, 1).as_deref(),
        Some(r#"{"layout":{"sidebar":false}}"#)
    );
    let reloaded = load(&conn, 1);
    let preferences: JsonOptions<Preferences> = reloaded.get_object("preferences").unwrap();
    assert_eq!(preferences.field("layout")["sidebar"], json!(false));
    assert_eq!(preferences.field("locale"), json!("en"));
}

#[test]
fn resetting_to_defaults_stores_null() {
    let conn = database();
    let mut caster = load(&conn, 2);
    assert_eq!(
        caster.to_json().unwrap(),
        r#"{"id":2,"name":"Grace","active":false,"preferences":{"locale":"sv","layout":{"sidebar":true,"density":"normal"}}}"#
    );
    caster.set_object("preferences", JsonOptions::<Preferences>::defaults()).unwrap();
    store(&conn, &caster);
    assert_eq!(stored_preferences(&conn, 2), None);
}
