//! Conversions between script values and JSON.
//!
//! Used by tooling that takes arguments on the command line or prints
//! decoded events. JSON arrays become positional tables and objects become
//! string-keyed tables. Going the other way, a table with only a positional
//! part becomes an array and anything else becomes an object whose keys are
//! rendered as strings.

use serde_json::{Map, Number};

use crate::error::{CodecError, Result};
use crate::table::{Table, TableKey};
use crate::value::Value;

impl Value {
    /// Convert a JSON document into a value.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Array(items) => {
                Value::Table(Table::from_array(items.iter().map(Value::from_json).collect()))
            }
            serde_json::Value::Object(map) => {
                let mut table = Table::new();
                for (key, item) in map {
                    table.set_key(
                        TableKey::String(key.clone().into()),
                        Value::from_json(item),
                    );
                }
                Value::Table(table)
            }
        }
    }

    /// Convert a value into JSON.
    ///
    /// Non-finite numbers become `null`, references become
    /// `{"$ref": id}` and functions are rejected.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Nil => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Number(n) => {
                Number::from_f64(*n).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            Value::String(s) => serde_json::Value::String(String::from_utf8_lossy(s).into_owned()),
            Value::Ref(id) => {
                let mut map = Map::new();
                map.insert("$ref".to_owned(), serde_json::Value::Number((*id).into()));
                serde_json::Value::Object(map)
            }
            Value::Table(table) if table.fields().next().is_none() => serde_json::Value::Array(
                table
                    .array()
                    .iter()
                    .map(Value::to_json)
                    .collect::<Result<_>>()?,
            ),
            Value::Table(table) => {
                let mut map = Map::new();
                for (key, item) in table.pairs() {
                    map.insert(key_to_string(&key), item.to_json()?);
                }
                serde_json::Value::Object(map)
            }
            Value::Function(_) => return Err(CodecError::Unsupported(self.type_name())),
        })
    }
}

fn key_to_string(key: &TableKey) -> String {
    match key {
        TableKey::Boolean(b) => b.to_string(),
        TableKey::Integer(i) => i.to_string(),
        TableKey::Number(n) => n.to_string(),
        TableKey::String(s) => String::from_utf8_lossy(s).into_owned(),
    }
}
