//! Records are opaque JSON documents. These helpers read keys and fields without
//! committing to a concrete shape.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::errors::{MenderResult, StoreError};

/// A document in a collection.
pub type Record = Value;

/// Render a scalar JSON value as a key. Strings and numbers qualify.
pub fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Primary key of `record` under the collection's `key_path`.
pub fn extract_key(collection: &str, key_path: &str, record: &Record) -> MenderResult<String> {
    if !record.is_object() {
        return Err(StoreError::InvalidKey {
            collection: collection.to_string(),
            reason: "record is not a JSON object".to_string(),
        }
        .into());
    }
    record
        .get(key_path)
        .and_then(key_string)
        .ok_or_else(|| {
            StoreError::InvalidKey {
                collection: collection.to_string(),
                reason: format!("missing or non-scalar key field `{key_path}`"),
            }
            .into()
        })
}

/// Resolve a dotted path (`attempt_stats.TotalAttempts`).
pub fn get_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |node, part| node.get(part))
}

/// Set a dotted path, creating intermediate objects. Returns false when a
/// non-object sits on the path.
pub fn set_path(record: &mut Record, path: &str, value: Value) -> bool {
    let mut parts = path.split('.').peekable();
    let mut node = record;
    while let Some(part) = parts.next() {
        let Some(obj) = node.as_object_mut() else {
            return false;
        };
        if parts.peek().is_none() {
            obj.insert(part.to_string(), value);
            return true;
        }
        node = obj
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
    }
    false
}

/// A field is absent when missing or explicitly null.
pub fn is_absent(record: &Record, path: &str) -> bool {
    matches!(get_path(record, path), None | Some(Value::Null))
}

/// Keys referenced by a foreign-key field: one for a scalar, many for an array.
pub fn referenced_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(key_string).collect(),
        other => key_string(other).into_iter().collect(),
    }
}

pub fn get_str<'a>(record: &'a Record, path: &str) -> Option<&'a str> {
    get_path(record, path).and_then(Value::as_str)
}

pub fn get_f64(record: &Record, path: &str) -> Option<f64> {
    get_path(record, path).and_then(Value::as_f64)
}

pub fn get_u64(record: &Record, path: &str) -> Option<u64> {
    match get_path(record, path)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        _ => None,
    }
}

pub fn get_bool(record: &Record, path: &str) -> Option<bool> {
    get_path(record, path).and_then(Value::as_bool)
}

pub fn get_string_list(record: &Record, path: &str) -> Vec<String> {
    match get_path(record, path) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Timestamps are RFC 3339 strings or epoch milliseconds.
pub fn get_datetime(record: &Record, path: &str) -> Option<DateTime<Utc>> {
    match get_path(record, path)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Canonical timestamp encoding for records written by the engine.
pub fn timestamp_value(dt: DateTime<Utc>) -> Value {
    Value::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}
