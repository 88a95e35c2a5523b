//! Conversion between plain JSON and Firestore's typed `Value` encoding.
//!
//! Firestore wraps every value in a single-key object naming its type, e.g.
//! `{"stringValue": "Rick"}` or `{"mapValue": {"fields": {...}}}`.

use characters_core::Document;
use serde_json::{json, Map, Value};

use super::FirestoreError;

pub fn encode_fields(fields: Document) -> Map<String, Value> {
    fields.into_iter().map(|(k, v)| (k, encode(v))).collect()
}

pub fn decode_fields(fields: Map<String, Value>) -> Result<Document, FirestoreError> {
    fields
        .into_iter()
        .map(|(k, v)| decode(v).map(|v| (k, v)))
        .collect()
}

pub fn encode(value: Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // int64 travels as a decimal string
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.into_iter().map(encode).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub fn decode(value: Value) -> Result<Value, FirestoreError> {
    let mut wrapper = match value {
        Value::Object(map) => map,
        other => return Err(unexpected(&other)),
    };
    let Some(key) = wrapper.keys().next().cloned() else {
        return Err(FirestoreError::Value("empty value object".into()));
    };
    let inner = wrapper.remove(&key).unwrap_or(Value::Null);

    match key.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" => Ok(inner),
        "integerValue" => match &inner {
            Value::String(s) => s
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| FirestoreError::Value(format!("integerValue {s:?}: {e}"))),
            Value::Number(_) => Ok(inner),
            _ => Err(unexpected(&inner)),
        },
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" | "geoPointValue" => {
            Ok(inner)
        }
        "arrayValue" => {
            let values = match inner {
                Value::Object(mut array) => array.remove("values").unwrap_or(Value::Array(Vec::new())),
                other => return Err(unexpected(&other)),
            };
            match values {
                Value::Array(items) => items
                    .into_iter()
                    .map(decode)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array),
                other => Err(unexpected(&other)),
            }
        }
        "mapValue" => {
            let fields = match inner {
                Value::Object(mut map) => map.remove("fields").unwrap_or(Value::Object(Map::new())),
                other => return Err(unexpected(&other)),
            };
            match fields {
                Value::Object(fields) => decode_fields(fields).map(Value::Object),
                other => Err(unexpected(&other)),
            }
        }
        other => Err(FirestoreError::Value(format!("unsupported value type {other}"))),
    }
}

fn unexpected(value: &Value) -> FirestoreError {
    FirestoreError::Value(format!("unexpected value {value}"))
}
