//! Conversion between JSON payloads and the [`Value`] model.
//!
//! Decoding is schema-directed: an array at a set node becomes a
//! hash-identified set, an object at a map node becomes a map, and so on.
//! The two sentinels are translated on the way in and out:
//!
//! - the secret sentinel object `{"4dabf1…": "1b4706…", "value": v}` becomes
//!   `v` with its secret bit set,
//! - the string `04da6b54-80e4-46f7-96ec-b56ff0331ba9` becomes `Unknown`.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_bridge::convert::{decode, encode};
//! use hemmer_provider_bridge::schema::{Schema, SchemaNode};
//! use serde_json::json;
//!
//! let schema = Schema::v0().with_field("ports", SchemaNode::set(SchemaNode::int()));
//! let value = decode(&schema, &json!({"ports": [80, 443, 80]})).unwrap();
//! assert_eq!(value.get("ports").unwrap().as_set().unwrap().len(), 2);
//! assert_eq!(encode(&value)["ports"].as_array().unwrap().len(), 2);
//! ```

use serde_json::{Map, Number};
use std::collections::BTreeMap;

use crate::error::BridgeError;
use crate::path::PropertyPath;
use crate::schema::{ScalarType, Schema, SchemaKind, SchemaNode};
use crate::types::{SECRET_SIG_KEY, SECRET_SIG_VALUE, SECRET_VALUE_KEY, UNKNOWN_VALUE};
use crate::value::{Payload, Scalar, SetValue, Value, ValueKind};

type Json = serde_json::Value;

static JSON_NULL: Json = Json::Null;

/// Decode a resource's JSON inputs or state against its schema.
///
/// A JSON `null` decodes to a null resource. Any other non-object root is an
/// error.
pub fn decode(schema: &Schema, json: &Json) -> Result<Value, BridgeError> {
    let (json, secret) = unwrap_secret(json);
    let obj = match json {
        Json::Null => return Ok(Value::null()),
        Json::Object(obj) => obj,
        other => return Err(BridgeError::unexpected_type("<root>", "object", json_shape(other))),
    };

    let root = PropertyPath::root();
    let mut fields = BTreeMap::new();
    for (key, item) in obj {
        let path = root.key(key.as_str());
        let value = match schema.field(key) {
            Some(node) => decode_node(node, item, &path)?,
            None => decode_untyped(item, &path)?,
        };
        fields.insert(key.clone(), value);
    }
    Ok(Value::known(Payload::Object(fields)).with_secret(secret))
}

/// Decode a JSON value against a single schema node.
pub fn decode_node(node: &SchemaNode, json: &Json, path: &PropertyPath) -> Result<Value, BridgeError> {
    let (json, secret) = unwrap_secret(json);
    if json.is_null() {
        return Ok(Value::null().with_secret(secret));
    }
    if is_unknown(json) {
        return Ok(Value::unknown().with_secret(secret));
    }

    if node.is_singleton() && !json.is_array() {
        let elem = node.element().ok_or_else(|| {
            BridgeError::InvalidValue(format!("singleton at {} has no element schema", path))
        })?;
        return Ok(decode_node(elem, json, path)?.with_secret(secret));
    }

    let value = match (&node.kind, json) {
        (SchemaKind::Scalar(scalar), _) => decode_scalar(*scalar, json, path)?,
        (SchemaKind::List(elem), Json::Array(items)) => {
            if node.is_singleton() && items.len() > 1 {
                return Err(too_many(path, items.len()));
            }
            let items = items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_node(elem, item, &path.index(i)))
                .collect::<Result<Vec<_>, _>>()?;
            Value::list(items)
        },
        (SchemaKind::Set(elem), Json::Array(items)) => {
            if node.is_singleton() && items.len() > 1 {
                return Err(too_many(path, items.len()));
            }
            let items = items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_node(elem, item, &path.index(i)))
                .collect::<Result<Vec<_>, _>>()?;
            let set = SetValue::from_elements(items).map_err(|source| BridgeError::SetHash {
                path: path.to_string(),
                source,
            })?;
            Value::known(Payload::Set(set))
        },
        (SchemaKind::Map(elem), Json::Object(obj)) => {
            let mut entries = BTreeMap::new();
            for (key, item) in obj {
                entries.insert(key.clone(), decode_node(elem, item, &path.key(key.as_str()))?);
            }
            Value::known(Payload::Map(entries))
        },
        (SchemaKind::Block(fields), Json::Object(obj)) => {
            let mut decoded = BTreeMap::new();
            for (key, item) in obj {
                let child = path.key(key.as_str());
                let value = match fields.get(key) {
                    Some(field) => decode_node(field, item, &child)?,
                    None => decode_untyped(item, &child)?,
                };
                decoded.insert(key.clone(), value);
            }
            Value::known(Payload::Object(decoded))
        },
        (_, other) => {
            return Err(BridgeError::unexpected_type(path, node.kind_name(), json_shape(other)));
        },
    };

    Ok(value.with_secret(secret))
}

/// Decode a JSON value that no schema describes.
pub fn decode_untyped(json: &Json, path: &PropertyPath) -> Result<Value, BridgeError> {
    let (json, secret) = unwrap_secret(json);
    let value = match json {
        Json::Null => Value::null(),
        Json::Bool(b) => Value::bool(*b),
        Json::Number(n) => decode_number(n, path)?,
        Json::String(s) if s == UNKNOWN_VALUE => Value::unknown(),
        Json::String(s) => Value::string(s.as_str()),
        Json::Array(items) => Value::list(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| decode_untyped(item, &path.index(i)))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Json::Object(obj) => {
            let mut fields = BTreeMap::new();
            for (key, item) in obj {
                fields.insert(key.clone(), decode_untyped(item, &path.key(key.as_str()))?);
            }
            Value::known(Payload::Object(fields))
        },
    };
    Ok(value.with_secret(secret))
}

fn decode_scalar(scalar: ScalarType, json: &Json, path: &PropertyPath) -> Result<Value, BridgeError> {
    let mismatch = || BridgeError::unexpected_type(path, scalar_name(scalar), json_shape(json));
    match (scalar, json) {
        (ScalarType::String, Json::String(s)) => Ok(Value::string(s.as_str())),
        (ScalarType::Bool, Json::Bool(b)) => Ok(Value::bool(*b)),
        (ScalarType::Int, Json::Number(n)) => match n.as_i64() {
            Some(i) => Ok(Value::int(i)),
            None => n
                .as_f64()
                .and_then(Scalar::integral)
                .map(Value::int)
                .ok_or_else(mismatch),
        },
        (ScalarType::Float, Json::Number(n)) => decode_number(n, path),
        (ScalarType::Dynamic, Json::String(s)) => Ok(Value::string(s.as_str())),
        (ScalarType::Dynamic, Json::Bool(b)) => Ok(Value::bool(*b)),
        (ScalarType::Dynamic, Json::Number(n)) => decode_number(n, path),
        _ => Err(mismatch()),
    }
}

fn decode_number(n: &Number, path: &PropertyPath) -> Result<Value, BridgeError> {
    n.as_i64()
        .map(Value::int)
        .or_else(|| n.as_f64().map(Value::float))
        .ok_or_else(|| BridgeError::InvalidValue(format!("number at {} is out of range", path)))
}

fn too_many(path: &PropertyPath, got: usize) -> BridgeError {
    BridgeError::InvalidValue(format!(
        "{} allows at most 1 element, got {}",
        path, got
    ))
}

/// Strip the secret sentinel, reporting whether it was present.
fn unwrap_secret(json: &Json) -> (&Json, bool) {
    match json {
        Json::Object(obj) if is_secret_sentinel(obj) => match obj.get(SECRET_VALUE_KEY) {
            Some(inner) => (unwrap_secret(inner).0, true),
            None => (&JSON_NULL, true),
        },
        _ => (json, false),
    }
}

fn is_secret_sentinel(obj: &Map<String, Json>) -> bool {
    obj.get(SECRET_SIG_KEY).and_then(Json::as_str) == Some(SECRET_SIG_VALUE)
}

fn is_unknown(json: &Json) -> bool {
    json.as_str() == Some(UNKNOWN_VALUE)
}

/// Encode a value as JSON, wrapping secret nodes in the secret sentinel.
///
/// A secret node nested inside another secret node is not wrapped again.
/// Sets are encoded as arrays in hash order.
pub fn encode(value: &Value) -> Json {
    encode_inner(value, false)
}

fn encode_inner(value: &Value, in_secret: bool) -> Json {
    let wrap = value.is_secret() && !in_secret && !value.is_null();
    let nested_secret = in_secret || value.is_secret();
    let json = match value.kind() {
        ValueKind::Null => Json::Null,
        ValueKind::Unknown => Json::String(UNKNOWN_VALUE.to_string()),
        ValueKind::Known(Payload::Scalar(scalar)) => encode_scalar(scalar),
        ValueKind::Known(Payload::List(items)) => {
            Json::Array(items.iter().map(|v| encode_inner(v, nested_secret)).collect())
        },
        ValueKind::Known(Payload::Set(set)) => {
            Json::Array(set.values().map(|v| encode_inner(v, nested_secret)).collect())
        },
        ValueKind::Known(Payload::Map(entries)) | ValueKind::Known(Payload::Object(entries)) => {
            Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), encode_inner(v, nested_secret)))
                    .collect(),
            )
        },
    };

    if wrap {
        wrap_secret(json)
    } else {
        json
    }
}

/// Wrap a JSON value in the secret sentinel.
pub fn wrap_secret(json: Json) -> Json {
    let mut obj = Map::new();
    obj.insert(SECRET_SIG_KEY.to_string(), Json::String(SECRET_SIG_VALUE.to_string()));
    obj.insert(SECRET_VALUE_KEY.to_string(), json);
    Json::Object(obj)
}

fn encode_scalar(scalar: &Scalar) -> Json {
    match scalar {
        Scalar::Bool(b) => Json::Bool(*b),
        Scalar::Int(i) => Json::Number((*i).into()),
        Scalar::Float(f) => Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Scalar::String(s) => Json::String(s.clone()),
    }
}

fn scalar_name(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::String => "string",
        ScalarType::Int | ScalarType::Float => "number",
        ScalarType::Bool => "bool",
        ScalarType::Dynamic => "scalar",
    }
}

/// A short name for a JSON value's shape.
pub(crate) fn json_shape(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "list",
        Json::Object(_) => "object",
    }
}
