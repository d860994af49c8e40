//! JSON persistence of schema object graphs
//!
//! ```json
//! { "schema_version": "2017-05", "template": { "id": "...", ... } }
//! ```
//!
//! The version header is read first and selects the descriptors used to
//! decode the body. Decimals and GUIDs travel as strings. Opaque payloads
//! are written back the way they were read: text as a string, structured
//! content as JSON.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value as Json};

use crate::mapping::TypeRegistry;
use crate::model::{FieldType, Object, Payload, TypeKey, Value};

use super::error::DocumentError;
use super::version::SchemaVersion;

const VERSION_KEY: &str = "schema_version";
const TEMPLATE_KEY: &str = "template";

/// Serialize a schema template root as a versioned JSON document
pub fn write_document(
    registry: &TypeRegistry,
    root: &Object,
    version: SchemaVersion,
) -> Result<String, DocumentError> {
    let mut document = Map::new();
    document.insert(VERSION_KEY.to_string(), Json::String(version.as_str().to_string()));
    document.insert(TEMPLATE_KEY.to_string(), encode_object(registry, root));
    Ok(serde_json::to_string_pretty(&Json::Object(document))?)
}

/// Read the version header of a document without decoding the body
pub fn read_version(input: &str) -> Result<SchemaVersion, DocumentError> {
    let document: Json = serde_json::from_str(input)?;
    version_of(&document)
}

fn version_of(document: &Json) -> Result<SchemaVersion, DocumentError> {
    let raw = document
        .get(VERSION_KEY)
        .and_then(Json::as_str)
        .ok_or(DocumentError::MissingVersion)?;
    Ok(SchemaVersion::from_str(raw)?)
}

/// Parse a document into its version and schema template root
pub fn read_document(registry: &TypeRegistry, input: &str) -> Result<(SchemaVersion, Object), DocumentError> {
    let document: Json = serde_json::from_str(input)?;
    let version = version_of(&document)?;
    let body = document.get(TEMPLATE_KEY).ok_or(DocumentError::MissingTemplate)?;
    let key = TypeKey::schema(version, "Template");
    let root = decode_object(registry, &key, body, TEMPLATE_KEY)?;
    Ok((version, root))
}

fn encode_object(registry: &TypeRegistry, object: &Object) -> Json {
    let mut map = Map::new();
    // declared order where the type is known, stored order otherwise
    match registry.describe(object.key()) {
        Ok(desc) => {
            for field in desc.fields() {
                let value = object.get(&field.name).unwrap_or(&Value::Null);
                map.insert(field.name.clone(), encode_value(registry, value));
            }
        }
        Err(_) => {
            for (name, value) in object.fields() {
                map.insert(name.to_string(), encode_value(registry, value));
            }
        }
    }
    Json::Object(map)
}

fn encode_value(registry: &TypeRegistry, value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Decimal(d) => Json::String(d.to_string()),
        Value::Text(s) | Value::Raw(Payload::Text(s)) => Json::String(s.clone()),
        Value::Raw(Payload::Structured(s)) => serde_json::from_str(s).unwrap_or_else(|_| Json::String(s.clone())),
        Value::Guid(g) => Json::String(g.hyphenated().to_string()),
        Value::List(items) => Json::Array(items.iter().map(|v| encode_value(registry, v)).collect()),
        Value::Map(map) => Json::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), Json::String(v.clone())))
                .collect(),
        ),
        Value::Object(object) => encode_object(registry, object),
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn decode_object(registry: &TypeRegistry, key: &TypeKey, json: &Json, path: &str) -> Result<Object, DocumentError> {
    let fields = json
        .as_object()
        .ok_or_else(|| DocumentError::invalid(path, key.entity.clone(), json_kind(json)))?;
    let desc = registry
        .describe(key)
        .map_err(|_| DocumentError::invalid(path, key.entity.clone(), "unregistered type"))?;
    let mut object = Object::new(key.clone());
    for field in desc.fields() {
        let field_path = format!("{}.{}", path, field.name);
        let value = match fields.get(&field.name) {
            Some(json) => decode_value(registry, key, &field.ty, json, &field_path)?,
            None => field.ty.default_value(),
        };
        object.set(field.name.clone(), value);
    }
    for name in fields.keys().filter(|n| desc.field_named(n).is_none()) {
        tracing::debug!(field = %format!("{}.{}", path, name), version = %key.namespace, "ignoring undeclared field");
    }
    Ok(object)
}

fn decode_value(
    registry: &TypeRegistry,
    owner: &TypeKey,
    ty: &FieldType,
    json: &Json,
    path: &str,
) -> Result<Value, DocumentError> {
    if json.is_null() {
        return Ok(ty.default_value());
    }
    let invalid = || DocumentError::invalid(path, ty.to_string(), json_kind(json));
    let value = match ty {
        FieldType::Bool => Value::Bool(json.as_bool().ok_or_else(invalid)?),
        FieldType::Int | FieldType::Int32 => Value::Int(json.as_i64().ok_or_else(invalid)?),
        FieldType::Float => Value::Float(json.as_f64().ok_or_else(invalid)?),
        FieldType::Decimal => {
            let parsed = match json {
                Json::String(s) => Decimal::from_str(s).ok(),
                Json::Number(n) => Decimal::from_str(&n.to_string()).ok(),
                _ => None,
            };
            Value::Decimal(parsed.ok_or_else(invalid)?)
        }
        FieldType::Text => Value::Text(json.as_str().ok_or_else(invalid)?.to_string()),
        FieldType::Guid => {
            let text = json.as_str().ok_or_else(invalid)?;
            Value::Guid(uuid::Uuid::parse_str(text).map_err(|_| invalid())?)
        }
        FieldType::Map => {
            let entries = json.as_object().ok_or_else(invalid)?;
            let mut map = std::collections::BTreeMap::new();
            for (k, v) in entries {
                let text = v
                    .as_str()
                    .ok_or_else(|| DocumentError::invalid(format!("{}.{}", path, k), "text", json_kind(v)))?;
                map.insert(k.clone(), text.to_string());
            }
            Value::Map(map)
        }
        FieldType::Any => match json {
            Json::String(s) => Value::Raw(Payload::Text(s.clone())),
            other => Value::Raw(Payload::Structured(other.to_string())),
        },
        FieldType::Object(entity) => {
            let key = TypeKey::new(owner.namespace, entity.clone());
            Value::Object(decode_object(registry, &key, json, path)?)
        }
        FieldType::List(inner) => {
            let items = json.as_array().ok_or_else(invalid)?;
            let mut values = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, index);
                values.push(decode_value(registry, owner, inner, item, &item_path)?);
            }
            Value::List(values)
        }
    };
    Ok(value)
}
