//! Dynamic objects and their type identity

use std::collections::BTreeMap;
use std::fmt;

use crate::mapping::TypeDescriptor;
use crate::schema::SchemaVersion;

use super::value::{Value, ValueError};

/// The object graph a type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Version-independent template model
    Model,
    /// Wire representation of one schema release
    Schema(SchemaVersion),
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Model => write!(f, "model"),
            Namespace::Schema(version) => write!(f, "schema {}", version),
        }
    }
}

/// Identity of a registered type: namespace plus logical entity name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    pub namespace: Namespace,
    pub entity: String,
}

impl TypeKey {
    pub fn new(namespace: Namespace, entity: impl Into<String>) -> Self {
        Self {
            namespace,
            entity: entity.into(),
        }
    }

    pub fn model(entity: impl Into<String>) -> Self {
        Self::new(Namespace::Model, entity)
    }

    pub fn schema(version: SchemaVersion, entity: impl Into<String>) -> Self {
        Self::new(Namespace::Schema(version), entity)
    }

    /// The same entity in another namespace
    pub fn in_namespace(&self, namespace: Namespace) -> Self {
        Self::new(namespace, self.entity.clone())
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.entity, self.namespace)
    }
}

/// A node of a model or schema object graph
///
/// Fields are stored by name; the set of names an object may carry is given
/// by the [`TypeDescriptor`] registered for its [`TypeKey`].
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    key: TypeKey,
    fields: BTreeMap<String, Value>,
}

impl Object {
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            fields: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn entity(&self) -> &str {
        &self.key.entity
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut Value> {
        self.fields.get_mut(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Builder-style [`Object::set`]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value.into());
        self
    }

    /// Remove a field's value, leaving it unset
    pub fn take(&mut self, field: &str) -> Value {
        self.fields.remove(field).unwrap_or(Value::Null)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

/// A typed model node with a declared field list
///
/// Implemented through the `model_object!` macro, which keeps the declared
/// field list, the struct definition and the dynamic conversions in sync.
pub trait ModelObject: Sized {
    /// Logical entity name shared with the schema representations
    const ENTITY: &'static str;

    fn descriptor() -> TypeDescriptor;
    fn to_object(&self) -> Object;
    fn from_object(object: &Object) -> Result<Self, ValueError>;
}
