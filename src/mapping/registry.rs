//! Type registry: declared field lists and factories per (namespace, entity)

use std::collections::HashMap;

use crate::model::{register_model_types, FieldType, Namespace, Object, TypeKey};
use crate::schema::{register_schema_types, SchemaVersion};

use super::error::MappingError;

/// A declared field of a registered type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: FieldType,
}

/// The declared shape of one model or schema type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    key: TypeKey,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn new(key: TypeKey) -> Self {
        Self {
            key,
            fields: Vec::new(),
        }
    }

    /// Append a declared field
    pub fn field(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.fields.push(FieldDescriptor {
            name: name.into(),
            ty,
        });
        self
    }

    /// Append a declared field only when `condition` holds
    pub fn field_if(self, condition: bool, name: impl Into<String>, ty: FieldType) -> Self {
        if condition {
            self.field(name, ty)
        } else {
            self
        }
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_named(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Registry of type descriptors, consulted instead of runtime reflection
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<TypeKey, TypeDescriptor>,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the model types and every supported schema version
    pub fn standard() -> Result<Self, MappingError> {
        let mut registry = Self::new();
        register_model_types(&mut registry)?;
        for version in SchemaVersion::ALL {
            register_schema_types(&mut registry, version)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<(), MappingError> {
        if self.types.contains_key(descriptor.key()) {
            return Err(MappingError::DuplicateType {
                key: descriptor.key().clone(),
            });
        }
        self.types.insert(descriptor.key().clone(), descriptor);
        Ok(())
    }

    pub fn describe(&self, key: &TypeKey) -> Result<&TypeDescriptor, MappingError> {
        self.types
            .get(key)
            .ok_or_else(|| MappingError::unknown_type(key.clone()))
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.types.contains_key(key)
    }

    /// Keys of every type registered in `namespace`, sorted
    pub fn keys_in(&self, namespace: Namespace) -> Vec<&TypeKey> {
        let mut keys: Vec<_> = self
            .types
            .keys()
            .filter(|k| k.namespace == namespace)
            .collect();
        keys.sort();
        keys
    }

    /// Construct an instance of `key` with every declared field at its default
    pub fn instantiate(&self, key: &TypeKey) -> Result<Object, MappingError> {
        let desc = self.describe(key)?;
        let mut object = Object::new(key.clone());
        for field in desc.fields() {
            object.set(field.name.clone(), field.ty.default_value());
        }
        Ok(object)
    }
}
