//! Versioned wire schema: descriptors, serializers and the JSON document

mod descriptors;
mod document;
mod error;
mod provider;
mod serializers;
mod version;

pub use descriptors::register_schema_types;
pub use document::{read_document, read_version, write_document};
pub use error::{DocumentError, SerializationError};
pub use provider::{Deserialized, Serialized, TemplateProvider};
pub use serializers::{
    standard_serializers, AuditSettingsSerializer, BasePropertiesSerializer, ListInstancesSerializer,
    PropertyBagSerializer, TemplateSerializer, WorkflowsSerializer,
};
pub use version::{SchemaVersion, UnknownVersion};
