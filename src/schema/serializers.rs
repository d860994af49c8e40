//! Concrete template serializers
//!
//! Each serializer owns a slice of the template's root fields and declares
//! how the fields under it differ between model and schema.

use crate::mapping::{
    CollectionResolver, DecimalFloatResolver, Direction, EnumResolver, FieldMappings, GuidTextResolver,
    OpaquePayloadResolver, PairsMapResolver, PathError, TypeRegistry,
};
use crate::model::AUDIT_FLAGS;

use super::version::SchemaVersion;

/// One serializer of the template provider
pub trait TemplateSerializer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Position in the serializer run, lowest first
    fn sequence(&self) -> u32;

    /// Oldest release this serializer applies to
    fn min_version(&self) -> SchemaVersion {
        SchemaVersion::V201605
    }

    /// Whether the serialized fields are nested objects to recurse into
    fn recursive(&self) -> bool {
        true
    }

    fn supports(&self, version: SchemaVersion) -> bool {
        version >= self.min_version()
    }

    fn field_mappings(&self, direction: Direction, registry: &TypeRegistry) -> Result<FieldMappings, PathError>;
}

fn string_pairs() -> PairsMapResolver {
    PairsMapResolver::new("StringDictionaryItem", "key", "value")
}

/// Identity, revision, descriptive text, properties and parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct BasePropertiesSerializer;

impl TemplateSerializer for BasePropertiesSerializer {
    fn name(&self) -> &'static str {
        "template base properties"
    }

    fn sequence(&self) -> u32 {
        100
    }

    fn recursive(&self) -> bool {
        false
    }

    fn field_mappings(&self, _direction: Direction, registry: &TypeRegistry) -> Result<FieldMappings, PathError> {
        FieldMappings::builder("Template")
            .scope([
                "schema_version",
                "id",
                "version",
                "display_name",
                "description",
                "properties",
                "parameters",
            ])
            // carried by the document header instead
            .ignore("schema_version")
            .resolve("version", DecimalFloatResolver)
            .resolve("properties", string_pairs())
            .resolve("parameters", string_pairs())
            .build(registry)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyBagSerializer;

impl TemplateSerializer for PropertyBagSerializer {
    fn name(&self) -> &'static str {
        "property bag entries"
    }

    fn sequence(&self) -> u32 {
        200
    }

    fn recursive(&self) -> bool {
        false
    }

    fn field_mappings(&self, _direction: Direction, registry: &TypeRegistry) -> Result<FieldMappings, PathError> {
        FieldMappings::builder("Template")
            .scope(["property_bag"])
            .resolve("property_bag", PairsMapResolver::new("PropertyBagEntry", "key", "value"))
            .build(registry)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListInstancesSerializer;

impl TemplateSerializer for ListInstancesSerializer {
    fn name(&self) -> &'static str {
        "list instances"
    }

    fn sequence(&self) -> u32 {
        300
    }

    fn field_mappings(&self, _direction: Direction, registry: &TypeRegistry) -> Result<FieldMappings, PathError> {
        FieldMappings::builder("Template")
            .scope(["lists"])
            .resolve("lists[0].field_refs[0].id", GuidTextResolver)
            .resolve(
                "lists[0].field_defaults",
                PairsMapResolver::new("FieldDefault", "field_name", "value"),
            )
            .resolve(
                "lists[0].data_rows[0].values",
                PairsMapResolver::new("DataValue", "field_name", "value"),
            )
            .resolve("lists[0].views", CollectionResolver::of("View"))
            .resolve("lists[0].views[0].schema_xml", OpaquePayloadResolver)
            .resolve("lists[0].folders", CollectionResolver::of("Folder"))
            .resolve(
                "lists[0].user_custom_actions[0].command_ui_extension",
                OpaquePayloadResolver,
            )
            .build(registry)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowsSerializer;

impl TemplateSerializer for WorkflowsSerializer {
    fn name(&self) -> &'static str {
        "workflows"
    }

    fn sequence(&self) -> u32 {
        400
    }

    fn field_mappings(&self, _direction: Direction, registry: &TypeRegistry) -> Result<FieldMappings, PathError> {
        FieldMappings::builder("Template")
            .scope(["workflow_definitions", "workflow_subscriptions"])
            .resolve("workflow_definitions[0].id", GuidTextResolver)
            .resolve("workflow_definitions[0].properties", string_pairs())
            .resolve("workflow_subscriptions[0].definition_id", GuidTextResolver)
            .resolve("workflow_subscriptions[0].property_definitions", string_pairs())
            .build(registry)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditSettingsSerializer;

impl TemplateSerializer for AuditSettingsSerializer {
    fn name(&self) -> &'static str {
        "audit settings"
    }

    fn sequence(&self) -> u32 {
        500
    }

    fn min_version(&self) -> SchemaVersion {
        SchemaVersion::V201705
    }

    fn field_mappings(&self, _direction: Direction, registry: &TypeRegistry) -> Result<FieldMappings, PathError> {
        FieldMappings::builder("Template")
            .scope(["audit_settings"])
            .resolve("audit_settings.audit_flags", EnumResolver::flags(AUDIT_FLAGS))
            .build(registry)
    }
}

/// Every serializer in run order
pub fn standard_serializers() -> Vec<Box<dyn TemplateSerializer>> {
    let mut serializers: Vec<Box<dyn TemplateSerializer>> = vec![
        Box::new(BasePropertiesSerializer),
        Box::new(PropertyBagSerializer),
        Box::new(ListInstancesSerializer),
        Box::new(WorkflowsSerializer),
        Box::new(AuditSettingsSerializer),
    ];
    serializers.sort_by_key(|s| s.sequence());
    serializers
}
