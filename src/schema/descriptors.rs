//! Wire types of each schema release
//!
//! Every entity is registered for every release; what changes between
//! releases is which fields an entity declares.

use crate::mapping::{MappingError, TypeDescriptor, TypeRegistry};
use crate::model::{FieldType, TypeKey};

use super::version::SchemaVersion;

/// Register the schema types of `version`
pub fn register_schema_types(registry: &mut TypeRegistry, version: SchemaVersion) -> Result<(), MappingError> {
    use FieldType::*;

    let v1705 = version >= SchemaVersion::V201705;
    let v1801 = version >= SchemaVersion::V201801;
    let ty = |entity: &str| TypeDescriptor::new(TypeKey::schema(version, entity));
    let text_list = FieldType::list(Text);

    registry.register(
        ty("Template")
            .field("id", Text)
            .field("version", Decimal)
            .field_if(v1801, "display_name", Text)
            .field("description", Text)
            .field("properties", FieldType::objects("StringDictionaryItem"))
            .field("parameters", FieldType::objects("StringDictionaryItem"))
            .field("property_bag", FieldType::objects("PropertyBagEntry"))
            .field("lists", FieldType::objects("ListInstance"))
            .field("workflow_definitions", FieldType::objects("WorkflowDefinition"))
            .field("workflow_subscriptions", FieldType::objects("WorkflowSubscription"))
            .field_if(v1705, "audit_settings", Object("AuditSettings".to_string())),
    )?;

    registry.register(ty("StringDictionaryItem").field("key", Text).field("value", Text))?;
    registry.register(ty("PropertyBagEntry").field("key", Text).field("value", Text))?;

    registry.register(
        ty("ListInstance")
            .field("title", Text)
            .field("url", Text)
            .field("description", Text)
            .field("template_type", Int)
            .field("enable_versioning", Bool)
            .field("remove_existing_views", Bool)
            .field("field_refs", FieldType::objects("FieldRef"))
            .field("field_defaults", FieldType::objects("FieldDefault"))
            .field("data_rows", FieldType::objects("DataRow"))
            .field("views", FieldType::objects("View"))
            .field_if(v1705, "folders", FieldType::objects("Folder"))
            .field("user_custom_actions", FieldType::objects("CustomAction")),
    )?;
    registry.register(
        ty("FieldRef")
            .field("id", Text)
            .field("name", Text)
            .field_if(v1801, "display_name", Text)
            .field("required", Bool)
            .field("hidden", Bool),
    )?;
    registry.register(ty("FieldDefault").field("field_name", Text).field("value", Text))?;
    registry.register(ty("DataRow").field("values", FieldType::objects("DataValue")))?;
    registry.register(ty("DataValue").field("field_name", Text).field("value", Text))?;
    registry.register(ty("View").field("schema_xml", Any))?;
    registry.register(
        ty("Folder")
            .field("name", Text)
            .field("folders", FieldType::objects("Folder")),
    )?;
    registry.register(
        ty("CustomAction")
            .field("name", Text)
            .field("location", Text)
            .field("sequence", Int)
            .field("url", Text)
            .field("command_ui_extension", Any),
    )?;

    registry.register(
        ty("WorkflowDefinition")
            .field("id", Text)
            .field("display_name", Text)
            .field("description", Text)
            .field("association_url", Text)
            .field("initiation_url", Text)
            .field("form_field", Text)
            .field("draft_version", Text)
            .field("published", Bool)
            .field("requires_association_form", Bool)
            .field("requires_initiation_form", Bool)
            .field("restrict_to_scope", Text)
            .field("restrict_to_type", Text)
            .field("xaml_path", Text)
            .field("properties", FieldType::objects("StringDictionaryItem")),
    )?;
    registry.register(
        ty("WorkflowSubscription")
            .field("definition_id", Text)
            .field("name", Text)
            .field("enabled", Bool)
            .field("event_source_id", Text)
            .field("event_types", text_list)
            .field("list_id", Text)
            .field("manual_start_bypasses_activation_limit", Bool)
            .field_if(v1705, "parent_content_type_id", Text)
            .field("status_field_name", Text)
            .field("property_definitions", FieldType::objects("StringDictionaryItem")),
    )?;

    registry.register(
        ty("AuditSettings")
            .field("audit_flags", Text)
            .field("audit_log_trimming_retention", Int)
            .field("trim_audit_log", Bool),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_versions_add_fields() {
        let registry = TypeRegistry::standard().unwrap();
        let list = |v| registry.describe(&TypeKey::schema(v, "ListInstance")).unwrap();
        assert!(list(SchemaVersion::V201605).field_named("folders").is_none());
        assert!(list(SchemaVersion::V201705).field_named("folders").is_some());

        let template = |v| registry.describe(&TypeKey::schema(v, "Template")).unwrap();
        assert!(template(SchemaVersion::V201705).field_named("display_name").is_none());
        assert!(template(SchemaVersion::V201801).field_named("display_name").is_some());
        assert_eq!(
            template(SchemaVersion::V201605).field_named("version").map(|f| &f.ty),
            Some(&FieldType::Decimal)
        );
    }

    #[test]
    fn test_registering_a_version_twice_fails() {
        let mut registry = TypeRegistry::new();
        register_schema_types(&mut registry, SchemaVersion::V201605).unwrap();
        let err = register_schema_types(&mut registry, SchemaVersion::V201605).unwrap_err();
        assert!(matches!(err, MappingError::DuplicateType { .. }));
    }
}
