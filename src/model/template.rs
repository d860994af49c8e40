//! The template aggregate and its list definitions

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::schema::SchemaVersion;

use super::audit::AuditSettings;
use super::value::Payload;
use super::workflow::{WorkflowDefinition, WorkflowSubscription};

model_object! {
    /// The canonical provisioning configuration document
    pub struct Template as "Template" {
        /// Schema release the template was read from or is targeted at
        pub schema_version: Option<SchemaVersion>,
        pub id: String,
        /// Author-controlled template revision
        pub version: f64,
        pub display_name: Option<String>,
        pub description: String,
        /// Free-form template metadata
        pub properties: BTreeMap<String, String>,
        /// Values available to `{parameter:Name}` tokens
        pub parameters: BTreeMap<String, String>,
        /// Entries written to the site's property bag
        pub property_bag: BTreeMap<String, String>,
        pub lists: Vec<ListInstance>,
        pub workflow_definitions: Vec<WorkflowDefinition>,
        pub workflow_subscriptions: Vec<WorkflowSubscription>,
        pub audit_settings: Option<AuditSettings>,
    }
}

model_object! {
    /// A list or library to provision
    pub struct ListInstance as "ListInstance" {
        pub title: String,
        /// Site-relative URL, e.g. `lists/Projects`
        pub url: String,
        pub description: String,
        pub template_type: i32,
        pub enable_versioning: bool,
        pub remove_existing_views: bool,
        pub field_refs: Vec<FieldRef>,
        /// Default value per field internal name
        pub field_defaults: BTreeMap<String, String>,
        pub data_rows: Vec<DataRow>,
        /// Views in display order
        pub views: Vec<View>,
        /// Folder tree, siblings in creation order
        pub folders: Vec<Folder>,
        pub user_custom_actions: Vec<CustomAction>,
    }
}

model_object! {
    /// Reference from a list to an existing site field
    pub struct FieldRef as "FieldRef" {
        pub id: Uuid,
        pub name: String,
        pub display_name: Option<String>,
        pub required: bool,
        pub hidden: bool,
    }
}

model_object! {
    /// One list item to create; values keyed by field internal name
    pub struct DataRow as "DataRow" {
        pub values: BTreeMap<String, String>,
    }
}

model_object! {
    pub struct View as "View" {
        pub schema_xml: Payload,
    }
}

model_object! {
    pub struct Folder as "Folder" {
        pub name: String,
        pub folders: Vec<Folder>,
    }
}

model_object! {
    pub struct CustomAction as "CustomAction" {
        pub name: String,
        pub location: String,
        pub sequence: i32,
        pub url: String,
        /// Ribbon extension markup, kept verbatim
        pub command_ui_extension: Payload,
    }
}

impl Template {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: 1.0,
            ..Self::default()
        }
    }

    /// Find a list definition by title, ignoring case
    pub fn list(&self, title: &str) -> Option<&ListInstance> {
        self.lists
            .iter()
            .find(|l| l.title.eq_ignore_ascii_case(title))
    }
}

impl ListInstance {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            template_type: 100,
            ..Self::default()
        }
    }
}

impl DataRow {
    pub fn new<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Folder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            folders: Vec::new(),
        }
    }

    pub fn with_folder(mut self, folder: Folder) -> Self {
        self.folders.push(folder);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldType, ModelObject, Value};

    #[test]
    fn test_descriptor_lists_declared_fields_in_order() {
        let desc = ListInstance::descriptor();
        let names: Vec<_> = desc.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names[0], "title");
        assert_eq!(names[1], "url");
        assert_eq!(
            desc.field_named("views").map(|f| &f.ty),
            Some(&FieldType::objects("View"))
        );
    }

    #[test]
    fn test_to_object_and_back() {
        let folder = Folder::new("2024").with_folder(Folder::new("Q1"));
        let object = folder.to_object();
        assert_eq!(object.entity(), "Folder");
        assert!(matches!(object.get("folders"), Some(Value::List(items)) if items.len() == 1));
        assert_eq!(Folder::from_object(&object), Ok(folder));
    }

    #[test]
    fn test_from_object_reports_field_path() {
        let object = ListInstance::new("Docs", "lists/docs")
            .to_object()
            .with("template_type", "not a number");
        let err = ListInstance::from_object(&object).unwrap_err();
        assert_eq!(err.field.as_deref(), Some("template_type"));
    }

    #[test]
    fn test_list_lookup_ignores_case() {
        let mut template = Template::new("t");
        template.lists.push(ListInstance::new("MyList", "lists/mylist"));
        assert!(template.list("mylist").is_some());
        assert!(template.list("other").is_none());
    }
}
