//! Workflow definitions and subscriptions

use std::collections::BTreeMap;

use uuid::Uuid;

model_object! {
    /// A workflow definition to save (and optionally publish) on the site
    pub struct WorkflowDefinition as "WorkflowDefinition" {
        pub id: Uuid,
        pub display_name: String,
        pub description: String,
        pub association_url: String,
        pub initiation_url: String,
        pub form_field: String,
        pub draft_version: String,
        pub published: bool,
        pub requires_association_form: bool,
        pub requires_initiation_form: bool,
        pub restrict_to_scope: String,
        /// `Universal`, `List` or `Site`
        pub restrict_to_type: String,
        /// Connector-relative path of the XAML body
        pub xaml_path: String,
        pub properties: BTreeMap<String, String>,
    }
}

model_object! {
    /// Binding of a workflow definition to a list or to the site
    pub struct WorkflowSubscription as "WorkflowSubscription" {
        pub definition_id: Uuid,
        pub name: String,
        pub enabled: bool,
        /// Id of the list or site the subscription was read from; provisioning
        /// derives the event source from `list_id` instead
        pub event_source_id: String,
        pub event_types: Vec<String>,
        /// `{listid:Title}` token for list workflows, unset for site workflows
        pub list_id: Option<String>,
        pub manual_start_bypasses_activation_limit: bool,
        pub parent_content_type_id: String,
        pub status_field_name: String,
        pub property_definitions: BTreeMap<String, String>,
    }
}

/// Restriction type stored when the remote definition has none
pub const UNIVERSAL_RESTRICTION: &str = "Universal";
