//! Shared fixtures and proptest strategies for the integration tests

#![allow(dead_code)]

use proptest::collection::{btree_map, vec};
use proptest::option;
use proptest::prelude::*;
use std::collections::BTreeMap;
use uuid::Uuid;

use template_provisioner::model::{
    AuditSettings, CustomAction, DataRow, FieldRef, Folder, ListInstance, Payload, Template, View,
    WorkflowDefinition, WorkflowSubscription, AUDIT_FLAGS, UNIVERSAL_RESTRICTION,
};
use template_provisioner::schema::SchemaVersion;

pub fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9]{0,7}"
}

pub fn text_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ./<>=\"-]{0,16}"
}

pub fn pairs_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    btree_map(name_strategy(), text_strategy(), 0..4)
}

pub fn guid_strategy() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

fn folder_strategy() -> impl Strategy<Value = Folder> {
    (name_strategy(), vec(name_strategy(), 0..3)).prop_map(|(name, children)| Folder {
        name,
        folders: children.into_iter().map(Folder::new).collect(),
    })
}

fn field_ref_strategy(version: SchemaVersion) -> impl Strategy<Value = FieldRef> {
    (
        guid_strategy(),
        name_strategy(),
        option::of(text_strategy()),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(move |(id, name, display_name, required, hidden)| FieldRef {
            id,
            name,
            display_name: display_name.filter(|_| version >= SchemaVersion::V201801),
            required,
            hidden,
        })
}

/// Template revisions, including fractions a float cannot hold exactly
pub fn template_version_strategy() -> impl Strategy<Value = f64> {
    prop_oneof![
        (0u32..2000).prop_map(|n| f64::from(n) / 10.0),
        -1.0e9f64..1.0e9,
        (1u32..1000, 1u32..1000).prop_map(|(a, b)| f64::from(a) / f64::from(b)),
    ]
}

/// View markup as text, or structured content as a document would carry it
pub fn payload_strategy() -> impl Strategy<Value = Payload> {
    prop_oneof![
        text_strategy().prop_map(Payload::Text),
        btree_map(name_strategy(), name_strategy(), 0..3)
            .prop_map(|map| Payload::Structured(serde_json::to_string(&map).unwrap_or_default())),
    ]
}

fn custom_action_strategy() -> impl Strategy<Value = CustomAction> {
    (
        name_strategy(),
        text_strategy(),
        any::<i32>(),
        text_strategy(),
        text_strategy(),
    )
        .prop_map(|(name, location, sequence, url, command_ui_extension)| CustomAction {
            name,
            location,
            sequence,
            url,
            command_ui_extension: command_ui_extension.into(),
        })
}

/// A list using only the fields `version` declares
pub fn list_strategy(version: SchemaVersion) -> impl Strategy<Value = ListInstance> {
    let header = (
        text_strategy(),
        name_strategy(),
        text_strategy(),
        any::<i32>(),
        any::<bool>(),
        any::<bool>(),
    );
    let children = (
        vec(field_ref_strategy(version), 0..3),
        pairs_strategy(),
        vec(pairs_strategy().prop_map(|values| DataRow { values }), 0..3),
        vec(payload_strategy().prop_map(|schema_xml| View { schema_xml }), 0..4),
        vec(folder_strategy(), 0..3),
        vec(custom_action_strategy(), 0..2),
    );
    (header, children).prop_map(
        move |(
            (title, url, description, template_type, enable_versioning, remove_existing_views),
            (field_refs, field_defaults, data_rows, views, folders, user_custom_actions),
        )| ListInstance {
            title,
            url: format!("lists/{}", url),
            description,
            template_type,
            enable_versioning,
            remove_existing_views,
            field_refs,
            field_defaults,
            data_rows,
            views,
            folders: if version >= SchemaVersion::V201705 {
                folders
            } else {
                Vec::new()
            },
            user_custom_actions,
        },
    )
}

fn workflow_definition_strategy() -> impl Strategy<Value = WorkflowDefinition> {
    (
        guid_strategy(),
        name_strategy(),
        text_strategy(),
        any::<bool>(),
        prop::sample::select(vec![UNIVERSAL_RESTRICTION, "List", "Site"]),
        pairs_strategy(),
    )
        .prop_map(
            |(id, display_name, description, published, restrict_to_type, properties)| WorkflowDefinition {
                id,
                xaml_path: format!("{}.xaml", id),
                display_name,
                description,
                published,
                restrict_to_type: restrict_to_type.to_string(),
                properties,
                ..WorkflowDefinition::default()
            },
        )
}

fn workflow_subscription_strategy(version: SchemaVersion) -> impl Strategy<Value = WorkflowSubscription> {
    (
        guid_strategy(),
        name_strategy(),
        any::<bool>(),
        vec(name_strategy(), 0..3),
        option::of(name_strategy().prop_map(|title| format!("{{listid:{}}}", title))),
        "0x01[0-9A-F]{0,6}",
        pairs_strategy(),
    )
        .prop_map(
            move |(definition_id, name, enabled, event_types, list_id, content_type, property_definitions)| {
                WorkflowSubscription {
                    definition_id,
                    name,
                    enabled,
                    event_source_id: list_id.clone().unwrap_or_default(),
                    event_types,
                    list_id,
                    parent_content_type_id: if version >= SchemaVersion::V201705 {
                        content_type
                    } else {
                        String::new()
                    },
                    property_definitions,
                    ..WorkflowSubscription::default()
                }
            },
        )
}

fn audit_strategy() -> impl Strategy<Value = AuditSettings> {
    let bits: Vec<i64> = AUDIT_FLAGS.iter().map(|(_, v)| *v).filter(|v| *v > 0).collect();
    (prop::sample::subsequence(bits, 0..5), 0..365i32, any::<bool>()).prop_map(
        |(flags, audit_log_trimming_retention, trim_audit_log)| AuditSettings {
            audit_flags: flags.into_iter().fold(0, |mask, bit| mask | bit),
            audit_log_trimming_retention,
            trim_audit_log,
        },
    )
}

/// A template restricted to the fields `version` declares
pub fn template_strategy(version: SchemaVersion) -> impl Strategy<Value = Template> {
    let base = (
        name_strategy(),
        template_version_strategy(),
        option::of(text_strategy()),
        text_strategy(),
        pairs_strategy(),
        pairs_strategy(),
        pairs_strategy(),
    );
    let body = (
        vec(list_strategy(version), 0..3),
        vec(workflow_definition_strategy(), 0..3),
        vec(workflow_subscription_strategy(version), 0..3),
        option::of(audit_strategy()),
    );
    (base, body).prop_map(
        move |(
            (id, revision, display_name, description, properties, parameters, property_bag),
            (lists, workflow_definitions, workflow_subscriptions, audit_settings),
        )| Template {
            schema_version: None,
            id,
            version: revision,
            display_name: display_name.filter(|_| version >= SchemaVersion::V201801),
            description,
            properties,
            parameters,
            property_bag,
            lists,
            workflow_definitions,
            workflow_subscriptions,
            audit_settings: audit_settings.filter(|_| version >= SchemaVersion::V201705),
        },
    )
}

pub fn versioned_template_strategy() -> impl Strategy<Value = (SchemaVersion, Template)> {
    prop::sample::select(SchemaVersion::ALL.to_vec())
        .prop_flat_map(|version| template_strategy(version).prop_map(move |t| (version, t)))
}

/// A hand-written template touching every serializer
pub fn sample_template(version: SchemaVersion) -> Template {
    let mut template = Template::new("PROJECT-SITE");
    template.version = 3.5;
    template.description = "Project site".into();
    template.properties.insert("Owner".into(), "PMO".into());
    template.parameters.insert("Department".into(), "Finance".into());
    template
        .property_bag
        .insert("projects_list".into(), "{listid:Projects}".into());

    let mut list = ListInstance::new("Projects", "lists/projects");
    list.enable_versioning = true;
    list.field_refs.push(FieldRef {
        id: Uuid::from_u128(0x2222_2222_2222_2222_2222_2222_2222_2222),
        name: "Status".into(),
        display_name: None,
        required: true,
        hidden: false,
    });
    list.field_defaults.insert("Status".into(), "Active".into());
    list.data_rows.push(DataRow::new([("Title", "Kickoff"), ("Status", "Active")]));
    list.views = ["<View Name='A'/>", "<View Name='B'/>", "<View Name='C'/>"]
        .into_iter()
        .map(|xml| View {
            schema_xml: xml.into(),
        })
        .collect();
    list.user_custom_actions.push(CustomAction {
        name: "Export".into(),
        location: "CommandUI.Ribbon".into(),
        sequence: 10,
        url: "~site/export.aspx".into(),
        command_ui_extension: "<CommandUIExtension/>".into(),
    });
    template.lists.push(list);

    let definition_id = Uuid::from_u128(0x3333_3333_3333_3333_3333_3333_3333_3333);
    template.workflow_definitions.push(WorkflowDefinition {
        id: definition_id,
        display_name: "Approve project".into(),
        published: true,
        restrict_to_type: "List".into(),
        xaml_path: format!("{}.xaml", definition_id),
        ..WorkflowDefinition::default()
    });
    template.workflow_subscriptions.push(WorkflowSubscription {
        definition_id,
        name: "Approve on add".into(),
        enabled: true,
        event_source_id: "{listid:Projects}".into(),
        event_types: vec!["ItemAdded".into()],
        list_id: Some("{listid:Projects}".into()),
        ..WorkflowSubscription::default()
    });

    if version >= SchemaVersion::V201705 {
        template.lists[0].folders = vec![
            Folder::new("2024").with_folder(Folder::new("Q1")),
            Folder::new("2025"),
        ];
        template.workflow_subscriptions[0].parent_content_type_id = "0x0100".into();
        template.audit_settings = Some(AuditSettings {
            audit_flags: 2 | 8 | 16,
            audit_log_trimming_retention: 90,
            trim_audit_log: true,
        });
    }
    if version >= SchemaVersion::V201801 {
        template.display_name = Some("Project site".into());
        template.lists[0].field_refs[0].display_name = Some("Project status".into());
    }
    template
}
