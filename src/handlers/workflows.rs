use std::collections::HashMap;

use uuid::Uuid;

use crate::model::{Template, WorkflowDefinition, WorkflowSubscription, UNIVERSAL_RESTRICTION};
use crate::remote::{RemoteSubscription, SiteConnection};
use crate::token::{Entity, EntityKind, TokenParser};

use super::lists::ListsHandler;
use super::{parse_values, ExtractionOptions, HandlerError, ObjectHandler};

/// Workflow definitions and their list or site subscriptions
///
/// List subscriptions refer to their list through a `{listid:Title}` token,
/// so lists must be provisioned first.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowsHandler;

impl WorkflowsHandler {
    pub const NAME: &'static str = "workflows";
}

impl ObjectHandler for WorkflowsHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn requires(&self) -> &'static [&'static str] {
        &[ListsHandler::NAME]
    }

    fn will_extract(&self, _site: &dyn SiteConnection, _template: &Template, _options: &ExtractionOptions) -> bool {
        true
    }

    fn will_provision(&self, _site: &dyn SiteConnection, template: &Template) -> bool {
        !template.workflow_definitions.is_empty() || !template.workflow_subscriptions.is_empty()
    }

    fn extract(
        &self,
        site: &dyn SiteConnection,
        mut template: Template,
        _options: &ExtractionOptions,
    ) -> Result<Template, HandlerError> {
        for remote in site.workflow_definitions()? {
            if template.workflow_definitions.iter().any(|d| d.id == remote.id) {
                continue;
            }
            let restrict_to_type = if remote.restrict_to_type.is_empty() {
                UNIVERSAL_RESTRICTION.to_string()
            } else {
                remote.restrict_to_type.clone()
            };
            template.workflow_definitions.push(WorkflowDefinition {
                xaml_path: format!("{}.xaml", remote.id),
                restrict_to_type,
                ..remote
            });
        }

        let lists = site.lists()?;
        let site_id = site.site_id();
        for remote in site.workflow_subscriptions()? {
            let list_token = match remote.list_id {
                Some(list_id) if list_id != site_id => match lists.iter().find(|l| l.id == list_id) {
                    Some(list) => Some(format!("{{listid:{}}}", list.title)),
                    None => {
                        tracing::warn!(
                            handler = Self::NAME,
                            subscription = %remote.name,
                            %list_id,
                            "subscription refers to a list that does not exist"
                        );
                        continue;
                    }
                },
                _ => None,
            };
            let known = template.workflow_subscriptions.iter().any(|s| {
                s.definition_id == remote.definition_id
                    && s.name.eq_ignore_ascii_case(&remote.name)
                    && s.list_id == list_token
            });
            if known {
                continue;
            }
            template.workflow_subscriptions.push(WorkflowSubscription {
                definition_id: remote.definition_id,
                name: remote.name,
                enabled: remote.enabled,
                event_source_id: remote.event_source_id.hyphenated().to_string(),
                event_types: remote.event_types,
                list_id: list_token,
                manual_start_bypasses_activation_limit: remote.manual_start_bypasses_activation_limit,
                parent_content_type_id: remote.parent_content_type_id,
                status_field_name: remote.status_field_name,
                property_definitions: remote.property_definitions,
            });
        }
        Ok(template)
    }

    fn provision(
        &self,
        site: &mut dyn SiteConnection,
        template: &Template,
        parser: &mut TokenParser,
    ) -> Result<(), HandlerError> {
        let existing = site.workflow_definitions()?;
        // template definition id -> id on the site
        let mut saved: HashMap<Uuid, Uuid> = HashMap::new();

        for definition in &template.workflow_definitions {
            let desired = WorkflowDefinition {
                display_name: parser.parse_string(&definition.display_name)?,
                description: parser.parse_string(&definition.description)?,
                association_url: parser.parse_string(&definition.association_url)?,
                initiation_url: parser.parse_string(&definition.initiation_url)?,
                restrict_to_type: if definition.restrict_to_type == UNIVERSAL_RESTRICTION {
                    String::new()
                } else {
                    definition.restrict_to_type.clone()
                },
                properties: parse_values(parser, &definition.properties)?,
                ..definition.clone()
            };

            let current = existing.iter().find(|d| {
                (!desired.id.is_nil() && d.id == desired.id)
                    || (desired.id.is_nil() && d.display_name.eq_ignore_ascii_case(&desired.display_name))
            });
            let (id, published) = match current {
                Some(current) if same_definition(current, &desired) => (current.id, current.published),
                Some(current) => {
                    let id = site.save_workflow_definition(&WorkflowDefinition {
                        id: current.id,
                        ..desired.clone()
                    })?;
                    (id, false)
                }
                None => (site.save_workflow_definition(&desired)?, false),
            };
            if definition.published && !published {
                site.publish_workflow_definition(id)?;
            }
            saved.insert(definition.id, id);
            parser.register_entity(EntityKind::WorkflowDefinition, &desired.display_name, Entity::new(id, ""));
        }

        let existing = site.workflow_subscriptions()?;
        for subscription in &template.workflow_subscriptions {
            let list_id = match subscription.list_id.as_deref().map(str::trim) {
                Some(raw) if !raw.is_empty() => {
                    let parsed = parser.parse_string(raw)?;
                    match Uuid::parse_str(parsed.trim()) {
                        Ok(id) => Some(id),
                        Err(_) if !TokenParser::tokens(&parsed).is_empty() => {
                            tracing::warn!(
                                handler = Self::NAME,
                                subscription = %subscription.name,
                                list = %parsed,
                                "list reference is unresolved, subscription not published"
                            );
                            continue;
                        }
                        Err(_) => {
                            return Err(HandlerError::InvalidReference {
                                field: format!("workflow subscription '{}' list_id", subscription.name),
                                value: parsed,
                            })
                        }
                    }
                }
                _ => None,
            };
            let definition_id = saved
                .get(&subscription.definition_id)
                .copied()
                .unwrap_or(subscription.definition_id);

            let mut desired = RemoteSubscription {
                id: Uuid::nil(),
                definition_id,
                name: parser.parse_string(&subscription.name)?,
                enabled: subscription.enabled,
                event_source_id: list_id.unwrap_or_else(|| site.site_id()),
                event_types: subscription.event_types.clone(),
                list_id,
                manual_start_bypasses_activation_limit: subscription.manual_start_bypasses_activation_limit,
                parent_content_type_id: subscription.parent_content_type_id.clone(),
                status_field_name: parser.parse_string(&subscription.status_field_name)?,
                property_definitions: parse_values(parser, &subscription.property_definitions)?,
            };
            if let Some(current) = existing.iter().find(|s| {
                s.definition_id == desired.definition_id
                    && s.event_source_id == desired.event_source_id
                    && s.name.eq_ignore_ascii_case(&desired.name)
            }) {
                desired.id = current.id;
                if *current == desired {
                    continue;
                }
            }
            tracing::debug!(handler = Self::NAME, subscription = %desired.name, "publishing subscription");
            site.publish_subscription(&desired)?;
        }
        Ok(())
    }
}

/// Equal apart from publication state
fn same_definition(current: &WorkflowDefinition, desired: &WorkflowDefinition) -> bool {
    let mut candidate = desired.clone();
    candidate.id = current.id;
    candidate.published = current.published;
    candidate == *current
}
