use uuid::Uuid;

use crate::model::{ListInstance, Template};
use crate::remote::{RemoteList, SiteConnection};
use crate::token::{Entity, EntityKind, TokenParser};

use super::{parse_values, ExtractionOptions, HandlerError, ObjectHandler};

/// Lists and their data rows
///
/// Registers every provisioned list for `{listid:...}` and `{listurl:...}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListsHandler;

impl ListsHandler {
    pub const NAME: &'static str = "lists";
}

impl ObjectHandler for ListsHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn will_extract(&self, _site: &dyn SiteConnection, _template: &Template, _options: &ExtractionOptions) -> bool {
        true
    }

    fn will_provision(&self, _site: &dyn SiteConnection, template: &Template) -> bool {
        !template.lists.is_empty()
    }

    fn extract(
        &self,
        site: &dyn SiteConnection,
        mut template: Template,
        options: &ExtractionOptions,
    ) -> Result<Template, HandlerError> {
        for remote in site.lists()? {
            if remote.hidden && !options.include_hidden_lists {
                continue;
            }
            let known = template
                .lists
                .iter()
                .any(|l| l.url.trim_matches('/').eq_ignore_ascii_case(remote.url.trim_matches('/')));
            if known {
                continue;
            }
            tracing::debug!(handler = Self::NAME, list = %remote.title, "extracting list");
            template.lists.push(ListInstance {
                title: remote.title,
                url: remote.url,
                description: remote.description,
                template_type: remote.template_type,
                enable_versioning: remote.enable_versioning,
                ..ListInstance::default()
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
        for list in &template.lists {
            let title = parser.parse_string(&list.title)?;
            let url = parser.parse_string(&list.url)?;
            let description = parser.parse_string(&list.description)?;

            let remote = match site.find_list(&url, &title)? {
                Some(current) => {
                    let desired = RemoteList {
                        title,
                        description,
                        enable_versioning: list.enable_versioning,
                        ..current.clone()
                    };
                    if desired != current {
                        tracing::debug!(handler = Self::NAME, list = %desired.title, "updating list");
                        site.update_list(&desired)?;
                    }
                    desired
                }
                None => {
                    tracing::debug!(handler = Self::NAME, list = %title, "creating list");
                    site.create_list(RemoteList {
                        id: Uuid::nil(),
                        title,
                        url,
                        description,
                        template_type: list.template_type,
                        enable_versioning: list.enable_versioning,
                        hidden: false,
                    })?
                }
            };

            parser.register_entity(EntityKind::List, &remote.title, Entity::new(remote.id, remote.url.clone()));
            if !remote.title.eq_ignore_ascii_case(&list.title) {
                parser.register_entity(EntityKind::List, &list.title, Entity::new(remote.id, remote.url.clone()));
            }

            if list.data_rows.is_empty() {
                continue;
            }
            let existing = site.list_items(remote.id)?;
            for row in &list.data_rows {
                let values = parse_values(parser, &row.values)?;
                if existing.contains(&values) {
                    continue;
                }
                site.add_list_item(remote.id, values)?;
            }
        }
        Ok(())
    }
}
