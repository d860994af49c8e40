//! Token resolvers and the catalog of provisioned entities they read

use std::collections::HashMap;

use uuid::Uuid;

use crate::model::Template;

/// Category of a provisioned entity tokens can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    List,
    WorkflowDefinition,
}

/// Remote identity of a provisioned entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: Uuid,
    /// Site-relative URL, empty where the kind has none
    pub url: String,
}

impl Entity {
    pub fn new(id: Uuid, url: impl Into<String>) -> Self {
        Self { id, url: url.into() }
    }
}

/// Entities created so far in a provisioning run, looked up by
/// case-insensitive name
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entries: HashMap<(EntityKind, String), Entity>,
}

impl EntityCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entity, returning the entry it replaced
    pub fn insert(&mut self, kind: EntityKind, name: &str, entity: Entity) -> Option<Entity> {
        self.entries.insert((kind, name.to_lowercase()), entity)
    }

    pub fn get(&self, kind: EntityKind, name: &str) -> Option<&Entity> {
        self.entries.get(&(kind, name.to_lowercase()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything a resolver may consult
#[derive(Debug, Clone, Copy)]
pub struct TokenScope<'a> {
    pub template: &'a Template,
    pub site_url: &'a str,
    pub site_collection_url: &'a str,
    pub entities: &'a EntityCatalog,
}

/// Resolves tokens of one prefix
///
/// Returning `None` means the token cannot be resolved yet; the parser then
/// leaves it verbatim or fails, depending on its mode.
pub trait TokenResolver: Send + Sync {
    /// Lowercase prefix this resolver answers to
    fn prefix(&self) -> &str;

    fn resolve(&self, args: &[String], scope: &TokenScope<'_>) -> Option<String>;
}

fn first(args: &[String]) -> Option<&str> {
    args.first().map(String::as_str).filter(|a| !a.is_empty())
}

/// `{listid:Title}`: id of a provisioned list
#[derive(Debug, Clone, Copy, Default)]
pub struct ListIdResolver;

impl TokenResolver for ListIdResolver {
    fn prefix(&self) -> &str {
        "listid"
    }

    fn resolve(&self, args: &[String], scope: &TokenScope<'_>) -> Option<String> {
        let entity = scope.entities.get(EntityKind::List, first(args)?)?;
        Some(entity.id.hyphenated().to_string())
    }
}

/// `{listurl:Title}`: site-relative URL of a provisioned list
#[derive(Debug, Clone, Copy, Default)]
pub struct ListUrlResolver;

impl TokenResolver for ListUrlResolver {
    fn prefix(&self) -> &str {
        "listurl"
    }

    fn resolve(&self, args: &[String], scope: &TokenScope<'_>) -> Option<String> {
        let entity = scope.entities.get(EntityKind::List, first(args)?)?;
        Some(entity.url.clone())
    }
}

/// `{parameter:Name}`: a template parameter value
#[derive(Debug, Clone, Copy, Default)]
pub struct ParameterResolver;

impl TokenResolver for ParameterResolver {
    fn prefix(&self) -> &str {
        "parameter"
    }

    fn resolve(&self, args: &[String], scope: &TokenScope<'_>) -> Option<String> {
        let name = first(args)?;
        let parameters = &scope.template.parameters;
        parameters
            .get(name)
            .or_else(|| {
                parameters
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .cloned()
    }
}

/// `{site}`: absolute URL of the target site, without a trailing slash
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteResolver;

impl TokenResolver for SiteResolver {
    fn prefix(&self) -> &str {
        "site"
    }

    fn resolve(&self, _args: &[String], scope: &TokenScope<'_>) -> Option<String> {
        Some(scope.site_url.trim_end_matches('/').to_string())
    }
}

/// `{sitecollection}`: absolute URL of the site collection root
#[derive(Debug, Clone, Copy, Default)]
pub struct SiteCollectionResolver;

impl TokenResolver for SiteCollectionResolver {
    fn prefix(&self) -> &str {
        "sitecollection"
    }

    fn resolve(&self, _args: &[String], scope: &TokenScope<'_>) -> Option<String> {
        Some(scope.site_collection_url.trim_end_matches('/').to_string())
    }
}

/// `{wfdefid:DisplayName}`: id of a provisioned workflow definition
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowDefinitionIdResolver;

impl TokenResolver for WorkflowDefinitionIdResolver {
    fn prefix(&self) -> &str {
        "wfdefid"
    }

    fn resolve(&self, args: &[String], scope: &TokenScope<'_>) -> Option<String> {
        let entity = scope
            .entities
            .get(EntityKind::WorkflowDefinition, first(args)?)?;
        Some(entity.id.hyphenated().to_string())
    }
}

pub(crate) fn builtin_resolvers() -> Vec<Box<dyn TokenResolver>> {
    vec![
        Box::new(ListIdResolver),
        Box::new(ListUrlResolver),
        Box::new(ParameterResolver),
        Box::new(SiteResolver),
        Box::new(SiteCollectionResolver),
        Box::new(WorkflowDefinitionIdResolver),
    ]
}
