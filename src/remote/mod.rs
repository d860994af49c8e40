//! Connection to the remote site handlers read from and write to
//!
//! [`SiteConnection`] is the only seam between the handlers and the remote
//! service. Session lifecycle, transport and retries belong to whoever
//! implements it; [`InMemorySite`] is a complete in-process implementation.

mod memory;

pub use memory::InMemorySite;

use std::collections::BTreeMap;

use thiserror::Error;
use uuid::Uuid;

use crate::model::{AuditSettings, WorkflowDefinition};

/// Field values of one list item, keyed by field internal name
pub type ListItem = BTreeMap<String, String>;

/// A list as the remote service reports it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteList {
    pub id: Uuid,
    pub title: String,
    /// Site-relative URL
    pub url: String,
    pub description: String,
    pub template_type: i32,
    pub enable_versioning: bool,
    pub hidden: bool,
}

/// A workflow subscription as the remote service stores it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSubscription {
    pub id: Uuid,
    pub definition_id: Uuid,
    pub name: String,
    pub enabled: bool,
    /// List id for list workflows, site id for site workflows
    pub event_source_id: Uuid,
    pub event_types: Vec<String>,
    pub list_id: Option<Uuid>,
    pub manual_start_bypasses_activation_limit: bool,
    pub parent_content_type_id: String,
    pub status_field_name: String,
    pub property_definitions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    #[error("{kind} '{id}' does not exist on the site")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} '{name}' already exists on the site")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("site rejected {operation}: {message}")]
    Rejected { operation: &'static str, message: String },
}

impl RemoteError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// Operations handlers perform against a live site
///
/// Read operations take `&self`; every `&mut self` operation is a mutation
/// of remote state.
pub trait SiteConnection {
    fn site_id(&self) -> Uuid;

    /// Absolute URL of the site
    fn url(&self) -> &str;

    /// True for a site below the site collection root
    fn is_subsite(&self) -> bool;

    fn lists(&self) -> Result<Vec<RemoteList>, RemoteError>;

    /// Create a list; the id of `list` is ignored and the assigned one returned
    fn create_list(&mut self, list: RemoteList) -> Result<RemoteList, RemoteError>;

    fn update_list(&mut self, list: &RemoteList) -> Result<(), RemoteError>;

    fn list_items(&self, list_id: Uuid) -> Result<Vec<ListItem>, RemoteError>;

    fn add_list_item(&mut self, list_id: Uuid, values: ListItem) -> Result<(), RemoteError>;

    fn workflow_definitions(&self) -> Result<Vec<WorkflowDefinition>, RemoteError>;

    /// Save a definition as a draft, returning its id
    fn save_workflow_definition(&mut self, definition: &WorkflowDefinition) -> Result<Uuid, RemoteError>;

    fn publish_workflow_definition(&mut self, id: Uuid) -> Result<(), RemoteError>;

    fn workflow_subscriptions(&self) -> Result<Vec<RemoteSubscription>, RemoteError>;

    /// Publish a subscription, returning its id
    fn publish_subscription(&mut self, subscription: &RemoteSubscription) -> Result<Uuid, RemoteError>;

    fn audit_settings(&self) -> Result<AuditSettings, RemoteError>;

    fn update_audit_settings(&mut self, settings: &AuditSettings) -> Result<(), RemoteError>;

    fn property_bag(&self) -> Result<BTreeMap<String, String>, RemoteError>;

    fn set_property(&mut self, key: &str, value: &str) -> Result<(), RemoteError>;

    /// Find a list by id
    fn list(&self, id: Uuid) -> Result<Option<RemoteList>, RemoteError> {
        Ok(self.lists()?.into_iter().find(|l| l.id == id))
    }

    /// Find a list by site-relative URL or title, ignoring case
    fn find_list(&self, url: &str, title: &str) -> Result<Option<RemoteList>, RemoteError> {
        let url = url.trim_matches('/');
        Ok(self.lists()?.into_iter().find(|l| {
            (!url.is_empty() && l.url.trim_matches('/').eq_ignore_ascii_case(url))
                || l.title.eq_ignore_ascii_case(title)
        }))
    }
}
