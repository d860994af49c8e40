use std::collections::{BTreeMap, HashMap, HashSet};

use uuid::Uuid;

use crate::model::{AuditSettings, WorkflowDefinition};

use super::{ListItem, RemoteError, RemoteList, RemoteSubscription, SiteConnection};

/// A site held entirely in memory
///
/// Counts every mutating call so callers can check that a run wrote nothing,
/// and can be told to reject one operation to exercise failure paths.
#[derive(Debug, Clone)]
pub struct InMemorySite {
    id: Uuid,
    url: String,
    subsite: bool,
    lists: Vec<RemoteList>,
    items: HashMap<Uuid, Vec<ListItem>>,
    definitions: Vec<WorkflowDefinition>,
    subscriptions: Vec<RemoteSubscription>,
    audit: AuditSettings,
    property_bag: BTreeMap<String, String>,
    rejected: HashSet<&'static str>,
    mutations: usize,
}

impl InMemorySite {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            subsite: false,
            lists: Vec::new(),
            items: HashMap::new(),
            definitions: Vec::new(),
            subscriptions: Vec::new(),
            audit: AuditSettings::default(),
            property_bag: BTreeMap::new(),
            rejected: HashSet::new(),
            mutations: 0,
        }
    }

    pub fn subsite(mut self, subsite: bool) -> Self {
        self.subsite = subsite;
        self
    }

    /// Make every call of `operation` (e.g. `"create_list"`) fail
    pub fn reject(mut self, operation: &'static str) -> Self {
        self.rejected.insert(operation);
        self
    }

    /// Seed a list without counting it as a mutation
    pub fn with_list(mut self, list: RemoteList) -> Self {
        self.lists.push(list);
        self
    }

    pub fn with_audit_settings(mut self, settings: AuditSettings) -> Self {
        self.audit = settings;
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.property_bag.insert(key.to_string(), value.to_string());
        self
    }

    /// Number of mutating calls made so far
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    fn mutate(&mut self, operation: &'static str) -> Result<(), RemoteError> {
        if self.rejected.contains(operation) {
            return Err(RemoteError::Rejected {
                operation,
                message: "operation disabled".to_string(),
            });
        }
        self.mutations += 1;
        Ok(())
    }
}

impl SiteConnection for InMemorySite {
    fn site_id(&self) -> Uuid {
        self.id
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn is_subsite(&self) -> bool {
        self.subsite
    }

    fn lists(&self) -> Result<Vec<RemoteList>, RemoteError> {
        Ok(self.lists.clone())
    }

    fn create_list(&mut self, mut list: RemoteList) -> Result<RemoteList, RemoteError> {
        if self.find_list(&list.url, &list.title)?.is_some() {
            return Err(RemoteError::AlreadyExists {
                kind: "list",
                name: list.title,
            });
        }
        self.mutate("create_list")?;
        list.id = Uuid::new_v4();
        self.lists.push(list.clone());
        Ok(list)
    }

    fn update_list(&mut self, list: &RemoteList) -> Result<(), RemoteError> {
        let index = self
            .lists
            .iter()
            .position(|l| l.id == list.id)
            .ok_or_else(|| RemoteError::not_found("list", list.id))?;
        self.mutate("update_list")?;
        self.lists[index] = list.clone();
        Ok(())
    }

    fn list_items(&self, list_id: Uuid) -> Result<Vec<ListItem>, RemoteError> {
        if !self.lists.iter().any(|l| l.id == list_id) {
            return Err(RemoteError::not_found("list", list_id));
        }
        Ok(self.items.get(&list_id).cloned().unwrap_or_default())
    }

    fn add_list_item(&mut self, list_id: Uuid, values: ListItem) -> Result<(), RemoteError> {
        if !self.lists.iter().any(|l| l.id == list_id) {
            return Err(RemoteError::not_found("list", list_id));
        }
        self.mutate("add_list_item")?;
        self.items.entry(list_id).or_default().push(values);
        Ok(())
    }

    fn workflow_definitions(&self) -> Result<Vec<WorkflowDefinition>, RemoteError> {
        Ok(self.definitions.clone())
    }

    fn save_workflow_definition(&mut self, definition: &WorkflowDefinition) -> Result<Uuid, RemoteError> {
        self.mutate("save_workflow_definition")?;
        let mut saved = definition.clone();
        if saved.id.is_nil() {
            saved.id = Uuid::new_v4();
        }
        // saving always produces a draft
        saved.published = false;
        let id = saved.id;
        match self.definitions.iter_mut().find(|d| d.id == id) {
            Some(existing) => *existing = saved,
            None => self.definitions.push(saved),
        }
        Ok(id)
    }

    fn publish_workflow_definition(&mut self, id: Uuid) -> Result<(), RemoteError> {
        let index = self
            .definitions
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| RemoteError::not_found("workflow definition", id))?;
        self.mutate("publish_workflow_definition")?;
        self.definitions[index].published = true;
        Ok(())
    }

    fn workflow_subscriptions(&self) -> Result<Vec<RemoteSubscription>, RemoteError> {
        Ok(self.subscriptions.clone())
    }

    fn publish_subscription(&mut self, subscription: &RemoteSubscription) -> Result<Uuid, RemoteError> {
        if !self.definitions.iter().any(|d| d.id == subscription.definition_id) {
            return Err(RemoteError::not_found("workflow definition", subscription.definition_id));
        }
        if let Some(list_id) = subscription.list_id {
            if !self.lists.iter().any(|l| l.id == list_id) {
                return Err(RemoteError::not_found("list", list_id));
            }
        }
        self.mutate("publish_subscription")?;
        let mut published = subscription.clone();
        if published.id.is_nil() {
            published.id = Uuid::new_v4();
        }
        let id = published.id;
        match self.subscriptions.iter_mut().find(|s| s.id == id) {
            Some(existing) => *existing = published,
            None => self.subscriptions.push(published),
        }
        Ok(id)
    }

    fn audit_settings(&self) -> Result<AuditSettings, RemoteError> {
        Ok(self.audit.clone())
    }

    fn update_audit_settings(&mut self, settings: &AuditSettings) -> Result<(), RemoteError> {
        self.mutate("update_audit_settings")?;
        self.audit = settings.clone();
        Ok(())
    }

    fn property_bag(&self) -> Result<BTreeMap<String, String>, RemoteError> {
        Ok(self.property_bag.clone())
    }

    fn set_property(&mut self, key: &str, value: &str) -> Result<(), RemoteError> {
        self.mutate("set_property")?;
        self.property_bag.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
