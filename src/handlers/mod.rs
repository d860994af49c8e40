//! Object handlers and the dependency-ordered pipeline that runs them
//!
//! Each handler owns one category of template entity. Extraction reads the
//! remote site into the template; provisioning writes the template to the
//! site, registering created entities on the [`TokenParser`] so handlers
//! that run later can resolve tokens referring to them.

mod audit;
mod error;
mod lists;
mod pipeline;
mod property_bag;
mod workflows;

pub use audit::AuditSettingsHandler;
pub use error::{HandlerError, PipelineError};
pub use lists::ListsHandler;
pub use pipeline::{HandlerFailure, HandlerPipeline, HandlerPipelineBuilder, PipelineReport};
pub use property_bag::PropertyBagHandler;
pub use workflows::WorkflowsHandler;

use crate::model::Template;
use crate::remote::SiteConnection;
use crate::token::TokenParser;

/// Controls what extraction reads from the site
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionOptions {
    /// Also extract lists the site marks hidden
    pub include_hidden_lists: bool,
    /// Also extract property bag keys starting with `_` or `vti_`
    pub include_system_properties: bool,
}

impl ExtractionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hidden_lists(mut self, include: bool) -> Self {
        self.include_hidden_lists = include;
        self
    }

    pub fn with_system_properties(mut self, include: bool) -> Self {
        self.include_system_properties = include;
        self
    }
}

/// Extraction and provisioning logic for one category of template entity
pub trait ObjectHandler {
    /// Unique name, used in dependency declarations and diagnostics
    fn name(&self) -> &'static str;

    /// Handlers whose provisioning output this handler's tokens refer to
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    fn will_extract(&self, site: &dyn SiteConnection, template: &Template, options: &ExtractionOptions) -> bool;

    fn will_provision(&self, site: &dyn SiteConnection, template: &Template) -> bool;

    /// Read the site into `template`, returning the extended template
    fn extract(
        &self,
        site: &dyn SiteConnection,
        template: Template,
        options: &ExtractionOptions,
    ) -> Result<Template, HandlerError>;

    /// Apply `template` to the site
    ///
    /// String fields are passed through `parser` before they are sent; the
    /// template itself is never modified. Entities this handler creates are
    /// registered on `parser`.
    fn provision(
        &self,
        site: &mut dyn SiteConnection,
        template: &Template,
        parser: &mut TokenParser,
    ) -> Result<(), HandlerError>;
}

/// Resolve tokens in every value of a string map
pub(crate) fn parse_values(
    parser: &mut TokenParser,
    values: &std::collections::BTreeMap<String, String>,
) -> Result<std::collections::BTreeMap<String, String>, HandlerError> {
    values
        .iter()
        .map(|(k, v)| -> Result<(String, String), HandlerError> { Ok((k.clone(), parser.parse_string(v)?)) })
        .collect()
}
