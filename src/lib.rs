//! Template Provisioner - versioned template mapping and dependency-ordered provisioning
//!
//! This library converts provisioning templates between a version-independent
//! model and several releases of a wire schema, resolves deferred `{prefix:args}`
//! references inside template strings, and applies or extracts templates
//! against a remote site through a pipeline of object handlers.
//!
//! # Example
//!
//! ```rust
//! use template_provisioner::{apply_template, InMemorySite, ListInstance, ProvisioningConfig, Template};
//!
//! let mut template = Template::new("TPL");
//! template.lists.push(ListInstance::new("Documents", "lists/documents"));
//! template.property_bag.insert("docs".into(), "{listid:Documents}".into());
//!
//! let mut site = InMemorySite::new("https://contoso.example");
//! let report = apply_template(&mut site, &template, &ProvisioningConfig::default()).unwrap();
//! assert!(report.is_success());
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod remote;
pub mod schema;
pub mod token;

pub use config::{ConfigError, ProvisioningConfig};
pub use handlers::{ExtractionOptions, HandlerError, HandlerPipeline, ObjectHandler, PipelineError, PipelineReport};
pub use mapping::{MappingError, MappingIssue, PathError};
pub use model::{ListInstance, Template};
pub use remote::{InMemorySite, SiteConnection};
pub use schema::{SchemaVersion, SerializationError, TemplateProvider};
pub use token::{Token, TokenError, TokenInstance, TokenParser, UnresolvedTokenError};

use thiserror::Error;

/// Errors from the top-level template operations
#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("token error: {0}")]
    Token(#[from] TokenError),

    #[error("mapping error: {0}")]
    Mapping(#[from] MappingError),
}

/// Provision `template` to `site` with the handlers `config` selects
pub fn apply_template(
    site: &mut dyn SiteConnection,
    template: &Template,
    config: &ProvisioningConfig,
) -> Result<PipelineReport, ProvisioningError> {
    let pipeline = HandlerPipeline::from_config(config)?;
    let mut parser = TokenParser::new(template, site.url()).with_strict(config.strict_tokens);
    tracing::info!(template = %template.id, site = %site.url(), "provisioning template");
    Ok(pipeline.provision(site, template, &mut parser)?)
}

/// Extract the site into `base`, returning the extended template
pub fn extract_template(
    site: &dyn SiteConnection,
    base: Template,
    options: &ExtractionOptions,
    config: &ProvisioningConfig,
) -> Result<(Template, PipelineReport), ProvisioningError> {
    let pipeline = HandlerPipeline::from_config(config)?;
    tracing::info!(template = %base.id, site = %site.url(), "extracting template");
    let (mut template, report) = pipeline.extract(site, base, options)?;
    template.schema_version = Some(config.schema_version);
    Ok((template, report))
}

/// Write `template` as a JSON document in the configured schema version
pub fn save_template(template: &Template, config: &ProvisioningConfig) -> Result<String, ProvisioningError> {
    let provider = TemplateProvider::new()?.with_strict_mapping(config.strict_mapping);
    Ok(provider.save(template, Some(config.schema_version))?)
}

/// Read a JSON document written by [`save_template`] in any supported version
pub fn load_template(input: &str, config: &ProvisioningConfig) -> Result<Template, ProvisioningError> {
    let provider = TemplateProvider::new()?.with_strict_mapping(config.strict_mapping);
    let loaded = provider.load(input)?;
    for issue in &loaded.issues {
        tracing::warn!(field = %issue.path, "not loaded: {}", issue.error);
    }
    Ok(loaded.template)
}
