//! Dependency-ordered handler pipeline

use std::collections::{BTreeSet, HashMap};

use crate::config::ProvisioningConfig;
use crate::model::Template;
use crate::remote::SiteConnection;
use crate::token::TokenParser;

use super::{
    AuditSettingsHandler, ExtractionOptions, HandlerError, ListsHandler, ObjectHandler, PipelineError,
    PropertyBagHandler, WorkflowsHandler,
};

/// A handler failure tolerated under continue-on-error
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerFailure {
    pub handler: String,
    pub error: HandlerError,
}

/// What a pipeline run did, handler by handler
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub executed: Vec<String>,
    /// Handlers whose predicate declined, or excluded by configuration
    pub skipped: Vec<String>,
    pub failures: Vec<HandlerFailure>,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Handlers in a fixed total order derived from their declared dependencies
///
/// A handler always runs after every handler it [`requires`]. Among handlers
/// with no ordering constraint between them, registration order decides.
/// Runs are strictly sequential.
///
/// [`requires`]: ObjectHandler::requires
pub struct HandlerPipeline {
    handlers: Vec<Box<dyn ObjectHandler>>,
    include: Option<BTreeSet<String>>,
    continue_on_error: bool,
}

pub struct HandlerPipelineBuilder {
    handlers: Vec<Box<dyn ObjectHandler>>,
    include: Option<Vec<String>>,
    continue_on_error: bool,
}

impl HandlerPipelineBuilder {
    pub fn handler(mut self, handler: impl ObjectHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn boxed(mut self, handler: Box<dyn ObjectHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Keep running later handlers after one fails, collecting the failures
    pub fn continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    /// Run only the named handlers; the others are reported as skipped
    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Order the handlers, rejecting duplicates, unknown dependencies and
    /// cycles
    pub fn build(self) -> Result<HandlerPipeline, PipelineError> {
        let handlers = order_handlers(self.handlers)?;
        let include = match self.include {
            Some(names) => {
                for name in &names {
                    if !handlers.iter().any(|h| h.name() == name) {
                        return Err(PipelineError::UnknownHandler(name.clone()));
                    }
                }
                Some(names.into_iter().collect())
            }
            None => None,
        };
        Ok(HandlerPipeline {
            handlers,
            include,
            continue_on_error: self.continue_on_error,
        })
    }
}

/// Kahn's algorithm over the `requires` relation, ready handlers taken in
/// registration order
fn order_handlers(handlers: Vec<Box<dyn ObjectHandler>>) -> Result<Vec<Box<dyn ObjectHandler>>, PipelineError> {
    let mut index: HashMap<&'static str, usize> = HashMap::new();
    for (i, handler) in handlers.iter().enumerate() {
        if index.insert(handler.name(), i).is_some() {
            return Err(PipelineError::DuplicateHandler(handler.name().to_string()));
        }
    }

    let mut in_degree = vec![0usize; handlers.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); handlers.len()];
    for (i, handler) in handlers.iter().enumerate() {
        for required in handler.requires() {
            let &dep = index.get(required).ok_or_else(|| PipelineError::UnknownDependency {
                handler: handler.name().to_string(),
                requires: required.to_string(),
            })?;
            in_degree[i] += 1;
            dependents[dep].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..handlers.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(handlers.len());
    while let Some(current) = ready.pop_first() {
        order.push(current);
        for &dependent in &dependents[current] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                ready.insert(dependent);
            }
        }
    }

    if order.len() != handlers.len() {
        let handlers = (0..handlers.len())
            .filter(|&i| in_degree[i] > 0)
            .map(|i| handlers[i].name().to_string())
            .collect();
        return Err(PipelineError::CircularDependency { handlers });
    }

    let mut slots: Vec<Option<Box<dyn ObjectHandler>>> = handlers.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

impl HandlerPipeline {
    pub fn builder() -> HandlerPipelineBuilder {
        HandlerPipelineBuilder {
            handlers: Vec::new(),
            include: None,
            continue_on_error: false,
        }
    }

    /// Every built-in handler
    pub fn standard_builder() -> HandlerPipelineBuilder {
        Self::builder()
            .handler(ListsHandler)
            .handler(WorkflowsHandler)
            .handler(AuditSettingsHandler)
            .handler(PropertyBagHandler)
    }

    pub fn standard() -> Result<Self, PipelineError> {
        Self::standard_builder().build()
    }

    /// The built-in handlers, filtered and configured by `config`
    pub fn from_config(config: &ProvisioningConfig) -> Result<Self, PipelineError> {
        let mut builder = Self::standard_builder().continue_on_error(config.continue_on_error);
        if let Some(names) = &config.handlers {
            builder = builder.only(names.iter().cloned());
        }
        builder.build()
    }

    /// Handler names in execution order
    pub fn order(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    fn included(&self, name: &str) -> bool {
        self.include.as_ref().map_or(true, |names| names.contains(name))
    }

    /// Run every extraction step, each seeing the template the previous
    /// ones produced
    pub fn extract(
        &self,
        site: &dyn SiteConnection,
        template: Template,
        options: &ExtractionOptions,
    ) -> Result<(Template, PipelineReport), PipelineError> {
        let mut report = PipelineReport::default();
        let mut template = template;
        for handler in &self.handlers {
            let name = handler.name();
            if !self.included(name) || !handler.will_extract(site, &template, options) {
                tracing::debug!(handler = name, "extraction skipped");
                report.skipped.push(name.to_string());
                continue;
            }
            let span = tracing::info_span!("handler", name, phase = "extract");
            let _enter = span.enter();
            // a failed step leaves the template as the previous step produced it
            let snapshot = self.continue_on_error.then(|| template.clone());
            match handler.extract(site, template, options) {
                Ok(extracted) => {
                    template = extracted;
                    report.executed.push(name.to_string());
                }
                Err(error) => {
                    template = self.tolerate(name, error, &mut report, snapshot)?;
                }
            }
        }
        Ok((template, report))
    }

    /// Run every provisioning step in order, threading `parser` through
    pub fn provision(
        &self,
        site: &mut dyn SiteConnection,
        template: &Template,
        parser: &mut TokenParser,
    ) -> Result<PipelineReport, PipelineError> {
        let mut report = PipelineReport::default();
        for handler in &self.handlers {
            let name = handler.name();
            if !self.included(name) || !handler.will_provision(&*site, template) {
                tracing::debug!(handler = name, "provisioning skipped");
                report.skipped.push(name.to_string());
                continue;
            }
            let span = tracing::info_span!("handler", name, phase = "provision");
            let _enter = span.enter();
            match handler.provision(site, template, parser) {
                Ok(()) => report.executed.push(name.to_string()),
                Err(error) => self.tolerate(name, error, &mut report, Some(()))?,
            }
        }
        Ok(report)
    }

    /// Record a failure and hand back `fallback`, or abort the run
    fn tolerate<T>(
        &self,
        handler: &str,
        error: HandlerError,
        report: &mut PipelineReport,
        fallback: Option<T>,
    ) -> Result<T, PipelineError> {
        tracing::error!(handler, error = %error, "handler failed");
        match fallback {
            Some(value) if self.continue_on_error => {
                report.failures.push(HandlerFailure {
                    handler: handler.to_string(),
                    error,
                });
                Ok(value)
            }
            _ => Err(PipelineError::HandlerFailed {
                handler: handler.to_string(),
                source: error,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, &'static [&'static str]);

    impl ObjectHandler for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn requires(&self) -> &'static [&'static str] {
            self.1
        }

        fn will_extract(&self, _: &dyn SiteConnection, _: &Template, _: &ExtractionOptions) -> bool {
            true
        }

        fn will_provision(&self, _: &dyn SiteConnection, _: &Template) -> bool {
            true
        }

        fn extract(&self, _: &dyn SiteConnection, t: Template, _: &ExtractionOptions) -> Result<Template, HandlerError> {
            Ok(t)
        }

        fn provision(&self, _: &mut dyn SiteConnection, _: &Template, _: &mut TokenParser) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[test]
    fn test_standard_order_puts_lists_first() {
        let pipeline = HandlerPipeline::standard().unwrap();
        assert_eq!(
            pipeline.order(),
            vec!["lists", "workflows", "audit-settings", "property-bag"]
        );
    }

    #[test]
    fn test_dependencies_override_registration_order() {
        let pipeline = HandlerPipeline::builder()
            .handler(Named("c", &["b"]))
            .handler(Named("b", &["a"]))
            .handler(Named("x", &[]))
            .handler(Named("a", &[]))
            .build()
            .unwrap();
        assert_eq!(pipeline.order(), vec!["x", "a", "b", "c"]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let result = HandlerPipeline::builder()
            .handler(Named("a", &["b"]))
            .handler(Named("b", &["a"]))
            .handler(Named("c", &[]))
            .build();
        match result {
            Err(PipelineError::CircularDependency { handlers }) => assert_eq!(handlers, vec!["a", "b"]),
            Err(other) => panic!("unexpected {:?}", other),
            Ok(_) => panic!("cycle accepted"),
        }
    }

    #[test]
    fn test_unknown_dependency_and_duplicates() {
        let unknown = HandlerPipeline::builder().handler(Named("a", &["ghost"])).build();
        assert!(matches!(unknown, Err(PipelineError::UnknownDependency { .. })));

        let duplicate = HandlerPipeline::builder()
            .handler(Named("a", &[]))
            .handler(Named("a", &[]))
            .build();
        assert!(matches!(duplicate, Err(PipelineError::DuplicateHandler(_))));

        let unknown_include = HandlerPipeline::standard_builder().only(["lists", "nope"]).build();
        assert!(matches!(unknown_include, Err(PipelineError::UnknownHandler(name)) if name == "nope"));
    }
}
