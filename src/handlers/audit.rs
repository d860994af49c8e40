use crate::model::Template;
use crate::remote::SiteConnection;
use crate::token::TokenParser;

use super::{ExtractionOptions, HandlerError, ObjectHandler};

/// Site collection audit settings; sub-sites inherit them and are skipped
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditSettingsHandler;

impl AuditSettingsHandler {
    pub const NAME: &'static str = "audit-settings";
}

impl ObjectHandler for AuditSettingsHandler {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn will_extract(&self, site: &dyn SiteConnection, _template: &Template, _options: &ExtractionOptions) -> bool {
        !site.is_subsite()
    }

    fn will_provision(&self, site: &dyn SiteConnection, template: &Template) -> bool {
        template.audit_settings.is_some() && !site.is_subsite()
    }

    fn extract(
        &self,
        site: &dyn SiteConnection,
        mut template: Template,
        _options: &ExtractionOptions,
    ) -> Result<Template, HandlerError> {
        template.audit_settings = Some(site.audit_settings()?);
        Ok(template)
    }

    fn provision(
        &self,
        site: &mut dyn SiteConnection,
        template: &Template,
        _parser: &mut TokenParser,
    ) -> Result<(), HandlerError> {
        let Some(desired) = &template.audit_settings else {
            return Ok(());
        };
        let current = site.audit_settings()?;
        if current == *desired {
            tracing::debug!(handler = Self::NAME, "audit settings already up to date");
            return Ok(());
        }
        site.update_audit_settings(desired)?;
        Ok(())
    }
}
