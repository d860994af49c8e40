use crate::model::Template;
use crate::remote::SiteConnection;
use crate::token::TokenParser;

use super::lists::ListsHandler;
use super::{ExtractionOptions, HandlerError, ObjectHandler};

/// Site property bag entries; values commonly carry `{listid:...}` tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyBagHandler;

impl PropertyBagHandler {
    pub const NAME: &'static str = "property-bag";
}

fn is_system_key(key: &str) -> bool {
    key.starts_with('_') || key.to_ascii_lowercase().starts_with("vti_")
}

impl ObjectHandler for PropertyBagHandler {
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
        !template.property_bag.is_empty()
    }

    fn extract(
        &self,
        site: &dyn SiteConnection,
        mut template: Template,
        options: &ExtractionOptions,
    ) -> Result<Template, HandlerError> {
        for (key, value) in site.property_bag()? {
            if is_system_key(&key) && !options.include_system_properties {
                continue;
            }
            template.property_bag.entry(key).or_insert(value);
        }
        Ok(template)
    }

    fn provision(
        &self,
        site: &mut dyn SiteConnection,
        template: &Template,
        parser: &mut TokenParser,
    ) -> Result<(), HandlerError> {
        let current = site.property_bag()?;
        for (key, value) in &template.property_bag {
            let key = parser.parse_string(key)?;
            let value = parser.parse_string(value)?;
            if current.get(&key) == Some(&value) {
                continue;
            }
            tracing::debug!(handler = Self::NAME, key = %key, "setting property");
            site.set_property(&key, &value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::InMemorySite;

    #[test]
    fn test_provision_parses_and_skips_unchanged() {
        let mut template = Template::new("TPL");
        template.parameters.insert("Env".into(), "prod".into());
        template.property_bag.insert("environment".into(), "{parameter:Env}".into());
        template.property_bag.insert("owner".into(), "IT".into());
        let mut site = InMemorySite::new("https://contoso.example").with_property("owner", "IT");
        let mut parser = TokenParser::new(&template, site.url());

        PropertyBagHandler.provision(&mut site, &template, &mut parser).unwrap();
        assert_eq!(site.mutations(), 1);
        assert_eq!(site.property_bag().unwrap().get("environment").map(String::as_str), Some("prod"));
    }

    #[test]
    fn test_extract_hides_system_keys() {
        let site = InMemorySite::new("https://contoso.example")
            .with_property("vti_extenderversion", "16.0")
            .with_property("_catalogs", "x")
            .with_property("department", "Finance");
        let template = PropertyBagHandler
            .extract(&site, Template::new("TPL"), &ExtractionOptions::default())
            .unwrap();
        assert_eq!(template.property_bag.len(), 1);

        let template = PropertyBagHandler
            .extract(&site, Template::new("TPL"), &ExtractionOptions::new().with_system_properties(true))
            .unwrap();
        assert_eq!(template.property_bag.len(), 3);
    }
}
