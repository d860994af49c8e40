//! Template provider: runs the serializers over a whole template

use crate::mapping::{map_properties, Direction, MappingContext, MappingIssue, TypeRegistry};
use crate::model::{ModelObject, Namespace, Object, Template, TypeKey};

use super::document::{read_document, write_document};
use super::error::SerializationError;
use super::serializers::{standard_serializers, TemplateSerializer};
use super::version::SchemaVersion;

/// A serialized template root and the fields that could not be mapped
#[derive(Debug, Clone, PartialEq)]
pub struct Serialized {
    pub root: Object,
    pub issues: Vec<MappingIssue>,
}

/// A deserialized template and the fields that could not be mapped
#[derive(Debug, Clone, PartialEq)]
pub struct Deserialized {
    pub template: Template,
    pub issues: Vec<MappingIssue>,
}

/// Converts templates to and from every supported schema release
pub struct TemplateProvider {
    registry: TypeRegistry,
    serializers: Vec<Box<dyn TemplateSerializer>>,
    strict_mapping: bool,
}

impl TemplateProvider {
    /// Provider with the standard registry and serializers
    pub fn new() -> Result<Self, SerializationError> {
        Ok(Self {
            registry: TypeRegistry::standard()?,
            serializers: standard_serializers(),
            strict_mapping: false,
        })
    }

    /// Fail a run that left any field unmapped instead of returning the issues
    pub fn with_strict_mapping(mut self, strict: bool) -> Self {
        self.strict_mapping = strict;
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn serializers_for(&self, version: SchemaVersion) -> impl Iterator<Item = &dyn TemplateSerializer> + '_ {
        self.serializers
            .iter()
            .map(|s| s.as_ref())
            .filter(move |s| s.supports(version))
    }

    fn run(
        &self,
        source: &Object,
        target: &mut Object,
        version: SchemaVersion,
        direction: Direction,
    ) -> Result<Vec<MappingIssue>, SerializationError> {
        let mut issues = Vec::new();
        for serializer in self.serializers_for(version) {
            let mappings = serializer
                .field_mappings(direction, &self.registry)
                .map_err(|err| SerializationError::Configuration {
                    serializer: serializer.name(),
                    source: err,
                })?;
            let mut ctx = MappingContext::new(&self.registry, &mappings, version, direction)
                .with_recursion(serializer.recursive());
            map_properties(source, target, &mut ctx)?;
            tracing::debug!(
                serializer = serializer.name(),
                %version,
                %direction,
                issues = ctx.issues().len(),
                "serializer finished"
            );
            issues.extend(ctx.into_issues());
        }
        if self.strict_mapping && !issues.is_empty() {
            return Err(SerializationError::Incomplete { issues });
        }
        Ok(issues)
    }

    /// Map a template to the schema graph of `version`
    pub fn serialize(&self, template: &Template, version: SchemaVersion) -> Result<Serialized, SerializationError> {
        let source = template.to_object();
        let mut root = self.registry.instantiate(&TypeKey::schema(version, Template::ENTITY))?;
        let issues = self.run(&source, &mut root, version, Direction::ToSchema)?;
        Ok(Serialized { root, issues })
    }

    /// Map a schema graph of `version` back to a template
    pub fn deserialize(&self, root: &Object, version: SchemaVersion) -> Result<Deserialized, SerializationError> {
        let expected = TypeKey::model(Template::ENTITY).in_namespace(Namespace::Schema(version));
        if root.key() != &expected {
            return Err(SerializationError::RootMismatch {
                expected,
                found: root.key().clone(),
            });
        }
        let mut target = self.registry.instantiate(&TypeKey::model(Template::ENTITY))?;
        let issues = self.run(root, &mut target, version, Direction::ToModel)?;
        let mut template = Template::from_object(&target)?;
        template.schema_version = Some(version);
        Ok(Deserialized { template, issues })
    }

    /// Serialize and write a versioned JSON document
    ///
    /// The template's own `schema_version` is used when `version` is `None`,
    /// falling back to the latest release.
    pub fn save(&self, template: &Template, version: Option<SchemaVersion>) -> Result<String, SerializationError> {
        let version = version
            .or(template.schema_version)
            .unwrap_or_else(SchemaVersion::latest);
        let serialized = self.serialize(template, version)?;
        for issue in &serialized.issues {
            tracing::warn!(field = %issue.path, %version, "not saved: {}", issue.error);
        }
        Ok(write_document(&self.registry, &serialized.root, version)?)
    }

    /// Read a versioned JSON document, using the version named in its header
    pub fn load(&self, input: &str) -> Result<Deserialized, SerializationError> {
        let (version, root) = read_document(&self.registry, input)?;
        self.deserialize(&root, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingError;
    use crate::model::{ListInstance, Value};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_converts_version_and_properties() {
        let provider = TemplateProvider::new().unwrap();
        let mut template = Template::new("TPL");
        template.version = 2.0;
        template.properties.insert("Owner".into(), "IT".into());

        let serialized = provider.serialize(&template, SchemaVersion::V201705).unwrap();
        assert!(serialized.issues.is_empty(), "{:?}", serialized.issues);
        assert_eq!(
            serialized.root.get("version"),
            Some(&Value::Decimal(rust_decimal::Decimal::from(2)))
        );
        let Some(Value::List(properties)) = serialized.root.get("properties") else {
            panic!("properties should be records")
        };
        assert_eq!(properties.len(), 1);
    }

    #[test]
    fn test_field_missing_from_older_version_is_reported() {
        let provider = TemplateProvider::new().unwrap();
        let mut template = Template::new("TPL");
        template.display_name = Some("Projects".into());

        let serialized = provider.serialize(&template, SchemaVersion::V201705).unwrap();
        assert_eq!(serialized.issues.len(), 1);
        assert_eq!(serialized.issues[0].path, "display_name");
        assert!(matches!(serialized.issues[0].error, MappingError::MissingTargetField { .. }));

        let strict = TemplateProvider::new().unwrap().with_strict_mapping(true);
        assert!(matches!(
            strict.serialize(&template, SchemaVersion::V201705),
            Err(SerializationError::Incomplete { .. })
        ));
    }

    #[test]
    fn test_deserialize_sets_schema_version() {
        let provider = TemplateProvider::new().unwrap();
        let mut template = Template::new("TPL");
        template.lists.push(ListInstance::new("Docs", "lists/docs"));
        let serialized = provider.serialize(&template, SchemaVersion::V201605).unwrap();
        let back = provider.deserialize(&serialized.root, SchemaVersion::V201605).unwrap();
        template.schema_version = Some(SchemaVersion::V201605);
        assert_eq!(back.template, template);
    }

    #[test]
    fn test_deserialize_rejects_other_version_root() {
        let provider = TemplateProvider::new().unwrap();
        let serialized = provider.serialize(&Template::new("TPL"), SchemaVersion::V201605).unwrap();
        let err = provider.deserialize(&serialized.root, SchemaVersion::V201801).unwrap_err();
        assert!(matches!(err, SerializationError::RootMismatch { .. }));
    }
}
