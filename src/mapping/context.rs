//! Field mapping tables and the per-run mapping context

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::model::{Namespace, TypeKey};
use crate::schema::SchemaVersion;

use super::error::{MappingError, MappingIssue, PathError};
use super::path::{FieldPath, ResolvedPath};
use super::registry::TypeRegistry;
use super::resolver::Resolver;

/// Direction of a mapping run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Model to schema (serialization)
    ToSchema,
    /// Schema to model (deserialization)
    ToModel,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToSchema => write!(f, "model-to-schema"),
            Direction::ToModel => write!(f, "schema-to-model"),
        }
    }
}

/// Configuration for one model field: an optional resolver and the
/// direction(s) it applies to
///
/// A mapping without a resolver excludes the field from the run.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    pub path: FieldPath,
    pub resolver: Option<Arc<dyn Resolver>>,
    /// `None` applies in both directions
    pub direction: Option<Direction>,
    /// Resolution of `path` on the model root type
    pub target: ResolvedPath,
}

impl FieldMapping {
    pub fn applies_to(&self, direction: Direction) -> bool {
        self.direction.map_or(true, |d| d == direction)
    }
}

/// Field mapping table for one root model type, keyed by exact field path
#[derive(Debug, Clone)]
pub struct FieldMappings {
    root: TypeKey,
    scope: Option<BTreeSet<String>>,
    mappings: HashMap<FieldPath, Vec<FieldMapping>>,
}

impl FieldMappings {
    /// Start declaring mappings for the model entity `root`
    pub fn builder(root: impl Into<String>) -> FieldMappingsBuilder {
        FieldMappingsBuilder {
            root: TypeKey::model(root),
            scope: None,
            entries: Vec::new(),
        }
    }

    /// A table with no overrides that maps every root field
    pub fn empty(root: impl Into<String>) -> Self {
        Self {
            root: TypeKey::model(root),
            scope: None,
            mappings: HashMap::new(),
        }
    }

    pub fn root(&self) -> &TypeKey {
        &self.root
    }

    /// Whether a root-level field takes part in the run
    pub fn in_scope(&self, field: &str) -> bool {
        self.scope.as_ref().map_or(true, |s| s.contains(field))
    }

    pub fn lookup(&self, path: &FieldPath, direction: Direction) -> Option<&FieldMapping> {
        self.mappings
            .get(path)?
            .iter()
            .find(|m| m.applies_to(direction))
    }

    pub fn len(&self) -> usize {
        self.mappings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Builder for [`FieldMappings`]; paths are checked in [`build`](Self::build)
pub struct FieldMappingsBuilder {
    root: TypeKey,
    scope: Option<BTreeSet<String>>,
    entries: Vec<(String, Option<Arc<dyn Resolver>>, Option<Direction>)>,
}

impl FieldMappingsBuilder {
    /// Restrict the run to these root-level fields
    pub fn scope<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scope = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Convert `path` with `resolver` in both directions
    pub fn resolve(self, path: &str, resolver: impl Resolver + 'static) -> Self {
        self.entry(path, Some(Arc::new(resolver)), None)
    }

    /// Convert `path` with `resolver` when serializing only
    pub fn resolve_to_schema(self, path: &str, resolver: impl Resolver + 'static) -> Self {
        self.entry(path, Some(Arc::new(resolver)), Some(Direction::ToSchema))
    }

    /// Convert `path` with `resolver` when deserializing only
    pub fn resolve_to_model(self, path: &str, resolver: impl Resolver + 'static) -> Self {
        self.entry(path, Some(Arc::new(resolver)), Some(Direction::ToModel))
    }

    /// Leave `path` out of the run in both directions
    pub fn ignore(self, path: &str) -> Self {
        self.entry(path, None, None)
    }

    /// Leave `path` out of the run in one direction
    pub fn ignore_when(self, path: &str, direction: Direction) -> Self {
        self.entry(path, None, Some(direction))
    }

    fn entry(
        mut self,
        path: &str,
        resolver: Option<Arc<dyn Resolver>>,
        direction: Option<Direction>,
    ) -> Self {
        self.entries.push((path.to_string(), resolver, direction));
        self
    }

    /// Parse and resolve every declared path against the model root type
    pub fn build(self, registry: &TypeRegistry) -> Result<FieldMappings, PathError> {
        let mut mappings: HashMap<FieldPath, Vec<FieldMapping>> = HashMap::new();
        for (raw, resolver, direction) in self.entries {
            let path = FieldPath::parse(&raw)?;
            let target = path.resolve(registry, &self.root)?;
            mappings.entry(path.clone()).or_default().push(FieldMapping {
                path,
                resolver,
                direction,
                target,
            });
        }
        if let Some(scope) = &self.scope {
            let desc = registry.describe(&self.root).map_err(|_| PathError::UnknownType {
                path: String::new(),
                key: self.root.clone(),
            })?;
            for field in scope {
                if desc.field_named(field).is_none() {
                    return Err(PathError::UnknownField {
                        path: field.clone(),
                        entity: self.root.entity.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
        Ok(FieldMappings {
            root: self.root,
            scope: self.scope,
            mappings,
        })
    }
}

/// State of one mapping run: schema version, direction, mapping table, the
/// current position in the graph and the issues recorded so far
///
/// The version travels with the context; nothing about the active schema is
/// held globally.
pub struct MappingContext<'a> {
    pub version: SchemaVersion,
    pub direction: Direction,
    pub registry: &'a TypeRegistry,
    pub mappings: &'a FieldMappings,
    /// Recurse into nested object fields that have no explicit resolver
    pub recursive: bool,
    path: FieldPath,
    issues: Vec<MappingIssue>,
}

impl<'a> MappingContext<'a> {
    pub fn new(
        registry: &'a TypeRegistry,
        mappings: &'a FieldMappings,
        version: SchemaVersion,
        direction: Direction,
    ) -> Self {
        Self {
            version,
            direction,
            registry,
            mappings,
            recursive: false,
            path: FieldPath::root(),
            issues: Vec::new(),
        }
    }

    pub fn with_recursion(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Namespace of the objects being produced
    pub fn target_namespace(&self) -> Namespace {
        match self.direction {
            Direction::ToSchema => Namespace::Schema(self.version),
            Direction::ToModel => Namespace::Model,
        }
    }

    /// Key of `entity` in the namespace being produced
    pub fn target_key(&self, entity: &str) -> TypeKey {
        TypeKey::new(self.target_namespace(), entity)
    }

    /// Path of the field currently being mapped
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Run `f` with the current path set to `path`, restoring it afterwards
    pub fn scoped<T>(&mut self, path: FieldPath, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.path, path);
        let result = f(self);
        self.path = previous;
        result
    }

    /// Record a field-level problem and report it on the diagnostic channel
    pub fn report(&mut self, path: &FieldPath, error: MappingError) {
        tracing::warn!(
            field = %path,
            direction = %self.direction,
            version = %self.version,
            error = %error,
            "field left unmapped"
        );
        self.issues.push(MappingIssue {
            path: path.to_string(),
            error,
        });
    }

    pub fn issues(&self) -> &[MappingIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<MappingIssue> {
        self.issues
    }
}
