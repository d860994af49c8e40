//! The object mapper: walks declared fields and copies, converts or recurses

use crate::model::{FieldType, Object, TypeKey, Value};

use super::context::{Direction, MappingContext};
use super::error::{ConversionError, MappingError};
use super::path::FieldPath;
use super::registry::FieldDescriptor;
use super::resolver;

/// Chooses the type to construct for each source object
pub trait TargetTypeResolver {
    fn target_type(&self, source: &Object, ctx: &MappingContext<'_>) -> Result<TypeKey, MappingError>;
}

/// Maps to a fixed entity in the namespace the run is producing
#[derive(Debug, Clone)]
pub struct EntityTypeResolver {
    model_entity: String,
    schema_entity: String,
}

impl EntityTypeResolver {
    pub fn new(model_entity: impl Into<String>, schema_entity: impl Into<String>) -> Self {
        Self {
            model_entity: model_entity.into(),
            schema_entity: schema_entity.into(),
        }
    }
}

impl TargetTypeResolver for EntityTypeResolver {
    fn target_type(&self, _source: &Object, ctx: &MappingContext<'_>) -> Result<TypeKey, MappingError> {
        let entity = match ctx.direction {
            Direction::ToSchema => &self.schema_entity,
            Direction::ToModel => &self.model_entity,
        };
        Ok(ctx.target_key(entity))
    }
}

/// Keeps the source object's entity name, switching namespace only
#[derive(Debug, Clone, Copy, Default)]
pub struct SameEntity;

impl TargetTypeResolver for SameEntity {
    fn target_type(&self, source: &Object, ctx: &MappingContext<'_>) -> Result<TypeKey, MappingError> {
        Ok(ctx.target_key(source.entity()))
    }
}

/// Map a sequence of objects, producing one target per source in the same
/// order
///
/// The context path should point at the sequence element (`lists[0]`) so
/// nested mappings are looked up under it.
pub fn map_objects(
    items: Vec<Value>,
    target_types: &dyn TargetTypeResolver,
    ctx: &mut MappingContext<'_>,
) -> Result<Vec<Object>, MappingError> {
    let registry = ctx.registry;
    let mut mapped = Vec::with_capacity(items.len());
    for item in items {
        let source = match item {
            Value::Object(object) => object,
            other => {
                return Err(MappingError::NotAnObject {
                    path: ctx.path().to_string(),
                    found: other.kind(),
                })
            }
        };
        let key = target_types.target_type(&source, ctx)?;
        let mut target = registry.instantiate(&key)?;
        map_properties(&source, &mut target, ctx)?;
        mapped.push(target);
    }
    Ok(mapped)
}

/// Map every declared field of `source` into the already constructed `target`
///
/// Field-level failures are reported through the context and leave that one
/// field at its default; fields mapped before the failure keep their values.
/// Registry lookups that fail abort the run.
pub fn map_properties(
    source: &Object,
    target: &mut Object,
    ctx: &mut MappingContext<'_>,
) -> Result<(), MappingError> {
    let registry = ctx.registry;
    let mappings = ctx.mappings;
    let source_desc = registry.describe(source.key())?;
    let target_desc = registry.describe(target.key())?;
    let base = ctx.path().clone();
    let at_root = base.is_root();

    for field in source_desc.fields() {
        if at_root && !mappings.in_scope(&field.name) {
            continue;
        }
        let path = base.child(&field.name);
        let value = source.get(&field.name).cloned().unwrap_or(Value::Null);
        let target_field = target_desc.field_named(&field.name);

        if let Some(mapping) = mappings.lookup(&path, ctx.direction) {
            let Some(field_resolver) = mapping.resolver.as_deref() else {
                continue;
            };
            let converted = ctx.scoped(path.clone(), |ctx| resolver::apply(field_resolver, value, ctx));
            match converted {
                Ok(converted) => match target_field {
                    Some(target_field) => assign(target, target_field, &path, converted, ctx),
                    None if !converted.is_empty() => ctx.report(&path, missing(&path, target.key())),
                    None => {}
                },
                Err(err) => fail(ctx, &path, err)?,
            }
            continue;
        }

        let Some(target_field) = target_field else {
            if !value.is_empty() {
                ctx.report(&path, missing(&path, target.key()));
            }
            continue;
        };

        if value.is_null() || field.ty.is_assignable_to(&target_field.ty) {
            assign(target, target_field, &path, value, ctx);
            continue;
        }

        if ctx.recursive {
            if let Some(result) = recurse(&path, value, &field.ty, &target_field.ty, ctx) {
                match result {
                    Ok(mapped) => target.set(field.name.clone(), mapped),
                    Err(err) => fail(ctx, &path, err)?,
                }
                continue;
            }
        }

        ctx.report(
            &path,
            MappingError::incompatible(path.to_string(), field.ty.clone(), target_field.ty.clone()),
        );
    }
    Ok(())
}

/// Recurse into a nested object or sequence of objects; `None` when the
/// field types are not both object-bearing in the same shape
fn recurse(
    path: &FieldPath,
    value: Value,
    source_ty: &FieldType,
    target_ty: &FieldType,
    ctx: &mut MappingContext<'_>,
) -> Option<Result<Value, MappingError>> {
    match (source_ty, target_ty) {
        (FieldType::List(source_inner), FieldType::List(target_inner)) => {
            let (Some(_), Some(entity)) = (source_inner.entity(), target_inner.entity()) else {
                return None;
            };
            let targets = EntityTypeResolver::new(entity, entity);
            Some(ctx.scoped(path.element(), |ctx| {
                let items = value.into_list().ok_or_else(|| MappingError::NotAnObject {
                    path: ctx.path().to_string(),
                    found: "scalar",
                })?;
                let mapped = map_objects(items, &targets, ctx)?;
                Ok(Value::List(mapped.into_iter().map(Value::Object).collect()))
            }))
        }
        (FieldType::Object(_), FieldType::Object(entity)) => {
            let source = match value {
                Value::Object(object) => object,
                other => {
                    return Some(Err(MappingError::NotAnObject {
                        path: path.to_string(),
                        found: other.kind(),
                    }))
                }
            };
            let key = ctx.target_key(entity);
            Some(ctx.scoped(path.clone(), |ctx| {
                let mut target = ctx.registry.instantiate(&key)?;
                map_properties(&source, &mut target, ctx)?;
                Ok(Value::Object(target))
            }))
        }
        _ => None,
    }
}

/// Store a value that fits the target field; a value that does not fit
/// (an integer too wide for its model field) is reported instead
fn assign(target: &mut Object, field: &FieldDescriptor, path: &FieldPath, value: Value, ctx: &mut MappingContext<'_>) {
    match field.ty.check(&value) {
        Ok(()) => target.set(field.name.clone(), value),
        Err(err) => {
            let error = ConversionError::new(path.to_string(), value.kind(), field.ty.to_string(), err.to_string());
            ctx.report(path, error.into());
        }
    }
}

fn missing(path: &FieldPath, target: &TypeKey) -> MappingError {
    MappingError::MissingTargetField {
        path: path.to_string(),
        target: target.clone(),
    }
}

/// Report a field-level error, or hand back anything fatal
fn fail(ctx: &mut MappingContext<'_>, path: &FieldPath, err: MappingError) -> Result<(), MappingError> {
    if err.is_field_level() {
        ctx.report(path, err);
        Ok(())
    } else {
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::resolver::{DecimalFloatResolver, GuidTextResolver};
    use crate::mapping::{FieldMappings, TypeDescriptor, TypeRegistry};
    use crate::model::Namespace;
    use crate::schema::SchemaVersion;

    const V: SchemaVersion = SchemaVersion::V201705;

    /// A small pair of model/schema types with one field that differs in shape
    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for namespace in [Namespace::Model, Namespace::Schema(V)] {
            let version_ty = match namespace {
                Namespace::Model => FieldType::Float,
                Namespace::Schema(_) => FieldType::Decimal,
            };
            registry
                .register(
                    TypeDescriptor::new(TypeKey::new(namespace, "Doc"))
                        .field("title", FieldType::Text)
                        .field("version", version_ty)
                        .field("pages", FieldType::objects("Page"))
                        .field("cover", FieldType::Object("Page".to_string())),
                )
                .unwrap();
            registry
                .register(
                    TypeDescriptor::new(TypeKey::new(namespace, "Page"))
                        .field("number", FieldType::Int)
                        .field("owner", FieldType::Guid),
                )
                .unwrap();
        }
        registry
    }

    fn page(number: i64) -> Value {
        Value::Object(Object::new(TypeKey::model("Page")).with("number", Value::Int(number)))
    }

    fn doc() -> Object {
        Object::new(TypeKey::model("Doc"))
            .with("title", "Handbook")
            .with("version", Value::Float(2.5))
            .with("pages", Value::List(vec![page(3), page(1), page(2)]))
    }

    #[test]
    fn test_copies_assignable_and_reports_incompatible() {
        let registry = registry();
        let mappings = FieldMappings::empty("Doc");
        let mut ctx = MappingContext::new(&registry, &mappings, V, Direction::ToSchema);
        let mut target = registry.instantiate(&TypeKey::schema(V, "Doc")).unwrap();

        map_properties(&doc(), &mut target, &mut ctx).unwrap();

        assert_eq!(target.get("title"), Some(&Value::from("Handbook")));
        // no resolver and float is not decimal
        assert!(target.get("version").unwrap().is_empty());
        // not recursive, so the sequence of objects is left at its default
        assert_eq!(target.get("pages"), Some(&Value::List(vec![])));
        let paths: Vec<_> = ctx.issues().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["version", "pages"]);
    }

    #[test]
    fn test_resolver_override_and_recursion_preserve_order() {
        let registry = registry();
        let mappings = FieldMappings::builder("Doc")
            .resolve("version", DecimalFloatResolver)
            .build(&registry)
            .unwrap();
        let mut ctx = MappingContext::new(&registry, &mappings, V, Direction::ToSchema).with_recursion(true);
        let schema = map_objects(vec![Value::Object(doc())], &SameEntity, &mut ctx).unwrap();
        assert!(ctx.issues().is_empty(), "{:?}", ctx.issues());

        let mut ctx = MappingContext::new(&registry, &mappings, V, Direction::ToModel).with_recursion(true);
        let model = map_objects(schema.into_iter().map(Value::Object).collect(), &SameEntity, &mut ctx).unwrap();
        let numbers: Vec<_> = match model[0].get("pages") {
            Some(Value::List(items)) => items
                .iter()
                .map(|p| p.as_object().unwrap().get("number").cloned().unwrap())
                .collect(),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(numbers, vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
        assert_eq!(model[0].get("version"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn test_single_object_field_recurses() {
        let registry = registry();
        let mappings = FieldMappings::empty("Doc");
        let mut ctx = MappingContext::new(&registry, &mappings, V, Direction::ToSchema).with_recursion(true);
        let source = Object::new(TypeKey::model("Doc")).with("cover", page(7));
        let mut target = registry.instantiate(&TypeKey::schema(V, "Doc")).unwrap();
        map_properties(&source, &mut target, &mut ctx).unwrap();
        let cover = target.get("cover").and_then(Value::as_object).unwrap();
        assert_eq!(cover.key(), &TypeKey::schema(V, "Page"));
        assert_eq!(cover.get("number"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_conversion_failure_leaves_other_fields() {
        let registry = registry();
        let mappings = FieldMappings::builder("Doc")
            .resolve("pages[0].owner", GuidTextResolver)
            .build(&registry)
            .unwrap();
        let mut ctx = MappingContext::new(&registry, &mappings, V, Direction::ToModel).with_recursion(true);
        let bad = Object::new(TypeKey::schema(V, "Page"))
            .with("number", Value::Int(4))
            .with("owner", "not-a-guid");
        let source = Object::new(TypeKey::schema(V, "Doc"))
            .with("title", "T")
            .with("pages", Value::List(vec![Value::Object(bad)]));
        let mut target = registry.instantiate(&TypeKey::model("Doc")).unwrap();

        map_properties(&source, &mut target, &mut ctx).unwrap();

        let page = match target.get("pages") {
            Some(Value::List(items)) => items[0].as_object().unwrap().clone(),
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(page.get("number"), Some(&Value::Int(4)));
        assert_eq!(page.get("owner"), Some(&Value::Null));
        assert_eq!(ctx.issues().len(), 1);
        assert_eq!(ctx.issues()[0].path, "pages[0].owner");
        assert!(matches!(ctx.issues()[0].error, MappingError::Conversion(_)));
    }

    #[test]
    fn test_integer_too_wide_for_model_field_is_reported() {
        let mut registry = TypeRegistry::new();
        for (namespace, ty) in [(Namespace::Model, FieldType::Int32), (Namespace::Schema(V), FieldType::Int)] {
            registry
                .register(
                    TypeDescriptor::new(TypeKey::new(namespace, "Page"))
                        .field("number", ty)
                        .field("owner", FieldType::Guid),
                )
                .unwrap();
        }
        let mappings = FieldMappings::empty("Page");
        let mut ctx = MappingContext::new(&registry, &mappings, V, Direction::ToModel);
        let owner = uuid::Uuid::new_v4();
        let source = Object::new(TypeKey::schema(V, "Page"))
            .with("number", Value::Int(3_000_000_000))
            .with("owner", Value::Guid(owner));
        let mut target = registry.instantiate(&TypeKey::model("Page")).unwrap();

        map_properties(&source, &mut target, &mut ctx).unwrap();

        assert_eq!(target.get("number"), Some(&Value::Int(0)));
        assert_eq!(target.get("owner"), Some(&Value::Guid(owner)));
        assert_eq!(ctx.issues().len(), 1);
        assert_eq!(ctx.issues()[0].path, "number");
        assert!(matches!(ctx.issues()[0].error, MappingError::Conversion(_)));
    }

    #[test]
    fn test_unknown_target_type_is_fatal() {
        let registry = registry();
        let mappings = FieldMappings::empty("Doc");
        let mut ctx = MappingContext::new(&registry, &mappings, SchemaVersion::V201801, Direction::ToSchema);
        let result = map_objects(vec![Value::Object(doc())], &SameEntity, &mut ctx);
        assert!(matches!(result, Err(MappingError::UnknownType { .. })));
    }

    #[test]
    fn test_ignored_field_is_skipped() {
        let registry = registry();
        let mappings = FieldMappings::builder("Doc").ignore("version").build(&registry).unwrap();
        let mut ctx = MappingContext::new(&registry, &mappings, V, Direction::ToSchema);
        let source = Object::new(TypeKey::model("Doc")).with("version", Value::Float(9.0));
        let mut target = registry.instantiate(&TypeKey::schema(V, "Doc")).unwrap();
        map_properties(&source, &mut target, &mut ctx).unwrap();
        assert!(ctx.issues().is_empty());
    }
}
