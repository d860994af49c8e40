//! Pluggable field converters between model and schema values

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::model::{Payload, Value};

use super::context::{Direction, MappingContext};
use super::error::{ConversionError, DuplicateKeyError, MappingError};
use super::mapper::{map_objects, EntityTypeResolver};

/// A bidirectional field converter
///
/// Both directions default to failing with
/// [`MappingError::UnsupportedDirection`], so a resolver that only ever reads
/// schema content implements [`to_model`](Resolver::to_model) alone.
pub trait Resolver: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn to_schema(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        let _ = value;
        Err(unsupported(self.name(), ctx))
    }

    fn to_model(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        let _ = value;
        Err(unsupported(self.name(), ctx))
    }
}

/// Dispatch to the resolver method matching the run's direction
pub fn apply(
    resolver: &dyn Resolver,
    value: Value,
    ctx: &mut MappingContext<'_>,
) -> Result<Value, MappingError> {
    match ctx.direction {
        Direction::ToSchema => resolver.to_schema(value, ctx),
        Direction::ToModel => resolver.to_model(value, ctx),
    }
}

fn unsupported(resolver: &'static str, ctx: &MappingContext<'_>) -> MappingError {
    MappingError::UnsupportedDirection {
        path: ctx.path().to_string(),
        resolver,
        direction: ctx.direction,
    }
}

fn conversion(ctx: &MappingContext<'_>, from: &str, to: &str, message: impl Into<String>) -> MappingError {
    ConversionError::new(ctx.path().to_string(), from, to, message).into()
}

/// Model floating value <-> schema decimal
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalFloatResolver;

impl Resolver for DecimalFloatResolver {
    fn name(&self) -> &'static str {
        "decimal-float"
    }

    fn to_schema(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        match value {
            // shortest round-trip text, so reading it back gives the same float
            Value::Float(f) if f.is_finite() => Decimal::from_str_exact(&f.to_string())
                .map(Value::Decimal)
                .map_err(|e| conversion(ctx, "float", "decimal", format!("{} is not representable: {}", f, e))),
            Value::Float(f) => Err(conversion(ctx, "float", "decimal", format!("{} is not finite", f))),
            Value::Int(i) => Ok(Value::Decimal(Decimal::from(i))),
            Value::Null => Ok(Value::Null),
            other => Err(conversion(ctx, other.kind(), "decimal", "expected a number")),
        }
    }

    fn to_model(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        match value {
            Value::Decimal(d) => d
                .to_string()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| conversion(ctx, "decimal", "float", format!("{}: {}", d, e))),
            Value::Null => Ok(Value::Null),
            other => Err(conversion(ctx, other.kind(), "float", "expected a decimal")),
        }
    }
}

/// Model unique identifier <-> schema text
#[derive(Debug, Clone, Copy, Default)]
pub struct GuidTextResolver;

impl Resolver for GuidTextResolver {
    fn name(&self) -> &'static str {
        "guid-text"
    }

    fn to_schema(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        match value {
            Value::Guid(g) => Ok(Value::Text(g.hyphenated().to_string())),
            Value::Null => Ok(Value::Null),
            other => Err(conversion(ctx, other.kind(), "text", "expected a guid")),
        }
    }

    fn to_model(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        match value {
            Value::Text(s) if s.trim().is_empty() => Ok(Value::Null),
            Value::Text(s) => Uuid::parse_str(s.trim())
                .map(Value::Guid)
                .map_err(|e| conversion(ctx, "text", "guid", format!("'{}': {}", s, e))),
            Value::Null => Ok(Value::Null),
            other => Err(conversion(ctx, other.kind(), "guid", "expected text")),
        }
    }
}

/// Model integer <-> schema enumeration name
///
/// With `flags` set the integer is a bitmask and the schema text is a
/// comma-separated list of names.
#[derive(Debug, Clone, Copy)]
pub struct EnumResolver {
    variants: &'static [(&'static str, i64)],
    flags: bool,
}

impl EnumResolver {
    pub fn new(variants: &'static [(&'static str, i64)]) -> Self {
        Self {
            variants,
            flags: false,
        }
    }

    pub fn flags(variants: &'static [(&'static str, i64)]) -> Self {
        Self {
            variants,
            flags: true,
        }
    }

    fn name_of(&self, value: i64) -> Option<&'static str> {
        self.variants
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(n, _)| *n)
    }

    fn value_of(&self, name: &str) -> Option<i64> {
        self.variants
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }

    fn encode_flags(&self, value: i64) -> Option<String> {
        if let Some(name) = self.name_of(value) {
            return Some(name.to_string());
        }
        let mut remaining = value;
        let mut names = Vec::new();
        for (name, bit) in self.variants {
            if *bit > 0 && remaining & bit == *bit {
                names.push(*name);
                remaining &= !bit;
            }
        }
        (remaining == 0).then(|| names.join(", "))
    }
}

impl Resolver for EnumResolver {
    fn name(&self) -> &'static str {
        if self.flags {
            "flags-text"
        } else {
            "enum-text"
        }
    }

    fn to_schema(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        let raw = match value {
            Value::Int(i) => i,
            Value::Null => return Ok(Value::Null),
            other => return Err(conversion(ctx, other.kind(), "text", "expected an integer")),
        };
        let encoded = if self.flags {
            self.encode_flags(raw)
        } else {
            self.name_of(raw).map(str::to_string)
        };
        encoded
            .map(Value::Text)
            .ok_or_else(|| conversion(ctx, "int", "text", format!("{} has no name", raw)))
    }

    fn to_model(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        let text = match value {
            Value::Text(s) => s,
            Value::Null => return Ok(Value::Null),
            other => return Err(conversion(ctx, other.kind(), "int", "expected text")),
        };
        if !self.flags {
            return self
                .value_of(text.trim())
                .map(Value::Int)
                .ok_or_else(|| conversion(ctx, "text", "int", format!("unknown name '{}'", text)));
        }
        let mut mask = 0i64;
        for part in text.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let bit = self
                .value_of(part)
                .ok_or_else(|| conversion(ctx, "text", "int", format!("unknown flag '{}'", part)))?;
            mask |= bit;
        }
        Ok(Value::Int(mask))
    }
}

/// Model mapping <-> schema sequence of key/value records
///
/// Keys must be unique: a schema sequence that repeats a key fails with
/// [`DuplicateKeyError`].
#[derive(Debug, Clone, Copy)]
pub struct PairsMapResolver {
    record: &'static str,
    key_field: &'static str,
    value_field: &'static str,
}

impl PairsMapResolver {
    /// `record` is the schema entity holding one pair
    pub fn new(record: &'static str, key_field: &'static str, value_field: &'static str) -> Self {
        Self {
            record,
            key_field,
            value_field,
        }
    }
}

impl Resolver for PairsMapResolver {
    fn name(&self) -> &'static str {
        "pairs-map"
    }

    fn to_schema(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        let map = match value {
            Value::Map(map) => map,
            Value::Null => return Ok(Value::List(Vec::new())),
            other => return Err(conversion(ctx, other.kind(), "list", "expected a map")),
        };
        let key = ctx.target_key(self.record);
        let mut records = Vec::with_capacity(map.len());
        for (k, v) in map {
            let mut record = ctx.registry.instantiate(&key)?;
            record.set(self.key_field, Value::Text(k));
            record.set(self.value_field, Value::Text(v));
            records.push(Value::Object(record));
        }
        Ok(Value::List(records))
    }

    fn to_model(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        let records = value
            .into_list()
            .ok_or_else(|| conversion(ctx, "value", "map", "expected a list of records"))?;
        let mut map = BTreeMap::new();
        for record in records {
            let record = match record {
                Value::Object(record) => record,
                other => return Err(conversion(ctx, other.kind(), "map", "expected a key/value record")),
            };
            let key = text_of(record.get(self.key_field));
            let value = text_of(record.get(self.value_field));
            if map.insert(key.clone(), value).is_some() {
                return Err(DuplicateKeyError {
                    path: ctx.path().to_string(),
                    key,
                }
                .into());
            }
        }
        Ok(Value::Map(map))
    }
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        Some(Value::Text(s)) => s.clone(),
        _ => String::new(),
    }
}

/// Model payload <-> schema opaque payload, copied without interpretation
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaquePayloadResolver;

impl Resolver for OpaquePayloadResolver {
    fn name(&self) -> &'static str {
        "opaque-payload"
    }

    fn to_schema(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Raw(payload) if payload.is_empty() => Ok(Value::Null),
            Value::Raw(payload) => Ok(Value::Raw(payload)),
            Value::Text(s) if s.is_empty() => Ok(Value::Null),
            Value::Text(s) => Ok(Value::Raw(Payload::Text(s))),
            other => Err(conversion(ctx, other.kind(), "any", "expected a payload")),
        }
    }

    fn to_model(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        match value {
            Value::Raw(payload) => Ok(Value::Raw(payload)),
            Value::Text(s) => Ok(Value::Raw(Payload::Text(s))),
            Value::Null => Ok(Value::Null),
            other => Err(conversion(ctx, other.kind(), "any", "expected a payload")),
        }
    }
}

/// Ordered sequence of objects, mapped element by element through the
/// object mapper
///
/// Element order is preserved exactly. Use it where the model and schema
/// entity names differ, or to recurse in a run that is not recursive.
#[derive(Debug, Clone, Copy)]
pub struct CollectionResolver {
    model_entity: &'static str,
    schema_entity: &'static str,
}

impl CollectionResolver {
    pub fn new(model_entity: &'static str, schema_entity: &'static str) -> Self {
        Self {
            model_entity,
            schema_entity,
        }
    }

    /// Same entity name on both sides
    pub fn of(entity: &'static str) -> Self {
        Self::new(entity, entity)
    }

    fn map(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        let items = value
            .into_list()
            .ok_or_else(|| conversion(ctx, "value", "list", "expected a sequence"))?;
        let targets = EntityTypeResolver::new(self.model_entity, self.schema_entity);
        let element = ctx.path().element();
        let mapped = ctx.scoped(element, |ctx| map_objects(items, &targets, ctx))?;
        Ok(Value::List(mapped.into_iter().map(Value::Object).collect()))
    }
}

impl Resolver for CollectionResolver {
    fn name(&self) -> &'static str {
        "collection"
    }

    fn to_schema(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        self.map(value, ctx)
    }

    fn to_model(&self, value: Value, ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
        self.map(value, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{FieldMappings, TypeRegistry};
    use crate::model::{audit_flag, TypeKey, AUDIT_FLAGS};
    use crate::schema::SchemaVersion;

    fn with_ctx<T>(direction: Direction, f: impl FnOnce(&mut MappingContext<'_>) -> T) -> T {
        let registry = TypeRegistry::standard().unwrap();
        let mappings = FieldMappings::empty("Template");
        let mut ctx = MappingContext::new(&registry, &mappings, SchemaVersion::V201705, direction);
        f(&mut ctx)
    }

    fn pairs(entries: &[(&str, &str)]) -> Value {
        Value::List(
            entries
                .iter()
                .map(|(k, v)| {
                    Value::Object(
                        crate::model::Object::new(TypeKey::schema(SchemaVersion::V201705, "StringDictionaryItem"))
                            .with("key", *k)
                            .with("value", *v),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_pairs_to_map() {
        let resolver = PairsMapResolver::new("StringDictionaryItem", "key", "value");
        let result = with_ctx(Direction::ToModel, |ctx| {
            resolver.to_model(pairs(&[("Title", "Test"), ("Status", "Active")]), ctx)
        })
        .unwrap();
        let expected: BTreeMap<String, String> = [("Title", "Test"), ("Status", "Active")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        assert_eq!(result, Value::Map(expected));
    }

    #[test]
    fn test_pairs_duplicate_key() {
        let resolver = PairsMapResolver::new("StringDictionaryItem", "key", "value");
        let err = with_ctx(Direction::ToModel, |ctx| {
            resolver.to_model(pairs(&[("Title", "A"), ("Title", "B")]), ctx)
        })
        .unwrap_err();
        assert!(matches!(err, MappingError::DuplicateKey(DuplicateKeyError { ref key, .. }) if key == "Title"));
    }

    #[test]
    fn test_map_to_pairs_builds_schema_records() {
        let resolver = PairsMapResolver::new("StringDictionaryItem", "key", "value");
        let mut map = BTreeMap::new();
        map.insert("Owner".to_string(), "IT".to_string());
        let result = with_ctx(Direction::ToSchema, |ctx| resolver.to_schema(Value::Map(map), ctx)).unwrap();
        let Value::List(records) = result else { panic!("expected list") };
        let record = records[0].as_object().unwrap();
        assert_eq!(record.key(), &TypeKey::schema(SchemaVersion::V201705, "StringDictionaryItem"));
        assert_eq!(record.get("key"), Some(&Value::from("Owner")));
    }

    #[test]
    fn test_guid_text_malformed_is_conversion_error() {
        let err = with_ctx(Direction::ToModel, |ctx| {
            GuidTextResolver.to_model(Value::from("not-a-guid"), ctx)
        })
        .unwrap_err();
        assert!(matches!(err, MappingError::Conversion(ref c) if c.from == "text" && c.to == "guid"));
    }

    #[test]
    fn test_guid_text_accepts_braced_form() {
        let value = with_ctx(Direction::ToModel, |ctx| {
            GuidTextResolver.to_model(Value::from("{11111111-1111-1111-1111-111111111111}"), ctx)
        })
        .unwrap();
        assert_eq!(
            value,
            Value::Guid(Uuid::parse_str("11111111-1111-1111-1111-111111111111").unwrap())
        );
    }

    #[test]
    fn test_decimal_float_both_ways() {
        let schema = with_ctx(Direction::ToSchema, |ctx| DecimalFloatResolver.to_schema(Value::Float(1.5), ctx)).unwrap();
        assert_eq!(schema, Value::Decimal(Decimal::new(15, 1)));
        let model = with_ctx(Direction::ToModel, |ctx| DecimalFloatResolver.to_model(schema, ctx)).unwrap();
        assert_eq!(model, Value::Float(1.5));
    }

    #[test]
    fn test_decimal_float_keeps_every_digit() {
        for f in [0.1, 0.30000000000000004, 2.0 / 3.0, -1234.5678, 1.0e-20, 123_456_789.123_456_78] {
            let schema = with_ctx(Direction::ToSchema, |ctx| DecimalFloatResolver.to_schema(Value::Float(f), ctx)).unwrap();
            let model = with_ctx(Direction::ToModel, |ctx| DecimalFloatResolver.to_model(schema.clone(), ctx)).unwrap();
            assert_eq!(model, Value::Float(f), "via {:?}", schema);
        }
        let schema = with_ctx(Direction::ToSchema, |ctx| DecimalFloatResolver.to_schema(Value::Float(0.1), ctx)).unwrap();
        assert_eq!(schema, Value::Decimal(Decimal::new(1, 1)));
    }

    #[test]
    fn test_decimal_reports_floats_beyond_its_precision() {
        let err = with_ctx(Direction::ToSchema, |ctx| DecimalFloatResolver.to_schema(Value::Float(1.5e-30), ctx));
        assert!(matches!(err, Err(MappingError::Conversion(_))));
    }

    #[test]
    fn test_decimal_rejects_nan() {
        let err = with_ctx(Direction::ToSchema, |ctx| DecimalFloatResolver.to_schema(Value::Float(f64::NAN), ctx));
        assert!(matches!(err, Err(MappingError::Conversion(_))));
    }

    #[test]
    fn test_flags_encode_and_decode() {
        let resolver = EnumResolver::flags(AUDIT_FLAGS);
        let mask = audit_flag("CheckOut").unwrap() | audit_flag("Update").unwrap();
        let text = with_ctx(Direction::ToSchema, |ctx| resolver.to_schema(Value::Int(mask), ctx)).unwrap();
        assert_eq!(text, Value::from("CheckOut, Update"));
        let back = with_ctx(Direction::ToModel, |ctx| resolver.to_model(text, ctx)).unwrap();
        assert_eq!(back, Value::Int(mask));
        let all = with_ctx(Direction::ToSchema, |ctx| resolver.to_schema(Value::Int(-1), ctx)).unwrap();
        assert_eq!(all, Value::from("All"));
    }

    #[test]
    fn test_enum_unknown_name() {
        let resolver = EnumResolver::new(&[("GenericList", 100), ("DocumentLibrary", 101)]);
        let err = with_ctx(Direction::ToModel, |ctx| resolver.to_model(Value::from("Wiki"), ctx));
        assert!(matches!(err, Err(MappingError::Conversion(_))));
        let ok = with_ctx(Direction::ToModel, |ctx| resolver.to_model(Value::from("documentlibrary"), ctx));
        assert_eq!(ok, Ok(Value::Int(101)));
    }

    #[test]
    fn test_opaque_payload_is_untouched() {
        let xml = "<CommandUIExtension><CommandUIDefinitions/></CommandUIExtension>";
        let payload = Value::Raw(Payload::from(xml));
        let schema = with_ctx(Direction::ToSchema, |ctx| OpaquePayloadResolver.to_schema(payload.clone(), ctx)).unwrap();
        assert_eq!(schema, payload);
        let model = with_ctx(Direction::ToModel, |ctx| OpaquePayloadResolver.to_model(schema, ctx)).unwrap();
        assert_eq!(model, payload);

        let structured = Value::Raw(Payload::Structured(r#"{"a":1}"#.into()));
        let schema = with_ctx(Direction::ToSchema, |ctx| OpaquePayloadResolver.to_schema(structured.clone(), ctx)).unwrap();
        assert_eq!(schema, structured);
    }

    #[derive(Debug)]
    struct ReadOnly;

    impl Resolver for ReadOnly {
        fn name(&self) -> &'static str {
            "read-only"
        }

        fn to_model(&self, value: Value, _ctx: &mut MappingContext<'_>) -> Result<Value, MappingError> {
            Ok(value)
        }
    }

    #[test]
    fn test_one_way_resolver_rejects_other_direction() {
        let err = with_ctx(Direction::ToSchema, |ctx| apply(&ReadOnly, Value::Int(1), ctx)).unwrap_err();
        assert!(matches!(err, MappingError::UnsupportedDirection { resolver: "read-only", .. }));
        let ok = with_ctx(Direction::ToModel, |ctx| apply(&ReadOnly, Value::Int(1), ctx));
        assert_eq!(ok, Ok(Value::Int(1)));
    }
}
