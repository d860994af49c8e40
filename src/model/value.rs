//! Dynamic values shared by the model and schema object graphs

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::object::Object;

/// Declared type of a field in a model or schema type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int,
    /// Integer held in a 32-bit model field
    Int32,
    Float,
    Decimal,
    Text,
    Guid,
    /// String-keyed mapping with unique keys
    Map,
    /// Opaque serialized payload, never interpreted
    Any,
    /// Nested object of the named logical entity
    Object(String),
    /// Ordered sequence
    List(Box<FieldType>),
}

impl FieldType {
    /// Shorthand for `List(Object(entity))`
    pub fn objects(entity: impl Into<String>) -> Self {
        FieldType::List(Box::new(FieldType::Object(entity.into())))
    }

    /// Shorthand for `List(inner)`
    pub fn list(inner: FieldType) -> Self {
        FieldType::List(Box::new(inner))
    }

    /// Value a freshly constructed instance holds for this field
    pub fn default_value(&self) -> Value {
        match self {
            FieldType::Bool => Value::Bool(false),
            FieldType::Int | FieldType::Int32 => Value::Int(0),
            FieldType::Float => Value::Float(0.0),
            FieldType::Decimal => Value::Decimal(Decimal::ZERO),
            FieldType::Map => Value::Map(BTreeMap::new()),
            FieldType::List(_) => Value::List(Vec::new()),
            FieldType::Text | FieldType::Guid | FieldType::Any | FieldType::Object(_) => {
                Value::Null
            }
        }
    }

    /// Entity name of an object type
    pub fn entity(&self) -> Option<&str> {
        match self {
            FieldType::Object(entity) => Some(entity),
            _ => None,
        }
    }

    /// Element type of a sequence type
    pub fn element(&self) -> Option<&FieldType> {
        match self {
            FieldType::List(inner) => Some(inner),
            _ => None,
        }
    }

    /// True if values of this type embed objects (which live in a namespace)
    pub fn contains_objects(&self) -> bool {
        match self {
            FieldType::Object(_) => true,
            FieldType::List(inner) => inner.contains_objects(),
            _ => false,
        }
    }

    /// Whether a value of `self` can be copied verbatim into a field of `other`
    ///
    /// Integers of either width are assignable to each other; narrowing is
    /// checked per value by [`check`](FieldType::check).
    pub fn is_assignable_to(&self, other: &FieldType) -> bool {
        match (self, other) {
            (FieldType::Int | FieldType::Int32, FieldType::Int | FieldType::Int32) => true,
            _ => self == other && !self.contains_objects(),
        }
    }

    /// Whether `value` fits a field of this type without losing information
    pub fn check(&self, value: &Value) -> Result<(), ValueError> {
        match (self, value) {
            (FieldType::Int32, Value::Int(i)) if i32::try_from(*i).is_err() => Err(ValueError {
                field: None,
                expected: "32-bit int".to_string(),
                found: "int",
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => write!(f, "bool"),
            FieldType::Int => write!(f, "int"),
            FieldType::Int32 => write!(f, "int32"),
            FieldType::Float => write!(f, "float"),
            FieldType::Decimal => write!(f, "decimal"),
            FieldType::Text => write!(f, "text"),
            FieldType::Guid => write!(f, "guid"),
            FieldType::Map => write!(f, "map"),
            FieldType::Any => write!(f, "any"),
            FieldType::Object(entity) => write!(f, "{}", entity),
            FieldType::List(inner) => write!(f, "list<{}>", inner),
        }
    }
}

/// A dynamically typed field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Guid(Uuid),
    List(Vec<Value>),
    Map(BTreeMap<String, String>),
    Object(Object),
    /// Opaque content copied without interpretation
    Raw(Payload),
}

impl Value {
    /// Short name of the value's kind, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Guid(_) => "guid",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
            Value::Raw(_) => "raw",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for null and for values equal to their type's zero value
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Decimal(d) => d.is_zero(),
            Value::Text(s) => s.is_empty(),
            Value::Raw(payload) => payload.is_empty(),
            Value::Guid(g) => g.is_nil(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            Value::Object(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Consume a sequence value; null becomes an empty sequence
    pub fn into_list(self) -> Option<Vec<Value>> {
        match self {
            Value::List(items) => Some(items),
            Value::Null => Some(Vec::new()),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Opaque content carried through mapping untouched
///
/// Text payloads (XML fragments and the like) stay text. Structured payloads
/// read from a document keep their compact JSON rendering and are written
/// back as structure, not as a quoted string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Structured(String),
}

impl Payload {
    pub fn as_str(&self) -> &str {
        match self {
            Payload::Text(s) | Payload::Structured(s) => s,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl Default for Payload {
    fn default() -> Self {
        Payload::Text(String::new())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

/// A value did not have the shape a typed model field expects
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}expected {expected}, found {found}", field_prefix(.field))]
pub struct ValueError {
    pub field: Option<String>,
    pub expected: String,
    pub found: &'static str,
}

fn field_prefix(field: &Option<String>) -> String {
    match field {
        Some(name) => format!("field '{}': ", name),
        None => String::new(),
    }
}

impl ValueError {
    pub fn new(expected: impl Into<String>, found: &Value) -> Self {
        Self {
            field: None,
            expected: expected.into(),
            found: found.kind(),
        }
    }

    /// Attach the field name, keeping an innermost name if one is already set
    pub fn in_field(mut self, field: &str) -> Self {
        self.field = Some(match self.field.take() {
            Some(inner) => format!("{}.{}", field, inner),
            None => field.to_string(),
        });
        self
    }
}

/// Conversion between a typed Rust field and a dynamic [`Value`]
pub trait FieldValue: Sized {
    fn field_type() -> FieldType;
    fn to_value(&self) -> Value;
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

impl FieldValue for bool {
    fn field_type() -> FieldType {
        FieldType::Bool
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(ValueError::new("bool", &other)),
        }
    }
}

impl FieldValue for i64 {
    fn field_type() -> FieldType {
        FieldType::Int
    }

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int(i) => Ok(i),
            Value::Null => Ok(0),
            other => Err(ValueError::new("int", &other)),
        }
    }
}

impl FieldValue for i32 {
    fn field_type() -> FieldType {
        FieldType::Int32
    }

    fn to_value(&self) -> Value {
        Value::Int(i64::from(*self))
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Int(i) => i32::try_from(i).map_err(|_| ValueError {
                field: None,
                expected: "32-bit int".to_string(),
                found: "int",
            }),
            Value::Null => Ok(0),
            other => Err(ValueError::new("int", &other)),
        }
    }
}

impl FieldValue for f64 {
    fn field_type() -> FieldType {
        FieldType::Float
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            Value::Null => Ok(0.0),
            other => Err(ValueError::new("float", &other)),
        }
    }
}

impl FieldValue for String {
    fn field_type() -> FieldType {
        FieldType::Text
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => Ok(s),
            Value::Null => Ok(String::new()),
            other => Err(ValueError::new("text", &other)),
        }
    }
}

impl FieldValue for Payload {
    fn field_type() -> FieldType {
        FieldType::Any
    }

    fn to_value(&self) -> Value {
        Value::Raw(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Raw(payload) => Ok(payload),
            Value::Text(s) => Ok(Payload::Text(s)),
            Value::Null => Ok(Payload::default()),
            other => Err(ValueError::new("payload", &other)),
        }
    }
}

impl FieldValue for Uuid {
    fn field_type() -> FieldType {
        FieldType::Guid
    }

    fn to_value(&self) -> Value {
        Value::Guid(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Guid(g) => Ok(g),
            Value::Null => Ok(Uuid::nil()),
            other => Err(ValueError::new("guid", &other)),
        }
    }
}

impl FieldValue for BTreeMap<String, String> {
    fn field_type() -> FieldType {
        FieldType::Map
    }

    fn to_value(&self) -> Value {
        Value::Map(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(map) => Ok(map),
            Value::Null => Ok(BTreeMap::new()),
            other => Err(ValueError::new("map", &other)),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn field_type() -> FieldType {
        T::field_type()
    }

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::list(T::field_type())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            Value::Null => Ok(Vec::new()),
            other => Err(ValueError::new("list", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(FieldType::Bool.default_value(), Value::Bool(false));
        assert_eq!(FieldType::Text.default_value(), Value::Null);
        assert_eq!(
            FieldType::objects("Folder").default_value(),
            Value::List(vec![])
        );
    }

    #[test]
    fn test_object_types_are_never_assignable() {
        let views = FieldType::objects("View");
        assert!(!views.is_assignable_to(&views));
        assert!(FieldType::list(FieldType::Text).is_assignable_to(&FieldType::list(FieldType::Text)));
        assert!(!FieldType::Decimal.is_assignable_to(&FieldType::Float));
    }

    #[test]
    fn test_display() {
        assert_eq!(FieldType::objects("View").to_string(), "list<View>");
    }

    #[test]
    fn test_option_round_trip() {
        let none: Option<String> = None;
        assert_eq!(none.to_value(), Value::Null);
        assert_eq!(Option::<String>::from_value(Value::from("x")), Ok(Some("x".to_string())));
    }

    #[test]
    fn test_i32_overflow_is_rejected() {
        let result = i32::from_value(Value::Int(i64::MAX));
        assert!(result.is_err());
    }

    #[test]
    fn test_int_widths_are_assignable_but_checked() {
        assert!(FieldType::Int.is_assignable_to(&FieldType::Int32));
        assert!(FieldType::Int32.check(&Value::Int(i64::from(i32::MAX))).is_ok());
        assert!(FieldType::Int32.check(&Value::Int(3_000_000_000)).is_err());
        assert!(FieldType::Int.check(&Value::Int(3_000_000_000)).is_ok());
    }

    #[test]
    fn test_payload_from_value() {
        assert_eq!(Payload::from_value(Value::from("<View/>")), Ok(Payload::from("<View/>")));
        assert_eq!(Payload::from_value(Value::Null), Ok(Payload::default()));
        let structured = Payload::Structured(r#"{"a":1}"#.into());
        assert_eq!(structured.to_value(), Value::Raw(structured.clone()));
    }

    #[test]
    fn test_value_error_nests_field_names() {
        let err = ValueError::new("text", &Value::Int(1))
            .in_field("title")
            .in_field("lists");
        assert_eq!(err.to_string(), "field 'lists.title': expected text, found int");
    }
}
