//! Error types for the object mapper

use thiserror::Error;

use crate::error::{render_report, Span};
use crate::model::{FieldType, TypeKey, ValueError};

use super::Direction;

/// A field path could not be parsed or does not exist on its root type
///
/// Raised while a field mapping table is being built, never during mapping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("invalid field path '{path}': {reason}")]
    Syntax {
        path: String,
        span: Span,
        reason: String,
    },

    #[error("field '{field}' does not exist on '{entity}' (path '{path}')")]
    UnknownField {
        path: String,
        entity: String,
        field: String,
    },

    #[error("'{segment}' in path '{path}' is not an ordered sequence")]
    NotASequence { path: String, segment: String },

    #[error("'{segment}' in path '{path}' is not an object")]
    NotAnObject { path: String, segment: String },

    #[error("path '{path}' uses index [{index}]; only the representative element [0] is supported")]
    UnsupportedIndex { path: String, index: usize },

    #[error("type {key} is not registered (path '{path}')")]
    UnknownType { path: String, key: TypeKey },
}

impl PathError {
    pub fn syntax(path: impl Into<String>, span: Span, reason: impl Into<String>) -> Self {
        Self::Syntax {
            path: path.into(),
            span,
            reason: reason.into(),
        }
    }

    /// Format a syntax error with the path underlined; other variants
    /// render as their plain message
    pub fn format(&self) -> String {
        match self {
            PathError::Syntax { path, span, reason } => render_report(
                path,
                "field path",
                span.clone(),
                "invalid field path",
                reason,
                Some("paths look like `lists[0].field_refs[0].id`"),
            ),
            other => other.to_string(),
        }
    }
}

/// A single field value could not be coerced between representations
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert field '{path}' from {from} to {to}: {message}")]
pub struct ConversionError {
    pub path: String,
    pub from: String,
    pub to: String,
    pub message: String,
}

impl ConversionError {
    pub fn new(
        path: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            from: from.into(),
            to: to.into(),
            message: message.into(),
        }
    }
}

/// A sequence of key/value records repeated a key that must be unique
#[derive(Debug, Clone, PartialEq, Error)]
#[error("duplicate key '{key}' in field '{path}'")]
pub struct DuplicateKeyError {
    pub path: String,
    pub key: String,
}

/// Errors raised while mapping between the model and a schema graph
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingError {
    /// No copy, resolver or recursion strategy applies to the field
    #[error("field '{path}' is unmapped: cannot assign {source_type} to {target_type}")]
    IncompatibleTypes {
        path: String,
        source_type: FieldType,
        target_type: FieldType,
    },

    /// The target type does not declare the field at all
    #[error("field '{path}' has no counterpart on {target}")]
    MissingTargetField { path: String, target: TypeKey },

    #[error("type {key} is not registered")]
    UnknownType { key: TypeKey },

    #[error("type {key} is registered twice")]
    DuplicateType { key: TypeKey },

    #[error("resolver '{resolver}' on field '{path}' does not support {direction}")]
    UnsupportedDirection {
        path: String,
        resolver: &'static str,
        direction: Direction,
    },

    #[error("field '{path}' holds a {found} value where an object was expected")]
    NotAnObject { path: String, found: &'static str },

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error(transparent)]
    DuplicateKey(#[from] DuplicateKeyError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("invalid model value: {0}")]
    Value(#[from] ValueError),
}

impl MappingError {
    pub fn incompatible(path: impl Into<String>, source_type: FieldType, target_type: FieldType) -> Self {
        Self::IncompatibleTypes {
            path: path.into(),
            source_type,
            target_type,
        }
    }

    pub fn unknown_type(key: TypeKey) -> Self {
        Self::UnknownType { key }
    }

    /// Whether the mapper records this error as a field issue and carries on
    pub fn is_field_level(&self) -> bool {
        matches!(
            self,
            MappingError::IncompatibleTypes { .. }
                | MappingError::MissingTargetField { .. }
                | MappingError::UnsupportedDirection { .. }
                | MappingError::NotAnObject { .. }
                | MappingError::Conversion(_)
                | MappingError::DuplicateKey(_)
        )
    }
}

/// A non-fatal field-level problem recorded during one mapping run
#[derive(Debug, Clone, PartialEq)]
pub struct MappingIssue {
    pub path: String,
    pub error: MappingError,
}

impl std::fmt::Display for MappingIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}
