//! Errors raised by the template provider and the persisted document

use thiserror::Error;

use crate::mapping::{MappingError, MappingIssue, PathError};
use crate::model::{TypeKey, ValueError};

use super::version::UnknownVersion;

/// The persisted document could not be read or written
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("malformed template document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template document has no schema_version header")]
    MissingVersion,

    #[error(transparent)]
    UnknownVersion(#[from] UnknownVersion),

    #[error("template document has no template body")]
    MissingTemplate,

    #[error("field '{path}': expected {expected}, found {found}")]
    InvalidField {
        path: String,
        expected: String,
        found: &'static str,
    },
}

impl DocumentError {
    pub fn invalid(path: impl Into<String>, expected: impl Into<String>, found: &'static str) -> Self {
        Self::InvalidField {
            path: path.into(),
            expected: expected.into(),
            found,
        }
    }
}

/// Errors from serializing or deserializing a whole template
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("serializer '{serializer}' declares an invalid mapping: {source}")]
    Configuration {
        serializer: &'static str,
        #[source]
        source: PathError,
    },

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("deserialized template is malformed: {0}")]
    Model(#[from] ValueError),

    #[error("expected a {expected} root object, found {found}")]
    RootMismatch { expected: TypeKey, found: TypeKey },

    #[error("{} field(s) could not be mapped; first: {}", .issues.len(), first_issue(.issues))]
    Incomplete { issues: Vec<MappingIssue> },

    #[error(transparent)]
    Document(#[from] DocumentError),
}

fn first_issue(issues: &[MappingIssue]) -> String {
    issues.first().map(ToString::to_string).unwrap_or_default()
}
