//! Supported schema releases

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{FieldType, FieldValue, Value, ValueError};

/// A release of the wire schema, ordered oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchemaVersion {
    #[serde(rename = "2016-05")]
    V201605,
    #[serde(rename = "2017-05")]
    V201705,
    #[serde(rename = "2018-01")]
    V201801,
}

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 3] = [
        SchemaVersion::V201605,
        SchemaVersion::V201705,
        SchemaVersion::V201801,
    ];

    pub fn latest() -> Self {
        SchemaVersion::V201801
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::V201605 => "2016-05",
            SchemaVersion::V201705 => "2017-05",
            SchemaVersion::V201801 => "2018-01",
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::latest()
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The identifier is not one of the supported releases
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported schema version '{0}' (expected one of 2016-05, 2017-05, 2018-01)")]
pub struct UnknownVersion(pub String);

impl FromStr for SchemaVersion {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == trimmed)
            .ok_or_else(|| UnknownVersion(trimmed.to_string()))
    }
}

impl FieldValue for SchemaVersion {
    fn field_type() -> FieldType {
        FieldType::Text
    }

    fn to_value(&self) -> Value {
        Value::Text(self.as_str().to_string())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => s.parse().map_err(|_| ValueError {
                field: None,
                expected: "schema version".to_string(),
                found: "text",
            }),
            Value::Null => Ok(Self::default()),
            other => Err(ValueError::new("schema version", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("2017-05".parse::<SchemaVersion>(), Ok(SchemaVersion::V201705));
        assert_eq!(SchemaVersion::V201801.to_string(), "2018-01");
        assert!("2019-03".parse::<SchemaVersion>().is_err());
    }

    #[test]
    fn test_versions_are_ordered() {
        assert!(SchemaVersion::V201605 < SchemaVersion::V201705);
        assert_eq!(SchemaVersion::ALL.iter().max(), Some(&SchemaVersion::latest()));
    }
}
