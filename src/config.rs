//! Provisioning configuration
//!
//! Settings can be built in code or loaded from a TOML file:
//!
//! ```toml
//! schema_version = "2017-05"
//! strict_tokens = true
//! continue_on_error = false
//! strict_mapping = false
//! handlers = ["lists", "workflows"]
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::schema::{SchemaVersion, UnknownVersion};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    UnknownVersion(#[from] UnknownVersion),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisioningConfig {
    /// Version used when saving templates
    pub schema_version: SchemaVersion,
    /// Fail on unresolved tokens instead of leaving them in place
    pub strict_tokens: bool,
    /// Keep running later handlers after one fails
    pub continue_on_error: bool,
    /// Fail a serialization run that recorded any mapping issue
    pub strict_mapping: bool,
    /// Run only these handlers; `None` runs all of them
    pub handlers: Option<Vec<String>>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            schema_version: SchemaVersion::latest(),
            strict_tokens: false,
            continue_on_error: false,
            strict_mapping: false,
            handlers: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    schema_version: Option<String>,
    #[serde(default)]
    strict_tokens: bool,
    #[serde(default)]
    continue_on_error: bool,
    #[serde(default)]
    strict_mapping: bool,
    handlers: Option<Vec<String>>,
}

impl ProvisioningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let schema_version = match parsed.schema_version {
            Some(version) => version.parse()?,
            None => SchemaVersion::latest(),
        };
        Ok(Self {
            schema_version,
            strict_tokens: parsed.strict_tokens,
            continue_on_error: parsed.continue_on_error,
            strict_mapping: parsed.strict_mapping,
            handlers: parsed.handlers,
        })
    }

    pub fn with_schema_version(mut self, version: SchemaVersion) -> Self {
        self.schema_version = version;
        self
    }

    pub fn with_strict_tokens(mut self, strict: bool) -> Self {
        self.strict_tokens = strict;
        self
    }

    pub fn with_continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    pub fn with_strict_mapping(mut self, strict: bool) -> Self {
        self.strict_mapping = strict;
        self
    }

    pub fn with_handlers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.handlers = Some(names.into_iter().map(Into::into).collect());
        self
    }
}
