//! Configuration for field building, loaded with Figment.
//!
//! Sources in precedence order (later sources override earlier ones):
//! 1. Default values
//! 2. An optional configuration file (TOML, YAML or JSON by extension)
//! 3. Environment variables prefixed with `DATASET_FIELDS_`

use std::path::Path;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::DEFAULT_COMPRESSION_LEVEL;
use crate::error::Result;

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "DATASET_FIELDS_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldsConfig {
    /// zstd level used by array fields that do not set their own
    pub compression_level: i32,
    /// Whether document types reject undeclared keys unless their schema says otherwise
    pub strict_documents: bool,
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            strict_documents: true,
        }
    }
}

impl FieldsConfig {
    /// Load from defaults and environment variables.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment(None))
    }

    /// Load from defaults, the given file, and environment variables.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::from_figment(Self::figment(Some(path)))
    }

    /// The figment used by [`FieldsConfig::load`], exposed for callers that
    /// merge further providers.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(FieldsConfig::default()));
        if let Some(path) = path {
            figment = match path.extension().and_then(|e| e.to_str()) {
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            };
        }
        figment.merge(Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().into()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: FieldsConfig = figment.extract()?;
        debug!(
            compression_level = config.compression_level,
            strict_documents = config.strict_documents,
            "loaded fields configuration"
        );
        Ok(config)
    }
}
