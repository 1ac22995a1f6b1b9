//! # Verifier Configuration
//!
//! Options that tune a verification run, loadable from JSON, YAML
//! (`yaml-config` feature) or TOML (`toml-config` feature) files.
pub mod error;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use error::ConfigError;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

/// Options of a verification run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Package prefixes of classes assumed present at runtime, such as
    /// `java.` or `kotlin.`. References to them are never reported.
    pub external_class_prefixes: Vec<String>,
    /// Maximum number of verifications a batch runs at once
    pub parallelism: usize,
    /// Resolve class types named in the plugin's own descriptors
    pub check_signature_types: bool,
    /// Report references to members the accessing class cannot see
    pub check_access: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            external_class_prefixes: Vec::new(),
            parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            check_signature_types: true,
            check_access: true,
        }
    }
}

impl VerifierConfig {
    /// Load configuration from a file, picking the format from its extension
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_str_with_format(&data, format)?;
        log::debug!("Loaded verifier config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration text in the given format
    pub fn from_str_with_format(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| deserialization("JSON", e))?,
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| deserialization("YAML", e))?,
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| deserialization("TOML", e))?,
        };
        Ok(config.normalized())
    }

    /// Serialize to string based on format
    pub fn to_string_with_format(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        match format {
            ConfigFormat::Json => {
                serde_json::to_string_pretty(self).map_err(|e| serialization("JSON", e))
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| serialization("YAML", e)),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| serialization("TOML", e)),
        }
    }

    pub fn with_external_prefix(mut self, prefix: &str) -> Self {
        self.external_class_prefixes.push(prefix.to_string());
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Whether `class_name` lies under one of the external prefixes
    pub fn is_external_class(&self, class_name: &str) -> bool {
        self.external_class_prefixes
            .iter()
            .any(|prefix| class_name.starts_with(prefix.as_str()))
    }

    fn normalized(mut self) -> Self {
        self.parallelism = self.parallelism.max(1);
        // Prefixes may be written with slashes, as in class file paths
        for prefix in &mut self.external_class_prefixes {
            *prefix = prefix.replace('/', ".");
        }
        self
    }
}

fn deserialization(format: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Deserialization {
        format: format.to_string(),
        message: err.to_string(),
    }
}

fn serialization(format: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Serialization {
        format: format.to_string(),
        message: err.to_string(),
    }
}
