//! Storage engine configuration.
//!
//! ```toml
//! watch_history = 500
//!
//! [resource]
//! kind = "Secret"
//! list_kind = "SecretList"
//! api_version = "v1"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::api::{Resource, Secret, TypeMeta};
use crate::error::ConfigError;

/// Number of past events kept for resuming watches.
pub const DEFAULT_WATCH_HISTORY: usize = 100;

/// The resource kind an engine instance is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBinding {
    pub kind: String,
    pub list_kind: String,
    pub api_version: String,
}

impl ResourceBinding {
    pub fn of<K: Resource>() -> Self {
        Self {
            kind: K::KIND.to_string(),
            list_kind: K::LIST_KIND.to_string(),
            api_version: K::API_VERSION.to_string(),
        }
    }

    pub fn type_meta(&self) -> TypeMeta {
        TypeMeta::new(&self.kind, &self.api_version)
    }

    pub fn list_type_meta(&self) -> TypeMeta {
        TypeMeta::new(&self.list_kind, &self.api_version)
    }
}

impl Default for ResourceBinding {
    fn default() -> Self {
        Self::of::<Secret>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub resource: ResourceBinding,
    pub watch_history: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            resource: ResourceBinding::default(),
            watch_history: DEFAULT_WATCH_HISTORY,
        }
    }
}

impl StorageConfig {
    pub fn for_resource<K: Resource>() -> Self {
        Self {
            resource: ResourceBinding::of::<K>(),
            ..Self::default()
        }
    }

    pub fn with_watch_history(mut self, watch_history: usize) -> Self {
        self.watch_history = watch_history;
        self
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::from_toml_str("").unwrap();
        assert_eq!(config, StorageConfig::default());
        assert_eq!(config.resource.kind, "Secret");
        assert_eq!(config.resource.list_kind, "SecretList");
        assert_eq!(config.watch_history, DEFAULT_WATCH_HISTORY);
    }

    #[test]
    fn test_parse_binding() {
        let config = StorageConfig::from_toml_str(
            r#"
            watch_history = 5

            [resource]
            kind = "ConfigMap"
            list_kind = "ConfigMapList"
            api_version = "v1"
            "#,
        )
        .unwrap();

        assert_eq!(config.watch_history, 5);
        assert_eq!(config.resource.kind, "ConfigMap");
        assert_eq!(config.resource.type_meta(), TypeMeta::new("ConfigMap", "v1"));
    }

    #[test]
    fn test_parse_error() {
        let err = StorageConfig::from_toml_str("watch_history = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "watch_history = 42").unwrap();

        let config = StorageConfig::load(file.path()).unwrap();
        assert_eq!(config.watch_history, 42);
        assert_eq!(config.resource, ResourceBinding::of::<Secret>());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = StorageConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
