//! Configuration Bundle Accessors
//!
//! Loads configuration from JSON, TOML and YAML files. Nested tables are
//! flattened into dotted keys, so that
//!
//! ```yaml
//! oci:
//!   auth:
//!     region: us-ashburn-1
//! db.secret:
//!   secretId: ocid1.vaultsecret.oc1..xyz
//! ```
//!
//! answers `oci.auth.region` and `db.secret.secretId`. Arrays become
//! comma-separated lists (commas inside elements are escaped), which is what
//! [`ConfigAccessorExt::get_list`](super::ConfigAccessorExt::get_list) expects.
//!
//! # Example
//!
//! ```rust,ignore
//! use oci_secrets_config::config::BundleConfigAccessor;
//!
//! // Format is detected from the extension
//! let bundle = BundleConfigAccessor::from_file("application.toml")?;
//! ```

use super::{escape_list_item, ConfigAccessor};
use crate::error::{ProviderError, ProviderResult};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Supported bundle file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleFormat {
    Json,
    Toml,
    Yaml,
}

impl BundleFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(BundleFormat::Json),
            "toml" => Some(BundleFormat::Toml),
            "yaml" | "yml" => Some(BundleFormat::Yaml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BundleFormat::Json => "json",
            BundleFormat::Toml => "toml",
            BundleFormat::Yaml => "yaml",
        }
    }

    /// Parse content in this format into a JSON value
    fn parse(&self, content: &str) -> ProviderResult<JsonValue> {
        match self {
            BundleFormat::Json => serde_json::from_str(content)
                .map_err(|e| ProviderError::SerializationError(e.to_string())),
            BundleFormat::Toml => toml::from_str::<toml::Value>(content)
                .map(toml_to_json)
                .map_err(|e| ProviderError::SerializationError(e.to_string())),
            BundleFormat::Yaml => {
                let value: serde_yaml::Value = serde_yaml::from_str(content)
                    .map_err(|e| ProviderError::SerializationError(e.to_string()))?;
                serde_json::to_value(value)
                    .map_err(|e| ProviderError::SerializationError(e.to_string()))
            }
        }
    }
}

/// Flatten nested objects into dot-separated keys
fn flatten(value: &JsonValue, prefix: &str, result: &mut HashMap<String, String>) {
    match value {
        JsonValue::Object(obj) => {
            for (key, nested) in obj {
                let full_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(nested, &full_key, result);
            }
        }
        JsonValue::Array(items) => {
            let joined = items
                .iter()
                .filter_map(scalar_to_string)
                .map(|item| escape_list_item(&item))
                .collect::<Vec<_>>()
                .join(",");
            result.insert(prefix.to_string(), joined);
        }
        JsonValue::Null => {}
        scalar => {
            if let Some(s) = scalar_to_string(scalar) {
                result.insert(prefix.to_string(), s);
            }
        }
    }
}

fn scalar_to_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Convert TOML value to JSON value
fn toml_to_json(toml: toml::Value) -> JsonValue {
    match toml {
        toml::Value::String(s) => JsonValue::String(s),
        toml::Value::Integer(i) => JsonValue::Number(serde_json::Number::from(i)),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        toml::Value::Boolean(b) => JsonValue::Bool(b),
        toml::Value::Array(arr) => JsonValue::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => JsonValue::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => JsonValue::String(dt.to_string()),
    }
}

/// Configuration accessor backed by a JSON, TOML or YAML bundle
#[derive(Debug)]
pub struct BundleConfigAccessor {
    format: BundleFormat,
    path: Option<PathBuf>,
    values: RwLock<HashMap<String, String>>,
}

impl BundleConfigAccessor {
    /// Load a bundle file, detecting the format from its extension
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let format = BundleFormat::from_path(path).ok_or_else(|| {
            ProviderError::configuration(format!(
                "Cannot determine bundle format of {}",
                path.display()
            ))
        })?;
        Self::from_file_with_format(path, format)
    }

    /// Load a bundle file in an explicit format
    pub fn from_file_with_format(path: impl AsRef<Path>, format: BundleFormat) -> ProviderResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = Self::load(&path, format)?;
        Ok(Self {
            format,
            path: Some(path),
            values: RwLock::new(values),
        })
    }

    /// Parse a bundle from a string
    pub fn from_str_with_format(content: &str, format: BundleFormat) -> ProviderResult<Self> {
        let mut values = HashMap::new();
        flatten(&format.parse(content)?, "", &mut values);
        Ok(Self {
            format,
            path: None,
            values: RwLock::new(values),
        })
    }

    /// Parse JSON from a string
    pub fn from_json_str(content: &str) -> ProviderResult<Self> {
        Self::from_str_with_format(content, BundleFormat::Json)
    }

    /// Parse TOML from a string
    pub fn from_toml_str(content: &str) -> ProviderResult<Self> {
        Self::from_str_with_format(content, BundleFormat::Toml)
    }

    /// Parse YAML from a string
    pub fn from_yaml_str(content: &str) -> ProviderResult<Self> {
        Self::from_str_with_format(content, BundleFormat::Yaml)
    }

    fn load(path: &Path, format: BundleFormat) -> ProviderResult<HashMap<String, String>> {
        let content = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut values = HashMap::new();
        flatten(&format.parse(&content)?, "", &mut values);
        Ok(values)
    }

    /// Re-read the backing file, if there is one
    pub fn reload(&self) -> ProviderResult<()> {
        if let Some(path) = &self.path {
            let values = Self::load(path, self.format)?;
            *self.values.write().unwrap_or_else(PoisonError::into_inner) = values;
            tracing::debug!(path = %path.display(), "Reloaded configuration bundle");
        }
        Ok(())
    }

    /// All flattened keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl ConfigAccessor for BundleConfigAccessor {
    fn name(&self) -> &str {
        self.format.as_str()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigAccessorExt;
    use std::io::Write;

    #[test]
    fn test_json_bundle_flattening() {
        let bundle = BundleConfigAccessor::from_json_str(
            r#"{"oci": {"auth": {"region": "us-ashburn-1"}, "imds": {"timeout": {"milliseconds": 250}}}}"#,
        )
        .unwrap();

        assert_eq!(bundle.get("oci.auth.region").as_deref(), Some("us-ashburn-1"));
        assert_eq!(bundle.get_parsed::<u64>("oci.imds.timeout.milliseconds").unwrap(), Some(250));
        assert_eq!(bundle.name(), "json");
    }

    #[test]
    fn test_toml_bundle_with_dotted_property_names() {
        let bundle = BundleConfigAccessor::from_toml_str(
            r#"
            ["db.secret"]
            secretId = "ocid1.vaultsecret.oc1..xyz"
            versionNumber = 3

            [oci.secrets.guard]
            accept-list = ["db.secret", "api.key"]
            "#,
        )
        .unwrap();

        assert_eq!(
            bundle.get("db.secret.secretId").as_deref(),
            Some("ocid1.vaultsecret.oc1..xyz")
        );
        assert_eq!(bundle.get("db.secret.versionNumber").as_deref(), Some("3"));
        assert_eq!(
            bundle.get_list("oci.secrets.guard.accept-list"),
            Some(vec!["db.secret".to_string(), "api.key".to_string()])
        );
    }

    #[test]
    fn test_yaml_bundle() {
        let bundle = BundleConfigAccessor::from_yaml_str(
            "oci:\n  config:\n    profile: PROD\nnames:\n  - \"a,b\"\n  - c\n",
        )
        .unwrap();

        assert_eq!(bundle.get("oci.config.profile").as_deref(), Some("PROD"));
        assert_eq!(
            bundle.get_list("names"),
            Some(vec!["a,b".to_string(), "c".to_string()])
        );
        assert_eq!(bundle.keys(), vec!["names", "oci.config.profile"]);
    }

    #[test]
    fn test_invalid_bundle() {
        let result = BundleConfigAccessor::from_json_str("{not json");
        assert!(matches!(result, Err(ProviderError::SerializationError(_))));
    }

    #[test]
    fn test_bundle_from_file_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("application.yaml");
        std::fs::write(&path, "oci:\n  auth:\n    region: us-ashburn-1\n").unwrap();

        let bundle = BundleConfigAccessor::from_file(&path).unwrap();
        assert_eq!(bundle.get("oci.auth.region").as_deref(), Some("us-ashburn-1"));

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "oci:\n  auth:\n    region: eu-frankfurt-1").unwrap();
        drop(file);

        bundle.reload().unwrap();
        assert_eq!(bundle.get("oci.auth.region").as_deref(), Some("eu-frankfurt-1"));
    }

    #[test]
    fn test_bundle_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = BundleConfigAccessor::from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ProviderError::Io { .. })));
    }

    #[test]
    fn test_bundle_unknown_extension() {
        let result = BundleConfigAccessor::from_file("application.ini");
        assert!(matches!(result, Err(ProviderError::ConfigurationError(_))));
    }
}
