//! Option loader
//!
//! Gathers the raw options mapping from an options file, an inline document
//! and individual overrides. The result is handed unvalidated to
//! [`ResourceConfig::validate`](super::ResourceConfig::validate), so a file
//! with the wrong shape is reported as a skip rather than an error here.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::fs;
use tracing::{debug, warn};

use crate::MetadataError;

/// Parse a YAML (or JSON) options document
pub fn parse_options(content: &str) -> Result<Value, MetadataError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Read and parse an options file
pub async fn load_options_file(path: impl AsRef<Path>) -> Result<Value, MetadataError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).await?;
    debug!("Loaded options from {}", path.display());
    parse_options(&content)
}

/// Options loader builder
///
/// Later sources win: file, then inline document, then overrides.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    inline: Option<String>,
    overrides: Map<String, Value>,
}

impl ConfigLoader {
    /// Create a loader with no sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Read options from a YAML or JSON file
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Use an inline YAML or JSON document
    pub fn with_inline(mut self, document: impl Into<String>) -> Self {
        self.inline = Some(document.into());
        self
    }

    /// Set a single option, overriding file and inline values
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Set a single option only when a value is present
    pub fn with_optional_override<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with_override(key, value),
            None => self,
        }
    }

    /// Produce the raw options mapping, or `None` when nothing was given
    pub async fn load(self) -> Result<Option<Value>, MetadataError> {
        let mut options = match &self.file {
            Some(path) => Some(load_options_file(path).await?),
            None => None,
        };

        if let Some(inline) = &self.inline {
            let document = parse_options(inline)?;
            options = Some(match options {
                Some(base) => merge(base, document),
                None => document,
            });
        }

        if self.overrides.is_empty() {
            return Ok(options);
        }

        let options = options.unwrap_or_else(|| Value::Object(Map::new()));
        Ok(Some(merge(options, Value::Object(self.overrides))))
    }
}

/// Shallow merge of two mappings; a non-mapping on either side is kept as is
fn merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            base.extend(overlay);
            Value::Object(base)
        }
        (base @ Value::Object(_), overlay) => {
            warn!("Ignoring options that are not a mapping: {}", overlay);
            base
        }
        (base, _) => {
            warn!("Options are not a mapping, overrides not applied");
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_empty_loader_yields_none() {
        let options = ConfigLoader::new().load().await.unwrap();
        assert!(options.is_none());
    }

    #[tokio::test]
    async fn test_load_yaml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("options.yml");
        fs::write(&path, "version: '2016-06-30'\ntimeout: 3\ncurl_path: /usr/bin/curl\n")
            .await
            .unwrap();

        let options = ConfigLoader::new().with_file(&path).load().await.unwrap();
        assert_eq!(
            options,
            Some(json!({
                "version": "2016-06-30",
                "timeout": 3,
                "curl_path": "/usr/bin/curl",
            }))
        );
    }

    #[tokio::test]
    async fn test_load_json_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("options.json");
        fs::write(&path, r#"{"wget_path": "/bin/wget"}"#).await.unwrap();

        let options = load_options_file(&path).await.unwrap();
        assert_eq!(options, json!({ "wget_path": "/bin/wget" }));
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let result = ConfigLoader::new()
            .with_file("/nonexistent/options.yml")
            .load()
            .await;
        assert!(matches!(result, Err(MetadataError::Io(_))));
    }

    #[tokio::test]
    async fn test_overrides_win() {
        let options = ConfigLoader::new()
            .with_inline("version: latest\ntimeout: 1")
            .with_override("timeout", 5)
            .with_optional_override("curl_path", Some("/opt/curl"))
            .with_optional_override::<String>("wget_path", None)
            .load()
            .await
            .unwrap();

        assert_eq!(
            options,
            Some(json!({ "version": "latest", "timeout": 5, "curl_path": "/opt/curl" }))
        );
    }

    #[tokio::test]
    async fn test_overrides_without_document() {
        let options = ConfigLoader::new()
            .with_override("version", "2016-06-30")
            .load()
            .await
            .unwrap();
        assert_eq!(options, Some(json!({ "version": "2016-06-30" })));
    }

    #[tokio::test]
    async fn test_non_mapping_document_kept_for_validation() {
        let options = ConfigLoader::new()
            .with_inline("- curl\n- wget")
            .with_override("timeout", 5)
            .load()
            .await
            .unwrap();
        assert_eq!(options, Some(json!(["curl", "wget"])));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_options("version: [unclosed");
        assert!(matches!(result, Err(MetadataError::Yaml(_))));
    }
}
