use dexgen_core::{DexError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A JSON document on disk, read whole and rewritten whole.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            DexError::Document(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            DexError::Document(format!("{} is not valid JSON: {}", self.path.display(), e))
        })
    }

    /// Pretty-prints `value` (2-space indent), creating parent directories.
    ///
    /// The document is written beside the target and renamed over it, so an
    /// interrupted write leaves the previous file in place.
    pub async fn write<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(value)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &self.path).await?;

        debug!("wrote {}", self.path.display());
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_parents_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("src").join("data").join("out.json"));

        store.write(&json!({ "1": { "evolution": [] } })).await.unwrap();
        let back: Value = store.read().await.unwrap();
        assert_eq!(back, json!({ "1": { "evolution": [] } }));

        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\n  \"1\""));
        assert!(!store.staging_path().exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_a_document_error() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("missing.json"));
        assert!(matches!(
            store.read::<Value>().await,
            Err(DexError::Document(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_document_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(path);
        assert!(matches!(
            store.read::<Value>().await,
            Err(DexError::Document(_))
        ));
    }
}
