//! Settings store persisted as a single JSON document:
//!
//! ```json
//! { "current": { "KEY": "value" }, "defaults": { "KEY": "default" } }
//! ```
//!
//! The document is re-read on every fetch so external edits are picked up.
//! Writes go to a sibling temp file which is then renamed over the original.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::settings_store::default_copies;
use crate::domain::{ResetBinding, SettingsStorePort, StoreError};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDocument {
    #[serde(default)]
    pub current: BTreeMap<String, Value>,
    #[serde(default)]
    pub defaults: BTreeMap<String, Value>,
}

pub struct FileSettingsStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document; a missing file is an empty document.
    pub async fn load(&self) -> Result<SettingsDocument, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SettingsDocument::default()),
            Err(e) => Err(StoreError::Unavailable(format!("{}: {}", self.path.display(), e))),
        }
    }

    async fn write(&self, doc: &SettingsDocument) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Add defaults for keys that have none. Returns how many were added.
    pub async fn seed_defaults(&self, defaults: HashMap<String, Value>) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let mut added = 0;
        for (key, value) in defaults {
            if !doc.defaults.contains_key(&key) {
                doc.defaults.insert(key, value);
                added += 1;
            }
        }
        if added > 0 {
            self.write(&doc).await?;
        }
        Ok(added)
    }
}

#[async_trait]
impl SettingsStorePort for FileSettingsStore {
    async fn fetch_current(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError> {
        let doc = self.load().await?;
        Ok(keys
            .iter()
            .filter_map(|k| {
                doc.current
                    .get(k)
                    .or_else(|| doc.defaults.get(k))
                    .map(|v| (k.clone(), v.clone()))
            })
            .collect())
    }

    async fn fetch_defaults(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError> {
        let doc = self.load().await?;
        Ok(keys
            .iter()
            .filter_map(|k| doc.defaults.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn save(&self, values: &HashMap<String, Value>) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        for (key, value) in values {
            doc.current.insert(key.clone(), value.clone());
        }
        self.write(&doc).await
    }

    async fn revert(&self, bindings: &[ResetBinding]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let copies = default_copies(|k| doc.defaults.get(k).cloned(), bindings)?;
        for binding in bindings.iter().filter(|b| b.is_identity()) {
            doc.current.remove(&binding.key);
        }
        doc.current.extend(copies);
        self.write(&doc).await
    }
}
