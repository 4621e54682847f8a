//! In-memory settings store.
//!
//! Holds explicitly set values and server-side defaults. A key that was never
//! set (or was reverted) reads back as its default.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::{ResetBinding, SettingsStorePort, StoreError};

#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    current: RwLock<HashMap<String, Value>>,
    defaults: RwLock<HashMap<String, Value>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with defaults
    pub fn with_defaults<I, K>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            current: RwLock::new(HashMap::new()),
            defaults: RwLock::new(defaults.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    pub async fn set_default(&self, key: impl Into<String>, value: Value) {
        let mut defaults = self.defaults.write().await;
        defaults.insert(key.into(), value);
    }

    /// Set a current value directly, bypassing any form
    pub async fn set(&self, key: impl Into<String>, value: Value) {
        let mut current = self.current.write().await;
        current.insert(key.into(), value);
    }

    /// Effective value of a key: the set value, else the default
    pub async fn get(&self, key: &str) -> Option<Value> {
        let current = self.current.read().await;
        if let Some(value) = current.get(key) {
            return Some(value.clone());
        }
        let defaults = self.defaults.read().await;
        defaults.get(key).cloned()
    }

    /// Whether a key holds an explicitly set value
    pub async fn is_set(&self, key: &str) -> bool {
        let current = self.current.read().await;
        current.contains_key(key)
    }
}

#[async_trait]
impl SettingsStorePort for InMemorySettingsStore {
    async fn fetch_current(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError> {
        let mut out = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key).await {
                out.insert(key.clone(), value);
            }
        }
        Ok(out)
    }

    async fn fetch_defaults(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError> {
        let defaults = self.defaults.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| defaults.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn save(&self, values: &HashMap<String, Value>) -> Result<(), StoreError> {
        let mut current = self.current.write().await;
        for (key, value) in values {
            current.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn revert(&self, bindings: &[ResetBinding]) -> Result<(), StoreError> {
        let copies = {
            let defaults = self.defaults.read().await;
            default_copies(|k| defaults.get(k).cloned(), bindings)?
        };
        let mut current = self.current.write().await;
        for binding in bindings.iter().filter(|b| b.is_identity()) {
            current.remove(&binding.key);
        }
        current.extend(copies);
        Ok(())
    }
}

/// Values to write for bindings whose reset key differs from the field key.
/// Fails without side effects when a reset key has no default.
pub(crate) fn default_copies(
    default_of: impl Fn(&str) -> Option<Value>,
    bindings: &[ResetBinding],
) -> Result<Vec<(String, Value)>, StoreError> {
    bindings
        .iter()
        .filter(|b| !b.is_identity())
        .map(|b| {
            default_of(&b.reset)
                .map(|v| (b.key.clone(), v))
                .ok_or_else(|| StoreError::Rejected {
                    key: b.key.clone(),
                    reason: format!("no default for reset key '{}'", b.reset),
                })
        })
        .collect()
}

/// Thread-safe shared settings store
pub type SharedSettingsStore = Arc<dyn SettingsStorePort>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_unset_key_reads_default() {
        let store = InMemorySettingsStore::with_defaults([("A", json!("x"))]);
        let current = store.fetch_current(&keys(&["A", "MISSING"])).await.unwrap();
        assert_eq!(current.get("A"), Some(&json!("x")));
        assert!(!current.contains_key("MISSING"));
        assert!(!store.is_set("A").await);
    }

    #[tokio::test]
    async fn test_save_then_revert() {
        let store = InMemorySettingsStore::with_defaults([("A", json!("x")), ("B", json!("y"))]);
        let mut values = HashMap::new();
        values.insert("A".to_string(), json!("changed"));
        store.save(&values).await.unwrap();
        assert_eq!(store.get("A").await, Some(json!("changed")));
        assert_eq!(store.get("B").await, Some(json!("y")));

        store.revert(&[ResetBinding::new("A", "A")]).await.unwrap();
        assert_eq!(store.get("A").await, Some(json!("x")));
        assert!(!store.is_set("A").await);
    }

    #[tokio::test]
    async fn test_revert_copies_default_of_reset_key() {
        let store = InMemorySettingsStore::with_defaults([("HOST_DEFAULT", json!("d.example"))]);
        store.set("HOST", json!("live.example")).await;

        store
            .revert(&[ResetBinding::new("HOST", "HOST_DEFAULT")])
            .await
            .unwrap();
        let current = store.fetch_current(&keys(&["HOST"])).await.unwrap();
        assert_eq!(current["HOST"], json!("d.example"));
    }

    #[tokio::test]
    async fn test_revert_without_default_changes_nothing() {
        let store = InMemorySettingsStore::with_defaults([("A", json!("x"))]);
        store.set("A", json!("changed")).await;
        store.set("HOST", json!("live.example")).await;

        let err = store
            .revert(&[ResetBinding::new("A", "A"), ResetBinding::new("HOST", "MISSING")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { .. }));
        assert_eq!(store.get("A").await, Some(json!("changed")));
        assert_eq!(store.get("HOST").await, Some(json!("live.example")));
    }

    #[tokio::test]
    async fn test_fetch_defaults_ignores_set_values() {
        let store = InMemorySettingsStore::with_defaults([("A", json!(1))]);
        store.set("A", json!(2)).await;
        let defaults = store.fetch_defaults(&keys(&["A"])).await.unwrap();
        assert_eq!(defaults["A"], json!(1));
    }
}
