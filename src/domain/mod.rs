use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub mod auth;
pub mod error;
pub mod predicate;
pub mod schema;

pub use auth::PermissionContext;
pub use error::{FormError, SchemaError, StoreError};
pub use predicate::{Command, Predicate};
pub use schema::{ButtonRole, ButtonSpec, Buttons, FieldKind, FieldSpec, FormSchema, FormSchemaDoc};

/// Backing store holding current and default values of configuration keys.
///
/// A key missing from a fetch result means the store has no value for it;
/// the interpreter shows the bound field as unavailable.
#[async_trait]
pub trait SettingsStorePort: Send + Sync {
    async fn fetch_current(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError>;
    async fn fetch_defaults(&self, keys: &[String]) -> Result<HashMap<String, Value>, StoreError>;
    /// Partial update of the given keys
    async fn save(&self, values: &HashMap<String, Value>) -> Result<(), StoreError>;
    /// Restore every bound key to the default of its reset key, all or nothing
    async fn revert(&self, bindings: &[ResetBinding]) -> Result<(), StoreError>;
}

/// A field key paired with the configuration key whose default it resets to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetBinding {
    pub key: String,
    pub reset: String,
}

impl ResetBinding {
    pub fn new(key: impl Into<String>, reset: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reset: reset.into(),
        }
    }

    /// The key resets to its own default
    pub fn is_identity(&self) -> bool {
        self.key == self.reset
    }
}

/// Maps a literal string key to localized text.
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str) -> String;
}

/// What the user is asked to confirm before a destructive action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfirmPrompt {
    ResetField { form: String, field: String, default: Value },
    RevertAll { form: String },
}

/// Asks the acting user to confirm a destructive action.
#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub form: String,
    pub message: String,
}

impl Notification {
    pub fn info(form: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            form: form.into(),
            message: message.into(),
        }
    }

    pub fn error(form: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            form: form.into(),
            message: message.into(),
        }
    }
}

/// Non-blocking sink for save outcomes and other out-of-band messages.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
