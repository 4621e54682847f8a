//! # Themis - Form Schema Interpreter
//!
//! Themis turns declarative settings-form schemas into live, stateful forms:
//! it fetches current and default values from a settings store, tracks dirty
//! state per field, gates the revert-all/cancel/save button row on role and
//! form predicates, and persists edits back to the store.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use themis::config::Settings;
//! use themis::forms::google_oauth2;
//! use themis::interpreter::FormSession;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::new()?;
//!     let registry = settings.load_registry()?;
//!     let ctx = themis::create_session_context(&settings, false).await?;
//!
//!     let schema = registry.get(google_oauth2::NAME).expect("built-in form");
//!     let session = FormSession::open(schema, settings.permissions(), ctx).await?;
//!     println!("{}", serde_json::to_string_pretty(&session.render().await)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Themis follows Hexagonal Architecture:
//! - **Domain**: schema types, predicates, permissions and the port traits
//! - **Interpreter**: form instance state machine, rendering and sessions
//! - **Adapters**: settings stores, translators, notifiers, confirmers
//! - **Config**: settings, schema validation and the form registry

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod forms;
pub mod interpreter;

use crate::adapters::confirm::{StaticConfirmer, TerminalConfirmer};
use crate::adapters::file_settings_store::FileSettingsStore;
use crate::adapters::notifier::LogNotifier;
use crate::adapters::settings_store::{InMemorySettingsStore, SharedSettingsStore};
use crate::adapters::translator::{CatalogTranslator, IdentityTranslator};
use crate::config::{Settings, StoreKind};
use crate::domain::{Confirmer, FormSchemaDoc, Translator};
use crate::interpreter::SessionContext;
use schemars::schema::RootSchema;
use std::sync::Arc;
use tracing::info;

/// Builds the configured settings store, seeded with the defaults of every
/// built-in form.
pub async fn create_store(settings: &Settings) -> anyhow::Result<SharedSettingsStore> {
    let defaults = forms::builtin_defaults();
    match settings.store.kind {
        StoreKind::Memory => {
            info!("Using in-memory settings store");
            Ok(Arc::new(InMemorySettingsStore::with_defaults(defaults)))
        }
        StoreKind::File => {
            let store = FileSettingsStore::new(&settings.store.path);
            let added = store.seed_defaults(defaults).await?;
            info!(
                "Using file settings store at {} ({} default(s) seeded)",
                store.path().display(),
                added
            );
            Ok(Arc::new(store))
        }
    }
}

/// Loads the configured translation catalog, or the identity translator.
pub fn create_translator(settings: &Settings) -> anyhow::Result<Arc<dyn Translator>> {
    match &settings.i18n.catalog {
        Some(path) => {
            let catalog = CatalogTranslator::from_file(path)?;
            info!("Loaded {} translation(s) from {}", catalog.len(), path.display());
            Ok(Arc::new(catalog))
        }
        None => Ok(Arc::new(IdentityTranslator)),
    }
}

/// Wires the collaborators a form session needs. With `assume_yes` every
/// confirmation is accepted without prompting.
pub async fn create_session_context(
    settings: &Settings,
    assume_yes: bool,
) -> anyhow::Result<SessionContext> {
    let confirmer: Arc<dyn Confirmer> = if assume_yes {
        Arc::new(StaticConfirmer::accept())
    } else {
        Arc::new(TerminalConfirmer)
    };
    Ok(SessionContext {
        store: create_store(settings).await?,
        confirmer,
        notifier: Arc::new(LogNotifier),
        translator: create_translator(settings)?,
    })
}

/// JSON Schema of the form schema document format
pub fn json_schema() -> RootSchema {
    schemars::schema_for!(FormSchemaDoc)
}
