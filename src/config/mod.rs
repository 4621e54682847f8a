use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub mod registry;
pub mod validator;

pub use registry::FormRegistry;

use crate::cli::Cli;
use crate::domain::PermissionContext;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub forms: FormsSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub i18n: I18nSettings,
    #[serde(default)]
    pub log: LogSettings,
    /// Role flags of the local operator
    #[serde(default)]
    pub user: UserSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FormsSettings {
    /// Directory of additional schema files (json, yaml, yml, toml)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub kind: StoreKind,
    /// JSON document used by the file store
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            kind: StoreKind::Memory,
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("themis-settings.json")
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct I18nSettings {
    /// Translation catalog mapping literal keys to localized text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogSettings {
    /// Used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserSettings {
    #[serde(default)]
    pub system_auditor: bool,
    #[serde(default = "default_can_write")]
    pub can_write: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            system_auditor: false,
            can_write: true,
        }
    }
}

fn default_can_write() -> bool {
    true
}

impl Settings {
    pub fn new() -> Result<Self, anyhow::Error> {
        Self::from_root(".")
    }

    /// Create settings from CLI arguments (config file, environment, then CLI overrides)
    pub fn new_with_cli(cli: &Cli) -> Result<Self, anyhow::Error> {
        let mut settings = Self::from_file(&cli.config)?;
        settings.apply_cli_overrides(cli);
        Ok(settings)
    }

    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        Self::from_file(&Path::new(root).join("themis.toml"))
    }

    fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let s = Config::builder()
            .set_default("store.kind", "memory")?
            .set_default("log.level", default_log_level())?
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("THEMIS").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        Ok(settings)
    }

    /// Apply CLI argument overrides to settings
    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(dir) = &cli.forms_dir {
            self.forms.dir = Some(dir.clone());
        }
        if let Some(path) = &cli.store {
            self.store.kind = StoreKind::File;
            self.store.path = path.clone();
        }
        if let Some(catalog) = &cli.catalog {
            self.i18n.catalog = Some(catalog.clone());
        }
        if cli.auditor {
            self.user.system_auditor = true;
        }
        if cli.read_only {
            self.user.can_write = false;
        }
    }

    pub fn permissions(&self) -> PermissionContext {
        PermissionContext {
            user_is_system_auditor: self.user.system_auditor,
            can_write: self.user.can_write && !self.user.system_auditor,
        }
    }

    /// Built-in schemas plus everything in the configured forms directory
    pub fn load_registry(&self) -> Result<FormRegistry, anyhow::Error> {
        let mut registry = FormRegistry::with_builtin()?;
        if let Some(dir) = &self.forms.dir {
            let loaded = registry.load_dir(dir)?;
            tracing::info!("Loaded {} form schema(s) from {}", loaded, dir.display());
        }
        Ok(registry)
    }
}
